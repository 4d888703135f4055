mod runs;
mod sync;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shopsync-cli")]
#[command(about = "Shopify catalog sync command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch the Shopify catalog and reconcile it into the database
    Sync {
        /// Fetch and normalize only; print what would be written
        #[arg(long)]
        dry_run: bool,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// List recent sync runs
    Runs {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("shopsync-cli: no command given; run with --help for usage");
        return Ok(());
    };

    dotenvy::dotenv().ok();
    let config = shopsync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Sync { dry_run: true } => sync::run_dry_run(&config).await,
        Commands::Sync { dry_run: false } => {
            let pool = connect(&config).await?;
            sync::run_sync(&config, pool).await
        }
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            let pool = connect(&config).await?;
            shopsync_db::health_check(&pool).await?;
            println!("database ok");
            Ok(())
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let pool = connect(&config).await?;
            let applied = shopsync_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
            Ok(())
        }
        Commands::Runs { limit } => {
            let pool = connect(&config).await?;
            runs::list_runs(&pool, limit).await
        }
    }
}

async fn connect(config: &shopsync_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = shopsync_db::PoolConfig::from_app_config(config);
    let pool = shopsync_db::connect_pool(&config.database_url, &pool_config).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests;
