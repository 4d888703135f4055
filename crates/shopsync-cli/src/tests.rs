use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["shopsync-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["shopsync-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["shopsync-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn sync_defaults_to_writing() {
    let cli = Cli::try_parse_from(["shopsync-cli", "sync"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Sync { dry_run: false })
    ));
}

#[test]
fn sync_dry_run_flag() {
    let cli = Cli::try_parse_from(["shopsync-cli", "sync", "--dry-run"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Sync { dry_run: true })));
}

#[test]
fn runs_limit_defaults_and_overrides() {
    let cli = Cli::try_parse_from(["shopsync-cli", "runs"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Runs { limit: 20 })));

    let cli = Cli::try_parse_from(["shopsync-cli", "runs", "--limit", "5"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Runs { limit: 5 })));
}

#[test]
fn db_without_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["shopsync-cli", "db"]).is_err());
}

#[test]
fn unknown_command_is_rejected() {
    assert!(Cli::try_parse_from(["shopsync-cli", "collect"]).is_err());
}
