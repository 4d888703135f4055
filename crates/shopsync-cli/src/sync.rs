//! `sync` command handlers.

use std::fmt::Write as _;

use shopsync_core::AppConfig;
use shopsync_shopify::{AdminClientConfig, ShopifyAdminClient};
use shopsync_sync::{preview_catalog, CatalogPreview, CatalogSync, SyncOptions, SyncReport, Trigger};

fn build_client(config: &AppConfig) -> anyhow::Result<ShopifyAdminClient> {
    ShopifyAdminClient::new(&AdminClientConfig::from_app_config(config))
        .map_err(|e| anyhow::anyhow!("failed to build Shopify client: {e}"))
}

/// Runs a full sync against the configured store and database.
pub(crate) async fn run_sync(config: &AppConfig, pool: sqlx::PgPool) -> anyhow::Result<()> {
    let sync = CatalogSync::new(
        build_client(config)?,
        pool,
        SyncOptions::from_app_config(config),
    );

    let report = sync.run_sync(Trigger::Cli).await?;
    print!("{}", format_report(&report));

    if report.failed > 0 {
        eprintln!(
            "warning: {} record(s) failed; see the log for catalog ids",
            report.failed
        );
    }
    Ok(())
}

/// Fetches and normalizes without touching the database.
pub(crate) async fn run_dry_run(config: &AppConfig) -> anyhow::Result<()> {
    let client = build_client(config)?;
    println!("[dry-run] fetching catalog from {}", client.store_host());

    let preview = preview_catalog(&client).await?;
    print!("{}", format_preview(&preview));
    Ok(())
}

fn format_report(report: &SyncReport) -> String {
    let mut out = String::new();
    let run = report
        .run_id
        .map_or_else(|| "unrecorded".to_owned(), |id| id.to_string());
    let _ = writeln!(out, "sync run {run} complete");
    let _ = writeln!(
        out,
        "  attempted {}, succeeded {}, failed {}",
        report.attempted, report.succeeded, report.failed
    );
    let _ = writeln!(
        out,
        "  new products {}, new listings {}",
        report.products_created, report.listings_created
    );
    out
}

fn format_preview(preview: &CatalogPreview) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "[dry-run] {} fetched, {} normalized, {} malformed",
        preview.fetched,
        preview.products.len(),
        preview.malformed.len()
    );
    for product in &preview.products {
        let _ = writeln!(
            out,
            "  {sku}  {title}  inventory={inventory}",
            sku = product.sku,
            title = product.title,
            inventory = product.inventory_total
        );
    }
    for err in &preview.malformed {
        let _ = writeln!(out, "  skipped: {err}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopsync_core::NormalizedProduct;
    use shopsync_sync::RecordError;

    #[test]
    fn report_without_audit_row_is_unrecorded() {
        let report = SyncReport {
            run_id: None,
            attempted: 3,
            succeeded: 2,
            failed: 1,
            products_created: 2,
            listings_created: 1,
        };
        let text = format_report(&report);
        assert!(text.starts_with("sync run unrecorded complete"));
        assert!(text.contains("attempted 3, succeeded 2, failed 1"));
        assert!(text.contains("new products 2, new listings 1"));
    }

    #[test]
    fn preview_lists_products_and_skips() {
        let preview = CatalogPreview {
            fetched: 2,
            products: vec![NormalizedProduct {
                catalog_id: 4242,
                sku: "SC-RED".to_owned(),
                title: "Silk Scarf".to_owned(),
                brand: Some("Acme".to_owned()),
                channel: "shopify".to_owned(),
                listing_native_id: "1".to_owned(),
                listing_url: "https://acme.myshopify.com/admin/products/4242".to_owned(),
                inventory_total: 8,
            }],
            malformed: vec![RecordError::MalformedRecord {
                catalog_id: 7,
                reason: "product has no variants".to_owned(),
            }],
        };
        let text = format_preview(&preview);
        assert!(text.contains("2 fetched, 1 normalized, 1 malformed"));
        assert!(text.contains("SC-RED  Silk Scarf  inventory=8"));
        assert!(text.contains("skipped: malformed record 7"));
    }
}
