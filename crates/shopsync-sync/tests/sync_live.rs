//! End-to-end sync runs against a fresh migrated database per test.
//!
//! Most tests drive the orchestrator with an in-memory catalog; the fatal
//! fetch path also runs through the real Admin API client behind `wiremock`.

use serde_json::json;
use shopsync_shopify::{
    AdminClientConfig, RawProduct, RawVariant, ShopifyAdminClient, ShopifyError,
};
use shopsync_sync::{
    preview_catalog, CatalogSource, CatalogSync, SyncError, SyncOptions, Trigger, RUN_LOCK_NAME,
};
use sqlx::PgPool;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct StaticCatalog {
    products: Vec<RawProduct>,
}

impl CatalogSource for StaticCatalog {
    async fn fetch_catalog(&self) -> Result<Vec<RawProduct>, ShopifyError> {
        Ok(self.products.clone())
    }

    fn store_host(&self) -> &str {
        "acme.myshopify.com"
    }
}

struct UnreachableCatalog;

impl CatalogSource for UnreachableCatalog {
    async fn fetch_catalog(&self) -> Result<Vec<RawProduct>, ShopifyError> {
        Err(ShopifyError::Unauthorized { status: 401 })
    }

    fn store_host(&self) -> &str {
        "acme.myshopify.com"
    }
}

fn variant(id: i64, sku: Option<&str>, inventory: Option<i64>) -> RawVariant {
    RawVariant {
        id,
        sku: sku.map(str::to_owned),
        inventory_quantity: inventory,
    }
}

fn product(id: i64, title: &str, variants: Option<Vec<RawVariant>>) -> RawProduct {
    RawProduct {
        id,
        title: Some(title.to_owned()),
        vendor: Some("Acme".to_owned()),
        variants,
    }
}

fn silk_scarf() -> RawProduct {
    product(
        1001,
        "Silk Scarf",
        Some(vec![
            variant(55, Some("SC-1"), Some(3)),
            variant(56, Some("SC-1-L"), Some(5)),
            variant(57, Some("SC-1-XL"), Some(-2)),
        ]),
    )
}

fn sync_with(pool: &PgPool, products: Vec<RawProduct>) -> CatalogSync<StaticCatalog> {
    CatalogSync::new(
        StaticCatalog { products },
        pool.clone(),
        SyncOptions::default(),
    )
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap_or_else(|e| panic!("count {table} failed: {e}"))
}

async fn inventory_of(pool: &PgPool, listing_id: &str) -> i32 {
    shopsync_db::get_listing(pool, "shopify", listing_id)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("listing {listing_id} missing"))
        .inventory_count
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn silk_scarf_end_to_end(pool: PgPool) {
    let sync = sync_with(&pool, vec![silk_scarf()]);

    let report = sync.run_sync(Trigger::Cli).await.expect("sync failed");

    assert_eq!(report.attempted, 1);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.products_created, 1);
    assert_eq!(report.listings_created, 1);

    let row = shopsync_db::get_product_by_sku(&pool, "SC-1")
        .await
        .unwrap()
        .expect("product row missing");
    assert_eq!(row.title, "Silk Scarf");
    assert_eq!(row.brand.as_deref(), Some("Acme"));
    assert_eq!(inventory_of(&pool, "55").await, 8);

    let run_id = report.run_id.expect("audit row should exist");
    let runs = shopsync_db::list_sync_runs(&pool, 10).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].public_id, run_id);
    assert_eq!(runs[0].status, "succeeded");
    assert_eq!(runs[0].trigger_source, "cli");
    assert_eq!(runs[0].records_succeeded, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn second_run_is_idempotent(pool: PgPool) {
    let sync = sync_with(&pool, vec![silk_scarf()]);

    sync.run_sync(Trigger::Cli).await.expect("first run");
    let second = sync.run_sync(Trigger::Schedule).await.expect("second run");

    assert_eq!(second.succeeded, 1);
    assert_eq!(second.products_created, 0);
    assert_eq!(second.listings_created, 0);
    assert_eq!(count(&pool, "products").await, 1);
    assert_eq!(count(&pool, "listings").await, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn unchanged_catalog_only_moves_timestamps(pool: PgPool) {
    let sync = sync_with(&pool, vec![silk_scarf()]);
    sync.run_sync(Trigger::Cli).await.expect("first run");

    let product_before = shopsync_db::get_product_by_sku(&pool, "SC-1")
        .await
        .unwrap()
        .expect("product after first run");
    let listing_before = shopsync_db::get_listing(&pool, "shopify", "55")
        .await
        .unwrap()
        .expect("listing after first run");

    sync.run_sync(Trigger::Schedule).await.expect("second run");

    let product_after = shopsync_db::get_product_by_sku(&pool, "SC-1")
        .await
        .unwrap()
        .expect("product after second run");
    let listing_after = shopsync_db::get_listing(&pool, "shopify", "55")
        .await
        .unwrap()
        .expect("listing after second run");

    assert_eq!(product_after.id, product_before.id);
    assert_eq!(product_after.sku, product_before.sku);
    assert_eq!(product_after.title, product_before.title);
    assert_eq!(product_after.brand, product_before.brand);
    assert_eq!(product_after.created_at, product_before.created_at);
    assert!(product_after.updated_at > product_before.updated_at);

    assert_eq!(listing_after.id, listing_before.id);
    assert_eq!(listing_after.product_id, listing_before.product_id);
    assert_eq!(listing_after.listing_url, listing_before.listing_url);
    assert_eq!(listing_after.inventory_count, listing_before.inventory_count);
    assert_eq!(listing_after.status, listing_before.status);
    assert!(listing_after.last_scrape_at > listing_before.last_scrape_at);
}

#[sqlx::test(migrations = "../../migrations")]
async fn single_variant_scarf_is_active_with_its_quantity(pool: PgPool) {
    let scarf = product(
        1001,
        "Silk Scarf",
        Some(vec![variant(55, Some("SC-1"), Some(4))]),
    );
    let report = sync_with(&pool, vec![scarf])
        .run_sync(Trigger::Http)
        .await
        .expect("sync failed");
    assert_eq!(report.succeeded, 1);

    let listing = shopsync_db::get_listing(&pool, "shopify", "55")
        .await
        .unwrap()
        .expect("listing row missing");
    assert_eq!(listing.inventory_count, 4);
    assert_eq!(listing.status, "active");
}

#[sqlx::test(migrations = "../../migrations")]
async fn missing_sku_uses_fallback(pool: PgPool) {
    let mut raw = product(2002, "Untitled", Some(vec![variant(77, None, None)]));
    raw.title = None;
    let sync = sync_with(&pool, vec![raw]);

    let report = sync.run_sync(Trigger::Http).await.unwrap();
    assert_eq!(report.succeeded, 1);

    let row = shopsync_db::get_product_by_sku(&pool, "SKU-2002")
        .await
        .unwrap()
        .expect("fallback sku row missing");
    assert_eq!(row.title, "");
    assert_eq!(inventory_of(&pool, "77").await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn malformed_record_is_counted_and_skipped(pool: PgPool) {
    let sync = sync_with(
        &pool,
        vec![
            product(1, "No variants", None),
            product(2, "Empty", Some(vec![])),
            silk_scarf(),
        ],
    );

    let report = sync.run_sync(Trigger::Cli).await.unwrap();

    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 2);
    assert_eq!(count(&pool, "products").await, 1);

    let runs = shopsync_db::list_sync_runs(&pool, 1).await.unwrap();
    assert_eq!(runs[0].records_failed, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn shared_listing_id_keeps_first_owner(pool: PgPool) {
    // Both products claim first-variant id 500. The second upsert lands on
    // the existing (channel, listing_id) row as an update.
    let first = product(10, "First", Some(vec![variant(500, Some("A-1"), Some(1))]));
    let second = product(11, "Second", Some(vec![variant(500, Some("B-1"), Some(9))]));
    let sync = sync_with(&pool, vec![first, second]);

    let report = sync.run_sync(Trigger::Cli).await.unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(count(&pool, "products").await, 2);
    assert_eq!(count(&pool, "listings").await, 1);

    let listing = shopsync_db::get_listing(&pool, "shopify", "500")
        .await
        .unwrap()
        .unwrap();
    let owner = shopsync_db::get_product_by_sku(&pool, "A-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(listing.product_id, owner.id, "conflict must not repoint product_id");
    assert_eq!(listing.inventory_count, 9);
}

#[sqlx::test(migrations = "../../migrations")]
async fn reordered_first_variant_creates_new_listing(pool: PgPool) {
    let before = product(
        1001,
        "Silk Scarf",
        Some(vec![variant(55, Some("SC-1"), Some(1)), variant(56, Some("SC-1"), Some(1))]),
    );
    let after = product(
        1001,
        "Silk Scarf",
        Some(vec![variant(56, Some("SC-1"), Some(1)), variant(55, Some("SC-1"), Some(1))]),
    );

    sync_with(&pool, vec![before])
        .run_sync(Trigger::Cli)
        .await
        .unwrap();
    let report = sync_with(&pool, vec![after])
        .run_sync(Trigger::Cli)
        .await
        .unwrap();

    assert_eq!(report.products_created, 0);
    assert_eq!(report.listings_created, 1);
    assert_eq!(count(&pool, "products").await, 1);
    assert_eq!(count(&pool, "listings").await, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn sync_never_deletes_missing_products(pool: PgPool) {
    let other = product(3003, "Wool Hat", Some(vec![variant(90, Some("WH-1"), Some(2))]));
    sync_with(&pool, vec![silk_scarf(), other])
        .run_sync(Trigger::Cli)
        .await
        .unwrap();

    sync_with(&pool, vec![silk_scarf()])
        .run_sync(Trigger::Cli)
        .await
        .unwrap();

    assert!(shopsync_db::get_product_by_sku(&pool, "WH-1")
        .await
        .unwrap()
        .is_some());
    let listing = shopsync_db::get_listing(&pool, "shopify", "90")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(listing.status, "active");
    assert_eq!(listing.inventory_count, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn concurrent_reconcile_matches_sequential(pool: PgPool) {
    let products: Vec<RawProduct> = (1..=20)
        .map(|i| {
            product(
                i,
                "Bulk",
                Some(vec![variant(i * 100, Some(&format!("BULK-{i}")), Some(i))]),
            )
        })
        .collect();
    let sync = CatalogSync::new(
        StaticCatalog { products },
        pool.clone(),
        SyncOptions { max_concurrency: 4 },
    );

    let report = sync.run_sync(Trigger::Cli).await.unwrap();

    assert_eq!(report.succeeded, 20);
    assert_eq!(count(&pool, "products").await, 20);
    assert_eq!(count(&pool, "listings").await, 20);
}

// ---------------------------------------------------------------------------
// Fatal paths
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn fetch_failure_writes_no_rows(pool: PgPool) {
    let sync = CatalogSync::new(UnreachableCatalog, pool.clone(), SyncOptions::default());

    let err = sync.run_sync(Trigger::Http).await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::RemoteUnavailable(ShopifyError::Unauthorized { status: 401 })
    ));
    assert_eq!(count(&pool, "products").await, 0);
    assert_eq!(count(&pool, "listings").await, 0);

    let runs = shopsync_db::list_sync_runs(&pool, 1).await.unwrap();
    assert_eq!(runs[0].status, "failed");
    assert!(runs[0].error_message.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn admin_api_401_fails_the_run(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/api/2025-04/products.json"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errors": "[API] Invalid API key or access token (unrecognized login or wrong password)"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ShopifyAdminClient::new(&AdminClientConfig {
        store_domain: server.uri(),
        access_token: "shpat_revoked".to_owned(),
        api_version: "2025-04".to_owned(),
        page_size: 250,
        timeout_secs: 5,
        max_retries: 2,
        retry_backoff_base_ms: 0,
        inter_request_delay_ms: 0,
    })
    .expect("client");
    let sync = CatalogSync::new(client, pool.clone(), SyncOptions::default());

    let err = sync.run_sync(Trigger::Http).await.unwrap_err();

    assert!(matches!(err, SyncError::RemoteUnavailable(_)));
    assert_eq!(count(&pool, "products").await, 0);
    assert_eq!(count(&pool, "listings").await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn held_lock_refuses_second_run(pool: PgPool) {
    let held = shopsync_db::try_acquire_run_lock(&pool, RUN_LOCK_NAME)
        .await
        .unwrap()
        .expect("lock should be free");

    let err = sync_with(&pool, vec![silk_scarf()])
        .run_sync(Trigger::Http)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::AlreadyRunning));
    assert_eq!(count(&pool, "sync_runs").await, 0);

    held.release().await.unwrap();
    let report = sync_with(&pool, vec![silk_scarf()])
        .run_sync(Trigger::Http)
        .await
        .expect("run after release should succeed");
    assert_eq!(report.succeeded, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn closed_pool_is_store_unavailable(pool: PgPool) {
    let sync = sync_with(&pool, vec![silk_scarf()]);
    pool.close().await;

    let err = sync.run_sync(Trigger::Cli).await.unwrap_err();
    assert!(matches!(err, SyncError::StoreUnavailable(_)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn store_lost_mid_reconcile_keeps_committed_records(pool: PgPool) {
    sqlx::query("INSERT INTO products (sku, title) VALUES ('SC-2', 'Held')")
        .execute(&pool)
        .await
        .unwrap();

    // Holding the row lock parks the second record inside its transaction.
    let mut blocker = pool.begin().await.unwrap();
    sqlx::query("SELECT id FROM products WHERE sku = 'SC-2' FOR UPDATE")
        .execute(&mut *blocker)
        .await
        .unwrap();

    let sync = sync_with(
        &pool,
        vec![
            product(1, "First", Some(vec![variant(11, Some("SC-1"), Some(1))])),
            product(2, "Second", Some(vec![variant(22, Some("SC-2"), Some(2))])),
            product(3, "Third", Some(vec![variant(33, Some("SC-3"), Some(3))])),
        ],
    );
    let run = tokio::spawn(async move { sync.run_sync(Trigger::Cli).await });

    let mut waiting: Option<i32> = None;
    for _ in 0..200 {
        waiting = sqlx::query_scalar(
            "SELECT pid FROM pg_stat_activity \
             WHERE datname = current_database() AND wait_event_type = 'Lock'",
        )
        .fetch_optional(&pool)
        .await
        .unwrap();
        if waiting.is_some() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    }
    let waiting = waiting.expect("second record never blocked on the row lock");

    sqlx::query("SELECT pg_terminate_backend($1)")
        .bind(waiting)
        .execute(&pool)
        .await
        .unwrap();
    blocker.rollback().await.unwrap();

    let err = run.await.unwrap().unwrap_err();
    assert!(matches!(err, SyncError::StoreUnavailable(_)), "got {err:?}");

    let first = shopsync_db::get_product_by_sku(&pool, "SC-1")
        .await
        .unwrap()
        .expect("record committed before the loss should remain");
    assert_eq!(first.title, "First");
    assert_eq!(inventory_of(&pool, "11").await, 1);

    let held = shopsync_db::get_product_by_sku(&pool, "SC-2")
        .await
        .unwrap()
        .expect("pre-existing row");
    assert_eq!(held.title, "Held");
    assert!(shopsync_db::get_listing(&pool, "shopify", "22")
        .await
        .unwrap()
        .is_none());
    assert!(shopsync_db::get_product_by_sku(&pool, "SC-3")
        .await
        .unwrap()
        .is_none());

    let runs = shopsync_db::list_sync_runs(&pool, 10).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, "failed");
    assert_eq!(runs[0].records_attempted, 3);
    assert_eq!(runs[0].records_succeeded, 1);
    assert_eq!(runs[0].records_failed, 1);
    assert!(runs[0].error_message.is_some());
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

#[tokio::test]
async fn preview_normalizes_without_a_database() {
    let source = StaticCatalog {
        products: vec![silk_scarf(), product(5, "Broken", None)],
    };

    let preview = preview_catalog(&source).await.unwrap();

    assert_eq!(preview.fetched, 2);
    assert_eq!(preview.products.len(), 1);
    assert_eq!(preview.products[0].sku, "SC-1");
    assert_eq!(preview.products[0].inventory_total, 8);
    assert_eq!(preview.malformed.len(), 1);
}
