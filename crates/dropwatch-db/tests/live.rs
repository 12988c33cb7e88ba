//! Live integration tests for the Postgres store using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/dropwatch-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory. Ignored by default; run with
//! `DATABASE_URL=... cargo test -p dropwatch-db -- --ignored`.

use dropwatch_core::{LockStatus, SizeLabel, Snapshot, Variant};
use dropwatch_db::{LockStateStore, PgStore, SnapshotStore};

fn variant(id: &str, available: bool) -> Variant {
    Variant {
        variant_id: id.to_string(),
        product_title: format!("Hoodie {id}"),
        product_type: "Hoodie".to_string(),
        size_label: SizeLabel::Large,
        available,
        price: "60.00".to_string(),
        url: format!("https://shop.example.com/products/hoodie?variant={id}"),
    }
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn empty_table_loads_as_first_run(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let snapshot = store.load().await.expect("load failed");
    assert!(snapshot.is_first_run());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn replace_swaps_the_whole_snapshot(pool: sqlx::PgPool) {
    let store = PgStore::new(pool.clone());

    store
        .replace(&Snapshot::from_variants([variant("1", true), variant("2", false)]))
        .await
        .expect("first replace failed");
    store
        .replace(&Snapshot::from_variants([variant("2", true), variant("3", true)]))
        .await
        .expect("second replace failed");

    let loaded = store.load().await.expect("load failed");
    assert_eq!(loaded.len(), 2);
    assert!(!loaded.contains("1"), "ids absent from the replacement are dropped");
    assert!(loaded.get("2").is_some_and(|v| v.available));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM variant_snapshots")
        .fetch_one(&pool)
        .await
        .expect("count failed");
    assert_eq!(count, 2);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn replace_with_empty_snapshot_clears_the_table(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    store
        .replace(&Snapshot::from_variants([variant("1", true)]))
        .await
        .expect("replace failed");
    store.replace(&Snapshot::new()).await.expect("clear failed");
    assert!(store.load().await.expect("load failed").is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn snapshot_round_trips_every_field(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let mut v = variant("9", false);
    v.size_label = SizeLabel::Unrecognized;
    v.product_type = String::new();
    let snapshot = Snapshot::from_variants([v]);

    store.replace(&snapshot).await.expect("replace failed");
    assert_eq!(store.load().await.expect("load failed"), snapshot);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn lock_status_defaults_to_unknown_then_upserts(pool: sqlx::PgPool) {
    let store = PgStore::new(pool.clone());
    assert_eq!(
        store.load_lock_status().await.expect("load failed"),
        LockStatus::Unknown
    );

    store
        .save_lock_status(LockStatus::Locked)
        .await
        .expect("save failed");
    store
        .save_lock_status(LockStatus::Unlocked)
        .await
        .expect("save failed");

    assert_eq!(
        store.load_lock_status().await.expect("load failed"),
        LockStatus::Unlocked
    );

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM store_lock_state")
        .fetch_one(&pool)
        .await
        .expect("count failed");
    assert_eq!(rows, 1, "lock state is a singleton row");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn ping_succeeds_on_a_live_pool(pool: sqlx::PgPool) {
    dropwatch_db::ping(&pool).await.expect("ping failed");
    dropwatch_db::health_check(&pool)
        .await
        .expect("health check failed");
}
