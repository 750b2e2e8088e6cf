/// End-to-end tests of shard-scoped persistence against the in-memory backend.
///
/// Run with: cargo test --test sharded_persistence_tests
use chrono::{TimeZone, Utc};
use shardscope::storage::QueryKind;
use shardscope::{
    FixedClock, MemoryBackend, MemoryBackendConfig, ModelConfig, PersistenceOperations,
    QueryCondition, QueryExecutor, Record, ReloadOptions, ScopeError, ShardedPersistence,
    UpdateQuery, Value, row,
};
use std::sync::Arc;

fn order_config() -> Arc<ModelConfig> {
    Arc::new(
        ModelConfig::new("Order", "orders")
            .partition_key("customer_id")
            .touch_timestamps(["updated_at"])
            .readonly("created_by"),
    )
}

async fn setup(config: &ModelConfig) -> (Arc<MemoryBackend>, ShardedPersistence<Arc<MemoryBackend>>) {
    let backend = Arc::new(MemoryBackend::new(MemoryBackendConfig::new().shard_count(4)));
    backend.create_table(config).await.unwrap();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let ops = ShardedPersistence::new(Arc::clone(&backend)).with_clock(Arc::new(FixedClock(now)));
    (backend, ops)
}

async fn create_order(
    ops: &ShardedPersistence<Arc<MemoryBackend>>,
    config: &Arc<ModelConfig>,
    id: i64,
    customer_id: i64,
) -> Record {
    let mut record = Record::new(
        Arc::clone(config),
        row([
            ("id", Value::from(id)),
            ("customer_id", Value::from(customer_id)),
            ("status", Value::from("open")),
            ("created_by", Value::from("alice")),
        ]),
    );
    assert!(ops.save(&mut record).await.unwrap());
    record
}

/// A customer id that hashes to a different shard than `customer_id`.
async fn customer_on_other_shard(backend: &MemoryBackend, customer_id: i64) -> i64 {
    let home = backend.shard_for("orders", &Value::from(customer_id)).await.unwrap();
    let mut other = customer_id + 1;
    while backend.shard_for("orders", &Value::from(other)).await.unwrap() == home {
        other += 1;
    }
    other
}

#[tokio::test]
async fn test_order_touch_hits_only_its_shard() {
    let config = order_config();
    let (backend, ops) = setup(&config).await;
    let mut order = create_order(&ops, &config, 42, 7).await;
    backend.clear_traces().await;

    assert!(ops.touch(&mut order, &[]).await.unwrap());

    let traces = backend.traces().await;
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].kind, QueryKind::Update);
    assert_eq!(traces[0].shards.len(), 1);

    let shard = backend.shard_for("orders", &Value::from(7)).await.unwrap();
    let stored = backend.shard_rows("orders", shard).await.unwrap();
    assert_eq!(
        stored[0].get("updated_at"),
        Some(&Value::Timestamp(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()))
    );
}

#[tokio::test]
async fn test_same_id_on_two_shards_is_addressed_individually() {
    let config = order_config();
    let (backend, ops) = setup(&config).await;
    let other_customer = customer_on_other_shard(&backend, 7).await;
    let mut first = create_order(&ops, &config, 1, 7).await;
    let second = create_order(&ops, &config, 1, other_customer).await;

    assert!(
        ops.update_columns(&mut first, row([("status", Value::from("shipped"))]))
            .await
            .unwrap()
    );

    let mut reloaded = second.clone();
    ops.reload(&mut reloaded, ReloadOptions::default()).await.unwrap();
    assert_eq!(reloaded.read("status"), &Value::from("open"));

    // An update routed by primary key alone would reach both rows.
    let unscoped = UpdateQuery {
        table: "orders".to_string(),
        condition: QueryCondition::new().and_eq("id", 1),
        assignments: vec![("status".to_string(), Value::from("void"))],
    };
    assert_eq!(backend.update_all(&unscoped).await.unwrap(), 2);
}

#[tokio::test]
async fn test_save_round_trip_and_reload_with_lock() {
    let config = order_config();
    let (backend, ops) = setup(&config).await;
    let mut order = create_order(&ops, &config, 42, 7).await;

    order.write_attribute("status", "paid").unwrap();
    assert!(ops.save(&mut order).await.unwrap());
    assert!(!order.has_changes());

    backend.clear_traces().await;
    let mut copy = Record::persisted(
        Arc::clone(&config),
        row([("id", Value::from(42)), ("customer_id", Value::from(7))]),
    );
    ops.reload(&mut copy, ReloadOptions::locked()).await.unwrap();

    assert_eq!(copy.read("status"), &Value::from("paid"));
    assert_eq!(copy.read("created_by"), &Value::from("alice"));
    let traces = backend.traces().await;
    assert_eq!(traces[0].kind, QueryKind::LockedFetch);
    assert_eq!(traces[0].shards.len(), 1);
}

#[tokio::test]
async fn test_destroy_then_reload_is_not_found() {
    let config = order_config();
    let (backend, ops) = setup(&config).await;
    let mut order = create_order(&ops, &config, 42, 7).await;
    let mut stale_copy = order.clone();

    assert_eq!(ops.destroy(&mut order).await.unwrap(), 1);
    assert!(order.is_destroyed());
    assert_eq!(backend.row_count("orders").await.unwrap(), 0);

    let err = ops
        .reload(&mut stale_copy, ReloadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ScopeError::NotFound { .. }));

    // The row vanished: soft failures, not errors
    assert!(!ops.touch(&mut stale_copy, &[]).await.unwrap());
    assert!(
        !ops.update_columns(&mut stale_copy, row([("status", Value::from("x"))]))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_readonly_and_state_checks_issue_no_queries() {
    let config = order_config();
    let (backend, ops) = setup(&config).await;
    let mut order = create_order(&ops, &config, 42, 7).await;
    backend.clear_traces().await;

    let err = ops
        .update_columns(&mut order, row([("created_by", Value::from("mallory"))]))
        .await
        .unwrap_err();
    assert!(matches!(err, ScopeError::ReadOnlyAttribute { .. }));

    let mut fresh = Record::new(Arc::clone(&config), row([("id", Value::from(9))]));
    assert!(matches!(
        ops.touch(&mut fresh, &[]).await,
        Err(ScopeError::InvalidOperation(_))
    ));

    assert!(backend.traces().await.is_empty());
}

#[tokio::test]
async fn test_global_setting_delete_condition_is_primary_key_only() {
    let config = Arc::new(ModelConfig::new("GlobalSetting", "global_settings").partition_key("id"));
    let (backend, ops) = setup(&config).await;
    let mut setting = Record::new(
        Arc::clone(&config),
        row([("id", Value::from(5)), ("value", Value::from("on"))]),
    );
    ops.save(&mut setting).await.unwrap();

    let condition = ops.build_delete_condition(&setting);
    assert_eq!(condition.to_string(), "{id = 5}");

    backend.clear_traces().await;
    assert_eq!(ops.destroy(&mut setting).await.unwrap(), 1);
    // Primary key is the partition key, so the delete still lands on one shard
    assert_eq!(backend.traces().await[0].shards.len(), 1);
}

#[tokio::test]
async fn test_optimistic_locking_detects_concurrent_update() {
    let config = Arc::new(
        ModelConfig::new("Order", "orders")
            .partition_key("customer_id")
            .locking_column("lock_version"),
    );
    let (_backend, ops) = setup(&config).await;
    let mut mine = create_order(&ops, &config, 42, 7).await;
    let mut theirs = mine.clone();

    theirs.write_attribute("status", "paid").unwrap();
    assert!(ops.save(&mut theirs).await.unwrap());
    assert_eq!(theirs.read("lock_version"), &Value::from(1));

    mine.write_attribute("status", "cancelled").unwrap();
    let err = ops.save(&mut mine).await.unwrap_err();
    assert!(matches!(err, ScopeError::StaleObject { .. }));

    ops.reload(&mut mine, ReloadOptions::default()).await.unwrap();
    assert_eq!(mine.read("status"), &Value::from("paid"));
    assert_eq!(mine.read("lock_version"), &Value::from(1));
}
