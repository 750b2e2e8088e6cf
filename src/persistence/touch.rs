use super::ShardedPersistence;
use super::update_row::next_lock_value;
use crate::core::{Result, ScopeError, Value};
use crate::model::Record;
use crate::query::{QueryExecutor, Relation};
use crate::scope::ShardScopeResolver;
use tracing::{Level, event};

impl<E: QueryExecutor> ShardedPersistence<E> {
    pub(super) async fn touch_record(
        &self,
        record: &mut Record,
        extra_columns: &[&str],
    ) -> Result<bool> {
        if !record.is_persisted() {
            return Err(ScopeError::InvalidOperation(format!(
                "cannot touch on a {} {} object",
                if record.is_destroyed() { "destroyed" } else { "new" },
                record.model_name()
            )));
        }

        let config = record.config_arc();
        let mut columns: Vec<&str> = Vec::new();
        for column in config
            .touch_timestamp_columns
            .iter()
            .map(String::as_str)
            .chain(extra_columns.iter().copied())
        {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }

        if columns.is_empty() {
            event!(Level::DEBUG, "no timestamp columns to touch");
            return Ok(true);
        }

        let next_lock = match &config.locking_column {
            Some(lock_column) => Some((lock_column, next_lock_value(record, lock_column)?)),
            None => None,
        };

        let current_time = Value::Timestamp(self.clock.now());
        let mut changes: Vec<(String, Value)> = Vec::with_capacity(columns.len() + 1);
        for column in columns {
            record.write_attribute(column, current_time.clone())?;
            changes.push((column.to_string(), current_time.clone()));
        }

        if let Some((lock_column, next)) = next_lock {
            record.write_attribute(lock_column, next)?;
            changes.push((lock_column.clone(), Value::Integer(next)));
        }

        record.clear_attribute_changes(changes.iter().map(|(column, _)| column));

        let scope = ShardScopeResolver::resolve_record(record);
        let query = Relation::unscoped(&config)
            .where_eq(config.primary_key_name(), record.id().clone())
            .scoped(&scope)
            .into_update(changes);

        let affected = self.executor.update_all(&query).await?;
        event!(Level::DEBUG, scope = %scope, affected, "touch executed");
        if affected != 1 {
            event!(Level::WARN, affected, condition = %query.condition, "touch did not update exactly one row");
        }
        Ok(affected == 1)
    }
}

#[cfg(test)]
mod tests {
    use crate::clock::FixedClock;
    use crate::core::{ScopeError, Value, row};
    use crate::model::{ModelConfig, Record};
    use crate::persistence::{PersistenceOperations, ShardedPersistence};
    use crate::test_support::{ExecutedQuery, RecordingExecutor};
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn ops(executor: &Arc<RecordingExecutor>) -> ShardedPersistence<Arc<RecordingExecutor>> {
        ShardedPersistence::new(Arc::clone(executor)).with_clock(Arc::new(FixedClock(now())))
    }

    fn order(config: ModelConfig) -> Record {
        Record::persisted(
            Arc::new(config),
            row([
                ("id", Value::from(42)),
                ("customer_id", Value::from(7)),
                ("status", Value::from("open")),
            ]),
        )
    }

    #[tokio::test]
    async fn test_touch_scopes_update_to_shard() {
        let executor = Arc::new(RecordingExecutor::new());
        executor.push_affected(1);
        let ops = ops(&executor);
        let mut record = order(
            ModelConfig::new("Order", "orders")
                .partition_key("customer_id")
                .touch_timestamps(["updated_at"]),
        );

        assert!(ops.touch(&mut record, &[]).await.unwrap());

        let queries = executor.queries();
        assert_eq!(queries.len(), 1);
        let ExecutedQuery::Update(query) = &queries[0] else {
            panic!("expected update");
        };
        assert_eq!(query.condition.to_string(), "{id = 42 AND customer_id = 7}");
        assert_eq!(
            query.assignments,
            vec![("updated_at".to_string(), Value::Timestamp(now()))]
        );
        assert_eq!(record.read("updated_at"), &Value::Timestamp(now()));
        assert!(!record.is_attribute_changed("updated_at"));
    }

    #[tokio::test]
    async fn test_touch_result_maps_affected_count() {
        for (affected, expected) in [(0, false), (1, true), (2, false)] {
            let executor = Arc::new(RecordingExecutor::new());
            executor.push_affected(affected);
            let ops = ops(&executor);
            let mut record = order(ModelConfig::new("Order", "orders").touch_timestamps(["updated_at"]));

            assert_eq!(ops.touch(&mut record, &[]).await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_touch_without_columns_issues_no_query() {
        let executor = Arc::new(RecordingExecutor::new());
        let ops = ops(&executor);
        let mut record = order(ModelConfig::new("Order", "orders").partition_key("customer_id"));

        assert!(ops.touch(&mut record, &[]).await.unwrap());
        assert!(executor.queries().is_empty());
    }

    #[tokio::test]
    async fn test_touch_extra_columns_and_locking() {
        let executor = Arc::new(RecordingExecutor::new());
        executor.push_affected(1);
        let ops = ops(&executor);
        let mut record = order(
            ModelConfig::new("Order", "orders")
                .touch_timestamps(["updated_at"])
                .locking_column("lock_version"),
        );
        record.write_attribute("status", "shipped").unwrap();

        assert!(ops.touch(&mut record, &["checked_at", "updated_at"]).await.unwrap());

        let ExecutedQuery::Update(query) = &executor.queries()[0] else {
            panic!("expected update");
        };
        let columns: Vec<&str> = query.assignments.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(columns, vec!["updated_at", "checked_at", "lock_version"]);
        assert_eq!(query.assignment("lock_version"), Some(&Value::from(1)));
        assert_eq!(record.read("lock_version"), &Value::from(1));

        // Unrelated pending changes survive
        assert!(record.is_attribute_changed("status"));
        assert!(!record.is_attribute_changed("lock_version"));
        assert!(!record.is_attribute_changed("checked_at"));
    }

    #[tokio::test]
    async fn test_touch_new_record_is_invalid() {
        let executor = Arc::new(RecordingExecutor::new());
        let ops = ops(&executor);
        let config = Arc::new(ModelConfig::new("Order", "orders").touch_timestamps(["updated_at"]));
        let mut record = Record::new(config, row([("id", Value::from(1))]));

        let err = ops.touch(&mut record, &[]).await.unwrap_err();
        assert!(matches!(err, ScopeError::InvalidOperation(_)));
        assert!(executor.queries().is_empty());
    }
    #[tokio::test]
    async fn test_touch_lock_overflow_leaves_record_untouched() {
        let executor = Arc::new(RecordingExecutor::new());
        let ops = ops(&executor);
        let mut record = order(
            ModelConfig::new("Order", "orders")
                .touch_timestamps(["updated_at"])
                .locking_column("lock_version"),
        );
        record.raw_write_attribute("lock_version", Value::from(i64::MAX)).unwrap();

        let err = ops.touch(&mut record, &[]).await.unwrap_err();
        assert!(matches!(err, ScopeError::InvalidOperation(_)));
        assert!(record.read("updated_at").is_null());
        assert!(executor.queries().is_empty());
    }
}
