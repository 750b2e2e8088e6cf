use super::ShardedPersistence;
use crate::core::{Result, ScopeError, Value};
use crate::model::Record;
use crate::query::{QueryExecutor, Relation};
use crate::scope::ShardScopeResolver;
use tracing::{Level, event};

impl<E: QueryExecutor> ShardedPersistence<E> {
    pub(super) async fn update_record_row(
        &self,
        record: &mut Record,
        attribute_names: Option<&[String]>,
    ) -> Result<u64> {
        let mut assignments = record.changed_values(attribute_names);
        if assignments.is_empty() {
            event!(Level::DEBUG, "no changed attributes, update skipped");
            return Ok(0);
        }

        let config = record.config_arc();
        let scope = ShardScopeResolver::resolve_record(record);
        let mut relation = Relation::unscoped(&config)
            .where_eq(config.primary_key_name(), record.id_was().clone())
            .scoped(&scope);

        // Optimistic locking: bump the version and require the previous one.
        let mut previous_lock = None;
        if let Some(lock_column) = &config.locking_column {
            let previous = record.read(lock_column).clone();
            let next = next_lock_value(record, lock_column)?;
            record.write_attribute(lock_column, next)?;
            assignments.retain(|(column, _)| column != lock_column);
            assignments.push((lock_column.clone(), Value::Integer(next)));
            relation = relation.where_eq(lock_column.clone(), Value::Integer(next - 1));
            previous_lock = Some((lock_column, previous));
        }

        let query = relation.into_update(assignments);
        let outcome = self.executor.update_all(&query).await;
        let restore_lock = !matches!(outcome, Ok(affected) if affected > 0);
        if restore_lock {
            if let Some((lock_column, previous)) = previous_lock {
                record.write_attribute(lock_column, previous)?;
            }
        }

        let affected = outcome?;
        event!(Level::DEBUG, scope = %scope, condition = %query.condition, affected, "update_row executed");
        Ok(affected)
    }
}

/// Lock column value after one more committed write.
pub(super) fn next_lock_value(record: &Record, lock_column: &str) -> Result<i64> {
    let current = record.read(lock_column).as_i64().unwrap_or(0);
    current.checked_add(1).ok_or_else(|| {
        ScopeError::InvalidOperation(format!(
            "lock column '{}' of {} overflowed at {}",
            lock_column,
            record.model_name(),
            current
        ))
    })
}
