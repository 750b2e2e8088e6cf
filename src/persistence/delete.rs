use super::ShardedPersistence;
use crate::core::Result;
use crate::model::Record;
use crate::query::{DeleteQuery, QueryCondition, QueryExecutor};
use crate::scope::ShardScopeResolver;
use tracing::{Level, event};

/// `pk = $1`, plus `partition_key = $2` when the keys differ on a partitioned model.
pub(super) fn delete_condition(record: &Record) -> QueryCondition {
    QueryCondition::new()
        .and_eq(record.config().primary_key_name(), record.id().clone())
        .with_scope(&ShardScopeResolver::resolve_record(record))
}

impl<E: QueryExecutor> ShardedPersistence<E> {
    pub(super) async fn destroy_record(&self, record: &mut Record) -> Result<u64> {
        let mut affected = 0;
        if record.is_persisted() {
            let query = DeleteQuery {
                table: record.config().table_name.clone(),
                condition: delete_condition(record),
            };
            affected = self.executor.delete_all(&query).await?;
            event!(Level::DEBUG, condition = %query.condition, affected, "destroy executed");
        }
        record.mark_destroyed();
        Ok(affected)
    }
}
