use super::ShardedPersistence;
use crate::core::{Result, Row, ScopeError};
use crate::model::Record;
use crate::query::{QueryExecutor, Relation};
use crate::scope::ShardScopeResolver;
use tracing::{Level, event};

impl<E: QueryExecutor> ShardedPersistence<E> {
    pub(super) async fn update_record_columns(
        &self,
        record: &mut Record,
        attributes: Row,
    ) -> Result<bool> {
        if record.is_new_record() {
            return Err(ScopeError::InvalidOperation(format!(
                "cannot update a new {} record",
                record.model_name()
            )));
        }
        if record.is_destroyed() {
            return Err(ScopeError::InvalidOperation(format!(
                "cannot update a destroyed {} record",
                record.model_name()
            )));
        }
        if attributes.is_empty() {
            return Err(ScopeError::InvalidOperation(
                "empty list of attributes to change".to_string(),
            ));
        }

        let config = record.config_arc();
        for (column, value) in &attributes {
            if config.is_readonly(column) {
                return Err(ScopeError::ReadOnlyAttribute {
                    model: config.name.clone(),
                    attribute: column.clone(),
                });
            }
            record.check_partition_key_write(column, value)?;
        }

        let scope = ShardScopeResolver::resolve_record(record);
        let assignments: Vec<_> = attributes
            .iter()
            .map(|(column, value)| (column.clone(), value.clone()))
            .collect();
        let query = Relation::unscoped(&config)
            .where_eq(config.primary_key_name(), record.id().clone())
            .scoped(&scope)
            .into_update(assignments);

        let affected = self.executor.update_all(&query).await?;
        event!(Level::DEBUG, scope = %scope, affected, "update_columns executed");

        for (column, value) in attributes {
            record.raw_write_attribute(&column, value)?;
        }

        if affected != 1 {
            event!(Level::WARN, affected, condition = %query.condition, "update_columns did not update exactly one row");
        }
        Ok(affected == 1)
    }
}
