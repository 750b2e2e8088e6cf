use super::ShardedPersistence;
use crate::core::{Result, ScopeError, Value};
use crate::model::Record;
use crate::query::{InsertQuery, QueryExecutor};
use tracing::{Level, event};

impl<E: QueryExecutor> ShardedPersistence<E> {
    pub(super) async fn save_record(&self, record: &mut Record) -> Result<bool> {
        if record.is_destroyed() {
            return Err(ScopeError::InvalidOperation(format!(
                "cannot save a destroyed {} record",
                record.model_name()
            )));
        }

        if record.is_new_record() {
            return self.create_record(record).await;
        }

        if !record.has_changes() {
            return Ok(true);
        }

        let affected = self.update_record_row(record, None).await?;
        match affected {
            1 => {
                record.changes_applied();
                Ok(true)
            }
            0 if record.config().locking_enabled() => {
                event!(Level::WARN, "stale object rejected by optimistic lock");
                Err(ScopeError::StaleObject {
                    model: record.model_name().to_string(),
                    id: record.id_was().clone(),
                })
            }
            0 => {
                event!(Level::WARN, "save matched no row");
                Ok(false)
            }
            affected => {
                event!(Level::ERROR, affected, "update escaped its row; check partitioning metadata");
                Err(ScopeError::AffectedRowsInvariant {
                    model: record.model_name().to_string(),
                    affected,
                })
            }
        }
    }

    async fn create_record(&self, record: &mut Record) -> Result<bool> {
        let config = record.config_arc();
        if let Some(lock_column) = &config.locking_column {
            if record.read(lock_column).is_null() {
                record.write_attribute(lock_column, Value::Integer(0))?;
            }
        }

        let query = InsertQuery {
            table: config.table_name.clone(),
            values: record.attributes().clone(),
        };
        let inserted = self.executor.insert(&query).await?;
        event!(Level::DEBUG, inserted, "record inserted");

        record.mark_persisted();
        record.changes_applied();
        Ok(inserted == 1)
    }
}
