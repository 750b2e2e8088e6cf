use super::{ReloadOptions, ShardedPersistence};
use crate::core::{Result, ScopeError};
use crate::model::Record;
use crate::query::{QueryExecutor, Relation};
use crate::scope::ShardScopeResolver;
use tracing::{Level, event};

impl<E: QueryExecutor> ShardedPersistence<E> {
    pub(super) async fn reload_record(
        &self,
        record: &mut Record,
        options: ReloadOptions,
    ) -> Result<()> {
        record.clear_derived_state();

        let config = record.config_arc();
        let scope = ShardScopeResolver::resolve_record(record);
        let query = Relation::unscoped(&config)
            .where_eq(config.primary_key_name(), record.id().clone())
            .scoped(&scope)
            .lock(options.lock)
            .into_finder();

        event!(Level::DEBUG, scope = %scope, condition = %query.condition, "reload fetch");

        let Some(fresh) = self.executor.fetch_one(&query).await? else {
            event!(Level::DEBUG, "reload found no row");
            return Err(ScopeError::NotFound {
                model: config.name.clone(),
                primary_key: config.primary_key_name().to_string(),
                id: record.id().clone(),
            });
        };

        record.replace_attributes(fresh);
        record.mark_persisted();
        Ok(())
    }
}
