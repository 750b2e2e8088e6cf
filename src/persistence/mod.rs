//! Shard-aware write-path operations.
//!
//! Every operation routes its query through
//! [`ShardScopeResolver`](crate::scope::ShardScopeResolver) so that a
//! row of a partitioned table is addressed by primary key *and* partition key
//! whenever the two differ.

mod delete;
mod reload;
mod save;
mod touch;
mod update_columns;
mod update_row;

use crate::clock::{Clock, SystemClock};
use crate::core::{Result, Row};
use crate::model::Record;
use crate::query::{QueryCondition, QueryExecutor};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{Instrument, info_span};

/// Options for [`PersistenceOperations::reload`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReloadOptions {
    /// Fetch under a pessimistic row lock.
    pub lock: bool,
}

impl ReloadOptions {
    pub fn locked() -> Self {
        Self { lock: true }
    }
}

/// Write-path operations on a record, each scoped to the row's shard.
#[async_trait]
pub trait PersistenceOperations: Send + Sync {
    /// Re-read the row and replace the record's attributes with it.
    async fn reload(&self, record: &mut Record, options: ReloadOptions) -> Result<()>;

    /// Set the touch timestamps (plus `extra_columns`) to now.
    ///
    /// Returns true iff exactly one row was updated.
    async fn touch(&self, record: &mut Record, extra_columns: &[&str]) -> Result<bool>;

    /// Write `attributes` straight to the row, skipping change tracking.
    ///
    /// Returns true iff exactly one row was updated.
    async fn update_columns(&self, record: &mut Record, attributes: Row) -> Result<bool>;

    /// Condition addressing the record's row for a delete statement.
    fn build_delete_condition(&self, record: &Record) -> QueryCondition;

    /// Write the record's changed attributes and return the affected row count.
    async fn update_row(
        &self,
        record: &mut Record,
        attribute_names: Option<&[String]>,
    ) -> Result<u64>;
}

/// [`PersistenceOperations`] over a concrete query backend.
pub struct ShardedPersistence<E> {
    executor: E,
    clock: Arc<dyn Clock>,
}

impl<E: QueryExecutor> ShardedPersistence<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for touch timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Delete the record's row and mark the record destroyed.
    pub async fn destroy(&self, record: &mut Record) -> Result<u64> {
        let span = info_span!(
            "persistence.destroy",
            model = %record.model_name(),
            id = %record.id()
        );
        self.destroy_record(record).instrument(span).await
    }

    /// Insert a new record or write a persisted record's pending changes.
    pub async fn save(&self, record: &mut Record) -> Result<bool> {
        let span = info_span!(
            "persistence.save",
            model = %record.model_name(),
            id = %record.id(),
            new_record = record.is_new_record()
        );
        self.save_record(record).instrument(span).await
    }
}

#[async_trait]
impl<E: QueryExecutor> PersistenceOperations for ShardedPersistence<E> {
    async fn reload(&self, record: &mut Record, options: ReloadOptions) -> Result<()> {
        let span = info_span!(
            "persistence.reload",
            model = %record.model_name(),
            id = %record.id(),
            lock = options.lock
        );
        self.reload_record(record, options).instrument(span).await
    }

    async fn touch(&self, record: &mut Record, extra_columns: &[&str]) -> Result<bool> {
        let span = info_span!(
            "persistence.touch",
            model = %record.model_name(),
            id = %record.id()
        );
        self.touch_record(record, extra_columns).instrument(span).await
    }

    async fn update_columns(&self, record: &mut Record, attributes: Row) -> Result<bool> {
        let span = info_span!(
            "persistence.update_columns",
            model = %record.model_name(),
            id = %record.id()
        );
        self.update_record_columns(record, attributes)
            .instrument(span)
            .await
    }

    fn build_delete_condition(&self, record: &Record) -> QueryCondition {
        delete::delete_condition(record)
    }

    async fn update_row(
        &self,
        record: &mut Record,
        attribute_names: Option<&[String]>,
    ) -> Result<u64> {
        let span = info_span!(
            "persistence.update_row",
            model = %record.model_name(),
            id = %record.id_was()
        );
        self.update_record_row(record, attribute_names)
            .instrument(span)
            .await
    }
}
