//! Scripted [`QueryExecutor`] for exercising persistence operations without a store.

use crate::core::{Result, Row, ScopeError};
use crate::query::{DeleteQuery, FinderQuery, InsertQuery, QueryExecutor, UpdateQuery};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A query as it reached the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutedQuery {
    Fetch(FinderQuery),
    Update(UpdateQuery),
    Delete(DeleteQuery),
    Insert(InsertQuery),
}

#[derive(Debug)]
enum Scripted {
    Row(Option<Row>),
    Affected(u64),
    Error(ScopeError),
}

/// Replays scripted responses in order and records every query it receives.
///
/// Fetches consume a scripted row, writes consume a scripted affected count.
/// Running out of script, or a response of the wrong kind, is an execution error.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    script: Mutex<VecDeque<Scripted>>,
    queries: Mutex<Vec<ExecutedQuery>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_row(&self, row: Option<Row>) {
        self.push(Scripted::Row(row));
    }

    pub fn push_affected(&self, affected: u64) {
        self.push(Scripted::Affected(affected));
    }

    pub fn push_error(&self, error: ScopeError) {
        self.push(Scripted::Error(error));
    }

    /// Every query executed so far, oldest first.
    pub fn queries(&self) -> Vec<ExecutedQuery> {
        match self.queries.lock() {
            Ok(queries) => queries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push(&self, scripted: Scripted) {
        match self.script.lock() {
            Ok(mut script) => script.push_back(scripted),
            Err(poisoned) => poisoned.into_inner().push_back(scripted),
        }
    }

    fn next(&self, query: ExecutedQuery) -> Result<Scripted> {
        let kind = match &query {
            ExecutedQuery::Fetch(_) => "fetch",
            ExecutedQuery::Update(_) => "update",
            ExecutedQuery::Delete(_) => "delete",
            ExecutedQuery::Insert(_) => "insert",
        };
        self.queries.lock()?.push(query);
        self.script
            .lock()?
            .pop_front()
            .ok_or_else(|| ScopeError::Execution(format!("no scripted response for {}", kind)))
    }

    fn next_affected(&self, query: ExecutedQuery) -> Result<u64> {
        match self.next(query)? {
            Scripted::Affected(affected) => Ok(affected),
            Scripted::Error(error) => Err(error),
            Scripted::Row(_) => Err(ScopeError::Execution(
                "scripted a row for a write query".to_string(),
            )),
        }
    }
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    fn backend_name(&self) -> &'static str {
        "recording"
    }

    async fn fetch_one(&self, query: &FinderQuery) -> Result<Option<Row>> {
        match self.next(ExecutedQuery::Fetch(query.clone()))? {
            Scripted::Row(row) => Ok(row),
            Scripted::Error(error) => Err(error),
            Scripted::Affected(_) => Err(ScopeError::Execution(
                "scripted an affected count for a fetch".to_string(),
            )),
        }
    }

    async fn update_all(&self, query: &UpdateQuery) -> Result<u64> {
        self.next_affected(ExecutedQuery::Update(query.clone()))
    }

    async fn delete_all(&self, query: &DeleteQuery) -> Result<u64> {
        self.next_affected(ExecutedQuery::Delete(query.clone()))
    }

    async fn insert(&self, query: &InsertQuery) -> Result<u64> {
        self.next_affected(ExecutedQuery::Insert(query.clone()))
    }
}
