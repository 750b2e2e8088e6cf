use super::{DeleteQuery, FinderQuery, InsertQuery, UpdateQuery};
use crate::core::{Result, Row};
use async_trait::async_trait;
use std::sync::Arc;

/// The ORM runtime's query execution surface.
///
/// Errors are returned as-is to the caller of a persistence operation.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Fetch the first row matching the query, if any.
    async fn fetch_one(&self, query: &FinderQuery) -> Result<Option<Row>>;

    /// Run an update and return the number of affected rows.
    async fn update_all(&self, query: &UpdateQuery) -> Result<u64>;

    /// Run a delete and return the number of affected rows.
    async fn delete_all(&self, query: &DeleteQuery) -> Result<u64>;

    async fn insert(&self, query: &InsertQuery) -> Result<u64>;
}

#[async_trait]
impl<E: QueryExecutor + ?Sized> QueryExecutor for Arc<E> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    async fn fetch_one(&self, query: &FinderQuery) -> Result<Option<Row>> {
        (**self).fetch_one(query).await
    }

    async fn update_all(&self, query: &UpdateQuery) -> Result<u64> {
        (**self).update_all(query).await
    }

    async fn delete_all(&self, query: &DeleteQuery) -> Result<u64> {
        (**self).delete_all(query).await
    }

    async fn insert(&self, query: &InsertQuery) -> Result<u64> {
        (**self).insert(query).await
    }
}
