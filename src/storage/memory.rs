use super::shard_hash::stable_shard_for;
use crate::core::{Result, Row, ScopeError, Value};
use crate::model::ModelConfig;
use crate::query::{DeleteQuery, FinderQuery, InsertQuery, QueryCondition, QueryExecutor, UpdateQuery};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{Level, event};

/// Memory backend configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBackendConfig {
    /// Number of shards each partitioned table is split into
    pub shard_count: u32,
}

impl Default for MemoryBackendConfig {
    fn default() -> Self {
        Self { shard_count: 4 }
    }
}

impl MemoryBackendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shard count (at least one)
    pub fn shard_count(mut self, shard_count: u32) -> Self {
        self.shard_count = shard_count.max(1);
        self
    }
}

/// Kind of statement recorded in a [`QueryTrace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Fetch,
    LockedFetch,
    Update,
    Delete,
    Insert,
}

/// Which shards a statement visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTrace {
    pub kind: QueryKind,
    pub table: String,
    pub shards: Vec<u32>,
}

#[derive(Debug)]
struct ShardedTable {
    /// Column deciding shard placement; `None` keeps the table on one shard
    routing_column: Option<String>,
    primary_key: String,
    shards: Vec<Vec<Row>>,
}

impl ShardedTable {
    fn shard_count(&self) -> u32 {
        self.shards.len() as u32
    }

    fn shard_for_value(&self, table: &str, value: &Value) -> u32 {
        stable_shard_for(table, value, self.shard_count())
    }

    /// Shard named by the condition's routing predicate, else every shard.
    fn route(&self, table: &str, condition: &QueryCondition) -> Vec<u32> {
        let routed = self
            .routing_column
            .as_deref()
            .and_then(|column| condition.value_for(column));
        match routed {
            Some(value) => vec![self.shard_for_value(table, value)],
            None => (0..self.shard_count()).collect(),
        }
    }
}

/// In-memory [`QueryExecutor`] holding each partitioned table in hash shards.
///
/// A query carrying an equality predicate on the table's partition key runs
/// on that one shard; any other query scatters across all shards.
pub struct MemoryBackend {
    config: MemoryBackendConfig,
    tables: RwLock<HashMap<String, Arc<RwLock<ShardedTable>>>>,
    traces: Mutex<Vec<QueryTrace>>,
}

impl MemoryBackend {
    pub fn new(config: MemoryBackendConfig) -> Self {
        Self {
            config,
            tables: RwLock::new(HashMap::new()),
            traces: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &MemoryBackendConfig {
        &self.config
    }

    /// Create the table backing `model`.
    ///
    /// Partitioned models spread over `shard_count` shards by partition key;
    /// other models live on a single shard.
    pub async fn create_table(&self, model: &ModelConfig) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.contains_key(&model.table_name) {
            return Err(ScopeError::Execution(format!(
                "table '{}' already exists",
                model.table_name
            )));
        }

        let (routing_column, shard_count) = if model.partitioning_enabled() {
            (Some(model.partition_key_name().to_string()), self.config.shard_count)
        } else {
            (None, 1)
        };
        let table = ShardedTable {
            routing_column,
            primary_key: model.primary_key_name().to_string(),
            shards: (0..shard_count).map(|_| Vec::new()).collect(),
        };

        event!(Level::DEBUG, table = %model.table_name, shard_count, "table created");
        tables.insert(model.table_name.clone(), Arc::new(RwLock::new(table)));
        Ok(())
    }

    /// Shard a row with this partition-key value lives on.
    pub async fn shard_for(&self, table: &str, partition_value: &Value) -> Result<u32> {
        let handle = self.get_table(table).await?;
        let table_guard = handle.read().await;
        Ok(table_guard.shard_for_value(table, partition_value))
    }

    pub async fn row_count(&self, table: &str) -> Result<usize> {
        let handle = self.get_table(table).await?;
        let table_guard = handle.read().await;
        Ok(table_guard.shards.iter().map(Vec::len).sum())
    }

    pub async fn shard_rows(&self, table: &str, shard: u32) -> Result<Vec<Row>> {
        let handle = self.get_table(table).await?;
        let table_guard = handle.read().await;
        table_guard
            .shards
            .get(shard as usize)
            .cloned()
            .ok_or_else(|| ScopeError::Execution(format!("table '{}' has no shard {}", table, shard)))
    }

    /// Statements executed so far, oldest first.
    pub async fn traces(&self) -> Vec<QueryTrace> {
        self.traces.lock().await.clone()
    }

    pub async fn clear_traces(&self) {
        self.traces.lock().await.clear();
    }

    async fn get_table(&self, name: &str) -> Result<Arc<RwLock<ShardedTable>>> {
        self.tables
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| ScopeError::TableNotFound(name.to_string()))
    }

    async fn trace(&self, kind: QueryKind, table: &str, shards: Vec<u32>) {
        event!(Level::TRACE, table, kind = ?kind, shards = ?shards, "query routed");
        self.traces.lock().await.push(QueryTrace {
            kind,
            table: table.to_string(),
            shards,
        });
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(MemoryBackendConfig::default())
    }
}

#[async_trait]
impl QueryExecutor for MemoryBackend {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_one(&self, query: &FinderQuery) -> Result<Option<Row>> {
        let handle = self.get_table(&query.table).await?;
        // A locked fetch holds the table exclusively while it reads.
        let (shards, found) = if query.lock {
            let table = handle.write().await;
            let shards = table.route(&query.table, &query.condition);
            let found = find_first(&table, &shards, &query.condition);
            (shards, found)
        } else {
            let table = handle.read().await;
            let shards = table.route(&query.table, &query.condition);
            let found = find_first(&table, &shards, &query.condition);
            (shards, found)
        };

        let kind = if query.lock {
            QueryKind::LockedFetch
        } else {
            QueryKind::Fetch
        };
        self.trace(kind, &query.table, shards).await;
        Ok(found)
    }

    async fn update_all(&self, query: &UpdateQuery) -> Result<u64> {
        let handle = self.get_table(&query.table).await?;
        let mut table = handle.write().await;
        let shards = table.route(&query.table, &query.condition);

        if let Some(column) = table.routing_column.clone() {
            if let Some(value) = query.assignment(&column) {
                let target = table.shard_for_value(&query.table, value);
                let moves_rows = shards.iter().any(|shard| {
                    *shard != target
                        && table.shards[*shard as usize]
                            .iter()
                            .any(|row| query.condition.matches(row))
                });
                if moves_rows {
                    return Err(ScopeError::Execution(format!(
                        "update on '{}' would move rows across shards",
                        query.table
                    )));
                }
            }
        }

        let mut affected = 0u64;
        for shard in &shards {
            for row in table.shards[*shard as usize].iter_mut() {
                if !query.condition.matches(row) {
                    continue;
                }
                for (column, value) in &query.assignments {
                    row.insert(column.clone(), value.clone());
                }
                affected += 1;
            }
        }
        drop(table);

        self.trace(QueryKind::Update, &query.table, shards).await;
        Ok(affected)
    }

    async fn delete_all(&self, query: &DeleteQuery) -> Result<u64> {
        let handle = self.get_table(&query.table).await?;
        let mut table = handle.write().await;
        let shards = table.route(&query.table, &query.condition);

        let mut affected = 0u64;
        for shard in &shards {
            let rows = &mut table.shards[*shard as usize];
            let before = rows.len();
            rows.retain(|row| !query.condition.matches(row));
            affected += (before - rows.len()) as u64;
        }
        drop(table);

        self.trace(QueryKind::Delete, &query.table, shards).await;
        Ok(affected)
    }

    async fn insert(&self, query: &InsertQuery) -> Result<u64> {
        let handle = self.get_table(&query.table).await?;
        let mut table = handle.write().await;

        let shard = match table.routing_column.as_deref() {
            Some(column) => {
                let value = query.values.get(column).filter(|value| !value.is_null()).ok_or_else(|| {
                    ScopeError::Execution(format!(
                        "insert into '{}' is missing partition key '{}'",
                        query.table, column
                    ))
                })?;
                table.shard_for_value(&query.table, value)
            }
            None => 0,
        };

        let primary_key = table.primary_key.clone();
        let id = query.values.get(&primary_key).cloned().unwrap_or(Value::Null);
        if id.is_null() {
            return Err(ScopeError::Execution(format!(
                "insert into '{}' is missing primary key '{}'",
                query.table, primary_key
            )));
        }
        // Primary keys are unique per shard, as in a real partitioned store.
        let rows = &mut table.shards[shard as usize];
        if rows.iter().any(|row| row.get(&primary_key) == Some(&id)) {
            return Err(ScopeError::Execution(format!(
                "duplicate primary key {} in '{}' shard {}",
                id, query.table, shard
            )));
        }
        rows.push(query.values.clone());
        drop(table);

        self.trace(QueryKind::Insert, &query.table, vec![shard]).await;
        Ok(1)
    }
}

fn find_first(table: &ShardedTable, shards: &[u32], condition: &QueryCondition) -> Option<Row> {
    shards.iter().find_map(|shard| {
        table.shards[*shard as usize]
            .iter()
            .find(|row| condition.matches(row))
            .cloned()
    })
}
