// ============================================================================
// shardscope: shard-aware write paths for partitioned record persistence
// ============================================================================

pub mod clock;
pub mod core;
pub mod model;
pub mod persistence;
pub mod query;
pub mod scope;
pub mod storage;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

// Re-export main types for convenience
pub use clock::{Clock, FixedClock, SystemClock};
pub use crate::core::{Result, Row, ScopeError, Value, row};
pub use model::{ModelConfig, ModelRegistry, PartitioningMetadata, Record};
pub use persistence::{PersistenceOperations, ReloadOptions, ShardedPersistence};
pub use query::{
    BoundPredicate, DeleteQuery, FinderQuery, InsertQuery, QueryCondition, QueryExecutor,
    Relation, UpdateQuery,
};
pub use scope::{ScopeDescriptor, ShardScopeResolver};
pub use storage::{MemoryBackend, MemoryBackendConfig};
