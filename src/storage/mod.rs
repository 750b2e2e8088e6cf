pub mod memory;
pub mod shard_hash;

pub use memory::{MemoryBackend, MemoryBackendConfig, QueryKind, QueryTrace};
pub use shard_hash::stable_shard_for;
