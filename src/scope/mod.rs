pub mod resolver;

pub use resolver::{ScopeDescriptor, ShardScopeResolver};
