pub mod config;
pub mod record;
pub mod registry;

pub use config::{ModelConfig, PartitioningMetadata};
pub use record::Record;
pub use registry::ModelRegistry;
