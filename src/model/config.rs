use crate::core::{Result, ScopeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Class-level partitioning metadata shared by every record of a model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartitioningMetadata {
    /// When false, shard scoping never activates for the model.
    #[serde(default)]
    pub enabled: bool,
    /// Column whose value decides which shard holds a row.
    #[serde(default)]
    pub partition_key: String,
    /// Column uniquely identifying a row within its table.
    pub primary_key: String,
}

impl PartitioningMetadata {
    /// Partitioning enabled, keyed by `partition_key`.
    pub fn new(primary_key: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            enabled: true,
            partition_key: partition_key.into(),
            primary_key: primary_key.into(),
        }
    }

    /// Partitioning disabled. The partition key mirrors the primary key.
    pub fn disabled(primary_key: impl Into<String>) -> Self {
        let primary_key = primary_key.into();
        Self {
            enabled: false,
            partition_key: primary_key.clone(),
            primary_key,
        }
    }

    /// True when a primary-key predicate alone cannot pin a row to its shard.
    pub fn requires_partition_filter(&self) -> bool {
        self.enabled && self.primary_key != self.partition_key
    }
}

/// Immutable per-model configuration, attached to records at registration time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelConfig {
    /// Model name used in errors and logs
    pub name: String,

    /// Backing table
    pub table_name: String,

    pub partitioning: PartitioningMetadata,

    /// Optimistic locking version column; locking is enabled when present
    #[serde(default)]
    pub locking_column: Option<String>,

    /// Attributes that may never be written after creation
    #[serde(default)]
    pub readonly_attributes: BTreeSet<String>,

    /// Timestamp columns refreshed by `touch`
    #[serde(default)]
    pub touch_timestamp_columns: Vec<String>,
}

impl ModelConfig {
    /// Create a non-partitioned model keyed by `id`
    pub fn new(name: &str, table_name: &str) -> Self {
        Self {
            name: name.to_string(),
            table_name: table_name.to_string(),
            partitioning: PartitioningMetadata::disabled("id"),
            locking_column: None,
            readonly_attributes: BTreeSet::new(),
            touch_timestamp_columns: Vec::new(),
        }
    }

    /// Set the primary key column
    pub fn primary_key(mut self, column: &str) -> Self {
        if !self.partitioning.enabled {
            self.partitioning.partition_key = column.to_string();
        }
        self.partitioning.primary_key = column.to_string();
        self
    }

    /// Enable partitioning on `column`
    pub fn partition_key(mut self, column: &str) -> Self {
        self.partitioning.enabled = true;
        self.partitioning.partition_key = column.to_string();
        self
    }

    /// Enable optimistic locking through `column`
    pub fn locking_column(mut self, column: &str) -> Self {
        self.locking_column = Some(column.to_string());
        self
    }

    /// Mark an attribute as readonly
    pub fn readonly(mut self, attribute: &str) -> Self {
        self.readonly_attributes.insert(attribute.to_string());
        self
    }

    /// Set the timestamp columns refreshed by `touch`
    pub fn touch_timestamps<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.touch_timestamp_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn primary_key_name(&self) -> &str {
        &self.partitioning.primary_key
    }

    pub fn partition_key_name(&self) -> &str {
        &self.partitioning.partition_key
    }

    pub fn partitioning_enabled(&self) -> bool {
        self.partitioning.enabled
    }

    pub fn locking_enabled(&self) -> bool {
        self.locking_column.is_some()
    }

    pub fn is_readonly(&self, attribute: &str) -> bool {
        self.readonly_attributes.contains(attribute)
    }

    /// Check the invariants every registered model must hold.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ScopeError::Config("model name must not be empty".to_string()));
        }
        if self.table_name.is_empty() {
            return Err(ScopeError::Config(format!(
                "model '{}' has an empty table name",
                self.name
            )));
        }
        if self.partitioning.primary_key.is_empty() {
            return Err(ScopeError::Config(format!(
                "model '{}' has an empty primary key",
                self.name
            )));
        }
        if self.partitioning.enabled && self.partitioning.partition_key.is_empty() {
            return Err(ScopeError::Config(format!(
                "model '{}' enables partitioning without a partition key",
                self.name
            )));
        }
        if let Some(column) = &self.locking_column {
            if self.is_readonly(column) {
                return Err(ScopeError::Config(format!(
                    "model '{}' declares locking column '{}' as readonly",
                    self.name, column
                )));
            }
        }
        Ok(())
    }
}
