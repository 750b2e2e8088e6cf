use crate::core::Value;
use crate::model::{PartitioningMetadata, Record};
use std::fmt;

/// Extra filter a write-path query needs to reach the row's shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeDescriptor {
    /// The primary-key predicate alone addresses the row.
    Unscoped,
    /// Add `column = value` on the partition key.
    FilteredByPartitionKey { column: String, value: Value },
}

impl ScopeDescriptor {
    pub fn is_unscoped(&self) -> bool {
        matches!(self, Self::Unscoped)
    }

    pub fn partition_value(&self) -> Option<&Value> {
        match self {
            Self::Unscoped => None,
            Self::FilteredByPartitionKey { value, .. } => Some(value),
        }
    }
}

impl fmt::Display for ScopeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unscoped => write!(f, "unscoped"),
            Self::FilteredByPartitionKey { column, value } => write!(f, "{} = {}", column, value),
        }
    }
}

/// Decides whether a query on a record needs a partition-key filter.
pub struct ShardScopeResolver;

impl ShardScopeResolver {
    /// Resolve the scope for a partition-key value.
    ///
    /// Missing metadata, disabled partitioning, and a partition key equal to
    /// the primary key all resolve to [`ScopeDescriptor::Unscoped`].
    pub fn resolve(
        metadata: Option<&PartitioningMetadata>,
        partition_key_value: &Value,
    ) -> ScopeDescriptor {
        match metadata {
            Some(metadata) if metadata.requires_partition_filter() => {
                ScopeDescriptor::FilteredByPartitionKey {
                    column: metadata.partition_key.clone(),
                    value: partition_key_value.clone(),
                }
            }
            _ => ScopeDescriptor::Unscoped,
        }
    }

    /// Resolve the scope from the record's current partition-key value.
    pub fn resolve_record(record: &Record) -> ScopeDescriptor {
        let metadata = &record.config().partitioning;
        Self::resolve(Some(metadata), record.read(&metadata.partition_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::row;
    use crate::model::ModelConfig;
    use std::sync::Arc;

    #[test]
    fn test_disabled_partitioning_is_unscoped() {
        let metadata = PartitioningMetadata {
            enabled: false,
            partition_key: "customer_id".to_string(),
            primary_key: "id".to_string(),
        };
        for value in [Value::Null, Value::from(1), Value::from("x")] {
            assert_eq!(
                ShardScopeResolver::resolve(Some(&metadata), &value),
                ScopeDescriptor::Unscoped
            );
        }
    }

    #[test]
    fn test_coinciding_keys_are_unscoped() {
        let metadata = PartitioningMetadata::new("id", "id");
        for value in [Value::from(5), Value::from(-1), Value::Null] {
            assert!(ShardScopeResolver::resolve(Some(&metadata), &value).is_unscoped());
        }
    }

    #[test]
    fn test_missing_metadata_is_unscoped() {
        assert!(ShardScopeResolver::resolve(None, &Value::from(7)).is_unscoped());
    }

    #[test]
    fn test_distinct_keys_filter_by_current_value() {
        let config = Arc::new(ModelConfig::new("Order", "orders").partition_key("customer_id"));
        let record = Record::persisted(
            config,
            row([("id", Value::from(42)), ("customer_id", Value::from(7))]),
        );

        let scope = ShardScopeResolver::resolve_record(&record);
        assert_eq!(
            scope,
            ScopeDescriptor::FilteredByPartitionKey {
                column: "customer_id".to_string(),
                value: Value::from(7),
            }
        );
        assert_eq!(scope.to_string(), "customer_id = 7");
    }

    #[test]
    fn test_new_record_reads_value_at_call_time() {
        let config = Arc::new(ModelConfig::new("Order", "orders").partition_key("customer_id"));
        let mut record = Record::new(config, row([("customer_id", Value::from(1))]));
        record.write_attribute("customer_id", 2).unwrap();

        let scope = ShardScopeResolver::resolve_record(&record);
        assert_eq!(scope.partition_value(), Some(&Value::from(2)));
    }
}
