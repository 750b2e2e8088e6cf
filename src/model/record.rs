use super::ModelConfig;
use crate::core::{Result, Row, ScopeError, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

static NULL: Value = Value::Null;

/// A persisted (or to-be-persisted) entity instance.
///
/// Holds the current attribute values, the values last committed to the
/// store, and the set of attributes with pending changes. A record is not
/// internally synchronized; operations take it by `&mut`.
#[derive(Debug, Clone)]
pub struct Record {
    config: Arc<ModelConfig>,
    attributes: Row,
    committed: Row,
    pending: BTreeSet<String>,
    derived_cache: HashMap<String, serde_json::Value>,
    new_record: bool,
    destroyed: bool,
}

impl Record {
    /// A record that has never been persisted.
    pub fn new(config: Arc<ModelConfig>, attributes: Row) -> Self {
        let pending = attributes.keys().cloned().collect();
        Self {
            config,
            attributes,
            committed: Row::new(),
            pending,
            derived_cache: HashMap::new(),
            new_record: true,
            destroyed: false,
        }
    }

    /// A record instantiated from a stored row.
    pub fn persisted(config: Arc<ModelConfig>, row: Row) -> Self {
        Self {
            config,
            committed: row.clone(),
            attributes: row,
            pending: BTreeSet::new(),
            derived_cache: HashMap::new(),
            new_record: false,
            destroyed: false,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn config_arc(&self) -> Arc<ModelConfig> {
        Arc::clone(&self.config)
    }

    pub fn model_name(&self) -> &str {
        &self.config.name
    }

    /// Current primary-key value.
    pub fn id(&self) -> &Value {
        self.read(self.config.primary_key_name())
    }

    /// Primary-key value as last committed, falling back to the current one.
    pub fn id_was(&self) -> &Value {
        self.attribute_was(self.config.primary_key_name())
    }

    /// Current value of `column`; missing attributes read as `NULL`.
    pub fn read(&self, column: &str) -> &Value {
        self.attributes.get(column).unwrap_or(&NULL)
    }

    pub fn attribute_was(&self, column: &str) -> &Value {
        self.committed
            .get(column)
            .or_else(|| self.attributes.get(column))
            .unwrap_or(&NULL)
    }

    pub fn attributes(&self) -> &Row {
        &self.attributes
    }

    pub fn is_new_record(&self) -> bool {
        self.new_record
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn is_persisted(&self) -> bool {
        !self.new_record && !self.destroyed
    }

    /// Assign an attribute through change tracking.
    ///
    /// The partition key of a persisted record of a partitioned model is
    /// immutable: the row cannot move between shards through an update.
    pub fn write_attribute(&mut self, column: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.check_partition_key_write(column, &value)?;

        if self.committed.get(column) == Some(&value) {
            self.pending.remove(column);
        } else {
            self.pending.insert(column.to_string());
        }
        self.attributes.insert(column.to_string(), value);
        Ok(())
    }

    /// Write a value as if it had been read from the store: no pending
    /// change is recorded and the committed value follows.
    ///
    /// Subject to the same partition-key rule as [`Record::write_attribute`].
    pub fn raw_write_attribute(&mut self, column: &str, value: Value) -> Result<()> {
        self.check_partition_key_write(column, &value)?;
        self.pending.remove(column);
        self.committed.insert(column.to_string(), value.clone());
        self.attributes.insert(column.to_string(), value);
        Ok(())
    }

    /// Replace the whole attribute set with a freshly fetched row.
    pub(crate) fn replace_attributes(&mut self, row: Row) {
        self.committed = row.clone();
        self.attributes = row;
        self.pending.clear();
    }

    /// Attributes with pending (uncommitted) changes.
    pub fn pending_changes(&self) -> &BTreeSet<String> {
        &self.pending
    }

    pub fn has_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_attribute_changed(&self, column: &str) -> bool {
        self.pending.contains(column)
    }

    /// Drop pending markers for `columns` only, committing their current values.
    pub fn clear_attribute_changes<I, S>(&mut self, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for column in columns {
            let column = column.as_ref();
            self.pending.remove(column);
            if let Some(value) = self.attributes.get(column) {
                self.committed.insert(column.to_string(), value.clone());
            }
        }
    }

    /// Commit every pending change.
    pub fn changes_applied(&mut self) {
        self.committed = self.attributes.clone();
        self.pending.clear();
    }

    /// Changed `(column, value)` pairs, optionally restricted to `names`.
    pub fn changed_values(&self, names: Option<&[String]>) -> Vec<(String, Value)> {
        self.pending
            .iter()
            .filter(|column| names.is_none_or(|names| names.iter().any(|name| name == *column)))
            .filter_map(|column| {
                self.attributes
                    .get(column)
                    .map(|value| (column.clone(), value.clone()))
            })
            .collect()
    }

    pub fn cache_derived(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.derived_cache.insert(name.into(), value);
    }

    pub fn cached_derived(&self, name: &str) -> Option<&serde_json::Value> {
        self.derived_cache.get(name)
    }

    /// Forget association and aggregation state derived from the old row.
    pub fn clear_derived_state(&mut self) {
        self.derived_cache.clear();
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.new_record = false;
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.destroyed = true;
    }

    pub(crate) fn check_partition_key_write(&self, column: &str, value: &Value) -> Result<()> {
        let partitioning = &self.config.partitioning;
        if !partitioning.enabled || self.new_record || column != partitioning.partition_key {
            return Ok(());
        }
        if self.read(column) == value {
            return Ok(());
        }
        Err(ScopeError::InvalidOperation(format!(
            "partition key '{}' of a persisted {} cannot change ({} -> {})",
            column,
            self.config.name,
            self.read(column),
            value
        )))
    }
}
