use super::{DeleteQuery, FinderQuery, QueryCondition, UpdateQuery};
use crate::core::Value;
use crate::model::ModelConfig;
use crate::scope::ScopeDescriptor;

/// Composable query over one model's table, starting from the unscoped base.
#[derive(Debug, Clone)]
pub struct Relation {
    table: String,
    condition: QueryCondition,
    lock: bool,
}

impl Relation {
    /// The model's base query with no default conditions applied.
    pub fn unscoped(config: &ModelConfig) -> Self {
        Self {
            table: config.table_name.clone(),
            condition: QueryCondition::new(),
            lock: false,
        }
    }

    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition.push_eq(column, value);
        self
    }

    pub fn scoped(mut self, scope: &ScopeDescriptor) -> Self {
        self.condition = self.condition.with_scope(scope);
        self
    }

    /// Request a row lock for the fetch.
    pub fn lock(mut self, lock: bool) -> Self {
        self.lock = lock;
        self
    }

    pub fn condition(&self) -> &QueryCondition {
        &self.condition
    }

    pub fn into_finder(self) -> FinderQuery {
        FinderQuery {
            table: self.table,
            condition: self.condition,
            lock: self.lock,
        }
    }

    pub fn into_update(self, assignments: Vec<(String, Value)>) -> UpdateQuery {
        UpdateQuery {
            table: self.table,
            condition: self.condition,
            assignments,
        }
    }

    pub fn into_delete(self) -> DeleteQuery {
        DeleteQuery {
            table: self.table,
            condition: self.condition,
        }
    }
}
