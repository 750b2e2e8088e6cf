use crate::core::{Row, Value};
use crate::scope::ScopeDescriptor;
use std::fmt;

/// `column = $n`, with the value kept apart from the statement text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundPredicate {
    pub column: String,
    pub value: Value,
}

impl BoundPredicate {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// SQL equality: `NULL` never matches.
    pub fn matches(&self, row: &Row) -> bool {
        if self.value.is_null() {
            return false;
        }
        row.get(&self.column).is_some_and(|value| value == &self.value)
    }
}

/// Conjunction of bound equality predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryCondition {
    predicates: Vec<BoundPredicate>,
}

impl QueryCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push_eq(column, value);
        self
    }

    pub fn push_eq(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.predicates.push(BoundPredicate::eq(column, value));
    }

    /// Append the partition-key predicate a scope asks for, if any.
    pub fn with_scope(mut self, scope: &ScopeDescriptor) -> Self {
        if let ScopeDescriptor::FilteredByPartitionKey { column, value } = scope {
            self.push_eq(column.clone(), value.clone());
        }
        self
    }

    pub fn predicates(&self) -> &[BoundPredicate] {
        &self.predicates
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Value bound to `column`, if the condition constrains it.
    pub fn value_for(&self, column: &str) -> Option<&Value> {
        self.predicates
            .iter()
            .find(|predicate| predicate.column == column)
            .map(|predicate| &predicate.value)
    }

    /// Bind values in placeholder order.
    pub fn bind_values(&self) -> Vec<&Value> {
        self.predicates.iter().map(|predicate| &predicate.value).collect()
    }

    /// Parameterized form, e.g. `id = $1 AND customer_id = $2`.
    pub fn to_sql(&self) -> String {
        self.predicates
            .iter()
            .enumerate()
            .map(|(idx, predicate)| format!("{} = ${}", predicate.column, idx + 1))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// True when every predicate holds for `row`. An empty condition matches all rows.
    pub fn matches(&self, row: &Row) -> bool {
        self.predicates.iter().all(|predicate| predicate.matches(row))
    }
}

impl fmt::Display for QueryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .predicates
            .iter()
            .map(|predicate| format!("{} = {}", predicate.column, predicate.value))
            .collect();
        write!(f, "{{{}}}", rendered.join(" AND "))
    }
}
