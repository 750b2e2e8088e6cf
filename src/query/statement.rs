use super::QueryCondition;
use crate::core::{Row, Value};
use std::fmt;

/// Fetch at most one row, optionally under a row lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinderQuery {
    pub table: String,
    pub condition: QueryCondition,
    pub lock: bool,
}

/// `UPDATE table SET assignments WHERE condition`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateQuery {
    pub table: String,
    pub condition: QueryCondition,
    pub assignments: Vec<(String, Value)>,
}

impl UpdateQuery {
    pub fn assignment(&self, column: &str) -> Option<&Value> {
        self.assignments
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}

/// `DELETE FROM table WHERE condition`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteQuery {
    pub table: String,
    pub condition: QueryCondition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertQuery {
    pub table: String,
    pub values: Row,
}

impl fmt::Display for FinderQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT * FROM {} WHERE {} LIMIT 1", self.table, self.condition.to_sql())?;
        if self.lock {
            write!(f, " FOR UPDATE")?;
        }
        Ok(())
    }
}

impl fmt::Display for UpdateQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let offset = self.condition.len();
        let set: Vec<String> = self
            .assignments
            .iter()
            .enumerate()
            .map(|(idx, (column, _))| format!("{} = ${}", column, offset + idx + 1))
            .collect();
        write!(
            f,
            "UPDATE {} SET {} WHERE {}",
            self.table,
            set.join(", "),
            self.condition.to_sql()
        )
    }
}

impl fmt::Display for DeleteQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DELETE FROM {} WHERE {}", self.table, self.condition.to_sql())
    }
}

impl fmt::Display for InsertQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns: Vec<&str> = self.values.keys().map(String::as_str).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|idx| format!("${}", idx)).collect();
        write!(
            f,
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            placeholders.join(", ")
        )
    }
}
