use super::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScopeError {
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Attribute '{attribute}' is marked as readonly on '{model}'")]
    ReadOnlyAttribute { model: String, attribute: String },

    #[error("Couldn't find {model} with '{primary_key}'={id}")]
    NotFound {
        model: String,
        primary_key: String,
        id: Value,
    },

    #[error("Update on '{model}' affected {affected} rows, expected at most one")]
    AffectedRowsInvariant { model: String, affected: u64 },

    #[error("Attempted to update a stale object: {model} with id {id}")]
    StaleObject { model: String, id: Value },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model '{0}' is not registered")]
    UnknownModel(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, ScopeError>;

impl From<std::io::Error> for ScopeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ScopeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ScopeError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}
