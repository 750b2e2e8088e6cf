pub mod error;
pub mod types;
pub mod value;

pub use error::{Result, ScopeError};
pub use types::{Row, row};
pub use value::Value;
