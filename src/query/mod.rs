pub mod condition;
pub mod executor;
pub mod relation;
pub mod statement;

pub use condition::{BoundPredicate, QueryCondition};
pub use executor::QueryExecutor;
pub use relation::Relation;
pub use statement::{DeleteQuery, FinderQuery, InsertQuery, UpdateQuery};
