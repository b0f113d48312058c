use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QclError {
    #[error("could not connect to {alias}: {message}")]
    Connection { alias: String, message: String },

    #[error("query failed: {0}")]
    Query(String),

    #[error("expected a row of {expected} columns, got {found}")]
    UnexpectedRow { expected: usize, found: usize },

    #[error("column '{column}' has unexpected value {found}")]
    UnexpectedColumn { column: &'static str, found: String },

    #[error("connection cache lock poisoned")]
    CachePoisoned
}
