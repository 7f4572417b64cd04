use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: i64 },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid {field}: {value}")]
    Invalid { field: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
