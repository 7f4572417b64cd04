use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("store error: {0}")]
    Store(#[from] hearth_store::StoreError),
}

pub type Result<T> = std::result::Result<T, SpawnError>;
