use thiserror::Error;

/// Failures surfaced by the store. `NotFound` is recoverable; the rest mean
/// the underlying engine or runtime failed and the operation did not happen.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("note {0} not found")]
    NotFound(i64),

    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
