//! Errors surfaced by store backends

use thiserror::Error;

/// Errors that can occur in store operations.
///
/// Every backend maps its native failures into one of these. A store
/// operation that returns an error did not take effect.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store read failed: {0}")]
    Read(String),

    #[error("Store commit failed: {0}")]
    Commit(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt stored value for '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
