//! Persistence backends, import and session handling for sheetmark

pub mod config;
pub mod confirm;
pub mod export;
pub mod sources;
pub mod stores;
pub mod workbench;

use arrow::error::ArrowError;
use sm_core::StoreError;
use tokio::task::JoinError;
use thiserror::Error;

// Re-exports
pub use config::{ImportConfig, StoreConfig, WorkbenchConfig};
pub use confirm::{Confirm, Outcome};
pub use sources::{CsvSheetParser, SheetParser};
pub use stores::{open_backend, MemoryBackend, SqliteBackend};
pub use workbench::{PageRow, Workbench};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("Failed to parse '{file}': {reason}")]
    Parse { file: String, reason: String },

    #[error("Persistence failure: {0}")]
    Store(#[from] StoreError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Join error: {0}")]
    Join(#[from] JoinError),

    #[error("Row {index} out of range (dataset has {row_count} rows)")]
    RowOutOfRange { index: usize, row_count: usize },

    #[error("No file is loaded")]
    NoDataset,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => DataError::Csv(error.to_string()),
        }
    }
}

pub type DataResult<T> = Result<T, DataError>;
