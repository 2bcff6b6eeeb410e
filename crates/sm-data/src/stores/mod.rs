//! Persistence backends

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use sm_core::{Backend, StoreResult};
use tracing::info;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

use crate::config::StoreConfig;

/// Open the backend selected by `config`
pub fn open_backend(config: &StoreConfig) -> StoreResult<Arc<dyn Backend>> {
    match &config.path {
        Some(path) => Ok(Arc::new(SqliteBackend::open(path)?)),
        None => {
            info!("No store path configured, state will not outlive the process");
            Ok(Arc::new(MemoryBackend::new()))
        }
    }
}
