//! Explicit session state
//!
//! The dataset being viewed and the current page travel together in a
//! [`SessionState`] value instead of living in globals.

use crate::identity::FileIdentity;
use crate::rows::Dataset;

/// What the user is currently looking at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Identity of the loaded file, `None` before any import
    pub identity: Option<FileIdentity>,

    /// Rows of the loaded file
    pub dataset: Dataset,

    /// Current page, 1-based
    pub page: u32,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            identity: None,
            dataset: Dataset::default(),
            page: 1,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key under which row annotations are read and written
    pub fn annotation_key(&self) -> FileIdentity {
        self.identity.clone().unwrap_or_else(FileIdentity::global)
    }

    pub fn row_count(&self) -> usize {
        self.dataset.len()
    }

    /// Switch to a freshly loaded file
    pub fn load(&mut self, identity: FileIdentity, dataset: Dataset, page: u32) {
        self.identity = Some(identity);
        self.dataset = dataset;
        self.page = page;
    }

    /// Forget the loaded file and return to page 1
    pub fn unload(&mut self) {
        *self = Self::default();
    }
}
