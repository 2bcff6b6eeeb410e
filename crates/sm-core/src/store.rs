//! Identity-keyed store interfaces
//!
//! Persistence is split into three partitions: bulk row data, per-row
//! annotations and view state (last page per file, the global last page
//! and the current-file pointer). Every write resolves only after it has
//! been committed; a rejected commit returns an error and leaves the
//! previous value in place.

use async_trait::async_trait;

use crate::annotation::{AnnotationPatch, AnnotationSet, RowAnnotation};
use crate::error::StoreResult;
use crate::identity::FileIdentity;
use crate::rows::Dataset;

/// Bulk row data, identity -> dataset
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Replace the dataset stored for `id`
    async fn put_dataset(&self, id: &FileIdentity, dataset: &Dataset) -> StoreResult<()>;

    async fn get_dataset(&self, id: &FileIdentity) -> StoreResult<Option<Dataset>>;

    /// Remove the dataset for `id`.
    ///
    /// Annotations and view state for `id` are left alone.
    async fn delete_dataset(&self, id: &FileIdentity) -> StoreResult<()>;
}

/// Row annotations, identity -> annotation set
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    /// All annotations for `id`, empty when none were written
    async fn annotations(&self, id: &FileIdentity) -> StoreResult<AnnotationSet>;

    /// Read the stored set, merge `patch` into row `idx`, write the set back.
    ///
    /// Returns the row's annotation after the merge.
    async fn merge_row(
        &self,
        id: &FileIdentity,
        idx: usize,
        patch: &AnnotationPatch,
    ) -> StoreResult<RowAnnotation>;

    /// Drop every annotation for `id`
    async fn clear_annotations(&self, id: &FileIdentity) -> StoreResult<()>;
}

/// View state: last viewed page and the current-file pointer
#[async_trait]
pub trait PageStore: Send + Sync {
    async fn last_page(&self, id: &FileIdentity) -> StoreResult<Option<u32>>;

    async fn set_last_page(&self, id: &FileIdentity, page: u32) -> StoreResult<()>;

    /// Last page viewed regardless of file
    async fn global_page(&self) -> StoreResult<Option<u32>>;

    async fn set_global_page(&self, page: u32) -> StoreResult<()>;

    /// Identity of the most recently imported file
    async fn current_identity(&self) -> StoreResult<Option<FileIdentity>>;

    async fn set_current_identity(&self, id: Option<&FileIdentity>) -> StoreResult<()>;
}

/// A complete persistence backend
pub trait Backend: DatasetStore + AnnotationStore + PageStore {
    /// Short backend name for logs
    fn name(&self) -> &str;
}
