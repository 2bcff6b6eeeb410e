//! In-memory backend
//!
//! Behaves like the persistent backends, including rejected commits:
//! [`MemoryBackend::fail_commits`] makes every following write fail
//! without touching the stored values.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use async_trait::async_trait;
use parking_lot::RwLock;
use sm_core::{
    AnnotationPatch, AnnotationSet, AnnotationStore, Backend, Dataset, DatasetStore, FileIdentity,
    PageStore, RowAnnotation, StoreError, StoreResult,
};
use tracing::debug;

#[derive(Default)]
struct Partitions {
    datasets: AHashMap<FileIdentity, Dataset>,
    annotations: AHashMap<FileIdentity, AnnotationSet>,
    pages: AHashMap<FileIdentity, u32>,
    global_page: Option<u32>,
    current: Option<FileIdentity>,
}

/// Backend keeping every partition in process memory
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<Partitions>>,
    fail_commits: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail (or succeed again)
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Number of stored datasets
    pub fn dataset_count(&self) -> usize {
        self.state.read().datasets.len()
    }

    fn commit<T>(&self, what: &str, apply: impl FnOnce(&mut Partitions) -> T) -> StoreResult<T> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Commit(format!("{} rejected", what)));
        }
        let mut state = self.state.write();
        debug!(what = what, "memory commit");
        Ok(apply(&mut state))
    }
}

#[async_trait]
impl DatasetStore for MemoryBackend {
    async fn put_dataset(&self, id: &FileIdentity, dataset: &Dataset) -> StoreResult<()> {
        self.commit("put dataset", |state| {
            state.datasets.insert(id.clone(), dataset.clone());
        })
    }

    async fn get_dataset(&self, id: &FileIdentity) -> StoreResult<Option<Dataset>> {
        Ok(self.state.read().datasets.get(id).cloned())
    }

    async fn delete_dataset(&self, id: &FileIdentity) -> StoreResult<()> {
        self.commit("delete dataset", |state| {
            state.datasets.remove(id);
        })
    }
}

#[async_trait]
impl AnnotationStore for MemoryBackend {
    async fn annotations(&self, id: &FileIdentity) -> StoreResult<AnnotationSet> {
        Ok(self.state.read().annotations.get(id).cloned().unwrap_or_default())
    }

    async fn merge_row(
        &self,
        id: &FileIdentity,
        idx: usize,
        patch: &AnnotationPatch,
    ) -> StoreResult<RowAnnotation> {
        // Merge into a copy so a rejected commit leaves the stored set as it was.
        let mut set = self.annotations(id).await?;
        let merged = set.merge_row(idx, patch);
        self.commit("merge annotation", |state| {
            state.annotations.insert(id.clone(), set);
        })?;
        Ok(merged)
    }

    async fn clear_annotations(&self, id: &FileIdentity) -> StoreResult<()> {
        self.commit("clear annotations", |state| {
            state.annotations.remove(id);
        })
    }
}

#[async_trait]
impl PageStore for MemoryBackend {
    async fn last_page(&self, id: &FileIdentity) -> StoreResult<Option<u32>> {
        Ok(self.state.read().pages.get(id).copied())
    }

    async fn set_last_page(&self, id: &FileIdentity, page: u32) -> StoreResult<()> {
        self.commit("set page", |state| {
            state.pages.insert(id.clone(), page);
        })
    }

    async fn global_page(&self) -> StoreResult<Option<u32>> {
        Ok(self.state.read().global_page)
    }

    async fn set_global_page(&self, page: u32) -> StoreResult<()> {
        self.commit("set global page", |state| {
            state.global_page = Some(page);
        })
    }

    async fn current_identity(&self) -> StoreResult<Option<FileIdentity>> {
        Ok(self.state.read().current.clone())
    }

    async fn set_current_identity(&self, id: Option<&FileIdentity>) -> StoreResult<()> {
        self.commit("set current file", |state| {
            state.current = id.cloned();
        })
    }
}

impl Backend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sm_core::{Bookmark, RowRecord};

    fn id(key: &str) -> FileIdentity {
        FileIdentity::from_key(key)
    }

    #[tokio::test]
    async fn test_dataset_put_replaces() {
        let store = MemoryBackend::new();
        let first = Dataset::new(vec![RowRecord::default(); 3]);
        let second = Dataset::new(vec![RowRecord::default()]);

        store.put_dataset(&id("a"), &first).await.unwrap();
        store.put_dataset(&id("a"), &second).await.unwrap();

        assert_eq!(store.get_dataset(&id("a")).await.unwrap(), Some(second));
        assert_eq!(store.get_dataset(&id("b")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_annotations_are_partitioned() {
        let store = MemoryBackend::new();
        store.merge_row(&id("a"), 1, &AnnotationPatch::messaged(true)).await.unwrap();
        store.merge_row(&id("b"), 1, &AnnotationPatch::bookmark(Bookmark::Start)).await.unwrap();

        let a = store.annotations(&id("a")).await.unwrap();
        let b = store.annotations(&id("b")).await.unwrap();
        assert_eq!(a.get(1), RowAnnotation { messaged: true, bookmark: Bookmark::None });
        assert_eq!(b.get(1), RowAnnotation { messaged: false, bookmark: Bookmark::Start });

        store.clear_annotations(&id("a")).await.unwrap();
        assert!(store.annotations(&id("a")).await.unwrap().is_empty());
        assert_eq!(store.annotations(&id("b")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_commit_keeps_previous_value() {
        let store = MemoryBackend::new();
        store.merge_row(&id("a"), 0, &AnnotationPatch::messaged(true)).await.unwrap();

        store.fail_commits(true);
        let err = store.merge_row(&id("a"), 0, &AnnotationPatch::messaged(false)).await;
        assert!(matches!(err, Err(StoreError::Commit(_))));
        assert!(store.put_dataset(&id("a"), &Dataset::default()).await.is_err());

        store.fail_commits(false);
        assert!(store.annotations(&id("a")).await.unwrap().get(0).messaged);
        assert_eq!(store.dataset_count(), 0);
    }

    #[tokio::test]
    async fn test_page_state() {
        let store = MemoryBackend::new();
        assert_eq!(store.last_page(&id("a")).await.unwrap(), None);
        assert_eq!(store.global_page().await.unwrap(), None);

        store.set_last_page(&id("a"), 4).await.unwrap();
        store.set_global_page(4).await.unwrap();
        store.set_current_identity(Some(&id("a"))).await.unwrap();

        assert_eq!(store.last_page(&id("a")).await.unwrap(), Some(4));
        assert_eq!(store.global_page().await.unwrap(), Some(4));
        assert_eq!(store.current_identity().await.unwrap(), Some(id("a")));

        store.set_current_identity(None).await.unwrap();
        assert_eq!(store.current_identity().await.unwrap(), None);
    }
}
