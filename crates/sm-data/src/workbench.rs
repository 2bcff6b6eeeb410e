//! Import orchestration and the interactive session
//!
//! A [`Workbench`] owns the explicit [`SessionState`] and drives the
//! stores through every user action: importing a file, paging, editing
//! row annotations and the two destructive actions. Each step of an
//! action waits for the previous one to commit.
//!
//! When a write fails after the in-memory view was updated (page changes)
//! the view can be ahead of the stored state until the next successful
//! write. Nothing is retried.

use std::sync::Arc;

use sm_core::events::events::{
    AnnotationChanged, AnnotationsCleared, DatasetImported, DatasetRemoved, PageChanged,
};
use sm_core::{
    counting_range, AnnotationPatch, AnnotationStore, Backend, Bookmark, CountingRange, Dataset,
    DatasetStore, EventBus, FileIdentity, IdentityResolver, PageStore, PageView, Paginator,
    RowAnnotation, RowRecord, SessionState,
};
use tracing::{debug, info, warn};

use crate::config::{ImportConfig, WorkbenchConfig};
use crate::confirm::{Confirm, Outcome};
use crate::sources::{CsvSheetParser, SheetParser};
use crate::stores::open_backend;
use crate::{DataError, DataResult};

const CLEAR_PROMPT: &str = "Clear all checkmarks & bookmarks for this file?";
const REMOVE_PROMPT: &str = "Remove current file? (Table will be emptied, bookmarks/states will be kept)";

/// One row of the visible page with its annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRow {
    /// 0-based row index in the dataset
    pub index: usize,
    pub record: RowRecord,
    pub annotation: RowAnnotation,
}

/// Session driver over a persistence backend
pub struct Workbench {
    backend: Arc<dyn Backend>,
    parser: Box<dyn SheetParser>,
    resolver: IdentityResolver,
    paginator: Paginator,
    import: ImportConfig,
    events: Arc<EventBus>,
    state: SessionState,
}

impl Workbench {
    pub fn new(backend: Arc<dyn Backend>, parser: Box<dyn SheetParser>, config: &WorkbenchConfig) -> Self {
        Self {
            backend,
            parser,
            resolver: IdentityResolver::new(),
            paginator: Paginator::new(config.pagination),
            import: config.import.clone(),
            events: Arc::new(EventBus::new()),
            state: SessionState::new(),
        }
    }

    /// Open the configured backend with the CSV parser
    pub fn from_config(config: &WorkbenchConfig) -> DataResult<Self> {
        config.validate()?;
        let backend = open_backend(&config.store)?;
        let parser = CsvSheetParser::new(&config.import)?;
        info!(backend = backend.name(), "Workbench ready");
        Ok(Self::new(backend, Box::new(parser), config))
    }

    pub fn with_resolver(mut self, resolver: IdentityResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Layout of the current page
    pub fn page_view(&self) -> PageView {
        self.paginator.view(self.state.page, self.state.row_count())
    }

    /// Reload the file that was current when the last session ended
    pub async fn restore(&mut self) -> DataResult<PageView> {
        match self.backend.current_identity().await? {
            Some(identity) => {
                let dataset = self.backend.get_dataset(&identity).await?;
                if dataset.is_none() {
                    warn!(file = %identity, "Current file has no stored rows");
                }
                let page = self.backend.last_page(&identity).await?.unwrap_or(1);

                info!(file = %identity, page, "Restoring session");
                self.state.load(identity, dataset.unwrap_or_default(), page);
            }
            None => {
                self.state.unload();
                self.state.page = self.backend.global_page().await?.unwrap_or(1);
            }
        }

        self.go_to_page(self.state.page).await
    }

    /// Import a file and show its last viewed page.
    ///
    /// Nothing is written when the content cannot be parsed. Annotations
    /// stored for the same identity reappear unchanged.
    pub async fn import(&mut self, name: &str, content: &[u8]) -> DataResult<PageView> {
        let identity = self.resolver.resolve(name, content.len() as u64, content);
        debug!(file = %identity, "Resolved file identity");

        let cells = self.parser.parse(content).map_err(|e| DataError::Parse {
            file: name.to_string(),
            reason: format!("{:#}", e),
        })?;
        let dataset = Dataset::from_cells(&cells, self.import.first_column);

        self.backend.put_dataset(&identity, &dataset).await?;
        self.backend.set_current_identity(Some(&identity)).await?;

        let page = self.backend.last_page(&identity).await?.unwrap_or(1);
        let row_count = dataset.len();
        info!(file = %identity, rows = row_count, page, "Imported file");

        self.state.load(identity.clone(), dataset, page);
        let view = self.go_to_page(page).await?;

        self.events.publish(DatasetImported {
            identity,
            row_count,
            resumed_page: view.page,
        });

        Ok(view)
    }

    /// Show `page`, clamped into range, and remember it
    pub async fn go_to_page(&mut self, page: u32) -> DataResult<PageView> {
        let view = self.page_view_for(page);
        self.state.page = view.page;

        if let Some(identity) = &self.state.identity {
            self.backend.set_last_page(identity, view.page).await?;
        }
        self.backend.set_global_page(view.page).await?;

        self.events.publish(PageChanged {
            identity: self.state.identity.clone(),
            page: view.page,
            total_pages: view.total_pages,
        });

        Ok(view)
    }

    pub async fn next_page(&mut self) -> DataResult<PageView> {
        self.go_to_page(self.state.page.saturating_add(1)).await
    }

    pub async fn prev_page(&mut self) -> DataResult<PageView> {
        self.go_to_page(self.state.page.saturating_sub(1)).await
    }

    fn page_view_for(&self, page: u32) -> PageView {
        self.paginator.view(page, self.state.row_count())
    }

    /// Rows of the current page joined with their annotations
    pub async fn page_rows(&self) -> DataResult<Vec<PageRow>> {
        let annotations = self.backend.annotations(&self.state.annotation_key()).await?;
        let view = self.page_view();

        Ok(self.state.dataset.rows()[view.rows.clone()]
            .iter()
            .zip(view.rows)
            .map(|(record, index)| PageRow {
                index,
                record: record.clone(),
                annotation: annotations.get(index),
            })
            .collect())
    }

    /// Counting range over the current dataset, from freshly read annotations
    pub async fn summary(&self) -> DataResult<CountingRange> {
        let annotations = self.backend.annotations(&self.state.annotation_key()).await?;
        Ok(counting_range(&annotations, self.state.row_count()))
    }

    /// Merge `patch` into a row and return the updated counting range
    pub async fn annotate(&mut self, index: usize, patch: AnnotationPatch) -> DataResult<CountingRange> {
        let row_count = self.state.row_count();
        if index >= row_count {
            return Err(DataError::RowOutOfRange { index, row_count });
        }

        let key = self.state.annotation_key();
        let annotation = self.backend.merge_row(&key, index, &patch).await?;
        let range = self.summary().await?;
        debug!(file = %key, index, ?annotation, count = range.count, "Row annotated");

        self.events.publish(AnnotationChanged {
            identity: key,
            row_index: index,
            annotation,
            range,
        });

        Ok(range)
    }

    pub async fn set_messaged(&mut self, index: usize, messaged: bool) -> DataResult<CountingRange> {
        self.annotate(index, AnnotationPatch::messaged(messaged)).await
    }

    pub async fn set_bookmark(&mut self, index: usize, bookmark: Bookmark) -> DataResult<CountingRange> {
        self.annotate(index, AnnotationPatch::bookmark(bookmark)).await
    }

    /// Clear every annotation of the current file after confirmation
    pub async fn clear_annotations(&mut self, confirm: &dyn Confirm) -> DataResult<Outcome> {
        let key = self.state.annotation_key();
        if !confirm.confirm(CLEAR_PROMPT) {
            info!(file = %key, "Clearing annotations declined");
            return Ok(Outcome::Declined);
        }

        self.backend.clear_annotations(&key).await?;
        info!(file = %key, "Annotations cleared");
        self.events.publish(AnnotationsCleared { identity: key });

        Ok(Outcome::Completed)
    }

    /// Remove the current file's rows after confirmation.
    ///
    /// Annotations and the last page stay stored for the identity, so
    /// importing the same file again brings them back.
    pub async fn remove_dataset(&mut self, confirm: &dyn Confirm) -> DataResult<Outcome> {
        let identity: FileIdentity = self.state.identity.clone().ok_or(DataError::NoDataset)?;
        if !confirm.confirm(REMOVE_PROMPT) {
            info!(file = %identity, "Removing file declined");
            return Ok(Outcome::Declined);
        }

        self.backend.delete_dataset(&identity).await?;
        self.backend.set_current_identity(None).await?;
        info!(file = %identity, "File removed, annotations kept");

        self.state.unload();
        self.go_to_page(1).await?;
        self.events.publish(DatasetRemoved { identity });

        Ok(Outcome::Completed)
    }
}
