//! Core functionality for sheetmark
//! 
//! This crate provides the domain model (file identities, rows, row
//! annotations), the pure range and pagination engines, and the store
//! interfaces that persistence backends implement.

pub mod annotation;
pub mod error;
pub mod events;
pub mod identity;
pub mod pagination;
pub mod range;
pub mod rows;
pub mod state;
pub mod store;

// Re-export commonly used types
pub use annotation::{AnnotationPatch, AnnotationSet, Bookmark, RowAnnotation};
pub use error::{StoreError, StoreResult};
pub use events::EventBus;
pub use identity::{ContentDigest, FileIdentity, IdentityResolver, Sha256Digest};
pub use pagination::{PageView, Paginator, PaginationConfig, PAGE_SIZE, MAX_BUTTONS};
pub use range::{counting_range, CountingRange};
pub use rows::{Dataset, RowRecord, ROW_WIDTH};
pub use state::SessionState;
pub use store::{AnnotationStore, Backend, DatasetStore, PageStore};
