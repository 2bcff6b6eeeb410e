//! Row annotations
//!
//! Each row of a dataset can carry a "messaged" flag and a range marker.
//! Annotations are stored sparsely: a row that was never edited has the
//! default annotation and no entry in the [`AnnotationSet`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Range marker placed on a row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bookmark {
    /// No marker
    #[default]
    #[serde(rename = "")]
    None,

    /// Opens a counting range
    #[serde(rename = "start")]
    Start,

    /// Closes a counting range
    #[serde(rename = "end")]
    End,
}

impl Bookmark {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bookmark::None => "",
            Bookmark::Start => "start",
            Bookmark::End => "end",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Bookmark::None => "None",
            Bookmark::Start => "Start",
            Bookmark::End => "End",
        }
    }
}

impl fmt::Display for Bookmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Bookmark {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Bookmark::None),
            "start" => Ok(Bookmark::Start),
            "end" => Ok(Bookmark::End),
            other => Err(format!("Unknown bookmark '{}'", other)),
        }
    }
}

/// Annotation state of a single row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowAnnotation {
    /// Whether the row has been messaged
    #[serde(default)]
    pub messaged: bool,

    /// Range marker on the row
    #[serde(default)]
    pub bookmark: Bookmark,
}

impl RowAnnotation {
    /// Apply the fields present in `patch`, keeping the others
    pub fn merge(&mut self, patch: &AnnotationPatch) {
        if let Some(messaged) = patch.messaged {
            self.messaged = messaged;
        }
        if let Some(bookmark) = patch.bookmark {
            self.bookmark = bookmark;
        }
    }

    pub fn merged(mut self, patch: &AnnotationPatch) -> Self {
        self.merge(patch);
        self
    }
}

/// Partial update of a [`RowAnnotation`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messaged: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<Bookmark>,
}

impl AnnotationPatch {
    pub fn messaged(messaged: bool) -> Self {
        Self { messaged: Some(messaged), bookmark: None }
    }

    pub fn bookmark(bookmark: Bookmark) -> Self {
        Self { messaged: None, bookmark: Some(bookmark) }
    }

    pub fn is_empty(&self) -> bool {
        self.messaged.is_none() && self.bookmark.is_none()
    }
}

/// All row annotations of one file, keyed by row index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationSet {
    rows: BTreeMap<usize, RowAnnotation>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotation of a row, or the default when the row was never edited
    pub fn get(&self, idx: usize) -> RowAnnotation {
        self.rows.get(&idx).copied().unwrap_or_default()
    }

    /// Whether a row has an explicit entry
    pub fn contains(&self, idx: usize) -> bool {
        self.rows.contains_key(&idx)
    }

    /// Merge `patch` into a row and return the resulting annotation
    pub fn merge_row(&mut self, idx: usize, patch: &AnnotationPatch) -> RowAnnotation {
        let entry = self.rows.entry(idx).or_default();
        entry.merge(patch);
        *entry
    }

    pub fn set(&mut self, idx: usize, annotation: RowAnnotation) {
        self.rows.insert(idx, annotation);
    }

    /// Explicit entries in row order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &RowAnnotation)> + '_ {
        self.rows.iter().map(|(idx, ann)| (*idx, ann))
    }

    /// Explicit entries whose row index is below `limit`
    pub fn iter_below(&self, limit: usize) -> impl DoubleEndedIterator<Item = (usize, &RowAnnotation)> + '_ {
        self.rows.range(..limit).map(|(idx, ann)| (*idx, ann))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
