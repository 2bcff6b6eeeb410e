//! Counting range aggregation
//!
//! Start and end markers are sparse. The latest (highest index) start
//! marker opens the range; the latest end marker at or after it closes
//! it. Earlier markers of either kind are inert. Without a qualifying end
//! marker the range runs to the last row of the dataset.

use std::fmt;

use crate::annotation::{AnnotationSet, Bookmark};

/// Derived span of rows being counted and the number of messaged rows in it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountingRange {
    /// Inclusive `(start_index, end_index)`, `None` for an empty dataset
    pub bounds: Option<(usize, usize)>,

    /// Messaged rows inside `bounds`
    pub count: usize,
}

impl CountingRange {
    pub fn start_index(&self) -> Option<usize> {
        self.bounds.map(|(start, _)| start)
    }

    pub fn end_index(&self) -> Option<usize> {
        self.bounds.map(|(_, end)| end)
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    pub fn contains(&self, idx: usize) -> bool {
        matches!(self.bounds, Some((start, end)) if start <= idx && idx <= end)
    }

    /// Number of rows in the range
    pub fn span_len(&self) -> usize {
        self.bounds.map_or(0, |(start, end)| end - start + 1)
    }
}

impl fmt::Display for CountingRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds {
            Some((start, end)) => write!(
                f,
                "Counting rows {} → {} • Checked: {}",
                start + 1,
                end + 1,
                self.count
            ),
            None => write!(f, "No rows • Checked: {}", self.count),
        }
    }
}

/// Compute the counting range over a dataset of `row_count` rows.
///
/// Entries at or beyond `row_count` are ignored.
pub fn counting_range(annotations: &AnnotationSet, row_count: usize) -> CountingRange {
    if row_count == 0 {
        return CountingRange::default();
    }

    let last_start = annotations
        .iter_below(row_count)
        .rev()
        .find(|(_, ann)| ann.bookmark == Bookmark::Start)
        .map(|(idx, _)| idx);

    let last_end = annotations
        .iter_below(row_count)
        .rev()
        .find(|(idx, ann)| {
            ann.bookmark == Bookmark::End && last_start.map_or(true, |start| *idx >= start)
        })
        .map(|(idx, _)| idx);

    let start_index = last_start.unwrap_or(0);
    let end_index = match last_end {
        Some(end) if end >= start_index => end,
        _ => row_count - 1,
    };

    let count = annotations
        .iter_below(row_count)
        .filter(|(idx, ann)| ann.messaged && (start_index..=end_index).contains(idx))
        .count();

    CountingRange {
        bounds: Some((start_index, end_index)),
        count,
    }
}
