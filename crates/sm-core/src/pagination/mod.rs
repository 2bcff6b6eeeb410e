//! Page arithmetic for the row table

use std::ops::{Range, RangeInclusive};

use serde::{Deserialize, Serialize};

mod view;

pub use view::{PageView, Paginator};

/// Rows shown per page
pub const PAGE_SIZE: usize = 100;

/// Page buttons shown in the pagination bar
pub const MAX_BUTTONS: u32 = 9;

/// Pagination settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub page_size: usize,
    pub max_buttons: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            max_buttons: MAX_BUTTONS,
        }
    }
}

/// `max(1, ceil(row_count / page_size))`
pub fn total_pages(row_count: usize, page_size: usize) -> u32 {
    let page_size = page_size.max(1);
    let pages = row_count.div_ceil(page_size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Clamp a requested page into `[1, total_pages]`
pub fn clamp_page(requested: u32, total_pages: u32) -> u32 {
    requested.clamp(1, total_pages.max(1))
}

/// Contiguous run of page numbers around `page`.
///
/// The run holds `min(max_buttons, total_pages)` pages and is shifted
/// back when it would run past the last page.
pub fn window_of(page: u32, total_pages: u32, max_buttons: u32) -> RangeInclusive<u32> {
    let total_pages = total_pages.max(1);
    let page = clamp_page(page, total_pages);
    let max_buttons = max_buttons.max(1);
    let half = max_buttons / 2;

    let mut start = page.saturating_sub(half).max(1);
    let end = total_pages.min(start.saturating_add(max_buttons - 1));
    if end - start + 1 < max_buttons {
        start = end.saturating_sub(max_buttons - 1).max(1);
    }

    start..=end
}

/// Row index bounds `[(page-1)*page_size, min(page*page_size, row_count))`
///
/// A zero page size counts as one, as in [`total_pages`].
pub fn slice_bounds(page: u32, row_count: usize, page_size: usize) -> Range<usize> {
    let page_size = page_size.max(1);
    let page = page.max(1) as usize;
    let start = (page - 1).saturating_mul(page_size).min(row_count);
    let end = page.saturating_mul(page_size).min(row_count);
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 100), 1);
        assert_eq!(total_pages(1, 100), 1);
        assert_eq!(total_pages(100, 100), 1);
        assert_eq!(total_pages(101, 100), 2);
        assert_eq!(total_pages(250, 100), 3);

        for n in 0..1000 {
            let expected = std::cmp::max(1, (n + 99) / 100) as u32;
            assert_eq!(total_pages(n, PAGE_SIZE), expected);
        }
    }

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(0, 3), 1);
        assert_eq!(clamp_page(2, 3), 2);
        assert_eq!(clamp_page(7, 3), 3);
        assert_eq!(clamp_page(5, 0), 1);
    }

    #[test]
    fn test_window_centered() {
        assert_eq!(window_of(10, 20, 9), 6..=14);
    }

    #[test]
    fn test_window_at_edges() {
        assert_eq!(window_of(1, 20, 9), 1..=9);
        assert_eq!(window_of(3, 20, 9), 1..=9);
        assert_eq!(window_of(20, 20, 9), 12..=20);
        assert_eq!(window_of(18, 20, 9), 12..=20);
    }

    #[test]
    fn test_window_fewer_pages_than_buttons() {
        assert_eq!(window_of(1, 1, 9), 1..=1);
        assert_eq!(window_of(3, 4, 9), 1..=4);
    }

    #[test]
    fn test_window_length() {
        for total in 1..30 {
            for page in 1..=total {
                let window = window_of(page, total, MAX_BUTTONS);
                let len = window.end() - window.start() + 1;
                assert_eq!(len, MAX_BUTTONS.min(total));
                assert!(window.contains(&page));
            }
        }
    }

    #[test]
    fn test_slice_bounds() {
        assert_eq!(slice_bounds(1, 250, 100), 0..100);
        assert_eq!(slice_bounds(3, 250, 100), 200..250);
        assert_eq!(slice_bounds(1, 0, 100), 0..0);
        assert_eq!(slice_bounds(4, 250, 100), 250..250);
    }

    #[test]
    fn test_zero_page_size_matches_total_pages() {
        assert_eq!(total_pages(5, 0), 5);
        assert_eq!(slice_bounds(1, 5, 0), 0..1);
        assert_eq!(slice_bounds(5, 5, 0), 4..5);
    }

    #[test]
    fn test_window_with_huge_button_count() {
        assert_eq!(window_of(1, 3, u32::MAX), 1..=3);
        assert_eq!(window_of(u32::MAX, u32::MAX, u32::MAX), 1..=u32::MAX);
        assert_eq!(window_of(u32::MAX, u32::MAX, 9), (u32::MAX - 8)..=u32::MAX);
    }
}
