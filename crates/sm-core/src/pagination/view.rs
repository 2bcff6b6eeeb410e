use std::fmt;
use std::ops::{Range, RangeInclusive};

use super::{clamp_page, slice_bounds, total_pages, window_of, PaginationConfig};

/// Everything needed to render one page of the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    /// Current page, 1-based and always in range
    pub page: u32,
    pub total_pages: u32,
    /// Page buttons to show
    pub window: RangeInclusive<u32>,
    /// Row indices on this page
    pub rows: Range<usize>,
    pub row_count: usize,
}

impl PageView {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Window pages in order
    pub fn buttons(&self) -> impl Iterator<Item = u32> {
        self.window.clone()
    }
}

impl fmt::Display for PageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.row_count == 0 {
            return Ok(());
        }
        write!(
            f,
            "Rows {}–{} of {} • Page {}/{}",
            self.rows.start + 1,
            self.rows.end,
            self.row_count,
            self.page,
            self.total_pages
        )
    }
}

/// Pagination controller
#[derive(Debug, Clone, Copy, Default)]
pub struct Paginator {
    config: PaginationConfig,
}

impl Paginator {
    pub fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Clamp `requested` and lay out the page for `row_count` rows
    pub fn view(&self, requested: u32, row_count: usize) -> PageView {
        let total = total_pages(row_count, self.config.page_size);
        let page = clamp_page(requested, total);

        PageView {
            page,
            total_pages: total,
            window: window_of(page, total, self.config.max_buttons),
            rows: slice_bounds(page, row_count, self.config.page_size),
            row_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_clamps_requested_page() {
        let paginator = Paginator::default();

        let view = paginator.view(9, 250);
        assert_eq!(view.page, 3);
        assert_eq!(view.rows, 200..250);
        assert!(view.has_prev());
        assert!(!view.has_next());

        let view = paginator.view(0, 250);
        assert_eq!(view.page, 1);
        assert!(!view.has_prev());
        assert!(view.has_next());
    }

    #[test]
    fn test_rows_info_line() {
        let paginator = Paginator::default();
        assert_eq!(paginator.view(2, 250).to_string(), "Rows 101–200 of 250 • Page 2/3");
        assert_eq!(paginator.view(1, 0).to_string(), "");
    }

    #[test]
    fn test_custom_page_size() {
        let paginator = Paginator::new(PaginationConfig { page_size: 10, max_buttons: 3 });
        let view = paginator.view(5, 95);
        assert_eq!(view.total_pages, 10);
        assert_eq!(view.rows, 40..50);
        assert_eq!(view.buttons().collect::<Vec<_>>(), vec![4, 5, 6]);
    }

    #[test]
    fn test_degenerate_config_still_renders() {
        let paginator = Paginator::new(PaginationConfig { page_size: 0, max_buttons: u32::MAX });
        let view = paginator.view(2, 5);
        assert_eq!(view.total_pages, 5);
        assert_eq!(view.rows, 1..2);
        assert_eq!(view.window, 1..=5);
        assert_eq!(view.to_string(), "Rows 2–2 of 5 • Page 2/5");
    }
}
