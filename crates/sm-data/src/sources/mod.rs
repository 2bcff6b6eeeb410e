//! Sheet parsers

pub mod csv_sheet;

pub use csv_sheet::CsvSheetParser;

/// Turns raw file content into a grid of cells.
///
/// Only the first sheet of a workbook is read. Rows keep their source
/// order; ragged rows are allowed.
pub trait SheetParser: Send + Sync {
    fn parse(&self, content: &[u8]) -> anyhow::Result<Vec<Vec<String>>>;
}
