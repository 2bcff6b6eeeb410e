//! Row records and datasets

use serde::{Deserialize, Serialize};

/// Number of fields projected into every row
pub const ROW_WIDTH: usize = 5;

/// A fixed-width row projected from the imported source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowRecord(pub [String; ROW_WIDTH]);

impl RowRecord {
    pub fn new(fields: [String; ROW_WIDTH]) -> Self {
        Self(fields)
    }

    /// Project `ROW_WIDTH` consecutive source cells starting at `first_column`.
    ///
    /// Cells past the end of the source row become empty strings.
    pub fn project(cells: &[String], first_column: usize) -> Self {
        Self(std::array::from_fn(|offset| {
            cells
                .get(first_column + offset)
                .cloned()
                .unwrap_or_default()
        }))
    }

    pub fn fields(&self) -> &[String; ROW_WIDTH] {
        &self.0
    }

    pub fn field(&self, idx: usize) -> Option<&str> {
        self.0.get(idx).map(String::as_str)
    }

    /// The trailing field, which carries a link in imported sheets
    pub fn link(&self) -> Option<&str> {
        let link = self.0[ROW_WIDTH - 1].trim();
        (!link.is_empty()).then_some(link)
    }
}

/// Ordered rows of one imported file.
///
/// Row indices are positions in import order, `0..len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    rows: Vec<RowRecord>,
}

impl Dataset {
    pub fn new(rows: Vec<RowRecord>) -> Self {
        Self { rows }
    }

    /// Project a parsed sheet into rows
    pub fn from_cells(cells: &[Vec<String>], first_column: usize) -> Self {
        Self {
            rows: cells
                .iter()
                .map(|row| RowRecord::project(row, first_column))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[RowRecord] {
        &self.rows
    }

    pub fn get(&self, idx: usize) -> Option<&RowRecord> {
        self.rows.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_projection_skips_first_column() {
        let row = RowRecord::project(&cells(&["1", "a", "b", "c", "d", "e", "extra"]), 1);
        assert_eq!(row.fields(), &["a", "b", "c", "d", "e"].map(String::from));
    }

    #[test]
    fn test_projection_pads_missing_cells() {
        let row = RowRecord::project(&cells(&["1", "a"]), 1);
        assert_eq!(row.field(0), Some("a"));
        assert_eq!(row.field(1), Some(""));
        assert_eq!(row.field(4), Some(""));

        let empty = RowRecord::project(&[], 1);
        assert_eq!(empty, RowRecord::default());
    }

    #[test]
    fn test_link_field() {
        let row = RowRecord::project(&cells(&["", "", "", "", "", " https://example.com "]), 1);
        assert_eq!(row.link(), Some("https://example.com"));
        assert_eq!(RowRecord::default().link(), None);
    }

    #[test]
    fn test_dataset_serializes_as_nested_arrays() {
        let dataset = Dataset::from_cells(&[cells(&["x", "a", "b"])], 1);
        let json = serde_json::to_string(&dataset).unwrap();
        assert_eq!(json, r#"[["a","b","","",""]]"#);

        let back: Dataset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dataset);
    }
}
