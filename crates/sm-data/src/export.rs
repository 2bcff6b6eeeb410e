//! Export of page rows to Arrow

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanBuilder, StringBuilder, UInt64Builder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use sm_core::ROW_WIDTH;

use crate::workbench::PageRow;
use crate::DataError;

/// Schema of an exported page: row number, bookmark, the five fields, messaged flag
pub fn page_schema() -> Arc<Schema> {
    let mut fields = vec![
        Field::new("#", DataType::UInt64, false),
        Field::new("bookmark", DataType::Utf8, false),
    ];
    for idx in 0..ROW_WIDTH {
        fields.push(Field::new(format!("field_{}", idx + 1), DataType::Utf8, false));
    }
    fields.push(Field::new("messaged", DataType::Boolean, false));

    Arc::new(Schema::new(fields))
}

/// Build a record batch from page rows.
///
/// Row numbers are 1-based, as displayed.
pub fn page_batch(rows: &[PageRow]) -> Result<RecordBatch, DataError> {
    let mut numbers = UInt64Builder::with_capacity(rows.len());
    let mut bookmarks = StringBuilder::new();
    let mut columns: Vec<StringBuilder> = (0..ROW_WIDTH).map(|_| StringBuilder::new()).collect();
    let mut messaged = BooleanBuilder::with_capacity(rows.len());

    for row in rows {
        numbers.append_value(row.index as u64 + 1);
        bookmarks.append_value(row.annotation.bookmark.label());
        for (builder, value) in columns.iter_mut().zip(row.record.fields()) {
            builder.append_value(value);
        }
        messaged.append_value(row.annotation.messaged);
    }

    let mut arrays: Vec<ArrayRef> = vec![Arc::new(numbers.finish()), Arc::new(bookmarks.finish())];
    arrays.extend(columns.into_iter().map(|mut builder| Arc::new(builder.finish()) as ArrayRef));
    arrays.push(Arc::new(messaged.finish()));

    Ok(RecordBatch::try_new(page_schema(), arrays)?)
}

/// Render page rows as a text table
pub fn pretty_page(rows: &[PageRow]) -> Result<String, DataError> {
    let batch = page_batch(rows)?;
    Ok(pretty_format_batches(&[batch])?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, BooleanArray, StringArray, UInt64Array};
    use sm_core::{Bookmark, RowAnnotation, RowRecord};

    fn rows() -> Vec<PageRow> {
        vec![
            PageRow {
                index: 100,
                record: RowRecord::new(["ann", "a@x.io", "12", "v", "https://x.io/a"].map(String::from)),
                annotation: RowAnnotation { messaged: true, bookmark: Bookmark::Start },
            },
            PageRow {
                index: 101,
                record: RowRecord::default(),
                annotation: RowAnnotation::default(),
            },
        ]
    }

    #[test]
    fn test_page_batch_columns() {
        let batch = page_batch(&rows()).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), ROW_WIDTH + 3);

        let numbers = batch.column(0).as_any().downcast_ref::<UInt64Array>().unwrap();
        assert_eq!(numbers.value(0), 101);

        let bookmarks = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(bookmarks.value(0), "Start");
        assert_eq!(bookmarks.value(1), "None");

        let name = batch.column(2).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(name.value(0), "ann");
        assert_eq!(name.value(1), "");

        let messaged = batch.column(ROW_WIDTH + 2).as_any().downcast_ref::<BooleanArray>().unwrap();
        assert!(messaged.value(0));
        assert!(!messaged.value(1));
        assert_eq!(messaged.null_count(), 0);
    }

    #[test]
    fn test_empty_page() {
        let batch = page_batch(&[]).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.schema(), page_schema());
    }

    #[test]
    fn test_pretty_page_contains_values() {
        let text = pretty_page(&rows()).unwrap();
        assert!(text.contains("field_5"));
        assert!(text.contains("https://x.io/a"));
        assert!(text.contains("101"));
    }
}
