//! Workbench configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sm_core::PaginationConfig;

use crate::DataError;

/// Upper bound for the number of page buttons
const MAX_BUTTONS_LIMIT: u32 = 99;

/// Where state is persisted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file, `None` keeps everything in memory
    pub path: Option<PathBuf>,
}

/// How parsed sheets are projected into rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// 0-based source column mapped to the first row field
    pub first_column: usize,

    /// Field delimiter for delimited text sheets
    pub delimiter: char,

    /// Trim whitespace around cell values
    pub trim_whitespace: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            first_column: 1,
            delimiter: ',',
            trim_whitespace: false,
        }
    }
}

impl ImportConfig {
    /// Delimiter as a single byte, as the CSV reader expects
    pub fn delimiter_byte(&self) -> Result<u8, DataError> {
        if !self.delimiter.is_ascii() {
            return Err(DataError::Config(format!("Delimiter '{}' is not a single byte", self.delimiter)));
        }
        Ok(self.delimiter as u8)
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbenchConfig {
    pub store: StoreConfig,
    pub pagination: PaginationConfig,
    pub import: ImportConfig,
}

impl WorkbenchConfig {
    /// Load configuration from a JSON file; missing fields take defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| DataError::Config(format!("Invalid config {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pagination and import steps cannot work with
    pub fn validate(&self) -> Result<(), DataError> {
        let pagination = &self.pagination;
        if pagination.page_size == 0 {
            return Err(DataError::Config("pagination.page_size must be at least 1".into()));
        }
        if !(1..=MAX_BUTTONS_LIMIT).contains(&pagination.max_buttons) {
            return Err(DataError::Config(format!(
                "pagination.max_buttons must be between 1 and {}",
                MAX_BUTTONS_LIMIT
            )));
        }
        self.import.delimiter_byte()?;
        Ok(())
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkbenchConfig::default();
        assert_eq!(config.pagination.page_size, 100);
        assert_eq!(config.pagination.max_buttons, 9);
        assert_eq!(config.import.first_column, 1);
        assert_eq!(config.import.delimiter_byte().unwrap(), b',');
        assert!(config.store.path.is_none());
    }

    #[test]
    fn test_partial_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheetmark.json");
        std::fs::write(&path, r#"{ "pagination": { "page_size": 25 }, "import": { "delimiter": ";" } }"#).unwrap();

        let config = WorkbenchConfig::load(&path).unwrap();
        assert_eq!(config.pagination.page_size, 25);
        assert_eq!(config.pagination.max_buttons, 9);
        assert_eq!(config.import.delimiter_byte().unwrap(), b';');
        assert_eq!(config.import.first_column, 1);
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(WorkbenchConfig::load(&path), Err(DataError::Config(_))));
    }

    #[test]
    fn test_multibyte_delimiter_rejected() {
        let config = ImportConfig { delimiter: '→', ..ImportConfig::default() };
        assert!(config.delimiter_byte().is_err());
    }

    #[test]
    fn test_out_of_range_pagination_rejected() {
        let dir = tempfile::tempdir().unwrap();

        let zero_page = dir.path().join("zero.json");
        std::fs::write(&zero_page, r#"{ "pagination": { "page_size": 0 } }"#).unwrap();
        assert!(matches!(WorkbenchConfig::load(&zero_page), Err(DataError::Config(_))));

        let huge_window = dir.path().join("huge.json");
        std::fs::write(&huge_window, r#"{ "pagination": { "max_buttons": 4294967295 } }"#).unwrap();
        assert!(matches!(WorkbenchConfig::load(&huge_window), Err(DataError::Config(_))));

        let no_buttons = dir.path().join("none.json");
        std::fs::write(&no_buttons, r#"{ "pagination": { "max_buttons": 0 } }"#).unwrap();
        assert!(matches!(WorkbenchConfig::load(&no_buttons), Err(DataError::Config(_))));
    }
}
