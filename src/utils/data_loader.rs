//! Data loading utilities

use crate::error::Result;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// CSV data loader
pub struct DataLoader {
    /// Field separator
    separator: u8,
    /// Whether the first row is a header
    has_header: bool,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a loader for comma-separated files with a header row
    pub fn new() -> Self {
        Self {
            separator: b',',
            has_header: true,
        }
    }

    /// Set the field separator
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Load a CSV file, inferring the schema from every row.
    ///
    /// A missing file surfaces as an I/O error rather than an empty frame.
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let start = Instant::now();
        let file = File::open(path)?;

        let parse_opts = CsvParseOptions::default().with_separator(self.separator);

        let df = CsvReadOptions::default()
            .with_has_header(self.has_header)
            .with_infer_schema_length(None)
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()?;

        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded dataset"
        );
        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "csv read finished");

        Ok(df)
    }
}
