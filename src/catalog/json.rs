//! Catalog snapshots stored as JSON.
//!
//! Accepts either a single JSON array of rows or newline-delimited JSON
//! (one row object per line). NDJSON is streamed; arrays are read whole.

use super::{CatalogQuery, CatalogRow, RowSource};
use crate::error::{AnalyzeError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Replays catalog rows from a JSON or NDJSON file.
pub struct JsonRowSource {
    path: PathBuf,
}

impl JsonRowSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<BufReader<File>> {
        let file = File::open(&self.path).map_err(|e| {
            AnalyzeError::source(format!("failed to open {}", self.path.display()), e)
        })?;
        Ok(BufReader::new(file))
    }
}

impl RowSource for JsonRowSource {
    fn execute(
        &mut self,
        query: &CatalogQuery,
        sink: &mut dyn FnMut(CatalogRow) -> Result<()>,
    ) -> Result<()> {
        let mut reader = self.open()?;

        if starts_with_array(&mut reader)? {
            let mut content = String::new();
            reader.read_to_string(&mut content).map_err(|e| {
                AnalyzeError::source(format!("failed to read {}", self.path.display()), e)
            })?;
            let rows: Vec<CatalogRow> = serde_json::from_str(&content).map_err(|e| {
                AnalyzeError::source(format!("malformed catalog rows in {}", self.path.display()), e)
            })?;
            for row in rows.into_iter().filter(|r| query.matches(r)) {
                sink(row)?;
            }
            return Ok(());
        }

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                AnalyzeError::source(format!("failed to read {}", self.path.display()), e)
            })?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let row: CatalogRow = serde_json::from_str(line).map_err(|e| {
                AnalyzeError::source(
                    format!("malformed catalog row at {}:{}", self.path.display(), line_no + 1),
                    e,
                )
            })?;
            if query.matches(&row) {
                sink(row)?;
            }
        }

        Ok(())
    }
}

/// Peek past leading whitespace and report whether the content is a JSON array.
fn starts_with_array<R: BufRead>(reader: &mut R) -> Result<bool> {
    loop {
        let buf = reader
            .fill_buf()
            .map_err(|e| AnalyzeError::source("failed to read catalog snapshot", e))?;
        if buf.is_empty() {
            return Ok(false);
        }
        let skip = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
        if skip < buf.len() {
            let first = buf[skip];
            reader.consume(skip);
            return Ok(first == b'[');
        }
        let len = buf.len();
        reader.consume(len);
    }
}
