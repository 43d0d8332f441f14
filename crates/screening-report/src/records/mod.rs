//! Read-only table of student screening records.
//!
//! The table is built once at startup from the clinic's CSV export and is
//! never mutated afterwards, so a single `Arc<RecordStore>` can be shared by
//! every request handler without locking.

mod parser;

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use parser::ParseFailure;

/// One row of the source table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub identifier: String,
    pub full_name: String,
    pub department: String,
    pub result: String,
}

impl StudentRecord {
    /// Names of display fields that are empty once whitespace is ignored.
    /// Blank values are still valid and rendered as-is.
    pub fn blank_fields(&self) -> Vec<&'static str> {
        [
            ("full_name", &self.full_name),
            ("department", &self.department),
            ("result", &self.result),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("failed to read student table {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed student table: {0}")]
    Csv(#[from] csv::Error),
    #[error("student table is missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<&'static str> },
}

impl From<ParseFailure> for DataLoadError {
    fn from(value: ParseFailure) -> Self {
        match value {
            ParseFailure::Csv(err) => Self::Csv(err),
            ParseFailure::MissingColumns(missing) => Self::MissingColumns { missing },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<StudentRecord>,
}

impl RecordStore {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DataLoadError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| DataLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_reader(file)?;
        info!(path = %path.display(), records = store.len(), "student table loaded");
        Ok(store)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataLoadError> {
        let records = parser::parse_records(reader)?;

        let incomplete = records
            .iter()
            .filter(|record| !record.blank_fields().is_empty())
            .count();
        if incomplete > 0 {
            warn!(rows = incomplete, "student table contains rows with blank fields");
        }

        Ok(Self { records })
    }

    /// Exact, case-sensitive match on the identifier column. When the table
    /// holds duplicate identifiers the first row in source order wins.
    pub fn find_by_identifier(&self, identifier: &str) -> Option<&StudentRecord> {
        self.records
            .iter()
            .find(|record| record.identifier == identifier)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StudentRecord> {
        self.records.iter()
    }
}
