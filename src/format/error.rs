//! Error types for annotation store operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or saving the annotation store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store exists but could not be read
    #[error("Failed to read annotation store {path:?}: {source}")]
    Read {
        /// Store path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Header lacks a required column
    #[error("Annotation store is missing the '{column}' column")]
    MissingColumn {
        /// Name of the missing column
        column: &'static str,
    },

    /// A data row could not be interpreted
    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow {
        /// 1-based line number in the store file
        line: u64,
        /// Description of the problem
        reason: String,
    },

    /// A row names a class the configuration does not define
    #[error(
        "Row for '{filename}' has class index {class_index}, but only {class_count} classes are configured"
    )]
    ClassOutOfRange {
        /// Filename of the offending row
        filename: String,
        /// Class index found in the row
        class_index: usize,
        /// Number of configured classes
        class_count: usize,
    },

    /// The map holds a class index the configuration cannot name at save time
    #[error(
        "Cannot save '{filename}' with class index {class_index}: only {class_count} classes are configured"
    )]
    UnnamedClass {
        /// Filename of the offending entry
        filename: String,
        /// Class index in the map
        class_index: usize,
        /// Number of configured classes
        class_count: usize,
    },

    /// Writing the store failed
    #[error("Failed to write annotation store {path:?}: {source}")]
    Write {
        /// Store path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// CSV encoding error while serializing rows
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl StoreError {
    /// Create a malformed row error.
    pub fn malformed(line: u64, reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            line,
            reason: reason.into(),
        }
    }

    /// Whether this error came from a save rather than a load.
    pub fn is_save_error(&self) -> bool {
        matches!(
            self,
            Self::Write { .. } | Self::UnnamedClass { .. } | Self::Csv(_)
        )
    }
}
