//! Error types for fitsview.
//!
//! This module provides a unified error handling approach using `thiserror`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fitsview operations.
pub type Result<T> = std::result::Result<T, FitsViewError>;

/// Errors that can occur in fitsview.
#[derive(Debug, Error)]
pub enum FitsViewError {
    /// The requested file does not exist.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// Failed to open or map a file.
    #[error("Failed to open file: {path}")]
    FileOpen {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file handle was used after the session closed it.
    #[error("File handle is closed")]
    FileClosed,

    /// The file is not a readable FITS file.
    #[error("Invalid FITS data: {0}")]
    InvalidFits(String),

    /// HDU index out of range.
    #[error("HDU #{index} not found ({count} HDUs in file)")]
    NotFound {
        /// Requested index.
        index: usize,
        /// Number of HDUs in the file.
        count: usize,
    },

    /// The HDU is not of the kind the operation needs.
    #[error("HDU #{index} is not a {expected} HDU")]
    UnsupportedHdu {
        /// HDU index.
        index: usize,
        /// Kind the operation expected.
        expected: &'static str,
    },

    /// A requested column does not exist on the table.
    #[error("Unknown column: {name}")]
    UnknownColumn {
        /// Column name as requested.
        name: String,
    },

    /// Negative page index.
    #[error("Invalid page: {page}")]
    InvalidPage {
        /// Requested page.
        page: i64,
    },

    /// Page size outside the accepted range.
    #[error("Invalid page size: {size} (must be between 1 and {max})")]
    InvalidPageSize {
        /// Requested size.
        size: i64,
        /// Largest accepted size.
        max: usize,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal error.
    #[error("Terminal error: {0}")]
    Terminal(String),
}

impl FitsViewError {
    /// Create a FileOpen error.
    pub fn file_open(path: PathBuf, source: std::io::Error) -> Self {
        Self::FileOpen { path, source }
    }

    /// Create an InvalidFits error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidFits(message.into())
    }

    /// Create an UnknownColumn error.
    pub fn unknown_column(name: impl Into<String>) -> Self {
        Self::UnknownColumn { name: name.into() }
    }
}

impl From<fitsio_pure::Error> for FitsViewError {
    fn from(e: fitsio_pure::Error) -> Self {
        Self::InvalidFits(e.to_string())
    }
}
