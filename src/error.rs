//! Central error types for sastre.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic
//! `Display` and `From` implementations.
//!
//! The scan pipeline distinguishes fatal errors (nothing could be parsed,
//! invalid configuration) from recoverable per-file and per-construct
//! conditions. Recoverable conditions are represented by [`ScanError`]
//! variants too, but callers handle them locally: a parse failure skips the
//! file, a missing syntax case degrades the node to an opaque step. Only
//! fatal conditions propagate out of [`crate::scan`].

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum ScanError {
    /// IO operation failed (without path context - prefer IoWithPath when path is available)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// IO operation failed with path context for better error messages
    #[error("IO error at {path}: {error}")]
    IoWithPath {
        error: std::io::Error,
        path: PathBuf,
    },

    /// Failed to parse source file
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// Requested language is not supported
    #[error("Language not supported: {0}")]
    UnsupportedLanguage(String),

    /// Tree-sitter grammar could not be loaded
    #[error("Grammar error for {language}: {message}")]
    Grammar {
        language: &'static str,
        message: String,
    },

    /// A source construct is not yet modeled by the syntax-step reducer.
    ///
    /// This is a recoverable condition: the caller logs it and emits an
    /// opaque no-op step so the scan continues with a conservative
    /// under-approximation. It never reaches the end user.
    #[error("Unmodeled syntax construct: {kind} at line {line}")]
    MissingCase { kind: String, line: usize },

    /// No file in the scan root could be parsed at all
    #[error("Nothing to scan: no parseable source files under {root}")]
    NothingToScan { root: PathBuf },
}

/// Convenience type alias for Results using ScanError.
pub type Result<T> = std::result::Result<T, ScanError>;

impl ScanError {
    /// Create an IO error with path context.
    ///
    /// Use this when reading files to provide actionable error messages
    /// that include the file path that failed.
    #[inline]
    pub fn io_with_path(error: std::io::Error, path: impl AsRef<Path>) -> Self {
        ScanError::IoWithPath {
            error,
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Whether this error is recoverable at file or construct granularity.
    ///
    /// Recoverable errors are logged and absorbed by the pipeline; fatal
    /// errors abort the scan.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScanError::Parse { .. } | ScanError::MissingCase { .. } | ScanError::IoWithPath { .. }
        )
    }
}
