//! Ingestion error types.

use thiserror::Error;

/// Errors surfaced by the upload parser.
///
/// All variants are fatal to the single upload being processed; none of them
/// leave partial state behind.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    /// Extension or file content not in the accepted format set.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Input exceeds the configured byte limit. Checked before any parsing
    /// work begins.
    #[error("file size {size} bytes exceeds the {max} byte limit")]
    TooLarge {
        /// Actual input size in bytes.
        size: usize,
        /// Configured maximum in bytes.
        max: usize,
    },

    /// Tabular structure unreadable (corrupt encoding, missing headers,
    /// unresolvable required columns).
    #[error("malformed file: {0}")]
    Malformed(String),
}

impl IngestError {
    /// Returns the stable error code used in API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::TooLarge { .. } => "file_too_large",
            Self::Malformed(_) => "malformed_file",
        }
    }
}
