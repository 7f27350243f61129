//! Spreadsheet/CSV ingestion into normalized transaction rows.
//!
//! This module provides the upload parsing pipeline:
//! - File format identification and content sniffing
//! - Canonical column resolution (explicit mapping or header policy)
//! - Row normalization with typed date/amount/category fields
//!
//! Parsing is purely functional over the input bytes: nothing is persisted
//! here, and a failure leaves no partial state behind.

pub mod error;
pub mod format;
pub mod mapping;
pub mod parser;

#[cfg(test)]
mod tests;

pub use error::IngestError;
pub use format::FileFormat;
pub use mapping::{ColumnMapping, HeaderPolicy, ResolvedColumns};
pub use parser::{NormalizedRow, ParsedUpload, UploadConfig, parse};
