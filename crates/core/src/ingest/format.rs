//! Accepted file formats and content sniffing.

use serde::{Deserialize, Serialize};

/// ZIP local-file-header magic (xlsx is a zip container).
const ZIP_MAGIC: &[u8] = b"PK";
/// OLE2 compound-file magic (legacy xls container).
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// The fixed set of accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Comma-delimited text.
    Csv,
    /// Office Open XML workbook (zip container).
    Xlsx,
    /// Legacy Excel workbook (OLE2 container).
    Xls,
}

impl FileFormat {
    /// Resolves the declared format from a filename extension.
    ///
    /// Returns `None` when the extension is not in the accepted set.
    #[must_use]
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = filename.rsplit_once('.').map(|(_, ext)| ext)?;
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            _ => None,
        }
    }

    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
        }
    }

    /// Checks the leading bytes against the container magic expected for
    /// this format. CSV accepts anything that is not one of the binary
    /// containers.
    #[must_use]
    pub fn matches_content(self, bytes: &[u8]) -> bool {
        match self {
            Self::Csv => !bytes.starts_with(ZIP_MAGIC) && !bytes.starts_with(OLE_MAGIC),
            Self::Xlsx => bytes.starts_with(ZIP_MAGIC),
            Self::Xls => bytes.starts_with(OLE_MAGIC),
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileFormat {
    type Err = crate::types::ParseVocabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            "xls" => Ok(Self::Xls),
            other => Err(crate::types::ParseVocabError {
                kind: "file format",
                value: other.to_string(),
            }),
        }
    }
}
