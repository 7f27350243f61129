//! Shared domain vocabulary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a vocabulary string cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized {kind}: {value}")]
pub struct ParseVocabError {
    /// Which vocabulary failed to parse.
    pub kind: &'static str,
    /// The offending input.
    pub value: String,
}

/// Ranked severity attached to leakage entries, alert rules, and
/// notifications.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, no action expected.
    Low,
    /// Worth reviewing.
    Medium,
    /// Likely revenue impact.
    High,
    /// Immediate attention required.
    Critical,
}

impl Severity {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = ParseVocabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(ParseVocabError {
                kind: "severity",
                value: other.to_string(),
            }),
        }
    }
}

/// Processing status of an upload record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Accepted, processing not finished.
    Pending,
    /// Fully processed; entries and summary persisted.
    Done,
    /// Parsing failed; no entries or summary exist.
    Failed,
}

impl UploadStatus {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UploadStatus {
    type Err = ParseVocabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            other => Err(ParseVocabError {
                kind: "upload status",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_severity_roundtrip() {
        for severity in [
            Severity::Low,
            Severity::Medium,
            Severity::High,
            Severity::Critical,
        ] {
            assert_eq!(Severity::from_str(severity.as_str()), Ok(severity));
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_unknown_severity_rejected() {
        let err = Severity::from_str("urgent").unwrap_err();
        assert_eq!(err.kind, "severity");
        assert_eq!(err.value, "urgent");
    }

    #[test]
    fn test_upload_status_roundtrip() {
        for status in [UploadStatus::Pending, UploadStatus::Done, UploadStatus::Failed] {
            assert_eq!(UploadStatus::from_str(status.as_str()), Ok(status));
        }
    }
}
