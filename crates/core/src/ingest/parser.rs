//! Upload parsing into normalized rows.

use std::io::Cursor;
use std::str::FromStr;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::error::IngestError;
use super::format::FileFormat;
use super::mapping::{ColumnMapping, HeaderPolicy, ResolvedColumns};

/// Date layouts accepted for textual date cells, tried in order.
const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// Upload limits passed explicitly into [`parse`] so tests can vary them.
#[derive(Debug, Clone, Copy)]
pub struct UploadConfig {
    /// Maximum accepted input size in bytes.
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

/// One parsed transaction row.
///
/// Derived entirely from the upload bytes; never persisted. `row_index` is
/// the zero-based position among the source's data rows (the header row is
/// not counted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRow {
    /// Zero-based source data-row index.
    pub row_index: usize,
    /// Transaction date.
    pub date: NaiveDate,
    /// Signed amount.
    pub amount: Decimal,
    /// Optional category label; empty cells become `None`.
    pub category: Option<String>,
}

/// Result of parsing one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUpload {
    /// Normalized rows in source order.
    pub rows: Vec<NormalizedRow>,
    /// Data rows excluded because `date` or `amount` did not parse.
    pub rows_skipped: u64,
    /// The column indices the canonical fields resolved to.
    pub resolved: ResolvedColumns,
}

/// Parses upload bytes into normalized rows.
///
/// The byte-size cap is enforced before any parsing work, the declared
/// format is verified against the content magic, and rows whose `date` or
/// `amount` cell is missing or unparseable are counted as skipped rather
/// than failing the upload. Invariant: `rows.len() + rows_skipped` equals
/// the number of data rows in the source.
///
/// # Errors
///
/// - `IngestError::TooLarge` when the input exceeds `config.max_bytes`.
/// - `IngestError::UnsupportedFormat` when the content does not match the
///   declared format's container magic.
/// - `IngestError::Malformed` when the tabular structure is unreadable or a
///   required column cannot be resolved.
pub fn parse(
    bytes: &[u8],
    format: FileFormat,
    mapping: Option<&ColumnMapping>,
    sheet_name: Option<&str>,
    policy: &HeaderPolicy,
    config: &UploadConfig,
) -> Result<ParsedUpload, IngestError> {
    if bytes.len() > config.max_bytes {
        return Err(IngestError::TooLarge {
            size: bytes.len(),
            max: config.max_bytes,
        });
    }

    if !format.matches_content(bytes) {
        return Err(IngestError::UnsupportedFormat(format!(
            "content does not match declared {format} format"
        )));
    }

    match format {
        FileFormat::Csv => parse_csv(bytes, mapping, policy),
        FileFormat::Xlsx | FileFormat::Xls => parse_workbook(bytes, mapping, sheet_name, policy),
    }
}

fn parse_csv(
    bytes: &[u8],
    mapping: Option<&ColumnMapping>,
    policy: &HeaderPolicy,
) -> Result<ParsedUpload, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::Malformed(format!("unreadable header row: {e}")))?
        .iter()
        .map(ToString::to_string)
        .collect();

    let resolved = policy.resolve(&headers, mapping)?;

    let mut rows = Vec::new();
    let mut rows_skipped = 0u64;

    for (row_index, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| IngestError::Malformed(format!("unreadable data row {row_index}: {e}")))?;

        let date = record.get(resolved.date).and_then(parse_date_cell);
        let amount = record.get(resolved.amount).and_then(parse_amount_cell);

        let (Some(date), Some(amount)) = (date, amount) else {
            rows_skipped += 1;
            continue;
        };

        let category = resolved
            .category
            .and_then(|col| record.get(col))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);

        rows.push(NormalizedRow {
            row_index,
            date,
            amount,
            category,
        });
    }

    Ok(ParsedUpload {
        rows,
        rows_skipped,
        resolved,
    })
}

fn parse_workbook(
    bytes: &[u8],
    mapping: Option<&ColumnMapping>,
    sheet_name: Option<&str>,
    policy: &HeaderPolicy,
) -> Result<ParsedUpload, IngestError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| IngestError::Malformed(format!("unreadable workbook: {e}")))?;

    let sheet_names = workbook.sheet_names();
    let chosen = match sheet_name {
        Some(name) => sheet_names
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| IngestError::Malformed(format!("worksheet '{name}' not found")))?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| IngestError::Malformed("workbook has no worksheets".to_string()))?,
    };

    let range = workbook
        .worksheet_range(&chosen)
        .map_err(|e| IngestError::Malformed(format!("unreadable worksheet '{chosen}': {e}")))?;

    let mut source_rows = range.rows();
    let headers: Vec<String> = source_rows
        .next()
        .ok_or_else(|| IngestError::Malformed("missing header row".to_string()))?
        .iter()
        .map(ToString::to_string)
        .collect();

    let resolved = policy.resolve(&headers, mapping)?;

    let mut rows = Vec::new();
    let mut rows_skipped = 0u64;

    for (row_index, cells) in source_rows.enumerate() {
        let date = cells.get(resolved.date).and_then(workbook_date);
        let amount = cells.get(resolved.amount).and_then(workbook_amount);

        let (Some(date), Some(amount)) = (date, amount) else {
            rows_skipped += 1;
            continue;
        };

        let category = resolved
            .category
            .and_then(|col| cells.get(col))
            .and_then(workbook_category);

        rows.push(NormalizedRow {
            row_index,
            date,
            amount,
            category,
        });
    }

    Ok(ParsedUpload {
        rows,
        rows_skipped,
        resolved,
    })
}

/// Parses a textual date cell against the accepted layouts.
fn parse_date_cell(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    DATE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(cell, layout).ok())
}

/// Parses a textual amount cell. Accepts currency symbols, thousands
/// separators, and accounting-style parentheses for negatives.
fn parse_amount_cell(cell: &str) -> Option<Decimal> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }

    let (cell, negated) = match cell.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (inner, true),
        None => (cell, false),
    };

    let cleaned: String = cell
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();

    let amount = Decimal::from_str(&cleaned).ok()?;
    Some(if negated { -amount } else { amount })
}

fn workbook_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime().map(|ndt| ndt.date()),
        Data::DateTimeIso(s) => parse_date_cell(s).or_else(|| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|ndt| ndt.date())
        }),
        Data::String(s) => parse_date_cell(s),
        _ => None,
    }
}

fn workbook_amount(cell: &Data) -> Option<Decimal> {
    match cell {
        Data::Float(f) => Decimal::try_from(*f).ok(),
        Data::Int(i) => Some(Decimal::from(*i)),
        Data::String(s) => parse_amount_cell(s),
        _ => None,
    }
}

fn workbook_category(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        other => {
            let text = other.to_string();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
    }
}
