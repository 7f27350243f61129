//! Canonical column resolution.
//!
//! Source files carry arbitrary headers; the parser maps them onto the fixed
//! canonical fields `date`, `amount`, and `category`. An explicit
//! [`ColumnMapping`] wins; unmapped fields fall back to the case-insensitive
//! alias lists of a [`HeaderPolicy`].

use serde::Deserialize;

use super::error::IngestError;

/// Optional user-supplied mapping from canonical field to source header.
///
/// Unknown keys in the incoming JSON are ignored rather than rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColumnMapping {
    /// Source header carrying the transaction date.
    #[serde(default)]
    pub date: Option<String>,
    /// Source header carrying the signed amount.
    #[serde(default)]
    pub amount: Option<String>,
    /// Source header carrying the category label.
    #[serde(default)]
    pub category: Option<String>,
}

impl ColumnMapping {
    /// True when no field is mapped.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.date.is_none() && self.amount.is_none() && self.category.is_none()
    }
}

/// Default-header matching policy used when a canonical field has no
/// explicit mapping.
///
/// The legacy system's exact matching heuristic is undocumented, so the
/// alias lists are configuration rather than hard-coded guesses. Matching is
/// case-insensitive on trimmed headers, first alias hit wins.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    /// Accepted headers for the `date` field.
    pub date_aliases: Vec<String>,
    /// Accepted headers for the `amount` field.
    pub amount_aliases: Vec<String>,
    /// Accepted headers for the `category` field.
    pub category_aliases: Vec<String>,
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        let aliases = |names: &[&str]| names.iter().map(|s| (*s).to_string()).collect();
        Self {
            date_aliases: aliases(&["date", "txn date", "transaction date", "posted date"]),
            amount_aliases: aliases(&["amount", "total", "total amount", "revenue", "value", "price"]),
            category_aliases: aliases(&["category", "type", "segment", "product category"]),
        }
    }
}

/// Column indices resolved against one concrete header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    /// Index of the date column.
    pub date: usize,
    /// Index of the amount column.
    pub amount: usize,
    /// Index of the category column, when one resolved.
    pub category: Option<usize>,
}

impl HeaderPolicy {
    /// Resolves canonical fields against a header row.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Malformed` when an explicitly mapped header is
    /// absent from the file, or when no `date`/`amount` column resolves at
    /// all. A missing `category` column is not an error.
    pub fn resolve(
        &self,
        headers: &[String],
        mapping: Option<&ColumnMapping>,
    ) -> Result<ResolvedColumns, IngestError> {
        let date = resolve_required(
            headers,
            "date",
            mapping.and_then(|m| m.date.as_deref()),
            &self.date_aliases,
        )?;
        let amount = resolve_required(
            headers,
            "amount",
            mapping.and_then(|m| m.amount.as_deref()),
            &self.amount_aliases,
        )?;
        let category = resolve_optional(
            headers,
            "category",
            mapping.and_then(|m| m.category.as_deref()),
            &self.category_aliases,
        )?;

        Ok(ResolvedColumns {
            date,
            amount,
            category,
        })
    }
}

fn resolve_required(
    headers: &[String],
    field: &str,
    mapped: Option<&str>,
    aliases: &[String],
) -> Result<usize, IngestError> {
    if let Some(source) = mapped {
        return find_header(headers, source).ok_or_else(|| {
            IngestError::Malformed(format!(
                "mapped {field} column '{source}' not present in file"
            ))
        });
    }

    aliases
        .iter()
        .find_map(|alias| find_header(headers, alias))
        .ok_or_else(|| IngestError::Malformed(format!("no resolvable {field} column")))
}

fn resolve_optional(
    headers: &[String],
    field: &str,
    mapped: Option<&str>,
    aliases: &[String],
) -> Result<Option<usize>, IngestError> {
    if let Some(source) = mapped {
        return find_header(headers, source).map(Some).ok_or_else(|| {
            IngestError::Malformed(format!(
                "mapped {field} column '{source}' not present in file"
            ))
        });
    }

    Ok(aliases.iter().find_map(|alias| find_header(headers, alias)))
}

/// Case-insensitive header lookup on trimmed values.
fn find_header(headers: &[String], wanted: &str) -> Option<usize> {
    let wanted = wanted.trim();
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(wanted))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_default_policy_resolves_case_insensitively() {
        let policy = HeaderPolicy::default();
        let headers = headers(&["Txn Date", "Description", "AMOUNT", "Category"]);

        let resolved = policy.resolve(&headers, None).unwrap();

        assert_eq!(resolved.date, 0);
        assert_eq!(resolved.amount, 2);
        assert_eq!(resolved.category, Some(3));
    }

    #[test]
    fn test_explicit_mapping_wins_over_aliases() {
        let policy = HeaderPolicy::default();
        let headers = headers(&["Date", "Gross", "Amount"]);
        let mapping = ColumnMapping {
            amount: Some("Gross".to_string()),
            ..ColumnMapping::default()
        };

        let resolved = policy.resolve(&headers, Some(&mapping)).unwrap();

        assert_eq!(resolved.amount, 1);
    }

    #[test]
    fn test_mapped_header_missing_is_malformed() {
        let policy = HeaderPolicy::default();
        let headers = headers(&["Date", "Amount"]);
        let mapping = ColumnMapping {
            amount: Some("Total Amount".to_string()),
            ..ColumnMapping::default()
        };

        let err = policy.resolve(&headers, Some(&mapping)).unwrap_err();
        assert!(matches!(err, IngestError::Malformed(_)));
    }

    #[test]
    fn test_missing_amount_column_is_malformed() {
        let policy = HeaderPolicy::default();
        let headers = headers(&["Date", "Description"]);

        let err = policy.resolve(&headers, None).unwrap_err();
        assert!(matches!(err, IngestError::Malformed(_)));
    }

    #[test]
    fn test_missing_category_is_not_an_error() {
        let policy = HeaderPolicy::default();
        let headers = headers(&["Date", "Amount"]);

        let resolved = policy.resolve(&headers, None).unwrap();
        assert_eq!(resolved.category, None);
    }
}
