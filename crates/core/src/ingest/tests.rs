//! Ingestion parser tests.

use rust_decimal_macros::dec;

use super::*;

fn default_config() -> UploadConfig {
    UploadConfig::default()
}

fn policy() -> HeaderPolicy {
    HeaderPolicy::default()
}

#[test]
fn test_csv_basic_parse_preserves_order() {
    let csv = b"date,amount,category\n\
        2024-01-01,100.00,Retail\n\
        2024-01-02,-25.50,Refunds\n\
        2024-01-03,300,\n";

    let parsed = parse(csv, FileFormat::Csv, None, None, &policy(), &default_config()).unwrap();

    assert_eq!(parsed.rows_skipped, 0);
    assert_eq!(parsed.rows.len(), 3);
    assert_eq!(parsed.rows[0].amount, dec!(100.00));
    assert_eq!(parsed.rows[1].amount, dec!(-25.50));
    assert_eq!(parsed.rows[0].category.as_deref(), Some("Retail"));
    assert_eq!(parsed.rows[2].category, None);
    assert_eq!(
        parsed.rows.iter().map(|r| r.row_index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[test]
fn test_processed_plus_skipped_equals_data_rows() {
    let csv = b"date,amount\n\
        2024-01-01,10\n\
        not-a-date,20\n\
        2024-01-03,\n\
        2024-01-04,40\n";

    let parsed = parse(csv, FileFormat::Csv, None, None, &policy(), &default_config()).unwrap();

    assert_eq!(parsed.rows.len(), 2);
    assert_eq!(parsed.rows_skipped, 2);
    assert_eq!(parsed.rows.len() as u64 + parsed.rows_skipped, 4);
}

#[test]
fn test_column_mapping_resolves_custom_headers() {
    let csv = b"Txn Date,Total Amount,notes\n\
        2024-02-01,55.00,ok\n";
    let mapping = ColumnMapping {
        date: Some("Txn Date".to_string()),
        amount: Some("Total Amount".to_string()),
        category: None,
    };

    let parsed = parse(
        csv,
        FileFormat::Csv,
        Some(&mapping),
        None,
        &policy(),
        &default_config(),
    )
    .unwrap();

    assert_eq!(parsed.rows.len(), 1);
    assert_eq!(parsed.rows[0].amount, dec!(55.00));
}

#[test]
fn test_oversize_input_rejected_before_parsing() {
    // Garbage body: would be Malformed if the parser ever looked at it.
    let bytes = vec![b'x'; 64];
    let config = UploadConfig { max_bytes: 32 };

    let err = parse(&bytes, FileFormat::Csv, None, None, &policy(), &config).unwrap_err();

    assert_eq!(err, IngestError::TooLarge { size: 64, max: 32 });
}

#[test]
fn test_size_exactly_at_limit_accepted() {
    let csv = b"date,amount\n2024-01-01,10\n";
    let config = UploadConfig {
        max_bytes: csv.len(),
    };

    let parsed = parse(csv, FileFormat::Csv, None, None, &policy(), &config).unwrap();
    assert_eq!(parsed.rows.len(), 1);
}

#[test]
fn test_content_mismatch_is_unsupported_format() {
    // ZIP container declared as CSV.
    let bytes = b"PK\x03\x04not-a-csv";

    let err = parse(
        bytes,
        FileFormat::Csv,
        None,
        None,
        &policy(),
        &default_config(),
    )
    .unwrap_err();

    assert!(matches!(err, IngestError::UnsupportedFormat(_)));
}

#[test]
fn test_plain_text_declared_as_xlsx_is_unsupported() {
    let bytes = b"date,amount\n2024-01-01,10\n";

    let err = parse(
        bytes,
        FileFormat::Xlsx,
        None,
        None,
        &policy(),
        &default_config(),
    )
    .unwrap_err();

    assert!(matches!(err, IngestError::UnsupportedFormat(_)));
}

#[test]
fn test_missing_required_column_is_malformed() {
    let csv = b"when,how much\n2024-01-01,10\n";

    let err = parse(
        csv,
        FileFormat::Csv,
        None,
        None,
        &policy(),
        &default_config(),
    )
    .unwrap_err();

    assert!(matches!(err, IngestError::Malformed(_)));
}

#[test]
fn test_empty_category_cell_becomes_none() {
    let csv = b"date,amount,category\n2024-01-01,10,   \n";

    let parsed = parse(csv, FileFormat::Csv, None, None, &policy(), &default_config()).unwrap();

    assert_eq!(parsed.rows[0].category, None);
}

#[test]
fn test_short_rows_are_skipped_not_fatal() {
    // Second data row has no amount cell at all.
    let csv = b"date,amount\n2024-01-01,10\n2024-01-02\n";

    let parsed = parse(csv, FileFormat::Csv, None, None, &policy(), &default_config()).unwrap();

    assert_eq!(parsed.rows.len(), 1);
    assert_eq!(parsed.rows_skipped, 1);
}
