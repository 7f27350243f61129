//! End-to-end parse -> detect pipeline scenarios.

use rust_decimal_macros::dec;

use revguard_core::detect::{DetectionConfig, RuleKind, detect};
use revguard_core::ingest::{ColumnMapping, FileFormat, HeaderPolicy, UploadConfig, parse};

#[test]
fn test_mapped_csv_with_duplicate_and_anomalous_rows() {
    // Five data rows: one duplicate pair (rows 1 and 2) and one amount
    // above the ceiling (row 4). Headers need the explicit mapping.
    let csv = b"Txn Date,Total Amount,Category\n\
        2024-05-01,120.00,Retail\n\
        2024-05-02,80.00,Retail\n\
        2024-05-02,80.00,Retail\n\
        2024-05-03,45.00,Services\n\
        2024-05-04,12000.00,Wholesale\n";

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
        &HeaderPolicy::default(),
        &UploadConfig::default(),
    )
    .expect("file should parse");

    assert_eq!(parsed.rows.len(), 5);
    assert_eq!(parsed.rows_skipped, 0);

    let outcome = detect(
        &parsed.rows,
        parsed.rows_skipped,
        &DetectionConfig {
            amount_ceiling: dec!(10000),
        },
    );

    assert_eq!(outcome.summary.rows_processed, 5);
    assert_eq!(outcome.summary.total_flagged, 2);
    assert_eq!(outcome.findings.len(), 2);

    let rules: Vec<RuleKind> = outcome.findings.iter().map(|f| f.rule).collect();
    assert_eq!(rules, vec![RuleKind::Duplicate, RuleKind::AnomalousAmount]);

    // The duplicate is the second occurrence of the pair; the anomalous
    // amount is the last row.
    assert_eq!(outcome.findings[0].row_index, 2);
    assert_eq!(outcome.findings[1].row_index, 4);
    assert_eq!(outcome.summary.rule_count(RuleKind::Duplicate), 1);
    assert_eq!(outcome.summary.rule_count(RuleKind::AnomalousAmount), 1);
    // 80 (duplicated amount) + 2000 (excess over the ceiling)
    assert_eq!(outcome.summary.total_impact, dec!(2080));
}

#[test]
fn test_skipped_rows_flow_into_the_summary() {
    let csv = b"date,amount,category\n\
        2024-05-01,100.00,Retail\n\
        ,100.00,Retail\n\
        2024-05-03,oops,Retail\n";

    let parsed = parse(
        csv,
        FileFormat::Csv,
        None,
        None,
        &HeaderPolicy::default(),
        &UploadConfig::default(),
    )
    .expect("file should parse");

    assert_eq!(parsed.rows.len(), 1);
    assert_eq!(parsed.rows_skipped, 2);

    let outcome = detect(
        &parsed.rows,
        parsed.rows_skipped,
        &DetectionConfig::default(),
    );

    assert_eq!(outcome.summary.rows_processed, 1);
    assert_eq!(outcome.summary.rows_skipped, 2);
    assert_eq!(outcome.summary.total_flagged, 0);
}
