//! End-to-end cleaning runs: data file and rules file in, cleaned table and
//! cleaning log out.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use scrub::{
    CellValue, CleaningLogDocument, Parser, RuleStatus, ScrubConfig, ScrubError, Scrubber,
    TableFormat,
};

const CAFE_SALES: &str = "\
Transaction ID,Item,Quantity,Price Per Unit,Total Spent,Payment Method
TXN_001,Coffee,2,2.0,4.0,Cash
TXN_002,Cake,1,3.0,ERROR,Card
TXN_003,UNKNOWN,3,,9.0,
TXN_004,Tea,2,1.5,4.0,Cash
";

const CAFE_RULES: &str = r#"{
    "metadata": {"total_rules": 6, "generated_at": "2024-03-01T12:00:00"},
    "rules": [
        {
            "rule_id": "normalize_unknown_item",
            "description": "Replace placeholder item names",
            "confidence": 0.95,
            "rule_type": "transformation",
            "columns": ["Item"],
            "pattern": "^(UNKNOWN|ERROR)$",
            "replacement": "Unknown"
        },
        {
            "rule_id": "impute_price",
            "description": "Fill missing prices with the median",
            "confidence": 0.9,
            "rule_type": "imputation",
            "columns": ["Price Per Unit"],
            "strategy": "median"
        },
        {
            "rule_id": "impute_payment",
            "confidence": 0.85,
            "rule_type": "imputation",
            "columns": ["Payment Method"],
            "strategy": "mode"
        },
        {
            "rule_id": "flag_total",
            "description": "Flag totals that disagree with quantity times price",
            "confidence": 0.8,
            "rule_type": "anomaly_flag",
            "columns": ["Total Spent"],
            "predicate": {"kind": "product_mismatch", "factors": ["Quantity", "Price Per Unit"]}
        },
        {
            "rule_id": "fix_location",
            "confidence": 0.7,
            "rule_type": "transformation",
            "columns": ["Location"],
            "pattern": "^$",
            "replacement": "Unknown"
        },
        {
            "rule_id": "guess_discount",
            "confidence": 0.2,
            "rule_type": "imputation",
            "columns": ["Quantity"],
            "strategy": "mean"
        }
    ]
}"#;

struct Workspace {
    dir: TempDir,
    data: PathBuf,
    rules: PathBuf,
}

fn workspace() -> Workspace {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let data = dir.path().join("cafe_sales.csv");
    let rules = dir.path().join("cleaning_rules.json");
    fs::write(&data, CAFE_SALES).expect("Failed to write data");
    fs::write(&rules, CAFE_RULES).expect("Failed to write rules");
    Workspace { dir, data, rules }
}

fn output(ws: &Workspace, name: &str) -> PathBuf {
    ws.dir.path().join("processed").join(name)
}

// =============================================================================
// Facade
// =============================================================================

#[test]
fn test_clean_cafe_sales() {
    let ws = workspace();

    let run = Scrubber::new().clean(&ws.data, &ws.rules).expect("Cleaning failed");

    let source = run.source.as_ref().expect("file runs carry source metadata");
    assert_eq!(source.file, "cafe_sales.csv");
    assert_eq!(source.format, "csv");
    assert_eq!(source.row_count, 4);
    assert_eq!(source.column_count, 6);
    assert!(source.hash.starts_with("sha256:"));

    assert_eq!(run.original_shape, (4, 6));
    assert_eq!(run.table.shape(), (4, 7));
    assert!(run.rules_skipped.is_empty());

    let log = &run.report.log;
    assert_eq!(log.len(), 6);
    let statuses: Vec<RuleStatus> = log.iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![
            RuleStatus::Applied,
            RuleStatus::Applied,
            RuleStatus::Applied,
            RuleStatus::Applied,
            RuleStatus::Failed,
            RuleStatus::NoOp,
        ]
    );

    assert_eq!(run.table.get(2, "Item"), Some(&CellValue::text("Unknown")));
    assert_eq!(run.table.get(2, "Price Per Unit"), Some(&CellValue::Number(2.0)));
    assert_eq!(run.table.get(2, "Payment Method"), Some(&CellValue::text("Cash")));

    // Row 2 sees the imputed price: 3 * 2.0 != 9.0.
    let flags = run.table.column("Total Spent_flag_flag_total").unwrap();
    assert_eq!(
        flags,
        &[
            CellValue::Bool(false),
            CellValue::Bool(false),
            CellValue::Bool(true),
            CellValue::Bool(true),
        ]
    );
    assert_eq!(log[3].errors, 1);
    assert_eq!(log[3].rows_affected, 2);

    // Quantity has no missing cells, so its imputation changes nothing.
    assert_eq!(log[5].rows_affected, 0);

    let summary = &run.report.summary;
    assert_eq!(summary.rules_failed, 1);
    assert_eq!(summary.rules_no_op, 1);
    let problems: Vec<&str> = summary.problems.iter().map(|p| p.rule_id.as_str()).collect();
    assert_eq!(problems, vec!["fix_location", "guess_discount"]);
}

#[test]
fn test_min_confidence_skips_rules() {
    let ws = workspace();
    let scrubber = Scrubber::with_config(ScrubConfig {
        min_confidence: Some(0.5),
        ..Default::default()
    });

    let run = scrubber.clean(&ws.data, &ws.rules).unwrap();

    assert_eq!(run.rules_skipped, vec!["guess_discount".to_string()]);
    assert_eq!(run.report.log.len(), 5);
    assert!(run.report.log.iter().all(|e| e.rule_id != "guess_discount"));
}

#[test]
fn test_missing_data_file() {
    let ws = workspace();
    let result = Scrubber::new().clean(ws.dir.path().join("absent.csv"), &ws.rules);
    assert!(matches!(result, Err(ScrubError::Io { .. })));
}

#[test]
fn test_short_records_are_padded() {
    let ws = workspace();
    fs::write(&ws.data, "a,b\n1,2\n3\n").unwrap();

    let run = Scrubber::new().clean(&ws.data, &ws.rules).unwrap();

    assert_eq!(run.table.shape(), (2, 2));
    assert_eq!(run.table.get(1, "b"), Some(&CellValue::Missing));
    // None of the rule columns exist in this file.
    assert!(run.report.log.iter().all(|e| e.status == RuleStatus::Failed));
}

// =============================================================================
// Outputs
// =============================================================================

fn write_outputs(ws: &Workspace, format: TableFormat, file_name: &str) -> (PathBuf, PathBuf) {
    let run = Scrubber::new().clean(&ws.data, &ws.rules).unwrap();

    let data_path = output(ws, file_name);
    scrub::write_table(&run.table, &data_path, format).expect("Writing table failed");

    let log_path = output(ws, "cleaning_log.json");
    CleaningLogDocument::new(&run, Some(ws.rules.as_path()))
        .save(&log_path)
        .expect("Writing log failed");

    (data_path, log_path)
}

#[test]
fn test_cleaned_csv_reloads() {
    let ws = workspace();
    let (data_path, _) = write_outputs(&ws, TableFormat::Csv, "cleaned_data.csv");

    let (table, source) = Parser::new().parse_file(&data_path).unwrap();

    assert_eq!(source.row_count, 4);
    assert_eq!(table.column_count(), 7);
    assert_eq!(table.get(2, "Item"), Some(&CellValue::text("Unknown")));
    assert_eq!(
        table.get(2, "Total Spent_flag_flag_total"),
        Some(&CellValue::text("true"))
    );
}

#[test]
fn test_cleaned_json_rows() {
    let ws = workspace();
    let (data_path, _) = write_outputs(&ws, TableFormat::Json, "cleaned_data.json");

    let rows: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&data_path).unwrap()).unwrap();
    let rows = rows.as_array().expect("JSON output is an array of rows");

    assert_eq!(rows.len(), 4);
    assert_eq!(rows[2]["Payment Method"], "Cash");
    assert_eq!(rows[2]["Total Spent_flag_flag_total"], true);
    assert_eq!(rows[1]["Total Spent"], "ERROR");
}

#[test]
fn test_cleaning_log_round_trip() {
    let ws = workspace();
    let (_, log_path) = write_outputs(&ws, TableFormat::Csv, "cleaned_data.csv");

    let document = CleaningLogDocument::load(&log_path).expect("Loading log failed");

    assert_eq!(document.total_rules_applied, 6);
    assert_eq!(document.original_shape, (4, 6));
    assert_eq!(document.cleaned_shape, (4, 7));
    assert_eq!(
        document.columns_added,
        vec!["Total Spent_flag_flag_total".to_string()]
    );
    assert_eq!(document.rules_file.as_deref(), Some(ws.rules.as_path()));
    assert_eq!(
        document.source.as_ref().map(|s| s.file.as_str()),
        Some("cafe_sales.csv")
    );
    assert_eq!(document.rules_applied[4].rule_id, "fix_location");
    assert_eq!(document.rules_applied[4].status, RuleStatus::Failed);
    assert_eq!(document.summary.rules_applied, 4);
}

#[test]
fn test_log_is_plain_json() {
    let ws = workspace();
    let (_, log_path) = write_outputs(&ws, TableFormat::Csv, "cleaned_data.csv");

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&log_path).unwrap()).unwrap();

    let entries = value["rules_applied"].as_array().unwrap();
    assert_eq!(entries[0]["rule_id"], "normalize_unknown_item");
    assert_eq!(entries[0]["status"], "applied");
    assert_eq!(entries[4]["failure"]["kind"], "missing_column");
    assert!(Path::new(&log_path).exists());
}
