//! Integration tests for running query files against a loaded database.

use chrono::NaiveDate;
use shop_data_gen::{write_dataset, GenerateConfig, Generator, Schema};
use shop_etl::duckdb::{
    discover_queries, CsvLoader, Database, OutputFormat, QueryOutcome, QueryRunner,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Load a 30-customer dataset and return the directory and database path
fn loaded_database() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config = GenerateConfig {
        customers: 30,
        products: 20,
        orders: 60,
        seed: Some(99),
        as_of: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        ..Default::default()
    };
    let data = Generator::new(config).unwrap().generate();
    let data_dir = temp_dir.path().join("data");
    write_dataset(&data, &data_dir).unwrap();

    let db_path = temp_dir.path().join("shop.duckdb");
    let mut db = Database::open(&db_path).unwrap();
    CsvLoader::new(&Schema::ecommerce())
        .load(&mut db, &data_dir)
        .unwrap();
    (temp_dir, db_path)
}

fn write_queries(dir: &Path, queries: &[(&str, &str)]) -> Vec<PathBuf> {
    fs::create_dir_all(dir).unwrap();
    for (name, sql) in queries {
        fs::write(dir.join(name), sql).unwrap();
    }
    discover_queries(dir).unwrap()
}

fn run(db: &Database, files: &[PathBuf], format: OutputFormat) -> (String, shop_etl::duckdb::RunSummary) {
    let mut out = Vec::new();
    let summary = QueryRunner::new(db, &mut out)
        .with_format(format)
        .run_all(files)
        .unwrap();
    (String::from_utf8(out).unwrap(), summary)
}

#[test]
fn test_malformed_query_does_not_stop_the_run() {
    let (temp_dir, db_path) = loaded_database();
    let files = write_queries(
        &temp_dir.path().join("sql"),
        &[
            ("01_count.sql", "SELECT COUNT(*) AS customers FROM customers;"),
            ("02_broken.sql", "SELEC nothing FROM nowhere"),
            ("03_empty.sql", "SELECT * FROM customers WHERE customer_id < 0"),
            (
                "04_all_customers.sql",
                "SELECT customer_id, name FROM customers ORDER BY customer_id",
            ),
        ],
    );
    let db = Database::open_read_only(&db_path).unwrap();
    let (output, summary) = run(&db, &files, OutputFormat::Table);

    assert_eq!(summary.reports.len(), 4);
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.succeeded(), 3);
    assert!(!summary.all_succeeded());

    let names: Vec<&str> = summary.reports.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["01_count", "02_broken", "03_empty", "04_all_customers"]);
    assert!(summary.reports[1].is_failed());
    match &summary.reports[1].outcome {
        QueryOutcome::Failed(message) => assert!(message.contains("SELEC")),
        QueryOutcome::Rows(_) => panic!("malformed query succeeded"),
    }

    assert_eq!(summary.reports[2].total_rows(), Some(0));
    assert_eq!(summary.reports[3].total_rows(), Some(30));

    assert!(output.contains("Running Query: 01_count"));
    assert!(output.contains("Running Query: 02_broken"));
    assert!(output.contains("No results returned."));
    assert!(output.contains("Total Rows Returned: 30"));
    assert!(output.contains("1 of 4 queries failed"));
}

#[test]
fn test_only_first_twenty_rows_shown() {
    let (temp_dir, db_path) = loaded_database();
    let files = write_queries(
        &temp_dir.path().join("sql"),
        &[(
            "ids.sql",
            "SELECT customer_id FROM customers ORDER BY customer_id",
        )],
    );
    let db = Database::open_read_only(&db_path).unwrap();
    let (output, summary) = run(&db, &files, OutputFormat::Table);

    assert!(summary.all_succeeded());
    assert!(output.contains("│ 20 "));
    assert!(!output.contains("│ 21 "));
    assert!(output.contains("Total Rows Returned: 30"));
    assert!(output.contains("All queries executed successfully"));
}

#[test]
fn test_unlimited_json_output() {
    let (temp_dir, db_path) = loaded_database();
    let files = write_queries(
        &temp_dir.path().join("sql"),
        &[(
            "ids.sql",
            "SELECT customer_id FROM customers ORDER BY customer_id",
        )],
    );
    let db = Database::open_read_only(&db_path).unwrap();
    let mut out = Vec::new();
    QueryRunner::new(&db, &mut out)
        .with_format(OutputFormat::Json)
        .with_limit(None)
        .run_all(&files)
        .unwrap();
    let output = String::from_utf8(out).unwrap();

    let start = output.find('[').unwrap();
    let end = output.rfind(']').unwrap();
    let parsed: Vec<serde_json::Value> = serde_json::from_str(&output[start..=end]).unwrap();
    assert_eq!(parsed.len(), 30);
    assert_eq!(parsed[29]["customer_id"], 30);
}

#[test]
fn test_bundled_queries_run_cleanly() {
    let (_temp_dir, db_path) = loaded_database();
    let sql_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("sql");
    let files = discover_queries(&sql_dir).unwrap();
    assert!(files.len() >= 5);

    let db = Database::open_read_only(&db_path).unwrap();
    let (_output, summary) = run(&db, &files, OutputFormat::Table);
    for report in &summary.reports {
        if let QueryOutcome::Failed(message) = &report.outcome {
            panic!("{} failed: {}", report.name, message);
        }
    }
}

#[test]
fn test_query_runner_requires_database() {
    let temp_dir = TempDir::new().unwrap();
    let err = Database::open_read_only(&temp_dir.path().join("nope.duckdb"))
        .err()
        .unwrap();
    assert!(err.to_string().contains("Database not found"));
}
