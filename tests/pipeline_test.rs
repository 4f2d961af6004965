//! End-to-end tests: generate, write, load, check and verify.

use chrono::NaiveDate;
use shop_data_gen::{
    count_rows, read_dataset, table_path, write_dataset, GenerateConfig, Generator, PaymentStatus,
    Schema, TABLE_NAMES,
};
use shop_etl::config::ProjectPaths;
use shop_etl::duckdb::{CsvLoader, Database, IntegrityReport};
use shop_etl::verify::VerifyReport;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
}

#[test]
fn test_default_sizes_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let paths = ProjectPaths::under(temp_dir.path());

    let config = GenerateConfig {
        seed: Some(2024),
        as_of: as_of(),
        ..Default::default()
    };
    let data = Generator::new(config).unwrap().generate();
    assert_eq!(data.check_consistency(), vec![]);

    write_dataset(&data, &paths.data_dir).unwrap();
    assert_eq!(count_rows(&table_path(&paths.data_dir, "customers")).unwrap(), 1200);
    assert_eq!(count_rows(&table_path(&paths.data_dir, "products")).unwrap(), 800);
    assert_eq!(count_rows(&table_path(&paths.data_dir, "orders")).unwrap(), 1500);
    let items = count_rows(&table_path(&paths.data_dir, "order_items")).unwrap();
    assert!((1500..=7500).contains(&items), "{} order items", items);
    let payments = count_rows(&table_path(&paths.data_dir, "payments")).unwrap();
    assert!((1500..=4500).contains(&payments), "{} payments", payments);

    let schema = Schema::ecommerce();
    let mut db = Database::open(&paths.database).unwrap();
    let stats = CsvLoader::new(&schema).load(&mut db, &paths.data_dir).unwrap();
    assert_eq!(stats.rows_for("order_items"), Some(items as u64));

    let report = IntegrityReport::run(&db, &schema).unwrap();
    assert_eq!(report.row_count("customers"), Some(1200));
    assert_eq!(report.row_count("products"), Some(800));
    assert_eq!(report.row_count("orders"), Some(1500));
    assert_eq!(report.row_count("order_items"), Some(items as i64));
    assert_eq!(report.row_count("payments"), Some(payments as i64));
    assert_eq!(report.total_orphans(), 0);
    assert!(report.is_clean(), "{}", report);
}

#[test]
fn test_csv_round_trip_preserves_dataset() {
    let temp_dir = TempDir::new().unwrap();
    let config = GenerateConfig {
        customers: 50,
        products: 30,
        orders: 100,
        seed: Some(17),
        as_of: as_of(),
        ..Default::default()
    };
    let data = Generator::new(config).unwrap().generate();
    write_dataset(&data, temp_dir.path()).unwrap();

    let back = read_dataset(temp_dir.path()).unwrap();
    assert_eq!(back, data);
    assert_eq!(back.check_consistency(), vec![]);
}

#[test]
fn test_same_seed_writes_identical_files() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    for dir in [first.path(), second.path()] {
        let config = GenerateConfig {
            customers: 20,
            products: 10,
            orders: 40,
            seed: Some(5),
            as_of: as_of(),
            ..Default::default()
        };
        let data = Generator::new(config).unwrap().generate();
        write_dataset(&data, dir).unwrap();
    }
    for table in TABLE_NAMES {
        let a = fs::read(table_path(first.path(), table)).unwrap();
        let b = fs::read(table_path(second.path(), table)).unwrap();
        assert_eq!(a, b, "{} differs", table);
    }
}

#[test]
fn test_payment_attempt_invariants() {
    let config = GenerateConfig {
        orders: 400,
        retry_probability: 0.5,
        seed: Some(8),
        as_of: as_of(),
        ..Default::default()
    };
    let data = Generator::new(config).unwrap().generate();
    let totals = data.order_totals();

    let mut retried = 0;
    for (order_id, attempts) in data.payments_by_order() {
        assert!((1..=3).contains(&attempts.len()));
        let (last, earlier) = attempts.split_last().unwrap();
        assert_ne!(last.payment_status, PaymentStatus::Failed);
        assert!(earlier
            .iter()
            .all(|p| p.payment_status == PaymentStatus::Failed));
        assert!(attempts.iter().all(|p| p.amount == totals[&order_id]));
        if attempts.len() > 1 {
            retried += 1;
        }
    }
    assert!(retried > 100, "only {} retried orders", retried);
}

#[test]
fn test_verify_complete_project() {
    let temp_dir = TempDir::new().unwrap();
    let paths = ProjectPaths::under(temp_dir.path());

    let config = GenerateConfig {
        customers: 15,
        products: 10,
        orders: 25,
        seed: Some(3),
        as_of: as_of(),
        ..Default::default()
    };
    let data = Generator::new(config).unwrap().generate();
    write_dataset(&data, &paths.data_dir).unwrap();

    let before = VerifyReport::collect(&paths).unwrap();
    assert!(before.data_complete());
    assert!(!before.database_complete());
    assert!(!before.is_complete());

    {
        let mut db = Database::open(&paths.database).unwrap();
        CsvLoader::new(&Schema::ecommerce())
            .load(&mut db, &paths.data_dir)
            .unwrap();
    }
    fs::create_dir_all(&paths.sql_dir).unwrap();
    fs::write(paths.sql_dir.join("01_orders.sql"), "SELECT COUNT(*) FROM orders").unwrap();

    let after = VerifyReport::collect(&paths).unwrap();
    assert!(after.is_complete(), "{}", after);
    let tables = after.tables.as_ref().unwrap();
    assert_eq!(tables.len(), 5);
    let orders = tables.iter().find(|t| t.table == "orders").unwrap();
    assert_eq!(orders.rows, Some(25));
    assert_eq!(after.queries.len(), 1);

    let text = after.to_string();
    assert!(text.contains("[OK] table orders: 25 rows"));
    assert!(!text.contains("[MISSING]"));
    assert!(Path::new(&after.database).ends_with("ecommerce.duckdb"));
}
