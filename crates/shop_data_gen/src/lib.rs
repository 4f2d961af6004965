//! Synthetic e-commerce data generator.
//!
//! Generates deterministic, FK-consistent customers, products, orders,
//! order items and payments, and writes them as CSV files.
//!
//! # Example
//!
//! ```rust,no_run
//! use shop_data_gen::{write_dataset, GenerateConfig, Generator};
//! use std::path::Path;
//!
//! let config = GenerateConfig {
//!     seed: Some(42),
//!     ..Default::default()
//! };
//! let mut generator = Generator::new(config).unwrap();
//! let data = generator.generate();
//!
//! for table in write_dataset(&data, Path::new("data")).unwrap() {
//!     println!("{}: {} rows", table.table, table.rows);
//! }
//! ```

pub mod config;
pub mod csv_io;
pub mod dataset;
pub mod fake;
pub mod generator;
pub mod records;
pub mod schema;

pub use config::GenerateConfig;
pub use csv_io::{
    count_rows, read_dataset, read_records, read_table, table_path, write_dataset, write_table,
    WrittenTable,
};
pub use dataset::{order_totals, Dataset, Violation, MAX_PAYMENT_ATTEMPTS};
pub use generator::Generator;
pub use records::{
    round_cents, Customer, Gender, Order, OrderItem, OrderStatus, Payment, PaymentMethod,
    PaymentStatus, Product, Record, TABLE_NAMES,
};
pub use schema::{Column, ForeignKey, Schema, SqlType, Table};
