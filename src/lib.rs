//! Synthetic e-commerce ETL: load generated CSV files into DuckDB, check
//! referential integrity, and run canned join queries.
//!
//! Data generation lives in the `shop_data_gen` crate.

pub mod config;
pub mod duckdb;
pub mod logging;
pub mod progress;
pub mod verify;
