//! Generation settings.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Settings for one generation pass.
///
/// Every field has a default, so a partial YAML section is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Number of customers
    pub customers: usize,
    /// Number of products
    pub products: usize,
    /// Number of orders
    pub orders: usize,
    /// Fewest distinct products per order
    pub min_order_items: usize,
    /// Most distinct products per order
    pub max_order_items: usize,
    /// Largest quantity of one product in an order
    pub max_quantity: i64,
    /// Lowest unit price
    pub min_price: f64,
    /// Highest unit price
    pub max_price: f64,
    /// Largest stock level
    pub max_stock: i64,
    /// Share of orders that needed 2-3 payment attempts
    pub retry_probability: f64,
    /// First day of the order window
    pub order_window_start: NaiveDate,
    /// Last day of the order and signup windows (defaults to today)
    pub as_of: NaiveDate,
    /// RNG seed; random when absent
    pub seed: Option<u64>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            customers: 1200,
            products: 800,
            orders: 1500,
            min_order_items: 1,
            max_order_items: 5,
            max_quantity: 5,
            min_price: 9.99,
            max_price: 999.99,
            max_stock: 500,
            retry_probability: 0.1,
            order_window_start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            as_of: chrono::Local::now().date_naive(),
            seed: None,
        }
    }
}

impl GenerateConfig {
    /// Reject settings that cannot produce a consistent dataset
    pub fn validate(&self) -> Result<()> {
        if self.customers == 0 {
            bail!("customers must be at least 1");
        }
        if self.products == 0 {
            bail!("products must be at least 1");
        }
        if self.min_order_items == 0 {
            bail!("min_order_items must be at least 1 (every order needs an item)");
        }
        if self.min_order_items > self.max_order_items {
            bail!(
                "min_order_items ({}) is greater than max_order_items ({})",
                self.min_order_items,
                self.max_order_items
            );
        }
        if self.max_quantity < 1 {
            bail!("max_quantity must be at least 1");
        }
        if !(self.min_price > 0.0 && self.min_price <= self.max_price) {
            bail!(
                "invalid price range {:.2}..{:.2}",
                self.min_price,
                self.max_price
            );
        }
        if self.max_stock < 0 {
            bail!("max_stock must not be negative");
        }
        if !(0.0..=1.0).contains(&self.retry_probability) {
            bail!(
                "retry_probability must be between 0 and 1, got {}",
                self.retry_probability
            );
        }
        if self.order_window_start > self.as_of {
            bail!(
                "order window starts {} which is after as_of {}",
                self.order_window_start,
                self.as_of
            );
        }
        Ok(())
    }
}
