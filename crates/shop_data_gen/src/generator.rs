//! Data generator that produces the rows of all five tables.
//!
//! Generates deterministic, FK-consistent data: parents are created before
//! children, ids are dense and 1-based, and payment amounts are derived from
//! the order's item subtotals.

use crate::config::GenerateConfig;
use crate::dataset::{order_totals, Dataset};
use crate::fake::FakeData;
use crate::records::{
    round_cents, Customer, Order, OrderItem, Payment, PaymentStatus, Product,
};
use anyhow::Result;
use chrono::Months;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// How far back customer signups reach from `as_of`
const SIGNUP_WINDOW_MONTHS: u32 = 24;

/// Main data generator
pub struct Generator {
    config: GenerateConfig,
    seed: u64,
    fake: FakeData<ChaCha8Rng>,
}

impl Generator {
    /// Create a generator, validating the settings first
    pub fn new(config: GenerateConfig) -> Result<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        Ok(Self {
            fake: FakeData::new(ChaCha8Rng::seed_from_u64(seed)),
            seed,
            config,
        })
    }

    /// The seed in use, so a random run can be reproduced
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &GenerateConfig {
        &self.config
    }

    /// Generate all five tables
    pub fn generate(&mut self) -> Dataset {
        let customers = self.generate_customers();
        let products = self.generate_products();

        let customer_ids: Vec<i64> = customers.iter().map(|c| c.customer_id).collect();
        let orders = self.generate_orders(&customer_ids);
        let order_items = self.generate_order_items(&orders, &products);

        let totals = order_totals(&order_items);
        let payments = self.generate_payments(&orders, &totals);

        Dataset {
            customers,
            products,
            orders,
            order_items,
            payments,
        }
    }

    fn generate_customers(&mut self) -> Vec<Customer> {
        let as_of = self.config.as_of;
        let signup_start = as_of
            .checked_sub_months(Months::new(SIGNUP_WINDOW_MONTHS))
            .unwrap_or(as_of);

        (1..=self.config.customers as i64)
            .map(|customer_id| Customer {
                customer_id,
                name: self.fake.full_name(),
                email: self.fake.email(),
                gender: self.fake.gender(),
                signup_date: self.fake.date_between(signup_start, as_of),
                city: self.fake.city(),
                country: self.fake.country(),
            })
            .collect()
    }

    fn generate_products(&mut self) -> Vec<Product> {
        let (min_price, max_price) = (self.config.min_price, self.config.max_price);
        let max_stock = self.config.max_stock;

        (1..=self.config.products as i64)
            .map(|product_id| Product {
                product_id,
                name: self.fake.product_name(),
                category: self.fake.category().to_string(),
                price: self.fake.price(min_price, max_price),
                stock: self.fake.int_range(0, max_stock),
            })
            .collect()
    }

    fn generate_orders(&mut self, customer_ids: &[i64]) -> Vec<Order> {
        let (start, end) = (self.config.order_window_start, self.config.as_of);

        (1..=self.config.orders as i64)
            .map(|order_id| Order {
                order_id,
                customer_id: self.fake.pick_id(customer_ids),
                order_date: self.fake.datetime_between(start, end),
                status: self.fake.order_status(),
            })
            .collect()
    }

    fn generate_order_items(&mut self, orders: &[Order], products: &[Product]) -> Vec<OrderItem> {
        let product_ids: Vec<i64> = products.iter().map(|p| p.product_id).collect();
        let prices: BTreeMap<i64, f64> = products.iter().map(|p| (p.product_id, p.price)).collect();
        let min_items = self.config.min_order_items as i64;
        let max_items = self.config.max_order_items as i64;

        let mut items = Vec::with_capacity(orders.len() * self.config.max_order_items);
        for order in orders {
            let item_count = self.fake.int_range(min_items, max_items) as usize;
            for product_id in self.fake.sample_ids(&product_ids, item_count) {
                let quantity = self.fake.int_range(1, self.config.max_quantity);
                let price = prices[&product_id];
                items.push(OrderItem {
                    order_item_id: items.len() as i64 + 1,
                    order_id: order.order_id,
                    product_id,
                    quantity,
                    subtotal: round_cents(price * quantity as f64),
                });
            }
        }
        items
    }

    fn generate_payments(&mut self, orders: &[Order], totals: &BTreeMap<i64, f64>) -> Vec<Payment> {
        let mut payments = Vec::with_capacity(orders.len());
        for order in orders {
            let Some(&total) = totals.get(&order.order_id) else {
                tracing::warn!(order_id = order.order_id, "order has no items, skipping payments");
                continue;
            };

            let attempts = if self.fake.bool_with_probability(self.config.retry_probability) {
                self.fake.int_range(2, 3)
            } else {
                1
            };

            for attempt in 1..=attempts {
                let payment_status = if attempt < attempts {
                    PaymentStatus::Failed
                } else {
                    self.fake.final_payment_status()
                };
                payments.push(Payment {
                    payment_id: payments.len() as i64 + 1,
                    order_id: order.order_id,
                    amount: total,
                    payment_method: self.fake.payment_method(),
                    payment_status,
                });
            }
        }
        payments
    }
}
