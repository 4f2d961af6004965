//! The generated dataset and its referential-integrity bookkeeping.

use crate::records::{
    round_cents, Customer, Order, OrderItem, Payment, PaymentStatus, Product, Record,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Most payment attempts recorded for one order
pub const MAX_PAYMENT_ATTEMPTS: usize = 3;

/// All five tables of one generation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
    pub order_items: Vec<OrderItem>,
    pub payments: Vec<Payment>,
}

/// One broken invariant found by [`Dataset::check_consistency`]
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub table: &'static str,
    pub id: i64,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}: {}", self.table, self.id, self.message)
    }
}

/// Sum item subtotals per order, rounded to cents.
///
/// Items are summed in slice order so the result is reproducible.
pub fn order_totals(items: &[OrderItem]) -> BTreeMap<i64, f64> {
    let mut sums: BTreeMap<i64, f64> = BTreeMap::new();
    for item in items {
        *sums.entry(item.order_id).or_insert(0.0) += item.subtotal;
    }
    sums.into_iter()
        .map(|(order_id, sum)| (order_id, round_cents(sum)))
        .collect()
}

impl Dataset {
    /// Row count per table, parents first
    pub fn row_counts(&self) -> [(&'static str, usize); 5] {
        [
            (Customer::TABLE, self.customers.len()),
            (Product::TABLE, self.products.len()),
            (Order::TABLE, self.orders.len()),
            (OrderItem::TABLE, self.order_items.len()),
            (Payment::TABLE, self.payments.len()),
        ]
    }

    /// Computed total of every order that has items
    pub fn order_totals(&self) -> BTreeMap<i64, f64> {
        order_totals(&self.order_items)
    }

    /// Payments grouped by order, each group in payment-id order
    pub fn payments_by_order(&self) -> BTreeMap<i64, Vec<&Payment>> {
        let mut groups: BTreeMap<i64, Vec<&Payment>> = BTreeMap::new();
        for payment in &self.payments {
            groups.entry(payment.order_id).or_default().push(payment);
        }
        for group in groups.values_mut() {
            group.sort_by_key(|p| p.payment_id);
        }
        groups
    }

    /// Check every cross-table invariant, returning all violations found
    pub fn check_consistency(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        check_dense_ids(&self.customers, &mut violations);
        check_dense_ids(&self.products, &mut violations);
        check_dense_ids(&self.orders, &mut violations);
        check_dense_ids(&self.order_items, &mut violations);
        check_dense_ids(&self.payments, &mut violations);

        let customer_ids: HashSet<i64> = self.customers.iter().map(|c| c.customer_id).collect();
        let prices: HashMap<i64, f64> = self
            .products
            .iter()
            .map(|p| (p.product_id, p.price))
            .collect();
        let order_ids: HashSet<i64> = self.orders.iter().map(|o| o.order_id).collect();

        for order in &self.orders {
            if !customer_ids.contains(&order.customer_id) {
                violations.push(Violation {
                    table: Order::TABLE,
                    id: order.order_id,
                    message: format!("references missing customer {}", order.customer_id),
                });
            }
        }

        let mut products_per_order: HashMap<i64, HashSet<i64>> = HashMap::new();
        for item in &self.order_items {
            let violation = |message: String| Violation {
                table: OrderItem::TABLE,
                id: item.order_item_id,
                message,
            };
            if !order_ids.contains(&item.order_id) {
                violations.push(violation(format!(
                    "references missing order {}",
                    item.order_id
                )));
            }
            match prices.get(&item.product_id) {
                None => violations.push(violation(format!(
                    "references missing product {}",
                    item.product_id
                ))),
                Some(&price) => {
                    let expected = round_cents(price * item.quantity as f64);
                    if item.subtotal != expected {
                        violations.push(violation(format!(
                            "subtotal {:.2} != {:.2} x {} = {:.2}",
                            item.subtotal, price, item.quantity, expected
                        )));
                    }
                }
            }
            if item.quantity < 1 {
                violations.push(violation(format!("quantity {} < 1", item.quantity)));
            }
            if !products_per_order
                .entry(item.order_id)
                .or_default()
                .insert(item.product_id)
            {
                violations.push(violation(format!(
                    "product {} repeated within order {}",
                    item.product_id, item.order_id
                )));
            }
        }

        let totals = self.order_totals();
        let payments = self.payments_by_order();

        for order in &self.orders {
            let violation = |message: String| Violation {
                table: Order::TABLE,
                id: order.order_id,
                message,
            };
            if !totals.contains_key(&order.order_id) {
                violations.push(violation("has no order items".to_string()));
            }
            match payments.get(&order.order_id) {
                None => violations.push(violation("has no payments".to_string())),
                Some(attempts) if attempts.len() > MAX_PAYMENT_ATTEMPTS => {
                    violations.push(violation(format!(
                        "has {} payment attempts (max {})",
                        attempts.len(),
                        MAX_PAYMENT_ATTEMPTS
                    )))
                }
                Some(_) => {}
            }
        }

        for (order_id, attempts) in &payments {
            if !order_ids.contains(order_id) {
                for payment in attempts {
                    violations.push(Violation {
                        table: Payment::TABLE,
                        id: payment.payment_id,
                        message: format!("references missing order {}", order_id),
                    });
                }
                continue;
            }

            let total = totals.get(order_id).copied().unwrap_or(0.0);
            let last = attempts.len() - 1;
            for (i, payment) in attempts.iter().enumerate() {
                let violation = |message: String| Violation {
                    table: Payment::TABLE,
                    id: payment.payment_id,
                    message,
                };
                if payment.amount != total {
                    violations.push(violation(format!(
                        "amount {:.2} != order {} total {:.2}",
                        payment.amount, order_id, total
                    )));
                }
                let failed = payment.payment_status == PaymentStatus::Failed;
                if i < last && !failed {
                    violations.push(violation(format!(
                        "attempt {} of {} is {} but only the last attempt may succeed",
                        i + 1,
                        attempts.len(),
                        payment.payment_status
                    )));
                }
                if i == last && failed {
                    violations.push(violation("final attempt is Failed".to_string()));
                }
            }
        }

        violations
    }
}

fn check_dense_ids<R: Record>(rows: &[R], violations: &mut Vec<Violation>) {
    for (i, row) in rows.iter().enumerate() {
        let expected = i as i64 + 1;
        if row.id() != expected {
            violations.push(Violation {
                table: R::TABLE,
                id: row.id(),
                message: format!("expected id {} at position {}", expected, i + 1),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Gender, OrderStatus, PaymentMethod};
    use chrono::NaiveDate;

    fn tiny_dataset() -> Dataset {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        Dataset {
            customers: vec![Customer {
                customer_id: 1,
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                gender: Gender::Female,
                signup_date: day,
                city: "London".to_string(),
                country: "United Kingdom".to_string(),
            }],
            products: vec![
                Product {
                    product_id: 1,
                    name: "Engine Pro".to_string(),
                    category: "Books".to_string(),
                    price: 19.99,
                    stock: 4,
                },
                Product {
                    product_id: 2,
                    name: "Loom Basic".to_string(),
                    category: "Clothing".to_string(),
                    price: 5.25,
                    stock: 0,
                },
            ],
            orders: vec![Order {
                order_id: 1,
                customer_id: 1,
                order_date: day.and_hms_opt(9, 30, 0).unwrap(),
                status: OrderStatus::Delivered,
            }],
            order_items: vec![
                OrderItem {
                    order_item_id: 1,
                    order_id: 1,
                    product_id: 1,
                    quantity: 3,
                    subtotal: round_cents(19.99 * 3.0),
                },
                OrderItem {
                    order_item_id: 2,
                    order_id: 1,
                    product_id: 2,
                    quantity: 2,
                    subtotal: 10.5,
                },
            ],
            payments: vec![
                Payment {
                    payment_id: 1,
                    order_id: 1,
                    amount: 70.47,
                    payment_method: PaymentMethod::PayPal,
                    payment_status: PaymentStatus::Failed,
                },
                Payment {
                    payment_id: 2,
                    order_id: 1,
                    amount: 70.47,
                    payment_method: PaymentMethod::CreditCard,
                    payment_status: PaymentStatus::Completed,
                },
            ],
        }
    }

    #[test]
    fn test_consistent_dataset_has_no_violations() {
        let dataset = tiny_dataset();
        assert_eq!(dataset.check_consistency(), vec![]);
        assert_eq!(dataset.order_totals().get(&1), Some(&70.47));
    }

    #[test]
    fn test_detects_amount_mismatch() {
        let mut dataset = tiny_dataset();
        dataset.payments[1].amount = 70.0;
        let violations = dataset.check_consistency();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].table, "payments");
        assert!(violations[0].message.contains("70.47"));
    }

    #[test]
    fn test_detects_failed_final_attempt_and_success_before_last() {
        let mut dataset = tiny_dataset();
        dataset.payments[0].payment_status = PaymentStatus::Completed;
        dataset.payments[1].payment_status = PaymentStatus::Failed;
        let messages: Vec<String> = dataset
            .check_consistency()
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("only the last attempt may succeed"));
        assert!(messages[1].contains("final attempt is Failed"));
    }

    #[test]
    fn test_detects_dangling_references_and_sparse_ids() {
        let mut dataset = tiny_dataset();
        dataset.order_items[1].product_id = 99;
        dataset.orders[0].customer_id = 42;
        dataset.payments[1].payment_id = 5;
        let text: Vec<String> = dataset
            .check_consistency()
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert!(text.iter().any(|t| t.contains("missing product 99")));
        assert!(text.iter().any(|t| t.contains("missing customer 42")));
        assert!(text.iter().any(|t| t.starts_with("payments #5")));
    }

    #[test]
    fn test_detects_order_without_items_or_payments() {
        let mut dataset = tiny_dataset();
        dataset.order_items.clear();
        dataset.payments.clear();
        let violations = dataset.check_consistency();
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| v.table == "orders"));
    }
}
