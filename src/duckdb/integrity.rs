//! Post-load integrity diagnostics.
//!
//! Counts rows per table, orphaned child rows per declared foreign key set,
//! and payments whose amount differs from their order's item total. Nothing
//! here fails a load; callers decide how to present nonzero counts.

use super::Database;
use anyhow::Result;
use shop_data_gen::records::{ORDER_ITEMS, PAYMENTS};
use shop_data_gen::Schema;
use std::fmt;

/// Payments whose amount is not the sum of their order's item subtotals
const PAYMENT_MISMATCH_SQL: &str = "SELECT COUNT(*) FROM payments p
  LEFT JOIN (
    SELECT order_id, SUM(subtotal) AS total FROM order_items GROUP BY order_id
  ) t ON t.order_id = p.order_id
  WHERE t.total IS NULL OR p.amount <> t.total";

#[derive(Debug, Clone, PartialEq)]
pub struct TableCount {
    pub table: String,
    pub rows: i64,
}

/// Orphan count for one child table
#[derive(Debug, Clone, PartialEq)]
pub struct OrphanCheck {
    pub table: String,
    /// Foreign keys checked, as `column -> parent.column`
    pub references: Vec<String>,
    pub orphans: i64,
}

/// Full diagnostic report
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrityReport {
    pub counts: Vec<TableCount>,
    pub orphans: Vec<OrphanCheck>,
    /// `None` when the schema has no order items or payments table
    pub payment_mismatches: Option<i64>,
}

impl IntegrityReport {
    /// Run every check against a loaded database
    pub fn run(db: &Database, schema: &Schema) -> Result<Self> {
        let mut counts = Vec::new();
        let mut orphans = Vec::new();

        for table in schema.tables_in_order() {
            let rows = db.query_count(&format!("SELECT COUNT(*) FROM {}", table.name))?;
            counts.push(TableCount {
                table: table.name.clone(),
                rows,
            });

            if let Some(sql) = table.orphan_count_sql() {
                let count = db.query_count(&sql)?;
                let references = table
                    .foreign_keys()
                    .iter()
                    .map(|(column, fk)| format!("{} -> {}.{}", column, fk.to_table, fk.to_column))
                    .collect();
                tracing::debug!(table = %table.name, orphans = count, "orphan check");
                orphans.push(OrphanCheck {
                    table: table.name.clone(),
                    references,
                    orphans: count,
                });
            }
        }

        let payment_mismatches =
            if schema.get_table(ORDER_ITEMS).is_some() && schema.get_table(PAYMENTS).is_some() {
                Some(db.query_count(PAYMENT_MISMATCH_SQL)?)
            } else {
                None
            };

        Ok(Self {
            counts,
            orphans,
            payment_mismatches,
        })
    }

    pub fn total_orphans(&self) -> i64 {
        self.orphans.iter().map(|o| o.orphans).sum()
    }

    /// True when no orphans and no payment mismatches were found
    pub fn is_clean(&self) -> bool {
        self.total_orphans() == 0 && self.payment_mismatches.unwrap_or(0) == 0
    }

    pub fn row_count(&self, table: &str) -> Option<i64> {
        self.counts.iter().find(|c| c.table == table).map(|c| c.rows)
    }
}

impl fmt::Display for IntegrityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Row counts:")?;
        for count in &self.counts {
            writeln!(f, "  {:<12} {:>8}", count.table, count.rows)?;
        }

        writeln!(f, "Orphan checks:")?;
        for check in &self.orphans {
            let marker = if check.orphans == 0 { "OK" } else { "WARN" };
            writeln!(
                f,
                "  [{}] {:<12} {:>8} orphaned ({})",
                marker,
                check.table,
                check.orphans,
                check.references.join(", ")
            )?;
        }

        if let Some(mismatches) = self.payment_mismatches {
            let marker = if mismatches == 0 { "OK" } else { "WARN" };
            writeln!(
                f,
                "  [{}] {:<12} {:>8} amount differs from order total",
                marker, PAYMENTS, mismatches
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_db() -> (Database, Schema) {
        let schema = Schema::ecommerce();
        let db = Database::open_in_memory().unwrap();
        for table in schema.tables_in_order() {
            db.execute(&table.create_sql()).unwrap();
        }
        (db, schema)
    }

    #[test]
    fn test_empty_database_is_clean() {
        let (db, schema) = schema_db();
        let report = IntegrityReport::run(&db, &schema).unwrap();
        assert_eq!(report.counts.len(), 5);
        assert!(report.counts.iter().all(|c| c.rows == 0));
        assert_eq!(report.orphans.len(), 3);
        assert_eq!(report.payment_mismatches, Some(0));
        assert!(report.is_clean());
    }

    #[test]
    fn test_counts_and_mismatch() {
        let (db, schema) = schema_db();
        db.execute("INSERT INTO customers VALUES (1, 'Ada', 'ada@example.com', 'Female', DATE '2024-01-01', 'London', 'UK')")
            .unwrap();
        db.execute("INSERT INTO products VALUES (1, 'Loom Basic', 'Books', 5.25, 3)")
            .unwrap();
        db.execute("INSERT INTO orders VALUES (1, 1, TIMESTAMP '2024-02-01 10:00:00', 'Shipped')")
            .unwrap();
        db.execute("INSERT INTO order_items VALUES (1, 1, 1, 2, 10.50)")
            .unwrap();
        db.execute("INSERT INTO payments VALUES (1, 1, 10.50, 'PayPal', 'Failed'), (2, 1, 10.00, 'PayPal', 'Completed')")
            .unwrap();

        let report = IntegrityReport::run(&db, &schema).unwrap();
        assert_eq!(report.row_count("payments"), Some(2));
        assert_eq!(report.total_orphans(), 0);
        assert_eq!(report.payment_mismatches, Some(1));
        assert!(!report.is_clean());

        let text = report.to_string();
        assert!(text.contains("order_items"));
        assert!(text.contains("product_id -> products.product_id"));
        assert!(text.contains("[WARN] payments"));
    }
}
