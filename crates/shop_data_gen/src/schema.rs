//! Schema model for the e-commerce tables, columns, and relationships.
//!
//! The model renders DuckDB DDL and drives both load order and the
//! orphan-row checks, so table and column names live in one place.

use crate::records::{CUSTOMERS, ORDERS, ORDER_ITEMS, PAYMENTS, PRODUCTS};
use std::collections::HashMap;

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SqlType {
    /// 32-bit integer
    Integer,
    /// Variable-length string
    Text,
    /// Decimal with precision and scale
    Decimal(u8, u8),
    /// Date only
    Date,
    /// Date and time without zone
    Timestamp,
}

impl SqlType {
    /// Returns the DuckDB type string
    pub fn to_duckdb(&self) -> String {
        match self {
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::Text => "VARCHAR".to_string(),
            SqlType::Decimal(p, s) => format!("DECIMAL({},{})", p, s),
            SqlType::Date => "DATE".to_string(),
            SqlType::Timestamp => "TIMESTAMP".to_string(),
        }
    }

    /// Parameter placeholder for a value bound as text or integer.
    ///
    /// Non-integer values are bound as their CSV text and cast by the engine,
    /// which keeps decimals exact.
    pub fn placeholder(&self) -> String {
        match self {
            SqlType::Integer | SqlType::Text => "?".to_string(),
            other => format!("CAST(? AS {})", other.to_duckdb()),
        }
    }
}

/// Foreign key constraint
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub to_table: String,
    pub to_column: String,
}

/// Column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub sql_type: SqlType,
    pub not_null: bool,
    pub primary_key: bool,
    pub foreign_key: Option<ForeignKey>,
}

impl Column {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            not_null: false,
            primary_key: false,
            foreign_key: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.not_null = true;
        self
    }

    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKey {
            to_table: table.into(),
            to_column: column.into(),
        });
        self
    }
}

/// Table definition
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, col: Column) -> Self {
        self.columns.push(col);
        self
    }

    /// Get the primary key column name (assumes single-column PK)
    pub fn primary_key_column(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .map(|c| c.name.as_str())
    }

    /// Get all foreign key relationships
    pub fn foreign_keys(&self) -> Vec<(&str, &ForeignKey)> {
        self.columns
            .iter()
            .filter_map(|c| c.foreign_key.as_ref().map(|fk| (c.name.as_str(), fk)))
            .collect()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Render the CREATE TABLE statement
    pub fn create_sql(&self) -> String {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let mut line = format!("    {} {}", c.name, c.sql_type.to_duckdb());
                if c.primary_key {
                    line.push_str(" PRIMARY KEY");
                } else if c.not_null {
                    line.push_str(" NOT NULL");
                }
                line
            })
            .collect();

        for (column, fk) in self.foreign_keys() {
            lines.push(format!(
                "    FOREIGN KEY ({}) REFERENCES {}({})",
                column, fk.to_table, fk.to_column
            ));
        }

        format!("CREATE TABLE {} (\n{}\n)", self.name, lines.join(",\n"))
    }

    /// Render a parameterized INSERT statement covering every column
    pub fn insert_sql(&self) -> String {
        let placeholders: Vec<String> = self
            .columns
            .iter()
            .map(|c| c.sql_type.placeholder())
            .collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.name,
            self.column_names().join(", "),
            placeholders.join(", ")
        )
    }

    /// Count rows whose foreign keys have no matching parent row.
    ///
    /// Returns `None` for tables without foreign keys.
    pub fn orphan_count_sql(&self) -> Option<String> {
        let fks = self.foreign_keys();
        if fks.is_empty() {
            return None;
        }

        let mut sql = format!("SELECT COUNT(*) FROM {} child", self.name);
        let mut conditions = Vec::with_capacity(fks.len());
        for (i, (column, fk)) in fks.iter().enumerate() {
            let alias = format!("p{}", i);
            sql.push_str(&format!(
                "\n  LEFT JOIN {} {} ON child.{} = {}.{}",
                fk.to_table, alias, column, alias, fk.to_column
            ));
            conditions.push(format!("{}.{} IS NULL", alias, fk.to_column));
        }
        sql.push_str("\n  WHERE ");
        sql.push_str(&conditions.join(" OR "));
        Some(sql)
    }
}

/// Complete schema definition
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub tables: Vec<Table>,
    table_index: HashMap<String, usize>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: Table) -> Self {
        let idx = self.tables.len();
        self.table_index.insert(table.name.clone(), idx);
        self.tables.push(table);
        self
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.table_index.get(name).map(|&idx| &self.tables[idx])
    }

    /// The five-table e-commerce schema
    pub fn ecommerce() -> Self {
        Schema::new()
            .table(
                Table::new(CUSTOMERS)
                    .column(Column::new("customer_id", SqlType::Integer).primary_key())
                    .column(Column::new("name", SqlType::Text).not_null())
                    .column(Column::new("email", SqlType::Text).not_null())
                    .column(Column::new("gender", SqlType::Text))
                    .column(Column::new("signup_date", SqlType::Date))
                    .column(Column::new("city", SqlType::Text))
                    .column(Column::new("country", SqlType::Text)),
            )
            .table(
                Table::new(PRODUCTS)
                    .column(Column::new("product_id", SqlType::Integer).primary_key())
                    .column(Column::new("name", SqlType::Text).not_null())
                    .column(Column::new("category", SqlType::Text))
                    .column(Column::new("price", SqlType::Decimal(10, 2)).not_null())
                    .column(Column::new("stock", SqlType::Integer).not_null()),
            )
            .table(
                Table::new(ORDERS)
                    .column(Column::new("order_id", SqlType::Integer).primary_key())
                    .column(
                        Column::new("customer_id", SqlType::Integer)
                            .not_null()
                            .references(CUSTOMERS, "customer_id"),
                    )
                    .column(Column::new("order_date", SqlType::Timestamp).not_null())
                    .column(Column::new("status", SqlType::Text)),
            )
            .table(
                Table::new(ORDER_ITEMS)
                    .column(Column::new("order_item_id", SqlType::Integer).primary_key())
                    .column(
                        Column::new("order_id", SqlType::Integer)
                            .not_null()
                            .references(ORDERS, "order_id"),
                    )
                    .column(
                        Column::new("product_id", SqlType::Integer)
                            .not_null()
                            .references(PRODUCTS, "product_id"),
                    )
                    .column(Column::new("quantity", SqlType::Integer).not_null())
                    .column(Column::new("subtotal", SqlType::Decimal(10, 2)).not_null()),
            )
            .table(
                Table::new(PAYMENTS)
                    .column(Column::new("payment_id", SqlType::Integer).primary_key())
                    .column(
                        Column::new("order_id", SqlType::Integer)
                            .not_null()
                            .references(ORDERS, "order_id"),
                    )
                    .column(Column::new("amount", SqlType::Decimal(10, 2)).not_null())
                    .column(Column::new("payment_method", SqlType::Text))
                    .column(Column::new("payment_status", SqlType::Text)),
            )
    }

    /// Get tables in topological order (dependencies first)
    pub fn tables_in_order(&self) -> Vec<&Table> {
        let mut visited = vec![false; self.tables.len()];
        let mut result = Vec::with_capacity(self.tables.len());

        fn visit<'a>(
            idx: usize,
            tables: &'a [Table],
            table_index: &HashMap<String, usize>,
            visited: &mut [bool],
            result: &mut Vec<&'a Table>,
        ) {
            if visited[idx] {
                return;
            }
            visited[idx] = true;

            for (_, fk) in tables[idx].foreign_keys() {
                if let Some(&dep_idx) = table_index.get(&fk.to_table) {
                    visit(dep_idx, tables, table_index, visited, result);
                }
            }

            result.push(&tables[idx]);
        }

        for idx in 0..self.tables.len() {
            visit(
                idx,
                &self.tables,
                &self.table_index,
                &mut visited,
                &mut result,
            );
        }

        result
    }

    /// Tables in the order they must be dropped (dependents first)
    pub fn drop_order(&self) -> Vec<&Table> {
        let mut tables = self.tables_in_order();
        tables.reverse();
        tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Customer, Order, OrderItem, Payment, Product, Record};

    #[test]
    fn test_column_builder() {
        let col = Column::new("id", SqlType::Integer).primary_key();

        assert_eq!(col.name, "id");
        assert!(col.primary_key);
        assert!(col.not_null);
    }

    #[test]
    fn test_columns_match_records() {
        let schema = Schema::ecommerce();
        let expected: [(&str, &[&str]); 5] = [
            (Customer::TABLE, Customer::COLUMNS),
            (Product::TABLE, Product::COLUMNS),
            (Order::TABLE, Order::COLUMNS),
            (OrderItem::TABLE, OrderItem::COLUMNS),
            (Payment::TABLE, Payment::COLUMNS),
        ];
        for (table, columns) in expected {
            let def = schema.get_table(table).unwrap();
            assert_eq!(def.column_names(), columns.to_vec(), "table {}", table);
            assert_eq!(def.primary_key_column(), Some(columns[0]));
        }
    }

    #[test]
    fn test_topological_and_drop_order() {
        let schema = Schema::ecommerce();
        let names: Vec<&str> = schema
            .tables_in_order()
            .iter()
            .map(|t| t.name.as_str())
            .collect();

        let pos = |name: &str| names.iter().position(|&n| n == name).unwrap();
        assert!(pos("customers") < pos("orders"));
        assert!(pos("orders") < pos("order_items"));
        assert!(pos("products") < pos("order_items"));
        assert!(pos("orders") < pos("payments"));

        let dropped: Vec<&str> = schema
            .drop_order()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(dropped.first(), names.last());
    }

    #[test]
    fn test_create_sql_declares_keys() {
        let schema = Schema::ecommerce();
        let sql = schema.get_table("order_items").unwrap().create_sql();
        assert!(sql.starts_with("CREATE TABLE order_items ("));
        assert!(sql.contains("order_item_id INTEGER PRIMARY KEY"));
        assert!(sql.contains("subtotal DECIMAL(10,2) NOT NULL"));
        assert!(sql.contains("FOREIGN KEY (order_id) REFERENCES orders(order_id)"));
        assert!(sql.contains("FOREIGN KEY (product_id) REFERENCES products(product_id)"));
    }

    #[test]
    fn test_insert_sql_casts_non_integer_types() {
        let schema = Schema::ecommerce();
        let sql = schema.get_table("orders").unwrap().insert_sql();
        assert_eq!(
            sql,
            "INSERT INTO orders (order_id, customer_id, order_date, status) \
             VALUES (?, ?, CAST(? AS TIMESTAMP), ?)"
        );
    }

    #[test]
    fn test_orphan_sql() {
        let schema = Schema::ecommerce();
        assert!(schema.get_table("customers").unwrap().orphan_count_sql().is_none());

        let sql = schema
            .get_table("order_items")
            .unwrap()
            .orphan_count_sql()
            .unwrap();
        assert!(sql.contains("LEFT JOIN orders p0 ON child.order_id = p0.order_id"));
        assert!(sql.contains("LEFT JOIN products p1 ON child.product_id = p1.product_id"));
        assert!(sql.ends_with("p0.order_id IS NULL OR p1.product_id IS NULL"));
    }
}
