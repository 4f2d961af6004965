//! Record types for the five e-commerce tables.
//!
//! Field order of every record is the column order of its CSV file and of its
//! database table. Money values are rounded to cents when they are created and
//! always serialized with two decimals.

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CUSTOMERS: &str = "customers";
pub const PRODUCTS: &str = "products";
pub const ORDERS: &str = "orders";
pub const ORDER_ITEMS: &str = "order_items";
pub const PAYMENTS: &str = "payments";

/// All table names in dependency order (parents first)
pub const TABLE_NAMES: [&str; 5] = [CUSTOMERS, PRODUCTS, ORDERS, ORDER_ITEMS, PAYMENTS];

/// Round a money value to two decimal places
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Text form of order timestamps in CSV files
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A row type that maps onto one table
pub trait Record: Serialize + DeserializeOwned {
    /// Table (and CSV file stem) this record belongs to
    const TABLE: &'static str;
    /// Column names in field order
    const COLUMNS: &'static [&'static str];

    /// Primary key value
    fn id(&self) -> i64;
}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:tt),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!("Unknown {}: {}", stringify!($name), s)),
                }
            }
        }
    };
}

string_enum!(Gender {
    Male => "Male",
    Female => "Female",
    Other => "Other",
});

string_enum!(
    /// Fulfilment state of an order
    OrderStatus {
        Pending => "Pending",
        Processing => "Processing",
        Shipped => "Shipped",
        Delivered => "Delivered",
        Cancelled => "Cancelled",
    }
);

string_enum!(PaymentMethod {
    CreditCard => "Credit Card",
    DebitCard => "Debit Card",
    PayPal => "PayPal",
    BankTransfer => "Bank Transfer",
    CashOnDelivery => "Cash on Delivery",
});

string_enum!(
    /// Outcome of a single payment attempt
    PaymentStatus {
        Pending => "Pending",
        Completed => "Completed",
        Failed => "Failed",
        Refunded => "Refunded",
    }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: i64,
    pub name: String,
    pub email: String,
    pub gender: Gender,
    pub signup_date: NaiveDate,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: i64,
    pub name: String,
    pub category: String,
    #[serde(serialize_with = "money::serialize")]
    pub price: f64,
    pub stock: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: i64,
    pub customer_id: i64,
    #[serde(with = "timestamp")]
    pub order_date: NaiveDateTime,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_item_id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    #[serde(serialize_with = "money::serialize")]
    pub subtotal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: i64,
    pub order_id: i64,
    #[serde(serialize_with = "money::serialize")]
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
}

impl Record for Customer {
    const TABLE: &'static str = CUSTOMERS;
    const COLUMNS: &'static [&'static str] = &[
        "customer_id",
        "name",
        "email",
        "gender",
        "signup_date",
        "city",
        "country",
    ];

    fn id(&self) -> i64 {
        self.customer_id
    }
}

impl Record for Product {
    const TABLE: &'static str = PRODUCTS;
    const COLUMNS: &'static [&'static str] = &["product_id", "name", "category", "price", "stock"];

    fn id(&self) -> i64 {
        self.product_id
    }
}

impl Record for Order {
    const TABLE: &'static str = ORDERS;
    const COLUMNS: &'static [&'static str] = &["order_id", "customer_id", "order_date", "status"];

    fn id(&self) -> i64 {
        self.order_id
    }
}

impl Record for OrderItem {
    const TABLE: &'static str = ORDER_ITEMS;
    const COLUMNS: &'static [&'static str] = &[
        "order_item_id",
        "order_id",
        "product_id",
        "quantity",
        "subtotal",
    ];

    fn id(&self) -> i64 {
        self.order_item_id
    }
}

impl Record for Payment {
    const TABLE: &'static str = PAYMENTS;
    const COLUMNS: &'static [&'static str] = &[
        "payment_id",
        "order_id",
        "amount",
        "payment_method",
        "payment_status",
    ];

    fn id(&self) -> i64 {
        self.payment_id
    }
}

/// Two-decimal money serialization
mod money {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("{:.2}", value))
    }
}

/// `YYYY-MM-DD HH:MM:SS` timestamps
mod timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
