//! Common test utilities for sqlsentinel tests

#![allow(dead_code)]

use std::io::Write;

use sqlsentinel::schema::{Column, Schema, Table};
use tempfile::NamedTempFile;

/// Storefront schema: customers, orders, products and order items,
/// with foreign keys from orders to customers and from order items to
/// orders and products
pub fn storefront_schema() -> Schema {
    Schema::new(vec![
        Table::new(
            "customers",
            vec![
                Column::new("id", "INTEGER"),
                Column::new("name", "TEXT"),
                Column::new("email", "TEXT"),
            ],
        ),
        Table::new(
            "orders",
            vec![
                Column::new("id", "INTEGER"),
                Column::new("customer_id", "INTEGER").references("customers.id"),
                Column::new("total", "NUMERIC"),
                Column::new("created_at", "TIMESTAMP"),
            ],
        ),
        Table::new(
            "products",
            vec![
                Column::new("id", "INTEGER"),
                Column::new("title", "TEXT"),
                Column::new("price", "NUMERIC"),
            ],
        ),
        Table::new(
            "order_items",
            vec![
                Column::new("id", "INTEGER"),
                Column::new("order_id", "INTEGER").references("orders.id"),
                Column::new("product_id", "INTEGER").references("products.id"),
                Column::new("quantity", "INTEGER"),
            ],
        ),
    ])
    .expect("storefront schema is valid")
}

/// The storefront schema as a JSON schema document
pub const STOREFRONT_JSON: &str = r#"{
  "tables": [
    {"name": "customers", "columns": [
      {"name": "id", "type": "INTEGER"},
      {"name": "name", "type": "TEXT"},
      {"name": "email", "type": "TEXT"}
    ]},
    {"name": "orders", "columns": [
      {"name": "id", "type": "INTEGER"},
      {"name": "customer_id", "type": "INTEGER", "foreign_key": "customers.id"},
      {"name": "total", "type": "NUMERIC"},
      {"name": "created_at", "type": "TIMESTAMP"}
    ]}
  ],
  "functions": ["loyalty_tier"]
}"#;

/// The storefront schema as CREATE TABLE statements
pub const STOREFRONT_DDL: &str = r#"
CREATE TABLE customers (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT
);

CREATE TABLE orders (
    id INTEGER PRIMARY KEY,
    customer_id INTEGER REFERENCES customers(id),
    total NUMERIC,
    created_at TIMESTAMP
);

CREATE TABLE products (
    id INTEGER PRIMARY KEY,
    title TEXT,
    price NUMERIC
);

CREATE TABLE order_items (
    id INTEGER PRIMARY KEY,
    order_id INTEGER,
    product_id INTEGER REFERENCES products,
    quantity INTEGER,
    FOREIGN KEY (order_id) REFERENCES orders(id)
);

CREATE INDEX idx_orders_customer ON orders(customer_id);
"#;

/// Write `content` to a temp file with the given suffix
pub fn temp_file(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(suffix).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
