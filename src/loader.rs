//! CSV dataset loader
//!
//! Reads the six raw tables from a data directory. A missing file or a missing
//! required column is fatal; rows that fail to deserialize are skipped and
//! counted in the [`LoadReport`].

use crate::error::{MetricsError, Result};
use crate::models::{CustomerRow, OrderItemRow, OrderRow, PaymentRow, ProductRow, ReviewRow};
use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// A raw table with a fixed file name and required header columns
pub trait Table: DeserializeOwned {
    const NAME: &'static str;
    const FILE: &'static str;
    const REQUIRED_COLUMNS: &'static [&'static str];

    /// Value-level check on a row that deserialized fine; `Some(reason)`
    /// marks it malformed
    fn problem(&self) -> Option<String> {
        None
    }
}

fn non_finite(fields: &[(&str, f64)]) -> Option<String> {
    fields
        .iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(name, v)| format!("non-finite {}: {}", name, v))
}

impl Table for OrderRow {
    const NAME: &'static str = "orders";
    const FILE: &'static str = "orders_dataset.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "order_id",
        "customer_id",
        "order_status",
        "order_purchase_timestamp",
        "order_delivered_customer_date",
    ];
}

impl Table for OrderItemRow {
    const NAME: &'static str = "order_items";
    const FILE: &'static str = "order_items_dataset.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] =
        &["order_id", "order_item_id", "product_id", "price", "freight_value"];

    fn problem(&self) -> Option<String> {
        non_finite(&[("price", self.price), ("freight_value", self.freight_value)])
    }
}

impl Table for ProductRow {
    const NAME: &'static str = "products";
    const FILE: &'static str = "products_dataset.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] = &["product_id", "product_category_name"];
}

impl Table for CustomerRow {
    const NAME: &'static str = "customers";
    const FILE: &'static str = "customers_dataset.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] = &["customer_id", "customer_state"];
}

impl Table for ReviewRow {
    const NAME: &'static str = "reviews";
    const FILE: &'static str = "order_reviews_dataset.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] = &["order_id", "review_score"];

    fn problem(&self) -> Option<String> {
        (!(1..=5).contains(&self.review_score))
            .then(|| format!("review_score {} outside 1-5", self.review_score))
    }
}

impl Table for PaymentRow {
    const NAME: &'static str = "payments";
    const FILE: &'static str = "order_payments_dataset.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "order_id",
        "payment_sequential",
        "payment_type",
        "payment_installments",
        "payment_value",
    ];

    fn problem(&self) -> Option<String> {
        non_finite(&[("payment_value", self.payment_value)])
    }
}

/// All six raw tables, read-only after loading
#[derive(Debug, Clone, Default)]
pub struct Datasets {
    pub orders: Vec<OrderRow>,
    pub order_items: Vec<OrderItemRow>,
    pub products: Vec<ProductRow>,
    pub customers: Vec<CustomerRow>,
    pub reviews: Vec<ReviewRow>,
    pub payments: Vec<PaymentRow>,
}

/// Row counts for one loaded table
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TableLoad {
    pub table: &'static str,
    pub rows: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub tables: Vec<TableLoad>,
}

impl LoadReport {
    pub fn total_skipped(&self) -> usize {
        self.tables.iter().map(|t| t.skipped).sum()
    }
}

/// Load all six tables from `dir`
pub fn load_datasets(dir: impl AsRef<Path>) -> Result<(Datasets, LoadReport)> {
    let dir = dir.as_ref();
    info!("Loading datasets from {:?}", dir);

    let mut report = LoadReport::default();
    let datasets = Datasets {
        orders: load_table(dir, &mut report)?,
        order_items: load_table(dir, &mut report)?,
        products: load_table(dir, &mut report)?,
        customers: load_table(dir, &mut report)?,
        reviews: load_table(dir, &mut report)?,
        payments: load_table(dir, &mut report)?,
    };

    info!(
        "Loaded {} orders, {} order items, {} products, {} customers, {} reviews, {} payments",
        datasets.orders.len(),
        datasets.order_items.len(),
        datasets.products.len(),
        datasets.customers.len(),
        datasets.reviews.len(),
        datasets.payments.len()
    );

    Ok((datasets, report))
}

fn load_table<T: Table>(dir: &Path, report: &mut LoadReport) -> Result<Vec<T>> {
    let path = dir.join(T::FILE);
    if !path.is_file() {
        return Err(MetricsError::MissingFile { table: T::NAME, path });
    }
    let file = std::fs::File::open(&path)?;
    let (rows, load) = read_table::<T, _>(file)?;
    report.tables.push(load);
    Ok(rows)
}

/// Read one table from any reader, validating its header first
pub fn read_table<T: Table, R: Read>(reader: R) -> Result<(Vec<T>, TableLoad)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|source| MetricsError::Csv { table: T::NAME, source })?
        .clone();
    for &column in T::REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(MetricsError::Schema { table: T::NAME, column });
        }
    }

    let mut rows = Vec::new();
    let mut skipped = 0;
    for (i, result) in reader.deserialize::<T>().enumerate() {
        let problem = match result {
            Ok(row) => match row.problem() {
                None => {
                    rows.push(row);
                    continue;
                }
                Some(reason) => reason,
            },
            Err(e) => e.to_string(),
        };
        if skipped < 5 {
            // +2: header line and 1-based numbering
            warn!("Skipping {} row at line {}: {}", T::NAME, i + 2, problem);
        }
        skipped += 1;
    }

    if skipped > 0 {
        warn!("Skipped {} malformed rows in {}", skipped, T::NAME);
    }

    let load = TableLoad {
        table: T::NAME,
        rows: rows.len(),
        skipped,
    };
    Ok((rows, load))
}
