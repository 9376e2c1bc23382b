use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw row of `orders_dataset.csv`
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRow {
    pub order_id: String,
    pub customer_id: String,
    pub order_status: String,
    pub order_purchase_timestamp: Option<String>,
    pub order_delivered_customer_date: Option<String>,
}

/// Raw row of `order_items_dataset.csv`
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemRow {
    pub order_id: String,
    pub order_item_id: u32,
    pub product_id: String,
    pub price: f64,
    pub freight_value: f64,
}

/// Raw row of `products_dataset.csv`
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRow {
    pub product_id: String,
    pub product_category_name: Option<String>,
}

/// Raw row of `customers_dataset.csv`
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerRow {
    pub customer_id: String,
    pub customer_state: String,
}

/// Raw row of `order_reviews_dataset.csv`
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRow {
    pub order_id: String,
    pub review_score: u8,
}

/// Raw row of `order_payments_dataset.csv`
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRow {
    pub order_id: String,
    pub payment_sequential: u32,
    pub payment_type: String,
    pub payment_installments: u32,
    pub payment_value: f64,
}

/// Order lifecycle status
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Created,
    Approved,
    Invoiced,
    Processing,
    Shipped,
    Delivered,
    Canceled,
    Unavailable,
    Other(String),
}

impl From<&str> for OrderStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "created" => OrderStatus::Created,
            "approved" => OrderStatus::Approved,
            "invoiced" => OrderStatus::Invoiced,
            "processing" => OrderStatus::Processing,
            "shipped" => OrderStatus::Shipped,
            "delivered" => OrderStatus::Delivered,
            "canceled" | "cancelled" => OrderStatus::Canceled,
            "unavailable" => OrderStatus::Unavailable,
            other => OrderStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Created => "created",
            OrderStatus::Approved => "approved",
            OrderStatus::Invoiced => "invoiced",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Unavailable => "unavailable",
            OrderStatus::Other(s) => s.as_str(),
        };
        f.write_str(s)
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Sortable (year, month) period key
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Integer key, e.g. 202301
    pub fn key(&self) -> i64 {
        self.year as i64 * 100 + self.month as i64
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Delivery speed bucket
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SpeedBucket {
    Fast,
    Standard,
    Slow,
}

impl SpeedBucket {
    pub const ALL: [SpeedBucket; 3] = [SpeedBucket::Fast, SpeedBucket::Standard, SpeedBucket::Slow];

    /// fast <= 3 days, standard 4-7 days, slow > 7 days
    pub fn from_days(days: i64) -> Self {
        if days <= 3 {
            SpeedBucket::Fast
        } else if days <= 7 {
            SpeedBucket::Standard
        } else {
            SpeedBucket::Slow
        }
    }

    /// Display label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            SpeedBucket::Fast => "1-3 days",
            SpeedBucket::Standard => "4-7 days",
            SpeedBucket::Slow => "8+ days",
        }
    }
}

/// Outcome of the delivery-duration step for one record
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliverySpeed {
    Measured { days: i64, bucket: SpeedBucket },
    /// No delivered timestamp
    Undelivered,
    /// Delivered timestamp present but purchase timestamp missing
    MissingPurchase,
    /// Delivered before purchased: data error
    NegativeDuration { days: i64 },
}

impl DeliverySpeed {
    pub fn bucket(&self) -> Option<SpeedBucket> {
        match self {
            DeliverySpeed::Measured { bucket, .. } => Some(*bucket),
            _ => None,
        }
    }

    pub fn days(&self) -> Option<i64> {
        match self {
            DeliverySpeed::Measured { days, .. } => Some(*days),
            _ => None,
        }
    }
}

/// One order item joined with its order, before timestamps are parsed
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub order_id: String,
    pub order_item_id: u32,
    pub product_id: String,
    pub price: f64,
    pub freight_value: f64,
    pub customer_id: String,
    pub status: OrderStatus,
    pub purchase_timestamp: Option<String>,
    pub delivered_timestamp: Option<String>,
}

/// One order item enriched with order fields and derived period
#[derive(Debug, Clone, Serialize)]
pub struct SalesRecord {
    pub order_id: String,
    pub order_item_id: u32,
    pub product_id: String,
    pub price: f64,
    pub freight_value: f64,
    pub customer_id: String,
    pub status: OrderStatus,
    pub purchased_at: Option<NaiveDateTime>,
    pub delivered_at: Option<NaiveDateTime>,
    pub year: i32,
    pub month: u32,
    pub year_month: YearMonth,
    /// `None` until `calculate_delivery_speed` has run
    pub delivery: Option<DeliverySpeed>,
}
