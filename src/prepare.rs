//! Sales record preparation
//!
//! raw tables -> [`build_sales_records`] -> [`add_temporal_features`] ->
//! [`filter_by_status`] / [`filter_by_period`] -> [`calculate_delivery_speed`]
//!
//! Every step borrows its input and returns a new record set, with a small
//! report counting what it dropped or flagged.

use crate::config::StatusFilter;
use crate::models::{
    DeliverySpeed, OrderItemRow, OrderLine, OrderRow, OrderStatus, SalesRecord, SpeedBucket,
    YearMonth,
};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Max offending keys logged per step before going quiet
const MAX_LOGGED: usize = 5;

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct JoinReport {
    pub matched: usize,
    /// Order items whose order id has no order row
    pub unmatched_items: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct TemporalReport {
    pub kept: usize,
    /// Missing or unparseable timestamp in the chosen column
    pub dropped: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct DeliveryReport {
    pub measured: usize,
    pub undelivered: usize,
    pub missing_purchase: usize,
    pub negative_duration: usize,
}

/// Which order timestamp drives year/month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampColumn {
    #[default]
    Purchase,
    Delivered,
}

impl TimestampColumn {
    pub fn name(&self) -> &'static str {
        match self {
            TimestampColumn::Purchase => "order_purchase_timestamp",
            TimestampColumn::Delivered => "order_delivered_customer_date",
        }
    }
}

/// Inner join of order items to orders on `order_id`.
///
/// Output follows the order-item input order.
pub fn build_sales_records(
    order_items: &[OrderItemRow],
    orders: &[OrderRow],
) -> (Vec<OrderLine>, JoinReport) {
    let by_id: HashMap<&str, &OrderRow> = orders.iter().map(|o| (o.order_id.as_str(), o)).collect();

    let mut lines = Vec::with_capacity(order_items.len());
    let mut report = JoinReport::default();

    for item in order_items {
        match by_id.get(item.order_id.as_str()) {
            Some(order) => {
                lines.push(OrderLine {
                    order_id: item.order_id.clone(),
                    order_item_id: item.order_item_id,
                    product_id: item.product_id.clone(),
                    price: item.price,
                    freight_value: item.freight_value,
                    customer_id: order.customer_id.clone(),
                    status: OrderStatus::from(order.order_status.as_str()),
                    purchase_timestamp: order.order_purchase_timestamp.clone(),
                    delivered_timestamp: order.order_delivered_customer_date.clone(),
                });
                report.matched += 1;
            }
            None => {
                if report.unmatched_items < MAX_LOGGED {
                    debug!("Order item {} has no matching order", item.order_id);
                }
                report.unmatched_items += 1;
            }
        }
    }

    if report.unmatched_items > 0 {
        warn!(
            "Dropped {} order items with no matching order ({} matched)",
            report.unmatched_items, report.matched
        );
    }

    (lines, report)
}

/// Parse an order timestamp; accepts full datetimes and bare dates
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_opt(s: Option<&str>) -> Option<NaiveDateTime> {
    s.and_then(parse_timestamp)
}

/// Derive year, month and period key from `column`.
///
/// Lines whose chosen timestamp is missing or unparseable are dropped and
/// counted; the other timestamp is parsed leniently.
pub fn add_temporal_features(
    lines: &[OrderLine],
    column: TimestampColumn,
) -> (Vec<SalesRecord>, TemporalReport) {
    let mut records = Vec::with_capacity(lines.len());
    let mut report = TemporalReport::default();

    for line in lines {
        let purchased_at = parse_opt(line.purchase_timestamp.as_deref());
        let delivered_at = parse_opt(line.delivered_timestamp.as_deref());
        let period_at = match column {
            TimestampColumn::Purchase => purchased_at,
            TimestampColumn::Delivered => delivered_at,
        };

        let Some(at) = period_at else {
            if report.dropped < MAX_LOGGED {
                warn!(
                    "Dropping item {}/{}: unusable {}",
                    line.order_id,
                    line.order_item_id,
                    column.name()
                );
            }
            report.dropped += 1;
            continue;
        };

        let (year, month) = (at.year(), at.month());
        records.push(SalesRecord {
            order_id: line.order_id.clone(),
            order_item_id: line.order_item_id,
            product_id: line.product_id.clone(),
            price: line.price,
            freight_value: line.freight_value,
            customer_id: line.customer_id.clone(),
            status: line.status.clone(),
            purchased_at,
            delivered_at,
            year,
            month,
            year_month: YearMonth::new(year, month),
            delivery: None,
        });
        report.kept += 1;
    }

    if report.dropped > 0 {
        warn!(
            "Dropped {} records with missing or unparseable {}",
            report.dropped,
            column.name()
        );
    }

    (records, report)
}

/// Records in `year`, and in `month` when given. Empty output is valid.
pub fn filter_by_period(
    records: &[SalesRecord],
    year: i32,
    month: Option<u32>,
) -> Vec<SalesRecord> {
    records
        .iter()
        .filter(|r| r.year == year && month.map_or(true, |m| r.month == m))
        .cloned()
        .collect()
}

/// Records whose order status passes `filter`
pub fn filter_by_status(records: &[SalesRecord], filter: &StatusFilter) -> Vec<SalesRecord> {
    records
        .iter()
        .filter(|r| filter.matches(&r.status))
        .cloned()
        .collect()
}

/// Classify one purchase/delivery pair
pub fn delivery_speed(
    purchased_at: Option<NaiveDateTime>,
    delivered_at: Option<NaiveDateTime>,
) -> DeliverySpeed {
    match (purchased_at, delivered_at) {
        (_, None) => DeliverySpeed::Undelivered,
        (None, Some(_)) => DeliverySpeed::MissingPurchase,
        (Some(p), Some(d)) => {
            let days = (d - p).num_days();
            if d < p {
                // a same-day inversion truncates to 0 days but is still bad data
                DeliverySpeed::NegativeDuration { days: days.min(-1) }
            } else {
                DeliverySpeed::Measured {
                    days,
                    bucket: SpeedBucket::from_days(days),
                }
            }
        }
    }
}

/// Attach delivery duration (whole days) and speed bucket to every record
pub fn calculate_delivery_speed(records: &[SalesRecord]) -> (Vec<SalesRecord>, DeliveryReport) {
    let mut report = DeliveryReport::default();

    let out: Vec<SalesRecord> = records
        .iter()
        .map(|r| {
            let speed = delivery_speed(r.purchased_at, r.delivered_at);
            match speed {
                DeliverySpeed::Measured { .. } => report.measured += 1,
                DeliverySpeed::Undelivered => report.undelivered += 1,
                DeliverySpeed::MissingPurchase => report.missing_purchase += 1,
                DeliverySpeed::NegativeDuration { days } => {
                    if report.negative_duration < MAX_LOGGED {
                        warn!(
                            "Order {} delivered {} days before purchase",
                            r.order_id, -days
                        );
                    }
                    report.negative_duration += 1;
                }
            }
            SalesRecord {
                delivery: Some(speed),
                ..r.clone()
            }
        })
        .collect();

    if report.negative_duration > 0 {
        warn!(
            "{} records have delivery before purchase; excluded from delivery metrics",
            report.negative_duration
        );
    }

    (out, report)
}


#[cfg(test)]
mod tests {
    use super::fixtures::{item, order};
    use super::*;

    fn sample_lines() -> Vec<OrderLine> {
        let orders = vec![
            order("o1", "delivered", "2023-01-05 10:00:00", Some("2023-01-08 09:00:00"), "c1"),
            order("o2", "shipped", "2023-02-10 08:00:00", None, "c2"),
            order("o3", "delivered", "2022-12-31 23:00:00", Some("2023-01-10 12:00:00"), "c1"),
        ];
        let items = vec![
            item("o1", 1, "p1", 100.0),
            item("o1", 2, "p2", 50.0),
            item("o2", 1, "p1", 30.0),
            item("missing", 1, "p3", 999.0),
            item("o3", 1, "p2", 20.0),
        ];
        build_sales_records(&items, &orders).0
    }

    #[test]
    fn test_inner_join_drops_unmatched() {
        let orders = vec![order("o1", "delivered", "2023-01-05", None, "c1")];
        let items = vec![item("o1", 1, "p1", 10.0), item("ghost", 1, "p1", 10.0)];

        let (lines, report) = build_sales_records(&items, &orders);
        assert_eq!(lines.len(), 1);
        assert_eq!(report, JoinReport { matched: 1, unmatched_items: 1 });
        assert_eq!(lines[0].customer_id, "c1");
        assert_eq!(lines[0].status, OrderStatus::Delivered);
    }

    #[test]
    fn test_join_preserves_item_order() {
        let lines = sample_lines();
        let keys: Vec<_> = lines.iter().map(|l| (l.order_id.as_str(), l.order_item_id)).collect();
        assert_eq!(keys, vec![("o1", 1), ("o1", 2), ("o2", 1), ("o3", 1)]);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2023-01-05 10:00:00").is_some());
        assert!(parse_timestamp("2023-01-05T10:00:00").is_some());
        assert_eq!(
            parse_timestamp("2023-01-05"),
            NaiveDate::from_ymd_opt(2023, 1, 5).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
        assert!(parse_timestamp("05/01/2023").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_temporal_features() {
        let (records, report) = add_temporal_features(&sample_lines(), TimestampColumn::Purchase);
        assert_eq!(report, TemporalReport { kept: 4, dropped: 0 });
        assert_eq!(records[0].year, 2023);
        assert_eq!(records[0].month, 1);
        assert_eq!(records[0].year_month.key(), 202301);
        assert_eq!(records[3].year_month, YearMonth::new(2022, 12));
        assert!(records.iter().all(|r| r.delivery.is_none()));
    }

    #[test]
    fn test_temporal_drops_unparseable() {
        let mut lines = sample_lines();
        lines[2].purchase_timestamp = Some("not a date".to_string());
        lines[3].purchase_timestamp = None;

        let (records, report) = add_temporal_features(&lines, TimestampColumn::Purchase);
        assert_eq!(records.len(), 2);
        assert_eq!(report.dropped, 2);
    }

    #[test]
    fn test_temporal_by_delivered_column() {
        let (records, report) = add_temporal_features(&sample_lines(), TimestampColumn::Delivered);
        // o2 has no delivered timestamp
        assert_eq!(report.dropped, 1);
        assert_eq!(records.last().map(|r| r.year_month), Some(YearMonth::new(2023, 1)));
    }

    #[test]
    fn test_filter_by_period() {
        let (records, _) = add_temporal_features(&sample_lines(), TimestampColumn::Purchase);
        assert_eq!(filter_by_period(&records, 2023, None).len(), 3);
        assert_eq!(filter_by_period(&records, 2023, Some(1)).len(), 2);
        assert_eq!(filter_by_period(&records, 2022, Some(12)).len(), 1);
        assert!(filter_by_period(&records, 2019, None).is_empty());
        assert!(filter_by_period(&records, 2023, Some(7)).is_empty());
    }

    #[test]
    fn test_status_and_period_filters_commute() {
        let (records, _) = add_temporal_features(&sample_lines(), TimestampColumn::Purchase);
        let filters = [
            StatusFilter::default(),
            StatusFilter::Only(OrderStatus::Shipped),
            StatusFilter::Only(OrderStatus::Canceled),
            StatusFilter::Any,
        ];

        for filter in &filters {
            for year in [2022, 2023, 2024] {
                for month in [None, Some(1), Some(2), Some(12)] {
                    let a = filter_by_status(&filter_by_period(&records, year, month), filter);
                    let b = filter_by_period(&filter_by_status(&records, filter), year, month);
                    let keys = |rs: &[SalesRecord]| {
                        rs.iter()
                            .map(|r| (r.order_id.clone(), r.order_item_id))
                            .collect::<Vec<_>>()
                    };
                    assert_eq!(keys(&a), keys(&b), "{:?} {} {:?}", filter, year, month);
                }
            }
        }
    }

    #[test]
    fn test_delivery_buckets() {
        let at = |s: &str| parse_timestamp(s);
        let start = at("2023-01-01 12:00:00");

        let speed = delivery_speed(start, at("2023-01-04 12:00:00"));
        assert_eq!(speed, DeliverySpeed::Measured { days: 3, bucket: SpeedBucket::Fast });

        let speed = delivery_speed(start, at("2023-01-08 12:00:00"));
        assert_eq!(speed.bucket(), Some(SpeedBucket::Standard));

        let speed = delivery_speed(start, at("2023-01-09 12:00:00"));
        assert_eq!(speed, DeliverySpeed::Measured { days: 8, bucket: SpeedBucket::Slow });

        // partial days truncate
        let speed = delivery_speed(start, at("2023-01-04 23:59:00"));
        assert_eq!(speed.days(), Some(3));

        assert_eq!(delivery_speed(start, None), DeliverySpeed::Undelivered);
        assert_eq!(delivery_speed(None, start), DeliverySpeed::MissingPurchase);
    }

    #[test]
    fn test_negative_duration_is_flagged() {
        let at = |s: &str| parse_timestamp(s);
        assert_eq!(
            delivery_speed(at("2023-01-10"), at("2023-01-07")),
            DeliverySpeed::NegativeDuration { days: -3 }
        );
        assert_eq!(
            delivery_speed(at("2023-01-10 12:00:00"), at("2023-01-10 08:00:00")),
            DeliverySpeed::NegativeDuration { days: -1 }
        );
    }

    #[test]
    fn test_calculate_delivery_speed() {
        let mut lines = sample_lines();
        lines[3].delivered_timestamp = Some("2022-12-01 00:00:00".to_string());
        let (records, _) = add_temporal_features(&lines, TimestampColumn::Purchase);

        let (records, report) = calculate_delivery_speed(&records);
        assert_eq!(
            report,
            DeliveryReport {
                measured: 2,
                undelivered: 1,
                missing_purchase: 0,
                negative_duration: 1,
            }
        );
        assert_eq!(records[0].delivery.and_then(|d| d.days()), Some(2));
        assert_eq!(records[2].delivery, Some(DeliverySpeed::Undelivered));
        assert!(matches!(records[3].delivery, Some(DeliverySpeed::NegativeDuration { .. })));
    }
}
