//! Business metrics over a prepared sales record set
//!
//! Every function here is pure: inputs are borrowed, nothing is cached, and
//! undefined results (no orders, zero prior revenue) come back as `None`
//! rather than 0.

use crate::models::{
    CustomerRow, OrderRow, PaymentRow, ProductRow, ReviewRow, SalesRecord, SpeedBucket, YearMonth,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Group label for unmatched dimension lookups
pub const UNKNOWN: &str = "unknown";

// ============================================================================
// Result Types
// ============================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PeriodGrowth {
    pub period: YearMonth,
    pub revenue: f64,
    /// `None` for the first period and after a zero-revenue period
    pub growth_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthRevenue {
    pub month: u32,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryRevenue {
    pub category: String,
    pub revenue: f64,
    /// `None` when total revenue is 0
    pub share_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StateRevenue {
    pub state: String,
    pub revenue: f64,
    pub order_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentShare {
    pub payment_type: String,
    pub value: f64,
    pub orders: usize,
    pub share_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SatisfactionCell {
    pub bucket: SpeedBucket,
    pub score: u8,
    pub orders: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BucketSatisfaction {
    pub bucket: SpeedBucket,
    pub label: &'static str,
    pub reviewed_orders: usize,
    pub avg_score: Option<f64>,
}

/// Review score x delivery bucket, counted per order
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct SatisfactionTable {
    /// Non-empty cells only, ordered by bucket then score
    pub cells: Vec<SatisfactionCell>,
    /// One entry per bucket, fast to slow
    pub buckets: Vec<BucketSatisfaction>,
    pub unreviewed_orders: usize,
    /// Orders without a measured delivery (undelivered or bad timestamps)
    pub unmeasured_orders: usize,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

/// Change of a KPI against its comparison value
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Trend {
    pub pct: f64,
    pub direction: Direction,
    pub favourable: bool,
}

// ============================================================================
// Scalar Metrics
// ============================================================================

/// Sum of item price; 0 for no records
pub fn revenue(records: &[SalesRecord]) -> f64 {
    records.iter().map(|r| r.price).sum()
}

/// Distinct orders, not line items
pub fn order_count(records: &[SalesRecord]) -> usize {
    records
        .iter()
        .map(|r| r.order_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

fn order_totals(records: &[SalesRecord]) -> HashMap<&str, f64> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for r in records {
        *totals.entry(r.order_id.as_str()).or_insert(0.0) += r.price;
    }
    totals
}

/// Mean of per-order totals; `None` without orders
pub fn avg_order_value(records: &[SalesRecord]) -> Option<f64> {
    let totals = order_totals(records);
    if totals.is_empty() {
        return None;
    }
    Some(totals.values().sum::<f64>() / totals.len() as f64)
}

/// Percentage change from `previous` to `current`; `None` when `previous` is 0
pub fn growth_pct(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return None;
    }
    Some((current - previous) / previous.abs() * 100.0)
}

/// Revenue change of `current` against `comparison`
pub fn yoy_growth(current: &[SalesRecord], comparison: &[SalesRecord]) -> Option<f64> {
    growth_pct(revenue(current), revenue(comparison))
}

/// Trend of a KPI against its comparison value, if both are defined
pub fn trend(current: Option<f64>, previous: Option<f64>, lower_is_better: bool) -> Option<Trend> {
    let pct = growth_pct(current?, previous?)?;
    let direction = if pct > 0.0 {
        Direction::Up
    } else if pct < 0.0 {
        Direction::Down
    } else {
        Direction::Flat
    };
    let favourable = match direction {
        Direction::Up => !lower_is_better,
        Direction::Down => lower_is_better,
        Direction::Flat => false,
    };
    Some(Trend { pct, direction, favourable })
}

/// Mean delivery days over records with a measured delivery
pub fn avg_delivery_days(records: &[SalesRecord]) -> Option<f64> {
    let days: Vec<i64> = records
        .iter()
        .filter_map(|r| r.delivery.and_then(|d| d.days()))
        .collect();
    if days.is_empty() {
        return None;
    }
    Some(days.iter().sum::<i64>() as f64 / days.len() as f64)
}

/// First review per order, ignoring scores outside 1-5
fn review_index(reviews: &[ReviewRow]) -> HashMap<&str, u8> {
    let mut index = HashMap::new();
    for review in reviews.iter().filter(|r| (1..=5).contains(&r.review_score)) {
        index.entry(review.order_id.as_str()).or_insert(review.review_score);
    }
    index
}

/// Mean review score over reviewed orders in `records`
pub fn avg_review_score(records: &[SalesRecord], reviews: &[ReviewRow]) -> Option<f64> {
    let index = review_index(reviews);
    let scores: Vec<u8> = records
        .iter()
        .map(|r| r.order_id.as_str())
        .collect::<HashSet<_>>()
        .into_iter()
        .filter_map(|id| index.get(id).copied())
        .collect();
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().map(|&s| s as f64).sum::<f64>() / scores.len() as f64)
}

/// Distinct years present, newest first
pub fn available_years(records: &[SalesRecord]) -> Vec<i32> {
    let years: BTreeSet<i32> = records.iter().map(|r| r.year).collect();
    years.into_iter().rev().collect()
}

// ============================================================================
// Series & Breakdowns
// ============================================================================

/// Revenue per period present in `records`, chronological, with the change
/// from the previous period
pub fn mom_growth(records: &[SalesRecord]) -> Vec<PeriodGrowth> {
    let mut by_period: BTreeMap<YearMonth, f64> = BTreeMap::new();
    for r in records {
        *by_period.entry(r.year_month).or_insert(0.0) += r.price;
    }

    let mut prev: Option<f64> = None;
    by_period
        .into_iter()
        .map(|(period, revenue)| {
            let growth_pct = prev.and_then(|p| growth_pct(revenue, p));
            prev = Some(revenue);
            PeriodGrowth { period, revenue, growth_pct }
        })
        .collect()
}

/// Mean of the defined growth values in a series
pub fn avg_mom_growth(series: &[PeriodGrowth]) -> Option<f64> {
    let defined: Vec<f64> = series.iter().filter_map(|p| p.growth_pct).collect();
    if defined.is_empty() {
        return None;
    }
    Some(defined.iter().sum::<f64>() / defined.len() as f64)
}

/// Revenue per calendar month (only months with data), Jan to Dec
pub fn monthly_revenue(records: &[SalesRecord]) -> Vec<MonthRevenue> {
    let mut by_month: BTreeMap<u32, f64> = BTreeMap::new();
    for r in records {
        *by_month.entry(r.month).or_insert(0.0) += r.price;
    }
    by_month
        .into_iter()
        .map(|(month, revenue)| MonthRevenue { month, revenue })
        .collect()
}

fn share(part: f64, total: f64) -> Option<f64> {
    if total == 0.0 {
        None
    } else {
        Some(part / total * 100.0)
    }
}

fn sorted_desc<T>(
    mut rows: Vec<T>,
    value: impl Fn(&T) -> f64,
    name: impl Fn(&T) -> &str,
) -> Vec<T> {
    rows.sort_by(|a, b| value(b).total_cmp(&value(a)).then_with(|| name(a).cmp(name(b))));
    rows
}

/// Revenue and share per product category, highest first.
///
/// Unmatched products and blank categories are grouped under [`UNKNOWN`].
pub fn category_revenue(records: &[SalesRecord], products: &[ProductRow]) -> Vec<CategoryRevenue> {
    let categories: HashMap<&str, &str> = products
        .iter()
        .filter_map(|p| {
            p.product_category_name
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(|c| (p.product_id.as_str(), c))
        })
        .collect();

    let mut by_category: HashMap<&str, f64> = HashMap::new();
    for r in records {
        let category = categories.get(r.product_id.as_str()).copied().unwrap_or(UNKNOWN);
        *by_category.entry(category).or_insert(0.0) += r.price;
    }

    let total = revenue(records);
    let rows = by_category
        .into_iter()
        .map(|(category, revenue)| CategoryRevenue {
            category: category.to_string(),
            revenue,
            share_pct: share(revenue, total),
        })
        .collect();
    sorted_desc(rows, |c| c.revenue, |c| c.category.as_str())
}

/// Revenue and distinct orders per customer state, highest revenue first.
///
/// Resolves records -> orders -> customers; unresolved states are grouped
/// under [`UNKNOWN`].
pub fn state_revenue(
    records: &[SalesRecord],
    orders: &[OrderRow],
    customers: &[CustomerRow],
) -> Vec<StateRevenue> {
    let customer_of: HashMap<&str, &str> = orders
        .iter()
        .map(|o| (o.order_id.as_str(), o.customer_id.as_str()))
        .collect();
    let state_of: HashMap<&str, &str> = customers
        .iter()
        .map(|c| (c.customer_id.as_str(), c.customer_state.as_str()))
        .collect();

    let mut by_state: HashMap<&str, (f64, HashSet<&str>)> = HashMap::new();
    for r in records {
        let state = customer_of
            .get(r.order_id.as_str())
            .and_then(|c| state_of.get(c))
            .copied()
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN);
        let entry = by_state.entry(state).or_default();
        entry.0 += r.price;
        entry.1.insert(r.order_id.as_str());
    }

    let rows = by_state
        .into_iter()
        .map(|(state, (revenue, orders))| StateRevenue {
            state: state.to_string(),
            revenue,
            order_count: orders.len(),
        })
        .collect();
    sorted_desc(rows, |s| s.revenue, |s| s.state.as_str())
}

/// Review score against delivery speed, one observation per order.
///
/// A review belongs to the whole order, so an order with several line items
/// is counted once. Orders without a review are only counted in
/// `unreviewed_orders`; orders without a measured delivery only in
/// `unmeasured_orders`.
pub fn delivery_satisfaction(records: &[SalesRecord], reviews: &[ReviewRow]) -> SatisfactionTable {
    let index = review_index(reviews);

    // delivery is order-level, so the first line item speaks for the order
    let mut seen: HashSet<&str> = HashSet::new();
    let mut cells: BTreeMap<(SpeedBucket, u8), usize> = BTreeMap::new();
    let mut table = SatisfactionTable::default();

    for r in records {
        if !seen.insert(r.order_id.as_str()) {
            continue;
        }
        let bucket = r.delivery.and_then(|d| d.bucket());
        let score = index.get(r.order_id.as_str()).copied();

        if score.is_none() {
            table.unreviewed_orders += 1;
        }
        if bucket.is_none() {
            table.unmeasured_orders += 1;
        }
        if let (Some(bucket), Some(score)) = (bucket, score) {
            *cells.entry((bucket, score)).or_insert(0) += 1;
        }
    }

    table.buckets = SpeedBucket::ALL
        .iter()
        .map(|&bucket| {
            let (count, sum) = cells
                .iter()
                .filter(|((b, _), _)| *b == bucket)
                .fold((0usize, 0usize), |(n, s), ((_, score), c)| {
                    (n + c, s + *score as usize * c)
                });
            BucketSatisfaction {
                bucket,
                label: bucket.label(),
                reviewed_orders: count,
                avg_score: (count > 0).then(|| sum as f64 / count as f64),
            }
        })
        .collect();

    table.cells = cells
        .into_iter()
        .map(|((bucket, score), orders)| SatisfactionCell { bucket, score, orders })
        .collect();

    table
}

/// Payment value per payment type over the orders in `records`
pub fn payment_mix(records: &[SalesRecord], payments: &[PaymentRow]) -> Vec<PaymentShare> {
    let order_ids: HashSet<&str> = records.iter().map(|r| r.order_id.as_str()).collect();

    let mut by_type: HashMap<&str, (f64, HashSet<&str>)> = HashMap::new();
    for p in payments.iter().filter(|p| order_ids.contains(p.order_id.as_str())) {
        let entry = by_type.entry(p.payment_type.as_str()).or_default();
        entry.0 += p.payment_value;
        entry.1.insert(p.order_id.as_str());
    }

    let total: f64 = by_type.values().map(|(v, _)| v).sum();
    let rows = by_type
        .into_iter()
        .map(|(payment_type, (value, orders))| PaymentShare {
            payment_type: payment_type.to_string(),
            value,
            orders: orders.len(),
            share_pct: share(value, total),
        })
        .collect();
    sorted_desc(rows, |p| p.value, |p| p.payment_type.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatusFilter;
    use crate::models::{DeliverySpeed, OrderStatus};
    use crate::prepare::fixtures::{item, order};
    use crate::prepare::{
        add_temporal_features, build_sales_records, calculate_delivery_speed, filter_by_period,
        filter_by_status, TimestampColumn,
    };

    fn record(order_id: &str, product: &str, price: f64, year: i32, month: u32) -> SalesRecord {
        SalesRecord {
            order_id: order_id.to_string(),
            order_item_id: 1,
            product_id: product.to_string(),
            price,
            freight_value: 0.0,
            customer_id: format!("cust-{}", order_id),
            status: OrderStatus::Delivered,
            purchased_at: None,
            delivered_at: None,
            year,
            month,
            year_month: YearMonth::new(year, month),
            delivery: None,
        }
    }

    fn with_delivery(mut r: SalesRecord, days: Option<i64>) -> SalesRecord {
        r.delivery = Some(match days {
            Some(days) => DeliverySpeed::Measured { days, bucket: SpeedBucket::from_days(days) },
            None => DeliverySpeed::Undelivered,
        });
        r
    }

    fn review(order_id: &str, score: u8) -> ReviewRow {
        ReviewRow { order_id: order_id.to_string(), review_score: score }
    }

    fn product(id: &str, category: Option<&str>) -> ProductRow {
        ProductRow {
            product_id: id.to_string(),
            product_category_name: category.map(|c| c.to_string()),
        }
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(revenue(&[]), 0.0);
        assert_eq!(order_count(&[]), 0);
        assert_eq!(avg_order_value(&[]), None);
        assert!(mom_growth(&[]).is_empty());
        assert_eq!(avg_mom_growth(&[]), None);
        assert!(category_revenue(&[], &[]).is_empty());
        assert!(state_revenue(&[], &[], &[]).is_empty());
        assert_eq!(avg_delivery_days(&[]), None);
        assert_eq!(avg_review_score(&[], &[]), None);
        assert_eq!(delivery_satisfaction(&[], &[]).unreviewed_orders, 0);
    }

    #[test]
    fn test_orders_vs_line_items() {
        let records = vec![
            record("o1", "p1", 100.0, 2023, 1),
            record("o1", "p2", 50.0, 2023, 1),
            record("o2", "p1", 30.0, 2023, 2),
        ];
        assert_eq!(revenue(&records), 180.0);
        assert_eq!(order_count(&records), 2);
        assert!(order_count(&records) <= records.len());
        assert_eq!(avg_order_value(&records), Some(90.0));
    }

    #[test]
    fn test_growth_pct() {
        assert_eq!(growth_pct(150.0, 100.0), Some(50.0));
        assert_eq!(growth_pct(50.0, 100.0), Some(-50.0));
        assert_eq!(growth_pct(50.0, 0.0), None);
        assert_eq!(growth_pct(0.0, 0.0), None);
    }

    #[test]
    fn test_yoy_growth() {
        let current = vec![record("o1", "p1", 120.0, 2023, 1)];
        let comparison = vec![record("o0", "p1", 100.0, 2022, 1)];
        let pct = yoy_growth(&current, &comparison).unwrap();
        assert!((pct - 20.0).abs() < 1e-9);
        assert_eq!(yoy_growth(&current, &[]), None);
    }

    #[test]
    fn test_mom_growth_constant_revenue() {
        let records: Vec<_> = (1..=12)
            .map(|m| record(&format!("o{}", m), "p1", 250.0, 2023, m))
            .collect();
        let series = mom_growth(&records);

        assert_eq!(series.len(), 12);
        assert_eq!(series[0].growth_pct, None);
        for p in &series[1..] {
            assert_eq!(p.growth_pct, Some(0.0));
        }
        assert_eq!(avg_mom_growth(&series), Some(0.0));
    }

    #[test]
    fn test_mom_growth_ordering_and_zero_prior() {
        let records = vec![
            record("o3", "p1", 200.0, 2023, 2),
            record("o1", "p1", 0.0, 2022, 12),
            record("o2", "p1", 100.0, 2023, 1),
        ];
        let series = mom_growth(&records);
        let periods: Vec<_> = series.iter().map(|p| p.period.key()).collect();
        assert_eq!(periods, vec![202212, 202301, 202302]);
        assert_eq!(series[0].growth_pct, None);
        // prior revenue was zero
        assert_eq!(series[1].growth_pct, None);
        assert_eq!(series[2].growth_pct, Some(100.0));
        assert_eq!(avg_mom_growth(&series), Some(100.0));
    }

    #[test]
    fn test_monthly_revenue() {
        let records = vec![
            record("o1", "p1", 10.0, 2023, 3),
            record("o2", "p1", 5.0, 2023, 1),
            record("o3", "p1", 7.0, 2023, 3),
        ];
        assert_eq!(
            monthly_revenue(&records),
            vec![
                MonthRevenue { month: 1, revenue: 5.0 },
                MonthRevenue { month: 3, revenue: 17.0 },
            ]
        );
    }

    #[test]
    fn test_category_revenue_with_unknown() {
        let records = vec![
            record("o1", "p1", 60.0, 2023, 1),
            record("o2", "p2", 25.0, 2023, 1),
            record("o3", "p3", 10.0, 2023, 1),
            record("o4", "ghost", 5.0, 2023, 1),
        ];
        let products = vec![
            product("p1", Some("electronics")),
            product("p2", Some("toys")),
            product("p3", None),
        ];

        let rows = category_revenue(&records, &products);
        let names: Vec<_> = rows.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["electronics", "toys", UNKNOWN]);
        assert_eq!(rows[2].revenue, 15.0);

        let total_share: f64 = rows.iter().filter_map(|c| c.share_pct).sum();
        assert!((total_share - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_category_share_undefined_for_zero_revenue() {
        let records = vec![record("o1", "p1", 0.0, 2023, 1)];
        let rows = category_revenue(&records, &[product("p1", Some("free"))]);
        assert_eq!(rows[0].share_pct, None);
    }

    #[test]
    fn test_state_revenue() {
        let orders = vec![
            order("o1", "delivered", "2023-01-01", None, "c1"),
            order("o2", "delivered", "2023-01-01", None, "c2"),
            order("o3", "delivered", "2023-01-01", None, "c3"),
            order("o4", "delivered", "2023-01-01", None, "nobody"),
        ];
        let customers = vec![
            CustomerRow { customer_id: "c1".into(), customer_state: "CA".into() },
            CustomerRow { customer_id: "c2".into(), customer_state: "NY".into() },
            CustomerRow { customer_id: "c3".into(), customer_state: "CA".into() },
        ];
        let records = vec![
            record("o1", "p1", 40.0, 2023, 1),
            record("o1", "p2", 10.0, 2023, 1),
            record("o2", "p1", 80.0, 2023, 1),
            record("o3", "p1", 50.0, 2023, 1),
            record("o4", "p1", 1.0, 2023, 1),
        ];

        let rows = state_revenue(&records, &orders, &customers);
        assert_eq!(
            rows,
            vec![
                StateRevenue { state: "CA".into(), revenue: 100.0, order_count: 2 },
                StateRevenue { state: "NY".into(), revenue: 80.0, order_count: 1 },
                StateRevenue { state: UNKNOWN.into(), revenue: 1.0, order_count: 1 },
            ]
        );
    }

    #[test]
    fn test_delivery_satisfaction_counts_orders_once() {
        let records = vec![
            with_delivery(record("o1", "p1", 10.0, 2023, 1), Some(2)),
            with_delivery(record("o1", "p2", 10.0, 2023, 1), Some(2)),
            with_delivery(record("o2", "p1", 10.0, 2023, 1), Some(5)),
            with_delivery(record("o3", "p1", 10.0, 2023, 1), Some(12)),
            with_delivery(record("o4", "p1", 10.0, 2023, 1), Some(1)),
            with_delivery(record("o5", "p1", 10.0, 2023, 1), None),
        ];
        let reviews = vec![
            review("o1", 5),
            review("o1", 1),
            review("o2", 4),
            review("o3", 2),
            review("o5", 3),
        ];

        let table = delivery_satisfaction(&records, &reviews);
        assert_eq!(
            table.cells,
            vec![
                SatisfactionCell { bucket: SpeedBucket::Fast, score: 5, orders: 1 },
                SatisfactionCell { bucket: SpeedBucket::Standard, score: 4, orders: 1 },
                SatisfactionCell { bucket: SpeedBucket::Slow, score: 2, orders: 1 },
            ]
        );
        assert_eq!(table.unreviewed_orders, 1);
        assert_eq!(table.unmeasured_orders, 1);
        assert_eq!(table.buckets[0].avg_score, Some(5.0));
        assert_eq!(table.buckets[0].label, "1-3 days");
        assert_eq!(table.buckets[2].reviewed_orders, 1);

        // o5 is reviewed but unmeasured; it still counts for the overall score
        assert_eq!(avg_review_score(&records, &reviews), Some((5.0 + 4.0 + 2.0 + 3.0) / 4.0));
    }

    #[test]
    fn test_avg_delivery_days_excludes_undelivered() {
        let records = vec![
            with_delivery(record("o1", "p1", 10.0, 2023, 1), Some(2)),
            with_delivery(record("o2", "p1", 10.0, 2023, 1), Some(6)),
            with_delivery(record("o3", "p1", 10.0, 2023, 1), None),
        ];
        assert_eq!(avg_delivery_days(&records), Some(4.0));
    }

    #[test]
    fn test_unmeasured_deliveries_still_count_toward_revenue() {
        let orders = vec![
            order("o1", "delivered", "2023-03-01 10:00:00", Some("2023-03-05 10:00:00"), "c1"),
            // delivered two days before it was bought
            order("o2", "delivered", "2023-03-10 10:00:00", Some("2023-03-08 10:00:00"), "c2"),
        ];
        let items = vec![item("o1", 1, "p1", 100.0), item("o2", 1, "p1", 50.0)];
        let (lines, _) = build_sales_records(&items, &orders);
        let (records, _) = add_temporal_features(&lines, TimestampColumn::Purchase);
        let (mut records, report) = calculate_delivery_speed(&records);
        assert_eq!(report.negative_duration, 1);

        let mut missing_purchase = record("o3", "p1", 30.0, 2023, 3);
        missing_purchase.delivery = Some(DeliverySpeed::MissingPurchase);
        records.push(missing_purchase);

        assert_eq!(revenue(&records), 180.0);
        assert_eq!(order_count(&records), 3);
        assert_eq!(avg_order_value(&records), Some(60.0));
        assert_eq!(avg_delivery_days(&records), Some(4.0));

        let reviews = vec![review("o1", 5), review("o2", 1), review("o3", 2)];
        let table = delivery_satisfaction(&records, &reviews);
        assert_eq!(table.unmeasured_orders, 2);
        assert_eq!(table.unreviewed_orders, 0);
        assert_eq!(
            table.cells,
            vec![SatisfactionCell { bucket: SpeedBucket::Standard, score: 5, orders: 1 }]
        );
        let reviewed: usize = table.buckets.iter().map(|b| b.reviewed_orders).sum();
        assert_eq!(reviewed, 1);
        assert_eq!(table.buckets[1].avg_score, Some(5.0));
    }

    #[test]
    fn test_trend() {
        let up = trend(Some(110.0), Some(100.0), false).unwrap();
        assert_eq!(up.direction, Direction::Up);
        assert!(up.favourable);

        // delivery got faster
        let faster = trend(Some(8.0), Some(10.0), true).unwrap();
        assert_eq!(faster.direction, Direction::Down);
        assert!(faster.favourable);

        assert_eq!(trend(Some(1.0), None, false), None);
        assert_eq!(trend(Some(1.0), Some(0.0), false), None);
        assert_eq!(trend(None, Some(1.0), false), None);
    }

    #[test]
    fn test_payment_mix() {
        let records = vec![record("o1", "p1", 10.0, 2023, 1), record("o2", "p1", 10.0, 2023, 1)];
        let payments = vec![
            PaymentRow {
                order_id: "o1".into(),
                payment_sequential: 1,
                payment_type: "credit_card".into(),
                payment_installments: 3,
                payment_value: 75.0,
            },
            PaymentRow {
                order_id: "o2".into(),
                payment_sequential: 1,
                payment_type: "voucher".into(),
                payment_installments: 1,
                payment_value: 25.0,
            },
            PaymentRow {
                order_id: "other".into(),
                payment_sequential: 1,
                payment_type: "boleto".into(),
                payment_installments: 1,
                payment_value: 1000.0,
            },
        ];

        let mix = payment_mix(&records, &payments);
        assert_eq!(mix.len(), 2);
        assert_eq!(mix[0].payment_type, "credit_card");
        assert_eq!(mix[0].share_pct, Some(75.0));
        assert_eq!(mix[1].orders, 1);
    }

    #[test]
    fn test_available_years() {
        let records = vec![
            record("o1", "p1", 1.0, 2022, 1),
            record("o2", "p1", 1.0, 2024, 1),
            record("o3", "p1", 1.0, 2022, 5),
        ];
        assert_eq!(available_years(&records), vec![2024, 2022]);
    }

    #[test]
    fn test_end_to_end_single_order() {
        let orders = vec![order(
            "1",
            "delivered",
            "2023-01-05",
            Some("2023-01-08"),
            "C1",
        )];
        let items = vec![item("1", 1, "P1", 100.0)];
        let products = vec![product("P1", Some("Electronics"))];
        let customers = vec![CustomerRow { customer_id: "C1".into(), customer_state: "CA".into() }];

        let (lines, join) = build_sales_records(&items, &orders);
        assert_eq!(join.unmatched_items, 0);
        let (records, _) = add_temporal_features(&lines, TimestampColumn::Purchase);
        let delivered = filter_by_status(&records, &StatusFilter::default());
        let (current, _) = calculate_delivery_speed(&filter_by_period(&delivered, 2023, None));

        assert_eq!(revenue(&current), 100.0);
        assert_eq!(
            category_revenue(&current, &products),
            vec![CategoryRevenue {
                category: "Electronics".into(),
                revenue: 100.0,
                share_pct: Some(100.0),
            }]
        );
        assert_eq!(state_revenue(&current, &orders, &customers)[0].state, "CA");
        assert_eq!(
            current[0].delivery,
            Some(DeliverySpeed::Measured { days: 3, bucket: SpeedBucket::Fast })
        );
    }

    #[test]
    fn test_wrong_status_never_reaches_revenue() {
        let orders = vec![
            order("o1", "delivered", "2023-03-01", Some("2023-03-02"), "c1"),
            order("o2", "canceled", "2023-03-01", None, "c1"),
        ];
        let items = vec![item("o1", 1, "p1", 10.0), item("o2", 1, "p1", 500.0)];
        let (lines, _) = build_sales_records(&items, &orders);
        let (records, _) = add_temporal_features(&lines, TimestampColumn::Purchase);

        let delivered = filter_by_status(&records, &StatusFilter::default());
        assert_eq!(revenue(&filter_by_period(&delivered, 2023, Some(3))), 10.0);
    }
}
