//! Dashboard snapshot
//!
//! Loads the base record set once ([`SalesData`]) and computes the full KPI
//! set for an analysis period and its comparison period
//! ([`DashboardSnapshot`]).

use crate::config::{AnalysisConfig, StatusFilter};
use crate::error::Result;
use crate::loader::{load_datasets, Datasets, LoadReport};
use crate::metrics::{
    self, CategoryRevenue, MonthRevenue, PaymentShare, PeriodGrowth, SatisfactionTable,
    StateRevenue, Trend,
};
use crate::models::SalesRecord;
use crate::prepare::{
    add_temporal_features, build_sales_records, calculate_delivery_speed, filter_by_period,
    filter_by_status, DeliveryReport, JoinReport, TemporalReport, TimestampColumn,
};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

pub const TOP_CATEGORIES: usize = 10;

/// What the preparation steps dropped
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineDiagnostics {
    pub load: LoadReport,
    pub join: JoinReport,
    pub temporal: TemporalReport,
}

/// Loaded tables plus the joined, time-enriched record set.
///
/// Read-only once built; reloading means building a new one.
#[derive(Debug, Clone)]
pub struct SalesData {
    pub datasets: Datasets,
    pub records: Vec<SalesRecord>,
    pub diagnostics: PipelineDiagnostics,
}

impl SalesData {
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let (datasets, load) = load_datasets(dir)?;
        Ok(Self::from_datasets(datasets, load))
    }

    pub fn from_datasets(datasets: Datasets, load: LoadReport) -> Self {
        let (lines, join) = build_sales_records(&datasets.order_items, &datasets.orders);
        let (records, temporal) = add_temporal_features(&lines, TimestampColumn::Purchase);
        info!(
            "Prepared {} sales records ({} items unmatched, {} bad timestamps)",
            records.len(),
            join.unmatched_items,
            temporal.dropped
        );

        Self {
            datasets,
            records,
            diagnostics: PipelineDiagnostics { load, join, temporal },
        }
    }

    /// Years with records passing `status`, newest first
    pub fn available_years(&self, status: &StatusFilter) -> Vec<i32> {
        metrics::available_years(&filter_by_status(&self.records, status))
    }

    /// Status filter, then period filter, then delivery speed
    pub fn period_records(
        &self,
        status: &StatusFilter,
        year: i32,
        month: Option<u32>,
    ) -> (Vec<SalesRecord>, DeliveryReport) {
        let filtered = filter_by_period(&filter_by_status(&self.records, status), year, month);
        debug!("{} records for {} {:?} ({})", filtered.len(), year, month, status);
        calculate_delivery_speed(&filtered)
    }
}

/// Headline KPIs for one period
#[derive(Debug, Clone, Serialize)]
pub struct PeriodKpis {
    pub year: i32,
    pub month: Option<u32>,
    pub revenue: f64,
    pub orders: usize,
    pub line_items: usize,
    pub avg_order_value: Option<f64>,
    pub avg_delivery_days: Option<f64>,
    pub avg_review_score: Option<f64>,
    pub delivery: DeliveryReport,
}

impl PeriodKpis {
    fn compute(
        records: &[SalesRecord],
        delivery: DeliveryReport,
        data: &SalesData,
        year: i32,
        month: Option<u32>,
    ) -> Self {
        Self {
            year,
            month,
            revenue: metrics::revenue(records),
            orders: metrics::order_count(records),
            line_items: records.len(),
            avg_order_value: metrics::avg_order_value(records),
            avg_delivery_days: metrics::avg_delivery_days(records),
            avg_review_score: metrics::avg_review_score(records, &data.datasets.reviews),
            delivery,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.line_items == 0
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct KpiTrends {
    pub revenue: Option<Trend>,
    pub avg_order_value: Option<Trend>,
    pub orders: Option<Trend>,
    /// Lower is better
    pub avg_delivery_days: Option<Trend>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueTrend {
    pub current: Vec<MonthRevenue>,
    pub comparison: Vec<MonthRevenue>,
}

/// Every metric the dashboard shows for one analysis config
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub config: AnalysisConfig,
    pub available_years: Vec<i32>,
    pub current: PeriodKpis,
    /// `None` when the comparison period has no records
    pub comparison: Option<PeriodKpis>,
    pub trends: KpiTrends,
    pub yoy_growth: Option<f64>,
    pub mom_growth: Vec<PeriodGrowth>,
    pub avg_mom_growth: Option<f64>,
    pub revenue_trend: RevenueTrend,
    pub top_categories: Vec<CategoryRevenue>,
    pub states: Vec<StateRevenue>,
    pub satisfaction: SatisfactionTable,
    pub payment_mix: Vec<PaymentShare>,
    pub diagnostics: PipelineDiagnostics,
}

impl DashboardSnapshot {
    pub fn compute(data: &SalesData, config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let comparison_year = config.comparison_year();

        let (current_records, current_delivery) =
            data.period_records(&config.status, config.year, config.month);
        let (comparison_records, comparison_delivery) =
            data.period_records(&config.status, comparison_year, config.month);

        let current = PeriodKpis::compute(
            &current_records,
            current_delivery,
            data,
            config.year,
            config.month,
        );
        let comparison = (!comparison_records.is_empty()).then(|| {
            PeriodKpis::compute(
                &comparison_records,
                comparison_delivery,
                data,
                comparison_year,
                config.month,
            )
        });

        let trends = match &comparison {
            Some(prev) => KpiTrends {
                revenue: metrics::trend(Some(current.revenue), Some(prev.revenue), false),
                avg_order_value: metrics::trend(
                    current.avg_order_value,
                    prev.avg_order_value,
                    false,
                ),
                orders: metrics::trend(
                    Some(current.orders as f64),
                    Some(prev.orders as f64),
                    false,
                ),
                avg_delivery_days: metrics::trend(
                    current.avg_delivery_days,
                    prev.avg_delivery_days,
                    true,
                ),
            },
            None => KpiTrends::default(),
        };

        let mom_growth = metrics::mom_growth(&current_records);
        let avg_mom_growth = metrics::avg_mom_growth(&mom_growth);

        let mut top_categories =
            metrics::category_revenue(&current_records, &data.datasets.products);
        top_categories.truncate(TOP_CATEGORIES);

        let mut resolved = config.clone();
        resolved.comparison_year = Some(comparison_year);

        Ok(Self {
            config: resolved,
            available_years: data.available_years(&config.status),
            yoy_growth: metrics::yoy_growth(&current_records, &comparison_records),
            trends,
            mom_growth,
            avg_mom_growth,
            revenue_trend: RevenueTrend {
                current: metrics::monthly_revenue(&current_records),
                comparison: metrics::monthly_revenue(&comparison_records),
            },
            top_categories,
            states: metrics::state_revenue(
                &current_records,
                &data.datasets.orders,
                &data.datasets.customers,
            ),
            satisfaction: metrics::delivery_satisfaction(&current_records, &data.datasets.reviews),
            payment_mix: metrics::payment_mix(&current_records, &data.datasets.payments),
            diagnostics: data.diagnostics.clone(),
            current,
            comparison,
        })
    }
}
