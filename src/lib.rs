//! E-commerce sales metrics
//!
//! Loads the raw order tables, joins them into per-line-item sales records and
//! computes revenue, growth, category, geographic and delivery metrics over an
//! analysis period.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod format;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod prepare;

pub use config::{AnalysisConfig, StatusFilter};
pub use dashboard::{DashboardSnapshot, SalesData};
pub use error::{MetricsError, Result};
