//! Analysis configuration
//!
//! The only knobs the core accepts: analysis year, comparison year, month and
//! the order-status filter.

use crate::error::{MetricsError, Result};
use crate::models::OrderStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which order statuses count toward the metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusFilter {
    Only(OrderStatus),
    Any,
}

impl Default for StatusFilter {
    fn default() -> Self {
        StatusFilter::Only(OrderStatus::Delivered)
    }
}

impl StatusFilter {
    pub fn matches(&self, status: &OrderStatus) -> bool {
        match self {
            StatusFilter::Only(wanted) => wanted == status,
            StatusFilter::Any => true,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => Err(MetricsError::InvalidConfig("empty status filter".to_string())),
            "all" | "any" => Ok(StatusFilter::Any),
            other => Ok(StatusFilter::Only(OrderStatus::from(other))),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::Only(status) => write!(f, "{}", status),
            StatusFilter::Any => f.write_str("all"),
        }
    }
}

impl Serialize for StatusFilter {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StatusFilter {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Analysis window and status filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub year: i32,
    /// Defaults to `year - 1`
    #[serde(default)]
    pub comparison_year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub status: StatusFilter,
}

impl AnalysisConfig {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            comparison_year: None,
            month: None,
            status: StatusFilter::default(),
        }
    }

    pub fn with_month(mut self, month: Option<u32>) -> Self {
        self.month = month;
        self
    }

    pub fn with_comparison_year(mut self, year: Option<i32>) -> Self {
        self.comparison_year = year;
        self
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    /// Explicit comparison year, else the year before `year`.
    ///
    /// Falls back to `year` itself when it has no predecessor; [`validate`]
    /// rejects that case.
    ///
    /// [`validate`]: AnalysisConfig::validate
    pub fn comparison_year(&self) -> i32 {
        self.comparison_year
            .or_else(|| self.year.checked_sub(1))
            .unwrap_or(self.year)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(MetricsError::InvalidConfig(format!(
                    "month must be 1-12, got {}",
                    month
                )));
            }
        }
        if self.comparison_year.is_none() && self.year.checked_sub(1).is_none() {
            return Err(MetricsError::InvalidConfig(format!(
                "year {} has no previous year to compare against",
                self.year
            )));
        }
        if self.comparison_year == Some(self.year) {
            return Err(MetricsError::InvalidConfig(format!(
                "comparison year equals analysis year {}",
                self.year
            )));
        }
        Ok(())
    }
}
