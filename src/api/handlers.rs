//! REST API handlers
//!
//! Every request recomputes its metrics from the shared [`SalesData`];
//! nothing is cached between requests.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{AnalysisConfig, StatusFilter};
use crate::dashboard::{DashboardSnapshot, PipelineDiagnostics, SalesData};
use crate::format::parse_month;
use crate::metrics::{self, CategoryRevenue, PeriodGrowth, StateRevenue};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct CategoryResponse {
    pub category: String,
    pub revenue: f64,
    pub share_pct: Option<f64>,
}

impl From<CategoryRevenue> for CategoryResponse {
    fn from(c: CategoryRevenue) -> Self {
        Self {
            category: c.category,
            revenue: round2(c.revenue),
            share_pct: c.share_pct.map(round2),
        }
    }
}

#[derive(Serialize)]
pub struct StateResponse {
    pub state: String,
    pub revenue: f64,
    pub order_count: usize,
}

impl From<StateRevenue> for StateResponse {
    fn from(s: StateRevenue) -> Self {
        Self {
            state: s.state,
            revenue: round2(s.revenue),
            order_count: s.order_count,
        }
    }
}

#[derive(Serialize)]
pub struct GrowthResponse {
    pub year: i32,
    pub month: Option<u32>,
    pub series: Vec<PeriodGrowth>,
    pub avg_growth_pct: Option<f64>,
    pub comparison_year: i32,
    pub yoy_growth_pct: Option<f64>,
}

#[derive(Serialize)]
pub struct YearsResponse {
    pub status: StatusFilter,
    pub years: Vec<i32>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Analysis window; `year` defaults to the newest year with data
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub year: Option<i32>,
    /// `1`-`12` or `Jan`-`Dec`
    pub month: Option<String>,
    pub comparison_year: Option<i32>,
    pub status: Option<String>,
    pub limit: Option<usize>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(msg: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: msg.into() }))
}

impl PeriodQuery {
    fn status(&self) -> Result<StatusFilter, ApiError> {
        match &self.status {
            Some(s) => s.parse().map_err(|e: crate::MetricsError| bad_request(e.to_string())),
            None => Ok(StatusFilter::default()),
        }
    }

    fn to_config(&self, data: &SalesData) -> Result<AnalysisConfig, ApiError> {
        let status = self.status()?;
        let month = match self.month.as_deref() {
            Some(m) => Some(
                parse_month(m).ok_or_else(|| bad_request(format!("invalid month: {}", m)))?,
            ),
            None => None,
        };
        let year = match self.year {
            Some(y) => y,
            None => *data
                .available_years(&status)
                .first()
                .ok_or_else(|| bad_request(format!("no {} orders in the dataset", status)))?,
        };

        let config = AnalysisConfig::new(year)
            .with_month(month)
            .with_comparison_year(self.comparison_year)
            .with_status(status);
        config.validate().map_err(|e| bad_request(e.to_string()))?;
        Ok(config)
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub type AppState = Arc<SalesData>;

/// GET /api/v1/health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// GET /api/v1/years
pub async fn get_years(
    State(data): State<AppState>,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<YearsResponse>, ApiError> {
    let status = params.status()?;
    let years = data.available_years(&status);
    Ok(Json(YearsResponse { status, years }))
}

/// GET /api/v1/dashboard
pub async fn get_dashboard(
    State(data): State<AppState>,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<DashboardSnapshot>, ApiError> {
    let config = params.to_config(&data)?;
    DashboardSnapshot::compute(&data, &config)
        .map(Json)
        .map_err(|e| bad_request(e.to_string()))
}

/// GET /api/v1/categories
pub async fn get_categories(
    State(data): State<AppState>,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let config = params.to_config(&data)?;
    let (records, _) = data.period_records(&config.status, config.year, config.month);
    let limit = params.limit.unwrap_or(usize::MAX);

    let response = metrics::category_revenue(&records, &data.datasets.products)
        .into_iter()
        .take(limit)
        .map(CategoryResponse::from)
        .collect();
    Ok(Json(response))
}

/// GET /api/v1/states
pub async fn get_states(
    State(data): State<AppState>,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<Vec<StateResponse>>, ApiError> {
    let config = params.to_config(&data)?;
    let (records, _) = data.period_records(&config.status, config.year, config.month);
    let limit = params.limit.unwrap_or(usize::MAX);

    let response = metrics::state_revenue(&records, &data.datasets.orders, &data.datasets.customers)
        .into_iter()
        .take(limit)
        .map(StateResponse::from)
        .collect();
    Ok(Json(response))
}

/// GET /api/v1/growth
pub async fn get_growth(
    State(data): State<AppState>,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<GrowthResponse>, ApiError> {
    let config = params.to_config(&data)?;
    let comparison_year = config.comparison_year();
    let (current, _) = data.period_records(&config.status, config.year, config.month);
    let (comparison, _) = data.period_records(&config.status, comparison_year, config.month);

    let series = metrics::mom_growth(&current);
    Ok(Json(GrowthResponse {
        year: config.year,
        month: config.month,
        avg_growth_pct: metrics::avg_mom_growth(&series),
        series,
        comparison_year,
        yoy_growth_pct: metrics::yoy_growth(&current, &comparison),
    }))
}

/// GET /api/v1/diagnostics
pub async fn get_diagnostics(State(data): State<AppState>) -> Json<PipelineDiagnostics> {
    Json(data.diagnostics.clone())
}
