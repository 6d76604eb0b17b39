use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    errors::ServiceError,
    services::analytics::{DashboardMetrics, MetricsPeriod, TopItem},
    ApiResponse, AppState,
};

/// Build the analytics Router scoped under `/api/v1/analytics`.
pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/top-items", get(get_top_items))
        .route("/dashboard", get(get_dashboard_metrics))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TopItemsQuery {
    /// Trailing window in days (default: 7)
    pub days: Option<i64>,
    /// Maximum number of entries (default: 3)
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DashboardQuery {
    /// Reporting window (default: all)
    pub period: Option<MetricsPeriod>,
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/top-items",
    params(TopItemsQuery),
    responses(
        (status = 200, description = "Most ordered items over the window", body = ApiResponse<Vec<TopItem>>),
        (status = 400, description = "Invalid window", body = crate::errors::ErrorResponse)
    ),
    tag = "Analytics"
)]
pub async fn get_top_items(
    State(state): State<AppState>,
    Query(params): Query<TopItemsQuery>,
) -> Result<Json<ApiResponse<Vec<TopItem>>>, ServiceError> {
    let days = params.days.unwrap_or(7);
    let limit = params.limit.unwrap_or(3);

    if !(1..=365).contains(&days) {
        return Err(ServiceError::ValidationError(
            "Days must be between 1 and 365".to_string(),
        ));
    }
    if !(1..=50).contains(&limit) {
        return Err(ServiceError::ValidationError(
            "Limit must be between 1 and 50".to_string(),
        ));
    }

    let items = state.services.analytics.top_items(days, limit).await?;
    Ok(Json(ApiResponse::success(items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Dashboard metrics for the window", body = ApiResponse<DashboardMetrics>)
    ),
    tag = "Analytics"
)]
pub async fn get_dashboard_metrics(
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<DashboardMetrics>>, ServiceError> {
    let period = params.period.unwrap_or_default();
    let metrics = state.services.analytics.dashboard_metrics(period).await?;
    Ok(Json(ApiResponse::success(metrics)))
}
