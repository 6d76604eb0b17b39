use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    services::cart::CartEntry,
    services::orders::{OrderResponse, TableSession},
    services::tables::TableResponse,
    ApiResponse, AppState,
};

/// Build the tables Router scoped under `/api/v1/tables`.
pub fn table_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tables))
        .route("/:id/session", post(select_table))
}

/// Working state handed to the ordering screen after a table is picked:
/// the table, the pending order when one exists, and the normalized cart.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub table: TableResponse,
    pub active_order: Option<OrderResponse>,
    pub cart: Vec<CartEntry>,
    /// True when the pending-order lookup failed and the session degraded
    /// to an empty cart.
    pub degraded: bool,
}

impl From<TableSession> for SessionResponse {
    fn from(session: TableSession) -> Self {
        Self {
            table: session.table.into(),
            active_order: session.active_order.map(Into::into),
            cart: session.cart.into_entries(),
            degraded: session.degraded,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/tables",
    responses(
        (status = 200, description = "Tables listed", body = ApiResponse<Vec<TableResponse>>)
    ),
    tag = "Tables"
)]
pub async fn list_tables(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TableResponse>>>, ServiceError> {
    let tables = state.services.tables.list_tables().await?;
    Ok(Json(ApiResponse::success(
        tables.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/tables/{id}/session",
    params(("id" = Uuid, Path, description = "Table id")),
    responses(
        (status = 200, description = "Session initialized from the table's pending order, or empty", body = ApiResponse<SessionResponse>),
        (status = 404, description = "Table not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Tables"
)]
pub async fn select_table(
    State(state): State<AppState>,
    Path(table_id): Path<Uuid>,
) -> Result<Json<ApiResponse<SessionResponse>>, ServiceError> {
    let session = state.services.orders.select_table(table_id).await?;
    Ok(Json(ApiResponse::success(session.into())))
}
