use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::order::OrderStatus,
    errors::ServiceError,
    receipts::ReceiptData,
    services::orders::{OrderResponse, OrderSnapshotResponse, SubmitOrderRequest},
    ApiResponse, AppState,
};

/// Build the orders Router scoped under `/api/v1/orders`.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/submit", post(submit_order))
        .route("/:id", get(get_order))
        .route("/:id/receipt", get(get_receipt))
        .route("/:id/status", put(update_order_status))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/submit",
    request_body = SubmitOrderRequest,
    responses(
        (status = 200, description = "Order synchronized; canonical snapshot returned", body = ApiResponse<OrderSnapshotResponse>),
        (status = 400, description = "Empty cart or missing payment method", body = crate::errors::ErrorResponse),
        (status = 409, description = "A submission for this table is already in flight", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn submit_order(
    State(state): State<AppState>,
    Json(request): Json<SubmitOrderRequest>,
) -> Result<Json<ApiResponse<OrderSnapshotResponse>>, ServiceError> {
    let snapshot = state.services.orders.submit_order(request).await?;
    Ok(Json(ApiResponse::success(snapshot.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Canonical order snapshot", body = ApiResponse<OrderSnapshotResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderSnapshotResponse>>, ServiceError> {
    let snapshot = state.services.orders.get_snapshot(order_id).await?;
    Ok(Json(ApiResponse::success(snapshot.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/receipt",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Plain-text receipt", body = String, content_type = "text/plain"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn get_receipt(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let snapshot = state.services.orders.get_snapshot(order_id).await?;
    let table = state
        .services
        .tables
        .get_table(snapshot.order.table_id)
        .await?;

    let receipt = ReceiptData::from_snapshot(
        &snapshot,
        table.table_number,
        &state.config.default_currency,
    );

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        receipt.render_text(),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated", body = ApiResponse<OrderResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state
        .services
        .orders
        .update_status(order_id, request.status)
        .await?;
    Ok(Json(ApiResponse::success(order.into())))
}
