use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    errors::ServiceError, services::inventory::IngredientResponse, ApiResponse, AppState,
};

/// Build the inventory Router scoped under `/api/v1/inventory`.
pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_ingredients))
        .route("/bulk-restock", post(bulk_restock))
        .route("/:id/restock", post(restock_ingredient))
        .route("/:id/minimum", put(set_minimum_stock))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RestockRequest {
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetMinimumRequest {
    pub minimum: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkRestockResponse {
    /// How many low-stock ingredients were topped up.
    pub restocked: usize,
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    responses(
        (status = 200, description = "Ingredients with stock classification", body = ApiResponse<Vec<IngredientResponse>>)
    ),
    tag = "Inventory"
)]
pub async fn list_ingredients(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<IngredientResponse>>>, ServiceError> {
    let ingredients = state.services.inventory.list_ingredients().await?;
    Ok(Json(ApiResponse::success(ingredients)))
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory/{id}/restock",
    params(("id" = Uuid, Path, description = "Ingredient id")),
    request_body = RestockRequest,
    responses(
        (status = 200, description = "Ingredient restocked", body = ApiResponse<IngredientResponse>),
        (status = 400, description = "Non-positive restock quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Ingredient not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Inventory"
)]
pub async fn restock_ingredient(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
    Json(request): Json<RestockRequest>,
) -> Result<Json<ApiResponse<IngredientResponse>>, ServiceError> {
    let updated = state
        .services
        .inventory
        .restock(ingredient_id, request.quantity)
        .await?;
    Ok(Json(ApiResponse::success(updated.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/inventory/{id}/minimum",
    params(("id" = Uuid, Path, description = "Ingredient id")),
    request_body = SetMinimumRequest,
    responses(
        (status = 200, description = "Minimum stock threshold updated", body = ApiResponse<IngredientResponse>),
        (status = 404, description = "Ingredient not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Inventory"
)]
pub async fn set_minimum_stock(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
    Json(request): Json<SetMinimumRequest>,
) -> Result<Json<ApiResponse<IngredientResponse>>, ServiceError> {
    let updated = state
        .services
        .inventory
        .set_minimum(ingredient_id, request.minimum)
        .await?;
    Ok(Json(ApiResponse::success(updated.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory/bulk-restock",
    request_body = RestockRequest,
    responses(
        (status = 200, description = "All low-stock ingredients topped up", body = ApiResponse<BulkRestockResponse>)
    ),
    tag = "Inventory"
)]
pub async fn bulk_restock(
    State(state): State<AppState>,
    Json(request): Json<RestockRequest>,
) -> Result<Json<ApiResponse<BulkRestockResponse>>, ServiceError> {
    let restocked = state
        .services
        .inventory
        .bulk_restock(request.quantity)
        .await?;
    Ok(Json(ApiResponse::success(BulkRestockResponse { restocked })))
}
