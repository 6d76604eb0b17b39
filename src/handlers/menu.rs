use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, put},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    services::menu::{CreateMenuItemInput, MenuItemResponse, UpdateMenuItemInput},
    ApiResponse, AppState,
};

/// Build the menu Router scoped under `/api/v1/menu`.
pub fn menu_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_menu_items).post(create_menu_item))
        .route("/:id", put(update_menu_item).delete(delete_menu_item))
        .route("/:id/price", put(set_price))
        .route("/:id/availability", put(set_availability))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MenuListQuery {
    /// Restrict the listing to items the ordering screen may sell.
    #[serde(default)]
    pub available_only: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetPriceRequest {
    pub price: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetAvailabilityRequest {
    pub available: bool,
}

#[utoipa::path(
    get,
    path = "/api/v1/menu",
    params(MenuListQuery),
    responses(
        (status = 200, description = "Menu items listed", body = ApiResponse<Vec<MenuItemResponse>>)
    ),
    tag = "Menu"
)]
pub async fn list_menu_items(
    State(state): State<AppState>,
    Query(params): Query<MenuListQuery>,
) -> Result<Json<ApiResponse<Vec<MenuItemResponse>>>, ServiceError> {
    let items = state.services.menu.list_items(params.available_only).await?;
    Ok(Json(ApiResponse::success(
        items.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/menu",
    request_body = CreateMenuItemInput,
    responses(
        (status = 200, description = "Menu item created", body = ApiResponse<MenuItemResponse>),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse)
    ),
    tag = "Menu"
)]
pub async fn create_menu_item(
    State(state): State<AppState>,
    Json(input): Json<CreateMenuItemInput>,
) -> Result<Json<ApiResponse<MenuItemResponse>>, ServiceError> {
    let item = state.services.menu.create_item(input).await?;
    Ok(Json(ApiResponse::success(item.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/menu/{id}",
    params(("id" = Uuid, Path, description = "Menu item id")),
    request_body = UpdateMenuItemInput,
    responses(
        (status = 200, description = "Menu item updated", body = ApiResponse<MenuItemResponse>),
        (status = 404, description = "Menu item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Menu"
)]
pub async fn update_menu_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(input): Json<UpdateMenuItemInput>,
) -> Result<Json<ApiResponse<MenuItemResponse>>, ServiceError> {
    let item = state.services.menu.update_item(item_id, input).await?;
    Ok(Json(ApiResponse::success(item.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/menu/{id}",
    params(("id" = Uuid, Path, description = "Menu item id")),
    responses(
        (status = 200, description = "Menu item deleted"),
        (status = 404, description = "Menu item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Menu"
)]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state.services.menu.delete_item(item_id).await?;
    Ok(Json(ApiResponse::message("Menu item deleted")))
}

#[utoipa::path(
    put,
    path = "/api/v1/menu/{id}/price",
    params(("id" = Uuid, Path, description = "Menu item id")),
    request_body = SetPriceRequest,
    responses(
        (status = 200, description = "Price updated", body = ApiResponse<MenuItemResponse>),
        (status = 400, description = "Negative price", body = crate::errors::ErrorResponse)
    ),
    tag = "Menu"
)]
pub async fn set_price(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(request): Json<SetPriceRequest>,
) -> Result<Json<ApiResponse<MenuItemResponse>>, ServiceError> {
    let item = state.services.menu.set_price(item_id, request.price).await?;
    Ok(Json(ApiResponse::success(item.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/menu/{id}/availability",
    params(("id" = Uuid, Path, description = "Menu item id")),
    request_body = SetAvailabilityRequest,
    responses(
        (status = 200, description = "Availability updated", body = ApiResponse<MenuItemResponse>),
        (status = 404, description = "Menu item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Menu"
)]
pub async fn set_availability(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(request): Json<SetAvailabilityRequest>,
) -> Result<Json<ApiResponse<MenuItemResponse>>, ServiceError> {
    let item = state
        .services
        .menu
        .set_availability(item_id, request.available)
        .await?;
    Ok(Json(ApiResponse::success(item.into())))
}
