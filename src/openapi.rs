use utoipa::OpenApi;

/// Aggregated OpenAPI document for the HTTP surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tableside API",
        description = "Order management for a table-service cafe: table sessions, cart reconciliation, order placement, inventory, and receipts."
    ),
    paths(
        crate::handlers::tables::list_tables,
        crate::handlers::tables::select_table,
        crate::handlers::orders::submit_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::get_receipt,
        crate::handlers::orders::update_order_status,
        crate::handlers::menu::list_menu_items,
        crate::handlers::menu::create_menu_item,
        crate::handlers::menu::update_menu_item,
        crate::handlers::menu::delete_menu_item,
        crate::handlers::menu::set_price,
        crate::handlers::menu::set_availability,
        crate::handlers::inventory::list_ingredients,
        crate::handlers::inventory::restock_ingredient,
        crate::handlers::inventory::set_minimum_stock,
        crate::handlers::inventory::bulk_restock,
        crate::handlers::analytics::get_top_items,
        crate::handlers::analytics::get_dashboard_metrics,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::entities::dining_table::TableStatus,
        crate::entities::order::OrderStatus,
        crate::entities::order::PaymentStatus,
        crate::entities::order::PaymentMethod,
        crate::services::cart::CartEntry,
        crate::services::tables::TableResponse,
        crate::services::orders::OrderResponse,
        crate::services::orders::OrderSnapshotResponse,
        crate::services::orders::SubmitOrderRequest,
        crate::services::menu::CreateMenuItemInput,
        crate::services::menu::UpdateMenuItemInput,
        crate::services::menu::MenuItemResponse,
        crate::services::inventory::StockState,
        crate::services::inventory::IngredientResponse,
        crate::services::analytics::TopItem,
        crate::services::analytics::MetricsPeriod,
        crate::services::analytics::DashboardMetrics,
        crate::handlers::tables::SessionResponse,
        crate::handlers::orders::UpdateOrderStatusRequest,
        crate::handlers::inventory::RestockRequest,
        crate::handlers::inventory::SetMinimumRequest,
        crate::handlers::inventory::BulkRestockResponse,
        crate::handlers::menu::SetPriceRequest,
        crate::handlers::menu::SetAvailabilityRequest,
    ))
)]
pub struct ApiDoc;
