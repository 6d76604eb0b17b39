pub mod analytics;
pub mod health;
pub mod inventory;
pub mod menu;
pub mod orders;
pub mod tables;

use crate::db::DbPool;
use crate::events::EventSender;
use axum::Router;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub tables: Arc<crate::services::tables::TableService>,
    pub menu: Arc<crate::services::menu::MenuService>,
    pub inventory: Arc<crate::services::inventory::InventoryService>,
    pub orders: Arc<crate::services::orders::OrderService>,
    pub analytics: Arc<crate::services::analytics::AnalyticsService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let tables = Arc::new(crate::services::tables::TableService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let menu = Arc::new(crate::services::menu::MenuService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let inventory = Arc::new(crate::services::inventory::InventoryService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let orders = Arc::new(crate::services::orders::OrderService::new(
            db_pool.clone(),
            event_sender,
            tables.clone(),
            inventory.clone(),
        ));
        let analytics = Arc::new(crate::services::analytics::AnalyticsService::new(db_pool));

        Self {
            tables,
            menu,
            inventory,
            orders,
            analytics,
        }
    }
}

/// All versioned API routes, nested under `/api/v1` by the caller.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/tables", tables::table_routes())
        .nest("/orders", orders::order_routes())
        .nest("/menu", menu::menu_routes())
        .nest("/inventory", inventory::inventory_routes())
        .nest("/analytics", analytics::analytics_routes())
}
