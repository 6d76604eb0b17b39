#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use tableside_api::{
    app_router,
    config::AppConfig,
    db::{self, DbConfig},
    entities::{dining_table, ingredient, menu_item, menu_item_ingredient, order, order_line_item},
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Helper harness spinning up application state backed by an in-memory
/// SQLite database. One connection only: every handle sees the same
/// in-memory database.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );

        let db_config = DbConfig {
            url: cfg.database_url().to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_config)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()));
        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        Self {
            router: app_router(state.clone()),
            state,
            _event_task: event_task,
        }
    }
}

/// Seed a free dining table and return its id.
pub async fn seed_table(app: &TestApp, table_number: i32) -> Uuid {
    let table_id = Uuid::new_v4();
    let table = dining_table::ActiveModel {
        id: Set(table_id),
        table_number: Set(table_number),
        capacity: Set(4),
        status: Set(dining_table::TableStatus::Free),
    };
    table
        .insert(&*app.state.db)
        .await
        .expect("failed to seed table");
    table_id
}

/// Seed an available menu item and return the model.
pub async fn seed_menu_item(app: &TestApp, name: &str, price: Decimal) -> menu_item::Model {
    let item = menu_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(None),
        price: Set(price),
        category: Set(None),
        available: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    };
    item.insert(&*app.state.db)
        .await
        .expect("failed to seed menu item")
}

/// Seed an ingredient with the given stock and minimum; returns its id.
pub async fn seed_ingredient(
    app: &TestApp,
    name: &str,
    stock: Decimal,
    minimum: Decimal,
) -> Uuid {
    let ingredient_id = Uuid::new_v4();
    let row = ingredient::ActiveModel {
        id: Set(ingredient_id),
        name: Set(name.to_string()),
        unit: Set("g".to_string()),
        stock_quantity: Set(stock),
        minimum_stock: Set(minimum),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    };
    row.insert(&*app.state.db)
        .await
        .expect("failed to seed ingredient");
    ingredient_id
}

/// Seed a recipe line linking a menu item to an ingredient.
pub async fn seed_recipe_line(
    app: &TestApp,
    menu_item_id: Uuid,
    ingredient_id: Uuid,
    quantity_required: Decimal,
) {
    let row = menu_item_ingredient::ActiveModel {
        id: Set(Uuid::new_v4()),
        menu_item_id: Set(menu_item_id),
        ingredient_id: Set(ingredient_id),
        quantity_required: Set(quantity_required),
    };
    row.insert(&*app.state.db)
        .await
        .expect("failed to seed recipe line");
}

/// Seed an order row directly, bypassing the service, for historical data.
pub async fn seed_order(
    app: &TestApp,
    table_id: Uuid,
    status: order::OrderStatus,
    total: Decimal,
    created_at: DateTime<Utc>,
) -> Uuid {
    let order_id = Uuid::new_v4();
    let row = order::ActiveModel {
        id: Set(order_id),
        table_id: Set(table_id),
        status: Set(status),
        payment_status: Set(order::PaymentStatus::Pending),
        payment_method: Set(Some(order::PaymentMethod::Cash)),
        total_amount: Set(total),
        created_at: Set(created_at),
        updated_at: Set(None),
    };
    row.insert(&*app.state.db)
        .await
        .expect("failed to seed order");
    order_id
}

/// Seed a persisted line item row; returns its id.
pub async fn seed_line_item(
    app: &TestApp,
    order_id: Uuid,
    menu_item_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
) -> Uuid {
    let line_id = Uuid::new_v4();
    let row = order_line_item::ActiveModel {
        id: Set(line_id),
        order_id: Set(order_id),
        menu_item_id: Set(menu_item_id),
        quantity: Set(quantity),
        unit_price: Set(unit_price),
        subtotal: Set(unit_price * Decimal::from(quantity)),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    };
    row.insert(&*app.state.db)
        .await
        .expect("failed to seed line item");
    line_id
}
