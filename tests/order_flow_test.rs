mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{
    seed_ingredient, seed_menu_item, seed_recipe_line, seed_table, TestApp,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use std::str::FromStr;
use tableside_api::{
    entities::dining_table::{self, TableStatus},
    entities::menu_item,
    entities::order::{self, OrderStatus, PaymentMethod, PaymentStatus},
    entities::order_line_item,
    errors::ServiceError,
    services::cart::CartEntry,
    services::orders::SubmitOrderRequest,
};
use tower::ServiceExt;
use uuid::Uuid;

fn entry(item: &menu_item::Model, quantity: i32) -> CartEntry {
    CartEntry {
        menu_item_id: item.id,
        name: item.name.clone(),
        unit_price: item.price,
        quantity,
        subtotal: item.price * Decimal::from(quantity),
        line_item_id: None,
    }
}

async fn table_status(app: &TestApp, table_id: Uuid) -> TableStatus {
    dining_table::Entity::find_by_id(table_id)
        .one(&*app.state.db)
        .await
        .expect("query tables")
        .expect("table exists")
        .status
}

async fn line_rows(app: &TestApp, order_id: Uuid) -> Vec<order_line_item::Model> {
    order_line_item::Entity::find()
        .filter(order_line_item::Column::OrderId.eq(order_id))
        .all(&*app.state.db)
        .await
        .expect("query line items")
}

#[tokio::test]
async fn select_table_without_pending_order_yields_empty_cart() {
    let app = TestApp::new().await;
    let table_id = seed_table(&app, 1).await;

    let session = app
        .state
        .services
        .orders
        .select_table(table_id)
        .await
        .expect("select table");

    assert!(session.active_order.is_none());
    assert!(session.cart.is_empty());
    assert!(!session.degraded);
    assert_eq!(session.table.id, table_id);
}

#[tokio::test]
async fn select_table_unknown_id_is_not_found() {
    let app = TestApp::new().await;

    let result = app
        .state
        .services
        .orders
        .select_table(Uuid::new_v4())
        .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn first_submission_creates_order_lines_and_occupies_table() {
    let app = TestApp::new().await;
    let table_id = seed_table(&app, 1).await;
    let item_a = seed_menu_item(&app, "Cappuccino", dec!(100.00)).await;
    let item_b = seed_menu_item(&app, "Croissant", dec!(50.00)).await;

    let snapshot = app
        .state
        .services
        .orders
        .submit_order(SubmitOrderRequest {
            table_id,
            order_id: None,
            entries: vec![entry(&item_a, 2), entry(&item_b, 1)],
            payment_method: Some(PaymentMethod::Cash),
        })
        .await
        .expect("submission succeeds");

    assert_eq!(snapshot.order.table_id, table_id);
    assert_eq!(snapshot.order.status, OrderStatus::Pending);
    assert_eq!(snapshot.order.payment_status, PaymentStatus::Pending);
    assert_eq!(snapshot.order.payment_method, Some(PaymentMethod::Cash));
    assert_eq!(snapshot.order.total_amount, dec!(250.00));

    assert_eq!(snapshot.items.len(), 2);
    let a = snapshot
        .items
        .iter()
        .find(|i| i.menu_item_id == item_a.id)
        .expect("item A in snapshot");
    assert_eq!(a.quantity, 2);
    assert_eq!(a.subtotal, dec!(200.00));
    let b = snapshot
        .items
        .iter()
        .find(|i| i.menu_item_id == item_b.id)
        .expect("item B in snapshot");
    assert_eq!(b.subtotal, dec!(50.00));

    assert_eq!(line_rows(&app, snapshot.order.id).await.len(), 2);
    assert_eq!(table_status(&app, table_id).await, TableStatus::Occupied);
}

#[tokio::test]
async fn selecting_a_table_with_a_pending_order_resumes_its_cart() {
    let app = TestApp::new().await;
    let table_id = seed_table(&app, 1).await;
    let item_a = seed_menu_item(&app, "Cappuccino", dec!(100.00)).await;

    let snapshot = app
        .state
        .services
        .orders
        .submit_order(SubmitOrderRequest {
            table_id,
            order_id: None,
            entries: vec![entry(&item_a, 2)],
            payment_method: Some(PaymentMethod::Card),
        })
        .await
        .expect("submission succeeds");

    let session = app
        .state
        .services
        .orders
        .select_table(table_id)
        .await
        .expect("select table");

    let active = session.active_order.expect("pending order resumed");
    assert_eq!(active.id, snapshot.order.id);
    assert_eq!(session.cart.len(), 1);

    let resumed = &session.cart.entries()[0];
    assert_eq!(resumed.menu_item_id, item_a.id);
    assert_eq!(resumed.quantity, 2);
    assert_eq!(resumed.name, "Cappuccino");
    assert!(resumed.line_item_id.is_some(), "back-reference is retained");
}

#[tokio::test]
async fn follow_up_submission_updates_in_place_and_inserts_new_items() {
    let app = TestApp::new().await;
    let table_id = seed_table(&app, 1).await;
    let item_a = seed_menu_item(&app, "Cappuccino", dec!(100.00)).await;
    let item_c = seed_menu_item(&app, "Biscotti", dec!(20.00)).await;

    app.state
        .services
        .orders
        .submit_order(SubmitOrderRequest {
            table_id,
            order_id: None,
            entries: vec![entry(&item_a, 2)],
            payment_method: Some(PaymentMethod::Cash),
        })
        .await
        .expect("first submission succeeds");

    // Resume the order the way the ordering screen does, then edit locally.
    let session = app
        .state
        .services
        .orders
        .select_table(table_id)
        .await
        .expect("select table");
    let order_id = session.active_order.as_ref().expect("active order").id;
    let line_id = session.cart.entries()[0]
        .line_item_id
        .expect("resumed entry carries its row id");

    let mut cart = session.cart;
    cart.add(&item_a); // now quantity 3, still referencing the same row
    cart.add(&item_c); // brand new item, no back-reference

    let snapshot = app
        .state
        .services
        .orders
        .submit_order(SubmitOrderRequest {
            table_id,
            order_id: Some(order_id),
            entries: cart.into_entries(),
            payment_method: Some(PaymentMethod::Cash),
        })
        .await
        .expect("follow-up submission succeeds");

    let rows = line_rows(&app, order_id).await;
    assert_eq!(rows.len(), 2, "item A updated in place, not re-inserted");

    let row_a = rows
        .iter()
        .find(|r| r.menu_item_id == item_a.id)
        .expect("row for item A");
    assert_eq!(row_a.id, line_id);
    assert_eq!(row_a.quantity, 3);
    assert_eq!(row_a.subtotal, dec!(300.00));

    let row_c = rows
        .iter()
        .find(|r| r.menu_item_id == item_c.id)
        .expect("row for item C");
    assert_eq!(row_c.quantity, 1);

    let persisted_sum: Decimal = rows.iter().map(|r| r.subtotal).sum();
    assert_eq!(snapshot.order.total_amount, persisted_sum);
    assert_eq!(snapshot.order.total_amount, dec!(320.00));
}

#[tokio::test]
async fn stored_total_ignores_client_supplied_subtotals() {
    let app = TestApp::new().await;
    let table_id = seed_table(&app, 1).await;
    let item_a = seed_menu_item(&app, "Cappuccino", dec!(100.00)).await;

    let mut tampered = entry(&item_a, 2);
    tampered.subtotal = dec!(9999.00); // a lying client cache

    let snapshot = app
        .state
        .services
        .orders
        .submit_order(SubmitOrderRequest {
            table_id,
            order_id: None,
            entries: vec![tampered],
            payment_method: Some(PaymentMethod::Cash),
        })
        .await
        .expect("submission succeeds");

    let rows = line_rows(&app, snapshot.order.id).await;
    let persisted_sum: Decimal = rows.iter().map(|r| r.subtotal).sum();
    assert_eq!(persisted_sum, dec!(200.00));
    assert_eq!(snapshot.order.total_amount, persisted_sum);
}

#[tokio::test]
async fn concurrent_submission_for_the_same_table_is_rejected() {
    let app = TestApp::new().await;
    let table_id = seed_table(&app, 1).await;
    let item_a = seed_menu_item(&app, "Cappuccino", dec!(100.00)).await;

    let orders = app.state.services.orders.clone();
    let guard = orders
        .try_begin_submission(table_id)
        .expect("slot is free initially");

    let rejected = orders
        .submit_order(SubmitOrderRequest {
            table_id,
            order_id: None,
            entries: vec![entry(&item_a, 1)],
            payment_method: Some(PaymentMethod::Cash),
        })
        .await;
    assert!(matches!(
        rejected,
        Err(ServiceError::SubmissionInProgress(id)) if id == table_id
    ));

    // No side effects from the rejected call.
    let orders_in_store = order::Entity::find().all(&*app.state.db).await.unwrap();
    assert!(orders_in_store.is_empty());

    drop(guard);

    orders
        .submit_order(SubmitOrderRequest {
            table_id,
            order_id: None,
            entries: vec![entry(&item_a, 1)],
            payment_method: Some(PaymentMethod::Cash),
        })
        .await
        .expect("slot released on drop; submission succeeds");

    let orders_in_store = order::Entity::find().all(&*app.state.db).await.unwrap();
    assert_eq!(orders_in_store.len(), 1, "exactly one order created");
}

#[tokio::test]
async fn validation_rejections_touch_nothing() {
    let app = TestApp::new().await;
    let table_id = seed_table(&app, 1).await;
    let item_a = seed_menu_item(&app, "Cappuccino", dec!(100.00)).await;

    let empty_cart = app
        .state
        .services
        .orders
        .submit_order(SubmitOrderRequest {
            table_id,
            order_id: None,
            entries: vec![],
            payment_method: Some(PaymentMethod::Cash),
        })
        .await;
    assert!(matches!(empty_cart, Err(ServiceError::ValidationError(_))));

    let no_payment = app
        .state
        .services
        .orders
        .submit_order(SubmitOrderRequest {
            table_id,
            order_id: None,
            entries: vec![entry(&item_a, 1)],
            payment_method: None,
        })
        .await;
    assert!(matches!(no_payment, Err(ServiceError::ValidationError(_))));

    assert!(order::Entity::find()
        .all(&*app.state.db)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(table_status(&app, table_id).await, TableStatus::Free);
}

#[tokio::test]
async fn ingredients_deduct_on_creation_only_and_shortfalls_are_skipped() {
    let app = TestApp::new().await;
    let table_id = seed_table(&app, 1).await;
    let item_a = seed_menu_item(&app, "Cappuccino", dec!(100.00)).await;

    // 5 units of beans per cappuccino; plenty of beans, almost no milk.
    let beans = seed_ingredient(&app, "Beans", dec!(100), dec!(10)).await;
    let milk = seed_ingredient(&app, "Milk", dec!(3), dec!(10)).await;
    seed_recipe_line(&app, item_a.id, beans, dec!(5)).await;
    seed_recipe_line(&app, item_a.id, milk, dec!(5)).await;

    let snapshot = app
        .state
        .services
        .orders
        .submit_order(SubmitOrderRequest {
            table_id,
            order_id: None,
            entries: vec![entry(&item_a, 2)],
            payment_method: Some(PaymentMethod::Cash),
        })
        .await
        .expect("shortfall must not block the order");

    let beans_stock = app
        .state
        .services
        .inventory
        .get_ingredient(beans)
        .await
        .unwrap()
        .stock_quantity;
    let milk_stock = app
        .state
        .services
        .inventory
        .get_ingredient(milk)
        .await
        .unwrap()
        .stock_quantity;
    assert_eq!(beans_stock, dec!(90), "2 x 5 units deducted");
    assert_eq!(milk_stock, dec!(3), "deduction that would go negative is skipped");

    // A follow-up submission updates the order without deducting again.
    let session = app
        .state
        .services
        .orders
        .select_table(table_id)
        .await
        .unwrap();
    let mut cart = session.cart;
    cart.add(&item_a);

    app.state
        .services
        .orders
        .submit_order(SubmitOrderRequest {
            table_id,
            order_id: Some(snapshot.order.id),
            entries: cart.into_entries(),
            payment_method: Some(PaymentMethod::Cash),
        })
        .await
        .expect("follow-up submission succeeds");

    let beans_stock_after = app
        .state
        .services
        .inventory
        .get_ingredient(beans)
        .await
        .unwrap()
        .stock_quantity;
    assert_eq!(beans_stock_after, dec!(90), "no deduction on update");
}

#[tokio::test]
async fn stale_back_reference_falls_through_to_an_insert() {
    let app = TestApp::new().await;
    let table_id = seed_table(&app, 1).await;
    let item_a = seed_menu_item(&app, "Cappuccino", dec!(100.00)).await;

    let mut stale = entry(&item_a, 2);
    stale.line_item_id = Some(Uuid::new_v4()); // row never existed

    let snapshot = app
        .state
        .services
        .orders
        .submit_order(SubmitOrderRequest {
            table_id,
            order_id: None,
            entries: vec![stale],
            payment_method: Some(PaymentMethod::Cash),
        })
        .await
        .expect("submission succeeds");

    let rows = line_rows(&app, snapshot.order.id).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quantity, 2);
    assert_eq!(snapshot.order.total_amount, dec!(200.00));
}

#[tokio::test]
async fn duplicate_rows_from_repeated_cycles_merge_in_the_snapshot() {
    let app = TestApp::new().await;
    let table_id = seed_table(&app, 1).await;
    let item_a = seed_menu_item(&app, "Cappuccino", dec!(100.00)).await;

    let first = app
        .state
        .services
        .orders
        .submit_order(SubmitOrderRequest {
            table_id,
            order_id: None,
            entries: vec![entry(&item_a, 2)],
            payment_method: Some(PaymentMethod::Cash),
        })
        .await
        .expect("first submission succeeds");

    // A client that lost the back-reference re-adds the same item: a second
    // row accumulates for it, which the snapshot merges for display.
    let second = app
        .state
        .services
        .orders
        .submit_order(SubmitOrderRequest {
            table_id,
            order_id: Some(first.order.id),
            entries: vec![entry(&item_a, 2)],
            payment_method: Some(PaymentMethod::Cash),
        })
        .await
        .expect("second submission succeeds");

    assert_eq!(line_rows(&app, first.order.id).await.len(), 2);
    assert_eq!(second.items.len(), 1, "display merge collapses duplicates");
    assert_eq!(second.items[0].quantity, 4);
    assert_eq!(second.items[0].subtotal, dec!(400.00));
    assert_eq!(second.order.total_amount, dec!(400.00));
    assert_eq!(second.merged_total(), second.order.total_amount);
}

#[tokio::test]
async fn http_submit_flow_returns_envelope_snapshot_and_receipt() {
    let app = TestApp::new().await;
    let table_id = seed_table(&app, 4).await;
    let item_a = seed_menu_item(&app, "Cappuccino", dec!(100.00)).await;
    let item_b = seed_menu_item(&app, "Croissant", dec!(50.00)).await;

    // Open a session for the table.
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/tables/{table_id}/session"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Submit the cart.
    let payload = serde_json::json!({
        "table_id": table_id,
        "order_id": null,
        "entries": [
            {
                "menu_item_id": item_a.id,
                "name": item_a.name,
                "unit_price": "100.00",
                "quantity": 2
            },
            {
                "menu_item_id": item_b.id,
                "name": item_b.name,
                "unit_price": "50.00",
                "quantity": 1
            }
        ],
        "payment_method": "cash"
    });

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/orders/submit")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], true);

    let total = Decimal::from_str(body["data"]["total"].as_str().expect("total is a string"))
        .expect("total parses");
    assert_eq!(total, dec!(250.00));
    let order_id = body["data"]["order"]["id"].as_str().unwrap().to_string();

    // And the text receipt renders from the same snapshot.
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/orders/{order_id}/receipt"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let receipt = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(receipt.contains("Table: 4"));
    assert!(receipt.contains("Payment: CASH"));
    assert!(receipt.contains("BDT 250.00"));
}

#[tokio::test]
async fn http_submit_conflicts_while_a_submission_is_in_flight() {
    let app = TestApp::new().await;
    let table_id = seed_table(&app, 1).await;
    let item_a = seed_menu_item(&app, "Cappuccino", dec!(100.00)).await;

    let _guard = app
        .state
        .services
        .orders
        .try_begin_submission(table_id)
        .expect("slot is free initially");

    let payload = serde_json::json!({
        "table_id": table_id,
        "entries": [
            {
                "menu_item_id": item_a.id,
                "name": item_a.name,
                "unit_price": "100.00",
                "quantity": 1
            }
        ],
        "payment_method": "cash"
    });

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/orders/submit")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}
