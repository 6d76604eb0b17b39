mod common;

use chrono::{Duration, Utc};
use common::{seed_line_item, seed_menu_item, seed_order, seed_table, TestApp};
use rust_decimal_macros::dec;
use tableside_api::{entities::order::OrderStatus, services::analytics::MetricsPeriod};

#[tokio::test]
async fn top_items_ranks_by_quantity_sold_within_the_window() {
    let app = TestApp::new().await;
    let table_id = seed_table(&app, 1).await;
    let item_a = seed_menu_item(&app, "Cappuccino", dec!(100.00)).await;
    let item_b = seed_menu_item(&app, "Croissant", dec!(50.00)).await;
    let item_c = seed_menu_item(&app, "Biscotti", dec!(20.00)).await;

    let now = Utc::now();

    let completed_1 = seed_order(&app, table_id, OrderStatus::Completed, dec!(600), now).await;
    seed_line_item(&app, completed_1, item_a.id, 5, dec!(100.00)).await;
    seed_line_item(&app, completed_1, item_b.id, 2, dec!(50.00)).await;

    let completed_2 = seed_order(&app, table_id, OrderStatus::Completed, dec!(200), now).await;
    seed_line_item(&app, completed_2, item_b.id, 4, dec!(50.00)).await;

    // Pending orders don't count toward popularity.
    let pending = seed_order(&app, table_id, OrderStatus::Pending, dec!(200), now).await;
    seed_line_item(&app, pending, item_c.id, 10, dec!(20.00)).await;

    // Neither do completed orders outside the trailing window.
    let stale = seed_order(
        &app,
        table_id,
        OrderStatus::Completed,
        dec!(5000),
        now - Duration::days(40),
    )
    .await;
    seed_line_item(&app, stale, item_a.id, 50, dec!(100.00)).await;

    let ranking = app
        .state
        .services
        .analytics
        .top_items(7, 3)
        .await
        .expect("top items query succeeds");

    assert_eq!(ranking.len(), 2);
    assert_eq!(ranking[0].menu_item_id, item_b.id);
    assert_eq!(ranking[0].quantity_ordered, 6);
    assert_eq!(ranking[1].menu_item_id, item_a.id);
    assert_eq!(ranking[1].quantity_ordered, 5);

    let capped = app
        .state
        .services
        .analytics
        .top_items(7, 1)
        .await
        .expect("top items query succeeds");
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0].menu_item_id, item_b.id);
}

#[tokio::test]
async fn top_items_with_no_completed_orders_is_empty() {
    let app = TestApp::new().await;
    let table_id = seed_table(&app, 1).await;
    let item = seed_menu_item(&app, "Cappuccino", dec!(100.00)).await;
    let pending = seed_order(&app, table_id, OrderStatus::Pending, dec!(100), Utc::now()).await;
    seed_line_item(&app, pending, item.id, 1, dec!(100.00)).await;

    let ranking = app
        .state
        .services
        .analytics
        .top_items(7, 3)
        .await
        .expect("top items query succeeds");
    assert!(ranking.is_empty());
}

#[tokio::test]
async fn dashboard_metrics_aggregate_by_window() {
    let app = TestApp::new().await;
    let table_id = seed_table(&app, 1).await;
    let now = Utc::now();

    seed_order(&app, table_id, OrderStatus::Completed, dec!(100), now).await;
    seed_order(&app, table_id, OrderStatus::Completed, dec!(50), now).await;
    seed_order(&app, table_id, OrderStatus::Pending, dec!(70), now).await;
    seed_order(&app, table_id, OrderStatus::Cancelled, dec!(30), now).await;
    seed_order(
        &app,
        table_id,
        OrderStatus::Completed,
        dec!(150),
        now - Duration::days(40),
    )
    .await;

    let all = app
        .state
        .services
        .analytics
        .dashboard_metrics(MetricsPeriod::All)
        .await
        .expect("metrics query succeeds");
    assert_eq!(all.total_orders, 5);
    assert_eq!(all.pending_orders, 1);
    assert_eq!(all.completed_orders, 3);
    assert_eq!(all.cancelled_orders, 1);
    assert_eq!(all.revenue, dec!(300));
    assert_eq!(all.average_order_value, dec!(100));

    let week = app
        .state
        .services
        .analytics
        .dashboard_metrics(MetricsPeriod::Week)
        .await
        .expect("metrics query succeeds");
    assert_eq!(week.total_orders, 4);
    assert_eq!(week.completed_orders, 2);
    assert_eq!(week.revenue, dec!(150));
    assert_eq!(week.average_order_value, dec!(75));
}

#[tokio::test]
async fn dashboard_metrics_with_no_completed_orders_average_is_zero() {
    let app = TestApp::new().await;
    let table_id = seed_table(&app, 1).await;
    seed_order(&app, table_id, OrderStatus::Pending, dec!(70), Utc::now()).await;

    let metrics = app
        .state
        .services
        .analytics
        .dashboard_metrics(MetricsPeriod::All)
        .await
        .expect("metrics query succeeds");

    assert_eq!(metrics.completed_orders, 0);
    assert_eq!(metrics.revenue, dec!(0));
    assert_eq!(metrics.average_order_value, dec!(0));
}
