use crate::{
    entities::menu_item::{self, Entity as MenuItemEntity},
    entities::order::{self, Entity as OrderEntity, OrderStatus},
    entities::order_line_item::{self, Entity as OrderLineItemEntity},
    errors::ServiceError,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// Aggregations over completed orders for the dashboard and the "popular
/// this week" panel. Read-only; derived entirely from persisted rows.
#[derive(Clone)]
pub struct AnalyticsService {
    db: Arc<DatabaseConnection>,
}

/// One entry of the top-items ranking.
#[derive(Debug, Serialize, ToSchema)]
pub struct TopItem {
    pub menu_item_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity_ordered: i64,
}

/// Reporting window for dashboard metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MetricsPeriod {
    Today,
    Week,
    Month,
    #[default]
    All,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardMetrics {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub completed_orders: u64,
    pub cancelled_orders: u64,
    /// Revenue over completed orders only.
    pub revenue: Decimal,
    pub average_order_value: Decimal,
}

impl AnalyticsService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Ranks menu items by quantity sold across completed orders in the
    /// trailing `days`-day window, most ordered first.
    #[instrument(skip(self))]
    pub async fn top_items(&self, days: i64, limit: usize) -> Result<Vec<TopItem>, ServiceError> {
        let cutoff = Utc::now() - Duration::days(days);

        let completed = OrderEntity::find()
            .filter(order::Column::Status.eq(OrderStatus::Completed))
            .filter(order::Column::CreatedAt.gte(cutoff))
            .all(&*self.db)
            .await?;

        let order_ids: Vec<Uuid> = completed.iter().map(|o| o.id).collect();
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let lines = OrderLineItemEntity::find()
            .filter(order_line_item::Column::OrderId.is_in(order_ids))
            .all(&*self.db)
            .await?;

        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for line in &lines {
            *counts.entry(line.menu_item_id).or_insert(0) += i64::from(line.quantity);
        }

        let menu_ids: Vec<Uuid> = counts.keys().copied().collect();
        let items: HashMap<Uuid, menu_item::Model> = MenuItemEntity::find()
            .filter(menu_item::Column::Id.is_in(menu_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let mut ranking: Vec<TopItem> = counts
            .into_iter()
            .map(|(menu_item_id, quantity_ordered)| {
                let (name, unit_price) = items
                    .get(&menu_item_id)
                    .map(|m| (m.name.clone(), m.price))
                    .unwrap_or_else(|| {
                        (
                            crate::services::cart::PLACEHOLDER_ITEM_NAME.to_string(),
                            Decimal::ZERO,
                        )
                    });
                TopItem {
                    menu_item_id,
                    name,
                    unit_price,
                    quantity_ordered,
                }
            })
            .collect();

        ranking.sort_by(|a, b| {
            b.quantity_ordered
                .cmp(&a.quantity_ordered)
                .then_with(|| a.name.cmp(&b.name))
        });
        ranking.truncate(limit);

        Ok(ranking)
    }

    /// Order counts and revenue over the requested window. Revenue and the
    /// average order value count completed orders only.
    #[instrument(skip(self))]
    pub async fn dashboard_metrics(
        &self,
        period: MetricsPeriod,
    ) -> Result<DashboardMetrics, ServiceError> {
        let mut query = OrderEntity::find();
        if let Some(cutoff) = period_cutoff(period) {
            query = query.filter(order::Column::CreatedAt.gte(cutoff));
        }
        let orders = query.all(&*self.db).await?;

        let total_orders = orders.len() as u64;
        let pending_orders = orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .count() as u64;
        let cancelled_orders = orders
            .iter()
            .filter(|o| o.status == OrderStatus::Cancelled)
            .count() as u64;

        let completed: Vec<_> = orders
            .iter()
            .filter(|o| o.status == OrderStatus::Completed)
            .collect();
        let completed_orders = completed.len() as u64;
        let revenue: Decimal = completed.iter().map(|o| o.total_amount).sum();
        let average_order_value = if completed_orders == 0 {
            Decimal::ZERO
        } else {
            revenue / Decimal::from(completed_orders)
        };

        Ok(DashboardMetrics {
            total_orders,
            pending_orders,
            completed_orders,
            cancelled_orders,
            revenue,
            average_order_value,
        })
    }
}

fn period_cutoff(period: MetricsPeriod) -> Option<chrono::DateTime<Utc>> {
    let now = Utc::now();
    match period {
        MetricsPeriod::Today => now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|start| start.and_utc()),
        MetricsPeriod::Week => Some(now - Duration::days(7)),
        MetricsPeriod::Month => Some(now - Duration::days(30)),
        MetricsPeriod::All => None,
    }
}
