use crate::{
    entities::dining_table::{self, TableStatus},
    entities::menu_item::{self, Entity as MenuItemEntity},
    entities::order::{
        self, Entity as OrderEntity, OrderStatus, PaymentMethod, PaymentStatus,
    },
    entities::order_line_item::{self, Entity as OrderLineItemEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::cart::{self, Cart, CartEntry, RawLine},
    services::inventory::InventoryService,
    services::tables::TableService,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::try_join_all;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Working state for one table's ordering flow, produced by
/// [`OrderService::select_table`]. The caller holds this between the table
/// pick and submission; the cart inside is mutated purely in memory.
#[derive(Debug, Clone)]
pub struct TableSession {
    pub table: dining_table::Model,
    pub active_order: Option<order::Model>,
    pub cart: Cart,
    /// True when the pending-order lookup failed and the session fell back
    /// to an empty cart. The flow stays usable; a duplicate order is the
    /// accepted worst case.
    pub degraded: bool,
}

/// The canonical, store-derived view of an order after a write: the order
/// row plus its line items collapsed to one entry per menu item for display
/// and receipt generation.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSnapshot {
    pub order: order::Model,
    pub items: Vec<CartEntry>,
}

impl OrderSnapshot {
    /// The persisted order total. Authoritative: always written from a
    /// post-write aggregation over the stored line items, never from a
    /// client-computed figure.
    pub fn display_total(&self) -> Decimal {
        self.order.total_amount
    }

    /// Sum of the merged line subtotals; the display fallback for callers
    /// that cannot use the persisted total.
    pub fn merged_total(&self) -> Decimal {
        self.items.iter().map(|i| i.subtotal).sum()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitOrderRequest {
    pub table_id: Uuid,
    /// The active pending order from the session, when one exists.
    pub order_id: Option<Uuid>,
    pub entries: Vec<CartEntry>,
    /// Must be chosen anew for every submission; a previous submission's
    /// selection does not carry over.
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub table_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<order::Model> for OrderResponse {
    fn from(model: order::Model) -> Self {
        Self {
            id: model.id,
            table_id: model.table_id,
            status: model.status,
            payment_status: model.payment_status,
            payment_method: model.payment_method,
            total_amount: model.total_amount,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderSnapshotResponse {
    pub order: OrderResponse,
    pub items: Vec<CartEntry>,
    pub total: Decimal,
}

impl From<OrderSnapshot> for OrderSnapshotResponse {
    fn from(snapshot: OrderSnapshot) -> Self {
        let total = snapshot.display_total();
        Self {
            order: snapshot.order.into(),
            items: snapshot.items,
            total,
        }
    }
}

/// Advisory, process-local re-entrancy guard for one table's submission.
/// Released on drop, which covers every exit path of the submission routine.
pub struct SubmissionGuard {
    table_id: Uuid,
    submissions: Arc<DashMap<Uuid, ()>>,
}

impl Drop for SubmissionGuard {
    fn drop(&mut self) {
        self.submissions.remove(&self.table_id);
    }
}

/// The order reconciliation engine: resolves a table's pending order into a
/// working cart and synchronizes the cart back into a consistent order on
/// submission.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    tables: Arc<TableService>,
    inventory: Arc<InventoryService>,
    submissions: Arc<DashMap<Uuid, ()>>,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        tables: Arc<TableService>,
        inventory: Arc<InventoryService>,
    ) -> Self {
        Self {
            db,
            event_sender,
            tables,
            inventory,
            submissions: Arc::new(DashMap::new()),
        }
    }

    /// Claims the submission slot for a table. `None` means a submission is
    /// already in flight in this process. The returned guard releases the
    /// slot on drop. Local only: two different processes can still submit
    /// for the same table concurrently.
    pub fn try_begin_submission(&self, table_id: Uuid) -> Option<SubmissionGuard> {
        use dashmap::mapref::entry::Entry;

        match self.submissions.entry(table_id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(SubmissionGuard {
                    table_id,
                    submissions: self.submissions.clone(),
                })
            }
        }
    }

    /// Resolves whether a pending order exists for the table and initializes
    /// the working cart from it.
    ///
    /// A failed pending-order lookup degrades to an empty cart instead of
    /// blocking the flow: an ordering screen that cannot render because of a
    /// transient read failure is worse than one that risks starting a
    /// duplicate order.
    #[instrument(skip(self), fields(table_id = %table_id))]
    pub async fn select_table(&self, table_id: Uuid) -> Result<TableSession, ServiceError> {
        let table = self.tables.get_table(table_id).await?;

        match self.load_pending_order(table_id).await {
            Ok(Some((active_order, lines))) => {
                let cart = Cart::from_lines(lines);
                info!(
                    order_id = %active_order.id,
                    items = cart.len(),
                    "resumed pending order for table"
                );
                Ok(TableSession {
                    table,
                    active_order: Some(active_order),
                    cart,
                    degraded: false,
                })
            }
            Ok(None) => Ok(TableSession {
                table,
                active_order: None,
                cart: Cart::new(),
                degraded: false,
            }),
            Err(err) => {
                warn!(
                    error = %err,
                    table_id = %table_id,
                    "pending order lookup failed; continuing with an empty cart"
                );
                Ok(TableSession {
                    table,
                    active_order: None,
                    cart: Cart::new(),
                    degraded: true,
                })
            }
        }
    }

    /// Synchronizes the submitted cart into a durable order.
    ///
    /// The client-side total is only a write hint for the order row; after
    /// the line-item writes complete, the total is re-derived by summing the
    /// subtotals actually persisted and written back. Line-item writes are
    /// partitioned by back-reference: entries carrying one overwrite their
    /// row in place, the rest insert fresh rows, which keeps a retry after a
    /// partial failure idempotent per item. Nothing already written is
    /// retracted on failure; a later `select_table` surfaces whatever state
    /// the order was left in.
    #[instrument(skip(self, request), fields(table_id = %request.table_id))]
    pub async fn submit_order(
        &self,
        request: SubmitOrderRequest,
    ) -> Result<OrderSnapshot, ServiceError> {
        if request.entries.is_empty() {
            return Err(ServiceError::ValidationError("Cart is empty".to_string()));
        }
        if request.entries.iter().any(|e| e.quantity <= 0) {
            return Err(ServiceError::ValidationError(
                "Line quantities must be positive".to_string(),
            ));
        }
        let Some(payment_method) = request.payment_method else {
            return Err(ServiceError::ValidationError(
                "A payment method must be selected before placing the order".to_string(),
            ));
        };

        let _guard = self
            .try_begin_submission(request.table_id)
            .ok_or(ServiceError::SubmissionInProgress(request.table_id))?;

        let client_total: Decimal = request.entries.iter().map(CartEntry::line_total).sum();
        let now = Utc::now();

        let (order_id, is_new_order) = match request.order_id {
            None => {
                let order_id = Uuid::new_v4();
                let model = order::ActiveModel {
                    id: Set(order_id),
                    table_id: Set(request.table_id),
                    status: Set(OrderStatus::Pending),
                    payment_status: Set(PaymentStatus::Pending),
                    payment_method: Set(Some(payment_method)),
                    total_amount: Set(client_total),
                    created_at: Set(now),
                    updated_at: Set(None),
                };
                model.insert(&*self.db).await?;

                self.tables
                    .set_status(request.table_id, TableStatus::Occupied)
                    .await?;
                self.event_sender
                    .send_or_log(Event::OrderCreated(order_id))
                    .await;
                info!(order_id = %order_id, "order created");
                (order_id, true)
            }
            Some(order_id) => {
                let existing = OrderEntity::find_by_id(order_id)
                    .one(&*self.db)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Order {} not found", order_id))
                    })?;

                let mut active: order::ActiveModel = existing.into();
                active.payment_method = Set(Some(payment_method));
                active.total_amount = Set(client_total);
                active.updated_at = Set(Some(now));
                active.update(&*self.db).await?;
                (order_id, false)
            }
        };

        // Fan the line-item writes out; the total recomputation below must
        // not start until every write has landed.
        let writes = request.entries.iter().map(|entry| {
            let db = self.db.clone();
            let entry = entry.clone();
            async move { sync_line_item(&db, order_id, &entry).await }
        });
        try_join_all(writes).await?;

        if is_new_order {
            let demands: Vec<(Uuid, i32)> = request
                .entries
                .iter()
                .map(|e| (e.menu_item_id, e.quantity))
                .collect();
            self.inventory.deduct_for_order(&demands).await?;
        }

        // Re-derive the total from what the store actually holds.
        let persisted = OrderLineItemEntity::find()
            .filter(order_line_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;
        let authoritative_total: Decimal = persisted.iter().map(|line| line.subtotal).sum();

        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
        let mut active: order::ActiveModel = order.into();
        active.total_amount = Set(authoritative_total);
        active.payment_method = Set(Some(payment_method));
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;

        let snapshot = self.get_snapshot(order_id).await?;

        self.event_sender
            .send_or_log(Event::OrderSubmitted {
                order_id,
                total: snapshot.order.total_amount,
            })
            .await;
        info!(
            order_id = %order_id,
            total = %snapshot.order.total_amount,
            new_order = is_new_order,
            "order submitted"
        );

        Ok(snapshot)
    }

    /// Fetches the canonical snapshot: the order row plus its line items
    /// merged to one entry per menu item. Repeated "add more items" cycles
    /// can leave several rows for the same item; the merge collapses them
    /// for display rather than enforcing uniqueness at write time.
    pub async fn get_snapshot(&self, order_id: Uuid) -> Result<OrderSnapshot, ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let lines = self.load_line_rows(order_id).await?;
        let items = cart::normalize(lines);

        Ok(OrderSnapshot { order, items })
    }

    /// Moves an order out of (or back into) the pending state. Leaving the
    /// pending state frees the table.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let old_status = order.status;
        let table_id = order.table_id;

        let mut active: order::ActiveModel = order.into();
        active.status = Set(new_status);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        if old_status == OrderStatus::Pending && new_status != OrderStatus::Pending {
            self.tables.set_status(table_id, TableStatus::Free).await?;
        }

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            })
            .await;

        Ok(updated)
    }

    async fn load_pending_order(
        &self,
        table_id: Uuid,
    ) -> Result<Option<(order::Model, Vec<RawLine>)>, ServiceError> {
        let pending = OrderEntity::find()
            .filter(order::Column::TableId.eq(table_id))
            .filter(order::Column::Status.eq(OrderStatus::Pending))
            .order_by_asc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        if pending.len() > 1 {
            // Invariant violation from a concurrent session; take the first
            // rather than blocking the flow.
            warn!(
                table_id = %table_id,
                count = pending.len(),
                "multiple pending orders for table"
            );
        }

        let Some(order) = pending.into_iter().next() else {
            return Ok(None);
        };

        let lines = self.load_line_rows(order.id).await?;
        Ok(Some((order, lines)))
    }

    /// Loads an order's line items joined with their menu item names, in
    /// creation order, as raw lines ready for normalization.
    async fn load_line_rows(&self, order_id: Uuid) -> Result<Vec<RawLine>, ServiceError> {
        let items = OrderLineItemEntity::find()
            .filter(order_line_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_line_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let menu_ids: Vec<Uuid> = items.iter().map(|i| i.menu_item_id).collect();
        let names: HashMap<Uuid, String> = if menu_ids.is_empty() {
            HashMap::new()
        } else {
            MenuItemEntity::find()
                .filter(menu_item::Column::Id.is_in(menu_ids))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|m| (m.id, m.name))
                .collect()
        };

        Ok(items
            .into_iter()
            .map(|item| RawLine {
                name: names.get(&item.menu_item_id).cloned(),
                menu_item_id: Some(item.menu_item_id),
                unit_price: Some(item.unit_price),
                quantity: item.quantity,
                subtotal: Some(item.subtotal),
                line_item_id: Some(item.id),
            })
            .collect())
    }
}

/// Writes one cart entry into the store. Entries with a back-reference
/// overwrite their persisted row's quantity and subtotal; entries without
/// one (and stale back-references whose row has vanished) insert a fresh
/// row, capturing unit price at this moment.
async fn sync_line_item(
    db: &DatabaseConnection,
    order_id: Uuid,
    entry: &CartEntry,
) -> Result<(), ServiceError> {
    let subtotal = entry.line_total();

    if let Some(line_id) = entry.line_item_id {
        if let Some(existing) = OrderLineItemEntity::find_by_id(line_id).one(db).await? {
            let mut line: order_line_item::ActiveModel = existing.into();
            line.quantity = Set(entry.quantity);
            line.subtotal = Set(subtotal);
            line.updated_at = Set(Some(Utc::now()));
            line.update(db).await?;
            return Ok(());
        }
        warn!(
            line_item_id = %line_id,
            order_id = %order_id,
            "stale line-item back-reference; inserting a fresh row"
        );
    }

    let line = order_line_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        menu_item_id: Set(entry.menu_item_id),
        quantity: Set(entry.quantity),
        unit_price: Set(entry.unit_price),
        subtotal: Set(subtotal),
        ..Default::default()
    };
    line.insert(db).await?;
    Ok(())
}
