use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::dining_table::TableStatus;
use crate::entities::order::OrderStatus;

/// Events emitted by the service layer as durable writes complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order events
    OrderCreated(Uuid),
    OrderSubmitted {
        order_id: Uuid,
        total: Decimal,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },

    // Table events
    TableStatusChanged {
        table_id: Uuid,
        status: TableStatus,
    },

    // Menu events
    MenuItemCreated(Uuid),
    MenuItemUpdated(Uuid),
    MenuItemDeleted(Uuid),

    // Inventory events
    IngredientRestocked {
        ingredient_id: Uuid,
        new_stock: Decimal,
    },
    IngredientStockLow {
        ingredient_id: Uuid,
        stock: Decimal,
        minimum: Decimal,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, downgrading a closed channel to a warning. Event
    /// delivery is best-effort; losing one must never fail the write that
    /// produced it.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(err) = self.send(event).await {
            warn!("{err}");
        }
    }
}

/// Background consumer for the event channel. Currently logs every event;
/// low-stock events are raised at warn level so they surface in default
/// filters.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::IngredientStockLow {
                ingredient_id,
                stock,
                minimum,
            } => {
                warn!(
                    ingredient_id = %ingredient_id,
                    stock = %stock,
                    minimum = %minimum,
                    "ingredient stock at or below minimum"
                );
            }
            other => info!(event = ?other, "event processed"),
        }
    }
    info!("event channel closed; processor exiting");
}
