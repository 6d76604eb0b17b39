use serde::Serialize;
use uuid::Uuid;

use crate::services::orders::OrderSnapshot;

/// Explicit view state for a point-of-sale client driving this API.
///
/// Kept out of the ordering service (it is a presentation concern), but
/// modeled as a tagged variant so a client cannot reach an undefined
/// combination: a confirmation view without an order snapshot is
/// unrepresentable.
///
/// Transitions:
/// `TableSelection → Menu → OrderConfirmed → Menu (edit more) | TableSelection (new order)`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum PosView {
    TableSelection,
    Menu {
        table_id: Uuid,
        active_order_id: Option<Uuid>,
    },
    OrderConfirmed {
        table_id: Uuid,
        snapshot: OrderSnapshot,
    },
}

impl PosView {
    pub fn new() -> Self {
        PosView::TableSelection
    }

    /// A table was selected from the floor view.
    pub fn table_selected(self, table_id: Uuid, active_order_id: Option<Uuid>) -> Option<Self> {
        match self {
            PosView::TableSelection => Some(PosView::Menu {
                table_id,
                active_order_id,
            }),
            _ => None,
        }
    }

    /// A submission succeeded and produced a canonical snapshot.
    pub fn order_confirmed(self, snapshot: OrderSnapshot) -> Option<Self> {
        match self {
            PosView::Menu { table_id, .. } => Some(PosView::OrderConfirmed { table_id, snapshot }),
            _ => None,
        }
    }

    /// "Add more items": return to the menu keeping the confirmed order
    /// active for follow-up edits.
    pub fn add_more_items(self) -> Option<Self> {
        match self {
            PosView::OrderConfirmed { table_id, snapshot } => Some(PosView::Menu {
                table_id,
                active_order_id: Some(snapshot.order.id),
            }),
            _ => None,
        }
    }

    /// "New order": back to the floor, dropping all table-bound state.
    pub fn new_order(self) -> Option<Self> {
        match self {
            PosView::OrderConfirmed { .. } | PosView::Menu { .. } => Some(PosView::TableSelection),
            PosView::TableSelection => None,
        }
    }
}

impl Default for PosView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::order::{self, OrderStatus, PaymentMethod, PaymentStatus};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn snapshot(order_id: Uuid, table_id: Uuid) -> OrderSnapshot {
        OrderSnapshot {
            order: order::Model {
                id: order_id,
                table_id,
                status: OrderStatus::Pending,
                payment_status: PaymentStatus::Pending,
                payment_method: Some(PaymentMethod::Cash),
                total_amount: dec!(250.00),
                created_at: Utc::now(),
                updated_at: None,
            },
            items: Vec::new(),
        }
    }

    #[test]
    fn happy_path_walks_all_states() {
        let table_id = Uuid::from_u128(1);
        let order_id = Uuid::from_u128(2);

        let view = PosView::new()
            .table_selected(table_id, None)
            .expect("selecting a table from the floor is defined");
        let view = view
            .order_confirmed(snapshot(order_id, table_id))
            .expect("confirming from the menu is defined");

        match &view {
            PosView::OrderConfirmed { snapshot, .. } => {
                assert_eq!(snapshot.order.id, order_id);
            }
            other => panic!("unexpected view: {other:?}"),
        }

        let view = view.add_more_items().expect("add-more-items is defined");
        match view {
            PosView::Menu {
                active_order_id, ..
            } => assert_eq!(active_order_id, Some(order_id)),
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn new_order_returns_to_table_selection() {
        let table_id = Uuid::from_u128(1);
        let view = PosView::new()
            .table_selected(table_id, None)
            .and_then(|v| v.order_confirmed(snapshot(Uuid::from_u128(2), table_id)))
            .and_then(PosView::new_order)
            .expect("new-order from confirmation is defined");
        assert!(matches!(view, PosView::TableSelection));
    }

    #[test]
    fn undefined_transitions_are_rejected() {
        // Cannot confirm an order straight from the floor view.
        assert!(PosView::new()
            .order_confirmed(snapshot(Uuid::from_u128(2), Uuid::from_u128(1)))
            .is_none());
        // Cannot leave the floor view via new-order.
        assert!(PosView::new().new_order().is_none());
        // Cannot add more items without a confirmed order.
        assert!(PosView::new().add_more_items().is_none());
    }
}
