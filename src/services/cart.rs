use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::menu_item;

/// Name substituted for a line whose menu item record is missing.
pub const PLACEHOLDER_ITEM_NAME: &str = "Item";

/// A raw line record fed into [`normalize`]: either a persisted order line
/// item joined with its menu item, or an unnormalized client payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLine {
    pub menu_item_id: Option<Uuid>,
    pub name: Option<String>,
    pub unit_price: Option<Decimal>,
    pub quantity: i32,
    pub subtotal: Option<Decimal>,
    pub line_item_id: Option<Uuid>,
}

/// One working-cart entry: exactly one per distinct menu item id.
///
/// `line_item_id` is the back-reference to an already persisted order line
/// item. Present: submission updates that row in place. Absent: submission
/// inserts a new row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartEntry {
    pub menu_item_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    /// Line total. Tracks summed persisted subtotals when the entry was
    /// merged from store rows; otherwise `unit_price * quantity`.
    #[serde(default)]
    pub subtotal: Decimal,
    pub line_item_id: Option<Uuid>,
}

impl CartEntry {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Collapse raw line records into one entry per distinct menu item id.
///
/// Scanning in input order, the first record for a given menu item id becomes
/// that id's entry; every later record for the same id adds its quantity and
/// subtotal to the existing entry. Price, display name and the line-item
/// back-reference are taken from the first occurrence. Records with no menu
/// item id are dropped: nothing can be carted without an item identity.
/// Missing names and prices get substitution defaults rather than failing
/// the flow.
pub fn normalize<I>(lines: I) -> Vec<CartEntry>
where
    I: IntoIterator<Item = RawLine>,
{
    let mut entries: Vec<CartEntry> = Vec::new();

    for line in lines {
        let Some(menu_item_id) = line.menu_item_id else {
            continue;
        };
        let unit_price = line.unit_price.unwrap_or(Decimal::ZERO);
        let line_subtotal = line
            .subtotal
            .unwrap_or_else(|| unit_price * Decimal::from(line.quantity));

        match entries.iter_mut().find(|e| e.menu_item_id == menu_item_id) {
            Some(existing) => {
                existing.quantity += line.quantity;
                existing.subtotal += line_subtotal;
            }
            None => entries.push(CartEntry {
                menu_item_id,
                name: line
                    .name
                    .unwrap_or_else(|| PLACEHOLDER_ITEM_NAME.to_string()),
                unit_price,
                quantity: line.quantity,
                subtotal: line_subtotal,
                line_item_id: line.line_item_id,
            }),
        }
    }

    entries
}

/// The client-held working set of line items for a table, before or while
/// synchronizing with a pending order. Purely in-memory; every operation is
/// a total function and none touches the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from raw line records, normalized to one entry per
    /// distinct menu item id.
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = RawLine>,
    {
        Self {
            entries: normalize(lines),
        }
    }

    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<CartEntry> {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Add one unit of a menu item: increments the quantity when the item is
    /// already carted, otherwise appends a fresh entry with quantity 1 and no
    /// line-item back-reference.
    pub fn add(&mut self, item: &menu_item::Model) {
        match self.entries.iter_mut().find(|e| e.menu_item_id == item.id) {
            Some(existing) => {
                existing.quantity += 1;
                existing.subtotal = existing.unit_price * Decimal::from(existing.quantity);
            }
            None => self.entries.push(CartEntry {
                menu_item_id: item.id,
                name: item.name.clone(),
                unit_price: item.price,
                quantity: 1,
                subtotal: item.price,
                line_item_id: None,
            }),
        }
    }

    /// Shift an entry's quantity by `delta`. A resulting quantity of zero or
    /// below removes the entry entirely; quantities never go negative.
    /// Unknown ids are a no-op.
    pub fn adjust_quantity(&mut self, menu_item_id: Uuid, delta: i32) {
        if let Some(pos) = self
            .entries
            .iter()
            .position(|e| e.menu_item_id == menu_item_id)
        {
            let new_quantity = self.entries[pos].quantity + delta;
            if new_quantity <= 0 {
                self.entries.remove(pos);
            } else {
                let entry = &mut self.entries[pos];
                entry.quantity = new_quantity;
                entry.subtotal = entry.unit_price * Decimal::from(new_quantity);
            }
        }
    }

    /// Delete an entry unconditionally. Unknown ids are a no-op.
    pub fn remove(&mut self, menu_item_id: Uuid) {
        self.entries.retain(|e| e.menu_item_id != menu_item_id);
    }

    /// Sum of `unit_price * quantity` over all entries; zero for an empty
    /// cart.
    pub fn total(&self) -> Decimal {
        self.entries.iter().map(CartEntry::line_total).sum()
    }
}
