use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::order::PaymentMethod;
use crate::services::orders::OrderSnapshot;

const RECEIPT_WIDTH: usize = 40;
const SHOP_NAME: &str = "TABLESIDE CAFE";
const MAX_ITEM_NAME: usize = 22;

/// Plain-data receipt for a confirmed order, built from the canonical
/// snapshot so it always reflects the merged, store-derived line items and
/// the authoritative total.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReceiptData {
    pub order_id: Uuid,
    pub table_number: i32,
    pub date: DateTime<Utc>,
    pub payment_method: Option<PaymentMethod>,
    pub currency: String,
    pub items: Vec<ReceiptLine>,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl ReceiptData {
    pub fn from_snapshot(snapshot: &OrderSnapshot, table_number: i32, currency: &str) -> Self {
        let items = snapshot
            .items
            .iter()
            .map(|item| ReceiptLine {
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                subtotal: item.subtotal,
            })
            .collect();

        Self {
            order_id: snapshot.order.id,
            table_number,
            date: snapshot.order.created_at,
            payment_method: snapshot.order.payment_method,
            currency: currency.to_string(),
            items,
            total: snapshot.display_total(),
        }
    }

    /// Renders the fixed-width text receipt.
    pub fn render_text(&self) -> String {
        let rule = "=".repeat(RECEIPT_WIDTH);
        let thin_rule = "-".repeat(RECEIPT_WIDTH);

        let mut out = String::new();
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&format!("{:^width$}\n", SHOP_NAME, width = RECEIPT_WIDTH));
        out.push_str(&format!("{:^width$}\n", "RECEIPT", width = RECEIPT_WIDTH));
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&format!("Order #: {}\n", self.order_id));
        out.push_str(&format!("Table: {}\n", self.table_number));
        out.push_str(&format!("Date: {}\n", self.date.format("%Y-%m-%d %H:%M")));
        if let Some(method) = self.payment_method {
            out.push_str(&format!("Payment: {}\n", payment_label(method)));
        }
        out.push_str(&rule);
        out.push('\n');
        out.push_str("Item                       Qty  Price   Total\n");
        out.push_str(&thin_rule);
        out.push('\n');

        for line in &self.items {
            out.push_str(&format!(
                "{:<25}{:>3}  {:>6}  {:>7}\n",
                truncate_name(&line.name),
                line.quantity,
                money(line.unit_price),
                money(line.subtotal),
            ));
        }

        out.push_str(&rule);
        out.push('\n');
        out.push_str(&format!(
            "TOTAL: {}{} {}\n",
            " ".repeat(25),
            self.currency,
            money(self.total)
        ));
        out.push_str(&rule);
        out.push('\n');
        out.push_str("      Thank you for your visit!\n");
        out.push_str("        Please come again!\n");
        out.push_str(&rule);
        out.push('\n');

        out
    }
}

fn payment_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "CASH",
        PaymentMethod::Card => "CARD",
        PaymentMethod::MobileBanking => "MOBILE BANKING",
    }
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() > MAX_ITEM_NAME {
        let short: String = name.chars().take(MAX_ITEM_NAME).collect();
        format!("{short}...")
    } else {
        name.to_string()
    }
}

fn money(amount: Decimal) -> String {
    format!("{amount:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> ReceiptData {
        ReceiptData {
            order_id: Uuid::from_u128(7),
            table_number: 4,
            date: "2024-05-01T12:30:00Z"
                .parse()
                .expect("valid RFC 3339 timestamp"),
            payment_method: Some(PaymentMethod::MobileBanking),
            currency: "BDT".to_string(),
            items: vec![
                ReceiptLine {
                    name: "Cappuccino".to_string(),
                    quantity: 2,
                    unit_price: dec!(100.00),
                    subtotal: dec!(200.00),
                },
                ReceiptLine {
                    name: "A very long croissant special name".to_string(),
                    quantity: 1,
                    unit_price: dec!(50.00),
                    subtotal: dec!(50.00),
                },
            ],
            total: dec!(250.00),
        }
    }

    #[test]
    fn renders_header_and_totals() {
        let text = sample().render_text();

        assert!(text.contains("TABLESIDE CAFE"));
        assert!(text.contains("RECEIPT"));
        assert!(text.contains(&format!("Order #: {}", Uuid::from_u128(7))));
        assert!(text.contains("Table: 4"));
        assert!(text.contains("Payment: MOBILE BANKING"));
        assert!(text.contains("BDT 250.00"));
        assert!(text.contains("Thank you for your visit!"));
    }

    #[test]
    fn item_lines_are_fixed_width() {
        let text = sample().render_text();
        let line = text
            .lines()
            .find(|l| l.starts_with("Cappuccino"))
            .expect("item line present");

        assert_eq!(line, "Cappuccino                 2  100.00   200.00");
    }

    #[test]
    fn long_names_are_truncated_with_ellipsis() {
        let text = sample().render_text();
        let line = text
            .lines()
            .find(|l| l.starts_with("A very long"))
            .expect("item line present");

        assert!(line.contains("..."));
        // 22 chars + "..." fills the 25-column name field exactly.
        assert!(line.starts_with("A very long croissant ..."));
    }

    #[test]
    fn payment_line_is_omitted_when_method_unset() {
        let mut data = sample();
        data.payment_method = None;
        let text = data.render_text();
        assert!(!text.contains("Payment:"));
    }

    #[test]
    fn money_always_carries_two_decimals() {
        assert_eq!(money(dec!(250)), "250.00");
        assert_eq!(money(dec!(0.5)), "0.50");
        assert_eq!(money(Decimal::ZERO), "0.00");
    }
}
