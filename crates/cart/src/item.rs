//! Cart line items.

use common::CartItemId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Display snapshot of an event and seating category, captured at add time.
///
/// The cart and checkout views render from this snapshot and never re-fetch
/// the catalog. The price is re-checked by the order service at order creation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSnapshot {
    pub event_title: String,
    pub category_name: String,
    pub price: Decimal,
    pub venue: String,
    pub event_date: String,
    pub event_month: String,
    pub event_day: String,
    pub event_time: String,
}

/// One (event, seating category) pair with a quantity and a price snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Composite `"<event_id>-<category_id>"` key.
    pub id: CartItemId,

    pub event_title: String,

    pub category_name: String,

    /// Unit price, stored as a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    pub quantity: u32,

    #[serde(default)]
    pub event_date: String,

    #[serde(default)]
    pub event_month: String,

    #[serde(default)]
    pub event_day: String,

    #[serde(default)]
    pub event_time: String,

    #[serde(default)]
    pub venue: String,
}

impl CartItem {
    /// Builds a line item from an event snapshot.
    pub fn from_snapshot(id: CartItemId, quantity: u32, snapshot: EventSnapshot) -> Self {
        Self {
            id,
            event_title: snapshot.event_title,
            category_name: snapshot.category_name,
            price: snapshot.price,
            quantity,
            event_date: snapshot.event_date,
            event_month: snapshot.event_month,
            event_day: snapshot.event_day,
            event_time: snapshot.event_time,
            venue: snapshot.venue,
        }
    }

    /// Returns `price × quantity`.
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> EventSnapshot {
        EventSnapshot {
            event_title: "ATP Semi-Final".to_string(),
            category_name: "Grandstand".to_string(),
            price: Decimal::new(19950, 2),
            venue: "Centre Court".to_string(),
            event_date: "27".to_string(),
            event_month: "Feb".to_string(),
            event_day: "Fri".to_string(),
            event_time: "18:00".to_string(),
        }
    }

    #[test]
    fn test_line_total() {
        let item = CartItem::from_snapshot(CartItemId::new(1, 2), 3, snapshot());
        assert_eq!(item.line_total(), Decimal::new(59850, 2));
    }

    #[test]
    fn test_serializes_with_camel_case_and_numeric_price() {
        let item = CartItem::from_snapshot(CartItemId::new(1, 2), 1, snapshot());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], "1-2");
        assert_eq!(json["eventTitle"], "ATP Semi-Final");
        assert_eq!(json["price"], serde_json::json!(199.5));
        assert_eq!(json["quantity"], 1);
    }

    #[test]
    fn test_rejects_slug_ids() {
        let json = serde_json::json!({
            "id": "final-prime-a",
            "eventTitle": "Final",
            "categoryName": "Prime A",
            "price": 300,
            "quantity": 1
        });
        assert!(serde_json::from_value::<CartItem>(json).is_err());
    }
}
