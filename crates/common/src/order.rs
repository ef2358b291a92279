//! Read-only view of the order entity owned by the external order service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CartItemId, OrderId};

/// The status of an order, as reported by the order service.
///
/// State transitions (driven externally):
/// ```text
/// Pending ──┬──► Confirmed ──┐
///           └────────────────┴──► Paid ──► Refunded
///           └──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order created, payment not yet confirmed.
    #[default]
    Pending,

    /// Order accepted, payment not yet confirmed.
    Confirmed,

    /// Payment confirmed (terminal state).
    Paid,

    /// Order cancelled (terminal state).
    Cancelled,

    /// Payment refunded (terminal state).
    Refunded,
}

impl OrderStatus {
    /// Returns true while payment confirmation may still arrive.
    pub fn is_pollable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Returns true if this is a terminal state (nothing left to wait for).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Paid | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    /// Returns the human-readable label shown on the order page.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending Payment",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Paid => "Paid",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Refunded => "Refunded",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A server-confirmed line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub event_id: u64,
    pub category_id: u64,
    pub quantity: u32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub event_title: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub event_date: String,
    #[serde(default)]
    pub event_month: String,
    #[serde(default)]
    pub event_day: String,
    #[serde(default)]
    pub event_time: String,
}

impl OrderLine {
    /// Returns the composite key of the event/category pair this line sells.
    pub fn item_id(&self) -> CartItemId {
        CartItemId::new(self.event_id, self.category_id)
    }
}

/// An order as returned by the order-status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub comments: String,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    #[serde(default)]
    pub total_tickets: u32,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}
