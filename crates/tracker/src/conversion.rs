//! Purchase conversion events and sinks.

use std::sync::{Arc, Mutex, PoisonError};

use common::{Order, OrderId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line of a purchase conversion event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionItem {
    /// Composite `"<event_id>-<category_id>"` key.
    pub item_id: String,
    /// Event title.
    pub item_name: String,
    /// Seating category name.
    pub item_variant: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    /// Zero-based position in the order.
    pub index: usize,
}

/// The purchase signal sent to the analytics collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionEvent {
    pub transaction_id: OrderId,
    pub affiliation: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping: Decimal,
    pub items: Vec<ConversionItem>,
}

impl ConversionEvent {
    /// Builds the event from the server-confirmed order.
    pub fn from_order(order: &Order, affiliation: &str, currency: &str) -> Self {
        Self {
            transaction_id: order.id,
            affiliation: affiliation.to_string(),
            value: order.total_amount,
            currency: currency.to_string(),
            tax: Decimal::ZERO,
            shipping: Decimal::ZERO,
            items: order
                .items
                .iter()
                .enumerate()
                .map(|(index, line)| ConversionItem {
                    item_id: line.item_id().to_string(),
                    item_name: line.event_title.clone(),
                    item_variant: line.category_name.clone(),
                    price: line.unit_price,
                    quantity: line.quantity,
                    index,
                })
                .collect(),
        }
    }
}

/// Destination of conversion events. Fire-and-forget: nothing is awaited.
pub trait ConversionSink: Send + Sync {
    fn emit(&self, event: &ConversionEvent);
}

/// Sink writing each event to the tracing pipeline under the `conversion` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConversionSink;

impl ConversionSink for TracingConversionSink {
    fn emit(&self, event: &ConversionEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => tracing::info!(
                target: "conversion",
                transaction_id = %event.transaction_id,
                payload = %payload,
                "purchase"
            ),
            Err(e) => tracing::warn!(error = %e, "failed to encode conversion event"),
        }
    }
}

/// Sink keeping every event in memory, for testing.
#[derive(Debug, Clone, Default)]
pub struct RecordingConversionSink {
    events: Arc<Mutex<Vec<ConversionEvent>>>,
}

impl RecordingConversionSink {
    /// Creates an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every event emitted so far.
    pub fn events(&self) -> Vec<ConversionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of events emitted.
    pub fn count(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ConversionSink for RecordingConversionSink {
    fn emit(&self, event: &ConversionEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
