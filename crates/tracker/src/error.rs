//! Tracker error types.

use common::OrderId;
use thiserror::Error;

/// Errors returned by an order-status source.
///
/// During polling every variant is treated the same way as a not-yet-paid
/// response: the tick is counted and the next one retries.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The request could not be completed.
    #[error("Order status request failed: {0}")]
    Transport(String),

    /// The response body was not a valid order.
    #[error("Invalid order status response: {0}")]
    Decode(String),
}
