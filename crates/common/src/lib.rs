//! Shared types for the ticket storefront.
//!
//! Identifiers used across the cart, checkout and purchase-tracking crates,
//! plus the read-only view of the externally owned order entity.

pub mod order;
pub mod types;

pub use order::{Order, OrderLine, OrderStatus};
pub use types::{CartItemId, InvalidCartItemId, OrderId};
