//! HTTP client for the storefront's external services.
//!
//! One [`StorefrontApiClient`] serves all three calls the storefront makes:
//! - `POST {base}/api/orders/` (create order)
//! - `POST {base}/api/stripe/create-checkout-session/` (create payment session)
//! - `GET {base}/api/orders/{id}/` (read order status, never cached)
//!
//! It implements the [`checkout::OrderService`], [`checkout::PaymentService`]
//! and [`tracker::OrderStatusSource`] seams.

pub mod client;
pub mod config;
pub mod error;

pub use client::{NETWORK_FAILED_MESSAGE, StorefrontApiClient};
pub use config::ApiClientConfig;
pub use error::ApiClientError;
