//! Ticket storefront: wires the cart, checkout and purchase tracker to the
//! real order/payment API and file-backed storage.

pub mod app;
pub mod config;
pub mod error;
pub mod telemetry;

pub use app::{AddToCart, Storefront, TrackReport};
pub use config::{Config, ConfigError, LogFormat};
pub use error::{Result, StorefrontError};
