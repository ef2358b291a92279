//! Storefront error types.

use api_client::ApiClientError;
use cart::CartError;
use checkout::CheckoutError;
use thiserror::Error;
use tracker::TrackerError;

use crate::config::ConfigError;

/// Errors surfaced to the storefront user.
#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Client(#[from] ApiClientError),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
