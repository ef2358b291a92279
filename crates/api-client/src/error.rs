//! Client error types.

use common::OrderId;
use thiserror::Error;

/// Errors that can occur when talking to the storefront services.
#[derive(Debug, Error)]
pub enum ApiClientError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The order does not exist (or belongs to another site).
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// The service answered 2xx with an unexpected body.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}
