//! Checkout error types.

use thiserror::Error;

/// Client-side validation failures, raised before any network call.
///
/// The display text is the message shown next to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter your name")]
    MissingName,

    #[error("Please enter your email")]
    MissingEmail,

    #[error("Please enter a valid phone number (at least 8 digits including country code)")]
    InvalidPhone,

    #[error("Please agree to the terms and conditions")]
    ConsentRequired,

    #[error("Your cart is empty")]
    EmptyCart,
}

impl ValidationError {
    /// Returns the form field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingName => "name",
            ValidationError::MissingEmail => "email",
            ValidationError::InvalidPhone => "phone",
            ValidationError::ConsentRequired => "agree",
            ValidationError::EmptyCart => "cart",
        }
    }
}

/// Errors that end a checkout attempt.
///
/// Every variant is recoverable: the orchestrator returns to idle and the
/// cart is left untouched.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The contact form or cart failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Another submission is still in flight.
    #[error("A checkout is already in progress")]
    InProgress,

    /// The order service rejected the order. Holds the most specific message available.
    #[error("{0}")]
    OrderCreation(String),

    /// The order exists but no payment session could be created.
    #[error("{0}")]
    PaymentSession(String),
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(ValidationError::MissingName.to_string(), "Please enter your name");
        assert_eq!(ValidationError::InvalidPhone.field(), "phone");
        let err: CheckoutError = ValidationError::ConsentRequired.into();
        assert_eq!(err.to_string(), "Please agree to the terms and conditions");
    }

    #[test]
    fn test_service_errors_display_their_message() {
        let err = CheckoutError::OrderCreation("Only 2 seats left".to_string());
        assert_eq!(err.to_string(), "Only 2 seats left");
    }
}
