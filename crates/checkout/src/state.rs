//! Checkout state machine.

use serde::{Deserialize, Serialize};

/// The state of a checkout submission.
///
/// State transitions:
/// ```text
/// Idle ──► Validating ──► CreatingOrder ──► CreatingPaymentSession ──► Redirecting
///              │                │                     │
///              └────────────────┴─────────────────────┴──► Idle (error surfaced)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckoutState {
    /// No submission in flight.
    #[default]
    Idle,

    /// Contact form and cart are being checked.
    Validating,

    /// Waiting for the order service.
    CreatingOrder,

    /// Waiting for the payment service.
    CreatingPaymentSession,

    /// Checkout URL received, cart cleared (terminal state).
    Redirecting,
}

impl CheckoutState {
    /// Returns true if a new submission may start.
    pub fn can_submit(&self) -> bool {
        matches!(self, CheckoutState::Idle)
    }

    /// Returns true while a submission is in flight or has handed off to payment.
    pub fn is_busy(&self) -> bool {
        !matches!(self, CheckoutState::Idle)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutState::Redirecting)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Idle => "Idle",
            CheckoutState::Validating => "Validating",
            CheckoutState::CreatingOrder => "CreatingOrder",
            CheckoutState::CreatingPaymentSession => "CreatingPaymentSession",
            CheckoutState::Redirecting => "Redirecting",
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
