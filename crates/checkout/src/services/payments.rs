//! Payment-session service trait and in-memory implementation.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::OrderId;

use crate::error::CheckoutError;

/// Generic message used when the payment service gives no reason.
pub const PAYMENT_FAILED_MESSAGE: &str = "Payment failed";

/// Message used when a session was created without a redirect target.
pub const MISSING_CHECKOUT_URL_MESSAGE: &str = "No checkout URL returned";

/// A hosted payment page the buyer is redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub checkout_url: String,
}

/// Trait for the external payment-session API.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Creates a payment session for an existing order.
    ///
    /// Only the order id is sent; the payment service derives the amount
    /// from the order itself.
    async fn create_checkout_session(
        &self,
        order_id: OrderId,
    ) -> Result<CheckoutSession, CheckoutError>;
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    sessions: Vec<(OrderId, String)>,
    calls: usize,
    fail_on_create: bool,
}

/// In-memory payment service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentService {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentService {
    /// Creates a new in-memory payment service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail on session creation.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_create = fail;
    }

    /// Returns the number of create-session calls received.
    pub fn call_count(&self) -> usize {
        self.state.read().unwrap_or_else(PoisonError::into_inner).calls
    }

    /// Returns the number of sessions created.
    pub fn session_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sessions
            .len()
    }

    /// Returns the order ids sessions were created for.
    pub fn session_orders(&self) -> Vec<OrderId> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sessions
            .iter()
            .map(|(order_id, _)| *order_id)
            .collect()
    }
}

#[async_trait]
impl PaymentService for InMemoryPaymentService {
    async fn create_checkout_session(
        &self,
        order_id: OrderId,
    ) -> Result<CheckoutSession, CheckoutError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.calls += 1;

        if state.fail_on_create {
            return Err(CheckoutError::PaymentSession(
                PAYMENT_FAILED_MESSAGE.to_string(),
            ));
        }

        let checkout_url = format!(
            "https://checkout.example.test/pay/cs_{:04}",
            state.sessions.len() + 1
        );
        state.sessions.push((order_id, checkout_url.clone()));
        Ok(CheckoutSession { checkout_url })
    }
}
