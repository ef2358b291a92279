//! Checkout orchestration for the ticket storefront.
//!
//! A checkout converts the current cart into a paid order through two
//! sequential, dependent external calls:
//! 1. Create the order (the order service prices it)
//! 2. Create a payment session for that order
//!
//! The cart is cleared only once a checkout URL has been received. A failure
//! after step 1 leaves the order in place server-side; nothing is rolled back.

pub mod error;
pub mod form;
pub mod orchestrator;
pub mod services;
pub mod state;

pub use error::{CheckoutError, ValidationError};
pub use form::ContactForm;
pub use orchestrator::{CheckoutOrchestrator, CheckoutRedirect};
pub use services::{
    CheckoutSession, CreateOrderRequest, CreatedOrder, InMemoryOrderService,
    InMemoryPaymentService, MISSING_CHECKOUT_URL_MESSAGE, ORDER_FAILED_MESSAGE, OrderErrorBody,
    OrderLineRequest, OrderService, PAYMENT_FAILED_MESSAGE, PaymentService,
};
pub use state::CheckoutState;
