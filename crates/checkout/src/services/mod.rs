//! External service traits and in-memory implementations for checkout steps.

pub mod orders;
pub mod payments;

pub use orders::{
    CreateOrderRequest, CreatedOrder, InMemoryOrderService, ORDER_FAILED_MESSAGE, OrderErrorBody,
    OrderLineRequest, OrderService,
};
pub use payments::{
    CheckoutSession, InMemoryPaymentService, MISSING_CHECKOUT_URL_MESSAGE, PAYMENT_FAILED_MESSAGE,
    PaymentService,
};
