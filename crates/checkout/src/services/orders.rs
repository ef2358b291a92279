//! Order service trait, wire types and in-memory implementation.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use cart::CartItem;
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;
use crate::form::ContactForm;

/// Generic message used when the order service gives nothing more specific.
pub const ORDER_FAILED_MESSAGE: &str = "Failed to create order";

/// Placeholder message the order service sends alongside field errors.
const GENERIC_VALIDATION_MESSAGE: &str = "Validation error";

/// One requested line of a new order. Prices are never sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub event_id: u64,
    pub category_id: u64,
    pub quantity: u32,
}

/// Body of a create-order call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub comments: String,
    pub items: Vec<OrderLineRequest>,
}

impl CreateOrderRequest {
    /// Builds the request from the contact form and the cart contents.
    pub fn new(form: &ContactForm, items: &[CartItem]) -> Self {
        Self {
            name: form.name.trim().to_string(),
            email: form.normalized_email(),
            phone: form.e164_phone(),
            comments: form.comments.clone(),
            items: items
                .iter()
                .map(|item| OrderLineRequest {
                    event_id: item.id.event_id(),
                    category_id: item.id.category_id(),
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

/// An order accepted by the order service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedOrder {
    pub id: OrderId,
    pub order_number: Option<String>,
}

/// Error body returned by the order service on rejection.
///
/// Depending on the failure class the service fills field-level `details`,
/// a top-level `message`, or a top-level `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderErrorBody {
    #[serde(default)]
    pub details: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl OrderErrorBody {
    /// Returns the most actionable message in the body.
    ///
    /// Priority: flattened field errors, then `message` (unless it is the
    /// generic placeholder), then `error`, then a generic fallback.
    pub fn best_message(&self) -> String {
        let field_errors = self
            .details
            .iter()
            .flat_map(|details| details.values())
            .flat_map(|value| match value {
                serde_json::Value::Array(errors) => {
                    errors.iter().map(message_text).collect::<Vec<_>>()
                }
                serde_json::Value::String(error) => vec![error.clone()],
                _ => Vec::new(),
            })
            .filter(|message| !message.is_empty())
            .collect::<Vec<_>>();

        if !field_errors.is_empty() {
            return field_errors.join(". ");
        }
        if let Some(message) = self
            .message
            .as_deref()
            .filter(|m| !m.is_empty() && *m != GENERIC_VALIDATION_MESSAGE)
        {
            return message.to_string();
        }
        if let Some(error) = self.error.as_deref().filter(|e| !e.is_empty()) {
            return error.to_string();
        }
        ORDER_FAILED_MESSAGE.to_string()
    }
}

fn message_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Trait for the external order-creation API.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Creates an order. The service prices it from its own catalog.
    async fn create_order(&self, request: &CreateOrderRequest)
    -> Result<CreatedOrder, CheckoutError>;
}

#[derive(Debug, Default)]
struct InMemoryOrderState {
    requests: Vec<CreateOrderRequest>,
    orders: Vec<OrderId>,
    rejection: Option<OrderErrorBody>,
}

/// In-memory order service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderService {
    state: Arc<RwLock<InMemoryOrderState>>,
}

impl InMemoryOrderService {
    /// Creates a new in-memory order service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to reject every order with the given body.
    pub fn set_rejection(&self, body: Option<OrderErrorBody>) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .rejection = body;
    }

    /// Returns the number of orders created.
    pub fn order_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .orders
            .len()
    }

    /// Returns every request received, accepted or not.
    pub fn requests(&self) -> Vec<CreateOrderRequest> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .requests
            .clone()
    }
}

#[async_trait]
impl OrderService for InMemoryOrderService {
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<CreatedOrder, CheckoutError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.requests.push(request.clone());

        if let Some(body) = &state.rejection {
            return Err(CheckoutError::OrderCreation(body.best_message()));
        }

        let id = OrderId::new();
        state.orders.push(id);
        Ok(CreatedOrder {
            id,
            order_number: Some(format!("ORD-{:04}", state.orders.len())),
        })
    }
}
