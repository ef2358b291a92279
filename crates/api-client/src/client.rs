//! reqwest-backed implementation of the storefront service seams.

use async_trait::async_trait;
use checkout::{
    CheckoutError, CheckoutSession, CreateOrderRequest, CreatedOrder, MISSING_CHECKOUT_URL_MESSAGE,
    OrderErrorBody, OrderService, PAYMENT_FAILED_MESSAGE, PaymentService,
};
use common::{Order, OrderId, OrderStatus};
use reqwest::header::{CACHE_CONTROL, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracker::{OrderStatusSource, TrackerError};

use crate::config::ApiClientConfig;
use crate::error::ApiClientError;

/// Message shown when a service could not be reached at all.
pub const NETWORK_FAILED_MESSAGE: &str = "Something went wrong. Please try again.";

const ORDERS_PATH: &str = "/api/orders/";
const CHECKOUT_SESSION_PATH: &str = "/api/stripe/create-checkout-session/";

/// HTTP client for the order and payment-session services.
#[derive(Debug, Clone)]
pub struct StorefrontApiClient {
    config: ApiClientConfig,
    http: Client,
}

impl StorefrontApiClient {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiClientError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Reads an order, bypassing any HTTP cache.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::OrderNotFound`] on 404, and an error on any
    /// other non-2xx status, transport failure, or malformed body.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_order(&self, order_id: OrderId) -> Result<Order, ApiClientError> {
        let text = self.read_order(order_id).await?;
        serde_json::from_str(&text).map_err(|e| ApiClientError::UnexpectedResponse(e.to_string()))
    }

    /// Reads only an order's status, ignoring the rest of the payload.
    ///
    /// # Errors
    ///
    /// As [`StorefrontApiClient::fetch_order`], except that only a missing or
    /// unknown `status` counts as a malformed body.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_order_status(&self, order_id: OrderId) -> Result<OrderStatus, ApiClientError> {
        let text = self.read_order(order_id).await?;
        serde_json::from_str::<StatusBody>(&text)
            .map(|body| body.status)
            .map_err(|e| ApiClientError::UnexpectedResponse(e.to_string()))
    }

    async fn read_order(&self, order_id: OrderId) -> Result<String, ApiClientError> {
        let url = self.config.endpoint(&format!("{ORDERS_PATH}{order_id}/"));

        let mut request = self
            .http
            .get(&url)
            .header(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        if let Some(site_code) = self.config.site_code.as_deref().filter(|s| !s.is_empty()) {
            request = request.query(&[("site_code", site_code)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiClientError::OrderNotFound(order_id));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }

    /// POSTs a JSON body and returns the status with the parsed response body.
    ///
    /// A body that is not JSON is returned as [`Value::Null`].
    async fn post_json<B>(&self, path: &str, body: &B) -> Result<(StatusCode, Value), ApiClientError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.config.endpoint(path);
        tracing::debug!(%url, "POST");

        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let value = serde_json::from_str(&text).unwrap_or(Value::Null);

        tracing::debug!(%url, status = status.as_u16(), "response received");
        Ok((status, value))
    }
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: OrderStatus,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    order: Option<CreatedOrderBody>,
}

#[derive(Debug, Deserialize)]
struct CreatedOrderBody {
    id: Option<OrderId>,
    #[serde(default)]
    order_number: Option<String>,
}

fn parse_created_order(body: &Value) -> Option<CreatedOrder> {
    let parsed = CreateOrderResponse::deserialize(body).ok()?;
    let order = parsed.order?;
    Some(CreatedOrder {
        id: order.id?,
        order_number: order.order_number,
    })
}

#[derive(Debug, Serialize)]
struct CheckoutSessionRequest {
    order_id: OrderId,
}

#[derive(Debug, Default, Deserialize)]
struct CheckoutSessionResponse {
    #[serde(default)]
    checkout_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl OrderService for StorefrontApiClient {
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<CreatedOrder, CheckoutError> {
        let (status, body) = self.post_json(ORDERS_PATH, request).await.map_err(|e| {
            tracing::warn!(error = %e, "order service unreachable");
            CheckoutError::OrderCreation(NETWORK_FAILED_MESSAGE.to_string())
        })?;

        if status.is_success() {
            if let Some(created) = parse_created_order(&body) {
                return Ok(created);
            }
        }

        let rejection = OrderErrorBody::deserialize(&body).unwrap_or_default();
        let message = rejection.best_message();
        tracing::warn!(status = status.as_u16(), %message, "order rejected");
        Err(CheckoutError::OrderCreation(message))
    }
}

#[async_trait]
impl PaymentService for StorefrontApiClient {
    async fn create_checkout_session(
        &self,
        order_id: OrderId,
    ) -> Result<CheckoutSession, CheckoutError> {
        let (status, body) = self
            .post_json(CHECKOUT_SESSION_PATH, &CheckoutSessionRequest { order_id })
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "payment service unreachable");
                CheckoutError::PaymentSession(NETWORK_FAILED_MESSAGE.to_string())
            })?;

        let parsed = CheckoutSessionResponse::deserialize(&body).unwrap_or_default();

        if !status.is_success() {
            let message = parsed
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| PAYMENT_FAILED_MESSAGE.to_string());
            tracing::warn!(status = status.as_u16(), %message, "payment session rejected");
            return Err(CheckoutError::PaymentSession(message));
        }

        match parsed.checkout_url.filter(|url| !url.is_empty()) {
            Some(checkout_url) => Ok(CheckoutSession { checkout_url }),
            None => Err(CheckoutError::PaymentSession(
                MISSING_CHECKOUT_URL_MESSAGE.to_string(),
            )),
        }
    }
}

#[async_trait]
impl OrderStatusSource for StorefrontApiClient {
    async fn fetch_order(&self, order_id: OrderId) -> Result<Order, TrackerError> {
        StorefrontApiClient::fetch_order(self, order_id)
            .await
            .map_err(tracker_error)
    }

    async fn fetch_status(&self, order_id: OrderId) -> Result<OrderStatus, TrackerError> {
        self.fetch_order_status(order_id).await.map_err(tracker_error)
    }
}

fn tracker_error(error: ApiClientError) -> TrackerError {
    match error {
        ApiClientError::OrderNotFound(id) => TrackerError::OrderNotFound(id),
        ApiClientError::UnexpectedResponse(detail) => TrackerError::Decode(detail),
        other => TrackerError::Transport(other.to_string()),
    }
}
