//! Storefront context: one instance per page load.

use std::sync::Arc;

use api_client::StorefrontApiClient;
use cart::{CartStore, EventSnapshot, JsonFileStorage, KeyValueStorage, TicketPicker};
use checkout::{CheckoutOrchestrator, CheckoutRedirect, ContactForm, OrderService, PaymentService};
use common::{CartItemId, Order, OrderId, OrderStatus};
use tracker::{
    ConversionSink, OrderStatusSource, PollOutcome, PurchaseTracker, TracingConversionSink,
};

use crate::config::Config;
use crate::error::Result;

/// An add-to-cart request from the event page.
#[derive(Debug, Clone)]
pub struct AddToCart {
    pub event_id: u64,
    pub category_id: u64,
    pub quantity: u32,
    /// Remaining inventory of the category, when known.
    pub seats_left: Option<u32>,
    pub snapshot: EventSnapshot,
}

/// Result of tracking an order page.
#[derive(Debug, Clone)]
pub struct TrackReport {
    /// The order as first read.
    pub order: Order,
    /// Status once tracking settled.
    pub status: OrderStatus,
    /// True if the purchase is recorded as tracked in this session.
    pub tracked: bool,
    /// How the status poll ended, if one ran.
    pub poll: Option<PollOutcome>,
}

/// Cart, checkout and tracking wired over shared storage.
#[derive(Debug)]
pub struct Storefront {
    config: Config,
    cart: CartStore,
    session: Arc<dyn KeyValueStorage>,
}

impl Storefront {
    /// Opens the file-backed storage under the configured state directory
    /// and hydrates the cart.
    pub fn open(config: Config) -> Self {
        let durable = Arc::new(JsonFileStorage::new(config.local_store_path()));
        let session = Arc::new(JsonFileStorage::new(config.session_store_path()));
        Self::with_storage(config, durable, session)
    }

    /// Hydrates the cart from the given storage backends.
    pub fn with_storage(
        config: Config,
        durable: Arc<dyn KeyValueStorage>,
        session: Arc<dyn KeyValueStorage>,
    ) -> Self {
        let cart = CartStore::new(durable, Arc::clone(&session));
        let report = cart.load();
        tracing::debug!(
            migration = ?report.migration,
            restored = report.restored,
            dropped = report.dropped,
            "cart loaded"
        );
        Self {
            config,
            cart,
            session,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// Adds a category to the cart, clamping the quantity to what the
    /// ticket picker allows.
    pub fn add_to_cart(&self, request: AddToCart) -> Result<CartItemId> {
        let limit = TicketPicker::new(request.seats_left).limit();
        let quantity = request.quantity.min(limit);
        if quantity < request.quantity {
            tracing::warn!(
                requested = request.quantity,
                limit,
                "quantity above picker limit, clamped"
            );
        }

        let id = self.cart.add_or_merge_item(
            request.event_id,
            request.category_id,
            quantity,
            request.snapshot,
        )?;
        Ok(id)
    }

    pub fn remove_from_cart(&self, id: CartItemId) -> bool {
        self.cart.remove_item(id)
    }

    pub fn clear_cart(&self) {
        self.cart.clear();
    }

    fn api_client(&self) -> Result<StorefrontApiClient> {
        let config = self.config.api_client_config()?;
        Ok(StorefrontApiClient::new(config)?)
    }

    /// Checks out against the configured API.
    pub async fn checkout(&self, form: &ContactForm) -> Result<CheckoutRedirect> {
        let client = self.api_client()?;
        self.checkout_with(client.clone(), client, form).await
    }

    /// Checks out against the given services.
    pub async fn checkout_with<O, P>(
        &self,
        orders: O,
        payments: P,
        form: &ContactForm,
    ) -> Result<CheckoutRedirect>
    where
        O: OrderService,
        P: PaymentService,
    {
        let orchestrator = CheckoutOrchestrator::new(self.cart.clone(), orders, payments);
        Ok(orchestrator.submit(form).await?)
    }

    /// Tracks an order against the configured API, logging the conversion.
    pub async fn track(&self, order_id: OrderId) -> Result<TrackReport> {
        let client = self.api_client()?;
        self.track_with(client, TracingConversionSink, order_id).await
    }

    /// Reads the order, then runs the tracker until it settles.
    pub async fn track_with<S, C>(&self, source: S, sink: C, order_id: OrderId) -> Result<TrackReport>
    where
        S: OrderStatusSource + 'static,
        C: ConversionSink + 'static,
    {
        let order = source.fetch_order(order_id).await?;
        tracing::info!(%order_id, status = %order.status, "order loaded");

        let tracker = PurchaseTracker::builder(order.clone(), source, sink, Arc::clone(&self.session))
            .config(self.config.tracker_config())
            .cart(self.cart.clone())
            .build();

        let poll = match tracker.mount() {
            Some(handle) => Some(handle.join().await),
            None => None,
        };

        Ok(TrackReport {
            order,
            status: tracker.status(),
            tracked: tracker.has_fired(),
            poll,
        })
    }
}
