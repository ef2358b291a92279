//! Purchase tracker: fire-once conversion with bounded status polling.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cart::{CartStore, KeyValueStorage};
use common::{Order, OrderId, OrderStatus};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use crate::conversion::{ConversionEvent, ConversionSink};
use crate::poll::{PollHandle, PollOutcome};
use crate::source::OrderStatusSource;

/// Default delay between status reads.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default number of status reads before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 15;

/// Returns the session-storage key marking an order's conversion as sent.
pub fn dedup_key(order_id: OrderId) -> String {
    format!("purchase_tracked_{order_id}")
}

/// Tracker settings.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Delay between status reads. Zero falls back to [`DEFAULT_POLL_INTERVAL`].
    pub poll_interval: Duration,
    pub max_attempts: u32,
    /// Store name reported as the conversion's affiliation.
    pub affiliation: String,
    pub currency: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            affiliation: "Tickets".to_string(),
            currency: "USD".to_string(),
        }
    }
}

impl TrackerConfig {
    /// Returns the poll period actually used, never zero.
    pub fn effective_poll_interval(&self) -> Duration {
        if self.poll_interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            self.poll_interval
        }
    }
}

struct TrackerInner<S, C> {
    order: Order,
    status_tx: watch::Sender<OrderStatus>,
    has_fired: AtomicBool,
    cart_cleared: AtomicBool,
    source: S,
    sink: C,
    session: Arc<dyn KeyValueStorage>,
    cart: Option<CartStore>,
    config: TrackerConfig,
}

/// Builder for [`PurchaseTracker`].
pub struct PurchaseTrackerBuilder<S, C> {
    order: Order,
    source: S,
    sink: C,
    session: Arc<dyn KeyValueStorage>,
    cart: Option<CartStore>,
    config: TrackerConfig,
}

impl<S, C> PurchaseTrackerBuilder<S, C>
where
    S: OrderStatusSource + 'static,
    C: ConversionSink + 'static,
{
    pub fn config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    /// Clears this cart once the order is observed as paid.
    pub fn cart(mut self, cart: CartStore) -> Self {
        self.cart = Some(cart);
        self
    }

    pub fn build(self) -> PurchaseTracker<S, C> {
        let (status_tx, _) = watch::channel(self.order.status);
        PurchaseTracker {
            inner: Arc::new(TrackerInner {
                order: self.order,
                status_tx,
                has_fired: AtomicBool::new(false),
                cart_cleared: AtomicBool::new(false),
                source: self.source,
                sink: self.sink,
                session: self.session,
                cart: self.cart,
                config: self.config,
            }),
        }
    }
}

/// Tracks one order on the order-result page.
///
/// Seeded with the server-rendered order. The conversion event fires at
/// most once per tracker and at most once per session (via [`dedup_key`]).
/// While the status is `pending` or `confirmed` a bounded background poll
/// watches for `paid`; any other status stops it.
pub struct PurchaseTracker<S, C> {
    inner: Arc<TrackerInner<S, C>>,
}

impl<S, C> Clone for PurchaseTracker<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, C> PurchaseTracker<S, C>
where
    S: OrderStatusSource + 'static,
    C: ConversionSink + 'static,
{
    /// Starts building a tracker for `order`.
    ///
    /// `session` is the per-tab store holding the dedup keys.
    pub fn builder(
        order: Order,
        source: S,
        sink: C,
        session: Arc<dyn KeyValueStorage>,
    ) -> PurchaseTrackerBuilder<S, C> {
        PurchaseTrackerBuilder {
            order,
            source,
            sink,
            session,
            cart: None,
            config: TrackerConfig::default(),
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.inner.order.id
    }

    /// Returns the currently known status.
    pub fn status(&self) -> OrderStatus {
        *self.inner.status_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<OrderStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Returns true once this tracker has fired (or found the order already tracked).
    pub fn has_fired(&self) -> bool {
        self.inner.has_fired.load(Ordering::Acquire)
    }

    /// Page mount: fires immediately for a paid order, otherwise starts
    /// polling while the status is pollable.
    pub fn mount(&self) -> Option<PollHandle> {
        let status = self.status();
        if status == OrderStatus::Paid {
            self.on_paid();
        }
        if status.is_pollable() {
            Some(self.start_polling())
        } else {
            tracing::debug!(order_id = %self.order_id(), %status, "no polling needed");
            None
        }
    }

    /// Records a newly observed status and returns the previous one.
    ///
    /// Observing `paid` runs the conversion path. Leaving the pollable set
    /// stops a running poll.
    pub fn observe_status(&self, status: OrderStatus) -> OrderStatus {
        let previous = self.inner.status_tx.send_replace(status);
        if previous != status {
            tracing::info!(order_id = %self.order_id(), from = %previous, to = %status, "order status changed");
        }
        if status == OrderStatus::Paid {
            self.on_paid();
        }
        previous
    }

    /// Fires the conversion event unless this tracker already fired or the
    /// session already holds the dedup key. Returns true if it fired.
    pub fn try_fire(&self) -> bool {
        let inner = &self.inner;
        if inner
            .has_fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let key = dedup_key(inner.order.id);
        match inner.session.get(&key) {
            Ok(Some(_)) => {
                tracing::debug!(order_id = %inner.order.id, "purchase already tracked this session");
                return false;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "could not read purchase dedup key"),
        }

        let event =
            ConversionEvent::from_order(&inner.order, &inner.config.affiliation, &inner.config.currency);
        inner.sink.emit(&event);
        if let Err(e) = inner.session.set(&key, "1") {
            tracing::warn!(error = %e, "could not record purchase dedup key");
        }

        metrics::counter!("purchase_events_fired_total").increment(1);
        tracing::info!(
            order_id = %inner.order.id,
            value = %event.value,
            "purchase conversion fired"
        );
        true
    }

    fn on_paid(&self) {
        self.try_fire();
        if let Some(cart) = &self.inner.cart {
            if !self.inner.cart_cleared.swap(true, Ordering::AcqRel) {
                cart.clear();
                tracing::debug!(order_id = %self.order_id(), "cart cleared after payment");
            }
        }
    }

    /// Spawns the bounded status poll on the current runtime.
    ///
    /// The first read happens one interval after the call.
    pub fn start_polling(&self) -> PollHandle {
        let tracker = self.clone();
        PollHandle::new(tokio::spawn(async move { tracker.poll().await }))
    }

    #[tracing::instrument(skip(self), fields(order_id = %self.order_id()))]
    async fn poll(self) -> PollOutcome {
        let period = self.inner.config.effective_poll_interval();
        let max_attempts = self.inner.config.max_attempts;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut status_rx = self.subscribe();
        let mut attempts = 0;

        while attempts < max_attempts {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = status_rx.changed() => {
                    if changed.is_err() {
                        return PollOutcome::Cancelled;
                    }
                    let status = *status_rx.borrow_and_update();
                    if !status.is_pollable() {
                        return self.stopped(status, attempts);
                    }
                    continue;
                }
            }

            let status = self.status();
            if !status.is_pollable() {
                return self.stopped(status, attempts);
            }

            attempts += 1;
            metrics::counter!("order_status_polls_total").increment(1);

            match self.inner.source.fetch_status(self.order_id()).await {
                Ok(OrderStatus::Paid) => {
                    self.observe_status(OrderStatus::Paid);
                    return PollOutcome::Paid { attempts };
                }
                Ok(status) => {
                    tracing::debug!(attempt = attempts, %status, "payment not confirmed yet");
                }
                Err(e) => {
                    tracing::debug!(attempt = attempts, error = %e, "order status read failed");
                }
            }
        }

        tracing::info!(attempts, "payment confirmation not observed, stopped polling");
        PollOutcome::Exhausted { attempts }
    }

    fn stopped(&self, status: OrderStatus, attempts: u32) -> PollOutcome {
        if status == OrderStatus::Paid {
            return PollOutcome::Paid { attempts };
        }
        tracing::debug!(%status, attempts, "order left pollable state, stopped polling");
        PollOutcome::Stopped { status, attempts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::RecordingConversionSink;
    use crate::source::ScriptedStatusSource;
    use cart::InMemoryStorage;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn order(status: OrderStatus) -> Order {
        Order {
            id: OrderId::new(),
            order_number: "DT-1001".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+971501234567".to_string(),
            comments: String::new(),
            status,
            total_amount: Decimal::from(900),
            total_tickets: 2,
            items: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            paid_at: None,
        }
    }

    fn tracker(
        status: OrderStatus,
    ) -> (
        PurchaseTracker<ScriptedStatusSource, RecordingConversionSink>,
        RecordingConversionSink,
        InMemoryStorage,
    ) {
        let seed = order(status);
        let sink = RecordingConversionSink::new();
        let session = InMemoryStorage::new();
        let tracker = PurchaseTracker::builder(
            seed.clone(),
            ScriptedStatusSource::new(seed),
            sink.clone(),
            Arc::new(session.clone()),
        )
        .build();
        (tracker, sink, session)
    }

    #[test]
    fn test_dedup_key_format() {
        let id = OrderId::new();
        assert_eq!(dedup_key(id), format!("purchase_tracked_{id}"));
    }

    #[test]
    fn test_zero_poll_interval_uses_default() {
        let config = TrackerConfig {
            poll_interval: Duration::ZERO,
            ..TrackerConfig::default()
        };
        assert_eq!(config.effective_poll_interval(), DEFAULT_POLL_INTERVAL);

        let config = TrackerConfig {
            poll_interval: Duration::from_millis(500),
            ..TrackerConfig::default()
        };
        assert_eq!(config.effective_poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_try_fire_once() {
        let (tracker, sink, session) = tracker(OrderStatus::Paid);

        assert!(tracker.try_fire());
        assert!(!tracker.try_fire());
        assert_eq!(sink.count(), 1);
        assert!(session.contains(&dedup_key(tracker.order_id())));
    }

    #[test]
    fn test_dedup_key_blocks_fire() {
        let (tracker, sink, session) = tracker(OrderStatus::Paid);
        session.set(&dedup_key(tracker.order_id()), "1").unwrap();

        assert!(!tracker.try_fire());
        assert_eq!(sink.count(), 0);
        assert!(tracker.has_fired());
    }

    #[test]
    fn test_session_read_failure_still_fires() {
        let (tracker, sink, session) = tracker(OrderStatus::Paid);
        session.set_fail_on_read(true);

        assert!(tracker.try_fire());
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test]
    async fn test_observe_paid_fires() {
        let (tracker, sink, _) = tracker(OrderStatus::Pending);

        let previous = tracker.observe_status(OrderStatus::Paid);
        tracker.observe_status(OrderStatus::Paid);

        assert_eq!(previous, OrderStatus::Pending);
        assert_eq!(tracker.status(), OrderStatus::Paid);
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test]
    async fn test_terminal_status_does_not_poll() {
        for status in [OrderStatus::Cancelled, OrderStatus::Refunded] {
            let (tracker, sink, _) = tracker(status);
            assert!(tracker.mount().is_none());
            assert_eq!(sink.count(), 0);
        }
    }
}
