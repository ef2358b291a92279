//! Checkout orchestrator: cart → order → payment session → redirect.

use std::sync::atomic::{AtomicBool, Ordering};

use cart::CartStore;
use common::OrderId;
use tokio::sync::watch;

use crate::error::{CheckoutError, ValidationError};
use crate::form::ContactForm;
use crate::services::orders::{CreateOrderRequest, OrderService};
use crate::services::payments::PaymentService;
use crate::state::CheckoutState;

/// Where to send the buyer once checkout succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRedirect {
    pub order_id: OrderId,
    pub order_number: Option<String>,
    pub checkout_url: String,
}

/// Single in-flight submission guard.
///
/// Dropping an armed guard releases the flag and returns the state to idle,
/// so every error path (and a cancelled submission) frees the form again.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    state_tx: &'a watch::Sender<CheckoutState>,
    armed: bool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool, state_tx: &'a watch::Sender<CheckoutState>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag,
                state_tx,
                armed: true,
            })
    }

    /// Keeps the flag set: the buyer is being navigated away.
    fn commit(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state_tx.send_replace(CheckoutState::Idle);
            self.flag.store(false, Ordering::Release);
        }
    }
}

/// Drives a checkout through its two dependent external calls.
///
/// The calls are strictly sequential. The cart is cleared only after a
/// checkout URL has been received; any earlier failure leaves it intact.
pub struct CheckoutOrchestrator<O, P>
where
    O: OrderService,
    P: PaymentService,
{
    cart: CartStore,
    orders: O,
    payments: P,
    state_tx: watch::Sender<CheckoutState>,
    in_flight: AtomicBool,
}

impl<O, P> CheckoutOrchestrator<O, P>
where
    O: OrderService,
    P: PaymentService,
{
    /// Creates a new orchestrator over the given cart and services.
    pub fn new(cart: CartStore, orders: O, payments: P) -> Self {
        let (state_tx, _) = watch::channel(CheckoutState::Idle);
        Self {
            cart,
            orders,
            payments,
            state_tx,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Returns the current checkout state.
    pub fn state(&self) -> CheckoutState {
        *self.state_tx.borrow()
    }

    /// Subscribes to checkout state transitions.
    pub fn subscribe(&self) -> watch::Receiver<CheckoutState> {
        self.state_tx.subscribe()
    }

    /// Returns true while a submission holds the in-flight guard.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn transition(&self, next: CheckoutState) {
        let previous = self.state_tx.send_replace(next);
        tracing::debug!(from = %previous, to = %next, "checkout state changed");
    }

    /// Submits the checkout.
    ///
    /// On success the cart has been cleared and the caller should navigate
    /// to the returned checkout URL; the orchestrator stays in
    /// [`CheckoutState::Redirecting`] and rejects further submissions.
    #[tracing::instrument(skip(self, form))]
    pub async fn submit(&self, form: &ContactForm) -> Result<CheckoutRedirect, CheckoutError> {
        let guard =
            InFlightGuard::acquire(&self.in_flight, &self.state_tx).ok_or(CheckoutError::InProgress)?;

        metrics::counter!("checkout_submissions_total").increment(1);
        let started = std::time::Instant::now();

        match self.run(form).await {
            Ok(redirect) => {
                guard.commit();
                metrics::counter!("checkout_completed_total").increment(1);
                metrics::histogram!("checkout_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                tracing::info!(
                    order_id = %redirect.order_id,
                    "checkout complete, redirecting to payment"
                );
                Ok(redirect)
            }
            Err(e) => {
                metrics::counter!("checkout_failed_total").increment(1);
                match &e {
                    CheckoutError::Validation(v) => {
                        tracing::debug!(field = v.field(), error = %v, "checkout blocked");
                    }
                    _ => tracing::warn!(error = %e, "checkout failed"),
                }
                drop(guard);
                Err(e)
            }
        }
    }

    async fn run(&self, form: &ContactForm) -> Result<CheckoutRedirect, CheckoutError> {
        // 1. Client-side validation gate
        self.transition(CheckoutState::Validating);
        form.validate()?;
        let items = self.cart.items();
        if items.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }

        // 2. Create the order (no prices sent)
        self.transition(CheckoutState::CreatingOrder);
        let request = CreateOrderRequest::new(form, &items);
        tracing::info!(lines = request.items.len(), "creating order");
        let order = self.orders.create_order(&request).await?;

        // 3. Create the payment session for that order
        self.transition(CheckoutState::CreatingPaymentSession);
        tracing::info!(order_id = %order.id, "creating payment session");
        let session = self.payments.create_checkout_session(order.id).await?;

        // 4. Commit: clear the cart only now that a redirect target exists
        self.transition(CheckoutState::Redirecting);
        self.cart.clear();

        Ok(CheckoutRedirect {
            order_id: order.id,
            order_number: order.order_number,
            checkout_url: session.checkout_url,
        })
    }
}
