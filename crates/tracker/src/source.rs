//! Order-status source trait and scripted in-memory implementation.

use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::{Order, OrderId, OrderStatus};

use crate::error::TrackerError;

/// Trait for the idempotent order-status read.
///
/// Implementations must bypass any response cache: the value being read
/// changes out-of-band.
#[async_trait]
pub trait OrderStatusSource: Send + Sync {
    /// Reads the current state of an order.
    async fn fetch_order(&self, order_id: OrderId) -> Result<Order, TrackerError>;

    /// Reads only the order's status. Used on every poll tick.
    ///
    /// Implementations that can decode the status alone should override
    /// this, so a partial payload still reports `paid`.
    async fn fetch_status(&self, order_id: OrderId) -> Result<OrderStatus, TrackerError> {
        Ok(self.fetch_order(order_id).await?.status)
    }
}

#[derive(Debug)]
struct ScriptedState {
    template: Order,
    script: VecDeque<Option<OrderStatus>>,
    fallback: Option<OrderStatus>,
    calls: usize,
}

/// Status source replaying a scripted sequence of responses, for testing.
///
/// Each call pops the next scripted entry (`None` is a transport error).
/// Once the script is exhausted every call answers with the fallback.
#[derive(Debug, Clone)]
pub struct ScriptedStatusSource {
    state: Arc<RwLock<ScriptedState>>,
}

impl ScriptedStatusSource {
    /// Creates a source answering with `template` at its own status.
    pub fn new(template: Order) -> Self {
        let fallback = Some(template.status);
        Self {
            state: Arc::new(RwLock::new(ScriptedState {
                template,
                script: VecDeque::new(),
                fallback,
                calls: 0,
            })),
        }
    }

    /// Queues a successful response with the given status.
    pub fn push_status(&self, status: OrderStatus) -> &Self {
        self.write().script.push_back(Some(status));
        self
    }

    /// Queues a transport error.
    pub fn push_error(&self) -> &Self {
        self.write().script.push_back(None);
        self
    }

    /// Sets the answer once the script runs out (`None` fails every call).
    pub fn set_fallback(&self, status: Option<OrderStatus>) {
        self.write().fallback = status;
    }

    /// Returns the number of reads served.
    pub fn call_count(&self) -> usize {
        self.state.read().unwrap_or_else(PoisonError::into_inner).calls
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, ScriptedState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl OrderStatusSource for ScriptedStatusSource {
    async fn fetch_order(&self, order_id: OrderId) -> Result<Order, TrackerError> {
        let mut state = self.write();
        state.calls += 1;

        if state.template.id != order_id {
            return Err(TrackerError::OrderNotFound(order_id));
        }

        let next = match state.script.pop_front() {
            Some(entry) => entry,
            None => state.fallback,
        };
        match next {
            Some(status) => Ok(Order {
                status,
                ..state.template.clone()
            }),
            None => Err(TrackerError::Transport("connection reset".to_string())),
        }
    }
}
