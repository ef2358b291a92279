//! Purchase confirmation tracking for the order-result page.
//!
//! Payment confirmation usually reaches the order service a few seconds
//! after the buyer lands on the order page (webhook latency). The tracker
//! fires the purchase conversion event exactly once per order, either
//! immediately when the order is already paid, or after a bounded poll of
//! the order-status endpoint observes `paid`.
//!
//! A per-session dedup key (`purchase_tracked_<order_id>`) keeps reloads
//! and back-navigation from counting the same purchase twice.

pub mod conversion;
pub mod error;
pub mod poll;
pub mod source;
pub mod tracker;

pub use conversion::{
    ConversionEvent, ConversionItem, ConversionSink, RecordingConversionSink,
    TracingConversionSink,
};
pub use error::TrackerError;
pub use poll::{PollHandle, PollOutcome};
pub use source::{OrderStatusSource, ScriptedStatusSource};
pub use tracker::{PurchaseTracker, PurchaseTrackerBuilder, TrackerConfig, dedup_key};
