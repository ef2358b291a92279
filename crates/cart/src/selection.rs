//! Session-scoped cache of the last-viewed event.
//!
//! The event page reads it as a fast path to skip a catalog round-trip. It is
//! only trusted while the stored cart schema version is current; an old-format
//! event object must never be read after a breaking change.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::storage::KeyValueStorage;
use crate::store::{CART_VERSION_KEY, CURRENT_CART_VERSION, SELECTED_EVENT_KEY};

/// Event identifier as the catalog reports it: numeric, or a legacy string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventKey {
    Numeric(u64),
    Text(String),
}

impl std::fmt::Display for EventKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKey::Numeric(id) => write!(f, "{id}"),
            EventKey::Text(id) => write!(f, "{id}"),
        }
    }
}

/// Snapshot of a catalog event as cached between pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedEvent {
    pub id: EventKey,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub min_price: Option<Decimal>,
}

impl SelectedEvent {
    /// Returns true if `slug_or_id` names this event by slug or by id.
    pub fn matches(&self, slug_or_id: &str) -> bool {
        self.slug == slug_or_id || self.id.to_string() == slug_or_id
    }
}

/// Reads and writes the selected-event cache.
#[derive(Debug, Clone)]
pub struct SelectedEventCache {
    durable: Arc<dyn KeyValueStorage>,
    ephemeral: Arc<dyn KeyValueStorage>,
}

impl SelectedEventCache {
    /// Creates a cache over the durable (version) and ephemeral (event) stores.
    pub fn new(durable: Arc<dyn KeyValueStorage>, ephemeral: Arc<dyn KeyValueStorage>) -> Self {
        Self { durable, ephemeral }
    }

    fn version_is_current(&self) -> bool {
        match self.durable.get(CART_VERSION_KEY) {
            Ok(Some(v)) => v.trim().parse::<u32>().ok() == Some(CURRENT_CART_VERSION),
            Ok(None) | Err(_) => false,
        }
    }

    /// Caches `event` as the last-viewed event.
    pub fn remember(&self, event: &SelectedEvent) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize selected event");
                return;
            }
        };
        if let Err(e) = self.ephemeral.set(SELECTED_EVENT_KEY, &payload) {
            tracing::warn!(error = %e, "failed to cache selected event");
        }
    }

    /// Returns the cached event if it matches `slug_or_id` and can be trusted.
    ///
    /// A stale schema version removes the cached entry.
    pub fn lookup(&self, slug_or_id: &str) -> Option<SelectedEvent> {
        if !self.version_is_current() {
            tracing::debug!("storage version mismatch, clearing selected-event cache");
            if let Err(e) = self.ephemeral.remove(SELECTED_EVENT_KEY) {
                tracing::warn!(error = %e, "failed to clear selected-event cache");
            }
            return None;
        }

        let raw = self.ephemeral.get(SELECTED_EVENT_KEY).ok().flatten()?;
        match serde_json::from_str::<SelectedEvent>(&raw) {
            Ok(event) if event.matches(slug_or_id) => Some(event),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unreadable selected-event cache");
                None
            }
        }
    }
}
