//! The cart store: in-memory cart state backed by durable storage.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use common::CartItemId;
use rust_decimal::Decimal;
use tokio::sync::watch;

use crate::error::CartError;
use crate::item::{CartItem, EventSnapshot};
use crate::selection::SelectedEventCache;
use crate::storage::KeyValueStorage;

/// Durable key holding the serialized item array.
pub const CART_ITEMS_KEY: &str = "cart";

/// Durable key holding the cart schema version.
pub const CART_VERSION_KEY: &str = "cart-version";

/// Ephemeral key holding the last-viewed event.
pub const SELECTED_EVENT_KEY: &str = "selectedEvent";

/// Current cart schema version. Any other stored value triggers a hard migration.
pub const CURRENT_CART_VERSION: u32 = 3;

/// Result of the bootstrap schema-version check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The stored version matched; the persisted cart is kept.
    Current,

    /// The stored version was missing or different; persisted data was discarded.
    Migrated { from: Option<u32> },

    /// Storage could not be read or migrated; the cart runs in memory only.
    StorageUnavailable,
}

/// Summary of a cart load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub migration: MigrationOutcome,
    /// Items restored from storage.
    pub restored: usize,
    /// Stored items discarded as invalid (legacy ids, unexpected shape).
    pub dropped: usize,
}

#[derive(Debug, Default)]
struct CartState {
    items: Vec<CartItem>,
    migration: Option<MigrationOutcome>,
    hydrated: bool,
}

struct Inner {
    durable: Arc<dyn KeyValueStorage>,
    ephemeral: Arc<dyn KeyValueStorage>,
    state: Mutex<CartState>,
    items_tx: watch::Sender<Vec<CartItem>>,
}

/// Single source of truth for the cart.
///
/// Clones share the same state. Consumers observe changes through
/// [`CartStore::subscribe`].
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("CartStore")
            .field("items", &state.items.len())
            .field("hydrated", &state.hydrated)
            .finish()
    }
}

impl CartStore {
    /// Creates an empty, not-yet-hydrated store over the given backends.
    pub fn new(durable: Arc<dyn KeyValueStorage>, ephemeral: Arc<dyn KeyValueStorage>) -> Self {
        let (items_tx, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                durable,
                ephemeral,
                state: Mutex::new(CartState::default()),
                items_tx,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CartState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs the schema-version check once per store.
    ///
    /// On mismatch the selected-event cache is cleared first, then the
    /// persisted cart, and only then is the new version stamped. If the
    /// cart cannot be removed the version is left untouched, so stale items
    /// are never paired with a current version. Later calls return the
    /// first outcome without touching storage.
    pub fn initialize(&self) -> MigrationOutcome {
        let mut state = self.lock();
        if let Some(outcome) = state.migration {
            return outcome;
        }
        let outcome = self.migrate_if_needed();
        state.migration = Some(outcome);
        outcome
    }

    fn migrate_if_needed(&self) -> MigrationOutcome {
        let stored = match self.inner.durable.get(CART_VERSION_KEY) {
            Ok(value) => value.and_then(|v| v.trim().parse::<u32>().ok()),
            Err(e) => {
                tracing::warn!(error = %e, "cart storage unreadable, running in memory only");
                return MigrationOutcome::StorageUnavailable;
            }
        };

        if stored == Some(CURRENT_CART_VERSION) {
            return MigrationOutcome::Current;
        }

        if let Err(e) = self.inner.ephemeral.remove(SELECTED_EVENT_KEY) {
            tracing::warn!(error = %e, "failed to clear selected-event cache");
        }
        if let Err(e) = self.inner.durable.remove(CART_ITEMS_KEY) {
            tracing::warn!(error = %e, "failed to discard stale cart");
            return MigrationOutcome::StorageUnavailable;
        }
        if let Err(e) = self
            .inner
            .durable
            .set(CART_VERSION_KEY, &CURRENT_CART_VERSION.to_string())
        {
            tracing::warn!(error = %e, "failed to stamp cart version");
        }

        metrics::counter!("cart_migrations_total").increment(1);
        tracing::info!(
            from = ?stored,
            to = CURRENT_CART_VERSION,
            "cart schema version changed, stored cart discarded"
        );
        MigrationOutcome::Migrated { from: stored }
    }

    /// Hydrates the store from durable storage.
    ///
    /// Runs [`CartStore::initialize`] first. Items whose id is not two
    /// integers, or whose shape is unexpected, are dropped and counted.
    /// Corrupt payloads load as an empty cart. After this call mutations
    /// are persisted.
    pub fn load(&self) -> LoadReport {
        let migration = self.initialize();

        let (items, dropped) = match migration {
            MigrationOutcome::Current => self.read_items(),
            MigrationOutcome::Migrated { .. } | MigrationOutcome::StorageUnavailable => {
                (Vec::new(), 0)
            }
        };

        if dropped > 0 {
            metrics::counter!("cart_items_dropped_total").increment(dropped as u64);
            tracing::warn!(dropped, "discarded invalid cart items");
        }

        let restored = items.len();
        let mut state = self.lock();
        state.items = items;
        state.hydrated = true;
        self.inner.items_tx.send_replace(state.items.clone());
        drop(state);

        tracing::debug!(restored, "cart loaded");
        LoadReport {
            migration,
            restored,
            dropped,
        }
    }

    fn read_items(&self) -> (Vec<CartItem>, usize) {
        let raw = match self.inner.durable.get(CART_ITEMS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return (Vec::new(), 0),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored cart");
                return (Vec::new(), 0);
            }
        };

        let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!(error = %e, "stored cart is corrupt, starting empty");
                return (Vec::new(), 0);
            }
        };

        let total = values.len();
        let items: Vec<CartItem> = values
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect();
        let dropped = total - items.len();
        (items, dropped)
    }

    fn persist(&self, items: &[CartItem]) {
        let payload = match serde_json::to_string(items) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize cart");
                return;
            }
        };
        let result = self
            .inner
            .durable
            .set(CART_ITEMS_KEY, &payload)
            .and_then(|()| {
                self.inner
                    .durable
                    .set(CART_VERSION_KEY, &CURRENT_CART_VERSION.to_string())
            });
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist cart, keeping it in memory");
        }
    }

    /// Replaces the cart contents.
    ///
    /// The new contents are persisted only if the store has been hydrated;
    /// before that, writing would overwrite a cart that has not been read.
    pub fn mutate(&self, new_items: Vec<CartItem>) {
        self.update(|items| *items = new_items);
    }

    fn update<R>(&self, f: impl FnOnce(&mut Vec<CartItem>) -> R) -> R {
        let mut state = self.lock();
        let result = f(&mut state.items);
        if state.hydrated {
            self.persist(&state.items);
        }
        self.inner.items_tx.send_replace(state.items.clone());
        result
    }

    /// Adds `quantity` tickets of a category, merging into an existing line.
    ///
    /// No upper bound is applied here.
    pub fn add_or_merge_item(
        &self,
        event_id: u64,
        category_id: u64,
        quantity: u32,
        snapshot: EventSnapshot,
    ) -> Result<CartItemId, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }
        let id = CartItemId::new(event_id, category_id);
        self.update(|items| match items.iter_mut().find(|item| item.id == id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity),
            None => items.push(CartItem::from_snapshot(id, quantity, snapshot)),
        });
        tracing::debug!(%id, quantity, "added to cart");
        Ok(id)
    }

    /// Removes a line item entirely. Returns false if no such line existed.
    pub fn remove_item(&self, id: CartItemId) -> bool {
        self.update(|items| {
            let before = items.len();
            items.retain(|item| item.id != id);
            items.len() != before
        })
    }

    /// Empties the cart and persists immediately, hydrated or not.
    ///
    /// The schema-version check runs first so a stale stored version is
    /// migrated rather than overwritten by the stamp.
    pub fn clear(&self) {
        self.initialize();
        let mut state = self.lock();
        state.items.clear();
        self.persist(&state.items);
        self.inner.items_tx.send_replace(Vec::new());
        tracing::debug!("cart cleared");
    }

    /// Returns a snapshot of the current items.
    pub fn items(&self) -> Vec<CartItem> {
        self.lock().items.clone()
    }

    /// Returns the line item with the given id.
    pub fn get(&self, id: CartItemId) -> Option<CartItem> {
        self.lock().items.iter().find(|item| item.id == id).cloned()
    }

    /// Returns true if the cart has no items.
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Returns true once [`CartStore::load`] has completed.
    pub fn is_hydrated(&self) -> bool {
        self.lock().hydrated
    }

    /// Sum of all quantities.
    pub fn total_item_count(&self) -> u32 {
        self.lock().items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of `price × quantity` over all items.
    pub fn total_value(&self) -> Decimal {
        self.lock().items.iter().map(CartItem::line_total).sum()
    }

    /// Subscribes to cart changes. The receiver always holds the latest items.
    pub fn subscribe(&self) -> watch::Receiver<Vec<CartItem>> {
        self.inner.items_tx.subscribe()
    }

    /// Returns the selected-event cache sharing this store's backends.
    pub fn selection_cache(&self) -> SelectedEventCache {
        SelectedEventCache::new(self.inner.durable.clone(), self.inner.ephemeral.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;

    fn snapshot(price: i64) -> EventSnapshot {
        EventSnapshot {
            event_title: "WTA Final".to_string(),
            category_name: "Prime B".to_string(),
            price: Decimal::from(price),
            ..EventSnapshot::default()
        }
    }

    fn setup() -> (CartStore, InMemoryStorage, InMemoryStorage) {
        let durable = InMemoryStorage::new();
        let ephemeral = InMemoryStorage::new();
        let store = CartStore::new(Arc::new(durable.clone()), Arc::new(ephemeral.clone()));
        (store, durable, ephemeral)
    }

    #[test]
    fn test_first_visit_stamps_version() {
        let (store, durable, _) = setup();
        let report = store.load();

        assert_eq!(report.migration, MigrationOutcome::Migrated { from: None });
        assert_eq!(
            durable.get(CART_VERSION_KEY).unwrap().as_deref(),
            Some("3")
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let (store, durable, _) = setup();
        durable.set(CART_VERSION_KEY, "2").unwrap();

        assert_eq!(
            store.initialize(),
            MigrationOutcome::Migrated { from: Some(2) }
        );
        durable.set(CART_ITEMS_KEY, "[]").unwrap();
        assert_eq!(
            store.initialize(),
            MigrationOutcome::Migrated { from: Some(2) }
        );
        assert!(durable.contains(CART_ITEMS_KEY));
    }

    #[test]
    fn test_add_merges_same_category() {
        let (store, _, _) = setup();
        store.load();

        store.add_or_merge_item(1, 2, 2, snapshot(100)).unwrap();
        store.add_or_merge_item(1, 2, 3, snapshot(100)).unwrap();

        let items = store.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
    }

    #[test]
    fn test_add_rejects_zero_quantity() {
        let (store, _, _) = setup();
        let result = store.add_or_merge_item(1, 2, 0, snapshot(100));
        assert!(matches!(
            result,
            Err(CartError::InvalidQuantity { quantity: 0 })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_leaves_other_items() {
        let (store, _, _) = setup();
        store.load();
        store.add_or_merge_item(1, 1, 2, snapshot(50)).unwrap();
        store.add_or_merge_item(1, 2, 3, snapshot(75)).unwrap();
        store.add_or_merge_item(2, 1, 1, snapshot(90)).unwrap();

        assert!(store.remove_item(CartItemId::new(1, 2)));
        assert!(!store.remove_item(CartItemId::new(9, 9)));

        let items = store.items();
        assert_eq!(items.len(), 2);
        assert_eq!(store.get(CartItemId::new(1, 1)).unwrap().quantity, 2);
        assert_eq!(store.get(CartItemId::new(2, 1)).unwrap().quantity, 1);
    }

    #[test]
    fn test_totals() {
        let (store, _, _) = setup();
        assert_eq!(store.total_item_count(), 0);
        assert_eq!(store.total_value(), Decimal::ZERO);

        store.add_or_merge_item(1, 1, 2, snapshot(50)).unwrap();
        store.add_or_merge_item(1, 2, 3, snapshot(75)).unwrap();

        assert_eq!(store.total_item_count(), 5);
        assert_eq!(store.total_value(), Decimal::from(325));
    }

    #[test]
    fn test_mutations_before_load_are_not_persisted() {
        let (store, durable, _) = setup();
        durable.set(CART_VERSION_KEY, "3").unwrap();
        durable
            .set(
                CART_ITEMS_KEY,
                r#"[{"id":"7-1","eventTitle":"Final","categoryName":"VIP","price":500,"quantity":1}]"#,
            )
            .unwrap();

        store.add_or_merge_item(1, 1, 1, snapshot(10)).unwrap();
        let stored = durable.get(CART_ITEMS_KEY).unwrap().unwrap();
        assert!(stored.contains("7-1"));
        assert!(!stored.contains("1-1"));

        let report = store.load();
        assert_eq!(report.restored, 1);
        assert_eq!(store.items()[0].id, CartItemId::new(7, 1));
    }

    #[test]
    fn test_clear_persists_immediately() {
        let (store, durable, _) = setup();
        store.load();
        store.add_or_merge_item(1, 1, 1, snapshot(10)).unwrap();

        store.clear();

        assert!(store.is_empty());
        assert_eq!(durable.get(CART_ITEMS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_clear_before_load_still_migrates() {
        let (store, durable, ephemeral) = setup();
        durable.set(CART_VERSION_KEY, "2").unwrap();
        durable
            .set(CART_ITEMS_KEY, r#"[{"id":"mens-final","quantity":1}]"#)
            .unwrap();
        ephemeral
            .set(SELECTED_EVENT_KEY, r#"{"id":42,"slug":"mens-final"}"#)
            .unwrap();

        store.clear();
        let report = store.load();

        assert_eq!(report.migration, MigrationOutcome::Migrated { from: Some(2) });
        assert!(!ephemeral.contains(SELECTED_EVENT_KEY));
        assert_eq!(durable.get(CART_VERSION_KEY).unwrap().as_deref(), Some("3"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_write_failures_degrade_to_memory() {
        let (store, durable, _) = setup();
        store.load();
        durable.set_fail_on_write(true);

        store.add_or_merge_item(1, 1, 2, snapshot(10)).unwrap();
        store.clear();
        store.add_or_merge_item(3, 4, 1, snapshot(10)).unwrap();

        assert_eq!(store.total_item_count(), 1);
    }

    #[test]
    fn test_read_failure_runs_in_memory() {
        let (store, durable, _) = setup();
        durable.set_fail_on_read(true);

        let report = store.load();
        assert_eq!(report.migration, MigrationOutcome::StorageUnavailable);
        assert!(store.is_hydrated());

        store.add_or_merge_item(1, 1, 1, snapshot(10)).unwrap();
        assert_eq!(store.total_item_count(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let (store, _, _) = setup();
        store.load();
        let mut rx = store.subscribe();

        store.add_or_merge_item(4, 2, 2, snapshot(10)).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);

        store.clear();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_empty());
    }
}
