//! Integration tests for cart persistence, reloads and schema migration.

use std::sync::Arc;

use cart::{
    CART_ITEMS_KEY, CART_VERSION_KEY, CartStore, EventSnapshot, InMemoryStorage, JsonFileStorage,
    KeyValueStorage, MigrationOutcome, SELECTED_EVENT_KEY, SelectedEvent,
};
use common::CartItemId;
use rust_decimal::Decimal;

struct Browser {
    local: InMemoryStorage,
    session: InMemoryStorage,
}

impl Browser {
    fn new() -> Self {
        Self {
            local: InMemoryStorage::new(),
            session: InMemoryStorage::new(),
        }
    }

    /// Simulates a page load: a fresh store over the same storage.
    fn open(&self) -> CartStore {
        CartStore::new(Arc::new(self.local.clone()), Arc::new(self.session.clone()))
    }
}

fn snapshot(title: &str, price: i64) -> EventSnapshot {
    EventSnapshot {
        event_title: title.to_string(),
        category_name: "Grandstand".to_string(),
        price: Decimal::from(price),
        venue: "Centre Court".to_string(),
        event_date: "20".to_string(),
        event_month: "Feb".to_string(),
        event_day: "Fri".to_string(),
        event_time: "14:00".to_string(),
    }
}

#[test]
fn test_cart_survives_reload() {
    let browser = Browser::new();

    let store = browser.open();
    store.load();
    store
        .add_or_merge_item(10, 1, 2, snapshot("Quarter-Final", 150))
        .unwrap();
    store
        .add_or_merge_item(11, 4, 1, snapshot("Semi-Final", 220))
        .unwrap();

    let reloaded = browser.open();
    let report = reloaded.load();

    assert_eq!(report.migration, MigrationOutcome::Current);
    assert_eq!(report.restored, 2);
    assert_eq!(report.dropped, 0);
    assert_eq!(reloaded.items(), store.items());
    assert_eq!(reloaded.total_value(), Decimal::from(520));
}

#[test]
fn test_version_mismatch_empties_cart_and_selection_cache() {
    for stale in [None, Some("0"), Some("2"), Some("4"), Some("garbage")] {
        let browser = Browser::new();
        if let Some(version) = stale {
            browser.local.set(CART_VERSION_KEY, version).unwrap();
        }
        browser
            .local
            .set(
                CART_ITEMS_KEY,
                r#"[{"id":"1-1","eventTitle":"Final","categoryName":"VIP","price":900,"quantity":2}]"#,
            )
            .unwrap();
        browser
            .session
            .set(SELECTED_EVENT_KEY, r#"{"id":1,"slug":"final","title":"Final"}"#)
            .unwrap();

        let store = browser.open();
        let report = store.load();

        assert!(
            matches!(report.migration, MigrationOutcome::Migrated { .. }),
            "version {stale:?} should migrate"
        );
        assert!(store.is_empty());
        assert!(!browser.session.contains(SELECTED_EVENT_KEY));
        assert!(!browser.local.contains(CART_ITEMS_KEY));
        assert_eq!(
            browser.local.get(CART_VERSION_KEY).unwrap().as_deref(),
            Some("3")
        );
    }
}

#[test]
fn test_invalid_ids_are_dropped_on_load() {
    let browser = Browser::new();
    browser.local.set(CART_VERSION_KEY, "3").unwrap();
    browser
        .local
        .set(
            CART_ITEMS_KEY,
            r#"[
                {"id":"5-2","eventTitle":"R16","categoryName":"Prime A","price":180.5,"quantity":1},
                {"id":"final-prime-a","eventTitle":"Final","categoryName":"Prime A","price":400,"quantity":2},
                {"id":"5-vip","eventTitle":"R16","categoryName":"VIP","price":600,"quantity":1},
                {"id":"6-3","eventTitle":"QF","categoryName":"Lower","price":120,"quantity":3},
                {"eventTitle":"No id","price":1,"quantity":1}
            ]"#,
        )
        .unwrap();

    let store = browser.open();
    let report = store.load();

    assert_eq!(report.restored, 2);
    assert_eq!(report.dropped, 3);
    let ids: Vec<CartItemId> = store.items().iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![CartItemId::new(5, 2), CartItemId::new(6, 3)]);
    assert_eq!(store.total_item_count(), 4);
}

#[test]
fn test_corrupt_payload_loads_empty() {
    let browser = Browser::new();
    browser.local.set(CART_VERSION_KEY, "3").unwrap();
    browser.local.set(CART_ITEMS_KEY, "{\"items\": 5").unwrap();

    let store = browser.open();
    let report = store.load();

    assert_eq!(report.migration, MigrationOutcome::Current);
    assert_eq!(report.restored, 0);
    assert!(store.is_empty());
}

#[test]
fn test_stale_tab_does_not_clobber_newer_cart_before_load() {
    let browser = Browser::new();

    let first_tab = browser.open();
    first_tab.load();
    first_tab
        .add_or_merge_item(1, 1, 1, snapshot("Final", 500))
        .unwrap();

    let second_tab = browser.open();
    second_tab.mutate(Vec::new());

    let reloaded = browser.open();
    reloaded.load();
    assert_eq!(reloaded.total_item_count(), 1);
}

#[test]
fn test_file_backed_cart_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let local = Arc::new(JsonFileStorage::new(dir.path().join("local.json")));
    let session = Arc::new(InMemoryStorage::new());

    let store = CartStore::new(local.clone(), session.clone());
    store.load();
    store
        .add_or_merge_item(3, 9, 2, snapshot("Semi-Final", 210))
        .unwrap();

    let reopened = CartStore::new(
        Arc::new(JsonFileStorage::new(dir.path().join("local.json"))),
        session,
    );
    let report = reopened.load();
    assert_eq!(report.restored, 1);
    assert_eq!(reopened.get(CartItemId::new(3, 9)).unwrap().quantity, 2);
}

#[test]
fn test_selected_event_survives_navigation_until_version_bump() {
    let browser = Browser::new();
    let store = browser.open();
    store.load();
    let event: SelectedEvent = serde_json::from_value(serde_json::json!({
        "id": 42,
        "slug": "mens-final",
        "title": "Men's Final",
        "venue": "Centre Court",
        "minPrice": 350
    }))
    .unwrap();
    store.selection_cache().remember(&event);

    let next_page = browser.open();
    next_page.load();
    assert_eq!(next_page.selection_cache().lookup("mens-final"), Some(event.clone()));
    assert_eq!(next_page.selection_cache().lookup("42"), Some(event));
    assert_eq!(next_page.selection_cache().lookup("womens-final"), None);

    browser.local.set(CART_VERSION_KEY, "2").unwrap();
    assert_eq!(next_page.selection_cache().lookup("mens-final"), None);
    assert!(!browser.session.contains(SELECTED_EVENT_KEY));
}
