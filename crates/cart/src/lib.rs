//! Client-side cart for the ticket storefront.
//!
//! The cart is a list of line items keyed by `"<event_id>-<category_id>"`,
//! persisted to durable key/value storage together with a schema version.
//! On bootstrap the stored version is checked first; a mismatch wipes the
//! persisted cart (and the session-scoped selected-event cache) before any
//! consumer can read it.
//!
//! Mutations are persisted only once the store has been hydrated from
//! storage, so a fresh store can never clobber a cart it has not read yet.

pub mod error;
pub mod item;
pub mod picker;
pub mod selection;
pub mod storage;
pub mod store;

pub use error::{CartError, StorageError};
pub use item::{CartItem, EventSnapshot};
pub use picker::{MAX_TICKETS_PER_ORDER, TicketPicker};
pub use selection::{EventKey, SelectedEvent, SelectedEventCache};
pub use storage::{InMemoryStorage, JsonFileStorage, KeyValueStorage};
pub use store::{
    CART_ITEMS_KEY, CART_VERSION_KEY, CURRENT_CART_VERSION, CartStore, LoadReport,
    MigrationOutcome, SELECTED_EVENT_KEY,
};
