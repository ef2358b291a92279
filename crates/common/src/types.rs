use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Composite key of a cart line item: `"<event_id>-<category_id>"`.
///
/// Both halves must be integers. Legacy slug-based ids (e.g. `"final-prime-a"`)
/// fail to parse, which is how stale cart entries are detected on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CartItemId {
    event_id: u64,
    category_id: u64,
}

impl CartItemId {
    /// Creates a composite id from its two halves.
    pub fn new(event_id: u64, category_id: u64) -> Self {
        Self {
            event_id,
            category_id,
        }
    }

    /// Returns the event half of the id.
    pub fn event_id(&self) -> u64 {
        self.event_id
    }

    /// Returns the seating-category half of the id.
    pub fn category_id(&self) -> u64 {
        self.category_id
    }
}

impl std::fmt::Display for CartItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.event_id, self.category_id)
    }
}

/// Error returned when a string is not a valid composite id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid cart item id: {0:?}")]
pub struct InvalidCartItemId(pub String);

impl FromStr for CartItemId {
    type Err = InvalidCartItemId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidCartItemId(s.to_string());
        let (event, category) = s.split_once('-').ok_or_else(invalid)?;
        let event_id = event.parse::<u64>().map_err(|_| invalid())?;
        let category_id = category.parse::<u64>().map_err(|_| invalid())?;
        Ok(Self::new(event_id, category_id))
    }
}

impl TryFrom<String> for CartItemId {
    type Error = InvalidCartItemId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CartItemId> for String {
    fn from(id: CartItemId) -> Self {
        id.to_string()
    }
}

/// Identifier of an order owned by the external order service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random order ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an order ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for OrderId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cart_item_id_display_joins_with_hyphen() {
        assert_eq!(CartItemId::new(12, 7).to_string(), "12-7");
    }

    #[test]
    fn cart_item_id_parses_integer_halves() {
        let id: CartItemId = "42-3".parse().unwrap();
        assert_eq!(id.event_id(), 42);
        assert_eq!(id.category_id(), 3);
    }

    #[test]
    fn cart_item_id_rejects_legacy_slugs() {
        assert!("final-prime-a".parse::<CartItemId>().is_err());
        assert!("12-grandstand".parse::<CartItemId>().is_err());
        assert!("12".parse::<CartItemId>().is_err());
        assert!("12-3-4".parse::<CartItemId>().is_err());
        assert!("-3".parse::<CartItemId>().is_err());
        assert!("".parse::<CartItemId>().is_err());
    }

    #[test]
    fn cart_item_id_serializes_as_string() {
        let id = CartItemId::new(5, 9);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"5-9\"");

        let parsed: CartItemId = serde_json::from_str("\"5-9\"").unwrap();
        assert_eq!(parsed, id);
        assert!(serde_json::from_str::<CartItemId>("\"vip-box\"").is_err());
    }

    #[test]
    fn order_id_new_creates_unique_ids() {
        assert_ne!(OrderId::new(), OrderId::new());
    }

    #[test]
    fn order_id_parses_uuid_strings() {
        let uuid = Uuid::new_v4();
        let id: OrderId = uuid.to_string().parse().unwrap();
        assert_eq!(id.as_uuid(), uuid);
        assert!("not-a-uuid".parse::<OrderId>().is_err());
    }
}
