//! Ticket quantity selector used before adding a category to the cart.

/// Global per-order ticket cap applied by the selector.
pub const MAX_TICKETS_PER_ORDER: u32 = 4;

/// Quantity selector bounded by remaining inventory and the per-order cap.
///
/// The cart itself does not enforce these bounds; merging the same category
/// twice can exceed them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketPicker {
    count: u32,
    limit: u32,
}

impl TicketPicker {
    /// Creates a selector at quantity 1 for a category with `seats_left` seats.
    ///
    /// Unknown or zero inventory falls back to the per-order cap.
    pub fn new(seats_left: Option<u32>) -> Self {
        let seats = match seats_left {
            Some(0) | None => MAX_TICKETS_PER_ORDER,
            Some(n) => n,
        };
        Self {
            count: 1,
            limit: seats.min(MAX_TICKETS_PER_ORDER),
        }
    }

    /// Returns the selected quantity.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Returns the highest selectable quantity.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Raises the quantity by one, up to the limit.
    pub fn increment(&mut self) -> u32 {
        self.count = (self.count + 1).min(self.limit);
        self.count
    }

    /// Lowers the quantity by one, never below 1.
    pub fn decrement(&mut self) -> u32 {
        self.count = self.count.saturating_sub(1).max(1);
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_one() {
        assert_eq!(TicketPicker::new(Some(10)).count(), 1);
    }

    #[test]
    fn test_capped_by_per_order_maximum() {
        let mut picker = TicketPicker::new(Some(50));
        for _ in 0..10 {
            picker.increment();
        }
        assert_eq!(picker.count(), MAX_TICKETS_PER_ORDER);
    }

    #[test]
    fn test_capped_by_seats_left() {
        let mut picker = TicketPicker::new(Some(2));
        picker.increment();
        picker.increment();
        assert_eq!(picker.count(), 2);
        assert_eq!(picker.limit(), 2);
    }

    #[test]
    fn test_unknown_inventory_uses_per_order_cap() {
        assert_eq!(TicketPicker::new(None).limit(), 4);
        assert_eq!(TicketPicker::new(Some(0)).limit(), 4);
    }

    #[test]
    fn test_decrement_floors_at_one() {
        let mut picker = TicketPicker::new(Some(4));
        picker.increment();
        assert_eq!(picker.decrement(), 1);
        assert_eq!(picker.decrement(), 1);
    }
}
