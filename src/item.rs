use serde::Serialize;

use crate::error::InventoryError;

// ============================================================================
// Inventory
// ============================================================================

pub const INVENTORY_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventorySlot {
    pub item_id: u32,
    pub quantity: u32,
}

impl InventorySlot {
    pub fn new(item_id: u32, quantity: u32) -> Self {
        Self { item_id, quantity }
    }
}

#[derive(Debug, Clone)]
pub struct Inventory {
    pub slots: Vec<Option<InventorySlot>>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::with_capacity(INVENTORY_SIZE)
    }

    pub fn with_capacity(size: usize) -> Self {
        Self {
            slots: vec![None; size],
        }
    }

    /// How many units of `item_id` fit right now
    fn free_space_for(&self, item_id: u32, max_stack: u32) -> u64 {
        self.slots
            .iter()
            .map(|slot| match slot {
                Some(s) if s.item_id == item_id => u64::from(max_stack.saturating_sub(s.quantity)),
                Some(_) => 0,
                None => u64::from(max_stack),
            })
            .sum()
    }

    /// Add an item to the inventory.
    ///
    /// All-or-nothing: when the full quantity doesn't fit nothing is added
    /// and `InventoryFull` is returned.
    pub fn add_item(&mut self, item_id: u32, quantity: u32, max_stack: u32) -> Result<(), InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::InvalidAmount(quantity));
        }
        let max_stack = max_stack.max(1);

        if self.free_space_for(item_id, max_stack) < u64::from(quantity) {
            return Err(InventoryError::InventoryFull);
        }

        let mut remaining = quantity;

        // First, try to stack with existing items
        for slot in self.slots.iter_mut().flatten() {
            if remaining == 0 {
                break;
            }
            if slot.item_id == item_id && slot.quantity < max_stack {
                let add = remaining.min(max_stack - slot.quantity);
                slot.quantity += add;
                remaining -= add;
            }
        }

        // Then, fill empty slots with the remainder
        for slot in &mut self.slots {
            if remaining == 0 {
                break;
            }
            if slot.is_none() {
                let add = remaining.min(max_stack);
                *slot = Some(InventorySlot::new(item_id, add));
                remaining -= add;
            }
        }

        Ok(())
    }

    /// Total units of an item across all slots
    pub fn count_item(&self, item_id: u32) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.item_id == item_id)
            .map(|s| s.quantity)
            .sum()
    }

    pub fn free_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stacks_before_using_new_slots() {
        let mut inv = Inventory::with_capacity(3);
        inv.add_item(501, 5, 10).unwrap();
        inv.add_item(501, 7, 10).unwrap();

        assert_eq!(inv.count_item(501), 12);
        assert_eq!(inv.slots[0], Some(InventorySlot::new(501, 10)));
        assert_eq!(inv.slots[1], Some(InventorySlot::new(501, 2)));
        assert_eq!(inv.free_slots(), 1);
    }

    #[test]
    fn test_full_inventory_rejects_without_partial_add() {
        let mut inv = Inventory::with_capacity(2);
        inv.add_item(1201, 1, 1).unwrap();
        inv.add_item(1202, 1, 1).unwrap();

        assert_eq!(inv.add_item(1203, 1, 1), Err(InventoryError::InventoryFull));
        assert_eq!(inv.count_item(1203), 0);

        let mut inv = Inventory::with_capacity(1);
        assert_eq!(inv.add_item(501, 15, 10), Err(InventoryError::InventoryFull));
        assert_eq!(inv.count_item(501), 0);
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        let mut inv = Inventory::new();
        assert_eq!(inv.add_item(501, 0, 10), Err(InventoryError::InvalidAmount(0)));
    }
}
