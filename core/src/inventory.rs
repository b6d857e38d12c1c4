//! Slot-based inventory.
//!
//! Capacity counts distinct item ids, not total quantity. There is at
//! most one stack per id and never a stack of zero.

use crate::{
    error::{SimError, SimResult},
    types::ItemId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_id:  ItemId,
    pub quantity: u64,
}

impl ItemStack {
    pub fn new(item_id: impl Into<ItemId>, quantity: u64) -> Self {
        Self { item_id: item_id.into(), quantity }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub slots: Vec<ItemStack>,
}

impl Inventory {
    pub fn quantity_of(&self, item_id: &str) -> u64 {
        self.slots
            .iter()
            .find(|s| s.item_id == item_id)
            .map(|s| s.quantity)
            .unwrap_or(0)
    }

    pub fn distinct_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether every requirement is covered, summing duplicate ids.
    pub fn contains_all(&self, requirements: &[ItemStack]) -> bool {
        let mut needed: std::collections::BTreeMap<&str, u64> = std::collections::BTreeMap::new();
        for r in requirements {
            *needed.entry(r.item_id.as_str()).or_insert(0) += r.quantity;
        }
        needed.iter().all(|(id, qty)| self.quantity_of(id) >= *qty)
    }

    /// Distinct-id count after removing `removals` then adding `additions`.
    /// Removals that would go negative are treated as emptying the slot.
    pub fn slots_after(&self, removals: &[ItemStack], additions: &[ItemStack]) -> usize {
        let mut ids: BTreeSet<&str> = self.slots.iter().map(|s| s.item_id.as_str()).collect();
        for r in removals {
            let removed: u64 = removals
                .iter()
                .filter(|x| x.item_id == r.item_id)
                .map(|x| x.quantity)
                .sum();
            if removed >= self.quantity_of(&r.item_id) {
                ids.remove(r.item_id.as_str());
            }
        }
        for a in additions {
            if a.quantity > 0 {
                ids.insert(a.item_id.as_str());
            }
        }
        ids.len()
    }

    pub fn fits_after(&self, removals: &[ItemStack], additions: &[ItemStack], capacity: usize) -> bool {
        self.slots_after(removals, additions) <= capacity
    }

    /// Add to an existing stack or open a new slot.
    pub fn add(&mut self, item_id: &str, quantity: u64, capacity: usize) -> SimResult<()> {
        if quantity == 0 {
            return Ok(());
        }
        if let Some(slot) = self.slots.iter_mut().find(|s| s.item_id == item_id) {
            slot.quantity += quantity;
            return Ok(());
        }
        if self.slots.len() >= capacity {
            return Err(SimError::InvariantViolation(format!(
                "inventory full ({capacity} slots) adding {item_id}"
            )));
        }
        self.slots.push(ItemStack::new(item_id, quantity));
        Ok(())
    }

    /// Remove from a stack, closing the slot when it reaches zero.
    pub fn remove(&mut self, item_id: &str, quantity: u64) -> SimResult<()> {
        let idx = self
            .slots
            .iter()
            .position(|s| s.item_id == item_id)
            .ok_or_else(|| SimError::InvariantViolation(format!("no {item_id} in inventory")))?;
        let slot = &mut self.slots[idx];
        if slot.quantity < quantity {
            return Err(SimError::InvariantViolation(format!(
                "removing {quantity} {item_id}, only {} held",
                slot.quantity
            )));
        }
        slot.quantity -= quantity;
        if slot.quantity == 0 {
            self.slots.remove(idx);
        }
        Ok(())
    }
}
