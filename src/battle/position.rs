//! Slot occupancy board
//!
//! Tracks which combatants stand in which slot. A combatant is registered in
//! at most one slot; moving always removes it from every slot first.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::combat::Combatant;
use crate::core::error::{BattleError, Result};
use crate::core::types::{CombatantId, Posture, Slot};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionBoard {
    slots: AHashMap<Slot, Vec<CombatantId>>,
}

impl Default for PositionBoard {
    fn default() -> Self {
        Self::new(Slot::cardinal())
    }
}

impl PositionBoard {
    /// Board with the given slots registered
    pub fn new(layout: &[Slot]) -> Self {
        let slots = layout.iter().map(|slot| (*slot, Vec::new())).collect();
        Self { slots }
    }

    pub fn has_slot(&self, slot: Slot) -> bool {
        self.slots.contains_key(&slot)
    }

    /// Registered slots in declaration order
    pub fn layout(&self) -> Vec<Slot> {
        [Slot::North, Slot::East, Slot::South, Slot::West, Slot::Center]
            .into_iter()
            .filter(|slot| self.has_slot(*slot))
            .collect()
    }

    /// Move a combatant to `slot`. Fails only if the slot is not on this board,
    /// in which case nothing changes.
    pub fn move_to(&mut self, unit: &mut Combatant, slot: Slot) -> Result<()> {
        if !self.has_slot(slot) {
            return Err(BattleError::InvalidSlot(slot.to_string()));
        }

        self.remove(unit.id());
        if let Some(occupants) = self.slots.get_mut(&slot) {
            occupants.push(unit.id());
            tracing::debug!(
                "{} moved to {} ({} occupant(s))",
                unit.name(),
                slot,
                occupants.len()
            );
        }
        unit.set_slot(slot);
        Ok(())
    }

    /// Take a combatant off the board entirely
    pub fn remove(&mut self, id: CombatantId) {
        for occupants in self.slots.values_mut() {
            occupants.retain(|occupant| *occupant != id);
        }
    }

    pub fn count_at(&self, slot: Slot) -> usize {
        self.slots.get(&slot).map_or(0, |occupants| occupants.len())
    }

    pub fn occupants_at(&self, slot: Slot) -> &[CombatantId] {
        self.slots
            .get(&slot)
            .map(|occupants| occupants.as_slice())
            .unwrap_or(&[])
    }

    pub fn slot_of(&self, id: CombatantId) -> Option<Slot> {
        self.slots
            .iter()
            .find(|(_, occupants)| occupants.contains(&id))
            .map(|(slot, _)| *slot)
    }

    /// Guard needs company in the slot
    pub fn can_guard(&self, slot: Slot) -> bool {
        self.count_at(slot) >= 2
    }

    /// Parry needs the defender alone in the slot
    pub fn can_parry(&self, slot: Slot) -> bool {
        self.count_at(slot) == 1
    }

    pub fn can_dodge(&self, _slot: Slot) -> bool {
        true
    }

    pub fn posture_available(&self, posture: Posture, slot: Slot) -> bool {
        match posture {
            Posture::None => true,
            Posture::Guard => self.can_guard(slot),
            Posture::Dodge => self.can_dodge(slot),
            Posture::Parry => self.can_parry(slot),
        }
    }
}
