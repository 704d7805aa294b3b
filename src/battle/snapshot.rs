//! Read-only view of an encounter for presentation layers

use serde::{Deserialize, Serialize};

use crate::battle::defense::DefenseResolver;
use crate::battle::position::PositionBoard;
use crate::battle::scheduler::BattleState;
use crate::combat::Combatant;
use crate::core::types::{CombatantId, Posture, Side, Slot};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub state: BattleState,
    pub current_side: Side,
    pub set_number: u32,
    pub active: Option<CombatantId>,
    /// Remaining fraction of the active combatant's countdown
    pub timer_fraction: f32,
    pub current_timer: f32,
    pub gated: bool,
    pub combatants: Vec<CombatantView>,
    pub postures: Vec<SlotPostures>,
}

impl BattleSnapshot {
    pub fn combatant(&self, id: CombatantId) -> Option<&CombatantView> {
        self.combatants.iter().find(|view| view.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatantView {
    pub id: CombatantId,
    pub name: String,
    pub side: Side,
    pub slot: Slot,
    pub health: f32,
    pub health_fraction: f32,
    pub resource_fraction: f32,
    pub form_fraction: f32,
    pub timer_fraction: f32,
    pub alive: bool,
    pub form_active: bool,
    pub impaired: bool,
    pub overexerted: bool,
    pub can_transform: bool,
}

impl CombatantView {
    pub fn from_combatant(unit: &Combatant) -> Self {
        Self {
            id: unit.id(),
            name: unit.name().to_string(),
            side: unit.side(),
            slot: unit.slot(),
            health: unit.health(),
            health_fraction: unit.health_fraction(),
            resource_fraction: unit.resource_fraction(),
            form_fraction: unit.form_fraction(),
            timer_fraction: unit.timer_fraction(),
            alive: unit.is_alive(),
            form_active: unit.form_active(),
            impaired: unit.is_impaired(),
            overexerted: unit.is_overexerted(),
            can_transform: unit.can_transform(),
        }
    }
}

/// Which defenses a combatant standing in `slot` could pick right now
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotPostures {
    pub slot: Slot,
    pub occupants: usize,
    pub guard: bool,
    pub dodge: bool,
    pub parry: bool,
    pub guard_difficulty: f32,
    pub dodge_difficulty: f32,
    pub parry_difficulty: f32,
}

impl SlotPostures {
    pub fn for_slot(board: &PositionBoard, resolver: &DefenseResolver, slot: Slot) -> Self {
        let occupants = board.count_at(slot);
        Self {
            slot,
            occupants,
            guard: resolver.is_available(board, Posture::Guard, slot),
            dodge: resolver.is_available(board, Posture::Dodge, slot),
            parry: resolver.is_available(board, Posture::Parry, slot),
            guard_difficulty: resolver.slot_difficulty(Posture::Guard, slot, occupants),
            dodge_difficulty: resolver.slot_difficulty(Posture::Dodge, slot, occupants),
            parry_difficulty: resolver.slot_difficulty(Posture::Parry, slot, occupants),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::BattleConfig;

    #[test]
    fn test_lone_defender_postures() {
        let mut board = PositionBoard::default();
        let resolver = DefenseResolver::new(&BattleConfig::default());
        let mut unit = Combatant::new("Ade", Side::Ally);
        board.move_to(&mut unit, Slot::East).unwrap();

        let postures = SlotPostures::for_slot(&board, &resolver, Slot::East);
        assert_eq!(postures.occupants, 1);
        assert!(postures.parry && postures.dodge && !postures.guard);
        assert!((postures.dodge_difficulty - 0.6).abs() < 1e-5);
    }

    #[test]
    fn test_view_serializes() {
        let unit = Combatant::new("Ade", Side::Ally);
        let view = CombatantView::from_combatant(&unit);
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("\"name\":\"Ade\""));
        assert_eq!(view.health_fraction, 1.0);
    }
}
