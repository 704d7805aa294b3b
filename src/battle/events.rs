//! Battle notifications
//!
//! The scheduler queues events as it works; every event produced by one
//! `advance` or `submit_action` call is handed back before that call returns.

use serde::{Deserialize, Serialize};

use crate::battle::defense::DefenseOutcome;
use crate::battle::scheduler::BattleState;
use crate::combat::Element;
use crate::core::types::{CombatantId, Posture, Side};

/// Log entry for battle events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleEvent {
    /// Set in progress when the event fired
    pub set_number: u32,
    /// Running battle time in seconds
    pub time: f32,
    pub event_type: BattleEventType,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEventType {
    TurnStarted { combatant: CombatantId },
    TurnEnded { combatant: CombatantId },
    SetComplete { set_number: u32 },
    SideChanged { side: Side },
    BattleStateChanged { state: BattleState },
    CounterTriggered { defender: CombatantId, attacker: CombatantId },
    DefenseResolved {
        defender: CombatantId,
        posture: Posture,
        outcome: DefenseOutcome,
        damage_taken: f32,
        reward: f32,
    },
    WeaknessExploited {
        attacker: CombatantId,
        target: CombatantId,
        element: Element,
        multiplier: f32,
    },
    SpeedModifierApplied { combatant: CombatantId, tick_rate: f32 },
    CombatantDefeated { combatant: CombatantId },
    FormEntered { combatant: CombatantId },
    FormExited { combatant: CombatantId, forced: bool },
}

/// Events from a single call into the scheduler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BattleEventLog {
    pub events: Vec<BattleEvent>,
}

impl BattleEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event_type: BattleEventType, description: String, set_number: u32, time: f32) {
        self.events.push(BattleEvent {
            set_number,
            time,
            event_type,
            description,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BattleEvent> {
        self.events.iter()
    }

    pub fn types(&self) -> impl Iterator<Item = &BattleEventType> {
        self.events.iter().map(|event| &event.event_type)
    }

    pub fn contains(&self, event_type: &BattleEventType) -> bool {
        self.types().any(|t| t == event_type)
    }

    /// Move everything out, leaving this log empty
    pub fn take(&mut self) -> BattleEventLog {
        std::mem::take(self)
    }

    pub fn extend(&mut self, other: BattleEventLog) {
        self.events.extend(other.events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_take() {
        let mut log = BattleEventLog::new();
        let id = CombatantId::new();
        log.push(
            BattleEventType::TurnStarted { combatant: id },
            "Ade's turn".into(),
            1,
            0.0,
        );
        assert_eq!(log.len(), 1);
        assert!(log.contains(&BattleEventType::TurnStarted { combatant: id }));

        let taken = log.take();
        assert!(log.is_empty());
        assert_eq!(taken.events[0].set_number, 1);
    }
}
