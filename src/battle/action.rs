//! Action dispatch
//!
//! Maps one discrete player or AI choice onto the scheduler, board and
//! defense resolver. Validation happens before any state changes, so a
//! rejected action leaves the encounter untouched.

use serde::{Deserialize, Serialize};

use crate::battle::events::BattleEventLog;
use crate::battle::scheduler::Scheduler;
use crate::combat::Element;
use crate::core::error::{BattleError, Result};
use crate::core::types::{CombatantId, Posture, Slot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Move { actor: CombatantId, slot: Slot },
    Attack { actor: CombatantId, target: CombatantId, element: Element },
    /// Prepare a reactive defense against the next incoming attack
    Defend { actor: CombatantId, posture: Posture, timing: f32 },
    Pass { actor: CombatantId },
    /// Enter the transformed form, or leave it if already transformed
    Transform { actor: CombatantId },
    UseItem { actor: CombatantId, item: String },
    Combination { actor: CombatantId, partners: Vec<CombatantId> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Move,
    Attack,
    Defend,
    Pass,
    Transform,
    UseItem,
    Combination,
}

impl Action {
    pub fn actor(&self) -> CombatantId {
        match self {
            Action::Move { actor, .. }
            | Action::Attack { actor, .. }
            | Action::Defend { actor, .. }
            | Action::Pass { actor }
            | Action::Transform { actor }
            | Action::UseItem { actor, .. }
            | Action::Combination { actor, .. } => *actor,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Move { .. } => ActionKind::Move,
            Action::Attack { .. } => ActionKind::Attack,
            Action::Defend { .. } => ActionKind::Defend,
            Action::Pass { .. } => ActionKind::Pass,
            Action::Transform { .. } => ActionKind::Transform,
            Action::UseItem { .. } => ActionKind::UseItem,
            Action::Combination { .. } => ActionKind::Combination,
        }
    }

    /// Accepted but not implemented: no state change
    pub fn is_stub(&self) -> bool {
        matches!(self, Action::UseItem { .. } | Action::Combination { .. })
    }
}

/// Acknowledgement for an accepted action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub kind: ActionKind,
    /// The action was accepted as a no-op
    pub ignored: bool,
    pub events: BattleEventLog,
}

impl Ack {
    fn applied(kind: ActionKind) -> Self {
        Self {
            kind,
            ignored: false,
            events: BattleEventLog::new(),
        }
    }

    fn ignored(kind: ActionKind) -> Self {
        Self {
            kind,
            ignored: true,
            events: BattleEventLog::new(),
        }
    }
}

/// Validate and apply one action
pub fn apply_action(scheduler: &mut Scheduler, action: Action) -> Result<Ack> {
    scheduler.ensure_running()?;
    let kind = action.kind();

    match action {
        Action::Move { actor, slot } => {
            let idx = scheduler.ensure_active(actor)?;
            scheduler.move_unit(idx, slot)?;
        }
        Action::Attack { actor, target, element } => {
            let attacker = scheduler.ensure_active(actor)?;
            if target == actor {
                return Err(BattleError::InvalidTarget(target));
            }
            let defender = scheduler.living_index(target)?;
            scheduler.attack(attacker, defender, element);
            scheduler.settle_after_action();
        }
        Action::Defend { actor, posture, timing } => {
            let idx = scheduler.ensure_defender(actor)?;
            scheduler.prepare_defense(idx, posture, timing)?;
        }
        Action::Pass { actor } => {
            scheduler.ensure_active(actor)?;
            scheduler.end_active_turn();
        }
        Action::Transform { actor } => {
            let idx = scheduler.ensure_active(actor)?;
            scheduler.toggle_form(idx)?;
        }
        Action::UseItem { actor, .. } | Action::Combination { actor, .. } => {
            scheduler.ensure_active(actor)?;
            tracing::debug!("{:?} is not implemented; accepted without effect", kind);
            return Ok(Ack::ignored(kind));
        }
    }

    Ok(Ack::applied(kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_actor_and_kind() {
        let id = CombatantId::new();
        let action = Action::Defend {
            actor: id,
            posture: Posture::Dodge,
            timing: 0.1,
        };
        assert_eq!(action.actor(), id);
        assert_eq!(action.kind(), ActionKind::Defend);
        assert!(!action.is_stub());
    }

    #[test]
    fn test_stub_actions() {
        let id = CombatantId::new();
        assert!(Action::UseItem { actor: id, item: "tonic".into() }.is_stub());
        assert!(Action::Combination { actor: id, partners: vec![] }.is_stub());
        assert!(!Action::Pass { actor: id }.is_stub());
    }
}
