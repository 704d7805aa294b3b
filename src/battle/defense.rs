//! Reactive defense resolution
//!
//! A defender picks a posture and supplies a timing sample (0.0 = perfect,
//! 1.0 = completely missed). The posture's windows classify the sample into an
//! outcome, which in turn fixes the damage reduction, the resource reward and
//! whether the attacker eats a counter.

use serde::{Deserialize, Serialize};

use crate::battle::position::PositionBoard;
use crate::combat::{Combatant, DamageReport, Element};
use crate::core::config::{BattleConfig, DefenseConfig, TimingConfig};
use crate::core::types::{CombatantId, Posture, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefenseOutcome {
    Success,
    Partial,
    Failure,
    /// Perfect parry: the defender strikes back
    Counter,
}

/// One defense evaluation. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefenseAttempt {
    pub defender: CombatantId,
    pub posture: Posture,
    pub timing: f32,
    pub outcome: DefenseOutcome,
}

/// Request for the caller to run a retaliatory attack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterRequest {
    pub defender: CombatantId,
    pub attacker: CombatantId,
}

/// Everything [`DefenseResolver::resolve_attack`] settled
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefenseResolution {
    pub attempt: DefenseAttempt,
    pub reduction: f32,
    pub damage: DamageReport,
    pub reward: f32,
    pub counter: Option<CounterRequest>,
}

#[derive(Debug, Clone, Default)]
pub struct DefenseResolver {
    timing: TimingConfig,
    defense: DefenseConfig,
}

impl DefenseResolver {
    pub fn new(config: &BattleConfig) -> Self {
        Self {
            timing: config.timing.clone(),
            defense: config.defense.clone(),
        }
    }

    pub fn is_available(&self, board: &PositionBoard, posture: Posture, slot: Slot) -> bool {
        board.posture_available(posture, slot)
    }

    /// Classify a timing sample for a posture
    pub fn classify(&self, posture: Posture, timing: f32) -> DefenseOutcome {
        let t = timing.clamp(0.0, 1.0);
        match posture {
            Posture::Guard => DefenseOutcome::Success,
            Posture::Dodge => {
                if t <= self.timing.dodge_perfect_window {
                    DefenseOutcome::Success
                } else if t <= self.timing.dodge_good_window {
                    DefenseOutcome::Partial
                } else {
                    DefenseOutcome::Failure
                }
            }
            Posture::Parry => {
                if t <= self.timing.parry_perfect_window {
                    DefenseOutcome::Counter
                } else if t <= self.timing.parry_good_window {
                    DefenseOutcome::Success
                } else {
                    DefenseOutcome::Failure
                }
            }
            Posture::None => DefenseOutcome::Failure,
        }
    }

    pub fn attempt(&self, defender: CombatantId, posture: Posture, timing: f32) -> DefenseAttempt {
        let timing = timing.clamp(0.0, 1.0);
        DefenseAttempt {
            defender,
            posture,
            timing,
            outcome: self.classify(posture, timing),
        }
    }

    /// Fraction of incoming damage removed
    pub fn damage_reduction(&self, attempt: &DefenseAttempt) -> f32 {
        use DefenseOutcome::*;

        match (attempt.posture, attempt.outcome) {
            (Posture::Guard, _) => self.defense.guard_reduction,
            (Posture::Dodge, Success) => self.defense.dodge_reduction,
            (Posture::Dodge, Partial) => {
                self.defense.dodge_reduction * self.defense.partial_dodge_factor
            }
            (Posture::Parry, Success | Counter) => 1.0 - self.defense.parry_damage_taken,
            _ => 0.0,
        }
    }

    /// Resource earned: base reward scaled by timing, zero on any failure.
    pub fn reward(&self, attempt: &DefenseAttempt) -> f32 {
        if attempt.outcome == DefenseOutcome::Failure {
            return 0.0;
        }
        let base = match attempt.posture {
            Posture::Guard => self.defense.guard_reward,
            Posture::Dodge => self.defense.dodge_reward,
            Posture::Parry => self.defense.parry_reward,
            Posture::None => return 0.0,
        };
        base * (1.0 - attempt.timing)
    }

    pub fn triggers_counter(&self, attempt: &DefenseAttempt) -> bool {
        attempt.posture == Posture::Parry && attempt.outcome == DefenseOutcome::Counter
    }

    /// Relative difficulty of a posture given how crowded the slot is
    pub fn difficulty(&self, posture: Posture, occupants: usize) -> f32 {
        match posture {
            Posture::Dodge if occupants == 1 => 0.5,
            Posture::Dodge => 1.0,
            Posture::Parry => 2.0,
            Posture::Guard => 0.1,
            Posture::None => 1.0,
        }
    }

    /// Flank slots are harder to defend from
    pub fn position_multiplier(&self, slot: Slot) -> f32 {
        match slot {
            Slot::East | Slot::West => 1.2,
            Slot::North | Slot::South | Slot::Center => 1.0,
        }
    }

    /// Posture difficulty for a defender standing in `slot`
    pub fn slot_difficulty(&self, posture: Posture, slot: Slot, occupants: usize) -> f32 {
        self.difficulty(posture, occupants) * self.position_multiplier(slot)
    }

    /// Settle an incoming hit against a prepared defense.
    ///
    /// Order: reduction, damage, reward, then the counter request. The
    /// defender's state is final before any retaliation is computed.
    pub fn resolve_attack(
        &self,
        attempt: DefenseAttempt,
        defender: &mut Combatant,
        attacker: CombatantId,
        raw_damage: f32,
        element: Element,
    ) -> DefenseResolution {
        let reduction = self.damage_reduction(&attempt);
        let damage = defender.take_damage(raw_damage * (1.0 - reduction), element);

        let reward = self.reward(&attempt);
        if reward > 0.0 {
            defender.gain_resource(reward);
        }

        let counter = if self.triggers_counter(&attempt) && defender.can_act() {
            Some(CounterRequest {
                defender: defender.id(),
                attacker,
            })
        } else {
            None
        };

        tracing::debug!(
            "{} defended with {:?} ({:?}): {} -> {} damage, {} resource",
            defender.name(),
            attempt.posture,
            attempt.outcome,
            raw_damage,
            damage.damage,
            reward
        );

        DefenseResolution {
            attempt,
            reduction,
            damage,
            reward,
            counter,
        }
    }
}
