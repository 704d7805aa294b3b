//! Hypnos Battle - set-based tactical combat with timed reactive defense

pub mod battle;
pub mod combat;
pub mod core;

pub use crate::battle::{Action, BattleEventLog, BattleState, Scheduler};
pub use crate::combat::{Combatant, Element};
pub use crate::core::{BattleConfig, BattleError, CombatantId, Posture, Result, Side, Slot};
