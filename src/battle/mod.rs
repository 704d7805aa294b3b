//! Battle system - set-based turns with reactive defense
//!
//! Sides alternate in sets. Within a set every combatant on the active side
//! gets a countdown; the other side answers incoming attacks with timed
//! guards, dodges and parries.

pub mod action;
pub mod defense;
pub mod events;
pub mod position;
pub mod scheduler;
pub mod snapshot;

// Re-exports for convenient access
pub use action::{apply_action, Ack, Action, ActionKind};
pub use defense::{
    CounterRequest, DefenseAttempt, DefenseOutcome, DefenseResolution, DefenseResolver,
};
pub use events::{BattleEvent, BattleEventLog, BattleEventType};
pub use position::PositionBoard;
pub use scheduler::{BattleState, Scheduler};
pub use snapshot::{BattleSnapshot, CombatantView, SlotPostures};
