pub mod combatant;
pub mod constants;
pub mod element;

pub use combatant::{Combatant, CombatantTuning, DamageReport};
pub use element::{Element, ResistanceTable};
