pub mod config;
pub mod error;
pub mod types;

pub use config::{load_config, BattleConfig};
pub use error::{BattleError, Result};
pub use types::{CombatantId, Posture, Side, Slot};
