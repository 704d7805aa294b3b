use thiserror::Error;

use crate::core::types::CombatantId;

#[derive(Error, Debug)]
pub enum BattleError {
    /// Action referenced a combatant that is missing or already down
    #[error("Invalid target: {0:?}")]
    InvalidTarget(CombatantId),

    /// Action not allowed for this actor or in the current battle state
    #[error("Illegal action: {0}")]
    IllegalAction(String),

    #[error("Invalid slot: {0}")]
    InvalidSlot(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl BattleError {
    /// Gameplay rejections are recoverable and never abort a step.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            BattleError::InvalidTarget(_) | BattleError::IllegalAction(_) | BattleError::InvalidSlot(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BattleError>;
