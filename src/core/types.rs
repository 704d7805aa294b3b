//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::core::error::BattleError;

/// Unique identifier for combatants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatantId(pub Uuid);

impl CombatantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CombatantId {
    fn default() -> Self {
        Self::new()
    }
}

/// Which side of the encounter a combatant fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Ally,
    Opposing,
}

impl Side {
    pub fn opponent(&self) -> Side {
        match self {
            Side::Ally => Side::Opposing,
            Side::Opposing => Side::Ally,
        }
    }
}

/// Spatial slots around the battlefield centre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    North,
    East,
    South,
    West,
    /// Where the opposing side stands
    Center,
}

impl Slot {
    /// The slots allies can occupy
    pub fn cardinal() -> &'static [Slot] {
        &[Slot::North, Slot::East, Slot::South, Slot::West]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Slot::North => "north",
            Slot::East => "east",
            Slot::South => "south",
            Slot::West => "west",
            Slot::Center => "center",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Slot {
    type Err = BattleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" | "n" => Ok(Slot::North),
            "east" | "e" => Ok(Slot::East),
            "south" | "s" => Ok(Slot::South),
            "west" | "w" => Ok(Slot::West),
            "center" | "centre" | "c" => Ok(Slot::Center),
            _ => Err(BattleError::InvalidSlot(s.to_string())),
        }
    }
}

/// Reactive stance a defender takes against an incoming attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Posture {
    #[default]
    None,
    Guard,
    Dodge,
    Parry,
}
