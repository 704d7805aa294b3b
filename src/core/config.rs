//! Battle configuration with documented tuning values
//!
//! Every tunable number the scheduler, combatants and defense resolver read
//! lives here. Loaded from TOML; every section falls back to its defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::combat::constants::{
    MIN_TICK_RATE, OVEREXERTED_GAIN_RATE, OVEREXERTED_HEALTH_CAP, PASSIVE_RESOURCE_PER_SECOND,
};
use crate::core::error::{BattleError, Result};

/// Timing windows for reactive defenses (timing sample units, 0.0 = perfect)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Dodge at or under this sample fully avoids the hit
    pub dodge_perfect_window: f32,
    /// Dodge at or under this sample is a partial dodge
    pub dodge_good_window: f32,
    /// Parry at or under this sample counters
    pub parry_perfect_window: f32,
    /// Parry at or under this sample blocks
    pub parry_good_window: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            dodge_perfect_window: 0.1,
            dodge_good_window: 0.3,
            parry_perfect_window: 0.05,
            parry_good_window: 0.15,
        }
    }
}

/// Damage reduction and resource rewards per posture
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenseConfig {
    /// Fraction of damage removed by a guard
    pub guard_reduction: f32,
    /// Fraction of damage removed by a clean dodge
    pub dodge_reduction: f32,
    /// Fraction of damage still taken after a successful parry
    pub parry_damage_taken: f32,
    /// Share of the dodge reduction granted on a partial dodge
    pub partial_dodge_factor: f32,
    pub guard_reward: f32,
    pub dodge_reward: f32,
    pub parry_reward: f32,
}

impl Default for DefenseConfig {
    fn default() -> Self {
        Self {
            guard_reduction: 0.5,
            dodge_reduction: 1.0,
            parry_damage_taken: 0.0,
            partial_dodge_factor: 0.5,
            guard_reward: 5.0,
            dodge_reward: 10.0,
            parry_reward: 25.0,
        }
    }
}

/// Transformation resource accrual
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Resource gained per second by every alive, untransformed combatant
    ///
    /// At 5.0 a combatant with a 100-point bar fills it passively in
    /// 20 seconds of running battle time.
    pub passive_gain_per_second: f32,
    /// Gain rate after being forced out of the form
    pub overexerted_gain_rate: f32,
    /// Health cap (fraction of max) applied by overexertion
    pub overexerted_health_cap: f32,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            passive_gain_per_second: PASSIVE_RESOURCE_PER_SECOND,
            overexerted_gain_rate: OVEREXERTED_GAIN_RATE,
            overexerted_health_cap: OVEREXERTED_HEALTH_CAP,
        }
    }
}

/// Turn timer tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnConfig {
    /// Slowest allowed countdown rate (0.25 = four times slower)
    pub min_tick_rate: f32,
    /// Seconds banked by an attacker that hits a weakness
    pub weakness_banked_reward: f32,
    /// Speed modifier queued against the next actor after a weakness hit
    pub weakness_speed_modifier: f32,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            min_tick_rate: MIN_TICK_RATE,
            weakness_banked_reward: 2.0,
            weakness_speed_modifier: 0.5,
        }
    }
}

/// Complete battle configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    pub timing: TimingConfig,
    pub defense: DefenseConfig,
    pub resource: ResourceConfig,
    pub turn: TurnConfig,
}

impl BattleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: BattleConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let t = &self.timing;
        if t.dodge_perfect_window < 0.0 || t.dodge_perfect_window > t.dodge_good_window {
            return Err(BattleError::InvalidConfig(format!(
                "dodge_perfect_window ({}) must be within 0..=dodge_good_window ({})",
                t.dodge_perfect_window, t.dodge_good_window
            )));
        }
        if t.parry_perfect_window < 0.0 || t.parry_perfect_window > t.parry_good_window {
            return Err(BattleError::InvalidConfig(format!(
                "parry_perfect_window ({}) must be within 0..=parry_good_window ({})",
                t.parry_perfect_window, t.parry_good_window
            )));
        }

        let d = &self.defense;
        for (name, value) in [
            ("guard_reduction", d.guard_reduction),
            ("dodge_reduction", d.dodge_reduction),
            ("parry_damage_taken", d.parry_damage_taken),
            ("partial_dodge_factor", d.partial_dodge_factor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(BattleError::InvalidConfig(format!(
                    "{} ({}) must be within 0.0..=1.0",
                    name, value
                )));
            }
        }
        if d.guard_reward < 0.0 || d.dodge_reward < 0.0 || d.parry_reward < 0.0 {
            return Err(BattleError::InvalidConfig("Defense rewards must not be negative".into()));
        }

        if self.resource.passive_gain_per_second < 0.0 || self.resource.overexerted_gain_rate < 0.0 {
            return Err(BattleError::InvalidConfig("Resource rates must not be negative".into()));
        }
        if !(0.0..=1.0).contains(&self.resource.overexerted_health_cap) {
            return Err(BattleError::InvalidConfig(
                "overexerted_health_cap must be within 0.0..=1.0".into(),
            ));
        }

        if self.turn.min_tick_rate <= 0.0 || self.turn.min_tick_rate > 1.0 {
            return Err(BattleError::InvalidConfig(format!(
                "min_tick_rate ({}) must be within (0.0, 1.0]",
                self.turn.min_tick_rate
            )));
        }
        if self.turn.weakness_banked_reward < 0.0 {
            return Err(BattleError::InvalidConfig(
                "weakness_banked_reward must not be negative".into(),
            ));
        }

        Ok(())
    }
}

/// Load a battle configuration from a TOML file
pub fn load_config(path: &Path) -> Result<BattleConfig> {
    let contents = fs::read_to_string(path)?;
    let config = BattleConfig::from_toml(&contents)?;
    tracing::debug!("Loaded battle config from {:?}", path);
    Ok(config)
}
