//! Combatant state model
//!
//! A combatant owns its vitality, turn countdown, banked time, transformation
//! resource and status flags. Fields are private: every change goes through a
//! mutator so health and resource stay clamped and form transitions stay
//! consistent.

use serde::{Deserialize, Serialize};

use crate::combat::constants::*;
use crate::combat::element::{Element, ResistanceTable};
use crate::core::config::BattleConfig;
use crate::core::types::{CombatantId, Posture, Side, Slot};

/// Per-combatant copies of the tunable penalties and limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatantTuning {
    pub min_tick_rate: f32,
    pub overexerted_gain_rate: f32,
    pub overexerted_health_cap: f32,
}

impl Default for CombatantTuning {
    fn default() -> Self {
        Self {
            min_tick_rate: MIN_TICK_RATE,
            overexerted_gain_rate: OVEREXERTED_GAIN_RATE,
            overexerted_health_cap: OVEREXERTED_HEALTH_CAP,
        }
    }
}

impl CombatantTuning {
    pub fn from_config(config: &BattleConfig) -> Self {
        Self {
            min_tick_rate: config.turn.min_tick_rate,
            overexerted_gain_rate: config.resource.overexerted_gain_rate,
            overexerted_health_cap: config.resource.overexerted_health_cap,
        }
    }
}

/// What a call to [`Combatant::take_damage`] actually did
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageReport {
    /// Elemental multiplier looked up for the attack element
    pub multiplier: f32,
    /// Damage after the multiplier
    pub damage: f32,
    /// Damage went to the resource bar instead of health
    pub absorbed_by_form: bool,
    /// The hit emptied the resource bar and forced the form to end
    pub forced_exit: bool,
    /// The hit took health to zero
    pub defeated: bool,
}

impl DamageReport {
    pub fn is_weakness(&self) -> bool {
        self.multiplier > 1.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    id: CombatantId,
    name: String,
    side: Side,
    slot: Slot,

    // Vitality
    max_health: f32,
    health: f32,

    // Turn countdown
    timer_duration: f32,
    timer_remaining: f32,
    /// Allotment granted at the last refresh, for display fractions
    timer_capacity: f32,
    tick_rate: f32,
    banked_time: f32,

    // Transformation
    max_resource: f32,
    resource: f32,
    gain_rate: f32,
    form_active: bool,
    max_form_points: f32,
    form_points: f32,

    // Status
    impaired: bool,
    overexerted: bool,
    posture: Posture,
    defense_timing: f32,

    attack_power: f32,
    resistances: ResistanceTable,
    tuning: CombatantTuning,
}

impl Combatant {
    /// Fresh combatant: full health, full timer, empty resource
    pub fn new(name: impl Into<String>, side: Side) -> Self {
        let slot = match side {
            Side::Ally => Slot::West,
            Side::Opposing => Slot::Center,
        };
        Self {
            id: CombatantId::new(),
            name: name.into(),
            side,
            slot,
            max_health: DEFAULT_MAX_HEALTH,
            health: DEFAULT_MAX_HEALTH,
            timer_duration: DEFAULT_TIMER_DURATION,
            timer_remaining: DEFAULT_TIMER_DURATION,
            timer_capacity: DEFAULT_TIMER_DURATION,
            tick_rate: BASE_TICK_RATE,
            banked_time: 0.0,
            max_resource: DEFAULT_MAX_RESOURCE,
            resource: 0.0,
            gain_rate: BASE_GAIN_RATE,
            form_active: false,
            max_form_points: DEFAULT_MAX_FORM_POINTS,
            form_points: 0.0,
            impaired: false,
            overexerted: false,
            posture: Posture::None,
            defense_timing: 1.0,
            attack_power: DEFAULT_ATTACK_POWER,
            resistances: ResistanceTable::new(),
            tuning: CombatantTuning::default(),
        }
    }

    pub fn with_max_health(mut self, max_health: f32) -> Self {
        self.max_health = max_health.max(1.0);
        self.health = self.max_health;
        self
    }

    pub fn with_timer_duration(mut self, seconds: f32) -> Self {
        self.timer_duration = seconds.max(0.0);
        self.timer_remaining = self.timer_duration;
        self.timer_capacity = self.timer_duration;
        self
    }

    pub fn with_max_resource(mut self, max_resource: f32) -> Self {
        self.max_resource = max_resource.max(0.0);
        self.resource = self.resource.min(self.max_resource);
        self
    }

    pub fn with_max_form_points(mut self, max_form_points: f32) -> Self {
        self.max_form_points = max_form_points.max(0.0);
        self
    }

    pub fn with_attack_power(mut self, attack_power: f32) -> Self {
        self.attack_power = attack_power.max(0.0);
        self
    }

    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.slot = slot;
        self
    }

    pub fn with_resistance(mut self, element: Element, multiplier: f32) -> Self {
        self.resistances.set(element, multiplier);
        self
    }

    pub fn with_resistances(mut self, resistances: ResistanceTable) -> Self {
        self.resistances = resistances;
        self
    }

    pub fn with_tuning(mut self, tuning: CombatantTuning) -> Self {
        self.tuning = tuning;
        self
    }

    // === Queries ===

    pub fn id(&self) -> CombatantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    pub fn timer_duration(&self) -> f32 {
        self.timer_duration
    }

    pub fn timer_remaining(&self) -> f32 {
        self.timer_remaining
    }

    pub fn tick_rate(&self) -> f32 {
        self.tick_rate
    }

    pub fn banked_time(&self) -> f32 {
        self.banked_time
    }

    pub fn resource(&self) -> f32 {
        self.resource
    }

    pub fn max_resource(&self) -> f32 {
        self.max_resource
    }

    pub fn gain_rate(&self) -> f32 {
        self.gain_rate
    }

    pub fn form_active(&self) -> bool {
        self.form_active
    }

    pub fn form_points(&self) -> f32 {
        self.form_points
    }

    pub fn max_form_points(&self) -> f32 {
        self.max_form_points
    }

    pub fn is_impaired(&self) -> bool {
        self.impaired
    }

    pub fn is_overexerted(&self) -> bool {
        self.overexerted
    }

    pub fn posture(&self) -> Posture {
        self.posture
    }

    /// Timing sample recorded with the prepared posture
    pub fn defense_timing(&self) -> f32 {
        self.defense_timing
    }

    pub fn attack_power(&self) -> f32 {
        self.attack_power
    }

    pub fn resistances(&self) -> &ResistanceTable {
        &self.resistances
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Alive and not impaired
    pub fn can_act(&self) -> bool {
        self.is_alive() && !self.impaired
    }

    pub fn health_fraction(&self) -> f32 {
        fraction(self.health, self.max_health)
    }

    pub fn resource_fraction(&self) -> f32 {
        fraction(self.resource, self.max_resource)
    }

    pub fn form_fraction(&self) -> f32 {
        fraction(self.form_points, self.max_form_points)
    }

    pub fn timer_fraction(&self) -> f32 {
        fraction(self.timer_remaining, self.timer_capacity)
    }

    pub fn elemental_multiplier(&self, element: Element) -> f32 {
        self.resistances.multiplier(element)
    }

    // === Turn countdown ===

    /// Run the countdown for `elapsed` seconds at the current tick rate.
    ///
    /// Returns true once the countdown is exhausted.
    pub fn tick_timer(&mut self, elapsed: f32) -> bool {
        if elapsed > 0.0 {
            self.timer_remaining = (self.timer_remaining - elapsed * self.tick_rate).max(0.0);
        }
        self.timer_remaining <= 0.0
    }

    /// Drop whatever is left of this set's countdown
    pub fn forfeit_timer(&mut self) {
        self.timer_remaining = 0.0;
    }

    /// Refresh for a new set: duration plus banked time, banked time consumed
    pub fn reset_timer(&mut self) {
        self.timer_remaining = self.timer_duration + self.banked_time;
        self.timer_capacity = self.timer_remaining;
        self.banked_time = 0.0;
        self.tick_rate = BASE_TICK_RATE;
    }

    pub fn apply_speed_modifier(&mut self, multiplier: f32) {
        self.tick_rate = multiplier.max(self.tuning.min_tick_rate);
        tracing::debug!("{} timer speed set to {}", self.name, self.tick_rate);
    }

    pub fn add_banked_time(&mut self, seconds: f32) {
        if seconds <= 0.0 {
            return;
        }
        self.banked_time += seconds;
        tracing::debug!(
            "{} banked {} seconds (total {})",
            self.name,
            seconds,
            self.banked_time
        );
    }

    // === Status ===

    pub fn set_impaired(&mut self, impaired: bool) {
        self.impaired = impaired;
    }

    pub(crate) fn set_slot(&mut self, slot: Slot) {
        self.slot = slot;
    }

    pub fn prepare_defense(&mut self, posture: Posture, timing: f32) {
        self.posture = posture;
        self.defense_timing = timing.clamp(0.0, 1.0);
    }

    pub fn clear_defense(&mut self) {
        self.posture = Posture::None;
        self.defense_timing = 1.0;
    }

    // === Damage and resource ===

    /// Apply an elemental hit.
    ///
    /// In form the hit drains the resource bar; emptying it forces the form
    /// to end with the overexertion penalty. Otherwise health is reduced,
    /// floored at zero. Downed combatants ignore further hits.
    pub fn take_damage(&mut self, amount: f32, element: Element) -> DamageReport {
        let multiplier = self.resistances.multiplier(element);
        let mut report = DamageReport {
            multiplier,
            ..DamageReport::default()
        };
        if !self.is_alive() {
            return report;
        }

        let damage = amount.max(0.0) * multiplier;
        report.damage = damage;

        if self.form_active {
            report.absorbed_by_form = true;
            self.resource = (self.resource - damage).max(0.0);
            if self.resource <= 0.0 {
                self.exit_form(true);
                report.forced_exit = true;
            }
        } else {
            self.health = (self.health - damage).max(0.0);
            if self.health <= 0.0 {
                report.defeated = true;
                tracing::info!("{} has been defeated", self.name);
            }
        }

        if report.is_weakness() {
            tracing::debug!("Weakness hit on {} (x{})", self.name, multiplier);
        }

        report
    }

    /// Add resource scaled by the gain rate. No-op while transformed.
    pub fn gain_resource(&mut self, amount: f32) {
        if self.form_active {
            return;
        }
        let was_full = self.resource >= self.max_resource;
        self.resource = (self.resource + amount * self.gain_rate).clamp(0.0, self.max_resource);
        if !was_full && self.resource >= self.max_resource {
            tracing::info!("{} resource bar is full and can transform", self.name);
        }
    }

    pub fn can_transform(&self) -> bool {
        self.resource >= self.max_resource && !self.form_active && self.is_alive()
    }

    /// Returns false when the combatant cannot transform
    pub fn enter_form(&mut self) -> bool {
        if !self.can_transform() {
            return false;
        }
        self.form_active = true;
        self.form_points = self.max_form_points;
        tracing::info!("{} transformed", self.name);
        true
    }

    /// Leave the form. A forced exit applies overexertion.
    ///
    /// Returns false when the combatant was not transformed.
    pub fn exit_form(&mut self, forced: bool) -> bool {
        if !self.form_active {
            return false;
        }
        self.form_active = false;
        self.resource = 0.0;
        self.form_points = 0.0;

        if forced {
            self.apply_overexertion();
        } else {
            tracing::debug!("{} left the form voluntarily", self.name);
        }
        true
    }

    /// Spend secondary points; only meaningful in form
    pub fn spend_form_points(&mut self, amount: f32) -> bool {
        if !self.form_active || amount < 0.0 || amount > self.form_points {
            return false;
        }
        self.form_points -= amount;
        true
    }

    fn apply_overexertion(&mut self) {
        self.overexerted = true;
        self.gain_rate = self.tuning.overexerted_gain_rate;

        let cap = self.max_health * self.tuning.overexerted_health_cap;
        if self.health > cap {
            self.health = cap;
        }
        tracing::warn!(
            "{} was forced out of form and is overexerted (health capped at {})",
            self.name,
            cap
        );
    }

    /// Restore the encounter-start state
    pub fn reset_for_battle(&mut self) {
        self.health = self.max_health;
        self.timer_remaining = self.timer_duration;
        self.timer_capacity = self.timer_duration;
        self.tick_rate = BASE_TICK_RATE;
        self.banked_time = 0.0;
        self.resource = 0.0;
        self.gain_rate = BASE_GAIN_RATE;
        self.form_active = false;
        self.form_points = 0.0;
        self.impaired = false;
        self.overexerted = false;
        self.clear_defense();
    }
}

fn fraction(value: f32, max: f32) -> f32 {
    if max <= 0.0 {
        0.0
    } else {
        (value / max).clamp(0.0, 1.0)
    }
}
