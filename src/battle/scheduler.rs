//! Set-based turn scheduler
//!
//! One side is active at a time. Its roster takes turns in order; the active
//! combatant's countdown runs while the battle is unpaused and the action
//! gate is open. A turn ends when the countdown runs out or the combatant
//! passes. When the roster is exhausted the scheduler wraps back to anyone
//! who still has time; once nobody does, the set is complete and the other
//! side gets a fresh set.
//!
//! Each `advance`: end check -> passive accrual -> countdown -> turn rotation

use serde::{Deserialize, Serialize};

use crate::battle::action::{apply_action, Ack, Action};
use crate::battle::defense::DefenseResolver;
use crate::battle::events::{BattleEventLog, BattleEventType};
use crate::battle::position::PositionBoard;
use crate::battle::snapshot::{BattleSnapshot, CombatantView, SlotPostures};
use crate::combat::{Combatant, CombatantTuning, Element};
use crate::core::config::BattleConfig;
use crate::core::error::{BattleError, Result};
use crate::core::types::{CombatantId, Posture, Side, Slot};

/// Encounter state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleState {
    PlayerTurn,
    EnemyTurn,
    Paused,
    Victory,
    Defeat,
}

impl BattleState {
    pub fn for_side(side: Side) -> Self {
        match side {
            Side::Ally => BattleState::PlayerTurn,
            Side::Opposing => BattleState::EnemyTurn,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BattleState::Victory | BattleState::Defeat)
    }

    /// A side is taking turns
    pub fn is_running(&self) -> bool {
        matches!(self, BattleState::PlayerTurn | BattleState::EnemyTurn)
    }
}

/// Counters can't themselves be countered
const MAX_COUNTER_DEPTH: u8 = 1;

/// Side switches allowed inside one turn search before giving up for the step
const MAX_SWITCHES_PER_SEARCH: u8 = 2;

pub struct Scheduler {
    config: BattleConfig,
    board: PositionBoard,
    resolver: DefenseResolver,
    combatants: Vec<Combatant>,
    allies: Vec<usize>,
    enemies: Vec<usize>,

    state: BattleState,
    current_side: Side,
    active_index: usize,
    /// Combatant whose turn is in progress
    active: Option<usize>,
    set_number: u32,
    set_complete: bool,
    pending_speed_modifier: Option<f32>,
    action_gate: bool,
    /// Display mirror of the active countdown
    current_timer: f32,
    elapsed: f32,

    events: BattleEventLog,
}

impl Scheduler {
    /// Wire up an encounter. Roster order is turn order within each side.
    ///
    /// Combatants standing in a slot the board knows are registered there.
    /// The first player turn starts immediately; its events are available
    /// from [`Scheduler::drain_events`].
    pub fn new(
        combatants: Vec<Combatant>,
        board: PositionBoard,
        resolver: DefenseResolver,
        config: BattleConfig,
    ) -> Result<Self> {
        config.validate()?;

        let tuning = CombatantTuning::from_config(&config);
        let mut combatants: Vec<Combatant> = combatants
            .into_iter()
            .map(|unit| unit.with_tuning(tuning))
            .collect();

        let allies: Vec<usize> = roster_indices(&combatants, Side::Ally);
        let enemies: Vec<usize> = roster_indices(&combatants, Side::Opposing);
        if allies.is_empty() || enemies.is_empty() {
            return Err(BattleError::InvalidConfig(
                "an encounter needs at least one combatant on each side".into(),
            ));
        }

        let mut board = board;
        for unit in combatants.iter_mut() {
            let slot = unit.slot();
            if board.has_slot(slot) {
                board.move_to(unit, slot)?;
            }
        }

        let mut scheduler = Self {
            config,
            board,
            resolver,
            combatants,
            allies,
            enemies,
            state: BattleState::PlayerTurn,
            current_side: Side::Ally,
            active_index: 0,
            active: None,
            set_number: 1,
            set_complete: false,
            pending_speed_modifier: None,
            action_gate: false,
            current_timer: 0.0,
            elapsed: 0.0,
            events: BattleEventLog::new(),
        };
        tracing::info!(
            "Encounter ready: {} allies vs {} opposing",
            scheduler.allies.len(),
            scheduler.enemies.len()
        );
        scheduler.seek_turn();
        Ok(scheduler)
    }

    /// Build with a default board and a resolver from `config`
    pub fn with_config(combatants: Vec<Combatant>, config: BattleConfig) -> Result<Self> {
        let resolver = DefenseResolver::new(&config);
        Self::new(combatants, PositionBoard::default(), resolver, config)
    }

    // === Queries ===

    pub fn state(&self) -> BattleState {
        self.state
    }

    pub fn current_side(&self) -> Side {
        self.current_side
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn set_number(&self) -> u32 {
        self.set_number
    }

    pub fn set_complete(&self) -> bool {
        self.set_complete
    }

    pub fn pending_speed_modifier(&self) -> Option<f32> {
        self.pending_speed_modifier
    }

    pub fn is_gated(&self) -> bool {
        self.action_gate
    }

    pub fn current_timer(&self) -> f32 {
        self.current_timer
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn board(&self) -> &PositionBoard {
        &self.board
    }

    pub fn resolver(&self) -> &DefenseResolver {
        &self.resolver
    }

    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|unit| unit.id() == id)
    }

    pub fn active_combatant(&self) -> Option<&Combatant> {
        self.active.map(|idx| &self.combatants[idx])
    }

    /// Roster of one side in turn order
    pub fn roster(&self, side: Side) -> impl Iterator<Item = &Combatant> {
        self.roster_slice(side)
            .iter()
            .map(move |idx| &self.combatants[*idx])
    }

    pub fn active_timer_fraction(&self) -> f32 {
        self.active_combatant().map_or(0.0, |unit| unit.timer_fraction())
    }

    // === Step driver ===

    /// Advance battle time by `delta` seconds and return everything that
    /// happened during the step.
    pub fn advance(&mut self, delta: f32) -> BattleEventLog {
        if self.state.is_terminal() {
            return self.events.take();
        }
        if self.check_battle_end() {
            return self.events.take();
        }
        if self.state == BattleState::Paused {
            return self.events.take();
        }

        let delta = delta.max(0.0);
        self.elapsed += delta;
        self.accrue_passive_resource(delta);

        if self.active.is_none() {
            self.seek_turn();
        }
        self.settle_active();

        if !self.action_gate {
            if let Some(idx) = self.active {
                let exhausted = self.combatants[idx].tick_timer(delta);
                self.current_timer = self.combatants[idx].timer_remaining();
                if exhausted {
                    self.end_active_turn();
                }
            }
        }

        self.events.take()
    }

    /// Validate and apply an action. Rejections leave the encounter untouched.
    pub fn submit_action(&mut self, action: Action) -> Result<Ack> {
        let mut ack = apply_action(self, action)?;
        ack.events = self.events.take();
        Ok(ack)
    }

    /// Events queued outside `advance`/`submit_action` (construction, reset,
    /// pause/resume)
    pub fn drain_events(&mut self) -> BattleEventLog {
        self.events.take()
    }

    // === External controls ===

    pub fn pause(&mut self) -> Result<()> {
        if !self.state.is_running() {
            return Err(BattleError::IllegalAction(format!(
                "cannot pause while {:?}",
                self.state
            )));
        }
        self.set_state(BattleState::Paused);
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        if self.state != BattleState::Paused {
            return Err(BattleError::IllegalAction(format!(
                "cannot resume while {:?}",
                self.state
            )));
        }
        self.set_state(BattleState::for_side(self.current_side));
        Ok(())
    }

    /// Freeze the countdown (animation playback). Actions are still accepted.
    pub fn begin_action_gate(&mut self) {
        self.action_gate = true;
    }

    pub fn end_action_gate(&mut self) {
        self.action_gate = false;
    }

    /// Queue a one-shot countdown multiplier for the next combatant to start a
    /// turn. Floored at the configured minimum tick rate.
    pub fn apply_speed_modifier(&mut self, multiplier: f32) {
        let multiplier = multiplier.max(self.config.turn.min_tick_rate);
        self.pending_speed_modifier = Some(multiplier);
        tracing::debug!("Speed modifier {} queued for the next actor", multiplier);
    }

    /// Impaired combatants lose their turns; one impaired mid-turn stops
    /// acting at the next step.
    pub fn set_impaired(&mut self, id: CombatantId, impaired: bool) -> Result<()> {
        let idx = self.index_of(id)?;
        self.combatants[idx].set_impaired(impaired);
        Ok(())
    }

    /// Back to the encounter-start state: full combatants, set 1, player turn
    pub fn reset(&mut self) {
        for unit in self.combatants.iter_mut() {
            unit.reset_for_battle();
        }
        self.current_side = Side::Ally;
        self.active_index = 0;
        self.active = None;
        self.set_number = 1;
        self.set_complete = false;
        self.pending_speed_modifier = None;
        self.action_gate = false;
        self.current_timer = 0.0;
        self.elapsed = 0.0;
        self.events = BattleEventLog::new();
        self.set_state(BattleState::PlayerTurn);
        tracing::info!("Encounter reset");
        self.seek_turn();
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        let combatants = self
            .combatants
            .iter()
            .map(CombatantView::from_combatant)
            .collect();
        let postures = self
            .board
            .layout()
            .into_iter()
            .map(|slot| SlotPostures::for_slot(&self.board, &self.resolver, slot))
            .collect();

        BattleSnapshot {
            state: self.state,
            current_side: self.current_side,
            set_number: self.set_number,
            active: self.active_combatant().map(|unit| unit.id()),
            timer_fraction: self.active_timer_fraction(),
            current_timer: self.current_timer,
            gated: self.action_gate,
            combatants,
            postures,
        }
    }

    // === Dispatcher hooks ===

    pub(crate) fn ensure_running(&self) -> Result<()> {
        if self.state.is_running() {
            Ok(())
        } else {
            Err(BattleError::IllegalAction(format!(
                "actions are not accepted while {:?}",
                self.state
            )))
        }
    }

    /// The actor must be the combatant whose turn is in progress
    pub(crate) fn ensure_active(&self, actor: CombatantId) -> Result<usize> {
        let idx = self.living_index(actor)?;
        if self.combatants[idx].is_impaired() {
            return Err(BattleError::IllegalAction(format!(
                "{} is impaired",
                self.combatants[idx].name()
            )));
        }
        if self.active != Some(idx) {
            return Err(BattleError::IllegalAction(format!(
                "it is not {}'s turn",
                self.combatants[idx].name()
            )));
        }
        Ok(idx)
    }

    /// Defenders come from the side that is not taking turns
    pub(crate) fn ensure_defender(&self, actor: CombatantId) -> Result<usize> {
        let idx = self.living_index(actor)?;
        let unit = &self.combatants[idx];
        if unit.is_impaired() {
            return Err(BattleError::IllegalAction(format!("{} is impaired", unit.name())));
        }
        if unit.side() == self.current_side {
            return Err(BattleError::IllegalAction(format!(
                "{} cannot defend during its own side's turn",
                unit.name()
            )));
        }
        Ok(idx)
    }

    pub(crate) fn living_index(&self, id: CombatantId) -> Result<usize> {
        let idx = self.index_of(id)?;
        if !self.combatants[idx].is_alive() {
            return Err(BattleError::InvalidTarget(id));
        }
        Ok(idx)
    }

    pub(crate) fn move_unit(&mut self, idx: usize, slot: Slot) -> Result<()> {
        self.board.move_to(&mut self.combatants[idx], slot)
    }

    pub(crate) fn prepare_defense(&mut self, idx: usize, posture: Posture, timing: f32) -> Result<()> {
        let slot = self.combatants[idx].slot();
        if !self.resolver.is_available(&self.board, posture, slot) {
            return Err(BattleError::IllegalAction(format!(
                "{:?} is not available at {} ({} occupant(s))",
                posture,
                slot,
                self.board.count_at(slot)
            )));
        }
        self.combatants[idx].prepare_defense(posture, timing);
        Ok(())
    }

    pub(crate) fn toggle_form(&mut self, idx: usize) -> Result<()> {
        let unit = &mut self.combatants[idx];
        let id = unit.id();
        if unit.enter_form() {
            let description = format!("{} transformed", unit.name());
            self.emit(BattleEventType::FormEntered { combatant: id }, description);
            Ok(())
        } else if unit.exit_form(false) {
            let description = format!("{} left the form", unit.name());
            self.emit(
                BattleEventType::FormExited {
                    combatant: id,
                    forced: false,
                },
                description,
            );
            Ok(())
        } else {
            Err(BattleError::IllegalAction(format!(
                "{} cannot transform yet",
                unit.name()
            )))
        }
    }

    /// Resolve an attack, including any prepared defense, weakness rewards
    /// and a counter from a perfect parry.
    pub(crate) fn attack(&mut self, attacker: usize, target: usize, element: Element) {
        self.attack_at_depth(attacker, target, element, 0);
    }

    /// Ends the turn of a combatant that just became unable to act, and the
    /// battle if a side was wiped out.
    pub(crate) fn settle_after_action(&mut self) {
        if !self.check_battle_end() {
            self.settle_active();
        }
    }

    /// Same transition as the countdown running out
    pub(crate) fn end_active_turn(&mut self) {
        let Some(idx) = self.active.take() else {
            return;
        };
        let unit = &mut self.combatants[idx];
        if !unit.can_act() {
            // Cut short by impairment or defeat: the rest of the allotment is lost
            unit.forfeit_timer();
        }
        let id = unit.id();
        let description = format!(
            "{}'s turn ended ({:.2}s left)",
            unit.name(),
            unit.timer_remaining()
        );
        self.emit(BattleEventType::TurnEnded { combatant: id }, description);
        self.current_timer = 0.0;
        self.active_index += 1;
        self.seek_turn();
    }

    // === Turn rotation ===

    fn attack_at_depth(&mut self, attacker: usize, target: usize, element: Element, depth: u8) {
        let raw_damage = self.combatants[attacker].attack_power();
        let attacker_id = self.combatants[attacker].id();

        let defender = &mut self.combatants[target];
        let target_id = defender.id();
        let (report, counter) = if defender.posture() != Posture::None {
            let attempt = self.resolver.attempt(
                target_id,
                defender.posture(),
                defender.defense_timing(),
            );
            defender.clear_defense();
            let resolution =
                self.resolver
                    .resolve_attack(attempt, defender, attacker_id, raw_damage, element);
            let description = format!(
                "{} {:?} -> {:?}, took {:.1}",
                defender.name(),
                attempt.posture,
                attempt.outcome,
                resolution.damage.damage
            );
            self.emit(
                BattleEventType::DefenseResolved {
                    defender: target_id,
                    posture: attempt.posture,
                    outcome: attempt.outcome,
                    damage_taken: resolution.damage.damage,
                    reward: resolution.reward,
                },
                description,
            );
            (resolution.damage, resolution.counter)
        } else {
            (defender.take_damage(raw_damage, element), None)
        };

        let target_name = self.combatants[target].name().to_string();
        if report.forced_exit {
            self.emit(
                BattleEventType::FormExited {
                    combatant: target_id,
                    forced: true,
                },
                format!("{} was forced out of form", target_name),
            );
        }
        if report.defeated {
            self.emit(
                BattleEventType::CombatantDefeated { combatant: target_id },
                format!("{} was defeated", target_name),
            );
        }

        if report.is_weakness() {
            let reward = self.config.turn.weakness_banked_reward;
            let modifier = self.config.turn.weakness_speed_modifier;
            self.combatants[attacker].add_banked_time(reward);
            self.apply_speed_modifier(modifier);
            tracing::info!(
                "{} exploited {}'s weakness to {:?}",
                self.combatants[attacker].name(),
                target_name,
                element
            );
            self.emit(
                BattleEventType::WeaknessExploited {
                    attacker: attacker_id,
                    target: target_id,
                    element,
                    multiplier: report.multiplier,
                },
                format!("Weakness hit on {} (x{})", target_name, report.multiplier),
            );
        }

        if let Some(counter) = counter {
            if depth < MAX_COUNTER_DEPTH && self.combatants[attacker].is_alive() {
                self.emit(
                    BattleEventType::CounterTriggered {
                        defender: counter.defender,
                        attacker: counter.attacker,
                    },
                    format!("{} counters", target_name),
                );
                self.attack_at_depth(target, attacker, Element::Physical, depth + 1);
            }
        }
    }

    /// Find the next combatant able to take a turn, starting at
    /// `active_index`. Completes the set and hands over to the other side when
    /// nobody on the current side has time left.
    fn seek_turn(&mut self) {
        let mut switches = 0;
        loop {
            let roster_len = self.roster_slice(self.current_side).len();

            if self.active_index >= roster_len {
                if self.side_has_time(self.current_side) {
                    self.active_index = 0;
                    continue;
                }
                if !self.anyone_can_act() {
                    // Stalled: hold the set open until someone recovers
                    self.active = None;
                    return;
                }
                self.complete_set();
                self.switch_side();
                switches += 1;
                if switches >= MAX_SWITCHES_PER_SEARCH {
                    // Refreshed timers still gave nobody time; retry next step
                    return;
                }
                continue;
            }

            let idx = self.roster_slice(self.current_side)[self.active_index];
            let unit = &mut self.combatants[idx];
            if !unit.can_act() {
                // A skipped turn forfeits the rest of this set's allotment
                let had_time = unit.timer_remaining() > 0.0;
                unit.forfeit_timer();
                if had_time {
                    let id = unit.id();
                    let description = format!("{} cannot act; turn skipped", unit.name());
                    self.emit(BattleEventType::TurnEnded { combatant: id }, description);
                }
                self.active_index += 1;
                continue;
            }
            if unit.timer_remaining() <= 0.0 {
                self.active_index += 1;
                continue;
            }

            self.start_turn(idx);
            return;
        }
    }

    fn start_turn(&mut self, idx: usize) {
        if let Some(multiplier) = self.pending_speed_modifier.take() {
            let unit = &mut self.combatants[idx];
            unit.apply_speed_modifier(multiplier);
            let id = unit.id();
            let tick_rate = unit.tick_rate();
            let description = format!("{}'s countdown runs at x{}", unit.name(), tick_rate);
            self.emit(
                BattleEventType::SpeedModifierApplied {
                    combatant: id,
                    tick_rate,
                },
                description,
            );
        }

        self.active = Some(idx);
        let unit = &self.combatants[idx];
        let id = unit.id();
        let remaining = unit.timer_remaining();
        let description = format!("{}'s turn ({:.2}s)", unit.name(), remaining);
        self.current_timer = remaining;
        self.emit(BattleEventType::TurnStarted { combatant: id }, description);
    }

    fn complete_set(&mut self) {
        // Whoever still holds time can't act; the set closes with every timer at zero
        for idx in self.roster_slice(self.current_side).to_vec() {
            self.combatants[idx].forfeit_timer();
        }
        self.set_complete = true;
        let set_number = self.set_number;
        tracing::info!("Set {} complete ({:?})", set_number, self.current_side);
        self.emit(
            BattleEventType::SetComplete { set_number },
            format!("Set {} complete", set_number),
        );
    }

    /// Hand control to the other side with refreshed countdowns
    fn switch_side(&mut self) {
        let side = self.current_side.opponent();
        self.current_side = side;
        self.active_index = 0;
        self.active = None;
        self.set_number += 1;
        self.set_complete = false;

        let roster = self.roster_slice(side).to_vec();
        for idx in roster {
            let unit = &mut self.combatants[idx];
            unit.reset_timer();
            // Postures held while defending don't carry into the side's own turns
            unit.clear_defense();
        }

        tracing::info!("Set {} begins: {:?} side", self.set_number, side);
        self.emit(BattleEventType::SideChanged { side }, format!("{:?} side's set", side));
        if self.state.is_running() {
            self.set_state(BattleState::for_side(side));
        }
    }

    /// End the active turn right away if its combatant can no longer act
    fn settle_active(&mut self) {
        if let Some(idx) = self.active {
            if !self.combatants[idx].can_act() {
                self.end_active_turn();
            }
        }
    }

    /// Victory/Defeat check. Defeat wins a simultaneous wipe.
    fn check_battle_end(&mut self) -> bool {
        let allies_down = self.allies.iter().all(|idx| !self.combatants[*idx].is_alive());
        let enemies_down = self.enemies.iter().all(|idx| !self.combatants[*idx].is_alive());

        let outcome = if allies_down {
            BattleState::Defeat
        } else if enemies_down {
            BattleState::Victory
        } else {
            return false;
        };

        self.active = None;
        self.current_timer = 0.0;
        tracing::info!("Battle ended: {:?}", outcome);
        self.set_state(outcome);
        true
    }

    fn accrue_passive_resource(&mut self, delta: f32) {
        let amount = self.config.resource.passive_gain_per_second * delta;
        if amount <= 0.0 {
            return;
        }
        for unit in self.combatants.iter_mut().filter(|unit| unit.is_alive()) {
            unit.gain_resource(amount);
        }
    }

    fn side_has_time(&self, side: Side) -> bool {
        self.roster_slice(side).iter().any(|idx| {
            let unit = &self.combatants[*idx];
            unit.can_act() && unit.timer_remaining() > 0.0
        })
    }

    fn anyone_can_act(&self) -> bool {
        self.combatants.iter().any(|unit| unit.can_act())
    }

    fn set_state(&mut self, state: BattleState) {
        if self.state == state {
            return;
        }
        self.state = state;
        self.emit(
            BattleEventType::BattleStateChanged { state },
            format!("Battle state: {:?}", state),
        );
    }

    fn emit(&mut self, event_type: BattleEventType, description: String) {
        self.events
            .push(event_type, description, self.set_number, self.elapsed);
    }

    fn roster_slice(&self, side: Side) -> &[usize] {
        match side {
            Side::Ally => &self.allies,
            Side::Opposing => &self.enemies,
        }
    }

    fn index_of(&self, id: CombatantId) -> Result<usize> {
        self.combatants
            .iter()
            .position(|unit| unit.id() == id)
            .ok_or(BattleError::InvalidTarget(id))
    }
}

fn roster_indices(combatants: &[Combatant], side: Side) -> Vec<usize> {
    combatants
        .iter()
        .enumerate()
        .filter(|(_, unit)| unit.side() == side)
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ally(name: &str, timer: f32) -> Combatant {
        Combatant::new(name, Side::Ally).with_timer_duration(timer)
    }

    fn enemy(name: &str, timer: f32) -> Combatant {
        Combatant::new(name, Side::Opposing).with_timer_duration(timer)
    }

    fn quiet_config() -> BattleConfig {
        let mut config = BattleConfig::default();
        config.resource.passive_gain_per_second = 0.0;
        config
    }

    fn scheduler(units: Vec<Combatant>) -> Scheduler {
        Scheduler::with_config(units, quiet_config()).unwrap()
    }

    #[test]
    fn test_first_ally_starts() {
        let a = ally("A", 5.0);
        let a_id = a.id();
        let mut s = scheduler(vec![a, enemy("X", 5.0)]);

        assert_eq!(s.state(), BattleState::PlayerTurn);
        assert_eq!(s.set_number(), 1);
        assert_eq!(s.active_combatant().map(|u| u.id()), Some(a_id));
        let events = s.drain_events();
        assert!(events.contains(&BattleEventType::TurnStarted { combatant: a_id }));
    }

    #[test]
    fn test_requires_both_sides() {
        let result = Scheduler::with_config(vec![ally("A", 5.0)], quiet_config());
        assert!(matches!(result, Err(BattleError::InvalidConfig(_))));
    }

    #[test]
    fn test_only_active_countdown_runs() {
        let a = ally("A", 5.0);
        let b = ally("B", 5.0);
        let (a_id, b_id) = (a.id(), b.id());
        let mut s = scheduler(vec![a, b, enemy("X", 5.0)]);

        s.advance(2.0);
        assert_eq!(s.combatant(a_id).unwrap().timer_remaining(), 3.0);
        assert_eq!(s.combatant(b_id).unwrap().timer_remaining(), 5.0);
        assert_eq!(s.current_timer(), 3.0);
    }

    #[test]
    fn test_impaired_unit_skipped_and_forfeits() {
        let a = ally("A", 5.0);
        let b = ally("B", 5.0);
        let (a_id, b_id) = (a.id(), b.id());
        let mut s = scheduler(vec![a, b, enemy("X", 5.0)]);
        s.set_impaired(b_id, true).unwrap();

        let events = s.advance(5.0);
        assert!(events.contains(&BattleEventType::TurnEnded { combatant: a_id }));
        assert!(events.contains(&BattleEventType::TurnEnded { combatant: b_id }));
        assert!(!events.contains(&BattleEventType::TurnStarted { combatant: b_id }));
        assert_eq!(s.combatant(b_id).unwrap().timer_remaining(), 0.0);
        assert_eq!(s.current_side(), Side::Opposing);
    }

    #[test]
    fn test_recovered_unit_waits_for_next_set() {
        let a = ally("A", 5.0);
        let b = ally("B", 5.0);
        let (a_id, b_id) = (a.id(), b.id());
        let mut s = scheduler(vec![a, b, enemy("X", 5.0)]);
        s.set_impaired(b_id, true).unwrap();

        // A finishes, B is skipped and forfeits its time
        s.advance(5.0);
        assert_eq!(s.current_side(), Side::Opposing);
        s.set_impaired(b_id, false).unwrap();
        assert_eq!(s.combatant(b_id).unwrap().timer_remaining(), 0.0);

        // Enemy set ends; B is refreshed with the rest of its side
        s.advance(5.0);
        assert_eq!(s.current_side(), Side::Ally);
        assert_eq!(s.combatant(b_id).unwrap().timer_remaining(), 5.0);
        s.submit_action(Action::Pass { actor: a_id }).unwrap();
        assert_eq!(s.active_combatant().map(|u| u.id()), Some(b_id));
    }

    #[test]
    fn test_nobody_able_to_act_does_not_hang() {
        let a = ally("A", 5.0);
        let x = enemy("X", 5.0);
        let (a_id, x_id) = (a.id(), x.id());
        let mut s = scheduler(vec![a, x]);
        s.set_impaired(a_id, true).unwrap();
        s.set_impaired(x_id, true).unwrap();

        s.advance(1.0);
        assert!(s.active_combatant().is_none());
        assert!(s.state().is_running());
        assert_eq!(s.combatant(a_id).unwrap().timer_remaining(), 0.0);

        // A stalled encounter does not churn through sets
        for _ in 0..5 {
            let events = s.advance(1.0);
            assert!(events.is_empty());
        }
        assert_eq!(s.set_number(), 1);
        assert_eq!(s.current_side(), Side::Ally);

        s.set_impaired(a_id, false).unwrap();
        s.set_impaired(x_id, false).unwrap();
        let events = s.advance(0.5);
        assert!(events.contains(&BattleEventType::SetComplete { set_number: 1 }));
        assert_eq!(s.set_number(), 2);
        assert_eq!(s.active_combatant().map(|u| u.id()), Some(x_id));
    }

    #[test]
    fn test_set_closes_with_every_timer_exhausted() {
        let a = ally("A", 5.0);
        let b = ally("B", 5.0);
        let (a_id, b_id) = (a.id(), b.id());
        let mut s = scheduler(vec![a, b, enemy("X", 5.0)]);

        // A passes with time left, then is impaired while B plays out
        s.submit_action(Action::Pass { actor: a_id }).unwrap();
        s.set_impaired(a_id, true).unwrap();
        let events = s.advance(5.0);

        assert!(events.contains(&BattleEventType::TurnEnded { combatant: b_id }));
        assert!(events.contains(&BattleEventType::SetComplete { set_number: 1 }));
        assert_eq!(s.combatant(a_id).unwrap().timer_remaining(), 0.0);
        assert_eq!(s.combatant(b_id).unwrap().timer_remaining(), 0.0);
    }

    #[test]
    fn test_pause_freezes_everything() {
        let a = ally("A", 5.0);
        let a_id = a.id();
        let mut s = scheduler(vec![a, enemy("X", 5.0)]);
        s.advance(1.0);
        s.pause().unwrap();
        s.drain_events();
        let index = s.active_index();

        let events = s.advance(10.0);
        assert!(events.is_empty());
        assert_eq!(s.combatant(a_id).unwrap().timer_remaining(), 4.0);
        assert_eq!(s.active_index(), index);
        assert_eq!(s.state(), BattleState::Paused);

        s.resume().unwrap();
        assert_eq!(s.state(), BattleState::PlayerTurn);
        s.advance(1.0);
        assert_eq!(s.combatant(a_id).unwrap().timer_remaining(), 3.0);
    }

    #[test]
    fn test_pause_rules() {
        let mut s = scheduler(vec![ally("A", 5.0), enemy("X", 5.0)]);
        assert!(s.resume().is_err());
        s.pause().unwrap();
        assert!(s.pause().is_err());
    }

    #[test]
    fn test_gate_freezes_countdown_only() {
        let a = ally("A", 5.0);
        let b = ally("B", 5.0);
        let (a_id, b_id) = (a.id(), b.id());
        let mut s = scheduler(vec![a, b, enemy("X", 5.0)]);

        s.begin_action_gate();
        s.advance(3.0);
        assert_eq!(s.combatant(a_id).unwrap().timer_remaining(), 5.0);

        // Explicit pass still ends the turn while gated
        s.submit_action(Action::Pass { actor: a_id }).unwrap();
        assert_eq!(s.active_combatant().map(|u| u.id()), Some(b_id));

        s.end_action_gate();
        s.advance(1.0);
        assert_eq!(s.combatant(b_id).unwrap().timer_remaining(), 4.0);
    }

    #[test]
    fn test_speed_modifier_is_one_shot() {
        let a = ally("A", 4.0);
        let b = ally("B", 4.0);
        let c = ally("C", 4.0);
        let (a_id, b_id, c_id) = (a.id(), b.id(), c.id());
        let mut s = scheduler(vec![a, b, c, enemy("X", 4.0)]);

        s.apply_speed_modifier(0.5);
        // Queued during A's turn: A keeps its rate
        s.advance(1.0);
        assert_eq!(s.combatant(a_id).unwrap().tick_rate(), 1.0);

        s.submit_action(Action::Pass { actor: a_id }).unwrap();
        assert_eq!(s.combatant(b_id).unwrap().tick_rate(), 0.5);
        assert!(s.pending_speed_modifier().is_none());

        s.advance(2.0);
        assert_eq!(s.combatant(b_id).unwrap().timer_remaining(), 3.0);

        s.submit_action(Action::Pass { actor: b_id }).unwrap();
        assert_eq!(s.combatant(c_id).unwrap().tick_rate(), 1.0);
    }

    #[test]
    fn test_speed_modifier_floor() {
        let mut s = scheduler(vec![ally("A", 4.0), enemy("X", 4.0)]);
        s.apply_speed_modifier(0.05);
        assert_eq!(s.pending_speed_modifier(), Some(0.25));
    }

    #[test]
    fn test_refresh_resets_tick_rate_and_defense() {
        let a = ally("A", 2.0);
        let x = enemy("X", 2.0);
        let (a_id, x_id) = (a.id(), x.id());
        let mut s = scheduler(vec![a, x]);

        s.submit_action(Action::Defend {
            actor: x_id,
            posture: Posture::Dodge,
            timing: 0.0,
        })
        .unwrap();
        s.advance(2.0);
        assert_eq!(s.current_side(), Side::Opposing);
        assert_eq!(s.combatant(x_id).unwrap().posture(), Posture::None);
        assert_eq!(s.active_combatant().map(|u| u.id()), Some(x_id));
        assert_eq!(s.combatant(a_id).unwrap().timer_remaining(), 0.0);
    }

    #[test]
    fn test_passive_resource_accrual() {
        let a = ally("A", 10.0);
        let x = enemy("X", 10.0);
        let (a_id, x_id) = (a.id(), x.id());
        let mut s = Scheduler::with_config(vec![a, x], BattleConfig::default()).unwrap();

        s.advance(2.0);
        assert_eq!(s.combatant(a_id).unwrap().resource(), 10.0);
        assert_eq!(s.combatant(x_id).unwrap().resource(), 10.0);
    }

    #[test]
    fn test_reset_restores_start() {
        let a = ally("A", 3.0);
        let a_id = a.id();
        let mut s = scheduler(vec![a, enemy("X", 3.0)]);
        s.advance(3.0);
        assert_eq!(s.current_side(), Side::Opposing);

        s.reset();
        assert_eq!(s.state(), BattleState::PlayerTurn);
        assert_eq!(s.set_number(), 1);
        assert_eq!(s.active_combatant().map(|u| u.id()), Some(a_id));
        assert_eq!(s.combatant(a_id).unwrap().timer_remaining(), 3.0);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let a = ally("A", 4.0).with_slot(Slot::North);
        let b = ally("B", 4.0).with_slot(Slot::North);
        let a_id = a.id();
        let mut s = scheduler(vec![a, b, enemy("X", 4.0)]);
        s.advance(1.0);

        let snapshot = s.snapshot();
        assert_eq!(snapshot.active, Some(a_id));
        assert_eq!(snapshot.timer_fraction, 0.75);
        assert_eq!(snapshot.combatants.len(), 3);
        let north = snapshot
            .postures
            .iter()
            .find(|p| p.slot == Slot::North)
            .unwrap();
        assert!(north.guard && north.dodge && !north.parry);
    }
}
