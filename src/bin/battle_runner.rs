//! Headless Battle Runner
//!
//! Plays a scripted encounter between a demo party and a pair of monsters and
//! prints either the event stream or the final snapshot.

use std::path::PathBuf;

use clap::Parser;
use hypnos_battle::battle::{
    Action, BattleEventLog, BattleSnapshot, BattleState, DefenseResolver, PositionBoard,
    Scheduler,
};
use hypnos_battle::combat::{Combatant, Element, ResistanceTable};
use hypnos_battle::core::{load_config, BattleConfig, CombatantId, Posture, Side, Slot};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// Headless Battle Runner - scripted encounters for balance checks
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Run a scripted encounter and report the outcome")]
struct Args {
    /// Battle tuning file (TOML); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum steps before giving up
    #[arg(long, default_value_t = 2000)]
    steps: u32,

    /// Seconds of battle time per step
    #[arg(long, default_value_t = 0.25)]
    dt: f32,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print every event to stderr as it happens
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct RunResult {
    outcome: BattleState,
    steps: u32,
    /// Battle time simulated, in seconds
    battle_time: f32,
    sets: u32,
    events: usize,
    seed: u64,
    snapshot: BattleSnapshot,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hypnos_battle=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let config = match &args.config {
        Some(path) => load_config(path).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config '{}': {}", path.display(), e);
            eprintln!("Using default tuning");
            BattleConfig::default()
        }),
        None => BattleConfig::default(),
    };

    let board = PositionBoard::new(&[Slot::North, Slot::East, Slot::South, Slot::West, Slot::Center]);
    let resolver = DefenseResolver::new(&config);
    let mut scheduler = match Scheduler::new(demo_roster(), board, resolver, config) {
        Ok(scheduler) => scheduler,
        Err(e) => {
            eprintln!("Failed to set up encounter: {}", e);
            std::process::exit(1);
        }
    };

    let mut log = scheduler.drain_events();
    if args.verbose {
        print_events(&log);
    }

    let mut steps = 0;
    let mut last_actor: Option<(CombatantId, u32)> = None;
    while !scheduler.state().is_terminal() && steps < args.steps {
        let mut step_log = BattleEventLog::new();

        if let Some(turn) = take_turn(&mut scheduler, &mut rng, &mut last_actor) {
            step_log.extend(turn);
        }
        step_log.extend(scheduler.advance(args.dt));

        if args.verbose {
            print_events(&step_log);
        }
        log.extend(step_log);
        steps += 1;
    }

    let result = RunResult {
        outcome: scheduler.state(),
        steps,
        battle_time: scheduler.elapsed(),
        sets: scheduler.set_number(),
        events: log.len(),
        seed,
        snapshot: scheduler.snapshot(),
    };

    match args.format.as_str() {
        "json" => print_json(&result),
        "text" => {
            println!("Battle Result");
            println!("=============");
            for event in log.iter() {
                println!("[set {} @ {:6.2}s] {}", event.set_number, event.time, event.description);
            }
            println!();
            println!("Outcome: {:?}", result.outcome);
            println!("Steps: {} ({:.1}s)", result.steps, result.battle_time);
            println!("Sets: {}", result.sets);
            for unit in &result.snapshot.combatants {
                println!(
                    "  {:<12} {:?} hp {:5.1} ({:3.0}%) resource {:3.0}%{}",
                    unit.name,
                    unit.side,
                    unit.health,
                    unit.health_fraction * 100.0,
                    unit.resource_fraction * 100.0,
                    if unit.alive { "" } else { " [down]" }
                );
            }
            println!("Seed: {}", result.seed);
        }
        _ => {
            eprintln!("Unknown format '{}', defaulting to json", args.format);
            print_json(&result);
        }
    }
}

/// Scripted policy: the defending side braces, then the active combatant
/// transforms when it can, strikes the first living opponent once per turn
/// and sometimes passes early.
fn take_turn(
    scheduler: &mut Scheduler,
    rng: &mut ChaCha8Rng,
    last_actor: &mut Option<(CombatantId, u32)>,
) -> Option<BattleEventLog> {
    let actor = scheduler.active_combatant()?;
    let actor_id = actor.id();
    let side = actor.side();
    let can_transform = actor.can_transform();
    let set_number = scheduler.set_number();
    if *last_actor == Some((actor_id, set_number)) {
        return None;
    }

    let target = scheduler
        .roster(side.opponent())
        .find(|unit| unit.is_alive())
        .map(|unit| (unit.id(), unit.slot()))?;

    let mut log = BattleEventLog::new();
    let snapshot = scheduler.snapshot();
    let postures: Vec<Posture> = snapshot
        .postures
        .iter()
        .find(|p| p.slot == target.1)
        .map(|p| {
            [
                (Posture::Guard, p.guard),
                (Posture::Dodge, p.dodge),
                (Posture::Parry, p.parry),
            ]
            .into_iter()
            .filter(|(_, available)| *available)
            .map(|(posture, _)| posture)
            .collect()
        })
        .unwrap_or_default();
    if let Some(posture) = postures.choose(rng) {
        let timing = rng.gen_range(0.0..0.4);
        submit(scheduler, Action::Defend { actor: target.0, posture: *posture, timing }, &mut log);
    }

    if can_transform {
        submit(scheduler, Action::Transform { actor: actor_id }, &mut log);
    }

    let element = match side {
        Side::Ally => *[Element::Physical, Element::Fire, Element::Water]
            .choose(rng)
            .unwrap_or(&Element::Physical),
        Side::Opposing => Element::Physical,
    };
    submit(scheduler, Action::Attack { actor: actor_id, target: target.0, element }, &mut log);
    *last_actor = Some((actor_id, set_number));

    if rng.gen_bool(0.5) {
        submit(scheduler, Action::Pass { actor: actor_id }, &mut log);
    }
    Some(log)
}

fn submit(scheduler: &mut Scheduler, action: Action, log: &mut BattleEventLog) {
    match scheduler.submit_action(action.clone()) {
        Ok(ack) => log.extend(ack.events),
        Err(e) => tracing::debug!("{:?} rejected: {}", action.kind(), e),
    }
}

fn demo_roster() -> Vec<Combatant> {
    vec![
        Combatant::new("Ade", Side::Ally)
            .with_slot(Slot::West)
            .with_attack_power(12.0),
        Combatant::new("Bisi", Side::Ally)
            .with_slot(Slot::West)
            .with_timer_duration(10.0),
        Combatant::new("Chike", Side::Ally)
            .with_slot(Slot::North)
            .with_max_health(80.0)
            .with_attack_power(14.0),
        Combatant::new("Hollow Beast", Side::Opposing)
            .with_max_health(220.0)
            .with_attack_power(18.0)
            .with_resistances(
                ResistanceTable::new()
                    .with(Element::Fire, 1.5)
                    .with(Element::Water, 0.5),
            ),
        Combatant::new("Shade", Side::Opposing)
            .with_max_health(140.0)
            .with_attack_power(12.0)
            .with_resistance(Element::Water, 1.5),
    ]
}

fn print_events(log: &BattleEventLog) {
    for event in log.iter() {
        eprintln!(
            "  [set {} @ {:.2}s] {:?}: {}",
            event.set_number, event.time, event.event_type, event.description
        );
    }
}

fn print_json(result: &RunResult) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize result: {}", e),
    }
}
