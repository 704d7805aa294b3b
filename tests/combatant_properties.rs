//! Property tests: combatant bars stay in range under any mutator sequence

use hypnos_battle::combat::{Combatant, Element};
use hypnos_battle::core::{Posture, Side};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Damage(f32, Element),
    Gain(f32),
    Enter,
    Exit(bool),
    Spend(f32),
    Tick(f32),
    Bank(f32),
    Refresh,
    Modifier(f32),
    Defend(Posture, f32),
}

fn element() -> impl Strategy<Value = Element> {
    prop::sample::select(Element::all().to_vec())
}

fn posture() -> impl Strategy<Value = Posture> {
    prop::sample::select(vec![Posture::None, Posture::Guard, Posture::Dodge, Posture::Parry])
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-50.0f32..200.0, element()).prop_map(|(amount, element)| Op::Damage(amount, element)),
        (-50.0f32..200.0).prop_map(Op::Gain),
        Just(Op::Enter),
        any::<bool>().prop_map(Op::Exit),
        (-10.0f32..80.0).prop_map(Op::Spend),
        (0.0f32..20.0).prop_map(Op::Tick),
        (-5.0f32..5.0).prop_map(Op::Bank),
        Just(Op::Refresh),
        (-1.0f32..3.0).prop_map(Op::Modifier),
        (posture(), -1.0f32..2.0).prop_map(|(posture, timing)| Op::Defend(posture, timing)),
    ]
}

fn apply(unit: &mut Combatant, op: &Op) {
    match op {
        Op::Damage(amount, element) => {
            unit.take_damage(*amount, *element);
        }
        Op::Gain(amount) => unit.gain_resource(*amount),
        Op::Enter => {
            unit.enter_form();
        }
        Op::Exit(forced) => {
            unit.exit_form(*forced);
        }
        Op::Spend(amount) => {
            unit.spend_form_points(*amount);
        }
        Op::Tick(elapsed) => {
            unit.tick_timer(*elapsed);
        }
        Op::Bank(seconds) => unit.add_banked_time(*seconds),
        Op::Refresh => unit.reset_timer(),
        Op::Modifier(multiplier) => unit.apply_speed_modifier(*multiplier),
        Op::Defend(posture, timing) => unit.prepare_defense(*posture, *timing),
    }
}

fn subject() -> Combatant {
    Combatant::new("Ade", Side::Ally)
        .with_resistance(Element::Fire, 2.0)
        .with_resistance(Element::Water, 0.0)
        .with_max_resource(60.0)
}

proptest! {
    #[test]
    fn bars_stay_clamped(ops in prop::collection::vec(op(), 0..64)) {
        let mut unit = subject();
        for op in &ops {
            apply(&mut unit, op);

            prop_assert!(unit.health() >= 0.0 && unit.health() <= unit.max_health());
            prop_assert!(unit.resource() >= 0.0 && unit.resource() <= unit.max_resource());
            prop_assert!(unit.form_points() >= 0.0 && unit.form_points() <= unit.max_form_points());
            prop_assert!(unit.timer_remaining() >= 0.0);
            prop_assert!(unit.banked_time() >= 0.0);
            prop_assert!(unit.tick_rate() >= 0.25);
            prop_assert!((0.0..=1.0).contains(&unit.defense_timing()));
            prop_assert!((0.0..=1.0).contains(&unit.health_fraction()));
        }
    }

    #[test]
    fn form_points_only_exist_in_form(ops in prop::collection::vec(op(), 0..64)) {
        let mut unit = subject();
        for op in &ops {
            apply(&mut unit, op);
            if !unit.form_active() {
                prop_assert_eq!(unit.form_points(), 0.0);
            }
        }
    }

    #[test]
    fn downed_combatants_stay_down(ops in prop::collection::vec(op(), 0..32)) {
        let mut unit = subject();
        unit.take_damage(1_000.0, Element::Physical);
        prop_assert!(!unit.is_alive());
        for op in &ops {
            apply(&mut unit, op);
            prop_assert!(!unit.is_alive());
            prop_assert!(!unit.can_act());
            prop_assert!(!unit.form_active());
        }
    }

    #[test]
    fn overexertion_caps_health(hit in 60.0f32..200.0) {
        let mut unit = subject();
        unit.gain_resource(60.0);
        prop_assert!(unit.enter_form());
        let report = unit.take_damage(hit, Element::Physical);
        prop_assert!(report.forced_exit);
        prop_assert!(unit.is_overexerted());
        prop_assert!(unit.health() <= unit.max_health() * 0.25);
    }
}
