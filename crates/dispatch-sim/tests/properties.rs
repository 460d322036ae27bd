//! Property-based tests for the dispatch engine invariants.
//!
//! Random intent sequences must never break the single-active-call rule,
//! severity monotonicity, protocol gating or unit exclusivity.

use glam::IVec2;
use hecs::World;
use proptest::prelude::*;

use dispatch_core::components::{MoveProgress, MoveTarget, Unit, UnitState};
use dispatch_core::constants::DT;
use dispatch_core::enums::{Agency, CallStatus, UnitStatus};
use dispatch_core::types::{manhattan, CallId};
use dispatch_sim::systems::movement;
use dispatch_sim::{ShiftEngine, SimConfig};

fn engine(seed: u64) -> ShiftEngine {
    let mut engine = ShiftEngine::with_builtin_catalog(SimConfig::scripted(seed)).unwrap();
    engine.start_shift().unwrap();
    engine
}

/// Answer a call for `template_id` and route it when the template asks for it.
fn answer_routed(engine: &mut ShiftEngine, template_id: &str) -> CallId {
    let call = engine.spawn_template(template_id).unwrap().unwrap();
    engine.answer(call).unwrap();
    let template = engine.catalog().template(template_id).unwrap().clone();
    if template.routing {
        assert!(engine.route_service(template.agency).unwrap());
    }
    call
}

fn template_ids(engine: &ShiftEngine) -> Vec<String> {
    engine
        .catalog()
        .templates()
        .iter()
        .map(|t| t.id.clone())
        .collect()
}

#[derive(Debug, Clone)]
enum Intent {
    Spawn,
    Answer(u32),
    Hold,
    Dismiss,
    Tick(u8),
}

fn arb_intent() -> impl Strategy<Value = Intent> {
    prop_oneof![
        Just(Intent::Spawn),
        (1u32..8).prop_map(Intent::Answer),
        Just(Intent::Hold),
        Just(Intent::Dismiss),
        (1u8..20).prop_map(Intent::Tick),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn at_most_one_active_call(seed in 0u64..1000, intents in prop::collection::vec(arb_intent(), 1..60)) {
        let mut engine = engine(seed);
        for intent in intents {
            let _ = match intent {
                Intent::Spawn => engine.spawn_call().map(|_| ()),
                Intent::Answer(id) => engine.answer(id),
                Intent::Hold => engine.hold(),
                Intent::Dismiss => engine.dismiss(),
                Intent::Tick(n) => {
                    for _ in 0..n {
                        engine.tick(DT);
                    }
                    Ok(())
                }
            };
            let active = engine
                .calls()
                .open()
                .filter(|c| c.status == CallStatus::Active)
                .count();
            prop_assert!(active <= 1);
            prop_assert_eq!(active, usize::from(engine.calls().active().is_some()));
            prop_assert!(engine.calls().closed().iter().all(|c| c.status == CallStatus::Closed));
        }
    }

    #[test]
    fn severity_never_decreases(
        template in 0usize..11,
        steps in prop::collection::vec((any::<bool>(), 0usize..8), 1..30),
    ) {
        let mut engine = engine(5);
        let ids = template_ids(&engine);
        let template_id = &ids[template % ids.len()];
        let call = answer_routed(&mut engine, template_id);

        let questions: Vec<String> = engine.catalog().template(template_id).unwrap()
            .protocol.questions().iter().map(|q| q.id.clone()).collect();
        let mut last = engine.calls().get(call).unwrap().severity;

        for (ask, pick) in steps {
            if ask && !questions.is_empty() {
                let _ = engine.ask_question(&questions[pick % questions.len()]);
            } else {
                for _ in 0..30 {
                    engine.tick(DT);
                }
            }
            let Some(instance) = engine.calls().get(call) else { break };
            prop_assert!(instance.severity >= last, "{:?} regressed to {:?}", last, instance.severity);
            last = instance.severity;
        }
    }

    #[test]
    fn dispatch_unlocked_iff_mandatory_asked(template in 0usize..11, mask in 0u32..64) {
        let mut engine = engine(11);
        let ids = template_ids(&engine);
        let template_id = &ids[template % ids.len()];
        let call = answer_routed(&mut engine, template_id);

        let protocol = engine.catalog().template(template_id).unwrap().protocol.clone();
        let asked: Vec<String> = protocol
            .questions()
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, q)| q.id.clone())
            .collect();
        for q in &asked {
            engine.ask_question(q).unwrap();
        }

        let expected = protocol.mandatory().iter().all(|m| asked.contains(m));
        prop_assert_eq!(engine.calls().get(call).unwrap().dispatch_unlocked(), expected);
        let before = engine.dispatcher().incidents().count();
        let result = engine.request_dispatch();
        prop_assert_eq!(result.is_ok(), expected);
        prop_assert_eq!(engine.dispatcher().incidents().count(), before + usize::from(expected));
    }

    #[test]
    fn travel_ticks_match_manhattan_distance(
        sx in 0i32..18, sy in 0i32..12,
        tx in 0i32..18, ty in 0i32..12,
        speed in 1u8..=10,
    ) {
        let start = IVec2::new(sx, sy);
        let target = IVec2::new(tx, ty);
        let speed = f64::from(speed);

        let mut world = World::new();
        world.spawn((
            Unit { id: "U".into(), name: "Unit".into(), role: "area_patrol".into(), agency: Agency::Police },
            start,
            UnitState { status: UnitStatus::Enroute, target: Some(MoveTarget { cell: target, incident: 1 }) },
            MoveProgress::default(),
        ));

        let mut ticks: i64 = 0;
        loop {
            ticks += 1;
            if !movement::run(&mut world, speed, DT).is_empty() {
                break;
            }
            prop_assert!(ticks < 10_000);
        }
        let expected = (f64::from(manhattan(start, target)) / (speed * DT)).ceil() as i64;
        prop_assert!((ticks - expected).abs() <= 1, "ticks {} expected {}", ticks, expected);
    }

    #[test]
    fn unit_serves_one_open_incident(
        seed in 0u64..1000,
        ops in prop::collection::vec((0usize..4, 0usize..8, 0u8..3), 1..40),
    ) {
        let mut engine = engine(seed);
        let mut incidents = Vec::new();
        for _ in 0..4 {
            let call = engine.spawn_template("fall_injury").unwrap().unwrap();
            engine.answer(call).unwrap();
            incidents.push(engine.request_dispatch().unwrap());
            engine.end_call().unwrap();
        }
        let units: Vec<String> = engine.catalog().city().units.iter().map(|u| u.id.clone()).collect();

        for (incident, unit, action) in ops {
            match action {
                0 => {
                    let _ = engine.dispatch(incidents[incident], &units[unit]);
                }
                1 => {
                    for _ in 0..25 {
                        engine.tick(DT);
                    }
                }
                _ => {
                    let _ = engine.resolve_incident(incidents[incident]);
                }
            }
            for unit_id in &units {
                let assigned = engine
                    .dispatcher()
                    .incidents()
                    .filter(|i| !i.is_resolved() && i.assigned_unit.as_deref() == Some(unit_id.as_str()))
                    .count();
                prop_assert!(assigned <= 1, "{} assigned to {} open incidents", unit_id, assigned);
            }
        }
    }
}
