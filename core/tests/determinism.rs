//! THE MOST IMPORTANT TEST IN THE PROJECT.
//!
//! Two engines, same seed, same actions.
//! They must produce byte-identical action logs and identical worlds.
//! Any divergence is a blocker; do not merge until fixed.

use expedition_core::{
    action::Action,
    config::SimConfig,
    engine::SimEngine,
    skills::Skill,
    store::SimStore,
    world::guild_location_id,
};

fn build_engine(seed: &str) -> SimEngine {
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    let run_id = format!("det-test-{seed}");
    store
        .insert_run(&run_id, seed, "0.1.0-test", "2026-01-01T00:00:00Z")
        .expect("insert run");
    let mut engine = SimEngine::new(seed, SimConfig::default_test());
    engine.attach_store(store, run_id).expect("attach store");
    engine
}

fn script() -> Vec<Action> {
    vec![
        Action::TravelToLocation { location_id: guild_location_id(Skill::Exploration) },
        Action::Enrol { skill: Skill::Exploration },
        Action::Leave,
        Action::Survey,
        Action::Survey,
        Action::Explore,
        Action::Survey,
    ]
}

fn collect_action_log(engine: &SimEngine) -> Vec<String> {
    let store = engine.store().expect("store attached");
    let run_id = engine.run_id().expect("run id");
    store
        .actions_for_run(run_id)
        .expect("read actions")
        .into_iter()
        .map(|e| e.payload)
        .collect()
}

fn run_script(engine: &mut SimEngine) {
    for action in script() {
        engine.execute(action).expect("action resolves");
    }
}

#[test]
fn same_seed_produces_identical_action_logs() {
    let mut engine_a = build_engine("s1");
    let mut engine_b = build_engine("s1");

    run_script(&mut engine_a);
    run_script(&mut engine_b);

    let log_a = collect_action_log(&engine_a);
    let log_b = collect_action_log(&engine_b);

    assert_eq!(
        log_a.len(), log_b.len(),
        "Action log lengths differ: {} vs {}",
        log_a.len(), log_b.len()
    );
    assert_eq!(log_a.len(), script().len());

    for (i, (a, b)) in log_a.iter().zip(log_b.iter()).enumerate() {
        assert_eq!(
            a, b,
            "Action log diverged at entry {i}:\n  A: {a}\n  B: {b}"
        );
    }

    let world_a = serde_json::to_string(&engine_a.world).unwrap();
    let world_b = serde_json::to_string(&engine_b.world).unwrap();
    assert_eq!(world_a, world_b, "Final worlds differ");
}

#[test]
fn different_seeds_produce_different_logs() {
    let mut engine_a = build_engine("s1");
    let mut engine_b = build_engine("s2");

    run_script(&mut engine_a);
    run_script(&mut engine_b);

    // The survey rolls draw from each seed's stream, so the audits differ.
    let log_a = collect_action_log(&engine_a);
    let log_b = collect_action_log(&engine_b);

    let any_different = log_a.iter().zip(log_b.iter()).any(|(a, b)| a != b);
    assert!(any_different, "Different seeds produced identical logs; seed is not being used");
}

#[test]
fn rng_counter_only_moves_forward() {
    let mut engine = build_engine("s1");
    let mut last = engine.world.rng.counter;
    for action in script() {
        let result = engine.execute(action).expect("action resolves");
        let counter = engine.world.rng.counter;
        assert!(counter >= last);
        assert_eq!(counter - last, result.rng_roll_audit.len() as u64);
        for pair in result.rng_roll_audit.windows(2) {
            assert_eq!(pair[1].counter_value, pair[0].counter_value + 1);
        }
        last = counter;
    }
}

#[test]
fn identical_worlds_in_one_process_do_not_share_a_stream() {
    let mut engine_a = build_engine("s1");
    let engine_b = build_engine("s1");

    run_script(&mut engine_a);

    // Running A never advances B.
    assert!(engine_a.world.rng.counter > 0);
    assert_eq!(engine_b.world.rng.counter, 0);
}
