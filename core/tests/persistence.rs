//! Save documents and the SQLite action log.

use chrono::{TimeZone, Utc};
use expedition_core::{
    action::Action,
    config::SimConfig,
    engine::SimEngine,
    error::SimError,
    naming::WordListNamer,
    outcome::ActionResult,
    skills::{Skill, SkillState},
    snapshot::{SaveDocument, SAVE_FORMAT_VERSION},
    store::SimStore,
    world::connection_id,
};

fn played_engine(seed: &str) -> SimEngine {
    let mut engine = SimEngine::new(seed, SimConfig::default_test());
    engine.world.player.skills.insert(Skill::Exploration, SkillState::enrolled());
    engine.world.exploration.known_connections.insert(connection_id("home", "d1-0"));
    engine.world.exploration.known_areas.insert("d1-0".into());
    engine.execute(Action::Move { to_area: "d1-0".into() }).unwrap();
    engine
}

#[test]
fn loaded_save_continues_identically() {
    let mut original = played_engine("save");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("save.json");
    original.save_document().save_to_file(&path).unwrap();

    let doc = SaveDocument::load_from_file(&path).unwrap();
    assert_eq!(doc.format_version, SAVE_FORMAT_VERSION);
    assert_eq!(doc.seed, "save");
    assert_eq!(doc.world, original.world);
    let mut restored = SimEngine::from_save(doc, SimConfig::default_test());

    // Same legal actions.
    for action in [Action::Survey, Action::Explore, Action::Move { to_area: "home".into() }] {
        assert_eq!(original.check(&action).unwrap(), restored.check(&action).unwrap());
    }

    // Same next outcomes, draw for draw.
    for action in [Action::Explore, Action::Survey] {
        let a = original.execute(action.clone()).unwrap();
        let b = restored.execute(action).unwrap();
        assert_eq!(a, b);
    }
    assert_eq!(original.world, restored.world);
}

#[test]
fn save_json_is_byte_stable() {
    let engine = played_engine("stable");
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let first = SaveDocument::at(engine.world.clone(), at).to_json().unwrap();
    let reparsed = SaveDocument::from_json(&first).unwrap();
    let second = reparsed.to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn tampered_seed_is_rejected() {
    let engine = played_engine("tamper");
    let mut doc = engine.save_document();
    doc.seed = "other".into();
    let json = doc.to_json().unwrap();
    match SaveDocument::from_json(&json) {
        Err(SimError::InvariantViolation(msg)) => assert!(msg.contains("seed")),
        other => panic!("expected invariant violation, got {other:?}"),
    }
}

#[test]
fn action_log_records_every_result_in_order() {
    let store = SimStore::in_memory().unwrap();
    store.migrate().unwrap();
    store.insert_run("run-1", "log", "0.1.0-test", "2026-01-01T00:00:00Z").unwrap();

    let mut engine = SimEngine::with_namer("log", SimConfig::default_test(), Box::new(WordListNamer));
    engine.attach_store(store, "run-1".into()).unwrap();

    let mut results = Vec::new();
    for action in [Action::Leave, Action::Survey, Action::Enrol { skill: Skill::Mining }] {
        results.push(engine.execute(action).unwrap());
    }

    let store = engine.store().unwrap();
    let entries = store.actions_for_run("run-1").unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(store.action_count("run-1").unwrap(), 3);
    assert_eq!(store.failure_count("run-1").unwrap(), results.iter().filter(|r| !r.success).count() as u64);
    for (i, (entry, result)) in entries.iter().zip(&results).enumerate() {
        assert_eq!(entry.seq, i as u64);
        assert_eq!(entry.action_type, result.action_type);
        assert_eq!(entry.success, result.success);
        let decoded: ActionResult = serde_json::from_str(&entry.payload).unwrap();
        assert_eq!(&decoded, result);
    }
}

#[test]
fn saves_are_stored_per_run() {
    let store = SimStore::in_memory().unwrap();
    store.migrate().unwrap();
    store.insert_run("run-1", "saves", "0.1.0-test", "2026-01-01T00:00:00Z").unwrap();
    assert!(store.latest_save("run-1").unwrap().is_none());

    let mut engine = played_engine("saves");
    let early = engine.save_document();
    store.insert_save("run-1", &early).unwrap();
    engine.execute(Action::Move { to_area: "home".into() }).unwrap();
    let late = engine.save_document();
    store.insert_save("run-1", &late).unwrap();

    let latest = store.latest_save("run-1").unwrap().expect("a save");
    assert_eq!(latest.world, late.world);
    assert!(store.latest_save("run-2").unwrap().is_none());
}

#[test]
fn reattaching_a_store_continues_the_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.db");
    let path = path.to_str().unwrap();

    let store = SimStore::open(path).unwrap();
    store.migrate().unwrap();
    store.insert_run("run-1", "seq", "0.1.0-test", "2026-01-01T00:00:00Z").unwrap();
    let mut engine = SimEngine::new("seq", SimConfig::default_test());
    engine.attach_store(store, "run-1".into()).unwrap();
    engine.execute(Action::Leave).unwrap();
    engine.execute(Action::Leave).unwrap();

    let reopened = engine.store().unwrap().reopen().unwrap();
    let mut resumed = SimEngine::from_world(engine.world.clone(), SimConfig::default_test(), Box::new(WordListNamer));
    resumed.attach_store(reopened, "run-1".into()).unwrap();
    resumed.execute(Action::Leave).unwrap();

    let seqs: Vec<u64> = resumed
        .store()
        .unwrap()
        .actions_for_run("run-1")
        .unwrap()
        .iter()
        .map(|e| e.seq)
        .collect();
    assert_eq!(seqs, vec![0, 1, 2]);
}
