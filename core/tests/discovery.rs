//! Discovery scenarios: area counts, chance floor, survey and explore
//! through the engine, and the shape of generated areas.

use expedition_core::{
    action::Action,
    config::SimConfig,
    discovery::{area_count_at_distance, chance_inputs, discovery_chance},
    engine::SimEngine,
    naming::FallbackNamer,
    outcome::{Discovery, DiscoveryMethod, FailureKind},
    skills::{Skill, SkillState},
    types::HOME_AREA_ID,
    world::{connection_id, WorldState},
};

fn explorer(seed: &str) -> SimEngine {
    let mut engine = SimEngine::new(seed, SimConfig::default_test());
    engine.world.player.skills.insert(Skill::Exploration, SkillState::enrolled());
    engine
}

/// Make the home edge to `area_id` known, as if a survey had found it.
fn reveal_from_home(engine: &mut SimEngine, area_id: &str) {
    let ex = &mut engine.world.exploration;
    ex.known_connections.insert(connection_id(HOME_AREA_ID, area_id));
    ex.known_areas.insert(area_id.to_string());
}

fn assert_graph_shape(world: &WorldState) {
    for conn in world.exploration.connections.values() {
        assert_ne!(conn.area_a, conn.area_b, "self edge {}", conn.connection_id);
        let a = world.exploration.areas.get(&conn.area_a).expect("endpoint a exists");
        let b = world.exploration.areas.get(&conn.area_b).expect("endpoint b exists");
        assert!(
            a.distance.abs_diff(b.distance) <= 1,
            "edge {} spans distances {} and {}",
            conn.connection_id, a.distance, b.distance
        );
        assert!(conn.travel_time_multiplier > 0.0);
    }
}

#[test]
fn area_counts_are_fixed() {
    let cfg = SimConfig::default_test().discovery;
    assert_eq!(area_count_at_distance(3, &cfg), 13);
    assert_eq!(area_count_at_distance(5, &cfg), 34);
}

#[test]
fn unenrolled_explore_chance_is_the_floor() {
    let cfg = SimConfig::default_test();
    let mut engine = SimEngine::new("floor", cfg.clone());
    let at_home = engine.check(&Action::Explore).unwrap();
    assert!(at_home.valid);
    assert_eq!(at_home.success_probability, cfg.discovery.chance_floor);

    // More knowledge does not lift an unenrolled actor off the floor.
    reveal_from_home(&mut engine, "d1-0");
    reveal_from_home(&mut engine, "d1-1");
    let inputs = chance_inputs(&engine.world, &cfg.discovery).unwrap();
    assert_eq!(inputs.connected_known, 2);
    assert_eq!(discovery_chance(&inputs, &cfg.discovery), cfg.discovery.chance_floor);
    assert_eq!(
        engine.check(&Action::Explore).unwrap().success_probability,
        cfg.discovery.chance_floor
    );
}

#[test]
fn survey_from_home_finds_a_new_area() {
    let mut engine = explorer("s1");
    let interval = engine.check(&Action::Survey).unwrap().time_cost;

    let result = engine.execute(Action::Survey).unwrap();
    assert!(result.success, "survey failed: {:?}", result.failure_kind);

    let detail = result.discovery().expect("discovery detail");
    assert_eq!(detail.method, DiscoveryMethod::Survey);
    assert_eq!(detail.wasted_hits, 0);
    assert_eq!(result.time_consumed, detail.attempts as u64 * interval);

    let (connection, to_area) = match &detail.found {
        Some(Discovery::Connection { connection_id, to_area, new_area }) => {
            assert!(*new_area);
            (connection_id.clone(), to_area.clone())
        }
        other => panic!("survey should find a connection, got {other:?}"),
    };
    let ex = &engine.world.exploration;
    assert!(ex.known_connections.contains(&connection));
    assert!(ex.known_areas.contains(&to_area));
    assert!(ex.areas[&to_area].generated, "a found area is promoted");
    assert_eq!(ex.areas[&to_area].distance, 1);

    // Exploration XP equals the ticks spent.
    let gained = result.skill_gained.expect("exploration xp");
    assert_eq!(gained.skill, Skill::Exploration);
    assert_eq!(gained.amount, result.time_consumed);

    // Every attempt rolls; the hit also picks a target.
    assert_eq!(result.rng_roll_audit[0].label, "survey.roll");
    assert!(result.rng_roll_audit.iter().any(|r| r.label == "survey.target"));

    // The player stays put, and the new area is now a legal move.
    assert_eq!(engine.world.player.position.area_id, HOME_AREA_ID);
    assert!(engine.check(&Action::Move { to_area }).unwrap().valid);
    assert_graph_shape(&engine.world);
}

#[test]
fn nothing_left_to_discover_is_rejected() {
    let mut engine = explorer("done");
    let ids: Vec<_> = engine.world.exploration.connections.keys().cloned().collect();
    for id in ids {
        engine.world.exploration.known_connections.insert(id);
    }
    let survey = engine.execute(Action::Survey).unwrap();
    assert_eq!(survey.failure_kind, Some(FailureKind::NothingToDiscover));
    assert_eq!(survey.time_consumed, 0);
    let explore = engine.execute(Action::Explore).unwrap();
    assert_eq!(explore.failure_kind, Some(FailureKind::NothingToDiscover));
    assert_eq!(engine.world.clock.current_tick, 0);
}

#[test]
fn explore_in_a_fresh_area_reveals_something_there() {
    let mut engine = explorer("explore");
    // Skilled gatherers see nodes at the higher threshold.
    for skill in [Skill::Mining, Skill::Woodcutting, Skill::Fishing] {
        engine.world.player.skills.insert(skill, SkillState::enrolled());
    }
    reveal_from_home(&mut engine, "d1-2");
    let moved = engine.execute(Action::Move { to_area: "d1-2".into() }).unwrap();
    assert!(moved.success);

    let area = &engine.world.exploration.areas["d1-2"];
    assert!(area.generated);
    assert!(!area.locations.is_empty(), "every area rolls at least one node");
    let unknown_before: Vec<_> = area
        .locations
        .iter()
        .filter(|l| !engine.world.exploration.known_locations.contains(*l))
        .cloned()
        .collect();
    assert_eq!(unknown_before.len(), area.locations.len());

    let result = engine.execute(Action::Explore).unwrap();
    assert!(result.success, "explore failed: {:?}", result.failure_kind);
    let detail = result.discovery().expect("discovery detail");
    assert_eq!(detail.method, DiscoveryMethod::Explore);
    match detail.found.as_ref().expect("a find") {
        Discovery::Location { location_id, .. } => {
            assert!(unknown_before.contains(location_id));
            assert!(engine.world.exploration.known_locations.contains(location_id));
        }
        Discovery::Connection { connection_id, to_area, .. } => {
            let ex = &engine.world.exploration;
            assert!(ex.known_connections.contains(connection_id));
            assert!(ex.areas[to_area].generated);
        }
    }
    assert!(result.rng_roll_audit.iter().any(|r| r.label == "explore.roll"));
    assert_graph_shape(&engine.world);
}

#[test]
fn generated_areas_connect_only_to_neighbouring_bands() {
    let mut engine = explorer("graph");
    for i in 0..3 {
        let id = format!("d1-{i}");
        reveal_from_home(&mut engine, &id);
        engine.execute(Action::FarTravel { to_area: id }).unwrap();
    }
    let generated = engine
        .world
        .exploration
        .areas
        .values()
        .filter(|a| a.generated && a.distance == 1)
        .count();
    assert_eq!(generated, 3);
    assert_graph_shape(&engine.world);

    // Placeholders exist for every area an edge names, within the id space.
    let cfg = &engine.config.discovery;
    for area in engine.world.exploration.areas.values() {
        if area.area_id == HOME_AREA_ID {
            continue;
        }
        let index: u64 = area.area_id.rsplit('-').next().unwrap().parse().unwrap();
        assert!(index < area_count_at_distance(area.distance, cfg));
    }
}

#[test]
fn fallback_namer_gives_distance_label() {
    let mut engine = SimEngine::with_namer("names", SimConfig::default_test(), Box::new(FallbackNamer));
    reveal_from_home(&mut engine, "d1-4");
    engine.execute(Action::Move { to_area: "d1-4".into() }).unwrap();
    let area = &engine.world.exploration.areas["d1-4"];
    assert!(area.name.is_none());
    assert_eq!(area.display_name(), "Distance-1 Wilds");
}

#[test]
fn naming_does_not_consume_world_draws() {
    let mut named = SimEngine::new("same", SimConfig::default_test());
    let mut plain = SimEngine::with_namer("same", SimConfig::default_test(), Box::new(FallbackNamer));
    reveal_from_home(&mut named, "d1-1");
    reveal_from_home(&mut plain, "d1-1");
    named.execute(Action::Move { to_area: "d1-1".into() }).unwrap();
    plain.execute(Action::Move { to_area: "d1-1".into() }).unwrap();

    assert_eq!(named.world.rng, plain.world.rng);
    assert_eq!(named.world.content, plain.world.content);
    assert_eq!(named.world.exploration.connections, plain.world.exploration.connections);
}
