//! Movement between areas and between locations inside one.

use expedition_core::{
    action::Action,
    config::SimConfig,
    engine::SimEngine,
    outcome::{ActionDetail, FailureKind, ProgressNote, StepOutcome},
    types::HOME_AREA_ID,
    world::{connection_id, warehouse_location_id, Connection, Position},
};

fn build_engine(seed: &str) -> SimEngine {
    SimEngine::new(seed, SimConfig::default_test())
}

/// Known chain home -> d1-0 -> d2-0, the second edge at 1.5x.
fn known_chain(engine: &mut SimEngine) {
    let ex = &mut engine.world.exploration;
    ex.known_connections.insert(connection_id(HOME_AREA_ID, "d1-0"));
    ex.known_areas.insert("d1-0".into());
    ex.ensure_placeholder("d2-0", 2);
    let edge = Connection::new("d1-0", "d2-0", 1.5);
    ex.known_connections.insert(edge.connection_id.clone());
    ex.connections.insert(edge.connection_id.clone(), edge);
    ex.known_areas.insert("d2-0".into());
}

#[test]
fn move_needs_a_known_area_and_a_known_edge() {
    let mut engine = build_engine("travel");
    let r = engine.execute(Action::Move { to_area: "d1-0".into() }).unwrap();
    assert_eq!(r.failure_kind, Some(FailureKind::UnknownArea));
    assert_eq!(r.time_consumed, 0);

    // Known area, but no known edge from here.
    engine.world.exploration.ensure_placeholder("d2-0", 2);
    engine.world.exploration.known_areas.insert("d2-0".into());
    let r = engine.execute(Action::Move { to_area: "d2-0".into() }).unwrap();
    assert_eq!(r.failure_kind, Some(FailureKind::NoPathToDestination));
    let r = engine.execute(Action::FarTravel { to_area: "d2-0".into() }).unwrap();
    assert_eq!(r.failure_kind, Some(FailureKind::NoPathToDestination));

    let r = engine.execute(Action::Move { to_area: HOME_AREA_ID.into() }).unwrap();
    assert_eq!(r.failure_kind, Some(FailureKind::AlreadyThere));
    assert_eq!(engine.world.clock.current_tick, 0);
}

#[test]
fn move_costs_base_ticks_times_multiplier() {
    let mut engine = build_engine("travel");
    known_chain(&mut engine);
    let check = engine.check(&Action::Move { to_area: "d1-0".into() }).unwrap();
    assert!(check.valid);
    assert_eq!(check.time_cost, engine.config.session.base_travel_ticks);

    let r = engine.execute(Action::Move { to_area: "d1-0".into() }).unwrap();
    assert!(r.success);
    assert_eq!(r.time_consumed, 10);
    assert_eq!(r.state_delta.position, Some(Position::hub("d1-0")));
    assert_eq!(engine.world.player.position, Position::hub("d1-0"));
    assert!(engine.world.exploration.areas["d1-0"].generated);

    // Move is one hop only.
    let far = engine.check(&Action::Move { to_area: HOME_AREA_ID.into() }).unwrap();
    assert!(far.valid);
}

#[test]
fn far_travel_walks_the_route_hop_by_hop() {
    let mut engine = build_engine("far");
    known_chain(&mut engine);

    let mut run = engine.begin(Action::FarTravel { to_area: "d2-0".into() }).unwrap();
    assert_eq!(run.planned_ticks(), Some(25));

    let mut hops = Vec::new();
    let result = loop {
        match engine.step(&mut run).unwrap() {
            StepOutcome::Progress(event) => {
                if let ProgressNote::HopCompleted { area_id } = event.note {
                    hops.push((event.elapsed, area_id.clone()));
                    assert_eq!(engine.world.player.position, Position::hub(area_id));
                }
            }
            StepOutcome::Done(result) => break result,
        }
    };

    assert_eq!(hops, vec![(10, "d1-0".to_string())]);
    assert!(result.success);
    assert_eq!(result.time_consumed, 25);
    assert_eq!(
        result.detail,
        Some(ActionDetail::Travel { path: vec!["d1-0".into(), "d2-0".into()] })
    );
    assert_eq!(engine.world.player.position, Position::hub("d2-0"));
    assert!(engine.world.exploration.areas["d1-0"].generated);
    assert!(engine.world.exploration.areas["d2-0"].generated);
}

#[test]
fn stopping_mid_route_leaves_the_player_at_the_last_hop() {
    let mut engine = build_engine("cancel");
    known_chain(&mut engine);

    let mut run = engine.begin(Action::FarTravel { to_area: "d2-0".into() }).unwrap();
    for _ in 0..12 {
        match engine.step(&mut run).unwrap() {
            StepOutcome::Progress(_) => {}
            StepOutcome::Done(r) => panic!("finished early: {r:?}"),
        }
    }
    drop(run);

    assert_eq!(engine.world.clock.current_tick, 12);
    assert_eq!(engine.world.player.position, Position::hub("d1-0"));
}

#[test]
fn locations_inside_an_area() {
    let mut engine = build_engine("walk");
    let warehouse = warehouse_location_id();

    let r = engine.execute(Action::Leave).unwrap();
    assert_eq!(r.failure_kind, Some(FailureKind::AlreadyThere));

    let r = engine.execute(Action::TravelToLocation { location_id: warehouse.clone() }).unwrap();
    assert!(r.success);
    assert_eq!(r.time_consumed, engine.config.session.location_travel_ticks);
    assert_eq!(engine.world.player.position.location_id.as_deref(), Some(warehouse.as_str()));

    let r = engine.execute(Action::TravelToLocation { location_id: warehouse.clone() }).unwrap();
    assert_eq!(r.failure_kind, Some(FailureKind::AlreadyThere));

    let r = engine.execute(Action::TravelToLocation { location_id: "d1-0/node-0".into() }).unwrap();
    assert_eq!(r.failure_kind, Some(FailureKind::UnknownLocation));

    let r = engine.execute(Action::Leave).unwrap();
    assert!(r.success);
    assert_eq!(engine.world.player.position, Position::hub(HOME_AREA_ID));
}

#[test]
fn moving_between_areas_leaves_any_location() {
    let mut engine = build_engine("walk");
    known_chain(&mut engine);
    engine
        .execute(Action::TravelToLocation { location_id: warehouse_location_id() })
        .unwrap();
    let r = engine.execute(Action::Move { to_area: "d1-0".into() }).unwrap();
    assert!(r.success);
    assert_eq!(engine.world.player.position.location_id, None);
}
