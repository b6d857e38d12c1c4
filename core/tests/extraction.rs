//! Gathering through the engine: the three modes on hand-built nodes.

use expedition_core::{
    action::{Action, GatherMode},
    config::SimConfig,
    engine::SimEngine,
    outcome::{AppraisedQuantity, ExtractionDetail, FailureKind},
    skills::{Skill, SkillState},
    types::HOME_AREA_ID,
    world::{LocationKind, Location, MaterialReserve, Node, NodeType, Position},
};

fn reserve(material_id: &str, units: u64, required: u32, tier: u32) -> MaterialReserve {
    MaterialReserve {
        material_id:          material_id.into(),
        remaining_units:      units,
        max_units_initial:    units,
        required_skill_level: required,
        tier,
    }
}

/// Put a node into home base, make it known and stand on it.
fn place_node(engine: &mut SimEngine, node_id: &str, materials: Vec<MaterialReserve>) {
    let world = &mut engine.world;
    world.content.nodes.insert(
        node_id.into(),
        Node {
            node_id:   node_id.into(),
            node_type: NodeType::OreVein,
            area_id:   HOME_AREA_ID.into(),
            materials,
            depleted:  false,
            appraised: false,
        },
    );
    world.content.locations.insert(
        node_id.into(),
        Location {
            location_id: node_id.into(),
            area_id:     HOME_AREA_ID.into(),
            kind:        LocationKind::GatheringNode { node_id: node_id.into() },
        },
    );
    world.exploration.known_locations.insert(node_id.into());
    if let Some(home) = world.exploration.areas.get_mut(HOME_AREA_ID) {
        home.locations.push(node_id.into());
    }
    world.player.position = Position {
        area_id:     HOME_AREA_ID.into(),
        location_id: Some(node_id.into()),
    };
}

fn miner(seed: &str, level: u32) -> SimEngine {
    let mut engine = SimEngine::new(seed, SimConfig::default_test());
    engine.world.player.skills.insert(Skill::Mining, SkillState { level, xp: 0 });
    engine
}

#[test]
fn focus_on_single_material_stone() {
    let mut engine = miner("s1", 5);
    place_node(&mut engine, "quarry", vec![reserve("STONE", 50, 1, 1)]);

    let result = engine.execute(Action::focus("quarry", "STONE")).unwrap();

    assert!(result.success, "focus failed: {:?}", result.failure_kind);
    let node = &engine.world.content.nodes["quarry"];
    assert!(node.materials[0].remaining_units < 50);
    let stone_tier = 1;
    let gained = result.skill_gained.expect("mining xp");
    assert_eq!(gained.skill, Skill::Mining);
    assert_eq!(gained.amount, result.time_consumed * stone_tier);

    match result.extraction() {
        Some(ExtractionDetail::Focus { extracted, collateral, .. }) => {
            assert!(collateral.is_empty());
            assert_eq!(*extracted, 50 - node.materials[0].remaining_units);
            assert_eq!(engine.world.player.inventory.quantity_of("STONE"), *extracted);
        }
        other => panic!("expected focus detail, got {other:?}"),
    }
    // Exactly one variance draw.
    assert_eq!(result.rng_roll_audit.len(), 1);
    assert_eq!(result.rng_roll_audit[0].label, "gather.focus.variance");
}

#[test]
fn focus_damages_every_other_material() {
    let mut engine = miner("collateral", 10);
    place_node(
        &mut engine,
        "vein",
        vec![
            reserve("COPPER_ORE", 40, 1, 1),
            reserve("TIN_ORE", 30, 4, 2),
            reserve("STONE", 0, 1, 1),
        ],
    );

    let result = engine.execute(Action::focus("vein", "COPPER_ORE")).unwrap();
    assert!(result.success);

    let node = &engine.world.content.nodes["vein"];
    match result.extraction() {
        Some(ExtractionDetail::Focus { collateral, extracted, .. }) => {
            // The empty STONE reserve takes no damage.
            assert_eq!(collateral.len(), 1);
            assert_eq!(collateral[0].material_id, "TIN_ORE");
            assert!(collateral[0].units >= 1);
            assert_eq!(node.material("TIN_ORE").unwrap().remaining_units, 30 - collateral[0].units);
            assert_eq!(node.material("COPPER_ORE").unwrap().remaining_units, 40 - extracted);
        }
        other => panic!("expected focus detail, got {other:?}"),
    }
    assert_eq!(node.material("STONE").unwrap().remaining_units, 0);
}

#[test]
fn collateral_floor_holds_at_very_high_level() {
    let mut engine = miner("floor", 99);
    place_node(
        &mut engine,
        "vein",
        vec![reserve("COPPER_ORE", 40, 1, 1), reserve("STONE", 40, 1, 1)],
    );
    let result = engine.execute(Action::focus("vein", "COPPER_ORE")).unwrap();
    match result.extraction() {
        Some(ExtractionDetail::Focus { collateral, .. }) => {
            assert_eq!(collateral.len(), 1);
            assert!(collateral[0].units >= 1, "floor must still cost something");
        }
        other => panic!("expected focus detail, got {other:?}"),
    }
}

#[test]
fn careful_all_before_unlock_is_rejected() {
    let mut engine = miner("s1", 1);
    place_node(&mut engine, "quarry", vec![reserve("STONE", 50, 1, 1)]);
    let before = engine.world.clone();

    let result = engine.execute(Action::gather("quarry", GatherMode::CarefulAll)).unwrap();

    assert!(!result.success);
    assert_eq!(result.failure_kind, Some(FailureKind::ModeNotUnlocked));
    assert_eq!(result.time_consumed, 0);
    assert!(result.rng_roll_audit.is_empty());
    assert_eq!(engine.world, before);
}

#[test]
fn careful_all_takes_only_workable_materials_without_draws() {
    let mut engine = miner("careful", 6);
    place_node(
        &mut engine,
        "vein",
        vec![
            reserve("COPPER_ORE", 40, 1, 1),
            reserve("TIN_ORE", 1, 4, 2),
            reserve("IRON_ORE", 20, 7, 3),
        ],
    );

    let result = engine.execute(Action::gather("vein", GatherMode::CarefulAll)).unwrap();
    assert!(result.success);
    assert!(result.rng_roll_audit.is_empty());

    let node = &engine.world.content.nodes["vein"];
    assert_eq!(node.material("COPPER_ORE").unwrap().remaining_units, 38);
    assert_eq!(node.material("TIN_ORE").unwrap().remaining_units, 0);
    // Above the actor's level: untouched.
    assert_eq!(node.material("IRON_ORE").unwrap().remaining_units, 20);
    assert_eq!(engine.world.player.inventory.quantity_of("TIN_ORE"), 1);
    assert_eq!(engine.world.player.inventory.quantity_of("IRON_ORE"), 0);

    // Average tier of (1, 2) over 12 ticks.
    let gained = result.skill_gained.expect("xp");
    assert_eq!(gained.amount, 18);
}

#[test]
fn appraise_estimates_first_then_shows_exact() {
    let mut engine = miner("appraise", 3);
    place_node(
        &mut engine,
        "vein",
        vec![reserve("COPPER_ORE", 40, 1, 1), reserve("GOLD_ORE", 10, 13, 5)],
    );

    let first = engine.execute(Action::gather("vein", GatherMode::Appraise)).unwrap();
    assert!(first.success);
    assert!(first.skill_gained.is_none());
    match first.extraction() {
        Some(ExtractionDetail::Appraise { materials, hidden, .. }) => {
            assert_eq!(*hidden, 1);
            assert_eq!(materials.len(), 1);
            assert_eq!(
                materials[0].quantity,
                AppraisedQuantity::Estimate { bucket: "plentiful".into() }
            );
        }
        other => panic!("expected appraise detail, got {other:?}"),
    }

    let second = engine.execute(Action::gather("vein", GatherMode::Appraise)).unwrap();
    match second.extraction() {
        Some(ExtractionDetail::Appraise { materials, .. }) => {
            assert_eq!(materials[0].quantity, AppraisedQuantity::Exact { remaining: 40, max: 40 });
        }
        other => panic!("expected appraise detail, got {other:?}"),
    }
    // Appraising never changes quantities.
    assert_eq!(engine.world.content.nodes["vein"].material("COPPER_ORE").unwrap().remaining_units, 40);
}

#[test]
fn draining_the_last_units_depletes_the_node() {
    let mut engine = miner("drain", 5);
    place_node(&mut engine, "pebbles", vec![reserve("STONE", 2, 1, 1)]);

    let result = engine.execute(Action::focus("pebbles", "STONE")).unwrap();
    assert!(result.success);
    assert_eq!(engine.world.player.inventory.quantity_of("STONE"), 2);
    assert!(engine.world.content.nodes["pebbles"].depleted);

    let again = engine.execute(Action::focus("pebbles", "STONE")).unwrap();
    assert_eq!(again.failure_kind, Some(FailureKind::NodeDepleted));
    assert_eq!(again.time_consumed, 0);
}

#[test]
fn focus_precondition_order() {
    let mut engine = miner("order", 1);
    place_node(
        &mut engine,
        "vein",
        vec![reserve("COPPER_ORE", 40, 1, 1), reserve("TIN_ORE", 30, 4, 2)],
    );

    let missing = Action::Gather { node_id: "vein".into(), mode: GatherMode::Focus, focus_material: None };
    assert_eq!(engine.check(&missing).unwrap().failure_kind, Some(FailureKind::MissingFocusMaterial));

    let absent = Action::focus("vein", "GOLD_ORE");
    assert_eq!(engine.check(&absent).unwrap().failure_kind, Some(FailureKind::InvalidFocusMaterial));

    let too_hard = Action::focus("vein", "TIN_ORE");
    assert_eq!(engine.check(&too_hard).unwrap().failure_kind, Some(FailureKind::InsufficientSkill));

    let unknown = Action::focus("nowhere", "COPPER_ORE");
    assert_eq!(engine.check(&unknown).unwrap().failure_kind, Some(FailureKind::NodeNotFound));

    engine.world.player.position.location_id = None;
    let away = Action::focus("vein", "COPPER_ORE");
    assert_eq!(engine.check(&away).unwrap().failure_kind, Some(FailureKind::WrongLocation));
}

#[test]
fn full_inventory_blocks_new_material() {
    let mut engine = miner("full", 5);
    place_node(&mut engine, "quarry", vec![reserve("STONE", 50, 1, 1)]);
    let capacity = engine.world.player.capacity;
    for i in 0..capacity {
        engine.world.player.inventory.add(&format!("JUNK_{i}"), 1, capacity).unwrap();
    }
    let result = engine.execute(Action::focus("quarry", "STONE")).unwrap();
    assert_eq!(result.failure_kind, Some(FailureKind::InventoryFull));

    // A stack that already exists needs no new slot.
    engine.world.player.inventory.remove("JUNK_0", 1).unwrap();
    engine.world.player.inventory.add("STONE", 1, capacity).unwrap();
    let result = engine.execute(Action::focus("quarry", "STONE")).unwrap();
    assert!(result.success);
}
