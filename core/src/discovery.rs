//! World discovery: area-graph generation and the survey/explore rolls.
//!
//! Area counts per distance follow a fixed growth sequence and involve no
//! randomness. Everything else (connection topology, an area's locations,
//! whether an attempt finds something) is drawn from the world's cursor
//! through an `ActionRng`, so it lands in the owning action's audit.
//!
//! EXPLORE uses overlaid thresholds: one uniform draw per attempt, every
//! candidate whose threshold is >= the draw is a hit, then one hit is
//! picked uniformly. The draw must come before the filter.

use crate::{
    config::{DiscoveryConfig, SimConfig},
    error::{SimError, SimResult},
    naming::{AreaNamer, AreaNamingContext},
    outcome::Discovery,
    rng::ActionRng,
    skills::Skill,
    types::{AreaId, ConnectionId, LocationId, Tick, HOME_AREA_ID},
    world::{connection_id, Connection, Location, LocationKind, MaterialReserve, Node, NodeType, WorldState},
};

/// Number of areas at `distance`. Home is the only distance-0 area.
pub fn area_count_at_distance(distance: u32, cfg: &DiscoveryConfig) -> u64 {
    let [first, second] = cfg.area_growth_seed;
    match distance {
        0 => 1,
        1 => first,
        2 => second,
        _ => {
            let (mut prev, mut cur) = (first, second);
            for _ in 3..=distance {
                let next = prev.saturating_add(cur);
                prev = cur;
                cur = next;
            }
            cur
        }
    }
}

/// Stable id of the `index`-th area at `distance`.
pub fn area_id_at(distance: u32, index: u64) -> AreaId {
    if distance == 0 {
        return HOME_AREA_ID.to_string();
    }
    format!("d{distance}-{index}")
}

fn area_index(area_id: &str, distance: u32) -> Option<u64> {
    area_id.strip_prefix(&format!("d{distance}-"))?.parse().ok()
}

/// Stable ids of every area at `distance`, in index order. Only for
/// bands small enough to list; generation samples indices instead.
pub fn area_ids_at_distance(distance: u32, cfg: &DiscoveryConfig) -> Vec<AreaId> {
    (0..area_count_at_distance(distance, cfg))
        .map(|i| area_id_at(distance, i))
        .collect()
}

// ── Generation ─────────────────────────────────────────────

/// Roll `area_id`'s edges to the bands at distance -1, 0 and +1.
/// Distance 0 is never a band target; home's ring is wired at world
/// creation. An edge that already exists keeps its multiplier.
pub fn generate_connections(
    world: &mut WorldState,
    area_id: &str,
    cfg: &DiscoveryConfig,
    rng: &mut ActionRng,
) -> SimResult<Vec<ConnectionId>> {
    let distance = world.exploration.area(area_id)?.distance;
    let mut created = Vec::new();
    if distance == 0 {
        return Ok(created);
    }

    for band in [-1i64, 0, 1] {
        let target_distance = distance as i64 + band;
        if target_distance <= 0 {
            continue;
        }
        let target_distance = target_distance as u32;
        let count = rng.draw_weighted(&cfg.connection_count_weights, "connection.count");
        // Candidates are the band in index order with this area left out.
        let own = if band == 0 { area_index(area_id, target_distance) } else { None };
        let pool = area_count_at_distance(target_distance, cfg) - u64::from(own.is_some());
        for pick in rng.sample_without_replacement(pool as usize, count, "connection.target") {
            let mut index = pick as u64;
            if own.is_some_and(|o| index >= o) {
                index += 1;
            }
            let target = &area_id_at(target_distance, index);
            let multiplier = rng.draw_range(cfg.multiplier_min, cfg.multiplier_max, "connection.multiplier");
            let id = connection_id(area_id, target);
            if world.exploration.connections.contains_key(&id) {
                continue;
            }
            world.exploration.ensure_placeholder(target, target_distance);
            world
                .exploration
                .connections
                .insert(id.clone(), Connection::new(area_id, target, multiplier));
            created.push(id);
        }
    }
    Ok(created)
}

/// Turn a placeholder into a generated area: roll its gathering nodes and
/// mob camps, then its connections, then ask the namer for a name.
/// Returns false if the area was already generated.
pub fn promote_area(
    world: &mut WorldState,
    area_id: &str,
    config: &SimConfig,
    namer: &dyn AreaNamer,
    rng: &mut ActionRng,
) -> SimResult<bool> {
    let area = world.exploration.area(area_id)?;
    if area.generated {
        return Ok(false);
    }
    let distance = area.distance;
    let tick = world.clock.current_tick;
    let d = &config.discovery;
    let mut locations: Vec<LocationId> = Vec::new();
    let mut features: Vec<String> = Vec::new();

    let node_count = rng.draw_weighted(&d.node_count_weights, "area.node_count");
    for i in 0..node_count {
        let node_type = NodeType::ALL[rng.pick_index(NodeType::ALL.len(), "area.node_type")];
        let eligible: Vec<_> = config
            .content
            .materials
            .iter()
            .filter(|m| m.node_type == node_type && m.tier <= distance + d.max_tier_offset)
            .collect();
        if eligible.is_empty() {
            continue;
        }
        let material_count = rng.draw_weighted(&d.material_count_weights, "area.material_count").max(1);
        let picks = rng.sample_without_replacement(eligible.len(), material_count, "area.material");
        let mut materials = Vec::with_capacity(picks.len());
        for pick in picks {
            let def = eligible[pick];
            let span = (def.max_units - def.min_units + 1) as f64;
            let units = def.min_units + (rng.draw_range(0.0, span, "area.material_units") as u64).min(def.max_units - def.min_units);
            materials.push(MaterialReserve {
                material_id:          def.material_id.clone(),
                remaining_units:      units,
                max_units_initial:    units,
                required_skill_level: def.required_level,
                tier:                 def.tier,
            });
        }
        let node_id = format!("{area_id}/node-{i}");
        world.content.nodes.insert(
            node_id.clone(),
            Node {
                node_id: node_id.clone(),
                node_type,
                area_id: area_id.to_string(),
                materials,
                depleted: false,
                appraised: false,
            },
        );
        world.content.locations.insert(
            node_id.clone(),
            Location {
                location_id: node_id.clone(),
                area_id:     area_id.to_string(),
                kind:        LocationKind::GatheringNode { node_id: node_id.clone() },
            },
        );
        features.push(node_type.label().to_string());
        locations.push(node_id);
    }

    let camp_count = rng.draw_weighted(&d.camp_count_weights, "area.camp_count");
    let enemies: Vec<String> = world
        .content
        .enemies
        .values()
        .filter(|e| e.min_distance <= distance)
        .map(|e| e.enemy_id.clone())
        .collect();
    if !enemies.is_empty() {
        for j in 0..camp_count {
            let enemy_id = enemies[rng.pick_index(enemies.len(), "area.camp_enemy")].clone();
            let location_id = format!("{area_id}/camp-{j}");
            world.content.locations.insert(
                location_id.clone(),
                Location {
                    location_id: location_id.clone(),
                    area_id:     area_id.to_string(),
                    kind:        LocationKind::MobCamp { enemy_id: enemy_id.clone() },
                },
            );
            features.push(format!("{enemy_id} camp"));
            locations.push(location_id);
        }
    }

    if let Some(area) = world.exploration.areas.get_mut(area_id) {
        area.generated = true;
        area.locations = locations;
    }
    generate_connections(world, area_id, d, rng)?;

    let neighbor_names: Vec<String> = world
        .exploration
        .connections_of(area_id)
        .filter_map(|c| c.other_end(area_id))
        .filter_map(|other| world.exploration.areas.get(other))
        .filter_map(|a| a.name.clone())
        .collect();
    let name = namer.name_area(&AreaNamingContext {
        area_id: area_id.to_string(),
        distance,
        features,
        neighbor_names,
    });
    let area = world
        .exploration
        .areas
        .get_mut(area_id)
        .ok_or_else(|| SimError::UnknownArea { area_id: area_id.to_string() })?;
    area.name = name;
    log::info!(
        "tick={tick} discovery: generated {area_id} ({}) at distance {distance} with {} locations",
        area.display_name(),
        area.locations.len()
    );
    Ok(true)
}

// ── Chance model ───────────────────────────────────────────

/// The state-derived inputs to the discovery chance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChanceInputs {
    pub level:                   u32,
    pub distance:                u32,
    /// Known areas joined to the current one by a known edge.
    pub connected_known:         u64,
    /// Known areas at the current distance with no known edge here.
    pub known_unconnected:       u64,
    pub total_at_distance:       u64,
}

pub fn discovery_chance(inputs: &ChanceInputs, cfg: &DiscoveryConfig) -> f64 {
    if inputs.level == 0 {
        return cfg.chance_floor;
    }
    let rate = cfg.per_level_rate;
    let level_bonus = (inputs.level - 1) as f64 * rate;
    let distance_penalty = inputs.distance.saturating_sub(1) as f64 * rate;
    let connected_bonus = inputs.connected_known as f64 * rate;
    let non_connected_bonus = if inputs.total_at_distance == 0 {
        0.0
    } else {
        cfg.knowledge_weight * inputs.known_unconnected as f64 / inputs.total_at_distance as f64
    };
    let raw = cfg.base_chance + level_bonus - distance_penalty + connected_bonus + non_connected_bonus;
    raw.max(cfg.chance_floor).min(1.0)
}

pub fn chance_inputs(world: &WorldState, cfg: &DiscoveryConfig) -> SimResult<ChanceInputs> {
    let here = &world.player.position.area_id;
    let area = world.exploration.area(here)?;
    let ex = &world.exploration;

    let connected_known = ex
        .known_connections_of(here)
        .filter_map(|c| c.other_end(here))
        .filter(|other| ex.known_areas.contains(*other))
        .count() as u64;
    let known_unconnected = ex
        .known_areas
        .iter()
        .filter(|id| *id != here)
        .filter(|id| ex.areas.get(*id).map(|a| a.distance) == Some(area.distance))
        .filter(|id| ex.known_connection_between(here, id).is_none())
        .count() as u64;

    Ok(ChanceInputs {
        level: world.player.level(Skill::Exploration),
        distance: area.distance,
        connected_known,
        known_unconnected,
        total_at_distance: area_count_at_distance(area.distance, cfg),
    })
}

/// Ticks between roll attempts; shrinks with level toward the minimum.
pub fn roll_interval(level: u32, cfg: &DiscoveryConfig) -> Tick {
    let reduction = level.saturating_sub(1) as Tick * cfg.roll_interval_step;
    cfg.base_roll_interval
        .saturating_sub(reduction)
        .max(cfg.min_roll_interval)
}

// ── Survey ─────────────────────────────────────────────────

/// Every edge from the current area, known or not, in id order.
pub fn survey_targets(world: &WorldState) -> Vec<ConnectionId> {
    let here = &world.player.position.area_id;
    world
        .exploration
        .connections_of(here)
        .map(|c| c.connection_id.clone())
        .collect()
}

pub fn survey_has_unknown(world: &WorldState) -> bool {
    survey_targets(world)
        .iter()
        .any(|id| !world.exploration.known_connections.contains(id))
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurveyRoll {
    Miss,
    /// Landed on an edge the player already knew.
    Wasted(ConnectionId),
    Hit(ConnectionId),
}

/// One survey attempt: a single shared chance, then a uniform pick among
/// all of the area's edges.
pub fn roll_survey(world: &WorldState, chance: f64, rng: &mut ActionRng) -> SurveyRoll {
    if !rng.chance(chance, "survey.roll") {
        return SurveyRoll::Miss;
    }
    let targets = survey_targets(world);
    if targets.is_empty() {
        return SurveyRoll::Miss;
    }
    let picked = targets[rng.pick_index(targets.len(), "survey.target")].clone();
    if world.exploration.known_connections.contains(&picked) {
        SurveyRoll::Wasted(picked)
    } else {
        SurveyRoll::Hit(picked)
    }
}

// ── Explore ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExploreTarget {
    Location(LocationId),
    Connection(ConnectionId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExploreCandidate {
    pub target:    ExploreTarget,
    pub threshold: f64,
}

/// Everything still undiscovered in the current area, each with its own
/// threshold: the base chance times its category multiplier.
pub fn explore_candidates(world: &WorldState, chance: f64, cfg: &DiscoveryConfig) -> SimResult<Vec<ExploreCandidate>> {
    let here = &world.player.position.area_id;
    let area = world.exploration.area(here)?;
    let ex = &world.exploration;
    let mut candidates = Vec::new();

    for location_id in &area.locations {
        if ex.known_locations.contains(location_id) {
            continue;
        }
        let Some(location) = world.content.locations.get(location_id) else {
            return Err(SimError::InvariantViolation(format!(
                "area {here} lists missing location {location_id}"
            )));
        };
        let multiplier = match &location.kind {
            LocationKind::MobCamp { .. } => cfg.mob_camp_mult,
            LocationKind::GatheringNode { node_id } => {
                let node = world.content.nodes.get(node_id).ok_or_else(|| {
                    SimError::InvariantViolation(format!("location {location_id} names missing node {node_id}"))
                })?;
                if world.player.level(node.node_type.skill()) > 0 {
                    cfg.node_skilled_mult
                } else {
                    cfg.node_unskilled_mult
                }
            }
            _ => cfg.known_connection_mult,
        };
        candidates.push(ExploreCandidate {
            target:    ExploreTarget::Location(location_id.clone()),
            threshold: chance * multiplier,
        });
    }

    for conn in ex.connections_of(here) {
        if ex.known_connections.contains(&conn.connection_id) {
            continue;
        }
        let far_known = conn
            .other_end(here)
            .map(|other| ex.known_areas.contains(other))
            .unwrap_or(false);
        let multiplier = if far_known { cfg.known_connection_mult } else { cfg.unknown_area_mult };
        candidates.push(ExploreCandidate {
            target:    ExploreTarget::Connection(conn.connection_id.clone()),
            threshold: chance * multiplier,
        });
    }
    Ok(candidates)
}

/// One explore attempt over the overlaid thresholds.
pub fn roll_explore(candidates: &[ExploreCandidate], rng: &mut ActionRng) -> Option<ExploreTarget> {
    if candidates.is_empty() {
        return None;
    }
    let draw = rng.draw("explore.roll");
    let hits: Vec<&ExploreCandidate> = candidates.iter().filter(|c| c.threshold >= draw).collect();
    match hits.len() {
        0 => None,
        1 => Some(hits[0].target.clone()),
        n => Some(hits[rng.pick_index(n, "explore.pick")].target.clone()),
    }
}

/// Record a find in the player's knowledge. A newly reached area is
/// promoted, which draws from `rng`.
pub fn apply_discovery(
    world: &mut WorldState,
    target: &ExploreTarget,
    config: &SimConfig,
    namer: &dyn AreaNamer,
    rng: &mut ActionRng,
) -> SimResult<Discovery> {
    match target {
        ExploreTarget::Location(location_id) => {
            let location = world.content.locations.get(location_id).cloned().ok_or_else(|| {
                SimError::InvariantViolation(format!("discovered missing location {location_id}"))
            })?;
            world.exploration.known_locations.insert(location_id.clone());
            Ok(Discovery::Location { location_id: location_id.clone(), kind: location.kind })
        }
        ExploreTarget::Connection(id) => {
            let here = world.player.position.area_id.clone();
            let conn = world.exploration.connections.get(id).cloned().ok_or_else(|| {
                SimError::InvariantViolation(format!("discovered missing connection {id}"))
            })?;
            let to_area = conn
                .other_end(&here)
                .ok_or_else(|| SimError::InvariantViolation(format!("connection {id} does not touch {here}")))?
                .to_string();
            world.exploration.known_connections.insert(id.clone());
            let new_area = world.exploration.known_areas.insert(to_area.clone());
            promote_area(world, &to_area, config, namer, rng)?;
            Ok(Discovery::Connection { connection_id: id.clone(), to_area, new_area })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> DiscoveryConfig {
        crate::config::SimConfig::default_test().discovery
    }

    #[test]
    fn area_counts_follow_growth_sequence() {
        let cfg = cfg();
        let counts: Vec<u64> = (0..=6).map(|d| area_count_at_distance(d, &cfg)).collect();
        assert_eq!(counts, vec![1, 5, 8, 13, 21, 34, 55]);
    }

    #[test]
    fn area_ids_are_indexed_by_distance() {
        let ids = area_ids_at_distance(2, &cfg());
        assert_eq!(ids.len(), 8);
        assert_eq!(ids[0], "d2-0");
        assert_eq!(ids[7], "d2-7");
        assert_eq!(area_ids_at_distance(0, &cfg()), vec!["home".to_string()]);
        assert_eq!(area_index("d2-7", 2), Some(7));
        assert_eq!(area_index("d2-7", 3), None);
    }

    #[test]
    fn far_bands_are_sampled_without_listing() {
        use crate::rng::RngCursor;
        let config = crate::config::SimConfig::default_test();
        let cfg = &config.discovery;
        let distance = 60;
        assert!(area_count_at_distance(distance, cfg) > 1_000_000_000);

        let mut world = WorldState::new("far-band", &config);
        let area_id = area_id_at(distance, 12);
        world.exploration.ensure_placeholder(&area_id, distance);
        let mut audit = Vec::new();
        let mut rng = ActionRng::new(RngCursor::new("far-band"), &mut audit);
        let created = generate_connections(&mut world, &area_id, cfg, &mut rng).unwrap();

        for id in &created {
            let conn = &world.exploration.connections[id];
            let other = conn.other_end(&area_id).unwrap();
            assert_ne!(other, area_id);
            let far = world.exploration.area(other).unwrap().distance;
            assert!((distance - 1..=distance + 1).contains(&far));
            let index = area_index(other, far).unwrap();
            assert!(index < area_count_at_distance(far, cfg));
        }
    }

    #[test]
    fn unenrolled_chance_is_the_floor() {
        let cfg = cfg();
        for (distance, connected, known) in [(1, 0, 0), (4, 3, 5), (9, 0, 20)] {
            let inputs = ChanceInputs {
                level: 0,
                distance,
                connected_known: connected,
                known_unconnected: known,
                total_at_distance: area_count_at_distance(distance, &cfg),
            };
            assert_eq!(discovery_chance(&inputs, &cfg), cfg.chance_floor);
        }
    }

    #[test]
    fn chance_rises_with_level_and_falls_with_distance() {
        let cfg = cfg();
        let base = ChanceInputs {
            level: 1,
            distance: 1,
            connected_known: 0,
            known_unconnected: 0,
            total_at_distance: 5,
        };
        let at_base = discovery_chance(&base, &cfg);
        assert!((at_base - cfg.base_chance).abs() < 1e-12);
        let levelled = discovery_chance(&ChanceInputs { level: 5, ..base }, &cfg);
        assert!((levelled - (cfg.base_chance + 4.0 * cfg.per_level_rate)).abs() < 1e-12);
        let far = discovery_chance(&ChanceInputs { distance: 30, ..base }, &cfg);
        assert_eq!(far, cfg.chance_floor);
    }

    #[test]
    fn knowledge_adds_both_bonuses() {
        let cfg = cfg();
        let inputs = ChanceInputs {
            level: 1,
            distance: 1,
            connected_known: 2,
            known_unconnected: 1,
            total_at_distance: 5,
        };
        let expected = cfg.base_chance + 2.0 * cfg.per_level_rate + cfg.knowledge_weight * 0.2;
        assert!((discovery_chance(&inputs, &cfg) - expected).abs() < 1e-12);
    }

    #[test]
    fn roll_interval_shrinks_to_minimum() {
        let cfg = cfg();
        assert_eq!(roll_interval(1, &cfg), cfg.base_roll_interval);
        assert!(roll_interval(3, &cfg) < roll_interval(1, &cfg));
        assert_eq!(roll_interval(99, &cfg), cfg.min_roll_interval);
        assert_eq!(roll_interval(0, &cfg), cfg.base_roll_interval);
    }

    #[test]
    fn explore_draw_is_filtered_by_threshold() {
        use crate::rng::{derive_unit, RngCursor};
        // Find a counter whose draw sits between the two thresholds.
        let seed = "explore-filter";
        let counter = (0..10_000)
            .find(|c| {
                let u = derive_unit(seed, *c);
                u > 0.05 && u <= 0.10
            })
            .expect("some draw in (0.05, 0.10]");
        let candidates = vec![
            ExploreCandidate { target: ExploreTarget::Location("rare".into()), threshold: 0.05 },
            ExploreCandidate { target: ExploreTarget::Location("common".into()), threshold: 0.10 },
        ];
        let mut audit = Vec::new();
        let mut rng = ActionRng::new(RngCursor { seed: seed.into(), counter }, &mut audit);
        let hit = roll_explore(&candidates, &mut rng);
        assert_eq!(hit, Some(ExploreTarget::Location("common".into())));
        // A single hit needs no tie-break draw.
        assert_eq!(audit.len(), 1);
    }
}
