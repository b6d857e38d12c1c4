//! Precondition checking.
//!
//! RULE: Checking never mutates the world and never draws from the RNG.
//! It can be called any number of times (previews, policies, tests)
//! without changing what happens next.
//!
//! Each variant is a conjunction of independent checks; the first one
//! that fails decides the failure kind. Time cost and success
//! probability are pure functions of state.

use crate::{
    action::{Action, GatherMode},
    activities::{weapon_bonus, win_probability},
    config::SimConfig,
    discovery::{chance_inputs, discovery_chance, explore_candidates, roll_interval, survey_has_unknown},
    error::{SimError, SimResult},
    extraction::{careful_eligible, mode_ticks, mode_unlocked},
    inventory::ItemStack,
    outcome::FailureKind,
    pathing::{find_route, hop_ticks},
    skills::Skill,
    types::Tick,
    world::{LocationKind, WorldState},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub valid:               bool,
    pub failure_kind:        Option<FailureKind>,
    /// Ticks the action needs to start; one attempt for discovery.
    pub time_cost:           Tick,
    pub success_probability: f64,
}

impl CheckResult {
    fn pass(time_cost: Tick, success_probability: f64) -> Self {
        Self { valid: true, failure_kind: None, time_cost, success_probability }
    }

    fn fail(kind: FailureKind) -> Self {
        Self { valid: false, failure_kind: Some(kind), time_cost: 0, success_probability: 0.0 }
    }
}

enum Reject {
    Fail(FailureKind),
    Fault(SimError),
}

impl From<FailureKind> for Reject {
    fn from(kind: FailureKind) -> Self {
        Reject::Fail(kind)
    }
}

impl From<SimError> for Reject {
    fn from(err: SimError) -> Self {
        Reject::Fault(err)
    }
}

type Verdict = Result<(Tick, f64), Reject>;

fn require(cond: bool, kind: FailureKind) -> Result<(), Reject> {
    if cond {
        Ok(())
    } else {
        Err(Reject::Fail(kind))
    }
}

/// Validate `action` against `world`. `Err` only for broken invariants.
pub fn check_action(world: &WorldState, config: &SimConfig, action: &Action) -> SimResult<CheckResult> {
    if world.clock.is_exhausted() {
        return Ok(CheckResult::fail(FailureKind::SessionEnded));
    }
    let verdict = match action {
        Action::Move { to_area } => check_move(world, config, to_area),
        Action::FarTravel { to_area } => check_far_travel(world, config, to_area),
        Action::TravelToLocation { location_id } => check_travel_to_location(world, config, location_id),
        Action::Leave => check_leave(world, config),
        Action::Gather { node_id, mode, focus_material } => {
            check_gather(world, config, node_id, *mode, focus_material.as_deref())
        }
        Action::Fight => check_fight(world, config),
        Action::Craft { recipe_id } => check_craft(world, recipe_id),
        Action::Store { item_id, quantity } => check_store(world, config, item_id, *quantity),
        Action::Drop { item_id, quantity } => check_drop(world, config, item_id, *quantity),
        Action::Enrol { skill } => check_enrol(world, config, *skill),
        Action::AcceptContract { contract_id } => check_accept_contract(world, config, contract_id),
        Action::Survey => check_survey(world, config),
        Action::Explore => check_explore(world, config),
    };
    match verdict {
        Ok((cost, p)) if world.clock.can_afford(cost) => Ok(CheckResult::pass(cost, p)),
        Ok(_) => Ok(CheckResult::fail(FailureKind::SessionEnded)),
        Err(Reject::Fail(kind)) => Ok(CheckResult::fail(kind)),
        Err(Reject::Fault(err)) => Err(err),
    }
}

// ── Travel ─────────────────────────────────────────────────

fn check_move(world: &WorldState, config: &SimConfig, to_area: &str) -> Verdict {
    let ex = &world.exploration;
    let here = &world.player.position.area_id;
    require(ex.known_areas.contains(to_area), FailureKind::UnknownArea)?;
    require(here != to_area, FailureKind::AlreadyThere)?;
    let conn = ex
        .known_connection_between(here, to_area)
        .ok_or(FailureKind::NoPathToDestination)?;
    Ok((hop_ticks(config.session.base_travel_ticks, conn.travel_time_multiplier), 1.0))
}

fn check_far_travel(world: &WorldState, config: &SimConfig, to_area: &str) -> Verdict {
    let ex = &world.exploration;
    let here = &world.player.position.area_id;
    require(ex.known_areas.contains(to_area), FailureKind::UnknownArea)?;
    require(here != to_area, FailureKind::AlreadyThere)?;
    let route = find_route(ex, here, to_area, config.session.base_travel_ticks)
        .ok_or(FailureKind::NoPathToDestination)?;
    Ok((route.total_ticks, 1.0))
}

fn check_travel_to_location(world: &WorldState, config: &SimConfig, location_id: &str) -> Verdict {
    let location = world
        .content
        .locations
        .get(location_id)
        .ok_or(FailureKind::UnknownLocation)?;
    require(location.area_id == world.player.position.area_id, FailureKind::UnknownLocation)?;
    require(
        world.exploration.known_locations.contains(location_id),
        FailureKind::UnknownLocation,
    )?;
    require(
        world.player.position.location_id.as_deref() != Some(location_id),
        FailureKind::AlreadyThere,
    )?;
    Ok((config.session.location_travel_ticks, 1.0))
}

fn check_leave(world: &WorldState, config: &SimConfig) -> Verdict {
    require(world.player.position.location_id.is_some(), FailureKind::AlreadyThere)?;
    Ok((config.session.leave_ticks, 1.0))
}

// ── Gathering ──────────────────────────────────────────────

fn check_gather(
    world: &WorldState,
    config: &SimConfig,
    node_id: &str,
    mode: GatherMode,
    focus_material: Option<&str>,
) -> Verdict {
    let g = &config.gather;
    let node = world.content.nodes.get(node_id).ok_or(FailureKind::NodeNotFound)?;
    let location = world.node_location(node_id).ok_or_else(|| {
        SimError::InvariantViolation(format!("node {node_id} has no location"))
    })?;
    require(
        world.exploration.known_locations.contains(&location.location_id),
        FailureKind::NodeNotFound,
    )?;
    require(
        world.player.position.location_id.as_deref() == Some(location.location_id.as_str()),
        FailureKind::WrongLocation,
    )?;
    require(!node.depleted, FailureKind::NodeDepleted)?;

    let level = world.player.level(node.node_type.skill());
    let distance = world.exploration.area(&node.area_id)?.distance;
    require(
        level > 0 && level >= g.required_level_for_distance(distance),
        FailureKind::InsufficientSkill,
    )?;
    require(mode_unlocked(mode, level, g), FailureKind::ModeNotUnlocked)?;

    let inventory = &world.player.inventory;
    let capacity = world.player.capacity;
    match mode {
        GatherMode::Appraise => {}
        GatherMode::Focus => {
            let material_id = focus_material.ok_or(FailureKind::MissingFocusMaterial)?;
            let material = node
                .material(material_id)
                .filter(|m| m.remaining_units > 0)
                .ok_or(FailureKind::InvalidFocusMaterial)?;
            require(material.required_skill_level <= level, FailureKind::InsufficientSkill)?;
            require(
                inventory.fits_after(&[], &[ItemStack::new(material_id, 1)], capacity),
                FailureKind::InventoryFull,
            )?;
        }
        GatherMode::CarefulAll => {
            let eligible = careful_eligible(node, level);
            require(!eligible.is_empty(), FailureKind::InsufficientSkill)?;
            let additions: Vec<ItemStack> = eligible
                .iter()
                .map(|m| ItemStack::new(m.material_id.clone(), 1))
                .collect();
            require(inventory.fits_after(&[], &additions, capacity), FailureKind::InventoryFull)?;
        }
    }
    Ok((mode_ticks(mode, g), 1.0))
}

// ── Combat, crafting, items ────────────────────────────────

fn check_fight(world: &WorldState, config: &SimConfig) -> Verdict {
    let enemy_id = match world.current_location().map(|l| &l.kind) {
        Some(LocationKind::MobCamp { enemy_id }) => enemy_id,
        _ => return Err(FailureKind::WrongLocation.into()),
    };
    let enemy = world.content.enemies.get(enemy_id).ok_or(FailureKind::UnknownEnemy)?;
    let level = world.player.level(Skill::Combat);
    require(level > 0, FailureKind::InsufficientSkill)?;
    require(
        world.player.inventory.fits_after(&[], &enemy.loot, world.player.capacity),
        FailureKind::InventoryFull,
    )?;
    let bonus = weapon_bonus(world.player.equipped_weapon.as_deref(), &config.content);
    Ok((enemy.fight_ticks, win_probability(level, enemy.level, bonus, &config.combat)))
}

fn check_craft(world: &WorldState, recipe_id: &str) -> Verdict {
    let recipe = world.content.recipes.get(recipe_id).ok_or(FailureKind::UnknownRecipe)?;
    let at_workshop = matches!(
        world.current_location().map(|l| &l.kind),
        Some(LocationKind::Workshop { skill }) if *skill == recipe.skill
    );
    require(at_workshop, FailureKind::WrongLocation)?;
    let level = world.player.level(recipe.skill);
    require(level > 0 && level >= recipe.required_level, FailureKind::InsufficientSkill)?;
    let inventory = &world.player.inventory;
    require(inventory.contains_all(&recipe.inputs), FailureKind::MissingItems)?;
    require(
        inventory.fits_after(&recipe.inputs, std::slice::from_ref(&recipe.output), world.player.capacity),
        FailureKind::InventoryFull,
    )?;
    Ok((recipe.ticks, 1.0))
}

fn check_store(world: &WorldState, config: &SimConfig, item_id: &str, quantity: u64) -> Verdict {
    require(quantity > 0, FailureKind::InvalidQuantity)?;
    require(
        matches!(world.current_location().map(|l| &l.kind), Some(LocationKind::Warehouse)),
        FailureKind::WrongLocation,
    )?;
    require(world.player.inventory.quantity_of(item_id) >= quantity, FailureKind::MissingItems)?;
    Ok((config.session.store_ticks, 1.0))
}

fn check_drop(world: &WorldState, config: &SimConfig, item_id: &str, quantity: u64) -> Verdict {
    require(quantity > 0, FailureKind::InvalidQuantity)?;
    require(world.player.inventory.quantity_of(item_id) >= quantity, FailureKind::MissingItems)?;
    Ok((config.session.drop_ticks, 1.0))
}

// ── Guilds ─────────────────────────────────────────────────

fn at_guild_of(world: &WorldState, skill: Skill) -> bool {
    matches!(
        world.current_location().map(|l| &l.kind),
        Some(LocationKind::Guild { skill: s }) if *s == skill
    )
}

fn check_enrol(world: &WorldState, config: &SimConfig, skill: Skill) -> Verdict {
    require(at_guild_of(world, skill), FailureKind::WrongLocation)?;
    require(world.player.level(skill) == 0, FailureKind::AlreadyEnrolled)?;
    Ok((config.session.enrol_ticks, 1.0))
}

fn check_accept_contract(world: &WorldState, config: &SimConfig, contract_id: &str) -> Verdict {
    let contract = world.content.contracts.get(contract_id).ok_or(FailureKind::UnknownContract)?;
    require(at_guild_of(world, contract.skill), FailureKind::WrongLocation)?;
    let level = world.player.level(contract.skill);
    require(level > 0 && level >= contract.required_level, FailureKind::InsufficientSkill)?;
    let player = &world.player;
    require(
        !player.active_contracts.contains(contract_id) && !player.completed_contracts.contains(contract_id),
        FailureKind::ContractUnavailable,
    )?;
    require(
        player.active_contracts.len() < config.session.max_active_contracts,
        FailureKind::TooManyContracts,
    )?;
    Ok((config.session.accept_contract_ticks, 1.0))
}

// ── Discovery ──────────────────────────────────────────────

fn check_survey(world: &WorldState, config: &SimConfig) -> Verdict {
    require(survey_has_unknown(world), FailureKind::NothingToDiscover)?;
    let d = &config.discovery;
    let chance = discovery_chance(&chance_inputs(world, d)?, d);
    Ok((roll_interval(world.player.level(Skill::Exploration), d), chance))
}

fn check_explore(world: &WorldState, config: &SimConfig) -> Verdict {
    let d = &config.discovery;
    let chance = discovery_chance(&chance_inputs(world, d)?, d);
    require(!explore_candidates(world, chance, d)?.is_empty(), FailureKind::NothingToDiscover)?;
    Ok((roll_interval(world.player.level(Skill::Exploration), d), chance))
}
