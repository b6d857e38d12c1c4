//! The world state: the single mutable aggregate the pipeline advances.
//!
//! RULE: Only the engine mutates a `WorldState`, and only through an
//! action run. Everything else reads it.
//!
//! Areas and connections live in id-keyed arenas; an edge names its two
//! endpoints by id, never by reference. Every collection is ordered so a
//! serialized world is byte-stable.

use crate::{
    clock::SessionClock,
    config::{ContractDef, EnemyDef, RecipeDef, SimConfig},
    discovery::area_ids_at_distance,
    error::{SimError, SimResult},
    inventory::Inventory,
    rng::RngCursor,
    skills::{Skill, SkillState},
    types::{AreaId, ConnectionId, ContractId, ItemId, LocationId, NodeId, HOME_AREA_ID},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    OreVein,
    TreeStand,
    FishingSpot,
}

impl NodeType {
    pub const ALL: [NodeType; 3] = [NodeType::OreVein, NodeType::TreeStand, NodeType::FishingSpot];

    /// The gathering skill that works this node type.
    pub fn skill(&self) -> Skill {
        match self {
            Self::OreVein     => Skill::Mining,
            Self::TreeStand   => Skill::Woodcutting,
            Self::FishingSpot => Skill::Fishing,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::OreVein     => "ore vein",
            Self::TreeStand   => "tree stand",
            Self::FishingSpot => "fishing spot",
        }
    }
}

/// One depletable material inside a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialReserve {
    pub material_id:          ItemId,
    pub remaining_units:      u64,
    pub max_units_initial:    u64,
    pub required_skill_level: u32,
    pub tier:                 u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub node_id:   NodeId,
    pub node_type: NodeType,
    pub area_id:   AreaId,
    pub materials: Vec<MaterialReserve>,
    pub depleted:  bool,
    /// Set by the first APPRAISE; later appraisals show exact quantities.
    pub appraised: bool,
}

impl Node {
    pub fn material(&self, material_id: &str) -> Option<&MaterialReserve> {
        self.materials.iter().find(|m| m.material_id == material_id)
    }

    pub fn material_mut(&mut self, material_id: &str) -> Option<&mut MaterialReserve> {
        self.materials.iter_mut().find(|m| m.material_id == material_id)
    }

    /// Latch `depleted` once every reserve is empty. Returns true only on
    /// the transition.
    pub fn refresh_depleted(&mut self) -> bool {
        if self.depleted {
            return false;
        }
        if self.materials.iter().all(|m| m.remaining_units == 0) {
            self.depleted = true;
            return true;
        }
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationKind {
    GatheringNode { node_id: NodeId },
    MobCamp { enemy_id: String },
    Guild { skill: Skill },
    Warehouse,
    Workshop { skill: Skill },
}

impl LocationKind {
    pub fn label(&self) -> String {
        match self {
            Self::GatheringNode { node_id } => format!("gathering node {node_id}"),
            Self::MobCamp { enemy_id }      => format!("{enemy_id} camp"),
            Self::Guild { skill }           => format!("{} guild", skill.name()),
            Self::Warehouse                 => "warehouse".to_string(),
            Self::Workshop { skill }        => format!("{} workshop", skill.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub location_id: LocationId,
    pub area_id:     AreaId,
    pub kind:        LocationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub area_id:   AreaId,
    pub distance:  u32,
    /// False while the area is only a placeholder named by some edge.
    pub generated: bool,
    pub locations: Vec<LocationId>,
    pub name:      Option<String>,
}

impl Area {
    pub fn placeholder(area_id: impl Into<AreaId>, distance: u32) -> Self {
        Self {
            area_id: area_id.into(),
            distance,
            generated: false,
            locations: Vec::new(),
            name: None,
        }
    }

    /// Display name, falling back to a distance label when unnamed.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(n) => n.clone(),
            None => fallback_area_name(self.distance),
        }
    }
}

pub fn fallback_area_name(distance: u32) -> String {
    format!("Distance-{distance} Wilds")
}

/// Undirected edge between two areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub connection_id:          ConnectionId,
    pub area_a:                 AreaId,
    pub area_b:                 AreaId,
    pub travel_time_multiplier: f64,
}

impl Connection {
    pub fn new(a: &str, b: &str, travel_time_multiplier: f64) -> Self {
        let (area_a, area_b) = if a <= b { (a, b) } else { (b, a) };
        Self {
            connection_id: connection_id(a, b),
            area_a: area_a.to_string(),
            area_b: area_b.to_string(),
            travel_time_multiplier,
        }
    }

    pub fn touches(&self, area_id: &str) -> bool {
        self.area_a == area_id || self.area_b == area_id
    }

    /// The far end as seen from `area_id`.
    pub fn other_end(&self, area_id: &str) -> Option<&str> {
        if self.area_a == area_id {
            Some(&self.area_b)
        } else if self.area_b == area_id {
            Some(&self.area_a)
        } else {
            None
        }
    }
}

/// Order-independent edge id: `connection_id(a, b) == connection_id(b, a)`.
pub fn connection_id(a: &str, b: &str) -> ConnectionId {
    if a <= b {
        format!("{a}<->{b}")
    } else {
        format!("{b}<->{a}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub area_id:     AreaId,
    /// `None` is the area hub.
    pub location_id: Option<LocationId>,
}

impl Position {
    pub fn hub(area_id: impl Into<AreaId>) -> Self {
        Self { area_id: area_id.into(), location_id: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub position:            Position,
    pub inventory:           Inventory,
    pub capacity:            usize,
    pub storage:             BTreeMap<ItemId, u64>,
    pub skills:              BTreeMap<Skill, SkillState>,
    pub active_contracts:    BTreeSet<ContractId>,
    pub completed_contracts: BTreeSet<ContractId>,
    pub equipped_weapon:     Option<ItemId>,
}

impl PlayerState {
    pub fn level(&self, skill: Skill) -> u32 {
        crate::skills::level_of(&self.skills, skill)
    }

    /// Drop the equipped weapon reference once the last unit has left the
    /// inventory.
    pub fn reconcile_equipment(&mut self) {
        if let Some(weapon) = &self.equipped_weapon {
            if self.inventory.quantity_of(weapon) == 0 {
                self.equipped_weapon = None;
            }
        }
    }
}

/// Static-after-generation content: nodes, locations, and the enemy,
/// recipe and contract tables carried with the save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldContent {
    pub nodes:     BTreeMap<NodeId, Node>,
    pub locations: BTreeMap<LocationId, Location>,
    pub enemies:   BTreeMap<String, EnemyDef>,
    pub recipes:   BTreeMap<String, RecipeDef>,
    pub contracts: BTreeMap<ContractId, ContractDef>,
}

/// The area graph plus what the player knows of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationState {
    pub areas:             BTreeMap<AreaId, Area>,
    pub connections:       BTreeMap<ConnectionId, Connection>,
    pub known_areas:       BTreeSet<AreaId>,
    pub known_connections: BTreeSet<ConnectionId>,
    pub known_locations:   BTreeSet<LocationId>,
}

impl ExplorationState {
    pub fn area(&self, area_id: &str) -> SimResult<&Area> {
        self.areas.get(area_id).ok_or_else(|| SimError::UnknownArea { area_id: area_id.to_string() })
    }

    /// Every generated edge touching `area_id`, in id order.
    pub fn connections_of<'a>(&'a self, area_id: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.values().filter(move |c| c.touches(area_id))
    }

    /// Known edges touching `area_id`, in id order.
    pub fn known_connections_of<'a>(&'a self, area_id: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections_of(area_id)
            .filter(move |c| self.known_connections.contains(&c.connection_id))
    }

    pub fn known_connection_between(&self, a: &str, b: &str) -> Option<&Connection> {
        let id = connection_id(a, b);
        if self.known_connections.contains(&id) {
            self.connections.get(&id)
        } else {
            None
        }
    }

    /// Ensure a placeholder exists for `area_id`. Never touches a
    /// generated area.
    pub fn ensure_placeholder(&mut self, area_id: &str, distance: u32) {
        self.areas
            .entry(area_id.to_string())
            .or_insert_with(|| Area::placeholder(area_id, distance));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub clock:       SessionClock,
    pub player:      PlayerState,
    pub content:     WorldContent,
    pub exploration: ExplorationState,
    pub rng:         RngCursor,
}

impl WorldState {
    /// A fresh world: home base generated and fully known, the ring of
    /// distance-1 placeholders connected to it, nothing else.
    /// No random draws are made here.
    pub fn new(seed: &str, config: &SimConfig) -> Self {
        let mut locations = BTreeMap::new();
        let mut home = Area {
            area_id:   HOME_AREA_ID.to_string(),
            distance:  0,
            generated: true,
            locations: Vec::new(),
            name:      Some("Home Base".to_string()),
        };

        let mut add_location = |home: &mut Area, location_id: String, kind: LocationKind| {
            home.locations.push(location_id.clone());
            locations.insert(
                location_id.clone(),
                Location { location_id, area_id: HOME_AREA_ID.to_string(), kind },
            );
        };
        for skill in Skill::ALL {
            add_location(&mut home, guild_location_id(skill), LocationKind::Guild { skill });
        }
        add_location(&mut home, warehouse_location_id(), LocationKind::Warehouse);
        for skill in Skill::ALL.into_iter().filter(|s| s.is_crafting()) {
            add_location(&mut home, workshop_location_id(skill), LocationKind::Workshop { skill });
        }

        let mut exploration = ExplorationState {
            areas:             BTreeMap::new(),
            connections:       BTreeMap::new(),
            known_areas:       BTreeSet::new(),
            known_connections: BTreeSet::new(),
            known_locations:   locations.keys().cloned().collect(),
        };
        exploration.known_areas.insert(HOME_AREA_ID.to_string());
        exploration.areas.insert(HOME_AREA_ID.to_string(), home);

        for area_id in area_ids_at_distance(1, &config.discovery) {
            exploration.ensure_placeholder(&area_id, 1);
            let edge = Connection::new(HOME_AREA_ID, &area_id, config.discovery.home_multiplier);
            exploration.connections.insert(edge.connection_id.clone(), edge);
        }

        let content = WorldContent {
            nodes: BTreeMap::new(),
            locations,
            enemies: config
                .content
                .enemies
                .iter()
                .map(|e| (e.enemy_id.clone(), e.clone()))
                .collect(),
            recipes: config
                .content
                .recipes
                .iter()
                .map(|r| (r.recipe_id.clone(), r.clone()))
                .collect(),
            contracts: config
                .content
                .contracts
                .iter()
                .map(|c| (c.contract_id.clone(), c.clone()))
                .collect(),
        };

        let player = PlayerState {
            position:            Position::hub(HOME_AREA_ID),
            inventory:           Inventory::default(),
            capacity:            config.session.inventory_capacity,
            storage:             BTreeMap::new(),
            skills:              Skill::ALL.iter().map(|s| (*s, SkillState::default())).collect(),
            active_contracts:    BTreeSet::new(),
            completed_contracts: BTreeSet::new(),
            equipped_weapon:     None,
        };

        Self {
            clock: SessionClock::new(config.session.session_ticks),
            player,
            content,
            exploration,
            rng: RngCursor::new(seed),
        }
    }

    pub fn current_area(&self) -> SimResult<&Area> {
        self.exploration.area(&self.player.position.area_id)
    }

    pub fn current_location(&self) -> Option<&Location> {
        self.player
            .position
            .location_id
            .as_ref()
            .and_then(|id| self.content.locations.get(id))
    }

    /// The node a location holds, if it is a gathering node.
    pub fn node_location(&self, node_id: &str) -> Option<&Location> {
        self.content.locations.values().find(|l| match &l.kind {
            LocationKind::GatheringNode { node_id: n } => n == node_id,
            _ => false,
        })
    }

    /// Structural invariants that must hold in every reachable state.
    pub fn check_invariants(&self) -> SimResult<()> {
        let inv = &self.player.inventory;
        if inv.distinct_count() > self.player.capacity {
            return Err(SimError::InvariantViolation(format!(
                "inventory holds {} distinct items, capacity {}",
                inv.distinct_count(),
                self.player.capacity
            )));
        }
        let mut seen = BTreeSet::new();
        for slot in &inv.slots {
            if !seen.insert(slot.item_id.as_str()) || slot.quantity == 0 {
                return Err(SimError::InvariantViolation(format!(
                    "bad inventory slot for {}",
                    slot.item_id
                )));
            }
        }
        for node in self.content.nodes.values() {
            let all_empty = node.materials.iter().all(|m| m.remaining_units == 0);
            if node.depleted != all_empty {
                return Err(SimError::InvariantViolation(format!(
                    "node {} depleted={} but all_empty={all_empty}",
                    node.node_id, node.depleted
                )));
            }
            if node.materials.iter().any(|m| m.remaining_units > m.max_units_initial) {
                return Err(SimError::InvariantViolation(format!(
                    "node {} has a reserve above its initial size",
                    node.node_id
                )));
            }
        }
        if !self.exploration.areas.contains_key(&self.player.position.area_id) {
            return Err(SimError::UnknownArea { area_id: self.player.position.area_id.clone() });
        }
        Ok(())
    }
}

pub fn guild_location_id(skill: Skill) -> LocationId {
    format!("{HOME_AREA_ID}/guild-{}", skill.name())
}

pub fn warehouse_location_id() -> LocationId {
    format!("{HOME_AREA_ID}/warehouse")
}

pub fn workshop_location_id(skill: Skill) -> LocationId {
    format!("{HOME_AREA_ID}/workshop-{}", skill.name())
}
