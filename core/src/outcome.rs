//! Action results: the immutable record every resolved action produces.
//!
//! RULE: A result is built once, when its action finishes, and is never
//! mutated after it is returned. Everything a display or a replay tool
//! needs is inside it.

use crate::{
    action::{Action, GatherMode},
    inventory::ItemStack,
    rng::RngRoll,
    skills::{LevelUp, Skill, SkillGain},
    types::{AreaId, ConnectionId, ContractId, ItemId, LocationId, NodeId, Tick},
    world::{LocationKind, Position},
};
use serde::{Deserialize, Serialize};

/// The closed set of recoverable gameplay failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    // ── Gathering ──────────────────────────────────
    NodeNotFound,
    WrongLocation,
    NodeDepleted,
    InsufficientSkill,
    ModeNotUnlocked,
    MissingFocusMaterial,
    InvalidFocusMaterial,
    InventoryFull,

    // ── Session ────────────────────────────────────
    SessionEnded,

    // ── Travel ─────────────────────────────────────
    NoPathToDestination,
    UnknownArea,
    AlreadyThere,
    UnknownLocation,

    // ── Items, crafting, combat ────────────────────
    MissingItems,
    InvalidQuantity,
    UnknownRecipe,
    UnknownEnemy,
    CombatLost,

    // ── Guilds ─────────────────────────────────────
    AlreadyEnrolled,
    UnknownContract,
    ContractUnavailable,
    TooManyContracts,

    // ── Discovery ──────────────────────────────────
    NothingToDiscover,
}

impl FailureKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NodeNotFound         => "NODE_NOT_FOUND",
            Self::WrongLocation        => "WRONG_LOCATION",
            Self::NodeDepleted         => "NODE_DEPLETED",
            Self::InsufficientSkill    => "INSUFFICIENT_SKILL",
            Self::ModeNotUnlocked      => "MODE_NOT_UNLOCKED",
            Self::MissingFocusMaterial => "MISSING_FOCUS_MATERIAL",
            Self::InvalidFocusMaterial => "INVALID_FOCUS_MATERIAL",
            Self::InventoryFull        => "INVENTORY_FULL",
            Self::SessionEnded         => "SESSION_ENDED",
            Self::NoPathToDestination  => "NO_PATH_TO_DESTINATION",
            Self::UnknownArea          => "UNKNOWN_AREA",
            Self::AlreadyThere         => "ALREADY_THERE",
            Self::UnknownLocation      => "UNKNOWN_LOCATION",
            Self::MissingItems         => "MISSING_ITEMS",
            Self::InvalidQuantity      => "INVALID_QUANTITY",
            Self::UnknownRecipe        => "UNKNOWN_RECIPE",
            Self::UnknownEnemy         => "UNKNOWN_ENEMY",
            Self::CombatLost           => "COMBAT_LOST",
            Self::AlreadyEnrolled      => "ALREADY_ENROLLED",
            Self::UnknownContract      => "UNKNOWN_CONTRACT",
            Self::ContractUnavailable  => "CONTRACT_UNAVAILABLE",
            Self::TooManyContracts     => "TOO_MANY_CONTRACTS",
            Self::NothingToDiscover    => "NOTHING_TO_DISCOVER",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// How much of a material APPRAISE reveals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shown", rename_all = "snake_case")]
pub enum AppraisedQuantity {
    Exact { remaining: u64, max: u64 },
    Estimate { bucket: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppraisedMaterial {
    pub material_id:    ItemId,
    pub tier:           u32,
    pub required_level: u32,
    pub quantity:       AppraisedQuantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollateralDamage {
    pub material_id: ItemId,
    pub units:       u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionDetail {
    Appraise {
        node_id:   NodeId,
        materials: Vec<AppraisedMaterial>,
        /// Materials too far above the actor's level to be seen.
        hidden:    usize,
    },
    Focus {
        node_id:        NodeId,
        material_id:    ItemId,
        yield_pct:      f64,
        expected_units: f64,
        variance:       f64,
        extracted:      u64,
        collateral:     Vec<CollateralDamage>,
        node_depleted:  bool,
    },
    CarefulAll {
        node_id:       NodeId,
        extracted:     Vec<ItemStack>,
        node_depleted: bool,
    },
}

impl ExtractionDetail {
    pub fn mode(&self) -> GatherMode {
        match self {
            Self::Appraise { .. }   => GatherMode::Appraise,
            Self::Focus { .. }      => GatherMode::Focus,
            Self::CarefulAll { .. } => GatherMode::CarefulAll,
        }
    }
}

/// Something a survey or explore turned up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "found", rename_all = "snake_case")]
pub enum Discovery {
    Location {
        location_id: LocationId,
        kind:        LocationKind,
    },
    Connection {
        connection_id:   ConnectionId,
        to_area:         AreaId,
        /// The far area was new to the player.
        new_area:        bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    Survey,
    Explore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryDetail {
    pub method:        DiscoveryMethod,
    pub chance:        f64,
    pub roll_interval: Tick,
    pub attempts:      u32,
    /// Survey hits on connections the player already knew.
    pub wasted_hits:   u32,
    pub found:         Option<Discovery>,
}

/// Mode-specific detail attached to a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "detail", rename_all = "snake_case")]
pub enum ActionDetail {
    Extraction(ExtractionDetail),
    Discovery(DiscoveryDetail),
    Travel {
        path: Vec<AreaId>,
    },
    Combat {
        enemy_id:        String,
        win_probability: f64,
        won:             bool,
    },
    Craft {
        recipe_id: String,
        output:    ItemStack,
        equipped:  bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractCompletion {
    pub contract_id: ContractId,
    pub skill:       Skill,
    pub reward_xp:   u64,
}

/// Net effect of an action on the player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    pub position:    Option<Position>,
    pub items_added: Vec<ItemStack>,
    pub items_removed: Vec<ItemStack>,
    pub discoveries: Vec<Discovery>,
    pub session_remaining_ticks: Tick,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub tick_before:         Tick,
    pub action_type:         String,
    pub parameters:          Action,
    pub success:             bool,
    pub failure_kind:        Option<FailureKind>,
    pub time_consumed:       Tick,
    pub skill_gained:        Option<SkillGain>,
    pub level_ups:           Vec<LevelUp>,
    pub contracts_completed: Vec<ContractCompletion>,
    pub rng_roll_audit:      Vec<RngRoll>,
    pub state_delta:         StateDelta,
    pub summary:             String,
    pub detail:              Option<ActionDetail>,
}

impl ActionResult {
    pub fn extraction(&self) -> Option<&ExtractionDetail> {
        match &self.detail {
            Some(ActionDetail::Extraction(d)) => Some(d),
            _ => None,
        }
    }

    pub fn discovery(&self) -> Option<&DiscoveryDetail> {
        match &self.detail {
            Some(ActionDetail::Discovery(d)) => Some(d),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressNote {
    Working,
    RollMissed { attempt: u32 },
    /// Survey landed on a connection already known.
    RollWasted { attempt: u32 },
    HopCompleted { area_id: AreaId },
}

/// Emitted for every tick that does not finish its action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub tick:    Tick,
    pub elapsed: Tick,
    /// Known up front for fixed-cost actions, open-ended for discovery.
    pub planned: Option<Tick>,
    pub note:    ProgressNote,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Progress(ProgressEvent),
    Done(ActionResult),
}

/// The action log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub id:          Option<i64>,
    pub run_id:      String,
    pub seq:         u64,
    pub tick_before: Tick,
    pub action_type: String,
    pub success:     bool,
    pub payload:     String, // JSON-serialized ActionResult
}
