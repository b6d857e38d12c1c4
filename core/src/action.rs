use crate::{
    skills::Skill,
    types::{AreaId, ContractId, ItemId, LocationId, NodeId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatherMode {
    Appraise,
    Focus,
    CarefulAll,
}

impl GatherMode {
    pub const ALL: [GatherMode; 3] = [GatherMode::Appraise, GatherMode::Focus, GatherMode::CarefulAll];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Appraise   => "APPRAISE",
            Self::Focus      => "FOCUS",
            Self::CarefulAll => "CAREFUL_ALL",
        }
    }
}

/// Every action a player or agent can issue.
/// Each variant carries only the fields it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    // ── Travel ────────────────────────────────────
    /// One hop over a known connection.
    Move { to_area: AreaId },
    /// Shortest known route, any number of hops.
    FarTravel { to_area: AreaId },
    TravelToLocation { location_id: LocationId },
    Leave,

    // ── Work ──────────────────────────────────────
    Gather {
        node_id:        NodeId,
        mode:           GatherMode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        focus_material: Option<ItemId>,
    },
    Fight,
    Craft { recipe_id: String },
    Store { item_id: ItemId, quantity: u64 },
    Drop { item_id: ItemId, quantity: u64 },

    // ── Guilds ────────────────────────────────────
    Enrol { skill: Skill },
    AcceptContract { contract_id: ContractId },

    // ── Discovery ─────────────────────────────────
    Survey,
    Explore,
}

impl Action {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Move { .. }             => "move",
            Self::FarTravel { .. }        => "far_travel",
            Self::TravelToLocation { .. } => "travel_to_location",
            Self::Leave                   => "leave",
            Self::Gather { .. }           => "gather",
            Self::Fight                   => "fight",
            Self::Craft { .. }            => "craft",
            Self::Store { .. }            => "store",
            Self::Drop { .. }             => "drop",
            Self::Enrol { .. }            => "enrol",
            Self::AcceptContract { .. }   => "accept_contract",
            Self::Survey                  => "survey",
            Self::Explore                 => "explore",
        }
    }

    /// Convenience for FOCUS gathers.
    pub fn focus(node_id: impl Into<NodeId>, material: impl Into<ItemId>) -> Self {
        Self::Gather {
            node_id:        node_id.into(),
            mode:           GatherMode::Focus,
            focus_material: Some(material.into()),
        }
    }

    pub fn gather(node_id: impl Into<NodeId>, mode: GatherMode) -> Self {
        Self::Gather { node_id: node_id.into(), mode, focus_material: None }
    }
}
