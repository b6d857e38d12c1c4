//! Shared primitive types used across the entire simulation.

/// A simulation tick. The only unit of simulated time.
pub type Tick = u64;

/// Stable identifier of an area in the world graph.
pub type AreaId = String;

/// Identifier of a location inside an area (node, camp, guild, ...).
pub type LocationId = String;

/// Identifier of a resource node.
pub type NodeId = String;

/// Identifier of an inventory item or material.
pub type ItemId = String;

/// Canonical, order-independent identifier of an area connection.
pub type ConnectionId = String;

/// Identifier of a guild contract.
pub type ContractId = String;

/// The canonical run identifier.
pub type RunId = String;

/// The id of the home base area. Always distance 0.
pub const HOME_AREA_ID: &str = "home";
