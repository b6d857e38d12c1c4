//! Route finding over the known part of the area graph.
//!
//! BFS over known connections only; fewest hops wins, and ties go to the
//! neighbor whose edge id sorts first. Unknown edges are never a fallback.

use crate::{
    types::{AreaId, Tick},
    world::ExplorationState,
};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// One hop: the area entered and what it costs to get there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub area_id: AreaId,
    pub ticks:   Tick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub hops:        Vec<Hop>,
    pub total_ticks: Tick,
}

impl Route {
    pub fn path(&self) -> Vec<AreaId> {
        self.hops.iter().map(|h| h.area_id.clone()).collect()
    }
}

/// Cost of crossing one edge.
pub fn hop_ticks(base_travel_ticks: Tick, multiplier: f64) -> Tick {
    ((base_travel_ticks as f64 * multiplier).round() as Tick).max(1)
}

/// Shortest known route from `from` to `to`. `None` if unreachable or if
/// either end is not a known area. Same area yields an empty route.
pub fn find_route(ex: &ExplorationState, from: &str, to: &str, base_travel_ticks: Tick) -> Option<Route> {
    if !ex.known_areas.contains(from) || !ex.known_areas.contains(to) {
        return None;
    }
    if from == to {
        return Some(Route { hops: vec![], total_ticks: 0 });
    }

    let mut visited: BTreeSet<&str> = BTreeSet::new();
    // area -> (previous area, edge multiplier)
    let mut came_from: BTreeMap<&str, (&str, f64)> = BTreeMap::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    visited.insert(from);
    queue.push_back(from);

    while let Some(current) = queue.pop_front() {
        if current == to {
            break;
        }
        for conn in ex.known_connections_of(current) {
            let Some(next) = conn.other_end(current) else { continue };
            if !ex.known_areas.contains(next) || !visited.insert(next) {
                continue;
            }
            came_from.insert(next, (current, conn.travel_time_multiplier));
            queue.push_back(next);
        }
    }

    if !came_from.contains_key(to) {
        return None;
    }

    let mut hops = Vec::new();
    let mut cursor = to;
    while cursor != from {
        let (prev, multiplier) = came_from[cursor];
        hops.push(Hop {
            area_id: cursor.to_string(),
            ticks:   hop_ticks(base_travel_ticks, multiplier),
        });
        cursor = prev;
    }
    hops.reverse();
    let total_ticks = hops.iter().map(|h| h.ticks).sum();
    Some(Route { hops, total_ticks })
}
