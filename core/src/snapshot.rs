//! Save documents: the full world state to/from JSON.
//!
//! A save captures everything needed to resume: the world (which carries
//! the RNG cursor), the seed it was created with, and when it was saved.
//! A loaded world continues with the same next draw and the same legal
//! actions as the one that was saved.

use crate::{
    error::{SimError, SimResult},
    world::WorldState,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SAVE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveDocument {
    pub format_version: u32,
    pub seed:           String,
    pub saved_at:       DateTime<Utc>,
    pub world:          WorldState,
}

impl SaveDocument {
    pub fn new(world: WorldState) -> Self {
        Self::at(world, Utc::now())
    }

    /// Fixed timestamp, for byte-stable documents in tests.
    pub fn at(world: WorldState, saved_at: DateTime<Utc>) -> Self {
        Self {
            format_version: SAVE_FORMAT_VERSION,
            seed: world.rng.seed.clone(),
            saved_at,
            world,
        }
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> SimResult<Self> {
        let doc: SaveDocument = serde_json::from_str(json)?;
        if doc.format_version != SAVE_FORMAT_VERSION {
            return Err(SimError::UnsupportedSaveVersion {
                found:    doc.format_version,
                expected: SAVE_FORMAT_VERSION,
            });
        }
        if doc.seed != doc.world.rng.seed {
            return Err(SimError::InvariantViolation(format!(
                "save seed {} does not match cursor seed {}",
                doc.seed, doc.world.rng.seed
            )));
        }
        doc.world.check_invariants()?;
        Ok(doc)
    }

    pub fn save_to_file(&self, path: &Path) -> SimResult<()> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("tick={} snapshot: saved to {}", self.world.clock.current_tick, path.display());
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> SimResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    #[test]
    fn unknown_version_is_rejected() {
        let world = WorldState::new("s1", &SimConfig::default_test());
        let mut doc = SaveDocument::new(world);
        doc.format_version = 99;
        let json = serde_json::to_string(&doc).unwrap();
        match SaveDocument::from_json(&json) {
            Err(SimError::UnsupportedSaveVersion { found: 99, expected: 1 }) => {}
            other => panic!("expected version error, got {other:?}"),
        }
    }

    #[test]
    fn json_round_trip_keeps_cursor() {
        let mut world = WorldState::new("s1", &SimConfig::default_test());
        world.rng.counter = 42;
        let doc = SaveDocument::new(world);
        let back = SaveDocument::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(back, doc);
        assert_eq!(back.world.rng.counter, 42);
    }
}
