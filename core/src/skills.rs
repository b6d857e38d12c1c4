//! Skill levels, the XP curve, and multi-level grants.
//!
//! Level 0 means "not enrolled". Enrolling at a guild sets level 1.
//! After every grant `xp` lies in `[0, threshold_for_next_level(level))`;
//! one grant may cross several thresholds at once.

use crate::config::SkillConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Mining,
    Woodcutting,
    Fishing,
    Smithing,
    Woodcrafting,
    Combat,
    Exploration,
}

impl Skill {
    pub const ALL: [Skill; 7] = [
        Skill::Mining,
        Skill::Woodcutting,
        Skill::Fishing,
        Skill::Smithing,
        Skill::Woodcrafting,
        Skill::Combat,
        Skill::Exploration,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mining       => "mining",
            Self::Woodcutting  => "woodcutting",
            Self::Fishing      => "fishing",
            Self::Smithing     => "smithing",
            Self::Woodcrafting => "woodcrafting",
            Self::Combat       => "combat",
            Self::Exploration  => "exploration",
        }
    }

    /// Skills that have a workshop at home base.
    pub fn is_crafting(&self) -> bool {
        matches!(self, Self::Smithing | Self::Woodcrafting)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillState {
    pub level: u32,
    pub xp:    u64,
}

impl SkillState {
    pub fn enrolled() -> Self {
        Self { level: 1, xp: 0 }
    }

    pub fn is_enrolled(&self) -> bool {
        self.level > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillGain {
    pub skill:  Skill,
    pub amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    pub skill:     Skill,
    pub new_level: u32,
}

/// XP needed to go from `level` to `level + 1`.
pub fn threshold_for_next_level(level: u32, cfg: &SkillConfig) -> u64 {
    let exponent = level.saturating_sub(1) as i32;
    let raw = (cfg.xp_base * cfg.xp_growth.powi(exponent)).round();
    (raw as u64).max(1)
}

/// Level of `skill`, 0 when never enrolled.
pub fn level_of(skills: &BTreeMap<Skill, SkillState>, skill: Skill) -> u32 {
    skills.get(&skill).map(|s| s.level).unwrap_or(0)
}

/// Add `amount` XP, rolling over as many levels as it pays for.
/// Unenrolled skills ignore grants.
pub fn grant_xp(state: &mut SkillState, skill: Skill, amount: u64, cfg: &SkillConfig) -> Vec<LevelUp> {
    let mut level_ups = Vec::new();
    if !state.is_enrolled() || amount == 0 {
        return level_ups;
    }

    state.xp += amount;
    loop {
        let threshold = threshold_for_next_level(state.level, cfg);
        if state.xp < threshold {
            break;
        }
        state.xp -= threshold;
        state.level += 1;
        level_ups.push(LevelUp { skill, new_level: state.level });
    }
    level_ups
}
