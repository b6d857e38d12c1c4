//! Balance constants and world content.
//!
//! Everything tunable lives here: tick costs, the XP curve, extraction
//! yield/collateral constants, discovery chances, and the content tables
//! (materials, enemies, recipes, weapons, contracts).
//! `SimConfig::load` reads the shipped JSON under `data/`;
//! `SimConfig::default_test` mirrors those files for tests.

use crate::{
    action::GatherMode,
    inventory::ItemStack,
    skills::Skill,
    types::{ContractId, ItemId, Tick},
    world::NodeType,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub session_ticks:         Tick,
    pub inventory_capacity:    usize,
    pub max_active_contracts:  usize,
    /// Cost of one hop with multiplier 1.0.
    pub base_travel_ticks:     Tick,
    pub location_travel_ticks: Tick,
    pub leave_ticks:           Tick,
    pub enrol_ticks:           Tick,
    pub accept_contract_ticks: Tick,
    pub store_ticks:           Tick,
    pub drop_ticks:            Tick,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillConfig {
    /// XP to go from level 1 to 2.
    pub xp_base:   f64,
    /// Each further level costs this factor more.
    pub xp_growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeUnlock {
    pub mode:  GatherMode,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatherConfig {
    /// Ordered unlock table: a mode is usable from `level` upward.
    pub unlocks:               Vec<ModeUnlock>,
    /// Gathering skill needed per distance band beyond the first.
    pub levels_per_distance:   u32,
    pub focus_ticks:           Tick,
    pub appraise_ticks:        Tick,
    pub careful_all_ticks:     Tick,
    /// FOCUS units at 100% yield, before variance.
    pub base_extraction_units: f64,
    pub min_yield_pct:         f64,
    /// Level gap at which FOCUS reaches 100% yield.
    pub max_yield_level_gap:   u32,
    pub variance_base:         f64,
    pub variance_per_distance: f64,
    pub variance_cap:          f64,
    pub collateral_base:       f64,
    pub collateral_per_level:  f64,
    /// Collateral never drops below this fraction, at any level.
    pub collateral_floor:      f64,
    pub careful_units:         u64,
    /// A material is visible to APPRAISE when its required level is at
    /// most this far above the actor's level.
    pub visibility_band:       u32,
}

impl GatherConfig {
    pub fn unlock_level(&self, mode: GatherMode) -> Option<u32> {
        self.unlocks.iter().find(|u| u.mode == mode).map(|u| u.level)
    }

    /// Minimum gathering level to work nodes in an area at `distance`.
    pub fn required_level_for_distance(&self, distance: u32) -> u32 {
        1 + distance.saturating_sub(1) * self.levels_per_distance
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Area counts at distance 1 and 2; later distances sum the two before.
    pub area_growth_seed:          [u64; 2],
    /// P(connection count = index) per relative distance band.
    pub connection_count_weights:  Vec<f64>,
    pub multiplier_min:            f64,
    pub multiplier_max:            f64,
    pub home_multiplier:           f64,
    pub base_chance:               f64,
    pub per_level_rate:            f64,
    /// Lowest possible chance, and the flat chance of unenrolled actors.
    pub chance_floor:              f64,
    pub knowledge_weight:          f64,
    pub known_connection_mult:     f64,
    pub mob_camp_mult:             f64,
    pub node_skilled_mult:         f64,
    pub node_unskilled_mult:       f64,
    pub unknown_area_mult:         f64,
    pub base_roll_interval:        Tick,
    pub roll_interval_step:        Tick,
    pub min_roll_interval:         Tick,
    /// P(count = index) of gathering nodes in a generated area.
    pub node_count_weights:        Vec<f64>,
    pub camp_count_weights:        Vec<f64>,
    pub material_count_weights:    Vec<f64>,
    /// Materials up to tier `distance + max_tier_offset` may appear.
    pub max_tier_offset:           u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatConfig {
    pub base_win_chance: f64,
    pub per_level:       f64,
    pub min_win_chance:  f64,
    pub max_win_chance:  f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDef {
    pub material_id:    ItemId,
    pub node_type:      NodeType,
    pub tier:           u32,
    pub required_level: u32,
    pub min_units:      u64,
    pub max_units:      u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyDef {
    pub enemy_id:     String,
    pub level:        u32,
    pub min_distance: u32,
    pub fight_ticks:  Tick,
    pub loot:         Vec<ItemStack>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDef {
    pub recipe_id:      String,
    pub skill:          Skill,
    pub required_level: u32,
    pub tier:           u32,
    pub ticks:          Tick,
    pub inputs:         Vec<ItemStack>,
    pub output:         ItemStack,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponDef {
    pub item_id:      ItemId,
    pub combat_bonus: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractDef {
    pub contract_id:    ContractId,
    pub skill:          Skill,
    pub required_level: u32,
    pub requirements:   Vec<ItemStack>,
    pub reward_xp:      u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentConfig {
    pub materials: Vec<MaterialDef>,
    pub enemies:   Vec<EnemyDef>,
    pub recipes:   Vec<RecipeDef>,
    pub weapons:   Vec<WeaponDef>,
    pub contracts: Vec<ContractDef>,
}

impl ContentConfig {
    pub fn weapon(&self, item_id: &str) -> Option<&WeaponDef> {
        self.weapons.iter().find(|w| w.item_id == item_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct BalanceFile {
    session:   SessionConfig,
    skills:    SkillConfig,
    gather:    GatherConfig,
    discovery: DiscoveryConfig,
    combat:    CombatConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub session:   SessionConfig,
    pub skills:    SkillConfig,
    pub gather:    GatherConfig,
    pub discovery: DiscoveryConfig,
    pub combat:    CombatConfig,
    pub content:   ContentConfig,
}

impl SimConfig {
    /// Load from the data/ directory.
    /// In tests, use SimConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let balance_path = format!("{data_dir}/balance.json");
        let balance_content = std::fs::read_to_string(&balance_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {balance_path}: {e}"))?;
        let balance: BalanceFile = serde_json::from_str(&balance_content)
            .map_err(|e| anyhow::anyhow!("Invalid JSON in {balance_path}: {e}"))?;

        let content_path = format!("{data_dir}/content.json");
        let content_text = std::fs::read_to_string(&content_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {content_path}: {e}"))?;
        let content: ContentConfig = serde_json::from_str(&content_text)
            .map_err(|e| anyhow::anyhow!("Invalid JSON in {content_path}: {e}"))?;

        let config = Self {
            session:   balance.session,
            skills:    balance.skills,
            gather:    balance.gather,
            discovery: balance.discovery,
            combat:    balance.combat,
            content,
        };
        config.validate().map_err(|e| anyhow::anyhow!("{data_dir}: {e}"))?;
        Ok(config)
    }

    /// Check cross-field constraints. All problems are reported together.
    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();
        let g = &self.gather;
        let d = &self.discovery;

        if self.session.inventory_capacity == 0 {
            errors.push("session.inventory_capacity must be > 0".to_string());
        }
        if self.session.base_travel_ticks == 0 {
            errors.push("session.base_travel_ticks must be > 0".to_string());
        }
        if self.skills.xp_base < 1.0 || self.skills.xp_growth < 1.0 {
            errors.push(format!(
                "skills.xp_base and skills.xp_growth must be >= 1.0, got {} / {}",
                self.skills.xp_base, self.skills.xp_growth
            ));
        }
        for mode in GatherMode::ALL {
            if g.unlock_level(mode).is_none() {
                errors.push(format!("gather.unlocks is missing mode {mode:?}"));
            }
        }
        if g.careful_all_ticks <= g.focus_ticks {
            errors.push(format!(
                "gather.careful_all_ticks ({}) must exceed gather.focus_ticks ({})",
                g.careful_all_ticks, g.focus_ticks
            ));
        }
        if g.focus_ticks == 0 || g.appraise_ticks == 0 {
            errors.push("gather.focus_ticks and gather.appraise_ticks must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&g.min_yield_pct) {
            errors.push(format!("gather.min_yield_pct must be 0.0-1.0, got {}", g.min_yield_pct));
        }
        if g.max_yield_level_gap == 0 {
            errors.push("gather.max_yield_level_gap must be > 0".to_string());
        }
        if !(0.0..1.0).contains(&g.variance_cap) {
            errors.push(format!("gather.variance_cap must be 0.0-1.0 (exclusive), got {}", g.variance_cap));
        }
        if g.collateral_floor <= 0.0 || g.collateral_floor > g.collateral_base {
            errors.push(format!(
                "gather.collateral_floor must be > 0 and <= collateral_base, got {}",
                g.collateral_floor
            ));
        }
        if d.area_growth_seed[0] == 0 || d.area_growth_seed[1] < d.area_growth_seed[0] {
            errors.push(format!("discovery.area_growth_seed must be increasing and > 0, got {:?}", d.area_growth_seed));
        }
        for (name, weights) in [
            ("connection_count_weights", &d.connection_count_weights),
            ("node_count_weights", &d.node_count_weights),
            ("camp_count_weights", &d.camp_count_weights),
            ("material_count_weights", &d.material_count_weights),
        ] {
            if weights.is_empty() || weights.iter().any(|w| *w < 0.0) || weights.iter().sum::<f64>() <= 0.0 {
                errors.push(format!("discovery.{name} must be non-empty, non-negative and sum > 0"));
            }
        }
        if d.multiplier_min <= 0.0 || d.multiplier_max <= d.multiplier_min {
            errors.push(format!(
                "discovery multiplier range must satisfy 0 < min < max, got [{}, {})",
                d.multiplier_min, d.multiplier_max
            ));
        }
        if d.min_roll_interval == 0 || d.base_roll_interval < d.min_roll_interval {
            errors.push("discovery roll intervals must satisfy 0 < min <= base".to_string());
        }
        if !(0.0..=1.0).contains(&d.chance_floor) {
            errors.push(format!("discovery.chance_floor must be 0.0-1.0, got {}", d.chance_floor));
        }
        for m in &self.content.materials {
            if m.min_units == 0 || m.max_units < m.min_units {
                errors.push(format!("material {} has invalid unit range", m.material_id));
            }
        }
        for r in &self.content.recipes {
            if !r.skill.is_crafting() {
                errors.push(format!("recipe {} uses non-crafting skill {}", r.recipe_id, r.skill.name()));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }

    /// Config with hardcoded defaults for use in unit tests.
    /// Matches data/balance.json and data/content.json.
    pub fn default_test() -> Self {
        Self {
            session: SessionConfig {
                session_ticks:         2_000,
                inventory_capacity:    12,
                max_active_contracts:  3,
                base_travel_ticks:     10,
                location_travel_ticks: 2,
                leave_ticks:           1,
                enrol_ticks:           5,
                accept_contract_ticks: 1,
                store_ticks:           1,
                drop_ticks:            0,
            },
            skills: SkillConfig {
                xp_base:   20.0,
                xp_growth: 1.25,
            },
            gather: GatherConfig {
                unlocks: vec![
                    ModeUnlock { mode: GatherMode::Focus,      level: 1 },
                    ModeUnlock { mode: GatherMode::Appraise,   level: 3 },
                    ModeUnlock { mode: GatherMode::CarefulAll, level: 6 },
                ],
                levels_per_distance:   3,
                focus_ticks:           5,
                appraise_ticks:        1,
                careful_all_ticks:     12,
                base_extraction_units: 10.0,
                min_yield_pct:         0.4,
                max_yield_level_gap:   10,
                variance_base:         0.10,
                variance_per_distance: 0.05,
                variance_cap:          0.50,
                collateral_base:       0.50,
                collateral_per_level:  0.02,
                collateral_floor:      0.10,
                careful_units:         2,
                visibility_band:       3,
            },
            discovery: DiscoveryConfig {
                area_growth_seed:         [5, 8],
                connection_count_weights: vec![0.15, 0.35, 0.35, 0.15],
                multiplier_min:           0.8,
                multiplier_max:           1.6,
                home_multiplier:          1.0,
                base_chance:              0.10,
                per_level_rate:           0.01,
                chance_floor:             0.02,
                knowledge_weight:         0.10,
                known_connection_mult:    1.0,
                mob_camp_mult:            0.5,
                node_skilled_mult:        0.5,
                node_unskilled_mult:      0.05,
                unknown_area_mult:        0.25,
                base_roll_interval:       6,
                roll_interval_step:       1,
                min_roll_interval:        2,
                node_count_weights:       vec![0.0, 0.30, 0.45, 0.25],
                camp_count_weights:       vec![0.40, 0.45, 0.15],
                material_count_weights:   vec![0.0, 0.40, 0.40, 0.20],
                max_tier_offset:          1,
            },
            combat: CombatConfig {
                base_win_chance: 0.5,
                per_level:       0.08,
                min_win_chance:  0.05,
                max_win_chance:  0.95,
            },
            content: default_content(),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::default_test()
    }
}

fn material(id: &str, node_type: NodeType, tier: u32, required_level: u32, min_units: u64, max_units: u64) -> MaterialDef {
    MaterialDef {
        material_id: id.into(),
        node_type,
        tier,
        required_level,
        min_units,
        max_units,
    }
}

fn recipe(id: &str, skill: Skill, required_level: u32, tier: u32, ticks: Tick, inputs: Vec<ItemStack>, output: ItemStack) -> RecipeDef {
    RecipeDef {
        recipe_id: id.into(),
        skill,
        required_level,
        tier,
        ticks,
        inputs,
        output,
    }
}

fn default_content() -> ContentConfig {
    use NodeType::*;
    ContentConfig {
        materials: vec![
            material("STONE",      OreVein,     1, 1,  20, 50),
            material("COPPER_ORE", OreVein,     1, 1,  15, 40),
            material("TIN_ORE",    OreVein,     2, 4,  10, 30),
            material("IRON_ORE",   OreVein,     3, 7,  10, 25),
            material("SILVER_ORE", OreVein,     4, 10, 5,  20),
            material("GOLD_ORE",   OreVein,     5, 13, 5,  15),
            material("PINE_LOG",   TreeStand,   1, 1,  20, 50),
            material("OAK_LOG",    TreeStand,   2, 4,  15, 35),
            material("MAPLE_LOG",  TreeStand,   3, 7,  10, 30),
            material("YEW_LOG",    TreeStand,   4, 10, 8,  20),
            material("MINNOW",     FishingSpot, 1, 1,  20, 40),
            material("TROUT",      FishingSpot, 2, 4,  15, 30),
            material("SALMON",     FishingSpot, 3, 7,  10, 25),
            material("PIKE",       FishingSpot, 4, 10, 5,  15),
        ],
        enemies: vec![
            EnemyDef { enemy_id: "rat".into(),    level: 1,  min_distance: 1, fight_ticks: 6,  loot: vec![ItemStack::new("RAT_TAIL", 1)] },
            EnemyDef { enemy_id: "wolf".into(),   level: 4,  min_distance: 2, fight_ticks: 8,  loot: vec![ItemStack::new("WOLF_PELT", 1)] },
            EnemyDef { enemy_id: "bandit".into(), level: 7,  min_distance: 3, fight_ticks: 10, loot: vec![ItemStack::new("BANDIT_BADGE", 1), ItemStack::new("COPPER_BAR", 1)] },
            EnemyDef { enemy_id: "ogre".into(),   level: 12, min_distance: 4, fight_ticks: 14, loot: vec![ItemStack::new("OGRE_TOOTH", 1)] },
        ],
        recipes: vec![
            recipe("copper_bar",    Skill::Smithing,     1, 1, 4,  vec![ItemStack::new("COPPER_ORE", 2)], ItemStack::new("COPPER_BAR", 1)),
            recipe("bronze_bar",    Skill::Smithing,     4, 2, 5,  vec![ItemStack::new("COPPER_ORE", 1), ItemStack::new("TIN_ORE", 1)], ItemStack::new("BRONZE_BAR", 1)),
            recipe("copper_dagger", Skill::Smithing,     2, 1, 8,  vec![ItemStack::new("COPPER_BAR", 2)], ItemStack::new("COPPER_DAGGER", 1)),
            recipe("bronze_sword",  Skill::Smithing,     5, 2, 10, vec![ItemStack::new("BRONZE_BAR", 3)], ItemStack::new("BRONZE_SWORD", 1)),
            recipe("pine_plank",    Skill::Woodcrafting, 1, 1, 3,  vec![ItemStack::new("PINE_LOG", 2)], ItemStack::new("PINE_PLANK", 1)),
            recipe("oak_bow",       Skill::Woodcrafting, 4, 2, 9,  vec![ItemStack::new("OAK_LOG", 3)], ItemStack::new("OAK_BOW", 1)),
        ],
        weapons: vec![
            WeaponDef { item_id: "COPPER_DAGGER".into(), combat_bonus: 0.05 },
            WeaponDef { item_id: "OAK_BOW".into(),       combat_bonus: 0.08 },
            WeaponDef { item_id: "BRONZE_SWORD".into(),  combat_bonus: 0.10 },
        ],
        contracts: vec![
            ContractDef { contract_id: "stone_delivery".into(), skill: Skill::Mining,      required_level: 1, requirements: vec![ItemStack::new("STONE", 10)],     reward_xp: 40 },
            ContractDef { contract_id: "pine_bundle".into(),    skill: Skill::Woodcutting, required_level: 1, requirements: vec![ItemStack::new("PINE_LOG", 10)],  reward_xp: 40 },
            ContractDef { contract_id: "minnow_catch".into(),   skill: Skill::Fishing,     required_level: 1, requirements: vec![ItemStack::new("MINNOW", 8)],     reward_xp: 35 },
            ContractDef { contract_id: "copper_bars".into(),    skill: Skill::Smithing,    required_level: 1, requirements: vec![ItemStack::new("COPPER_BAR", 3)], reward_xp: 60 },
            ContractDef { contract_id: "rat_cull".into(),       skill: Skill::Combat,      required_level: 1, requirements: vec![ItemStack::new("RAT_TAIL", 3)],   reward_xp: 50 },
        ],
    }
}
