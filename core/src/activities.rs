//! Combat odds, equipment and guild contracts.

use crate::{
    config::{CombatConfig, ContentConfig, SkillConfig},
    error::SimResult,
    inventory::ItemStack,
    outcome::ContractCompletion,
    skills::{grant_xp, LevelUp},
    world::WorldState,
};

/// Bonus of whatever is equipped; 0.0 when bare-handed.
pub fn weapon_bonus(equipped: Option<&str>, content: &ContentConfig) -> f64 {
    equipped
        .and_then(|id| content.weapon(id))
        .map(|w| w.combat_bonus)
        .unwrap_or(0.0)
}

pub fn win_probability(combat_level: u32, enemy_level: u32, bonus: f64, cfg: &CombatConfig) -> f64 {
    let gap = combat_level as f64 - enemy_level as f64;
    (cfg.base_win_chance + gap * cfg.per_level + bonus).clamp(cfg.min_win_chance, cfg.max_win_chance)
}

/// Whether `candidate` should replace what is equipped.
pub fn is_upgrade(equipped: Option<&str>, candidate: &str, content: &ContentConfig) -> bool {
    match content.weapon(candidate) {
        None => false,
        Some(w) => w.combat_bonus > weapon_bonus(equipped, content),
    }
}

/// Complete every active contract whose items are all held. Items are
/// handed in and the reward XP granted. Contracts are checked in id order.
pub fn settle_contracts(
    world: &mut WorldState,
    skill_cfg: &SkillConfig,
) -> SimResult<(Vec<ContractCompletion>, Vec<LevelUp>, Vec<ItemStack>)> {
    let mut completions = Vec::new();
    let mut level_ups = Vec::new();
    let mut handed_in = Vec::new();
    let tick = world.clock.current_tick;

    let active: Vec<_> = world.player.active_contracts.iter().cloned().collect();
    for contract_id in active {
        let Some(def) = world.content.contracts.get(&contract_id).cloned() else {
            continue;
        };
        if !world.player.inventory.contains_all(&def.requirements) {
            continue;
        }
        for req in &def.requirements {
            world.player.inventory.remove(&req.item_id, req.quantity)?;
            handed_in.push(req.clone());
        }
        world.player.reconcile_equipment();
        world.player.active_contracts.remove(&contract_id);
        world.player.completed_contracts.insert(contract_id.clone());

        let state = world.player.skills.entry(def.skill).or_default();
        level_ups.extend(grant_xp(state, def.skill, def.reward_xp, skill_cfg));
        log::info!(
            "tick={tick} contracts: completed {contract_id} (+{} {} xp)",
            def.reward_xp,
            def.skill.name()
        );
        completions.push(ContractCompletion {
            contract_id,
            skill: def.skill,
            reward_xp: def.reward_xp,
        });
    }
    Ok((completions, level_ups, handed_in))
}
