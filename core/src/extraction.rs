//! Resource extraction: the three gathering modes on multi-material nodes.
//!
//! APPRAISE reads, FOCUS takes one material with variance and collateral,
//! CAREFUL_ALL takes a little of everything the actor may work, cleanly.
//! Legality is settled by the checker before any of this runs; these
//! functions assume a valid, non-depleted node.
//!
//! FOCUS collateral never drops below `collateral_floor`, at any level.

use crate::{
    action::GatherMode,
    config::GatherConfig,
    error::{SimError, SimResult},
    inventory::ItemStack,
    outcome::{AppraisedMaterial, AppraisedQuantity, CollateralDamage, ExtractionDetail},
    rng::ActionRng,
    types::Tick,
    world::{MaterialReserve, Node},
};

pub fn mode_ticks(mode: GatherMode, cfg: &GatherConfig) -> Tick {
    match mode {
        GatherMode::Appraise   => cfg.appraise_ticks,
        GatherMode::Focus      => cfg.focus_ticks,
        GatherMode::CarefulAll => cfg.careful_all_ticks,
    }
}

pub fn mode_unlocked(mode: GatherMode, level: u32, cfg: &GatherConfig) -> bool {
    cfg.unlock_level(mode).map(|l| level >= l).unwrap_or(false)
}

/// FOCUS yield as a fraction of the base amount. Rises linearly with the
/// level gap from `min_yield_pct` to 1.0 at `max_yield_level_gap`.
pub fn yield_pct(level: u32, required_level: u32, cfg: &GatherConfig) -> f64 {
    let gap = level.saturating_sub(required_level).min(cfg.max_yield_level_gap);
    let span = 1.0 - cfg.min_yield_pct;
    (cfg.min_yield_pct + span * gap as f64 / cfg.max_yield_level_gap as f64).min(1.0)
}

/// Half-width of the variance band; remoter areas are less predictable.
pub fn variance_half_width(distance: u32, cfg: &GatherConfig) -> f64 {
    let widened = cfg.variance_base + distance.saturating_sub(1) as f64 * cfg.variance_per_distance;
    widened.min(cfg.variance_cap)
}

/// Share of the extracted amount lost from each other material.
pub fn collateral_fraction(level: u32, cfg: &GatherConfig) -> f64 {
    (cfg.collateral_base - level as f64 * cfg.collateral_per_level).max(cfg.collateral_floor)
}

/// Materials CAREFUL_ALL will touch: non-empty and within the actor's level.
pub fn careful_eligible(node: &Node, level: u32) -> Vec<&MaterialReserve> {
    node.materials
        .iter()
        .filter(|m| m.remaining_units > 0 && m.required_skill_level <= level)
        .collect()
}

fn estimate_bucket(m: &MaterialReserve) -> &'static str {
    if m.max_units_initial == 0 || m.remaining_units == 0 {
        return "exhausted";
    }
    let ratio = m.remaining_units as f64 / m.max_units_initial as f64;
    if ratio > 0.66 {
        "plentiful"
    } else if ratio > 0.33 {
        "moderate"
    } else {
        "scarce"
    }
}

/// Snapshot what the actor can see, then mark the node appraised.
pub fn appraise(node: &mut Node, level: u32, cfg: &GatherConfig) -> ExtractionDetail {
    let exact = node.appraised;
    let mut materials = Vec::new();
    let mut hidden = 0;
    for m in &node.materials {
        if m.required_skill_level > level + cfg.visibility_band {
            hidden += 1;
            continue;
        }
        let quantity = if exact {
            AppraisedQuantity::Exact { remaining: m.remaining_units, max: m.max_units_initial }
        } else {
            AppraisedQuantity::Estimate { bucket: estimate_bucket(m).to_string() }
        };
        materials.push(AppraisedMaterial {
            material_id:    m.material_id.clone(),
            tier:           m.tier,
            required_level: m.required_skill_level,
            quantity,
        });
    }
    node.appraised = true;
    ExtractionDetail::Appraise { node_id: node.node_id.clone(), materials, hidden }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub detail:    ExtractionDetail,
    pub extracted: Vec<ItemStack>,
    pub xp:        u64,
}

/// FOCUS on one material. Draws exactly one variance value.
pub fn focus(
    node: &mut Node,
    material_id: &str,
    level: u32,
    distance: u32,
    ticks: Tick,
    cfg: &GatherConfig,
    rng: &mut ActionRng,
) -> SimResult<Extraction> {
    let target = node.material(material_id).ok_or_else(|| {
        SimError::InvariantViolation(format!("focus material {material_id} missing from {}", node.node_id))
    })?;
    let remaining = target.remaining_units;
    let tier = target.tier;
    if remaining == 0 {
        return Err(SimError::InvariantViolation(format!(
            "focus on empty reserve {material_id} in {}",
            node.node_id
        )));
    }

    let yield_pct = yield_pct(level, target.required_skill_level, cfg);
    let expected_units = cfg.base_extraction_units * yield_pct;
    let half = variance_half_width(distance, cfg);
    let variance = rng.draw_range(1.0 - half, 1.0 + half, "gather.focus.variance");
    let extracted = ((expected_units * variance).round() as u64).min(remaining);

    if let Some(m) = node.material_mut(material_id) {
        m.remaining_units -= extracted;
    }

    let fraction = collateral_fraction(level, cfg);
    let mut collateral = Vec::new();
    for m in node.materials.iter_mut() {
        if m.material_id == material_id || m.remaining_units == 0 {
            continue;
        }
        let units = ((extracted as f64 * fraction).round() as u64).min(m.remaining_units);
        m.remaining_units -= units;
        collateral.push(CollateralDamage { material_id: m.material_id.clone(), units });
    }
    node.refresh_depleted();

    Ok(Extraction {
        detail: ExtractionDetail::Focus {
            node_id: node.node_id.clone(),
            material_id: material_id.to_string(),
            yield_pct,
            expected_units,
            variance,
            extracted,
            collateral,
            node_depleted: node.depleted,
        },
        extracted: if extracted > 0 { vec![ItemStack::new(material_id, extracted)] } else { Vec::new() },
        xp: ticks * tier as u64,
    })
}

/// CAREFUL_ALL: a fixed amount from every eligible material. No draws.
pub fn careful_all(node: &mut Node, level: u32, ticks: Tick, cfg: &GatherConfig) -> SimResult<Extraction> {
    let mut extracted = Vec::new();
    let mut tier_sum = 0u64;
    for m in node.materials.iter_mut() {
        if m.remaining_units == 0 || m.required_skill_level > level {
            continue;
        }
        let units = cfg.careful_units.min(m.remaining_units);
        m.remaining_units -= units;
        tier_sum += m.tier as u64;
        extracted.push(ItemStack::new(m.material_id.clone(), units));
    }
    if extracted.is_empty() {
        return Err(SimError::InvariantViolation(format!(
            "careful_all on {} with nothing eligible",
            node.node_id
        )));
    }
    node.refresh_depleted();

    let xp = (ticks as f64 * tier_sum as f64 / extracted.len() as f64).round() as u64;
    Ok(Extraction {
        detail: ExtractionDetail::CarefulAll {
            node_id:       node.node_id.clone(),
            extracted:     extracted.clone(),
            node_depleted: node.depleted,
        },
        extracted,
        xp,
    })
}
