//! Adjusted repair success chance
//!
//! chance = agent repair stat
//!        x condition
//!        x quality multiplier
//!        x research multiplier
//!        x tech-level multiplier
//!        x settings multiplier

use ahash::AHashSet;

use crate::cache::PropertyCache;
use crate::core::config::RepairSettings;
use crate::item::{RepairableItem, TechLevel};
use crate::repair::eligibility::{can_be_maintenanced, required_research};
use crate::world::agent::Agent;

/// Penalty for unresearched or uncraftable items
const RESEARCH_PENALTY: f32 = 0.5;

fn quality_multiplier(item: &RepairableItem) -> f32 {
    item.quality().map_or(1.0, |q| q.repair_chance_multiplier())
}

fn research_multiplier(
    item: &RepairableItem,
    cache: &mut PropertyCache,
    researched: &AHashSet<String>,
) -> f32 {
    let required = required_research(item, cache);
    let mut multiplier = 1.0;

    if required.iter().any(|project| !researched.contains(project)) {
        multiplier = RESEARCH_PENALTY;
    }

    // Uncraftable items carry the penalty too
    let def = &item.def;
    if def.recipe_work.is_empty() && required.is_empty() && !def.has_recipe_users {
        multiplier = RESEARCH_PENALTY;
    }

    multiplier
}

/// Penalty for repairing gear above the agent's faction tech
pub fn tech_level_multiplier(item_tech: TechLevel, faction_tech: TechLevel) -> f32 {
    match item_tech.gap_over(faction_tech) {
        gap if gap <= 0 => 1.0,
        1 => 0.5,
        _ => 0.1,
    }
}

/// Probability that `agent` repairs `item` successfully
pub fn adjusted_repair_chance(
    agent: &Agent,
    item: &RepairableItem,
    settings: &RepairSettings,
    cache: &mut PropertyCache,
    researched: &AHashSet<String>,
) -> f32 {
    let base = agent.repair_success;
    let condition = item.condition().min(1.0);
    let quality = quality_multiplier(item);
    let mut research = research_multiplier(item, cache, researched);
    let mut tech = tech_level_multiplier(item.def.tech_level, agent.faction_tech);

    // Researched gear carries no tech penalty
    if research >= 1.0 {
        tech = 1.0;
    }
    // Simple maintenance needs no research
    if can_be_maintenanced(item, settings, cache) {
        research = 1.0;
    }

    let chance = base * condition * quality * research * tech * settings.repair_chance_multiplier;
    tracing::debug!(
        "repair chance for {} = {} * {} * {} * {} * {} * {} = {}",
        item.id,
        base,
        condition,
        quality,
        research,
        tech,
        settings.repair_chance_multiplier,
        chance
    );
    chance
}

/// Whole-percent form of a chance
pub fn chance_to_display(chance: f32) -> i32 {
    (chance * 100.0).round_ties_even() as i32
}

/// Whether the chance clears the configured minimum
pub fn repair_chance_allowed(
    agent: &Agent,
    item: &RepairableItem,
    settings: &RepairSettings,
    cache: &mut PropertyCache,
    researched: &AHashSet<String>,
) -> bool {
    adjusted_repair_chance(agent, item, settings, cache, researched) >= settings.minimum_repair_chance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Cell;
    use crate::item::{ItemDef, QualityTier};
    use std::sync::Arc;

    fn agent(stat: f32) -> Agent {
        Agent::new("ada", "Ada", Cell::new(0, 0)).with_repair_success(stat)
    }

    fn craftable(quality: QualityTier, hp: i32) -> RepairableItem {
        let def = ItemDef::new("Gun_Revolver", "revolver")
            .with_cost("Steel", 30)
            .with_recipe_maker_work(1200.0);
        RepairableItem::new("Gun_Revolver1", Arc::new(def), 100)
            .with_hit_points(hp)
            .with_quality(Some(quality))
    }

    #[test]
    fn test_basic_chance() {
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();
        let researched = AHashSet::new();
        // 0.8 * 0.5 * 1.0 (Excellent)
        let chance = adjusted_repair_chance(
            &agent(0.8),
            &craftable(QualityTier::Excellent, 50),
            &settings,
            &mut cache,
            &researched,
        );
        assert!((chance - 0.4).abs() < 1e-5);
        assert_eq!(chance_to_display(chance), 40);
    }

    #[test]
    fn test_quality_multiplier_applies() {
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();
        let researched = AHashSet::new();
        let awful = adjusted_repair_chance(
            &agent(0.5),
            &craftable(QualityTier::Awful, 50),
            &settings,
            &mut cache,
            &researched,
        );
        assert!((awful - 0.45).abs() < 1e-5);
    }

    #[test]
    fn test_unfinished_research_halves_chance() {
        let settings = RepairSettings::default();
        let researched = AHashSet::new();
        let def = ItemDef::new("Gun_Autopistol", "autopistol")
            .with_cost("Steel", 30)
            .with_recipe_maker_work(1200.0)
            .with_research("Gunsmithing");
        let item = RepairableItem::new("Gun_Autopistol1", Arc::new(def), 100)
            .with_hit_points(50)
            .with_quality(Some(QualityTier::Excellent));

        let mut cache = PropertyCache::new();
        let chance = adjusted_repair_chance(&agent(1.0), &item, &settings, &mut cache, &researched);
        assert!((chance - 0.25).abs() < 1e-5);

        let mut researched = AHashSet::new();
        researched.insert("Gunsmithing".to_string());
        let chance = adjusted_repair_chance(&agent(1.0), &item, &settings, &mut cache, &researched);
        assert!((chance - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_uncraftable_item_penalized() {
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();
        let researched = AHashSet::new();
        let def = ItemDef::new("Gun_ChargeRifle", "charge rifle").with_cost("Plasteel", 50);
        let item = RepairableItem::new("Gun_ChargeRifle1", Arc::new(def), 100)
            .with_hit_points(50)
            .with_quality(Some(QualityTier::Excellent));

        let chance = adjusted_repair_chance(&agent(1.0), &item, &settings, &mut cache, &researched);
        assert!((chance - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_tech_penalty_only_without_research() {
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();
        let researched = AHashSet::new();
        let def = ItemDef::new("Gun_ChargeRifle", "charge rifle")
            .with_tech_level(TechLevel::Spacer)
            .with_cost("Plasteel", 50);
        let item = RepairableItem::new("Gun_ChargeRifle1", Arc::new(def), 100)
            .with_hit_points(50)
            .with_quality(Some(QualityTier::Excellent));

        // 1.0 * 0.5 * 1.0 * 0.5 (uncraftable) * 0.5 (one tier above)
        let chance = adjusted_repair_chance(&agent(1.0), &item, &settings, &mut cache, &researched);
        assert!((chance - 0.125).abs() < 1e-5);
    }

    #[test]
    fn test_maintenance_ignores_research() {
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();
        let researched = AHashSet::new();
        let def = ItemDef::new("Gun_ChargeRifle", "charge rifle").with_cost("Plasteel", 50);
        let item = RepairableItem::new("Gun_ChargeRifle1", Arc::new(def), 100)
            .with_hit_points(96)
            .with_quality(Some(QualityTier::Excellent));

        let chance = adjusted_repair_chance(&agent(1.0), &item, &settings, &mut cache, &researched);
        assert!((chance - 0.96).abs() < 1e-5);
    }

    #[test]
    fn test_tech_level_multiplier() {
        assert_eq!(tech_level_multiplier(TechLevel::Medieval, TechLevel::Industrial), 1.0);
        assert_eq!(tech_level_multiplier(TechLevel::Spacer, TechLevel::Industrial), 0.5);
        assert_eq!(tech_level_multiplier(TechLevel::Archotech, TechLevel::Industrial), 0.1);
    }

    #[test]
    fn test_repair_chance_allowed() {
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();
        let researched = AHashSet::new();
        let item = craftable(QualityTier::Excellent, 50);
        assert!(repair_chance_allowed(&agent(0.5), &item, &settings, &mut cache, &researched));
        // 0.15 * 0.5 = 0.075 < 0.1
        assert!(!repair_chance_allowed(&agent(0.15), &item, &settings, &mut cache, &researched));
    }
}
