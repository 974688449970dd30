//! Repair eligibility - which items can be repaired, when, and at what cost
//!
//! Everything here is a predicate or a derived number. Results that never
//! change for an item within a session go through the [`PropertyCache`].

use crate::cache::{ConditionKey, PropertyCache};
use crate::core::config::RepairSettings;
use crate::core::error::RepairRejection;
use crate::core::types::AgentId;
use crate::item::{is_disallowed_name, ItemCategory, MaterialRequirement, RepairableItem, TechLevel};
use crate::world::reservations::{ReservationService, Target};
use crate::world::station::{RepairOrder, Workstation};

/// Repairable condition band of ordinary items
const REPAIRABLE_CONDITION_RANGE: (f32, f32) = (0.25, 1.0);

/// Repairable condition band of maintenance-only items
const MAINTENANCE_ONLY_CONDITION_RANGE: (f32, f32) = (0.75, 1.0);

/// Substrings of def names, categories and trade tags that hint at armor
const ARMOR_HINTS: &[&str] = &["Armor", "armor", "Armour", "armour"];

/// Weapon tag fragments of low-tech weapons
const MAINTENANCE_ONLY_TAG_PARTS: &[&str] = &["Neolithic", "MedievalMelee"];

/// A workstation and the order an item is checked against
#[derive(Debug, Clone, Copy)]
pub struct OrderScope<'a> {
    pub station: &'a Workstation,
    pub order: &'a RepairOrder,
}

/// Has a quality tier, is an item, and is not on the disallowed list
///
/// A repair cost of exactly one disallowed material also rules it out.
pub fn is_repairable_kind(
    item: &RepairableItem,
    settings: &RepairSettings,
    cache: &mut PropertyCache,
) -> bool {
    let cost = compute_repair_cost(item, settings, cache);
    let single_disallowed = cost.len() == 1 && is_disallowed_name(&cost[0].kind.0);

    if item.quality().is_none() || !item.def.is_allowed(item.stuff.as_ref()) || single_disallowed {
        tracing::debug!(
            "{} not allowed. has quality? {}; categories: {:?}; stuff: {:?}",
            item.def.def_name,
            item.quality().is_some(),
            item.def.thing_categories,
            item.def.stuff_categories
        );
        return false;
    }

    item.def.category == ItemCategory::Item
}

/// Low-tech melee gear that only ever needs cheap maintenance
pub fn is_maintenance_only(
    item: &RepairableItem,
    settings: &RepairSettings,
    cache: &mut PropertyCache,
) -> bool {
    if settings.maintenance_only_disabled {
        return false;
    }

    let props = cache.get_or_insert(&item.id);
    if let Some(value) = props.is_maintenance_only {
        tracing::trace!("hit cache for maintenance-only id: {}", item.id);
        return value;
    }

    let def = &item.def;
    let low_tech_weapon = def.is_melee_weapon
        || MAINTENANCE_ONLY_TAG_PARTS
            .iter()
            .any(|part| def.weapon_tags.iter().any(|tag| tag.contains(part)));
    let value = low_tech_weapon && def.tech_level < TechLevel::Industrial;

    props.is_maintenance_only = Some(value);
    value
}

fn contains_armor_hint(s: &str) -> bool {
    ARMOR_HINTS.iter().any(|hint| s.contains(hint))
}

/// Template vote on whether an item is armor
///
/// Apparel and def-name checks always count; category and trade-tag checks
/// only count when the item has any. Armor if at least half pass.
pub fn is_armor(item: &RepairableItem, cache: &mut PropertyCache) -> bool {
    let props = cache.get_or_insert(&item.id);
    if let Some(value) = props.is_armor {
        tracing::trace!("hit cache for is-armor id: {}", item.id);
        return value;
    }

    let def = &item.def;
    let mut total = 2;
    let mut passed = def.is_apparel as u32 + contains_armor_hint(&def.def_name) as u32;

    if !def.thing_categories.is_empty() {
        total += 1;
        passed += def.thing_categories.iter().any(|c| contains_armor_hint(c)) as u32;
    }
    if !def.trade_tags.is_empty() {
        total += 1;
        passed += def.trade_tags.iter().any(|t| contains_armor_hint(t)) as u32;
    }

    let value = passed as f32 / total as f32 >= 0.5;
    tracing::debug!("is {} armor? {}/{} -> {}", item.id, passed, total, value);
    props.is_armor = Some(value);
    value
}

/// Lowest hit points at which a repair may start
pub fn min_repairable_hit_points(
    item: &RepairableItem,
    settings: &RepairSettings,
    cache: &mut PropertyCache,
) -> i32 {
    let lower = if is_maintenance_only(item, settings, cache) {
        MAINTENANCE_ONLY_CONDITION_RANGE.0
    } else {
        settings.irreparable_threshold.min(REPAIRABLE_CONDITION_RANGE.1)
    };
    (lower * item.max_hit_points as f32).round_ties_even().max(0.0) as i32
}

/// Hit points a repair restores to
///
/// A positive `multiplier` replaces the upper band fraction; it is how a
/// partial success works out its restoration amount.
pub fn max_repairable_hit_points(
    item: &RepairableItem,
    settings: &RepairSettings,
    cache: &mut PropertyCache,
    multiplier: f32,
) -> i32 {
    let upper = if is_maintenance_only(item, settings, cache) {
        MAINTENANCE_ONLY_CONDITION_RANGE.1
    } else {
        REPAIRABLE_CONDITION_RANGE.1
    };
    let fraction = if multiplier > 0.0 { multiplier } else { upper };
    let hit_points = (fraction * item.max_hit_points as f32).round_ties_even() as i32;
    hit_points.min(item.max_hit_points)
}

/// Repairs for free: nearly intact, or maintenance-only within its band
pub fn can_be_maintenanced(
    item: &RepairableItem,
    settings: &RepairSettings,
    cache: &mut PropertyCache,
) -> bool {
    let max = max_repairable_hit_points(item, settings, cache, 0.0);
    if max <= 0 {
        return false;
    }
    let condition = item.hit_points as f32 / max as f32;

    condition >= settings.cost_free_threshold
        || (is_maintenance_only(item, settings, cache)
            && item.hit_points >= min_repairable_hit_points(item, settings, cache))
}

/// Materials needed to repair the item in its current condition
///
/// Each crafting cost entry scaled by the missing condition. Empty for
/// free repairs and for items with no crafting cost.
pub fn compute_repair_cost(
    item: &RepairableItem,
    settings: &RepairSettings,
    cache: &mut PropertyCache,
) -> Vec<MaterialRequirement> {
    let key = ConditionKey::of(item);
    if let Some(cost) = cache.repair_cost(&item.id, key) {
        tracing::trace!("hit cache for repair cost id: {}", item.id);
        return cost.to_vec();
    }

    let full_cost = &item.def.crafting_cost;
    let cost: Vec<MaterialRequirement> =
        if full_cost.is_empty() || can_be_maintenanced(item, settings, cache) {
            Vec::new()
        } else {
            let factor = 1.0 - item.condition();
            full_cost
                .iter()
                .filter_map(|req| {
                    let scaled = req.scaled(factor);
                    if let Some(s) = &scaled {
                        tracing::debug!(
                            "repair cost for {}: {} x{} (unrounded {})",
                            item.label(),
                            s.kind,
                            s.quantity,
                            req.quantity as f32 * factor
                        );
                    }
                    scaled
                })
                .collect()
        };

    cache.store_repair_cost(&item.id, key, cost.clone());
    cost
}

/// Research projects the item's recipes depend on
pub fn required_research(item: &RepairableItem, cache: &mut PropertyCache) -> Vec<String> {
    let props = cache.get_or_insert(&item.id);
    props
        .required_research
        .get_or_insert_with(|| item.def.required_research.clone())
        .clone()
}

/// Why `item` cannot be repaired right now, if anything
///
/// The success-chance check is separate; see
/// [`crate::repair::chance::repair_chance_allowed`].
pub fn check_repairable_now(
    item: &RepairableItem,
    agent: &AgentId,
    reservations: &impl ReservationService,
    settings: &RepairSettings,
    cache: &mut PropertyCache,
    scope: Option<OrderScope<'_>>,
) -> Result<(), RepairRejection> {
    if !item.spawned {
        return Err(RepairRejection::NotSpawned);
    }
    if item.forbidden {
        return Err(RepairRejection::Forbidden);
    }
    if item.burning {
        return Err(RepairRejection::Burning);
    }
    if item.hit_points < min_repairable_hit_points(item, settings, cache) {
        return Err(RepairRejection::TooDamaged);
    }
    if item.hit_points >= max_repairable_hit_points(item, settings, cache, 0.0) {
        return Err(RepairRejection::FullyRepaired);
    }
    if !is_repairable_kind(item, settings, cache) {
        return Err(RepairRejection::NotRepairableKind);
    }
    if !reservations.can_reserve(agent, &Target::Item(item.id.clone())) {
        return Err(RepairRejection::Reserved);
    }

    if let Some(scope) = scope {
        if !item.position.within(&scope.station.position, scope.order.search_radius) {
            return Err(RepairRejection::OutOfRadius);
        }
        if !scope.order.filter.allows(&item.def) {
            return Err(RepairRejection::FilteredOut);
        }
    }

    Ok(())
}

/// Boolean form of [`check_repairable_now`]
pub fn is_repairable_now(
    item: &RepairableItem,
    agent: &AgentId,
    reservations: &impl ReservationService,
    settings: &RepairSettings,
    cache: &mut PropertyCache,
    scope: Option<OrderScope<'_>>,
) -> bool {
    check_repairable_now(item, agent, reservations, settings, cache, scope).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Cell, ItemId};
    use crate::item::{ItemDef, StuffProps};
    use crate::world::reservations::ReservationTable;
    use crate::world::station::ItemFilter;
    use std::sync::Arc;

    fn revolver(hp: i32) -> RepairableItem {
        let def = ItemDef::new("Gun_Revolver", "revolver")
            .with_cost("Steel", 30)
            .with_cost("Components", 2);
        RepairableItem::new("Gun_Revolver1", Arc::new(def), 100).with_hit_points(hp)
    }

    fn club(hp: i32) -> RepairableItem {
        let def = ItemDef::new("MeleeWeapon_Club", "club")
            .melee()
            .with_tech_level(TechLevel::Neolithic)
            .with_cost("WoodLog", 40);
        RepairableItem::new("MeleeWeapon_Club1", Arc::new(def), 100).with_hit_points(hp)
    }

    #[test]
    fn test_repairable_kind_requires_quality() {
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();
        assert!(is_repairable_kind(&revolver(50), &settings, &mut cache));
        let plain = revolver(50).with_quality(None);
        assert!(!is_repairable_kind(&plain, &settings, &mut cache));
    }

    #[test]
    fn test_repairable_kind_rejects_buildings_and_disallowed() {
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();
        let def = ItemDef::new("Wall", "wall").with_category(ItemCategory::Building);
        let wall = RepairableItem::new("Wall1", Arc::new(def), 300);
        assert!(!is_repairable_kind(&wall, &settings, &mut cache));

        let def = ItemDef::new("Weapon_GrenadeFrag", "frag grenades").with_cost("grenades", 1);
        let nade = RepairableItem::new("Nade1", Arc::new(def), 50).with_hit_points(20);
        assert!(!is_repairable_kind(&nade, &settings, &mut cache));
    }

    #[test]
    fn test_repairable_kind_uses_current_repair_cost() {
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();

        // At 80% the single steel rounds away, leaving only grenades
        let def = ItemDef::new("Weapon_Launcher", "launcher")
            .with_cost("Grenades", 30)
            .with_cost("Steel", 1);
        let launcher = RepairableItem::new("Launcher1", Arc::new(def), 100).with_hit_points(80);
        let cost = compute_repair_cost(&launcher, &settings, &mut cache);
        assert_eq!(cost, vec![MaterialRequirement::new("Grenades", 6)]);
        assert!(!is_repairable_kind(&launcher, &settings, &mut cache));

        // Nearly intact repairs for free, so the grenade cost never applies
        let def = ItemDef::new("Weapon_GrenadeFrag", "frag grenades").with_cost("Grenades", 1);
        let nade = RepairableItem::new("Nade2", Arc::new(def), 100).with_hit_points(96);
        assert!(compute_repair_cost(&nade, &settings, &mut cache).is_empty());
        assert!(is_repairable_kind(&nade, &settings, &mut cache));
    }

    #[test]
    fn test_maintenance_only_rules() {
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();
        assert!(is_maintenance_only(&club(50), &settings, &mut cache));
        assert!(!is_maintenance_only(&revolver(50), &settings, &mut cache));

        // Tag heuristic works for non-melee weapons too
        let def = ItemDef::new("Bow_Short", "short bow")
            .with_tech_level(TechLevel::Neolithic)
            .with_weapon_tag("NeolithicRangedBasic");
        let bow = RepairableItem::new("Bow_Short1", Arc::new(def), 100);
        assert!(is_maintenance_only(&bow, &settings, &mut cache));

        // Industrial melee is not maintenance-only
        let def = ItemDef::new("MeleeWeapon_Knife", "knife").melee();
        let knife = RepairableItem::new("Knife1", Arc::new(def), 100);
        assert!(!is_maintenance_only(&knife, &settings, &mut cache));
    }

    #[test]
    fn test_maintenance_only_disabled_bypasses_cache() {
        let mut settings = RepairSettings::default();
        let mut cache = PropertyCache::new();
        let item = club(50);
        assert!(is_maintenance_only(&item, &settings, &mut cache));

        settings.maintenance_only_disabled = true;
        assert!(!is_maintenance_only(&item, &settings, &mut cache));
    }

    #[test]
    fn test_repairable_band() {
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();

        let gun = revolver(50);
        assert_eq!(min_repairable_hit_points(&gun, &settings, &mut cache), 25);
        assert_eq!(max_repairable_hit_points(&gun, &settings, &mut cache, 0.0), 100);
        assert_eq!(max_repairable_hit_points(&gun, &settings, &mut cache, 0.25), 25);

        let item = club(80);
        assert_eq!(min_repairable_hit_points(&item, &settings, &mut cache), 75);
        assert_eq!(max_repairable_hit_points(&item, &settings, &mut cache, 0.0), 100);
    }

    #[test]
    fn test_min_follows_irreparable_threshold() {
        let mut settings = RepairSettings::default();
        settings.irreparable_threshold = 0.35;
        let mut cache = PropertyCache::new();
        assert_eq!(min_repairable_hit_points(&revolver(50), &settings, &mut cache), 35);
    }

    #[test]
    fn test_can_be_maintenanced() {
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();

        assert!(can_be_maintenanced(&revolver(96), &settings, &mut cache));
        assert!(!can_be_maintenanced(&revolver(50), &settings, &mut cache));

        // Maintenance-only at 80% with cost-free threshold 0.95
        let item = club(80);
        assert!(can_be_maintenanced(&item, &settings, &mut cache));
        assert!(compute_repair_cost(&item, &settings, &mut cache).is_empty());
    }

    #[test]
    fn test_compute_repair_cost_scales_and_drops_zero() {
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();
        // 30 * 0.6 = 18, 2 * 0.6 = 1.2 -> 1
        let cost = compute_repair_cost(&revolver(40), &settings, &mut cache);
        assert_eq!(
            cost,
            vec![
                MaterialRequirement::new("Steel", 18),
                MaterialRequirement::new("Components", 1)
            ]
        );

        // 2 * 0.2 = 0.4 -> dropped
        let cost = compute_repair_cost(&revolver(80), &settings, &mut cache);
        assert_eq!(cost, vec![MaterialRequirement::new("Steel", 6)]);
    }

    #[test]
    fn test_compute_repair_cost_is_cached_per_condition() {
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();
        let mut item = revolver(50);

        let first = compute_repair_cost(&item, &settings, &mut cache);
        let second = compute_repair_cost(&item, &settings, &mut cache);
        assert_eq!(first, second);

        item.hit_points = 90;
        let third = compute_repair_cost(&item, &settings, &mut cache);
        assert_ne!(first, third);
    }

    #[test]
    fn test_is_armor_vote() {
        let mut cache = PropertyCache::new();
        let def = ItemDef::new("Apparel_FlakVest", "flak vest")
            .apparel()
            .with_thing_category("ApparelArmor")
            .with_trade_tag("Armor");
        let vest = RepairableItem::new("Vest1", Arc::new(def), 200);
        assert!(is_armor(&vest, &mut cache));

        // Apparel alone is 1 of 2 checks
        let def = ItemDef::new("Apparel_Parka", "parka").apparel();
        let parka = RepairableItem::new("Parka1", Arc::new(def), 100);
        assert!(is_armor(&parka, &mut cache));

        // Apparel with a non-armor category is 1 of 3 checks
        let def = ItemDef::new("Apparel_Pants", "pants")
            .apparel()
            .with_thing_category("Clothing");
        let pants = RepairableItem::new("Pants1", Arc::new(def), 100);
        assert!(!is_armor(&pants, &mut cache));
    }

    #[test]
    fn test_check_repairable_now_reasons() {
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();
        let mut reservations = ReservationTable::new();
        let agent = AgentId::new("ada");

        let check = |item: &RepairableItem, res: &ReservationTable, cache: &mut PropertyCache| {
            check_repairable_now(item, &agent, res, &settings, cache, None)
        };

        assert_eq!(check(&revolver(50), &reservations, &mut cache), Ok(()));
        assert_eq!(check(&revolver(10), &reservations, &mut cache), Err(RepairRejection::TooDamaged));
        assert_eq!(check(&revolver(100), &reservations, &mut cache), Err(RepairRejection::FullyRepaired));

        let mut burning = revolver(50);
        burning.burning = true;
        assert_eq!(check(&burning, &reservations, &mut cache), Err(RepairRejection::Burning));

        reservations.reserve(&AgentId::new("ben"), Target::Item(ItemId::new("Gun_Revolver1")));
        assert_eq!(check(&revolver(50), &reservations, &mut cache), Err(RepairRejection::Reserved));
    }

    #[test]
    fn test_check_repairable_now_with_order_scope() {
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();
        let reservations = ReservationTable::new();
        let agent = AgentId::new("ada");
        let station = Workstation::new("bench", Cell::new(0, 0));

        let order = RepairOrder::new(1).with_radius(5.0);
        let scope = Some(OrderScope { station: &station, order: &order });
        let far = revolver(50).at(Cell::new(10, 0));
        assert_eq!(
            check_repairable_now(&far, &agent, &reservations, &settings, &mut cache, scope),
            Err(RepairRejection::OutOfRadius)
        );

        let order = RepairOrder::new(1).with_filter(ItemFilter::only(["MeleeWeapon_Club"]));
        let scope = Some(OrderScope { station: &station, order: &order });
        let near = revolver(50).at(Cell::new(1, 0));
        assert_eq!(
            check_repairable_now(&near, &agent, &reservations, &settings, &mut cache, scope),
            Err(RepairRejection::FilteredOut)
        );
    }

    #[test]
    fn test_stuff_disallowed_is_not_repairable() {
        let mut stuff = StuffProps::new("Explosive", 1.0);
        stuff.categories.push("Grenades".into());
        let item = revolver(50).with_stuff(stuff);
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();
        assert!(!is_repairable_kind(&item, &settings, &mut cache));
    }
}
