//! Probabilistic repair outcome
//!
//! A success chance `p` splits [0, 1) into five contiguous ranges:
//!
//! ```text
//! 0        f        2f     1-p                 1-p+3p/4          1
//! | hard   | soft   | waste |  partial success  |     success     |
//! ```
//!
//! where `f = max(1 - p, 0) / 3`. One uniform draw picks the outcome.

use serde::{Deserialize, Serialize};

use crate::cache::PropertyCache;
use crate::core::config::RepairSettings;
use crate::core::types::Cell;
use crate::item::{MaterialRequirement, RepairableItem};
use crate::ledger::{DegradationLedger, DegradationUpdate};
use crate::repair::eligibility::{is_armor, max_repairable_hit_points};
use crate::world::map::RepairMap;

/// Hit point loss on a soft failure, as a fraction of max hit points
const FAIL_SOFT_DAMAGE: f32 = 0.05;

/// Hit point loss on a hard failure
const FAIL_HARD_DAMAGE: f32 = 0.1;

/// Share of the materials a failed attempt still uses up
const FAILURE_CONSUMPTION: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RollResult {
    /// Not rolled yet
    #[default]
    None,
    FailHard,
    FailSoft,
    FailNoCost,
    PartialSuccess,
    Success,
}

impl RollResult {
    pub fn is_success(self) -> bool {
        matches!(self, RollResult::Success | RollResult::PartialSuccess)
    }

    /// Failures that end the work on the spot
    pub fn ends_work_early(self) -> bool {
        matches!(self, RollResult::FailSoft | RollResult::FailHard)
    }
}

/// Half-open `[lo, hi)` interval
pub type Range = (f32, f32);

fn in_range(value: f32, (lo, hi): Range) -> bool {
    lo <= value && value < hi
}

/// The five outcome ranges for one success chance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeRanges {
    /// Width of each failure range
    pub fail_part: f32,
    pub fail_hard: Range,
    pub fail_soft: Range,
    pub fail_no_cost: Range,
    pub partial_success: Range,
    pub success: Range,
}

impl OutcomeRanges {
    pub fn new(chance: f32) -> Self {
        let fail_part = (1.0 - chance).max(0.0) / 3.0;
        let min_partial = 1.0 - chance;
        let min_full = min_partial + 3.0 * chance / 4.0;

        Self {
            fail_part,
            fail_hard: (0.0, fail_part),
            fail_soft: (fail_part, fail_part * 2.0),
            fail_no_cost: (fail_part * 2.0, (fail_part * 3.0).min(min_partial)),
            partial_success: (min_partial, min_full),
            success: (min_full, 1.0),
        }
    }

    /// Outcome for a draw in [0, 1)
    ///
    /// Checked success first; anything that lands in no range counts as a
    /// wasted attempt. A chance of 1 or more always succeeds.
    pub fn classify(&self, roll: f32) -> RollResult {
        if self.fail_part <= 0.0 || in_range(roll, self.success) {
            RollResult::Success
        } else if in_range(roll, self.partial_success) {
            RollResult::PartialSuccess
        } else if in_range(roll, self.fail_soft) {
            RollResult::FailSoft
        } else if in_range(roll, self.fail_hard) {
            RollResult::FailHard
        } else {
            RollResult::FailNoCost
        }
    }

    /// All ranges in ascending order
    pub fn all(&self) -> [(RollResult, Range); 5] {
        [
            (RollResult::FailHard, self.fail_hard),
            (RollResult::FailSoft, self.fail_soft),
            (RollResult::FailNoCost, self.fail_no_cost),
            (RollResult::PartialSuccess, self.partial_success),
            (RollResult::Success, self.success),
        ]
    }
}

/// Short text shown over the item when the work finishes
pub fn result_label(result: RollResult, chance_display: i32) -> String {
    match result {
        RollResult::Success => format!("Repaired ({}%)", chance_display),
        RollResult::PartialSuccess => format!("Partially repaired ({}%)", chance_display),
        RollResult::FailNoCost => format!("Repair wasted ({}%)", chance_display),
        RollResult::FailSoft | RollResult::FailHard | RollResult::None => {
            format!("Repair failed ({}%)", chance_display)
        }
    }
}

/// What applying an outcome did to the item
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedOutcome {
    pub result: RollResult,
    pub hit_points_before: i32,
    pub hit_points_after: i32,
    /// Fraction of the material snapshot to consume, if any
    pub consume: Option<f32>,
    pub degradation: Option<DegradationUpdate>,
    pub taint_removed: bool,
    /// Whether the success experience bonus is due
    pub skill_bonus: bool,
}

/// Clear the corpse taint on armor, unless disabled
pub fn remove_armor_taint(
    item: &mut RepairableItem,
    settings: &RepairSettings,
    cache: &mut PropertyCache,
) -> bool {
    if settings.taint_removal_disabled || !item.def.is_apparel || !item.is_tainted() {
        return false;
    }
    if !is_armor(item, cache) {
        return false;
    }
    item.set_tainted(false);
    true
}

/// Apply a rolled outcome to the item
///
/// Material consumption is reported back rather than performed, since the
/// materials live on the map.
pub fn apply_outcome(
    result: RollResult,
    item: &mut RepairableItem,
    settings: &RepairSettings,
    cache: &mut PropertyCache,
    ledger: &mut DegradationLedger,
) -> AppliedOutcome {
    let before = item.hit_points;
    let mut applied = AppliedOutcome {
        result,
        hit_points_before: before,
        hit_points_after: before,
        consume: None,
        degradation: None,
        taint_removed: false,
        skill_bonus: false,
    };

    match result {
        RollResult::Success => {
            let max = max_repairable_hit_points(item, settings, cache, 0.0);
            let recovered = (max - item.hit_points) as f32 / max as f32;
            applied.degradation = Some(ledger.update(item, recovered, settings));
            item.hit_points = max;
            applied.consume = Some(1.0);
            applied.taint_removed = remove_armor_taint(item, settings, cache);
            applied.skill_bonus = true;
        }
        RollResult::PartialSuccess => {
            let max = max_repairable_hit_points(item, settings, cache, 0.0);
            let step = max_repairable_hit_points(
                item,
                settings,
                cache,
                settings.partial_success_repair_amount,
            );
            let restored = step.min(max - item.hit_points);
            let recovered = restored as f32 / max as f32;
            applied.degradation = Some(ledger.update(item, recovered, settings));
            item.hit_points += restored;
            applied.consume = Some(1.0);
            applied.taint_removed = remove_armor_taint(item, settings, cache);
        }
        RollResult::FailSoft | RollResult::FailHard => {
            let damage = if result == RollResult::FailSoft {
                FAIL_SOFT_DAMAGE
            } else {
                FAIL_HARD_DAMAGE
            };
            let loss = (damage * item.max_hit_points as f32).ceil() as i32;
            item.hit_points = (item.hit_points - loss).max(0);
            applied.consume = Some(FAILURE_CONSUMPTION);
        }
        RollResult::FailNoCost => {
            tracing::debug!("repair of {} wasted", item.id);
        }
        RollResult::None => {
            tracing::warn!("applying outcome to {} before any roll", item.id);
        }
    }

    applied.hit_points_after = item.hit_points;
    tracing::debug!(
        "{:?} on {}: {} -> {} hp",
        result,
        item.id,
        applied.hit_points_before,
        applied.hit_points_after
    );
    applied
}

/// Use up materials lying on `cells`
///
/// Every stack whose kind is in `snapshot` loses `round(count * amount)`;
/// emptied stacks are removed. `amount` outside [0, 1] is treated as 1.
/// Returns the number of units consumed.
pub fn consume_materials(
    map: &mut RepairMap,
    cells: &[Cell],
    snapshot: &[MaterialRequirement],
    amount: f32,
) -> u32 {
    let amount = if (0.0..=1.0).contains(&amount) {
        amount
    } else {
        tracing::debug!("asked to consume {} of the materials, normalizing to 1", amount);
        1.0
    };

    let targets: Vec<_> = map
        .stacks
        .values()
        .filter(|s| {
            s.spawned && cells.contains(&s.position) && snapshot.iter().any(|req| req.kind == s.kind)
        })
        .map(|s| s.id.clone())
        .collect();

    let mut consumed = 0;
    for id in targets {
        let Some(stack) = map.stacks.get_mut(&id) else {
            continue;
        };
        let remove = (stack.count as f32 * amount).round_ties_even() as u32;
        if remove >= stack.count {
            consumed += stack.count;
            map.stacks.remove(&id);
        } else {
            consumed += remove;
            stack.count -= remove;
        }
    }
    consumed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ItemId;
    use crate::item::{ItemDef, MaterialStack, QualityTier};
    use crate::spatial::RegionGraph;
    use std::sync::Arc;

    fn revolver(hp: i32) -> RepairableItem {
        let def = ItemDef::new("Gun_Revolver", "revolver").with_cost("Steel", 30);
        RepairableItem::new("Gun_Revolver1", Arc::new(def), 100)
            .with_hit_points(hp)
            .with_quality(Some(QualityTier::Good))
    }

    #[test]
    fn test_ranges_for_half_chance() {
        let ranges = OutcomeRanges::new(0.5);
        let f = 0.5 / 3.0;
        assert!((ranges.fail_part - f).abs() < 1e-6);
        assert!((ranges.partial_success.0 - 0.5).abs() < 1e-6);
        assert!((ranges.success.0 - 0.875).abs() < 1e-6);

        assert_eq!(ranges.classify(0.0), RollResult::FailHard);
        assert_eq!(ranges.classify(0.2), RollResult::FailSoft);
        assert_eq!(ranges.classify(0.4), RollResult::FailNoCost);
        assert_eq!(ranges.classify(0.6), RollResult::PartialSuccess);
        assert_eq!(ranges.classify(0.9), RollResult::Success);
    }

    #[test]
    fn test_certain_chance_always_succeeds() {
        let ranges = OutcomeRanges::new(1.2);
        assert_eq!(ranges.fail_part, 0.0);
        assert_eq!(ranges.classify(0.0), RollResult::Success);
        assert_eq!(ranges.classify(0.5), RollResult::Success);
    }

    #[test]
    fn test_zero_chance_never_succeeds() {
        let ranges = OutcomeRanges::new(0.0);
        for roll in [0.0, 0.3, 0.5, 0.8, 0.999] {
            assert!(!ranges.classify(roll).is_success());
        }
    }

    #[test]
    fn test_apply_success() {
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();
        let mut ledger = DegradationLedger::new();
        let mut item = revolver(50);

        let applied = apply_outcome(RollResult::Success, &mut item, &settings, &mut cache, &mut ledger);

        assert_eq!(item.hit_points, 100);
        assert_eq!(applied.consume, Some(1.0));
        assert!(applied.skill_bonus);
        // 0.5 recovered * 0.5 generic rate
        assert!((ledger.get(&item.id) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_apply_partial_caps_at_deficit() {
        let settings = RepairSettings::default(); // partial amount 0.25
        let mut cache = PropertyCache::new();
        let mut ledger = DegradationLedger::new();

        let mut item = revolver(50);
        apply_outcome(RollResult::PartialSuccess, &mut item, &settings, &mut cache, &mut ledger);
        assert_eq!(item.hit_points, 75);

        let mut item = revolver(90);
        let applied =
            apply_outcome(RollResult::PartialSuccess, &mut item, &settings, &mut cache, &mut ledger);
        assert_eq!(item.hit_points, 100);
        assert!(!applied.skill_bonus);
    }

    #[test]
    fn test_apply_failures_damage_item() {
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();
        let mut ledger = DegradationLedger::new();

        let mut item = revolver(50);
        let applied = apply_outcome(RollResult::FailSoft, &mut item, &settings, &mut cache, &mut ledger);
        assert_eq!(item.hit_points, 45);
        assert_eq!(applied.consume, Some(0.5));

        let mut item = revolver(50);
        apply_outcome(RollResult::FailHard, &mut item, &settings, &mut cache, &mut ledger);
        assert_eq!(item.hit_points, 40);

        let mut item = revolver(5);
        apply_outcome(RollResult::FailHard, &mut item, &settings, &mut cache, &mut ledger);
        assert_eq!(item.hit_points, 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_apply_no_cost_changes_nothing() {
        let settings = RepairSettings::default();
        let mut cache = PropertyCache::new();
        let mut ledger = DegradationLedger::new();
        let mut item = revolver(50);

        let applied = apply_outcome(RollResult::FailNoCost, &mut item, &settings, &mut cache, &mut ledger);

        assert_eq!(item.hit_points, 50);
        assert!(applied.consume.is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_success_removes_armor_taint() {
        let mut settings = RepairSettings::default();
        let mut cache = PropertyCache::new();
        let mut ledger = DegradationLedger::new();
        let def = ItemDef::new("Apparel_FlakVest", "flak vest")
            .apparel()
            .with_thing_category("ApparelArmor");
        let vest = RepairableItem::new("Vest1", Arc::new(def), 100)
            .with_hit_points(50)
            .tainted();

        let mut item = vest.clone();
        let applied = apply_outcome(RollResult::Success, &mut item, &settings, &mut cache, &mut ledger);
        assert!(applied.taint_removed);
        assert!(!item.is_tainted());

        settings.taint_removal_disabled = true;
        let mut item = vest;
        apply_outcome(RollResult::Success, &mut item, &settings, &mut cache, &mut ledger);
        assert!(item.is_tainted());
    }

    #[test]
    fn test_consume_materials() {
        let mut regions = RegionGraph::new();
        regions.add_region(Cell::new(0, 0), Cell::new(9, 9));
        let mut map = RepairMap::new(regions);
        let bench = Cell::new(5, 5);
        map.add_stack(MaterialStack::new("Steel", 15, bench).with_id("Steel1"));
        map.add_stack(MaterialStack::new("Cloth", 4, bench).with_id("Cloth1"));
        map.add_stack(MaterialStack::new("Steel", 20, Cell::new(1, 1)).with_id("Steel2"));
        let snapshot = vec![MaterialRequirement::new("Steel", 15)];

        // 15 * 0.5 = 7.5 -> 8
        let used = consume_materials(&mut map, &[bench], &snapshot, 0.5);
        assert_eq!(used, 8);
        assert_eq!(map.stack(&ItemId::new("Steel1")).map(|s| s.count), Some(7));

        // Out-of-range amount consumes everything
        consume_materials(&mut map, &[bench], &snapshot, 3.0);
        assert!(map.stack(&ItemId::new("Steel1")).is_none());
        assert_eq!(map.stack(&ItemId::new("Cloth1")).map(|s| s.count), Some(4));
        assert_eq!(map.stack(&ItemId::new("Steel2")).map(|s| s.count), Some(20));
    }
}
