//! Quality degradation ledger
//!
//! Every successful repair eats into an item's remaining quality budget.
//! When the budget runs out the item drops one quality tier and the
//! budget resets to full.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::config::RepairSettings;
use crate::core::types::ItemId;
use crate::item::{QualityTier, RepairableItem};

/// Remaining budget of an item with no pending degradation
pub const FULL: f32 = 1.0;

/// What an update did to the item
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DegradationUpdate {
    /// Item has no quality tier
    NoQuality,
    /// Rate or recovered amount is zero
    NoChange,
    /// Budget reduced, tier unchanged
    Accumulated { previous: f32, current: f32 },
    /// Budget exhausted, item dropped one tier
    Demoted { from: QualityTier, to: QualityTier },
    /// Budget exhausted but the tier could not be lowered
    DemotionSkipped { quality: QualityTier },
}

/// Persisted item id -> remaining degradation budget in (0, 1]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DegradationLedger {
    entries: AHashMap<ItemId, f32>,
}

impl DegradationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored budget, or [`FULL`] when nothing is recorded
    ///
    /// Non-positive stored values also read as full.
    pub fn get(&self, id: &ItemId) -> f32 {
        normalize(self.entries.get(id).copied())
    }

    /// Record `recovered_fraction` of condition restored on `item`
    pub fn update(
        &mut self,
        item: &mut RepairableItem,
        recovered_fraction: f32,
        settings: &RepairSettings,
    ) -> DegradationUpdate {
        let Some(quality) = item.quality() else {
            tracing::debug!("no quality found for {}", item.id);
            return DegradationUpdate::NoQuality;
        };

        let rate = if quality.is_top_tier() {
            settings.master_quality_degradation
        } else {
            settings.generic_quality_degradation
        };
        let degradation = recovered_fraction * rate;

        if degradation == 0.0 {
            tracing::debug!("no degradation on {}, rate {}", item.id, rate);
            return DegradationUpdate::NoChange;
        }

        let previous = self.get(&item.id);
        let remaining = previous - degradation;

        let update = if remaining <= 0.0 {
            self.entries.insert(item.id.clone(), FULL);
            demote(item, quality)
        } else {
            self.entries.insert(item.id.clone(), remaining);
            DegradationUpdate::Accumulated {
                previous,
                current: remaining,
            }
        };

        tracing::debug!(
            "'{}' degradation {} -> {} (change {})",
            item.id,
            previous,
            self.get(&item.id),
            degradation
        );
        update
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, f32)> {
        self.entries.iter().map(|(id, v)| (id, *v))
    }

    /// Restore a raw entry (used when loading a save)
    pub fn insert_raw(&mut self, id: ItemId, value: f32) {
        self.entries.insert(id, value);
    }
}

fn normalize(value: Option<f32>) -> f32 {
    match value {
        Some(v) if v > 0.0 => v,
        _ => FULL,
    }
}

/// Lower quality by one tier, best effort
fn demote(item: &mut RepairableItem, quality: QualityTier) -> DegradationUpdate {
    let Some(lower) = quality.demoted() else {
        tracing::debug!(
            "'{}' degraded but quality is already at lowest value '{}'",
            item.id,
            quality.label()
        );
        return DegradationUpdate::DemotionSkipped { quality };
    };

    if item.set_quality(lower) == Some(lower) {
        tracing::info!("{} quality degraded to {}", item.label(), lower.label());
        DegradationUpdate::Demoted {
            from: quality,
            to: lower,
        }
    } else {
        tracing::warn!(
            "'{}' quality should have degraded, but the item did not update",
            item.id
        );
        DegradationUpdate::DemotionSkipped { quality }
    }
}
