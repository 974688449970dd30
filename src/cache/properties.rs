//! Per-item memoized classification flags
//!
//! Entries are created lazily on first query and live for the session.
//! Entries for destroyed items are never cleaned up; they are harmless.

use ahash::AHashMap;

use crate::core::types::ItemId;
use crate::item::{MaterialRequirement, RepairableItem};

/// Exact condition snapshot a cached repair cost was computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConditionKey {
    pub hit_points: i32,
    pub max_hit_points: i32,
}

impl ConditionKey {
    pub fn of(item: &RepairableItem) -> Self {
        Self {
            hit_points: item.hit_points,
            max_hit_points: item.max_hit_points,
        }
    }
}

/// Repair cost valid only for one condition snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRepairCost {
    pub key: ConditionKey,
    pub materials: Vec<MaterialRequirement>,
}

/// Independently settable cached values for one item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedItemProperties {
    pub is_maintenance_only: Option<bool>,
    pub is_armor: Option<bool>,
    pub required_research: Option<Vec<String>>,
    pub repair_cost: Option<CachedRepairCost>,
}

/// Registry of cached properties keyed by item id
#[derive(Debug, Clone, Default)]
pub struct PropertyCache {
    entries: AHashMap<ItemId, CachedItemProperties>,
}

impl PropertyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ItemId) -> Option<&CachedItemProperties> {
        self.entries.get(id)
    }

    pub fn get_or_insert(&mut self, id: &ItemId) -> &mut CachedItemProperties {
        self.entries.entry(id.clone()).or_default()
    }

    /// Cached repair cost if it was computed for exactly this condition
    pub fn repair_cost(&self, id: &ItemId, key: ConditionKey) -> Option<&[MaterialRequirement]> {
        self.entries
            .get(id)
            .and_then(|props| props.repair_cost.as_ref())
            .filter(|cost| cost.key == key)
            .map(|cost| cost.materials.as_slice())
    }

    pub fn store_repair_cost(
        &mut self,
        id: &ItemId,
        key: ConditionKey,
        materials: Vec<MaterialRequirement>,
    ) {
        self.get_or_insert(id).repair_cost = Some(CachedRepairCost { key, materials });
    }

    /// Forget values derived from settings (costs and the maintenance rule)
    pub fn clear_settings_dependent(&mut self) {
        for props in self.entries.values_mut() {
            props.repair_cost = None;
            props.is_maintenance_only = None;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
