//! Ingredient allocation
//!
//! Breadth-first search outward from a workstation for material stacks,
//! with a greedy no-mix match after every region: a requirement for one
//! material kind is only ever filled from stacks of exactly that kind.

use ahash::{AHashMap, AHashSet};

use crate::cache::PropertyCache;
use crate::core::config::RepairSettings;
use crate::core::error::RepairRejection;
use crate::core::types::{Cell, ItemId, MaterialKind};
use crate::item::{describe_materials, MaterialRequirement, MaterialStack, RepairableItem};
use crate::repair::chance::repair_chance_allowed;
use crate::repair::eligibility::{compute_repair_cost, is_repairable_now, OrderScope};
use crate::spatial::MAX_REGIONS_TO_SEARCH;
use crate::world::agent::Agent;
use crate::world::map::RepairMap;
use crate::world::reservations::{ReservationService, Target};
use crate::world::station::{RepairOrder, Workstation};

/// A concrete thing and how many of it to use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThingCount {
    pub id: ItemId,
    pub count: u32,
}

/// A stack that passed the validator, in search order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: ItemId,
    pub kind: MaterialKind,
    pub count: u32,
}

impl From<&MaterialStack> for Candidate {
    fn from(stack: &MaterialStack) -> Self {
        Self {
            id: stack.id.clone(),
            kind: stack.kind.clone(),
            count: stack.count,
        }
    }
}

/// Everything a repair task hauls: the item first, then its materials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub entries: Vec<ThingCount>,
}

impl Allocation {
    fn item_only(item: &ItemId) -> Self {
        Self {
            entries: vec![ThingCount {
                id: item.clone(),
                count: 1,
            }],
        }
    }

    pub fn item(&self) -> Option<&ItemId> {
        self.entries.first().map(|e| &e.id)
    }

    pub fn materials(&self) -> &[ThingCount] {
        self.entries.get(1..).unwrap_or(&[])
    }

    /// No materials needed
    pub fn is_free(&self) -> bool {
        self.materials().is_empty()
    }
}

/// Greedy match of `needs` against `pool` without substitution
///
/// Nearest stacks (earliest in the pool) are used first. A stack serves at
/// most one requirement. `None` if any requirement cannot be met.
pub fn match_no_mix(pool: &[Candidate], needs: &[MaterialRequirement]) -> Option<Vec<ThingCount>> {
    let mut available: AHashMap<&MaterialKind, u32> = AHashMap::new();
    for candidate in pool {
        *available.entry(&candidate.kind).or_insert(0) += candidate.count;
    }

    let mut assigned: AHashSet<&ItemId> = AHashSet::new();
    let mut found = Vec::new();

    for need in needs {
        let on_hand = available.get(&need.kind).copied().unwrap_or(0);
        if on_hand < need.quantity {
            return None;
        }

        let mut remaining = need.quantity;
        for candidate in pool {
            if remaining == 0 {
                break;
            }
            if candidate.kind != need.kind || assigned.contains(&candidate.id) {
                continue;
            }
            let take = remaining.min(candidate.count);
            found.push(ThingCount {
                id: candidate.id.clone(),
                count: take,
            });
            remaining -= take;
            assigned.insert(&candidate.id);
        }

        if remaining > 0 {
            return None;
        }
        available.insert(&need.kind, on_hand - need.quantity);
    }

    Some(found)
}

fn within_search_radius(cell: &Cell, center: &Cell, radius: f32) -> bool {
    (cell.distance_squared(center) as f64) < (radius as f64).powi(2)
}

/// Find materials for repairing `item` at `station`
///
/// Distinguishes an item with no cost data at all (rejected) from a
/// genuinely free repair (item-only allocation).
pub fn find_ingredients(
    map: &RepairMap,
    agent: &Agent,
    station: &Workstation,
    order: Option<&RepairOrder>,
    item: &RepairableItem,
    settings: &RepairSettings,
    cache: &mut PropertyCache,
) -> Result<Allocation, RepairRejection> {
    let needs = compute_repair_cost(item, settings, cache);
    if needs.is_empty() {
        if item.def.crafting_cost.is_empty() {
            tracing::debug!("{} has no crafting cost, not a free repair", item.id);
            return Err(RepairRejection::NoCostData);
        }
        tracing::debug!("{} repairs for free", item.id);
        return Ok(Allocation::item_only(&item.id));
    }

    let Some(root) = map.regions.region_at(&station.interaction_cell) else {
        return Err(RepairRejection::NoPath);
    };

    let valid = |stack: &MaterialStack| {
        if !stack.spawned
            || stack.forbidden
            || order.is_some_and(|o| !within_search_radius(&stack.position, &station.position, o.search_radius))
            || !needs.iter().any(|need| need.kind == stack.kind)
            || !map
                .reservations
                .can_reserve(&agent.id, &Target::Item(stack.id.clone()))
        {
            return false;
        }
        order.is_some_and(|o| !o.check_socially_proper) || stack.socially_proper
    };

    let mut pool: Vec<Candidate> = Vec::new();
    let mut found: Option<Vec<ThingCount>> = None;

    map.regions.breadth_first_traverse(
        root,
        |_, to| to.allows(&agent.id),
        |region| {
            let mut fresh: Vec<&MaterialStack> = map
                .stacks_in_region(region.id)
                .into_iter()
                .filter(|s| valid(*s))
                .collect();
            if fresh.is_empty() {
                return false;
            }
            fresh.sort_by(|a, b| {
                a.position
                    .distance_squared(&agent.position)
                    .cmp(&b.position.distance_squared(&agent.position))
                    .then_with(|| a.id.cmp(&b.id))
            });
            pool.extend(fresh.into_iter().map(Candidate::from));

            found = match_no_mix(&pool, &needs);
            found.is_some()
        },
        MAX_REGIONS_TO_SEARCH,
    );

    match found {
        Some(materials) => {
            let mut allocation = Allocation::item_only(&item.id);
            allocation
                .entries
                .extend(materials.into_iter().filter(|m| m.count > 0));
            tracing::debug!(
                "found ingredients for {}: {} stacks",
                item.id,
                allocation.materials().len()
            );
            Ok(allocation)
        }
        None => {
            tracing::debug!(
                "missing ingredients for {}: {}",
                item.id,
                describe_materials(&needs)
            );
            Err(RepairRejection::MissingMaterials(needs))
        }
    }
}

/// Boolean form of [`find_ingredients`]
pub fn try_find_best_ingredients(
    map: &RepairMap,
    agent: &Agent,
    station: &Workstation,
    order: Option<&RepairOrder>,
    item: &RepairableItem,
    settings: &RepairSettings,
    cache: &mut PropertyCache,
) -> bool {
    find_ingredients(map, agent, station, order, item, settings, cache).is_ok()
}

/// Every item `agent` could repair under `order`, nearest-first per region
///
/// Searches the whole reachable region graph.
pub fn find_repairable_items(
    map: &RepairMap,
    agent: &Agent,
    station: &Workstation,
    order: &RepairOrder,
    settings: &RepairSettings,
    cache: &mut PropertyCache,
) -> Vec<ItemId> {
    let Some(root) = map.regions.region_at(&station.interaction_cell) else {
        return Vec::new();
    };
    let scope = OrderScope { station, order };

    let mut valid_items = Vec::new();
    map.regions.breadth_first_traverse(
        root,
        |_, to| to.allows(&agent.id),
        |region| {
            let mut relevant: Vec<&RepairableItem> = map
                .items_in_region(region.id)
                .into_iter()
                .filter(|item| {
                    is_repairable_now(item, &agent.id, &map.reservations, settings, cache, Some(scope))
                        && repair_chance_allowed(agent, item, settings, cache, &map.researched)
                })
                .collect();
            relevant.sort_by(|a, b| {
                a.position
                    .distance_squared(&agent.position)
                    .cmp(&b.position.distance_squared(&agent.position))
                    .then_with(|| a.id.cmp(&b.id))
            });
            valid_items.extend(relevant.into_iter().map(|i| i.id.clone()));
            false
        },
        MAX_REGIONS_TO_SEARCH,
    );
    valid_items
}
