//! Resumable work trackers
//!
//! One tracker per item under repair. Trackers outlive the task that
//! created them: an interrupted repair leaves its tracker behind so the
//! same worker can pick up where it stopped.

use std::collections::hash_map::Entry;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::cache::PropertyCache;
use crate::core::config::RepairSettings;
use crate::core::types::{AgentId, ItemId};
use crate::item::{MaterialRequirement, RepairableItem};
use crate::repair::eligibility::max_repairable_hit_points;
use crate::repair::outcome::RollResult;

/// Work used when an item has no usable work amount of its own
pub const DEFAULT_WORK_AMOUNT: f32 = 2000.0;

/// Work saved per skill level, in percent
const WORK_SAVED_PER_SKILL_LEVEL: f32 = 3.75;

/// Progress record for one repair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkTracker {
    /// Only this agent may advance the tracker
    pub worker_id: AgentId,
    pub total_work: f32,
    pub work_left: f32,
    /// The outcome roll fires once `work_left` drops to this
    pub tick_to_roll: f32,
    pub roll_result: RollResult,
    /// Set by the roll; its presence means the roll already happened
    pub result_label: Option<String>,
    /// Materials the outcome consumes from
    pub repair_cost: Vec<MaterialRequirement>,
}

impl WorkTracker {
    /// Fresh tracker; `draw` is a uniform value in [0, 1)
    pub fn new(
        worker_id: AgentId,
        total_work: f32,
        draw: f32,
        repair_cost: Vec<MaterialRequirement>,
    ) -> Self {
        Self {
            worker_id,
            total_work,
            work_left: total_work,
            tick_to_roll: roll_threshold(total_work, draw),
            roll_result: RollResult::None,
            result_label: None,
            repair_cost,
        }
    }

    pub fn has_rolled(&self) -> bool {
        self.result_label.is_some()
    }

    pub fn should_roll(&self) -> bool {
        !self.has_rolled() && self.work_left <= self.tick_to_roll
    }

    pub fn is_done(&self) -> bool {
        self.work_left <= 0.0
    }

    pub fn advance(&mut self, amount: f32) {
        self.work_left -= amount;
    }

    /// Completed share of the work, for progress bars
    pub fn progress(&self) -> f32 {
        if self.total_work <= 0.0 {
            return 1.0;
        }
        (1.0 - self.work_left / self.total_work).clamp(0.0, 1.0)
    }
}

/// Work-left value at which the roll fires, within the last third of the work
pub fn roll_threshold(total_work: f32, draw: f32) -> f32 {
    total_work - (total_work / 3.0 + draw).min(total_work)
}

/// How [`WorkTrackerRegistry::claim`] came by its tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerClaim {
    /// The agent's own tracker, progress kept
    Resumed,
    Created,
    /// Another agent's tracker was thrown away
    Replaced { previous: AgentId },
}

/// Item id -> tracker
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkTrackerRegistry {
    trackers: AHashMap<ItemId, WorkTracker>,
}

impl WorkTrackerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The agent's tracker for `item`, creating one if needed
    ///
    /// A tracker owned by someone else is replaced, which restarts the
    /// repair from scratch.
    pub fn claim(
        &mut self,
        item: &ItemId,
        agent: &AgentId,
        create: impl FnOnce() -> WorkTracker,
    ) -> (&mut WorkTracker, TrackerClaim) {
        match self.trackers.entry(item.clone()) {
            Entry::Occupied(mut entry) => {
                if entry.get().worker_id == *agent {
                    tracing::debug!("{}, found existing work tracker", item);
                    return (entry.into_mut(), TrackerClaim::Resumed);
                }
                let previous = entry.get().worker_id.clone();
                tracing::warn!(
                    "{} takes over repair of {} from {}, progress restarts",
                    agent,
                    item,
                    previous
                );
                entry.insert(create());
                (entry.into_mut(), TrackerClaim::Replaced { previous })
            }
            Entry::Vacant(entry) => {
                tracing::debug!("{}, no existing work tracker found, calculating new one", item);
                (entry.insert(create()), TrackerClaim::Created)
            }
        }
    }

    pub fn get(&self, item: &ItemId) -> Option<&WorkTracker> {
        self.trackers.get(item)
    }

    pub fn get_mut(&mut self, item: &ItemId) -> Option<&mut WorkTracker> {
        self.trackers.get_mut(item)
    }

    pub fn insert(&mut self, item: ItemId, tracker: WorkTracker) {
        self.trackers.insert(item, tracker);
    }

    pub fn remove(&mut self, item: &ItemId) -> Option<WorkTracker> {
        self.trackers.remove(item)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &WorkTracker)> {
        self.trackers.iter()
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }
}

/// Unmodified work amount of the item's own recipes
fn base_work_amount(item: &RepairableItem) -> f32 {
    let def = &item.def;

    let recipe_stuff = item.stuff.as_ref().filter(|_| !def.recipe_work.is_empty());
    if let Some(stuff) = recipe_stuff {
        let work = def
            .recipe_work
            .iter()
            .map(|w| w * stuff.work_factor)
            .fold(0.0, f32::max);
        tracing::debug!("{} original work amount = {}, determined by recipe", item.id, work);
        return work;
    }
    if let Some(work) = def.recipe_maker_work.filter(|w| *w > 0.0) {
        tracing::debug!("{} original work amount = {}, determined by recipe maker", item.id, work);
        return work;
    }
    if let Some(work) = def.work_to_make.filter(|w| *w > 0.0) {
        tracing::debug!("{} original work amount = {}, determined by work to make", item.id, work);
        return work;
    }
    0.0
}

/// Total work for one repair of `item` by an agent at `skill_level`
///
/// `order_work` is the work amount of the order driving the repair, used
/// when the item has nothing better. The skill multiplier has no floor.
pub fn compute_total_work(
    item: &RepairableItem,
    skill_level: u32,
    order_work: f32,
    settings: &RepairSettings,
    cache: &mut PropertyCache,
) -> f32 {
    let mut work = base_work_amount(item);
    if work <= 0.0 {
        work = order_work.max(DEFAULT_WORK_AMOUNT);
        tracing::debug!("{} has no work amount, using default {}", item.id, work);
    }

    let max = max_repairable_hit_points(item, settings, cache, 0.0);
    let condition_multiplier = if max > 0 {
        1.1 - item.hit_points as f32 / max as f32
    } else {
        1.1
    };
    work *= condition_multiplier;

    let skill_multiplier = 1.0 - skill_level as f32 * WORK_SAVED_PER_SKILL_LEVEL / 100.0;
    work *= skill_multiplier;

    tracing::debug!(
        "work for {}: condition x{}, skill x{} -> {}",
        item.id,
        condition_multiplier,
        skill_multiplier,
        work
    );
    work
}
