//! The repair task
//!
//! A ticked state machine run by one agent:
//!
//! ```text
//! Reserve -> ClearStation -> NextTarget <-> GoToTarget -> CarryToStation
//!                                 |                            |
//!                                 +--------> GoToStation <-----+
//!                                                 |
//!                                               Work -> FindStore -> CarryToStore -> Done
//! ```
//!
//! Travel moves the agent one cell per tick. Steps that finish instantly
//! fall straight through to the next one within the same tick. Every exit
//! path drops what the agent carries and releases every reservation the
//! task took. Work progress lives in the session's tracker registry, so an
//! aborted task leaves it behind for a later resumption.

use std::collections::VecDeque;
use std::sync::Once;

use rand::Rng;

use crate::cache::PropertyCache;
use crate::core::config::RepairSettings;
use crate::core::error::RepairError;
use crate::core::types::{Cell, ItemId, OrderId, StationId};
use crate::item::RepairableItem;
use crate::repair::allocator::ThingCount;
use crate::repair::chance::{adjusted_repair_chance, chance_to_display};
use crate::repair::eligibility::{compute_repair_cost, max_repairable_hit_points};
use crate::repair::outcome::{
    apply_outcome, consume_materials, result_label, AppliedOutcome, OutcomeRanges, RollResult,
};
use crate::repair::session::RepairSession;
use crate::repair::work::{compute_total_work, TrackerClaim, WorkTracker, DEFAULT_WORK_AMOUNT};
use crate::world::agent::{Agent, Carried};
use crate::world::map::RepairMap;
use crate::world::reservations::{ReservationService, Target};
use crate::world::station::StoragePolicy;

/// Same-kind stacks this close to the agent get picked up on the way
const TOP_OFF_RADIUS: i64 = 8;

static UNKNOWN_STORE_MODE: Once = Once::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Reserve,
    ClearStation,
    NextTarget,
    GoToTarget,
    CarryToStation,
    GoToStation,
    Work,
    FindStore,
    CarryToStore,
    Done,
}

/// Why a task ended without finishing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    StationLost,
    StationForbidden,
    StationBurning,
    StationUnusable,
    OrderGone,
    OrderSuspended,
    TargetLost(ItemId),
    ReservationFailed,
    NoPath,
    /// Another agent took over the work tracker
    TakenOver,
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Succeeded,
    Incomplete(AbortReason),
}

/// Something observable that happened during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    StrayCleared { id: ItemId, to: Cell },
    PickedUp { id: ItemId, count: u32 },
    Placed { id: ItemId, cell: Cell },
    WorkStarted { claim: TrackerClaim, total_work: f32, work_left: f32 },
    Rolled { result: RollResult, roll: f32, chance: f32 },
    /// Work done and outcome applied; `label` is the floating notification
    Finished { outcome: AppliedOutcome, label: String, consumed: u32 },
    LevelUp { level: u32 },
    Stored { cell: Cell },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub status: TaskStatus,
    pub events: Vec<TaskEvent>,
}

enum Flow {
    Next(Step),
    Wait,
    Abort(AbortReason),
    Finish,
}

/// Station and order values a tick needs, read once per tick
struct StationView {
    interaction_cell: Cell,
    staging_cells: Vec<Cell>,
    work_speed_factor: f32,
    order_suspended: bool,
    learn_factor: f32,
    order_work: f32,
    store: Option<StoragePolicy>,
}

#[derive(Debug, Clone)]
pub struct RepairTask {
    pub station: StationId,
    pub order: Option<OrderId>,
    pub item: ItemId,
    queue: VecDeque<ThingCount>,
    current: Option<ThingCount>,
    strays: VecDeque<ItemId>,
    store_cell: Option<Cell>,
    reserved: Vec<Target>,
    work_started: bool,
    step: Step,
    status: TaskStatus,
}

impl RepairTask {
    /// Task hauling `item` and then `materials` to `station`
    pub fn new(
        station: StationId,
        order: Option<OrderId>,
        item: ItemId,
        materials: &[ThingCount],
    ) -> Self {
        let mut queue = VecDeque::with_capacity(materials.len() + 1);
        queue.push_back(ThingCount {
            id: item.clone(),
            count: 1,
        });
        queue.extend(materials.iter().filter(|m| m.count > 0).cloned());

        Self {
            station,
            order,
            item,
            queue,
            current: None,
            strays: VecDeque::new(),
            store_cell: None,
            reserved: Vec::new(),
            work_started: false,
            step: Step::Reserve,
            status: TaskStatus::Running,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn status(&self) -> &TaskStatus {
        &self.status
    }

    pub fn is_finished(&self) -> bool {
        self.step == Step::Done
    }

    /// Things still waiting to be hauled
    pub fn queued(&self) -> impl Iterator<Item = &ThingCount> {
        self.queue.iter()
    }

    /// Advance the task by one scheduler tick
    pub fn tick(
        &mut self,
        agent: &mut Agent,
        map: &mut RepairMap,
        session: &mut RepairSession,
        rng: &mut impl Rng,
    ) -> TickOutcome {
        let mut events = Vec::new();
        if self.is_finished() {
            return TickOutcome {
                status: self.status.clone(),
                events,
            };
        }

        let view = match self.station_view(map) {
            Ok(view) => view,
            Err(reason) => return self.abort(agent, map, reason, events),
        };

        loop {
            let flow = match self.step {
                Step::Reserve => self.reserve(agent, map, &view),
                Step::ClearStation => self.clear_station(agent, map, &mut events),
                Step::NextTarget => self.next_target(),
                Step::GoToTarget => self.go_to_target(agent, map, &mut events),
                Step::CarryToStation => self.carry_to_station(agent, map, &view, &mut events),
                Step::GoToStation => match travel(agent, map, view.interaction_cell) {
                    Ok(true) => Flow::Next(Step::Work),
                    Ok(false) => Flow::Wait,
                    Err(reason) => Flow::Abort(reason),
                },
                Step::Work => self.work(agent, map, session, rng, &view, &mut events),
                Step::FindStore => self.find_store(agent, map, &view, &mut events),
                Step::CarryToStore => self.carry_to_store(agent, map, &mut events),
                Step::Done => Flow::Finish,
            };

            match flow {
                Flow::Next(step) => self.step = step,
                Flow::Wait => {
                    return TickOutcome {
                        status: TaskStatus::Running,
                        events,
                    }
                }
                Flow::Abort(reason) => return self.abort(agent, map, reason, events),
                Flow::Finish => return self.finish(agent, map, events),
            }
        }
    }

    /// Stop from outside, e.g. the agent was drafted
    pub fn interrupt(&mut self, agent: &mut Agent, map: &mut RepairMap) -> TickOutcome {
        if self.is_finished() {
            return TickOutcome {
                status: self.status.clone(),
                events: Vec::new(),
            };
        }
        self.abort(agent, map, AbortReason::Interrupted, Vec::new())
    }

    fn station_view(&self, map: &RepairMap) -> Result<StationView, AbortReason> {
        let station = map.station(&self.station).ok_or(AbortReason::StationLost)?;
        if station.forbidden {
            return Err(AbortReason::StationForbidden);
        }
        if station.burning {
            return Err(AbortReason::StationBurning);
        }
        if !station.currently_usable() {
            return Err(AbortReason::StationUnusable);
        }

        let order = match self.order {
            Some(id) => match station.order(id) {
                Some(order) if !order.deleted => Some(order),
                _ => return Err(AbortReason::OrderGone),
            },
            None => None,
        };

        Ok(StationView {
            interaction_cell: station.interaction_cell,
            staging_cells: station.staging_cells.clone(),
            work_speed_factor: station.work_speed_factor,
            order_suspended: order.is_some_and(|o| o.suspended),
            learn_factor: order.map_or(1.0, |o| o.skill_learn_factor),
            order_work: order.map_or(DEFAULT_WORK_AMOUNT, |o| o.recipe_work_amount),
            store: order.map(|o| o.store),
        })
    }

    fn hold(&mut self, agent: &Agent, map: &mut RepairMap, target: Target) -> bool {
        if self.reserved.contains(&target) {
            return true;
        }
        if map.reservations.reserve(&agent.id, target.clone()) {
            self.reserved.push(target);
            true
        } else {
            false
        }
    }

    fn unhold(&mut self, agent: &Agent, map: &mut RepairMap, target: &Target) {
        self.reserved.retain(|held| held != target);
        map.reservations.release(&agent.id, target);
    }

    fn reserve(&mut self, agent: &Agent, map: &mut RepairMap, view: &StationView) -> Flow {
        if !self.hold(agent, map, Target::Station(self.station.clone())) {
            return Flow::Abort(AbortReason::ReservationFailed);
        }
        self.hold(agent, map, Target::Cell(view.interaction_cell));
        for cell in &view.staging_cells {
            self.hold(agent, map, Target::Cell(*cell));
        }

        // As many of the haul targets as possible
        let targets: Vec<ItemId> = self.queue.iter().map(|t| t.id.clone()).collect();
        for id in targets {
            if !self.hold(agent, map, Target::Item(id.clone())) {
                tracing::debug!("{} could not reserve {}", agent.name, id);
            }
        }

        let mut strays: Vec<ItemId> = view
            .staging_cells
            .iter()
            .flat_map(|cell| map.things_at(cell))
            .filter(|id| *id != self.item && !self.queue.iter().any(|t| t.id == *id))
            .collect();
        strays.dedup();
        self.strays = strays.into();

        Flow::Next(Step::ClearStation)
    }

    fn clear_station(
        &mut self,
        agent: &mut Agent,
        map: &mut RepairMap,
        events: &mut Vec<TaskEvent>,
    ) -> Flow {
        let Some(stray) = self.strays.front().cloned() else {
            return Flow::Next(Step::NextTarget);
        };
        let Some(position) = thing_position(map, &stray) else {
            self.strays.pop_front();
            return Flow::Next(Step::ClearStation);
        };

        let target = Target::Item(stray.clone());
        if !self.hold(agent, map, target.clone()) {
            tracing::debug!("stray {} on {} is reserved, leaving it", stray, self.station);
            self.strays.pop_front();
            return Flow::Next(Step::ClearStation);
        }

        match travel(agent, map, position) {
            Ok(true) => {}
            Ok(false) => return Flow::Wait,
            Err(reason) => return Flow::Abort(reason),
        }

        let to = map.drop_cell_near(agent.position);
        if let Some(item) = map.item_mut(&stray) {
            item.position = to;
        } else if let Some(stack) = map.stacks.remove(&stray) {
            map.place_stack(stack, to);
        }
        self.unhold(agent, map, &target);
        self.strays.pop_front();
        tracing::debug!("{} cleared {} off {}", agent.name, stray, self.station);
        events.push(TaskEvent::StrayCleared { id: stray, to });

        Flow::Next(Step::ClearStation)
    }

    fn next_target(&mut self) -> Flow {
        match self.queue.pop_front() {
            Some(target) => {
                self.current = Some(target);
                Flow::Next(Step::GoToTarget)
            }
            None => Flow::Next(Step::GoToStation),
        }
    }

    fn go_to_target(
        &mut self,
        agent: &mut Agent,
        map: &mut RepairMap,
        events: &mut Vec<TaskEvent>,
    ) -> Flow {
        let Some(target) = self.current.clone() else {
            return Flow::Next(Step::NextTarget);
        };
        let Some(position) = usable_position(map, &target.id) else {
            return Flow::Abort(AbortReason::TargetLost(target.id));
        };

        match travel(agent, map, position) {
            Ok(true) => {}
            Ok(false) => return Flow::Wait,
            Err(reason) => return Flow::Abort(reason),
        }
        self.current = None;

        if target.id == self.item {
            if let Some(item) = map.item_mut(&target.id) {
                item.spawned = false;
            }
            agent.carrying = Some(Carried::Item(target.id.clone()));
            events.push(TaskEvent::PickedUp {
                id: target.id,
                count: 1,
            });
            return Flow::Next(Step::CarryToStation);
        }

        let Some(taken) = map.take_stack(&target.id, target.count) else {
            return Flow::Abort(AbortReason::TargetLost(target.id));
        };
        let count = taken.count;
        match &mut agent.carrying {
            Some(Carried::Stack(carried)) if carried.kind == taken.kind => carried.count += count,
            slot => *slot = Some(Carried::Stack(taken)),
        }
        events.push(TaskEvent::PickedUp {
            id: target.id,
            count,
        });

        if let Some(next) = self.next_top_off(agent, map) {
            tracing::trace!("{} also collecting {}", agent.name, next.id);
            self.current = Some(next);
            return Flow::Next(Step::GoToTarget);
        }
        Flow::Next(Step::CarryToStation)
    }

    /// Queued stack of the carried kind close enough to grab on the way
    fn next_top_off(&mut self, agent: &Agent, map: &RepairMap) -> Option<ThingCount> {
        let Some(Carried::Stack(carried)) = &agent.carrying else {
            return None;
        };
        let space = carried.space_left();
        if space == 0 {
            return None;
        }

        let index = self.queue.iter().position(|entry| {
            map.stack(&entry.id).is_some_and(|s| {
                s.spawned
                    && !s.forbidden
                    && s.kind == carried.kind
                    && s.position.distance_squared(&agent.position) <= TOP_OFF_RADIUS * TOP_OFF_RADIUS
            })
        })?;

        let entry = &mut self.queue[index];
        let take = entry.count.min(space);
        if take < entry.count {
            entry.count -= take;
            Some(ThingCount {
                id: entry.id.clone(),
                count: take,
            })
        } else {
            self.queue.remove(index)
        }
    }

    fn carry_to_station(
        &mut self,
        agent: &mut Agent,
        map: &mut RepairMap,
        view: &StationView,
        events: &mut Vec<TaskEvent>,
    ) -> Flow {
        match travel(agent, map, view.interaction_cell) {
            Ok(true) => {}
            Ok(false) => return Flow::Wait,
            Err(reason) => return Flow::Abort(reason),
        }

        let Some(carried) = agent.carrying.take() else {
            return Flow::Next(Step::NextTarget);
        };
        let cell = place_cell(map, &view.staging_cells, &carried);
        let id = match carried {
            Carried::Item(id) => {
                if let Some(item) = map.item_mut(&id) {
                    item.position = cell;
                    item.spawned = true;
                }
                id
            }
            Carried::Stack(stack) => {
                let id = stack.id.clone();
                map.place_stack(stack, cell);
                id
            }
        };
        events.push(TaskEvent::Placed { id, cell });

        Flow::Next(Step::NextTarget)
    }

    fn work(
        &mut self,
        agent: &mut Agent,
        map: &mut RepairMap,
        session: &mut RepairSession,
        rng: &mut impl Rng,
        view: &StationView,
        events: &mut Vec<TaskEvent>,
    ) -> Flow {
        if view.order_suspended {
            return Flow::Abort(AbortReason::OrderSuspended);
        }
        let Some(item) = map.item(&self.item).filter(|i| i.spawned) else {
            return Flow::Abort(AbortReason::TargetLost(self.item.clone()));
        };

        let RepairSession {
            settings,
            cache,
            ledger,
            trackers,
        } = session;

        if !self.work_started {
            let cost = compute_repair_cost(item, settings, cache);
            let (tracker, claim) = trackers.claim(&self.item, &agent.id, || {
                let total = compute_total_work(item, agent.skill_level, view.order_work, settings, cache);
                WorkTracker::new(agent.id.clone(), total, rng.gen::<f32>(), cost.clone())
            });
            if !tracker.has_rolled() {
                tracker.repair_cost = cost;
            }
            tracing::debug!(
                "{} commencing repair of {}: total work {}, work left {}",
                agent.name,
                self.item,
                tracker.total_work,
                tracker.work_left
            );
            events.push(TaskEvent::WorkStarted {
                claim,
                total_work: tracker.total_work,
                work_left: tracker.work_left,
            });
            self.work_started = true;
        }

        let Some(tracker) = trackers.get_mut(&self.item) else {
            return Flow::Abort(AbortReason::TakenOver);
        };
        if tracker.worker_id != agent.id {
            return Flow::Abort(AbortReason::TakenOver);
        }

        let gained = agent.learn(settings.skill_exp_per_tick * view.learn_factor);
        if gained > 0 {
            events.push(TaskEvent::LevelUp {
                level: agent.skill_level,
            });
        }

        tracker.advance(agent.work_speed * view.work_speed_factor);

        if tracker.should_roll() {
            let (result, roll, chance) =
                roll_outcome(tracker, agent, item, settings, cache, &map.researched, rng);
            events.push(TaskEvent::Rolled {
                result,
                roll,
                chance,
            });
        }
        if !tracker.is_done() {
            return Flow::Wait;
        }

        let result = tracker.roll_result;
        let snapshot = tracker.repair_cost.clone();
        let label = tracker.result_label.clone().unwrap_or_default();

        let Some(item) = map.item_mut(&self.item) else {
            return Flow::Abort(AbortReason::TargetLost(self.item.clone()));
        };
        let outcome = apply_outcome(result, item, settings, cache, ledger);
        tracing::info!("{}: {}", item.label(), label);

        let consumed = outcome
            .consume
            .map_or(0, |fraction| consume_materials(map, &view.staging_cells, &snapshot, fraction));
        if outcome.skill_bonus {
            let gained = agent.learn(settings.success_skill_exp_bonus * view.learn_factor);
            if gained > 0 {
                events.push(TaskEvent::LevelUp {
                    level: agent.skill_level,
                });
            }
        }

        if let Some(order) = self
            .order
            .and_then(|id| map.station_mut(&self.station)?.order_mut(id))
        {
            order.notify_iteration_completed();
        }
        trackers.remove(&self.item);

        events.push(TaskEvent::Finished {
            outcome,
            label,
            consumed,
        });
        Flow::Next(Step::FindStore)
    }

    fn find_store(
        &mut self,
        agent: &mut Agent,
        map: &mut RepairMap,
        view: &StationView,
        events: &mut Vec<TaskEvent>,
    ) -> Flow {
        let Some(store) = view.store else {
            tracing::debug!("no order for {}, leaving it on {}", self.item, self.station);
            return Flow::Finish;
        };
        let Some(item) = map.item(&self.item) else {
            return Flow::Abort(AbortReason::TargetLost(self.item.clone()));
        };

        let cell = match store {
            StoragePolicy::DropOnFloor => {
                let cell = map.drop_cell_near(agent.position);
                if let Some(item) = map.item_mut(&self.item) {
                    item.position = cell;
                }
                events.push(TaskEvent::Stored { cell });
                return Flow::Finish;
            }
            StoragePolicy::BestStockpile => map.best_storage_cell(&agent.id, &item.def, &item.position),
            StoragePolicy::SpecificStockpile(zone) => {
                map.storage_cell_in_zone(zone, &agent.id, &item.def, &item.position)
            }
            StoragePolicy::Unknown => {
                let station = self.station.clone();
                UNKNOWN_STORE_MODE.call_once(|| {
                    tracing::error!("{}", RepairError::UnknownStoragePolicy(station));
                });
                return Flow::Finish;
            }
        };

        let Some(cell) = cell else {
            tracing::debug!("no storage cell for {}, leaving it on {}", self.item, self.station);
            return Flow::Finish;
        };
        if !self.hold(agent, map, Target::Cell(cell)) {
            return Flow::Finish;
        }

        if let Some(item) = map.item_mut(&self.item) {
            item.spawned = false;
        }
        agent.carrying = Some(Carried::Item(self.item.clone()));
        self.store_cell = Some(cell);
        Flow::Next(Step::CarryToStore)
    }

    fn carry_to_store(
        &mut self,
        agent: &mut Agent,
        map: &mut RepairMap,
        events: &mut Vec<TaskEvent>,
    ) -> Flow {
        let Some(cell) = self.store_cell else {
            return Flow::Finish;
        };
        match travel(agent, map, cell) {
            Ok(true) => {}
            Ok(false) => return Flow::Wait,
            Err(reason) => return Flow::Abort(reason),
        }

        agent.carrying = None;
        if let Some(item) = map.item_mut(&self.item) {
            item.position = cell;
            item.spawned = true;
        }
        events.push(TaskEvent::Stored { cell });
        Flow::Finish
    }

    fn release_all(&mut self, agent: &Agent, map: &mut RepairMap) {
        for target in self.reserved.drain(..) {
            map.reservations.release(&agent.id, &target);
        }
    }

    fn finish(&mut self, agent: &Agent, map: &mut RepairMap, events: Vec<TaskEvent>) -> TickOutcome {
        self.release_all(agent, map);
        self.step = Step::Done;
        self.status = TaskStatus::Succeeded;
        TickOutcome {
            status: TaskStatus::Succeeded,
            events,
        }
    }

    fn abort(
        &mut self,
        agent: &mut Agent,
        map: &mut RepairMap,
        reason: AbortReason,
        events: Vec<TaskEvent>,
    ) -> TickOutcome {
        tracing::debug!("{} abandoned repair of {}: {:?}", agent.name, self.item, reason);
        drop_carried(agent, map);
        self.release_all(agent, map);
        self.step = Step::Done;
        self.status = TaskStatus::Incomplete(reason);
        TickOutcome {
            status: self.status.clone(),
            events,
        }
    }
}

/// Move one cell toward `to`; true once there
fn travel(agent: &mut Agent, map: &RepairMap, to: Cell) -> Result<bool, AbortReason> {
    if agent.position == to {
        return Ok(true);
    }
    if !map.can_reach(&agent.id, &agent.position, &to) {
        return Err(AbortReason::NoPath);
    }
    Ok(agent.step_toward(&to))
}

fn thing_position(map: &RepairMap, id: &ItemId) -> Option<Cell> {
    map.item(id)
        .filter(|i| i.spawned)
        .map(|i| i.position)
        .or_else(|| map.stack(id).filter(|s| s.spawned).map(|s| s.position))
}

/// Position of a haul target that may still be taken
fn usable_position(map: &RepairMap, id: &ItemId) -> Option<Cell> {
    map.item(id)
        .filter(|i| i.spawned && !i.forbidden)
        .map(|i| i.position)
        .or_else(|| {
            map.stack(id)
                .filter(|s| s.spawned && !s.forbidden)
                .map(|s| s.position)
        })
}

/// Staging cell to put a carried thing on
///
/// Empty cells first, then a same-kind stack with room, then the first cell.
fn place_cell(map: &RepairMap, cells: &[Cell], carried: &Carried) -> Cell {
    if let Some(cell) = cells.iter().find(|c| map.is_cell_empty(c)) {
        return *cell;
    }
    if let Carried::Stack(stack) = carried {
        let merge = cells.iter().find(|c| {
            map.stacks_at(c)
                .any(|s| s.kind == stack.kind && s.space_left() > 0)
        });
        if let Some(cell) = merge {
            return *cell;
        }
    }
    cells
        .first()
        .copied()
        .unwrap_or_else(|| map.drop_cell_near(Cell::default()))
}

fn drop_carried(agent: &mut Agent, map: &mut RepairMap) {
    let Some(carried) = agent.carrying.take() else {
        return;
    };
    let cell = map.drop_cell_near(agent.position);
    match carried {
        Carried::Item(id) => {
            if let Some(item) = map.item_mut(&id) {
                item.position = cell;
                item.spawned = true;
            }
        }
        Carried::Stack(stack) => map.place_stack(stack, cell),
    }
    tracing::debug!("{} dropped what they carried at {}", agent.name, cell);
}

/// Roll the outcome once and record it on the tracker
fn roll_outcome(
    tracker: &mut WorkTracker,
    agent: &Agent,
    item: &RepairableItem,
    settings: &RepairSettings,
    cache: &mut PropertyCache,
    researched: &ahash::AHashSet<String>,
    rng: &mut impl Rng,
) -> (RollResult, f32, f32) {
    let chance = adjusted_repair_chance(agent, item, settings, cache, researched);
    let display = chance_to_display(chance);
    let ranges = OutcomeRanges::new(chance);
    let roll: f32 = rng.gen();
    let result = ranges.classify(roll);

    tracing::debug!(
        "roll: {}, success {:?}, partial {:?}; fail no-cost {:?}, soft {:?}, hard {:?} -> {:?}",
        roll,
        ranges.success,
        ranges.partial_success,
        ranges.fail_no_cost,
        ranges.fail_soft,
        ranges.fail_hard,
        result
    );

    let label = if result == RollResult::PartialSuccess {
        let restored = item.hit_points
            + max_repairable_hit_points(item, settings, cache, settings.partial_success_repair_amount);
        if restored >= max_repairable_hit_points(item, settings, cache, 0.0) {
            result_label(RollResult::Success, display)
        } else {
            result_label(result, display)
        }
    } else {
        result_label(result, display)
    };

    tracker.roll_result = result;
    tracker.result_label = Some(label);
    tracker.repair_cost = compute_repair_cost(item, settings, cache);
    if result.ends_work_early() {
        tracker.work_left = 0.0;
    }
    (result, roll, chance)
}
