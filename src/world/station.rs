//! Workstations and the repair orders queued on them

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::core::types::{Cell, OrderId, StationId, Tick, ZoneId};
use crate::item::ItemDef;

/// Allow/deny rules over item definitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemFilter {
    /// If set, only these def names pass
    pub allowed_defs: Option<AHashSet<String>>,
    /// Def names or thing categories that never pass
    pub denied: AHashSet<String>,
}

impl ItemFilter {
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn only(defs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed_defs: Some(defs.into_iter().map(Into::into).collect()),
            denied: AHashSet::new(),
        }
    }

    pub fn deny(mut self, name: impl Into<String>) -> Self {
        self.denied.insert(name.into());
        self
    }

    pub fn allows(&self, def: &ItemDef) -> bool {
        if self.denied.contains(&def.def_name)
            || def.thing_categories.iter().any(|c| self.denied.contains(c))
        {
            return false;
        }
        self.allowed_defs
            .as_ref()
            .map_or(true, |allowed| allowed.contains(&def.def_name))
    }
}

/// Where a finished item goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "zone")]
pub enum StoragePolicy {
    DropOnFloor,
    BestStockpile,
    SpecificStockpile(ZoneId),
    /// Anything a newer or corrupted save names that this build does not know
    #[serde(other)]
    Unknown,
}

/// How many more times an order should run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatMode {
    Forever,
    Count(u32),
}

/// A standing repair order on a workstation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairOrder {
    pub id: OrderId,
    /// Max distance from the station for items and materials
    pub search_radius: f32,
    pub filter: ItemFilter,
    pub store: StoragePolicy,
    pub repeat: RepeatMode,
    pub suspended: bool,
    pub deleted: bool,
    /// Skip materials the agent should not take (e.g. in a private room)
    pub check_socially_proper: bool,
    pub skill_learn_factor: f32,
    pub min_skill: u32,
    /// Tick of the last failed ingredient search
    pub last_search_fail_tick: Option<Tick>,
    /// Work amount of the generic repair recipe
    pub recipe_work_amount: f32,
}

impl RepairOrder {
    pub fn new(id: u32) -> Self {
        Self {
            id: OrderId(id),
            search_radius: 999.0,
            filter: ItemFilter::allow_all(),
            store: StoragePolicy::BestStockpile,
            repeat: RepeatMode::Forever,
            suspended: false,
            deleted: false,
            check_socially_proper: true,
            skill_learn_factor: 1.0,
            min_skill: 0,
            last_search_fail_tick: None,
            recipe_work_amount: 1000.0,
        }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.search_radius = radius;
        self
    }

    pub fn with_filter(mut self, filter: ItemFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_store(mut self, store: StoragePolicy) -> Self {
        self.store = store;
        self
    }

    pub fn with_repeat(mut self, repeat: RepeatMode) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_min_skill(mut self, level: u32) -> Self {
        self.min_skill = level;
        self
    }

    pub fn should_do_now(&self) -> bool {
        !self.suspended
            && !self.deleted
            && match self.repeat {
                RepeatMode::Forever => true,
                RepeatMode::Count(n) => n > 0,
            }
    }

    /// Record one finished repair
    pub fn notify_iteration_completed(&mut self) {
        if let RepeatMode::Count(n) = self.repeat {
            self.repeat = RepeatMode::Count(n.saturating_sub(1));
        }
    }
}

/// A repair workstation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workstation {
    pub id: StationId,
    pub position: Cell,
    /// Where the agent stands while working
    pub interaction_cell: Cell,
    /// Cells items and materials are placed on before work starts
    pub staging_cells: Vec<Cell>,
    pub work_speed_factor: f32,
    /// Powered, not broken down
    pub usable: bool,
    pub spawned: bool,
    pub forbidden: bool,
    pub burning: bool,
    pub orders: Vec<RepairOrder>,
}

impl Workstation {
    pub fn new(id: impl Into<String>, position: Cell) -> Self {
        Self {
            id: StationId::new(id),
            position,
            interaction_cell: Cell::new(position.x, position.z - 1),
            staging_cells: vec![position],
            work_speed_factor: 1.0,
            usable: true,
            spawned: true,
            forbidden: false,
            burning: false,
            orders: Vec::new(),
        }
    }

    pub fn with_staging_cells(mut self, cells: Vec<Cell>) -> Self {
        self.staging_cells = cells;
        self
    }

    pub fn with_interaction_cell(mut self, cell: Cell) -> Self {
        self.interaction_cell = cell;
        self
    }

    pub fn with_order(mut self, order: RepairOrder) -> Self {
        self.orders.push(order);
        self
    }

    pub fn currently_usable(&self) -> bool {
        self.spawned && self.usable
    }

    pub fn order(&self, id: OrderId) -> Option<&RepairOrder> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn order_mut(&mut self, id: OrderId) -> Option<&mut RepairOrder> {
        self.orders.iter_mut().find(|o| o.id == id)
    }

    /// Drop orders that can never run again
    pub fn remove_incompletable_orders(&mut self) {
        self.orders
            .retain(|o| !o.deleted && o.repeat != RepeatMode::Count(0));
    }

    pub fn is_staging_cell(&self, cell: &Cell) -> bool {
        self.staging_cells.contains(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_only_and_deny() {
        let revolver = ItemDef::new("Gun_Revolver", "revolver").with_thing_category("WeaponsRanged");
        let knife = ItemDef::new("MeleeWeapon_Knife", "knife").with_thing_category("WeaponsMelee");

        let filter = ItemFilter::only(["Gun_Revolver"]);
        assert!(filter.allows(&revolver));
        assert!(!filter.allows(&knife));

        let filter = ItemFilter::allow_all().deny("WeaponsRanged");
        assert!(!filter.allows(&revolver));
        assert!(filter.allows(&knife));
    }

    #[test]
    fn test_order_repeat_count() {
        let mut order = RepairOrder::new(1).with_repeat(RepeatMode::Count(1));
        assert!(order.should_do_now());
        order.notify_iteration_completed();
        assert!(!order.should_do_now());
    }

    #[test]
    fn test_suspended_order_not_done() {
        let mut order = RepairOrder::new(1);
        order.suspended = true;
        assert!(!order.should_do_now());
    }

    #[test]
    fn test_remove_incompletable_orders() {
        let mut done = RepairOrder::new(2).with_repeat(RepeatMode::Count(0));
        done.suspended = true;
        let mut station = Workstation::new("bench", Cell::new(5, 5))
            .with_order(RepairOrder::new(1))
            .with_order(done);

        station.remove_incompletable_orders();

        assert_eq!(station.orders.len(), 1);
        assert!(station.order(OrderId(1)).is_some());
    }

    #[test]
    fn test_unknown_storage_policy_deserializes() {
        let policy: StoragePolicy =
            serde_json::from_str(r#"{"mode":"Teleport"}"#).expect("Should parse");
        assert_eq!(policy, StoragePolicy::Unknown);

        let policy: StoragePolicy =
            serde_json::from_str(r#"{"mode":"SpecificStockpile","zone":3}"#).expect("Should parse");
        assert_eq!(policy, StoragePolicy::SpecificStockpile(ZoneId(3)));
    }
}
