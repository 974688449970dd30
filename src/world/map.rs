//! The in-memory host map the repair systems run against

use ahash::{AHashMap, AHashSet};

use crate::core::types::{AgentId, Cell, ItemId, StationId, Tick, ZoneId};
use crate::item::{ItemDef, MaterialStack, RepairableItem};
use crate::spatial::{RegionGraph, RegionId};
use crate::world::reservations::{ReservationService, ReservationTable, Target};
use crate::world::station::Workstation;
use crate::world::stockpile::Stockpile;

/// Everything on one map: items, materials, stations, storage and claims
#[derive(Debug, Clone, Default)]
pub struct RepairMap {
    pub tick: Tick,
    pub regions: RegionGraph,
    pub items: AHashMap<ItemId, RepairableItem>,
    pub stacks: AHashMap<ItemId, MaterialStack>,
    pub stations: AHashMap<StationId, Workstation>,
    pub stockpiles: Vec<Stockpile>,
    pub reservations: ReservationTable,
    /// Finished research projects
    pub researched: AHashSet<String>,
}

impl RepairMap {
    pub fn new(regions: RegionGraph) -> Self {
        Self {
            regions,
            ..Self::default()
        }
    }

    pub fn add_item(&mut self, item: RepairableItem) -> ItemId {
        let id = item.id.clone();
        self.items.insert(id.clone(), item);
        id
    }

    pub fn add_stack(&mut self, stack: MaterialStack) -> ItemId {
        let id = stack.id.clone();
        self.stacks.insert(id.clone(), stack);
        id
    }

    pub fn add_station(&mut self, station: Workstation) -> StationId {
        let id = station.id.clone();
        self.stations.insert(id.clone(), station);
        id
    }

    pub fn add_stockpile(&mut self, stockpile: Stockpile) -> ZoneId {
        let id = stockpile.id;
        self.stockpiles.push(stockpile);
        id
    }

    pub fn complete_research(&mut self, project: impl Into<String>) {
        self.researched.insert(project.into());
    }

    pub fn is_researched(&self, project: &str) -> bool {
        self.researched.contains(project)
    }

    pub fn item(&self, id: &ItemId) -> Option<&RepairableItem> {
        self.items.get(id)
    }

    pub fn item_mut(&mut self, id: &ItemId) -> Option<&mut RepairableItem> {
        self.items.get_mut(id)
    }

    pub fn stack(&self, id: &ItemId) -> Option<&MaterialStack> {
        self.stacks.get(id)
    }

    pub fn station(&self, id: &StationId) -> Option<&Workstation> {
        self.stations.get(id)
    }

    pub fn station_mut(&mut self, id: &StationId) -> Option<&mut Workstation> {
        self.stations.get_mut(id)
    }

    pub fn stockpile(&self, id: ZoneId) -> Option<&Stockpile> {
        self.stockpiles.iter().find(|s| s.id == id)
    }

    /// Ids of every spawned item and stack lying on `cell`
    pub fn things_at(&self, cell: &Cell) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self
            .items
            .values()
            .filter(|i| i.spawned && i.position == *cell)
            .map(|i| i.id.clone())
            .chain(
                self.stacks
                    .values()
                    .filter(|s| s.spawned && s.position == *cell)
                    .map(|s| s.id.clone()),
            )
            .collect();
        ids.sort();
        ids
    }

    pub fn is_cell_empty(&self, cell: &Cell) -> bool {
        !self.items.values().any(|i| i.spawned && i.position == *cell)
            && !self.stacks.values().any(|s| s.spawned && s.position == *cell)
    }

    pub fn stacks_at<'a>(&'a self, cell: &'a Cell) -> impl Iterator<Item = &'a MaterialStack> + 'a {
        self.stacks
            .values()
            .filter(move |s| s.spawned && s.position == *cell)
    }

    pub fn items_in_region(&self, region: RegionId) -> Vec<&RepairableItem> {
        let Some(region) = self.regions.get(region) else {
            return Vec::new();
        };
        self.items
            .values()
            .filter(|i| i.spawned && region.contains(&i.position))
            .collect()
    }

    pub fn stacks_in_region(&self, region: RegionId) -> Vec<&MaterialStack> {
        let Some(region) = self.regions.get(region) else {
            return Vec::new();
        };
        self.stacks
            .values()
            .filter(|s| s.spawned && region.contains(&s.position))
            .collect()
    }

    pub fn can_reach(&self, agent: &AgentId, from: &Cell, to: &Cell) -> bool {
        self.regions.can_reach(agent, from, to)
    }

    /// Take `count` from a stack, or the whole stack if `count` covers it
    pub fn take_stack(&mut self, id: &ItemId, count: u32) -> Option<MaterialStack> {
        let stack = self.stacks.get_mut(id)?;
        match stack.split_off(count) {
            Some(part) => Some(part),
            None if count == 0 => None,
            None => self.stacks.remove(id),
        }
    }

    /// Put a stack down on `cell`, merging into same-kind stacks there first
    pub fn place_stack(&mut self, mut stack: MaterialStack, cell: Cell) {
        for existing in self.stacks.values_mut() {
            if stack.count == 0 {
                break;
            }
            if existing.spawned && existing.position == cell && existing.kind == stack.kind {
                let moved = stack.count.min(existing.space_left());
                existing.count += moved;
                stack.count -= moved;
            }
        }
        if stack.count > 0 {
            stack.position = cell;
            stack.spawned = true;
            self.stacks.insert(stack.id.clone(), stack);
        }
    }

    /// Nearest walkable cell to `near` that is not a staging cell
    pub fn drop_cell_near(&self, near: Cell) -> Cell {
        let is_staging = |c: &Cell| self.stations.values().any(|s| s.is_staging_cell(c));
        if !is_staging(&near) && self.regions.region_at(&near).is_some() {
            return near;
        }
        for radius in 1..=8 {
            let mut ring: Vec<Cell> = (-radius..=radius)
                .flat_map(|dx| (-radius..=radius).map(move |dz| Cell::new(near.x + dx, near.z + dz)))
                .filter(|c| c.chebyshev(&near) == radius)
                .filter(|c| !is_staging(c) && self.regions.region_at(c).is_some())
                .collect();
            ring.sort_by_key(|c| (c.distance_squared(&near), *c));
            if let Some(cell) = ring.first() {
                return *cell;
            }
        }
        near
    }

    /// Free, reservable, reachable cell in `stockpile` closest to `from`
    fn storage_cell_in(&self, stockpile: &Stockpile, agent: &AgentId, from: &Cell) -> Option<Cell> {
        stockpile.nearest_cell(from, |c| {
            self.is_cell_empty(c)
                && self.reservations.can_reserve(agent, &Target::Cell(*c))
                && self.can_reach(agent, from, c)
        })
    }

    /// Best storage cell over all stockpiles, highest priority first
    pub fn best_storage_cell(&self, agent: &AgentId, def: &ItemDef, from: &Cell) -> Option<Cell> {
        let mut zones: Vec<&Stockpile> = self.stockpiles.iter().filter(|z| z.accepts(def)).collect();
        zones.sort_by(|a, b| b.priority.cmp(&a.priority));
        zones
            .into_iter()
            .find_map(|zone| self.storage_cell_in(zone, agent, from))
    }

    /// Storage cell inside one specific stockpile
    pub fn storage_cell_in_zone(
        &self,
        zone: ZoneId,
        agent: &AgentId,
        def: &ItemDef,
        from: &Cell,
    ) -> Option<Cell> {
        let stockpile = self.stockpile(zone)?;
        if !stockpile.accepts(def) {
            return None;
        }
        self.storage_cell_in(stockpile, agent, from)
    }
}
