//! Reservation service
//!
//! Anything a task touches is reserved first and released on every exit
//! path. The trait is the seam a host plugs its own service into.

use ahash::AHashMap;

use crate::core::types::{AgentId, Cell, ItemId, StationId};

/// Something that can be claimed by one agent at a time
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Item(ItemId),
    Station(StationId),
    Cell(Cell),
}

impl From<ItemId> for Target {
    fn from(id: ItemId) -> Self {
        Target::Item(id)
    }
}

impl From<StationId> for Target {
    fn from(id: StationId) -> Self {
        Target::Station(id)
    }
}

impl From<Cell> for Target {
    fn from(cell: Cell) -> Self {
        Target::Cell(cell)
    }
}

pub trait ReservationService {
    /// Unclaimed, or already claimed by `agent`
    fn can_reserve(&self, agent: &AgentId, target: &Target) -> bool;

    /// Claim `target`; false if someone else holds it
    fn reserve(&mut self, agent: &AgentId, target: Target) -> bool;

    fn release(&mut self, agent: &AgentId, target: &Target);

    /// Drop every claim held by `agent`
    fn release_all(&mut self, agent: &AgentId);
}

/// In-memory reservation table
#[derive(Debug, Clone, Default)]
pub struct ReservationTable {
    claims: AHashMap<Target, AgentId>,
}

impl ReservationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holder(&self, target: &Target) -> Option<&AgentId> {
        self.claims.get(target)
    }

    pub fn held_by(&self, agent: &AgentId) -> usize {
        self.claims.values().filter(|a| *a == agent).count()
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

impl ReservationService for ReservationTable {
    fn can_reserve(&self, agent: &AgentId, target: &Target) -> bool {
        self.claims.get(target).map_or(true, |holder| holder == agent)
    }

    fn reserve(&mut self, agent: &AgentId, target: Target) -> bool {
        if !self.can_reserve(agent, &target) {
            return false;
        }
        self.claims.insert(target, agent.clone());
        true
    }

    fn release(&mut self, agent: &AgentId, target: &Target) {
        if self.claims.get(target) == Some(agent) {
            self.claims.remove(target);
        }
    }

    fn release_all(&mut self, agent: &AgentId) {
        self.claims.retain(|_, holder| holder != agent);
    }
}
