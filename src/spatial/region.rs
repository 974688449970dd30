//! Region graph for breadth-first map searches
//!
//! The map is partitioned into rectangular regions of walkable cells.
//! Searches walk outward region by region, so nearer regions are always
//! visited before farther ones.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core::types::{AgentId, Cell};

/// Safety cap on the number of regions a single search may visit
pub const MAX_REGIONS_TO_SEARCH: usize = 99_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionId(pub u32);

/// A rectangle of connected cells
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    /// Inclusive lower corner
    pub min: Cell,
    /// Inclusive upper corner
    pub max: Cell,
    pub neighbors: Vec<RegionId>,
    /// Agents allowed to enter; None means everyone
    pub allowed: Option<AHashSet<AgentId>>,
}

impl Region {
    pub fn contains(&self, cell: &Cell) -> bool {
        cell.x >= self.min.x && cell.x <= self.max.x && cell.z >= self.min.z && cell.z <= self.max.z
    }

    pub fn allows(&self, agent: &AgentId) -> bool {
        self.allowed.as_ref().map_or(true, |set| set.contains(agent))
    }

    pub fn cell_count(&self) -> usize {
        ((self.max.x - self.min.x + 1) * (self.max.z - self.min.z + 1)) as usize
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (self.min.x..=self.max.x).flat_map(move |x| (self.min.z..=self.max.z).map(move |z| Cell::new(x, z)))
    }
}

/// Connectivity between regions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionGraph {
    regions: Vec<Region>,
}

impl RegionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rectangular region spanning `min..=max`
    pub fn add_region(&mut self, min: Cell, max: Cell) -> RegionId {
        let id = RegionId(self.regions.len() as u32);
        self.regions.push(Region {
            id,
            min: Cell::new(min.x.min(max.x), min.z.min(max.z)),
            max: Cell::new(min.x.max(max.x), min.z.max(max.z)),
            neighbors: Vec::new(),
            allowed: None,
        });
        id
    }

    /// Link two regions in both directions
    pub fn connect(&mut self, a: RegionId, b: RegionId) {
        if a == b {
            return;
        }
        if let Some(region) = self.regions.get_mut(a.0 as usize) {
            if !region.neighbors.contains(&b) {
                region.neighbors.push(b);
            }
        }
        if let Some(region) = self.regions.get_mut(b.0 as usize) {
            if !region.neighbors.contains(&a) {
                region.neighbors.push(a);
            }
        }
    }

    /// Only the listed agents may enter `id` from now on
    pub fn restrict(&mut self, id: RegionId, agents: impl IntoIterator<Item = AgentId>) {
        if let Some(region) = self.regions.get_mut(id.0 as usize) {
            region.allowed = Some(agents.into_iter().collect());
        }
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.0 as usize)
    }

    pub fn region_at(&self, cell: &Cell) -> Option<RegionId> {
        self.regions.iter().find(|r| r.contains(cell)).map(|r| r.id)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Visit regions outward from `root`
    ///
    /// `entry(from, to)` decides whether the search may cross into `to`.
    /// `process(region)` returns true to stop the search. At most
    /// `max_regions` regions are processed.
    pub fn breadth_first_traverse<E, P>(
        &self,
        root: RegionId,
        mut entry: E,
        mut process: P,
        max_regions: usize,
    ) where
        E: FnMut(&Region, &Region) -> bool,
        P: FnMut(&Region) -> bool,
    {
        let Some(start) = self.get(root) else {
            return;
        };

        let mut visited: AHashSet<RegionId> = AHashSet::new();
        let mut queue: VecDeque<&Region> = VecDeque::new();
        visited.insert(start.id);
        queue.push_back(start);

        let mut processed = 0;
        while let Some(current) = queue.pop_front() {
            if processed >= max_regions {
                tracing::debug!("region search hit cap of {}", max_regions);
                return;
            }
            processed += 1;

            if process(current) {
                return;
            }

            for neighbor_id in &current.neighbors {
                if visited.contains(neighbor_id) {
                    continue;
                }
                let Some(neighbor) = self.get(*neighbor_id) else {
                    continue;
                };
                if !entry(current, neighbor) {
                    continue;
                }
                visited.insert(*neighbor_id);
                queue.push_back(neighbor);
            }
        }
    }

    /// Whether `agent` can walk from `from` to `to` through permitted regions
    pub fn can_reach(&self, agent: &AgentId, from: &Cell, to: &Cell) -> bool {
        let (Some(start), Some(goal)) = (self.region_at(from), self.region_at(to)) else {
            return false;
        };
        if start == goal {
            return true;
        }

        let mut found = false;
        self.breadth_first_traverse(
            start,
            |_, to| to.allows(agent),
            |region| {
                found = region.id == goal;
                found
            },
            MAX_REGIONS_TO_SEARCH,
        );
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three rooms in a row: A - B - C
    fn corridor() -> (RegionGraph, RegionId, RegionId, RegionId) {
        let mut graph = RegionGraph::new();
        let a = graph.add_region(Cell::new(0, 0), Cell::new(4, 4));
        let b = graph.add_region(Cell::new(5, 0), Cell::new(9, 4));
        let c = graph.add_region(Cell::new(10, 0), Cell::new(14, 4));
        graph.connect(a, b);
        graph.connect(b, c);
        (graph, a, b, c)
    }

    #[test]
    fn test_region_at() {
        let (graph, a, _, c) = corridor();
        assert_eq!(graph.region_at(&Cell::new(2, 2)), Some(a));
        assert_eq!(graph.region_at(&Cell::new(14, 4)), Some(c));
        assert_eq!(graph.region_at(&Cell::new(20, 20)), None);
    }

    #[test]
    fn test_traverse_visits_nearest_first() {
        let (graph, a, b, c) = corridor();
        let mut order = Vec::new();
        graph.breadth_first_traverse(
            a,
            |_, _| true,
            |region| {
                order.push(region.id);
                false
            },
            MAX_REGIONS_TO_SEARCH,
        );
        assert_eq!(order, vec![a, b, c]);
    }

    #[test]
    fn test_traverse_stops_when_processed() {
        let (graph, a, b, _) = corridor();
        let mut visited = 0;
        graph.breadth_first_traverse(
            a,
            |_, _| true,
            |region| {
                visited += 1;
                region.id == b
            },
            MAX_REGIONS_TO_SEARCH,
        );
        assert_eq!(visited, 2);
    }

    #[test]
    fn test_traverse_respects_cap() {
        let (graph, a, _, _) = corridor();
        let mut visited = 0;
        graph.breadth_first_traverse(
            a,
            |_, _| true,
            |_| {
                visited += 1;
                false
            },
            1,
        );
        assert_eq!(visited, 1);
    }

    #[test]
    fn test_restricted_region_blocks_reach() {
        let (mut graph, _, b, _) = corridor();
        let alice = AgentId::new("alice");
        let bob = AgentId::new("bob");
        graph.restrict(b, [alice.clone()]);

        let from = Cell::new(0, 0);
        let to = Cell::new(12, 2);
        assert!(graph.can_reach(&alice, &from, &to));
        assert!(!graph.can_reach(&bob, &from, &to));
    }

    #[test]
    fn test_region_cells() {
        let mut graph = RegionGraph::new();
        let id = graph.add_region(Cell::new(1, 1), Cell::new(2, 3));
        let region = graph.get(id).expect("Region exists");
        assert_eq!(region.cell_count(), 6);
        assert_eq!(region.cells().count(), 6);
    }
}
