//! Stockpile zones - storage destinations for finished repairs

use serde::{Deserialize, Serialize};

use crate::core::types::{Cell, ZoneId};
use crate::item::ItemDef;
use crate::world::station::ItemFilter;

/// Storage priority, higher is preferred
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StoragePriority {
    Low = 1,
    Normal = 2,
    Preferred = 3,
    Important = 4,
    Critical = 5,
}

/// A stockpile zone holding items on its cells
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stockpile {
    pub id: ZoneId,
    pub name: String,
    pub cells: Vec<Cell>,
    pub priority: StoragePriority,
    pub filter: ItemFilter,
}

impl Stockpile {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: ZoneId(id),
            name: name.into(),
            cells: Vec::new(),
            priority: StoragePriority::Normal,
            filter: ItemFilter::allow_all(),
        }
    }

    /// Cover the rectangle `min..=max`
    pub fn with_area(mut self, min: Cell, max: Cell) -> Self {
        for x in min.x.min(max.x)..=min.x.max(max.x) {
            for z in min.z.min(max.z)..=min.z.max(max.z) {
                self.cells.push(Cell::new(x, z));
            }
        }
        self
    }

    pub fn with_priority(mut self, priority: StoragePriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_filter(mut self, filter: ItemFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn accepts(&self, def: &ItemDef) -> bool {
        self.filter.allows(def)
    }

    pub fn contains(&self, cell: &Cell) -> bool {
        self.cells.contains(cell)
    }

    /// Nearest cell to `from` satisfying `usable`
    pub fn nearest_cell(&self, from: &Cell, mut usable: impl FnMut(&Cell) -> bool) -> Option<Cell> {
        self.cells
            .iter()
            .filter(|c| usable(c))
            .min_by_key(|c| c.distance_squared(from))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_area() {
        let zone = Stockpile::new(1, "armory").with_area(Cell::new(0, 0), Cell::new(2, 1));
        assert_eq!(zone.cells.len(), 6);
        assert!(zone.contains(&Cell::new(2, 1)));
        assert!(!zone.contains(&Cell::new(3, 1)));
    }

    #[test]
    fn test_accepts_uses_filter() {
        let zone = Stockpile::new(1, "armory").with_filter(ItemFilter::allow_all().deny("Apparel"));
        let vest = ItemDef::new("Apparel_FlakVest", "flak vest").with_thing_category("Apparel");
        let gun = ItemDef::new("Gun_Revolver", "revolver");
        assert!(!zone.accepts(&vest));
        assert!(zone.accepts(&gun));
    }

    #[test]
    fn test_nearest_cell_skips_unusable() {
        let zone = Stockpile::new(1, "armory").with_area(Cell::new(0, 0), Cell::new(3, 0));
        let from = Cell::new(0, 0);
        let cell = zone.nearest_cell(&from, |c| c.x >= 2);
        assert_eq!(cell, Some(Cell::new(2, 0)));
        assert!(zone.nearest_cell(&from, |_| false).is_none());
    }

    #[test]
    fn test_priority_order() {
        assert!(StoragePriority::Critical > StoragePriority::Normal);
        assert!(StoragePriority::Low < StoragePriority::Preferred);
    }
}
