//! Demo workshop used by the CLI and integration tests

use std::sync::Arc;

use crate::core::types::{Cell, StationId};
use crate::item::{ItemDef, MaterialStack, QualityTier, RepairableItem, StuffProps, TechLevel};
use crate::spatial::RegionGraph;
use crate::world::agent::Agent;
use crate::world::map::RepairMap;
use crate::world::station::{RepairOrder, StoragePolicy, Workstation};
use crate::world::stockpile::{Stockpile, StoragePriority};

/// A map plus the agents working on it
#[derive(Debug, Clone)]
pub struct Workshop {
    pub map: RepairMap,
    pub agents: Vec<Agent>,
    pub station: StationId,
}

pub fn revolver_def() -> ItemDef {
    ItemDef::new("Gun_Revolver", "revolver")
        .with_thing_category("WeaponsRanged")
        .with_cost("Steel", 30)
        .with_cost("Components", 2)
        .with_recipe_maker_work(1200.0)
        .with_research("Gunsmithing")
}

pub fn knife_def() -> ItemDef {
    ItemDef::new("MeleeWeapon_Knife", "knife")
        .with_thing_category("WeaponsMelee")
        .with_tech_level(TechLevel::Neolithic)
        .melee()
        .with_cost("Steel", 40)
        .with_recipe_work(800.0)
}

pub fn flak_vest_def() -> ItemDef {
    ItemDef::new("Apparel_FlakVest", "flak vest")
        .apparel()
        .with_thing_category("ApparelArmor")
        .with_trade_tag("Armor")
        .with_cost("Steel", 60)
        .with_cost("Components", 1)
        .with_work_to_make(1600.0)
        .with_research("FlakArmor")
}

/// Workshop room, storeroom and a private bedroom
///
/// ```text
///  z 10..19  bedroom (only Ada may enter)
///  z  0..9   workshop (x 0..9) | storeroom (x 10..19)
/// ```
pub fn demo_workshop() -> Workshop {
    let mut regions = RegionGraph::new();
    let workshop = regions.add_region(Cell::new(0, 0), Cell::new(9, 9));
    let storeroom = regions.add_region(Cell::new(10, 0), Cell::new(19, 9));
    let bedroom = regions.add_region(Cell::new(0, 10), Cell::new(9, 19));
    regions.connect(workshop, storeroom);
    regions.connect(workshop, bedroom);

    let ada = Agent::new("ada", "Ada", Cell::new(2, 2))
        .with_skill(8)
        .with_repair_success(0.9);
    let ben = Agent::new("ben", "Ben", Cell::new(3, 1))
        .with_skill(3)
        .with_repair_success(0.6);
    regions.restrict(bedroom, [ada.id.clone()]);

    let mut map = RepairMap::new(regions);
    map.complete_research("Gunsmithing");

    let station = map.add_station(
        Workstation::new("repair_bench", Cell::new(5, 5))
            .with_interaction_cell(Cell::new(5, 4))
            .with_staging_cells(vec![Cell::new(5, 5)])
            .with_order(
                RepairOrder::new(1)
                    .with_radius(30.0)
                    .with_store(StoragePolicy::BestStockpile),
            ),
    );

    map.add_item(
        RepairableItem::new("Gun_Revolver1", Arc::new(revolver_def()), 100)
            .with_hit_points(50)
            .with_quality(Some(QualityTier::Good))
            .at(Cell::new(3, 3)),
    );
    map.add_item(
        RepairableItem::new("MeleeWeapon_Knife1", Arc::new(knife_def()), 100)
            .with_hit_points(80)
            .with_stuff(StuffProps::new("Steel", 1.0))
            .at(Cell::new(12, 4)),
    );
    map.add_item(
        RepairableItem::new("Apparel_FlakVest1", Arc::new(flak_vest_def()), 300)
            .with_hit_points(120)
            .with_quality(Some(QualityTier::Excellent))
            .tainted()
            .at(Cell::new(14, 6)),
    );

    map.add_stack(MaterialStack::new("Steel", 75, Cell::new(15, 2)).with_id("Steel1"));
    map.add_stack(MaterialStack::new("Steel", 40, Cell::new(16, 2)).with_id("Steel2"));
    map.add_stack(MaterialStack::new("Components", 10, Cell::new(17, 2)).with_id("Components1"));
    // Leftovers someone dropped on the bench
    map.add_stack(MaterialStack::new("Cloth", 5, Cell::new(5, 5)).with_id("Cloth1"));

    map.add_stockpile(
        Stockpile::new(1, "armory")
            .with_area(Cell::new(11, 7), Cell::new(13, 8))
            .with_priority(StoragePriority::Preferred),
    );

    Workshop {
        map,
        agents: vec![ada, ben],
        station,
    }
}
