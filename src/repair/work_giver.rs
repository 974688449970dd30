//! Work giver: picks the next repair for an idle agent at one workstation
//!
//! Walks the station's orders in list order. For each runnable order it
//! collects the repairable items in reach and takes the first one whose
//! materials can be found. Orders that find nothing back off for a random
//! 500-600 ticks before searching again.

use std::ops::RangeInclusive;

use rand::Rng;

use crate::core::error::RepairRejection;
use crate::core::types::{ItemId, OrderId, StationId};
use crate::repair::allocator::{find_ingredients, find_repairable_items, Allocation};
use crate::repair::session::RepairSession;
use crate::repair::task::RepairTask;
use crate::world::agent::Agent;
use crate::world::map::RepairMap;
use crate::world::reservations::{ReservationService, Target};
use crate::world::station::Workstation;

/// Ticks an order waits after a failed ingredient search
pub const INGREDIENT_SEARCH_BACKOFF: RangeInclusive<u64> = 500..=600;

/// Find a repair task for `agent` at the station `station_id`
///
/// Returns the reason no task could be made. When some item was only
/// missing materials, that shortfall is what gets reported.
pub fn find_repair_task(
    map: &mut RepairMap,
    agent: &Agent,
    station_id: &StationId,
    session: &mut RepairSession,
    rng: &mut impl Rng,
) -> Result<RepairTask, RepairRejection> {
    if !agent.assigned_to_repair {
        return Err(RepairRejection::NotAssigned);
    }

    let station = {
        let station = map
            .station_mut(station_id)
            .ok_or(RepairRejection::NoWorkstation)?;
        if !station.currently_usable() || station.burning || station.forbidden {
            return Err(RepairRejection::StationUnusable);
        }
        station.remove_incompletable_orders();
        station.clone()
    };

    if !map
        .reservations
        .can_reserve(&agent.id, &Target::Station(station.id.clone()))
    {
        return Err(RepairRejection::Reserved);
    }
    if !map.can_reach(&agent.id, &agent.position, &station.interaction_cell)
        || !map
            .reservations
            .can_reserve(&agent.id, &Target::Cell(station.interaction_cell))
    {
        return Err(RepairRejection::NoPath);
    }

    let RepairSession { settings, cache, .. } = session;
    let mut shortfall = None;

    for order in &station.orders {
        if let Some(last_fail) = order.last_search_fail_tick {
            if map.tick < last_fail + rng.gen_range(INGREDIENT_SEARCH_BACKOFF) {
                continue;
            }
        }
        if !order.should_do_now() {
            continue;
        }
        if agent.skill_level < order.min_skill {
            return Err(RepairRejection::NoSkill);
        }

        let candidates = find_repairable_items(map, agent, &station, order, settings, cache);
        for id in &candidates {
            let Some(item) = map.item(id) else {
                continue;
            };
            match find_ingredients(map, agent, &station, Some(order), item, settings, cache) {
                Ok(allocation) => {
                    tracing::debug!("{} will repair {} at {}", agent.name, id, station.id);
                    return Ok(create_repair_task(&station, id.clone(), &allocation, Some(order.id)));
                }
                Err(missing @ RepairRejection::MissingMaterials(_)) => shortfall = Some(missing),
                Err(reason) => tracing::trace!("skipping {}: {}", id, reason),
            }
        }

        tracing::debug!(
            "order {:?} on {} found nothing among {} candidates",
            order.id,
            station.id,
            candidates.len()
        );
        let tick = map.tick;
        if let Some(stored) = map
            .station_mut(&station.id)
            .and_then(|s| s.order_mut(order.id))
        {
            stored.last_search_fail_tick = Some(tick);
        }
    }

    Err(shortfall.unwrap_or(RepairRejection::NoItems))
}

/// Task that hauls the allocation to `station` and repairs `item` there
pub fn create_repair_task(
    station: &Workstation,
    item: ItemId,
    allocation: &Allocation,
    order: Option<OrderId>,
) -> RepairTask {
    RepairTask::new(station.id.clone(), order, item, allocation.materials())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Cell;
    use crate::item::MaterialStack;
    use crate::repair::task::Step;
    use crate::world::scenario::demo_workshop;
    use crate::world::station::RepeatMode;
    use rand::rngs::mock::StepRng;

    fn rng() -> StepRng {
        StepRng::new(0, 0)
    }

    #[test]
    fn test_picks_nearest_repairable_item() {
        let mut shop = demo_workshop();
        let mut session = RepairSession::default();
        let ada = shop.agents[0].clone();

        let task = find_repair_task(&mut shop.map, &ada, &shop.station, &mut session, &mut rng())
            .expect("Should find a task");

        assert_eq!(task.item, ItemId::new("Gun_Revolver1"));
        assert_eq!(task.order, Some(OrderId(1)));
        assert_eq!(task.step(), Step::Reserve);
        // Item first, then 15 steel and 1 component
        let queued: Vec<_> = task.queued().map(|t| (t.id.as_str().to_string(), t.count)).collect();
        assert_eq!(
            queued,
            vec![
                ("Gun_Revolver1".to_string(), 1),
                ("Steel1".to_string(), 15),
                ("Components1".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_unassigned_agent_rejected() {
        let mut shop = demo_workshop();
        let mut session = RepairSession::default();
        let mut ada = shop.agents[0].clone();
        ada.assigned_to_repair = false;

        let result = find_repair_task(&mut shop.map, &ada, &shop.station, &mut session, &mut rng());
        assert_eq!(result.err(), Some(RepairRejection::NotAssigned));
    }

    #[test]
    fn test_reserved_station_rejected() {
        let mut shop = demo_workshop();
        let mut session = RepairSession::default();
        let ada = shop.agents[0].clone();
        let ben = shop.agents[1].clone();
        shop.map
            .reservations
            .reserve(&ben.id, Target::Station(shop.station.clone()));

        let result = find_repair_task(&mut shop.map, &ada, &shop.station, &mut session, &mut rng());
        assert_eq!(result.err(), Some(RepairRejection::Reserved));
    }

    #[test]
    fn test_low_skill_rejected() {
        let mut shop = demo_workshop();
        let mut session = RepairSession::default();
        let ben = shop.agents[1].clone();
        if let Some(order) = shop
            .map
            .station_mut(&shop.station)
            .and_then(|s| s.order_mut(OrderId(1)))
        {
            order.min_skill = 10;
        }

        let result = find_repair_task(&mut shop.map, &ben, &shop.station, &mut session, &mut rng());
        assert_eq!(result.err(), Some(RepairRejection::NoSkill));
    }

    #[test]
    fn test_missing_materials_reported_and_backoff() {
        let mut shop = demo_workshop();
        let mut session = RepairSession::default();
        let ada = shop.agents[0].clone();
        shop.map.stacks.retain(|_, s| s.kind.0 != "Steel");
        // The knife repairs for free, keep only items that need steel
        shop.map.items.retain(|id, _| id.as_str() != "MeleeWeapon_Knife1");
        shop.map.tick = 1000;

        let result = find_repair_task(&mut shop.map, &ada, &shop.station, &mut session, &mut rng());
        assert!(matches!(result, Err(RepairRejection::MissingMaterials(_))));

        let order = shop
            .map
            .station(&shop.station)
            .and_then(|s| s.order(OrderId(1)))
            .expect("Should exist");
        assert_eq!(order.last_search_fail_tick, Some(1000));

        // Steel arrives, but the order is still backing off
        shop.map
            .add_stack(MaterialStack::new("Steel", 75, Cell::new(4, 4)).with_id("Steel9"));
        shop.map.tick = 1300;
        let result = find_repair_task(&mut shop.map, &ada, &shop.station, &mut session, &mut rng());
        assert_eq!(result.err(), Some(RepairRejection::NoItems));

        shop.map.tick = 1700;
        let task = find_repair_task(&mut shop.map, &ada, &shop.station, &mut session, &mut rng())
            .expect("Should retry after backoff");
        assert_eq!(task.item, ItemId::new("Gun_Revolver1"));
    }

    #[test]
    fn test_finished_count_order_removed() {
        let mut shop = demo_workshop();
        let mut session = RepairSession::default();
        let ada = shop.agents[0].clone();
        if let Some(station) = shop.map.station_mut(&shop.station) {
            station.orders[0].repeat = RepeatMode::Count(0);
        }

        let result = find_repair_task(&mut shop.map, &ada, &shop.station, &mut session, &mut rng());
        assert_eq!(result.err(), Some(RepairRejection::NoItems));
        assert!(shop
            .map
            .station(&shop.station)
            .is_some_and(|s| s.orders.is_empty()));
    }
}
