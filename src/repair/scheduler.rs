//! Tick driver for a workshop
//!
//! Agents are visited in order once per tick. An idle agent searches for
//! work and, when it finds some, its task runs straight away so the
//! station and haul targets are reserved before the next agent searches.

use rand::Rng;

use crate::core::types::{AgentId, ItemId, Tick};
use crate::repair::session::RepairSession;
use crate::repair::task::{AbortReason, RepairTask, TaskEvent, TaskStatus};
use crate::repair::work_giver::find_repair_task;
use crate::world::scenario::Workshop;

/// One finished repair
#[derive(Debug, Clone, PartialEq)]
pub struct RepairRecord {
    pub item: ItemId,
    pub agent: AgentId,
    pub label: String,
    pub tick: Tick,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub ticks: Tick,
    pub repairs: Vec<RepairRecord>,
    pub aborts: Vec<(AgentId, ItemId, AbortReason)>,
}

/// Run `shop` until nobody has work or `max_ticks` pass
pub fn run_workshop(
    shop: &mut Workshop,
    session: &mut RepairSession,
    rng: &mut impl Rng,
    max_ticks: Tick,
) -> RunSummary {
    let mut tasks: Vec<Option<RepairTask>> = vec![None; shop.agents.len()];
    let mut summary = RunSummary::default();

    while summary.ticks < max_ticks {
        shop.map.tick = summary.ticks;
        summary.ticks += 1;
        let mut busy = false;

        for (agent, slot) in shop.agents.iter_mut().zip(tasks.iter_mut()) {
            if slot.is_none() {
                match find_repair_task(&mut shop.map, agent, &shop.station, session, rng) {
                    Ok(task) => *slot = Some(task),
                    Err(reason) => tracing::trace!("{} idle: {}", agent.name, reason),
                }
            }
            let Some(task) = slot else {
                continue;
            };
            busy = true;

            let outcome = task.tick(agent, &mut shop.map, session, rng);
            for event in outcome.events {
                if let TaskEvent::Finished { label, .. } = event {
                    summary.repairs.push(RepairRecord {
                        item: task.item.clone(),
                        agent: agent.id.clone(),
                        label,
                        tick: shop.map.tick,
                    });
                }
            }
            match outcome.status {
                TaskStatus::Running => {}
                TaskStatus::Succeeded => *slot = None,
                TaskStatus::Incomplete(reason) => {
                    tracing::warn!("{} stopped repairing {}: {:?}", agent.name, task.item, reason);
                    summary.aborts.push((agent.id.clone(), task.item.clone(), reason));
                    *slot = None;
                }
            }
        }

        if !busy {
            tracing::info!("nothing left to repair after {} ticks", summary.ticks);
            break;
        }
    }

    summary
}
