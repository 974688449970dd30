//! Repair system: eligibility, chance, allocation, work and the repair task

pub mod allocator;
pub mod chance;
pub mod eligibility;
pub mod outcome;
pub mod scheduler;
pub mod session;
pub mod task;
pub mod work;
pub mod work_giver;

pub use allocator::{find_ingredients, find_repairable_items, try_find_best_ingredients, Allocation, ThingCount};
pub use chance::{adjusted_repair_chance, chance_to_display, repair_chance_allowed};
pub use eligibility::{can_be_maintenanced, compute_repair_cost, is_repairable_now, OrderScope};
pub use outcome::{apply_outcome, AppliedOutcome, OutcomeRanges, RollResult};
pub use scheduler::{run_workshop, RepairRecord, RunSummary};
pub use session::RepairSession;
pub use task::{AbortReason, RepairTask, Step, TaskEvent, TaskStatus, TickOutcome};
pub use work::{compute_total_work, TrackerClaim, WorkTracker, WorkTrackerRegistry};
pub use work_giver::{create_repair_task, find_repair_task};
