//! Host world model: map contents, agents, workstations and storage

pub mod agent;
pub mod map;
pub mod reservations;
pub mod scenario;
pub mod station;
pub mod stockpile;

pub use agent::{Agent, Carried};
pub use map::RepairMap;
pub use reservations::{ReservationService, ReservationTable, Target};
pub use scenario::{demo_workshop, Workshop};
pub use station::{ItemFilter, RepairOrder, RepeatMode, StoragePolicy, Workstation};
pub use stockpile::{Stockpile, StoragePriority};
