pub mod config;
pub mod error;
pub mod types;

pub use config::{Difficulty, RepairSettings};
pub use error::{RepairError, RepairRejection, Result};
pub use types::{AgentId, Cell, ItemId, MaterialKind, OrderId, StationId, Tick, ZoneId};
