//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identifier for a repairable item or material stack
///
/// Survives save/reload, so every persisted registry is keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh id with a readable prefix
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{}{}", prefix, Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier for the agent (worker) performing tasks
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier for a workstation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationId(pub String);

impl StationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier for a storage zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

/// Identifier for a repair order attached to a workstation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u32);

/// Kind of material a stack is made of ("Steel", "Cloth", ...)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MaterialKind(pub String);

impl MaterialKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Game tick counter (simulation time unit)
pub type Tick = u64;

/// Integer grid cell on the map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub z: i32,
}

impl Cell {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Squared horizontal distance, used for every radius check
    pub fn distance_squared(&self, other: &Cell) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dz * dz
    }

    /// True if `other` lies within `radius` (inclusive)
    pub fn within(&self, other: &Cell, radius: f32) -> bool {
        (self.distance_squared(other) as f64) <= (radius as f64) * (radius as f64)
    }

    /// Moves needed with diagonal steps allowed
    pub fn chebyshev(&self, other: &Cell) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    /// One step toward `target`, diagonals allowed
    pub fn step_toward(&self, target: &Cell) -> Cell {
        Cell {
            x: self.x + (target.x - self.x).signum(),
            z: self.z + (target.z - self.z).signum(),
        }
    }

    /// The 8 surrounding cells
    pub fn neighbors(&self) -> impl Iterator<Item = Cell> + '_ {
        (-1..=1).flat_map(move |dx| {
            (-1..=1).filter_map(move |dz| {
                if dx == 0 && dz == 0 {
                    None
                } else {
                    Some(Cell::new(self.x + dx, self.z + dz))
                }
            })
        })
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}
