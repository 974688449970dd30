use thiserror::Error;

use crate::core::types::StationId;
use crate::item::{describe_materials, MaterialRequirement};

#[derive(Error, Debug)]
pub enum RepairError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown storage policy for order on {0}")]
    UnknownStoragePolicy(StationId),

    #[error("Unsupported save version: {0}")]
    UnsupportedSaveVersion(u32),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, RepairError>;

/// Why a repair cannot be offered or started
///
/// The `Display` text is what a player sees next to the rejected action.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepairRejection {
    #[error("item is not on the map")]
    NotSpawned,

    #[error("forbidden")]
    Forbidden,

    #[error("item is burning")]
    Burning,

    #[error("too damaged to repair")]
    TooDamaged,

    #[error("already in repaired condition")]
    FullyRepaired,

    #[error("cannot be repaired")]
    NotRepairableKind,

    #[error("reserved by someone else")]
    Reserved,

    #[error("no path")]
    NoPath,

    #[error("outside the order's search radius")]
    OutOfRadius,

    #[error("not allowed by the order's filter")]
    FilteredOut,

    #[error("repair chance too low ({0}%)")]
    ChanceTooLow(i32),

    #[error("not assigned to repair work")]
    NotAssigned,

    #[error("lacks the skill required")]
    NoSkill,

    #[error("no repair table available")]
    NoWorkstation,

    #[error("repair table cannot be used right now")]
    StationUnusable,

    #[error("no repairable items")]
    NoItems,

    #[error("no known repair cost")]
    NoCostData,

    #[error("missing materials ({})", describe_materials(.0))]
    MissingMaterials(Vec<MaterialRequirement>),
}
