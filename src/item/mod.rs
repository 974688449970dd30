//! Item layer - definitions, quality, materials and repairable items

pub mod def;
pub mod material;
pub mod quality;
pub mod repairable;

pub use def::{is_disallowed_name, ItemCategory, ItemDef, StuffProps};
pub use material::{describe_materials, MaterialRequirement, MaterialStack};
pub use quality::{QualityTier, TechLevel};
pub use repairable::RepairableItem;
