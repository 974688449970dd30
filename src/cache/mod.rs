//! Memoization of per-item classification results

pub mod properties;

pub use properties::{CachedItemProperties, CachedRepairCost, ConditionKey, PropertyCache};
