//! Spatial connectivity used by item and ingredient searches

pub mod region;

pub use region::{Region, RegionGraph, RegionId, MAX_REGIONS_TO_SEARCH};
