//! Repair Bench - workstation repair simulation
//!
//! Agents haul damaged gear and materials to a repair table, work on it
//! over many ticks and roll an outcome. Progress and quality degradation
//! survive interruptions and save/load.

pub mod cache;
pub mod core;
pub mod item;
pub mod ledger;
pub mod persistence;
pub mod repair;
pub mod spatial;
pub mod world;
