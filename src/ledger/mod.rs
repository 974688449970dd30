//! Persistent quality degradation bookkeeping

pub mod degradation;

pub use degradation::{DegradationLedger, DegradationUpdate, FULL};
