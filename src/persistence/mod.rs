//! Saving and loading repair progress

pub mod save;

pub use save::{SaveState, SAVE_VERSION};
