//! Per-game repair state
//!
//! Holds the settings and the three registries the repair systems share.
//! Nothing here is global; a host creates one session per loaded game.

use crate::cache::PropertyCache;
use crate::core::config::{Difficulty, RepairSettings};
use crate::ledger::DegradationLedger;
use crate::persistence::SaveState;
use crate::repair::work::WorkTrackerRegistry;

#[derive(Debug, Clone, Default)]
pub struct RepairSession {
    pub settings: RepairSettings,
    /// Derived data, rebuilt lazily and never saved
    pub cache: PropertyCache,
    pub ledger: DegradationLedger,
    pub trackers: WorkTrackerRegistry,
}

impl RepairSession {
    pub fn new(settings: RepairSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Replace the settings; cached values that depend on them are dropped
    pub fn set_settings(&mut self, settings: RepairSettings) {
        self.settings = settings;
        self.cache.clear_settings_dependent();
    }

    pub fn apply_difficulty(&mut self, difficulty: Difficulty) {
        tracing::info!("applying {:?} repair difficulty", difficulty);
        self.settings.apply_difficulty(difficulty);
        self.cache.clear_settings_dependent();
    }

    /// Persistent part of the session
    pub fn snapshot(&self) -> SaveState {
        SaveState::capture(&self.trackers, &self.ledger)
    }

    /// Session rebuilt from a save, with a fresh cache
    pub fn restore(save: SaveState, settings: RepairSettings) -> Self {
        let (trackers, ledger) = save.into_registries();
        tracing::debug!(
            "restored {} work trackers and {} degradation entries",
            trackers.len(),
            ledger.len()
        );
        Self {
            settings,
            cache: PropertyCache::new(),
            ledger,
            trackers,
        }
    }
}
