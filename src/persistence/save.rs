//! JSON save state for work trackers and the degradation ledger
//!
//! Maps are written as `BTreeMap`s so the same state always produces the
//! same file.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{RepairError, Result};
use crate::core::types::ItemId;
use crate::ledger::DegradationLedger;
use crate::repair::work::{WorkTracker, WorkTrackerRegistry};

pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveState {
    pub version: u32,
    #[serde(default)]
    pub work_trackers: BTreeMap<ItemId, WorkTracker>,
    #[serde(default)]
    pub degradation: BTreeMap<ItemId, f32>,
}

impl Default for SaveState {
    fn default() -> Self {
        Self {
            version: SAVE_VERSION,
            work_trackers: BTreeMap::new(),
            degradation: BTreeMap::new(),
        }
    }
}

impl SaveState {
    pub fn capture(trackers: &WorkTrackerRegistry, ledger: &DegradationLedger) -> Self {
        Self {
            version: SAVE_VERSION,
            work_trackers: trackers
                .iter()
                .map(|(id, t)| (id.clone(), t.clone()))
                .collect(),
            degradation: ledger.iter().map(|(id, v)| (id.clone(), v)).collect(),
        }
    }

    pub fn into_registries(self) -> (WorkTrackerRegistry, DegradationLedger) {
        let mut trackers = WorkTrackerRegistry::new();
        for (id, tracker) in self.work_trackers {
            trackers.insert(id, tracker);
        }
        let mut ledger = DegradationLedger::new();
        for (id, value) in self.degradation {
            ledger.insert_raw(id, value);
        }
        (trackers, ledger)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let state: SaveState = serde_json::from_str(json)?;
        if state.version != SAVE_VERSION {
            return Err(RepairError::UnsupportedSaveVersion(state.version));
        }
        Ok(state)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        tracing::debug!("saved repair state to {}", path.display());
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::AgentId;
    use crate::item::MaterialRequirement;
    use crate::repair::outcome::RollResult;

    fn sample() -> SaveState {
        let mut trackers = WorkTrackerRegistry::new();
        let mut tracker = WorkTracker::new(
            AgentId::new("ada"),
            900.0,
            0.5,
            vec![MaterialRequirement::new("Steel", 15)],
        );
        tracker.advance(350.0);
        tracker.roll_result = RollResult::PartialSuccess;
        tracker.result_label = Some("Partially repaired (62%)".into());
        trackers.insert(ItemId::new("Gun1"), tracker);

        let mut ledger = DegradationLedger::new();
        ledger.insert_raw(ItemId::new("Gun1"), 0.75);
        SaveState::capture(&trackers, &ledger)
    }

    #[test]
    fn test_json_roundtrip() {
        let state = sample();
        let json = state.to_json().expect("Should serialize");
        let loaded = SaveState::from_json(&json).expect("Should parse");
        assert_eq!(loaded, state);

        let tracker = &loaded.work_trackers[&ItemId::new("Gun1")];
        assert_eq!(tracker.work_left, 550.0);
        assert!(tracker.has_rolled());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let json = r#"{ "version": 7, "work_trackers": {}, "degradation": {} }"#;
        match SaveState::from_json(json) {
            Err(RepairError::UnsupportedSaveVersion(7)) => {}
            other => panic!("Expected version error, got {:?}", other),
        }
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("repair.json");
        let state = sample();

        state.save_to_file(&path).expect("Should write");
        let loaded = SaveState::load_from_file(&path).expect("Should read");
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let result = SaveState::load_from_file(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(RepairError::IoError(_))));
    }
}
