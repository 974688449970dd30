//! Repair settings with documented constants and difficulty presets
//!
//! The values below are the tunables an operator can change; the three
//! difficulty presets overwrite a subset of them in bulk.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{RepairError, Result};

/// Lowest allowed minimum repair chance
pub const MINIMUM_REPAIR_CHANCE: f32 = 0.1;

/// Lowest allowed partial-success restoration fraction
pub const MINIMUM_REPAIR_AMOUNT: f32 = 0.05;

/// Lowest allowed "irreparably damaged" condition threshold
pub const MINIMUM_IRREPARABLE_THRESHOLD: f32 = 0.12;

/// Bounds of the success-chance multiplier slider
pub const REPAIR_CHANCE_MULTIPLIER_RANGE: (f32, f32) = (0.1, 10.0);

/// Difficulty preset an operator can apply in one go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Challenging,
}

impl Difficulty {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" => Some(Difficulty::Normal),
            "challenging" | "hard" => Some(Difficulty::Challenging),
            _ => None,
        }
    }
}

/// Preset values: (easy, normal, challenging)
struct Preset {
    easy: f32,
    normal: f32,
    challenging: f32,
}

impl Preset {
    const fn new(easy: f32, normal: f32, challenging: f32) -> Self {
        Self { easy, normal, challenging }
    }

    fn get(&self, difficulty: Difficulty) -> f32 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Normal => self.normal,
            Difficulty::Challenging => self.challenging,
        }
    }
}

const PARTIAL_SUCCESS_REPAIR_AMOUNT: Preset = Preset::new(0.5, 0.25, 0.15);
const IRREPARABLE_THRESHOLD: Preset = Preset::new(0.12, 0.25, 0.35);
const COST_FREE_THRESHOLD: Preset = Preset::new(0.9, 0.95, 0.99);
const GENERIC_QUALITY_DEGRADATION: Preset = Preset::new(0.2, 0.5, 0.8);
const MASTER_QUALITY_DEGRADATION: Preset = Preset::new(0.1, 0.25, 0.4);
const REPAIR_CHANCE_MULTIPLIER: Preset = Preset::new(2.0, 1.0, 1.0);

/// Settings for the repair systems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairSettings {
    /// Keep the "worn by a corpse" taint on armor after a repair
    pub taint_removal_disabled: bool,

    /// Turn off the cheap-maintenance rule for pre-industrial weapons
    pub maintenance_only_disabled: bool,

    /// Items whose adjusted chance falls below this are not offered for repair
    pub minimum_repair_chance: f32,

    /// Fraction of the repairable band restored by a partial success
    pub partial_success_repair_amount: f32,

    /// Condition below which an ordinary item can no longer be repaired
    ///
    /// Also the lower bound of the ordinary repairable band.
    pub irreparable_threshold: f32,

    /// Condition at or above which repairs cost no materials
    pub cost_free_threshold: f32,

    /// Degradation rate for items up to Excellent quality
    pub generic_quality_degradation: f32,

    /// Degradation rate for Masterwork and Legendary items
    pub master_quality_degradation: f32,

    /// Multiplier applied to every adjusted success chance
    pub repair_chance_multiplier: f32,

    /// Skill experience granted per work tick
    pub skill_exp_per_tick: f32,

    /// Extra skill experience for a successful repair
    ///
    /// 500 ticks worth of per-tick experience.
    pub success_skill_exp_bonus: f32,
}

impl Default for RepairSettings {
    fn default() -> Self {
        Self::preset(Difficulty::Normal)
    }
}

impl RepairSettings {
    /// Settings with every preset-driven value taken from `difficulty`
    pub fn preset(difficulty: Difficulty) -> Self {
        let skill_exp_per_tick = 0.05;
        Self {
            taint_removal_disabled: false,
            maintenance_only_disabled: false,
            minimum_repair_chance: MINIMUM_REPAIR_CHANCE,
            partial_success_repair_amount: PARTIAL_SUCCESS_REPAIR_AMOUNT.get(difficulty),
            irreparable_threshold: IRREPARABLE_THRESHOLD.get(difficulty),
            cost_free_threshold: COST_FREE_THRESHOLD.get(difficulty),
            generic_quality_degradation: GENERIC_QUALITY_DEGRADATION.get(difficulty),
            master_quality_degradation: MASTER_QUALITY_DEGRADATION.get(difficulty),
            repair_chance_multiplier: REPAIR_CHANCE_MULTIPLIER.get(difficulty),
            skill_exp_per_tick,
            success_skill_exp_bonus: skill_exp_per_tick * 500.0,
        }
    }

    /// Overwrite the six preset-driven values, leaving toggles alone
    pub fn apply_difficulty(&mut self, difficulty: Difficulty) {
        self.partial_success_repair_amount = PARTIAL_SUCCESS_REPAIR_AMOUNT.get(difficulty);
        self.irreparable_threshold = IRREPARABLE_THRESHOLD.get(difficulty);
        self.cost_free_threshold = COST_FREE_THRESHOLD.get(difficulty);
        self.generic_quality_degradation = GENERIC_QUALITY_DEGRADATION.get(difficulty);
        self.master_quality_degradation = MASTER_QUALITY_DEGRADATION.get(difficulty);
        self.repair_chance_multiplier = REPAIR_CHANCE_MULTIPLIER.get(difficulty);
    }

    /// Copy with every slider pulled back inside its bounds
    pub fn clamped(&self) -> Self {
        let (min_mult, max_mult) = REPAIR_CHANCE_MULTIPLIER_RANGE;
        Self {
            minimum_repair_chance: self.minimum_repair_chance.clamp(MINIMUM_REPAIR_CHANCE, 1.0),
            partial_success_repair_amount: self
                .partial_success_repair_amount
                .clamp(MINIMUM_REPAIR_AMOUNT, 1.0),
            irreparable_threshold: self
                .irreparable_threshold
                .clamp(MINIMUM_IRREPARABLE_THRESHOLD, 1.0),
            cost_free_threshold: self
                .cost_free_threshold
                .clamp(MINIMUM_IRREPARABLE_THRESHOLD, 1.0),
            generic_quality_degradation: self.generic_quality_degradation.clamp(0.0, 1.0),
            master_quality_degradation: self.master_quality_degradation.clamp(0.0, 1.0),
            repair_chance_multiplier: self.repair_chance_multiplier.clamp(min_mult, max_mult),
            ..self.clone()
        }
    }

    /// Validate configuration against the slider bounds
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f32, min: f32| -> Result<()> {
            if !(min..=1.0).contains(&value) {
                return Err(RepairError::InvalidConfig(format!(
                    "{} ({}) must be within [{}, 1]",
                    name, value, min
                )));
            }
            Ok(())
        };

        unit("minimum_repair_chance", self.minimum_repair_chance, MINIMUM_REPAIR_CHANCE)?;
        unit(
            "partial_success_repair_amount",
            self.partial_success_repair_amount,
            MINIMUM_REPAIR_AMOUNT,
        )?;
        unit(
            "irreparable_threshold",
            self.irreparable_threshold,
            MINIMUM_IRREPARABLE_THRESHOLD,
        )?;
        unit(
            "cost_free_threshold",
            self.cost_free_threshold,
            MINIMUM_IRREPARABLE_THRESHOLD,
        )?;
        unit("generic_quality_degradation", self.generic_quality_degradation, 0.0)?;
        unit("master_quality_degradation", self.master_quality_degradation, 0.0)?;

        let (min_mult, max_mult) = REPAIR_CHANCE_MULTIPLIER_RANGE;
        if !(min_mult..=max_mult).contains(&self.repair_chance_multiplier) {
            return Err(RepairError::InvalidConfig(format!(
                "repair_chance_multiplier ({}) must be within [{}, {}]",
                self.repair_chance_multiplier, min_mult, max_mult
            )));
        }

        Ok(())
    }

    /// Load settings from a TOML file
    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse settings from a TOML string
    ///
    /// A `difficulty` key selects the base preset; any other key overrides it.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let file: TomlSettings = toml::from_str(content)?;
        let settings = file.into_settings()?;
        settings.validate()?;
        Ok(settings)
    }
}

/// TOML representation of a settings file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlSettings {
    difficulty: Option<String>,
    taint_removal_disabled: Option<bool>,
    maintenance_only_disabled: Option<bool>,
    minimum_repair_chance: Option<f32>,
    partial_success_repair_amount: Option<f32>,
    irreparable_threshold: Option<f32>,
    cost_free_threshold: Option<f32>,
    generic_quality_degradation: Option<f32>,
    master_quality_degradation: Option<f32>,
    repair_chance_multiplier: Option<f32>,
}

impl TomlSettings {
    fn into_settings(self) -> Result<RepairSettings> {
        let difficulty = match self.difficulty {
            Some(name) => Difficulty::parse(&name)
                .ok_or_else(|| RepairError::InvalidConfig(format!("unknown difficulty '{}'", name)))?,
            None => Difficulty::Normal,
        };

        let mut settings = RepairSettings::preset(difficulty);
        if let Some(v) = self.taint_removal_disabled {
            settings.taint_removal_disabled = v;
        }
        if let Some(v) = self.maintenance_only_disabled {
            settings.maintenance_only_disabled = v;
        }
        if let Some(v) = self.minimum_repair_chance {
            settings.minimum_repair_chance = v;
        }
        if let Some(v) = self.partial_success_repair_amount {
            settings.partial_success_repair_amount = v;
        }
        if let Some(v) = self.irreparable_threshold {
            settings.irreparable_threshold = v;
        }
        if let Some(v) = self.cost_free_threshold {
            settings.cost_free_threshold = v;
        }
        if let Some(v) = self.generic_quality_degradation {
            settings.generic_quality_degradation = v;
        }
        if let Some(v) = self.master_quality_degradation {
            settings.master_quality_degradation = v;
        }
        if let Some(v) = self.repair_chance_multiplier {
            settings.repair_chance_multiplier = v;
        }
        Ok(settings)
    }
}
