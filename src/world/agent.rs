//! Worker agents

use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, Cell, ItemId};
use crate::item::{MaterialStack, TechLevel};

/// Experience needed per crafting skill level
pub const EXP_PER_LEVEL: f32 = 1000.0;

/// Highest crafting skill level
pub const MAX_SKILL_LEVEL: u32 = 20;

/// What an agent holds in its hands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Carried {
    /// A repairable item, kept in the map's item table while carried
    Item(ItemId),
    /// A material stack, removed from the map while carried
    Stack(MaterialStack),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub position: Cell,
    /// Global work speed (1.0 = normal)
    pub work_speed: f32,
    pub skill_level: u32,
    pub skill_exp: f32,
    /// Base repair success stat before item modifiers
    pub repair_success: f32,
    pub faction_tech: TechLevel,
    /// Whether the agent takes repair work at all
    pub assigned_to_repair: bool,
    pub carrying: Option<Carried>,
}

impl Agent {
    pub fn new(id: impl Into<String>, name: impl Into<String>, position: Cell) -> Self {
        Self {
            id: AgentId::new(id),
            name: name.into(),
            position,
            work_speed: 1.0,
            skill_level: 0,
            skill_exp: 0.0,
            repair_success: 0.5,
            faction_tech: TechLevel::Industrial,
            assigned_to_repair: true,
            carrying: None,
        }
    }

    pub fn with_skill(mut self, level: u32) -> Self {
        self.skill_level = level.min(MAX_SKILL_LEVEL);
        self
    }

    pub fn with_repair_success(mut self, value: f32) -> Self {
        self.repair_success = value;
        self
    }

    pub fn with_work_speed(mut self, speed: f32) -> Self {
        self.work_speed = speed;
        self
    }

    pub fn with_faction_tech(mut self, tech: TechLevel) -> Self {
        self.faction_tech = tech;
        self
    }

    /// Gain crafting experience; returns levels gained
    pub fn learn(&mut self, exp: f32) -> u32 {
        if exp <= 0.0 || self.skill_level >= MAX_SKILL_LEVEL {
            return 0;
        }
        self.skill_exp += exp;

        let mut gained = 0;
        while self.skill_exp >= EXP_PER_LEVEL && self.skill_level < MAX_SKILL_LEVEL {
            self.skill_exp -= EXP_PER_LEVEL;
            self.skill_level += 1;
            gained += 1;
        }
        if gained > 0 {
            tracing::info!("{} reached crafting level {}", self.name, self.skill_level);
        }
        gained
    }

    pub fn is_carrying(&self) -> bool {
        self.carrying.is_some()
    }

    /// Move one cell toward `target`; true once standing on it
    pub fn step_toward(&mut self, target: &Cell) -> bool {
        if self.position != *target {
            self.position = self.position.step_toward(target);
        }
        self.position == *target
    }
}
