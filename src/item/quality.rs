//! Quality tiers and tech levels

use serde::{Deserialize, Serialize};

/// Ordinal quality rank of a crafted item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum QualityTier {
    Awful = 0,
    Poor = 1,
    Normal = 2,
    Good = 3,
    Excellent = 4,
    Masterwork = 5,
    Legendary = 6,
}

impl QualityTier {
    pub const ALL: [QualityTier; 7] = [
        QualityTier::Awful,
        QualityTier::Poor,
        QualityTier::Normal,
        QualityTier::Good,
        QualityTier::Excellent,
        QualityTier::Masterwork,
        QualityTier::Legendary,
    ];

    /// One tier lower, or None at Awful
    pub fn demoted(self) -> Option<QualityTier> {
        match self {
            QualityTier::Awful => None,
            other => Some(Self::ALL[other as usize - 1]),
        }
    }

    /// Masterwork and Legendary degrade at the "master" rate
    pub fn is_top_tier(self) -> bool {
        self > QualityTier::Excellent
    }

    /// Success-chance multiplier by quality
    ///
    /// Balanced so a level 20 crafter has at least 70% chance on a
    /// Legendary item at half condition, and a level 9 crafter the same
    /// on a Poor one.
    pub fn repair_chance_multiplier(self) -> f32 {
        match self {
            QualityTier::Awful => 1.8,
            QualityTier::Poor => 1.5,
            QualityTier::Normal => 1.3,
            QualityTier::Good => 1.1,
            QualityTier::Excellent => 1.0,
            QualityTier::Masterwork => 0.9,
            QualityTier::Legendary => 0.8,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QualityTier::Awful => "awful",
            QualityTier::Poor => "poor",
            QualityTier::Normal => "normal",
            QualityTier::Good => "good",
            QualityTier::Excellent => "excellent",
            QualityTier::Masterwork => "masterwork",
            QualityTier::Legendary => "legendary",
        }
    }
}

/// Technology tier of an item or a faction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TechLevel {
    Undefined = 0,
    Animal = 1,
    Neolithic = 2,
    Medieval = 3,
    Industrial = 4,
    Spacer = 5,
    Ultra = 6,
    Archotech = 7,
}

impl TechLevel {
    /// Signed tier difference `self - other`
    pub fn gap_over(self, other: TechLevel) -> i32 {
        self as i32 - other as i32
    }
}
