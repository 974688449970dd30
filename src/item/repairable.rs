//! The damaged, degradable item a repair targets

use std::sync::Arc;

use crate::core::types::{Cell, ItemId};
use crate::item::def::{ItemDef, StuffProps};
use crate::item::quality::QualityTier;

/// A repairable item on the map
///
/// Owned by the host; repairs mutate hit points, quality and taint.
#[derive(Debug, Clone)]
pub struct RepairableItem {
    pub id: ItemId,
    pub def: Arc<ItemDef>,
    pub stuff: Option<StuffProps>,
    pub hit_points: i32,
    pub max_hit_points: i32,
    quality: Option<QualityTier>,
    /// Quality cannot be changed (e.g. unique artifacts)
    pub quality_locked: bool,
    pub position: Cell,
    pub spawned: bool,
    pub forbidden: bool,
    pub burning: bool,
    tainted: bool,
}

impl RepairableItem {
    pub fn new(id: impl Into<String>, def: Arc<ItemDef>, max_hit_points: i32) -> Self {
        Self {
            id: ItemId::new(id),
            def,
            stuff: None,
            hit_points: max_hit_points,
            max_hit_points,
            quality: Some(QualityTier::Normal),
            quality_locked: false,
            position: Cell::default(),
            spawned: true,
            forbidden: false,
            burning: false,
            tainted: false,
        }
    }

    pub fn with_hit_points(mut self, hit_points: i32) -> Self {
        self.hit_points = hit_points;
        self
    }

    pub fn with_quality(mut self, quality: Option<QualityTier>) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_stuff(mut self, stuff: StuffProps) -> Self {
        self.stuff = Some(stuff);
        self
    }

    pub fn at(mut self, position: Cell) -> Self {
        self.position = position;
        self
    }

    pub fn tainted(mut self) -> Self {
        self.tainted = true;
        self
    }

    /// hit points / max hit points
    pub fn condition(&self) -> f32 {
        if self.max_hit_points <= 0 {
            return 0.0;
        }
        self.hit_points as f32 / self.max_hit_points as f32
    }

    pub fn quality(&self) -> Option<QualityTier> {
        self.quality
    }

    /// Try to change quality; returns the tier actually in effect afterwards
    pub fn set_quality(&mut self, quality: QualityTier) -> Option<QualityTier> {
        if self.quality.is_some() && !self.quality_locked {
            self.quality = Some(quality);
        }
        self.quality
    }

    pub fn is_tainted(&self) -> bool {
        self.tainted
    }

    pub fn set_tainted(&mut self, tainted: bool) {
        self.tainted = tainted;
    }

    pub fn label(&self) -> &str {
        &self.def.label
    }
}
