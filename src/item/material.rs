//! Material requirements and material stacks

use serde::{Deserialize, Serialize};

use crate::core::types::{Cell, ItemId, MaterialKind};

/// A (kind, quantity) pair needed to complete a repair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialRequirement {
    pub kind: MaterialKind,
    pub quantity: u32,
}

impl MaterialRequirement {
    pub fn new(kind: impl Into<String>, quantity: u32) -> Self {
        Self {
            kind: MaterialKind::new(kind),
            quantity,
        }
    }

    /// Requirement scaled by `factor`, rounding half to even
    ///
    /// Returns None when the scaled quantity rounds to zero.
    pub fn scaled(&self, factor: f32) -> Option<MaterialRequirement> {
        let quantity = (self.quantity as f32 * factor).round_ties_even();
        if quantity >= 1.0 {
            Some(MaterialRequirement {
                kind: self.kind.clone(),
                quantity: quantity as u32,
            })
        } else {
            None
        }
    }
}

/// "10 Steel, 2 Components"
pub fn describe_materials(materials: &[MaterialRequirement]) -> String {
    materials
        .iter()
        .map(|m| format!("{} {}", m.quantity, m.kind))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A haulable stack of one material kind lying on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialStack {
    pub id: ItemId,
    pub kind: MaterialKind,
    pub count: u32,
    pub stack_limit: u32,
    pub position: Cell,
    pub spawned: bool,
    pub forbidden: bool,
    /// False for things the agent should not take (e.g. in someone's room)
    pub socially_proper: bool,
}

impl MaterialStack {
    pub fn new(kind: impl Into<String>, count: u32, position: Cell) -> Self {
        let kind = MaterialKind::new(kind);
        Self {
            id: ItemId::generate(&kind.0),
            kind,
            count,
            stack_limit: 75,
            position,
            spawned: true,
            forbidden: false,
            socially_proper: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = ItemId::new(id);
        self
    }

    pub fn with_stack_limit(mut self, limit: u32) -> Self {
        self.stack_limit = limit;
        self
    }

    pub fn forbidden(mut self) -> Self {
        self.forbidden = true;
        self
    }

    /// Take `count` off this stack as a new stack, or the whole stack if
    /// `count` covers it
    pub fn split_off(&mut self, count: u32) -> Option<MaterialStack> {
        if count == 0 || count >= self.count {
            return None;
        }
        self.count -= count;
        Some(MaterialStack {
            id: ItemId::generate(&self.kind.0),
            count,
            ..self.clone()
        })
    }

    /// Room left before the stack limit
    pub fn space_left(&self) -> u32 {
        self.stack_limit.saturating_sub(self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_rounds_half_to_even() {
        let req = MaterialRequirement::new("Steel", 5);
        // 2.5 -> 2
        assert_eq!(req.scaled(0.5).map(|r| r.quantity), Some(2));
        let req = MaterialRequirement::new("Steel", 7);
        // 3.5 -> 4
        assert_eq!(req.scaled(0.5).map(|r| r.quantity), Some(4));
    }

    #[test]
    fn test_scaled_drops_zero() {
        let req = MaterialRequirement::new("Components", 2);
        assert!(req.scaled(0.2).is_none());
    }

    #[test]
    fn test_describe_materials() {
        let list = vec![
            MaterialRequirement::new("Steel", 10),
            MaterialRequirement::new("Components", 2),
        ];
        assert_eq!(describe_materials(&list), "10 Steel, 2 Components");
    }

    #[test]
    fn test_split_off() {
        let mut stack = MaterialStack::new("Steel", 30, Cell::new(0, 0));
        let part = stack.split_off(10).expect("Should split");
        assert_eq!(part.count, 10);
        assert_eq!(stack.count, 20);
        assert_ne!(part.id, stack.id);
        assert_eq!(part.kind, stack.kind);

        // Taking everything is not a split
        assert!(stack.split_off(20).is_none());
        assert!(stack.split_off(0).is_none());
    }
}
