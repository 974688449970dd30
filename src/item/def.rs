//! Item definitions - the already-resolved content records repairs consume

use serde::{Deserialize, Serialize};

use crate::core::types::MaterialKind;
use crate::item::material::MaterialRequirement;
use crate::item::quality::TechLevel;

/// Names (def names, categories, materials) that are never repairable
pub const DISALLOWED: &[&str] = &["Grenades"];

/// Case-insensitive membership in [`DISALLOWED`]
pub fn is_disallowed_name(name: &str) -> bool {
    DISALLOWED.iter().any(|d| d.eq_ignore_ascii_case(name))
}

/// Broad kind of map object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    Item,
    Building,
    Pawn,
    Plant,
}

/// The material an item was crafted from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StuffProps {
    pub kind: MaterialKind,
    /// Multiplier on recipe work for items made of this material
    pub work_factor: f32,
    /// Categories of the material itself ("Metallic", "Woody")
    pub categories: Vec<String>,
}

impl StuffProps {
    pub fn new(kind: impl Into<String>, work_factor: f32) -> Self {
        Self {
            kind: MaterialKind::new(kind),
            work_factor,
            categories: Vec::new(),
        }
    }
}

/// Resolved definition of an item type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub def_name: String,
    pub label: String,
    pub category: ItemCategory,
    pub tech_level: TechLevel,
    pub is_melee_weapon: bool,
    pub is_apparel: bool,
    pub weapon_tags: Vec<String>,
    pub thing_categories: Vec<String>,
    /// Material categories this item can be made from
    pub stuff_categories: Vec<String>,
    pub trade_tags: Vec<String>,
    /// Full crafting cost, already adjusted for the crafted-from material
    pub crafting_cost: Vec<MaterialRequirement>,
    /// Work amount of every recipe producing this item
    pub recipe_work: Vec<f32>,
    /// Work amount of the flat recipe-maker, if any
    pub recipe_maker_work: Option<f32>,
    /// Generic "work to make" statistic
    pub work_to_make: Option<f32>,
    /// Research projects the recipes for this item depend on
    pub required_research: Vec<String>,
    /// Whether any workstation can craft this item
    pub has_recipe_users: bool,
}

impl ItemDef {
    pub fn new(def_name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            def_name: def_name.into(),
            label: label.into(),
            category: ItemCategory::Item,
            tech_level: TechLevel::Industrial,
            is_melee_weapon: false,
            is_apparel: false,
            weapon_tags: Vec::new(),
            thing_categories: Vec::new(),
            stuff_categories: Vec::new(),
            trade_tags: Vec::new(),
            crafting_cost: Vec::new(),
            recipe_work: Vec::new(),
            recipe_maker_work: None,
            work_to_make: None,
            required_research: Vec::new(),
            has_recipe_users: false,
        }
    }

    pub fn with_category(mut self, category: ItemCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_tech_level(mut self, tech_level: TechLevel) -> Self {
        self.tech_level = tech_level;
        self
    }

    pub fn melee(mut self) -> Self {
        self.is_melee_weapon = true;
        self
    }

    pub fn apparel(mut self) -> Self {
        self.is_apparel = true;
        self
    }

    pub fn with_weapon_tag(mut self, tag: impl Into<String>) -> Self {
        self.weapon_tags.push(tag.into());
        self
    }

    pub fn with_thing_category(mut self, category: impl Into<String>) -> Self {
        self.thing_categories.push(category.into());
        self
    }

    pub fn with_trade_tag(mut self, tag: impl Into<String>) -> Self {
        self.trade_tags.push(tag.into());
        self
    }

    pub fn with_cost(mut self, kind: impl Into<String>, quantity: u32) -> Self {
        self.crafting_cost.push(MaterialRequirement::new(kind, quantity));
        self
    }

    /// Adds a crafting recipe, which also makes the item craftable
    pub fn with_recipe_work(mut self, work: f32) -> Self {
        self.recipe_work.push(work);
        self.has_recipe_users = true;
        self
    }

    pub fn with_recipe_maker_work(mut self, work: f32) -> Self {
        self.recipe_maker_work = Some(work);
        self.has_recipe_users = true;
        self
    }

    pub fn with_work_to_make(mut self, work: f32) -> Self {
        self.work_to_make = Some(work);
        self
    }

    pub fn with_research(mut self, project: impl Into<String>) -> Self {
        self.required_research.push(project.into());
        self
    }

    /// Not on the disallowed list by def name or category
    pub fn is_allowed(&self, stuff: Option<&StuffProps>) -> bool {
        if self.thing_categories.iter().any(|c| is_disallowed_name(c)) {
            return false;
        }
        if self.stuff_categories.len() == 1 && is_disallowed_name(&self.stuff_categories[0]) {
            return false;
        }
        if let Some(stuff) = stuff {
            if stuff.categories.iter().any(|c| is_disallowed_name(c)) {
                return false;
            }
        }
        !is_disallowed_name(&self.def_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disallowed_is_case_insensitive() {
        assert!(is_disallowed_name("grenades"));
        assert!(is_disallowed_name("GRENADES"));
        assert!(!is_disallowed_name("Steel"));
    }

    #[test]
    fn test_is_allowed_by_category() {
        let def = ItemDef::new("Weapon_GrenadeFrag", "frag grenades").with_thing_category("Grenades");
        assert!(!def.is_allowed(None));

        let def = ItemDef::new("Gun_Revolver", "revolver").with_thing_category("WeaponsRanged");
        assert!(def.is_allowed(None));
    }

    #[test]
    fn test_is_allowed_by_stuff_category() {
        let def = ItemDef::new("Apparel_Parka", "parka");
        let mut stuff = StuffProps::new("Cloth", 1.0);
        stuff.categories.push("grenades".into());
        assert!(!def.is_allowed(Some(&stuff)));
    }

    #[test]
    fn test_recipe_work_marks_craftable() {
        let def = ItemDef::new("Gun_Revolver", "revolver").with_recipe_work(1200.0);
        assert!(def.has_recipe_users);
        assert_eq!(def.recipe_work, vec![1200.0]);
    }
}
