use serde::{Deserialize, Serialize};

// ============================================================================
// Item Categories
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Consumable,
    #[default]
    Material,
    Equipment,
    Quest,
}

impl ItemCategory {
    /// Stack size used when a definition doesn't set one
    pub fn default_max_stack(&self) -> u32 {
        match self {
            ItemCategory::Equipment => 1,
            ItemCategory::Consumable | ItemCategory::Material | ItemCategory::Quest => 99,
        }
    }
}

// ============================================================================
// Raw Item Definition (direct from TOML)
// ============================================================================

/// One entry of an item table, keyed by the item's unique name
///
/// ```toml
/// [Red_Potion]
/// id = 501
/// display_name = "Red Potion"
/// category = "consumable"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawItemDefinition {
    pub id: u32,
    pub display_name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub category: ItemCategory,
    pub max_stack: Option<u32>,
}

// ============================================================================
// Resolved Item Definition
// ============================================================================

#[derive(Debug, Clone)]
pub struct ItemDefinition {
    pub id: u32,
    /// Unique lookup name used by other content files
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub category: ItemCategory,
    pub max_stack: u32,
}

impl ItemDefinition {
    pub fn from_raw(name: &str, raw: &RawItemDefinition) -> Self {
        Self {
            id: raw.id,
            name: name.to_string(),
            display_name: raw.display_name.clone()
                .unwrap_or_else(|| name.replace('_', " ")),
            description: raw.description.clone()
                .unwrap_or_default(),
            category: raw.category,
            max_stack: raw.max_stack
                .unwrap_or_else(|| raw.category.default_max_stack())
                .max(1),
        }
    }

    /// More than one unit fits in a single inventory slot
    pub fn is_stackable(&self) -> bool {
        self.max_stack > 1
    }
}
