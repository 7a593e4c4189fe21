use serde::Deserialize;

// ============================================================================
// Raw TOML Structures (direct deserialization)
// ============================================================================

/// One entry of a monster table, keyed by the monster's unique name
#[derive(Debug, Clone, Deserialize)]
pub struct RawMonsterPrototype {
    pub id: u32,
    pub display_name: Option<String>,
    #[serde(default = "default_level")]
    pub level: u32,
}

fn default_level() -> u32 { 1 }

// ============================================================================
// Resolved Prototype
// ============================================================================

#[derive(Debug, Clone)]
pub struct MonsterPrototype {
    /// Runtime class id, the value kill events carry
    pub id: u32,
    /// Unique lookup name used by other content files
    pub name: String,
    pub display_name: String,
    pub level: u32,
}

impl MonsterPrototype {
    pub fn from_raw(name: &str, raw: &RawMonsterPrototype) -> Self {
        Self {
            id: raw.id,
            name: name.to_string(),
            display_name: raw.display_name.clone()
                .unwrap_or_else(|| name.to_string()),
            level: raw.level,
        }
    }
}
