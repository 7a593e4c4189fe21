use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use super::item_def::{ItemDefinition, RawItemDefinition};
use crate::error::CatalogError;

/// Registry for all item definitions
pub struct ItemRegistry {
    /// Item id -> definition
    items: HashMap<u32, ItemDefinition>,
    /// Unique name -> item id
    names: HashMap<String, u32>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// Load all item definitions from a directory
    pub fn load_from_directory(&mut self, data_dir: &Path) -> Result<(), CatalogError> {
        let items_dir = data_dir.join("items");

        if !items_dir.exists() {
            warn!("Items directory does not exist: {:?}", items_dir);
            return Ok(());
        }

        let entries = std::fs::read_dir(&items_dir)
            .map_err(|source| CatalogError::Io { path: items_dir.clone(), source })?;

        for entry in entries {
            let entry = entry
                .map_err(|source| CatalogError::Io { path: items_dir.clone(), source })?;
            let path = entry.path();

            if path.extension().map_or(false, |ext| ext == "toml") {
                let content = std::fs::read_to_string(&path)
                    .map_err(|source| CatalogError::Io { path: path.clone(), source })?;

                // Parse as table of items
                let table: HashMap<String, RawItemDefinition> = toml::from_str(&content)
                    .map_err(|source| CatalogError::Parse { path: path.clone(), source })?;

                for (name, raw) in table {
                    if self.names.contains_key(&name) || self.items.contains_key(&raw.id) {
                        warn!("Duplicate item '{}' ({}) in {:?}, overwriting", name, raw.id, path);
                    }
                    self.insert(ItemDefinition::from_raw(&name, &raw));
                }
            }
        }

        info!("Loaded {} item definitions", self.items.len());

        Ok(())
    }

    /// Add or replace a single definition
    pub fn insert(&mut self, item: ItemDefinition) {
        if let Some(old) = self.items.get(&item.id) {
            self.names.remove(&old.name);
        }
        self.names.insert(item.name.clone(), item.id);
        self.items.insert(item.id, item);
    }

    /// Get an item definition by ID
    pub fn get(&self, id: u32) -> Option<&ItemDefinition> {
        self.items.get(&id)
    }

    /// Get an item definition by its unique name
    pub fn get_by_name(&self, name: &str) -> Option<&ItemDefinition> {
        self.names.get(name).and_then(|id| self.items.get(id))
    }

    /// Get the number of loaded items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_items_from_directory() {
        let temp_dir = TempDir::new().unwrap();
        let items_dir = temp_dir.path().join("items");
        std::fs::create_dir_all(&items_dir).unwrap();
        std::fs::write(
            items_dir.join("usable.toml"),
            r#"
[Red_Potion]
id = 501
category = "consumable"

[Cotton_Shirt]
id = 2301
category = "equipment"
"#,
        ).unwrap();

        let mut registry = ItemRegistry::new();
        registry.load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get_by_name("Red_Potion").map(|i| i.id), Some(501));
        assert!(registry.get(501).unwrap().is_stackable());
        assert!(!registry.get(2301).unwrap().is_stackable());
        assert!(registry.get_by_name("Apple").is_none());
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = ItemRegistry::new();
        registry.load_from_directory(temp_dir.path()).unwrap();
        assert!(registry.is_empty());
    }
}
