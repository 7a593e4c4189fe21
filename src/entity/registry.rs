use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use super::prototype::{MonsterPrototype, RawMonsterPrototype};
use crate::error::CatalogError;

/// Registry for all monster prototypes
pub struct MonsterRegistry {
    prototypes: HashMap<u32, MonsterPrototype>,
    names: HashMap<String, u32>,
}

impl MonsterRegistry {
    pub fn new() -> Self {
        Self {
            prototypes: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// Load all monster definitions from `<data_dir>/monsters`
    pub fn load_from_directory(&mut self, data_dir: &Path) -> Result<(), CatalogError> {
        let monsters_dir = data_dir.join("monsters");

        if !monsters_dir.exists() {
            warn!("Monster directory does not exist: {:?}", monsters_dir);
            return Ok(());
        }

        let entries = std::fs::read_dir(&monsters_dir)
            .map_err(|source| CatalogError::Io { path: monsters_dir.clone(), source })?;

        for entry in entries {
            let entry = entry
                .map_err(|source| CatalogError::Io { path: monsters_dir.clone(), source })?;
            let path = entry.path();

            if path.extension().map_or(false, |ext| ext == "toml") {
                let content = std::fs::read_to_string(&path)
                    .map_err(|source| CatalogError::Io { path: path.clone(), source })?;

                // Parse as table of monsters
                let table: HashMap<String, RawMonsterPrototype> = toml::from_str(&content)
                    .map_err(|source| CatalogError::Parse { path: path.clone(), source })?;

                for (name, raw) in table {
                    if self.names.contains_key(&name) {
                        warn!("Duplicate monster '{}' in {:?}, overwriting", name, path);
                    }
                    self.insert(MonsterPrototype::from_raw(&name, &raw));
                }
            }
        }

        info!("Loaded {} monster prototypes", self.prototypes.len());

        Ok(())
    }

    /// Add or replace a single prototype
    pub fn insert(&mut self, prototype: MonsterPrototype) {
        if let Some(old) = self.prototypes.get(&prototype.id) {
            self.names.remove(&old.name);
        }
        self.names.insert(prototype.name.clone(), prototype.id);
        self.prototypes.insert(prototype.id, prototype);
    }

    /// Get a prototype by class id
    pub fn get(&self, id: u32) -> Option<&MonsterPrototype> {
        self.prototypes.get(&id)
    }

    /// Get a prototype by its unique name
    pub fn get_by_name(&self, name: &str) -> Option<&MonsterPrototype> {
        self.names.get(name).and_then(|id| self.prototypes.get(id))
    }

    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }
}

impl Default for MonsterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_monsters_from_directory() {
        let temp_dir = TempDir::new().unwrap();
        let monsters_dir = temp_dir.path().join("monsters");
        std::fs::create_dir_all(&monsters_dir).unwrap();
        std::fs::write(
            monsters_dir.join("field.toml"),
            r#"
[PORING]
id = 1002
display_name = "Poring"

[LUNATIC]
id = 1063
level = 3
"#,
        ).unwrap();

        let mut registry = MonsterRegistry::new();
        registry.load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get_by_name("PORING").map(|m| m.id), Some(1002));
        assert_eq!(registry.get(1063).unwrap().display_name, "LUNATIC");
        assert_eq!(registry.get(1063).unwrap().level, 3);
    }
}
