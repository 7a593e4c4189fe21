//! Monster and item databases as seen by the quest system

use std::path::Path;

use crate::data::ItemRegistry;
use crate::entity::MonsterRegistry;
use crate::error::CatalogError;
use crate::quest::api::ContentLookup;

/// Loaded content databases
#[derive(Default)]
pub struct ContentDb {
    pub monsters: MonsterRegistry,
    pub items: ItemRegistry,
}

impl ContentDb {
    pub fn new(monsters: MonsterRegistry, items: ItemRegistry) -> Self {
        Self { monsters, items }
    }

    /// Load monsters and items from `data_dir`
    pub fn load_from_directory(data_dir: &Path) -> Result<Self, CatalogError> {
        let mut monsters = MonsterRegistry::new();
        monsters.load_from_directory(data_dir)?;

        let mut items = ItemRegistry::new();
        items.load_from_directory(data_dir)?;

        Ok(Self::new(monsters, items))
    }
}

impl ContentLookup for ContentDb {
    fn resolve_monster_id(&self, name: &str) -> Option<u32> {
        self.monsters.get_by_name(name).map(|m| m.id)
    }

    fn resolve_item_id(&self, name: &str) -> Option<u32> {
        self.items.get_by_name(name).map(|i| i.id)
    }

    fn item_max_stack(&self, item_id: u32) -> Option<u32> {
        self.items.get(item_id).map(|i| i.max_stack)
    }
}

#[cfg(test)]
impl ContentDb {
    /// Small field-map database shared by unit tests
    pub(crate) fn sample() -> Self {
        use crate::data::item_def::{ItemCategory, ItemDefinition};
        use crate::entity::MonsterPrototype;

        let mut db = ContentDb::default();
        for (id, name) in [(1002, "PORING"), (1063, "LUNATIC"), (1007, "FABRE"), (1008, "PUPA")] {
            db.monsters.insert(MonsterPrototype {
                id,
                name: name.to_string(),
                display_name: name.to_string(),
                level: 1,
            });
        }
        for (id, name, category, max_stack) in [
            (909, "Jellopy", ItemCategory::Material, 99),
            (512, "Apple", ItemCategory::Consumable, 99),
            (1201, "Knife", ItemCategory::Equipment, 1),
        ] {
            db.items.insert(ItemDefinition {
                id,
                name: name.to_string(),
                display_name: name.to_string(),
                description: String::new(),
                category,
                max_stack,
            });
        }
        db
    }
}
