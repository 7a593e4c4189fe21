//! Quest Catalog Loader
//!
//! Turns raw TOML records into quest definitions. Records are applied in
//! order; a record whose id is already in the catalog patches that
//! definition instead of replacing it. A record that fails validation is
//! skipped as a whole and the rest of the batch carries on.

use std::path::Path;
use tracing::{debug, warn};

use super::api::ContentLookup;
use super::definition::{
    DropPatch, ObjectivePatch, QuestDefinition, RawDrop, RawQuest, RawQuestFile, TimeLimit,
    WindowPatch, DROP_RATE_BASE,
};
use super::registry::QuestCatalog;
use crate::error::{CatalogError, LoadError};

/// Builds catalog entries, resolving names through the content databases
pub struct CatalogLoader<'a> {
    content: &'a dyn ContentLookup,
}

impl<'a> CatalogLoader<'a> {
    pub fn new(content: &'a dyn ContentLookup) -> Self {
        Self { content }
    }

    /// Parse a quest file and apply its records to `catalog`.
    /// Returns the number of records that loaded.
    pub fn load_file(&self, catalog: &mut QuestCatalog, path: &Path) -> Result<usize, CatalogError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| CatalogError::Io { path: path.to_path_buf(), source })?;

        let file: RawQuestFile = toml::from_str(&content)
            .map_err(|source| CatalogError::Parse { path: path.to_path_buf(), source })?;

        Ok(self.load_records(catalog, &file.quests))
    }

    /// Apply a batch of records, skipping the ones that fail validation
    pub fn load_records(&self, catalog: &mut QuestCatalog, records: &[toml::Value]) -> usize {
        let mut count = 0;
        for (index, record) in records.iter().enumerate() {
            let built = parse_record(index + 1, record)
                .and_then(|raw| self.build_definition(catalog, &raw));
            match built {
                Ok(quest) => {
                    debug!("Loaded quest: {} ({})", quest.name, quest.id);
                    catalog.insert(quest);
                    count += 1;
                }
                Err(e) => warn!("Skipping quest record: {}", e),
            }
        }
        count
    }

    /// Validate one record and produce the definition it describes, merged
    /// over any existing definition with the same id. The catalog itself is
    /// not touched.
    pub fn build_definition(&self, catalog: &QuestCatalog, raw: &RawQuest) -> Result<QuestDefinition, LoadError> {
        let quest_id = u32::try_from(raw.id)
            .ok()
            .filter(|id| *id > 0)
            .ok_or(LoadError::InvalidId)?;

        if raw.duration.is_some() && raw.has_recurring_fields() {
            return Err(LoadError::ConflictingTimeLimit(quest_id));
        }

        let mut quest = match catalog.get(quest_id) {
            Some(existing) => existing.as_ref().clone(),
            None => {
                let name = raw.name.as_deref().ok_or(LoadError::MissingName(quest_id))?;
                QuestDefinition::new(quest_id, name)
            }
        };

        if let Some(name) = &raw.name {
            quest.name = name.clone();
        }

        if let Some(duration) = raw.duration {
            quest.time_limit = match duration {
                0 => TimeLimit::None,
                secs => TimeLimit::Duration(secs),
            };
        } else if raw.has_recurring_fields() {
            let patch = window_patch(quest_id, raw);
            quest.time_limit = quest.time_limit.apply_window(quest_id, &patch)?;
        }

        for objective in &raw.objectives {
            let Some(mob_name) = &objective.mob else {
                continue;
            };
            let mob_id = self.resolve_monster(quest_id, mob_name)?;
            quest.apply_objective(&ObjectivePatch {
                mob_id,
                count: objective.count,
            })?;
        }

        for drop in &raw.drops {
            let patch = self.drop_patch(&quest, drop)?;
            quest.apply_drop(&patch)?;
            self.cap_unstackable_drop(&mut quest, patch.mob_id);
        }

        Ok(quest)
    }

    fn resolve_monster(&self, quest_id: u32, name: &str) -> Result<u32, LoadError> {
        self.content
            .resolve_monster_id(name)
            .ok_or_else(|| LoadError::UnknownMonster {
                quest_id,
                name: name.to_string(),
            })
    }

    fn drop_patch(&self, quest: &QuestDefinition, drop: &RawDrop) -> Result<DropPatch, LoadError> {
        let mob_id = match &drop.mob {
            Some(name) => self.resolve_monster(quest.id, name)?,
            None => 0,
        };

        let item_id = match &drop.item {
            Some(name) => Some(self.content.resolve_item_id(name).ok_or_else(|| {
                LoadError::UnknownItem {
                    quest_id: quest.id,
                    name: name.clone(),
                }
            })?),
            None => None,
        };

        let rate = match drop.rate {
            Some(rate) if rate > DROP_RATE_BASE => {
                return Err(LoadError::InvalidRate { quest_id: quest.id, rate });
            }
            Some(rate) => Some(rate as u16),
            None => None,
        };

        Ok(DropPatch {
            mob_id,
            item_id,
            count: drop.count,
            rate,
        })
    }

    /// A non-stackable item drops one at a time, whatever count the bonus
    /// ended up with after merging
    fn cap_unstackable_drop(&self, quest: &mut QuestDefinition, mob_id: u32) {
        let quest_id = quest.id;
        let Some(drop) = quest.drops.iter_mut().find(|d| d.mob_id == mob_id) else {
            return;
        };
        if drop.count > 1 && !self.content.is_item_stackable(drop.item_id) {
            warn!(
                "Quest {}: item {} is not stackable, capping drop count {} to 1",
                quest_id, drop.item_id, drop.count
            );
            drop.count = 1;
        }
    }
}

/// Read one `[[quests]]` table. `index` is its 1-based position in the file.
fn parse_record(index: usize, record: &toml::Value) -> Result<RawQuest, LoadError> {
    record
        .clone()
        .try_into()
        .map_err(|e| LoadError::InvalidField {
            index,
            reason: e.to_string().trim_end().to_string(),
        })
}

/// Recurring-window fields of a record, clamped into range
fn window_patch(quest_id: u32, raw: &RawQuest) -> WindowPatch {
    let hour_of_day = raw.hour_of_day.map(|hour| match hour {
        h if h > 23 => {
            warn!("Quest {}: hour_of_day {} exceeds 23 hours, capping to 23", quest_id, h);
            Some(23)
        }
        h if h < 0 => None,
        h => Some(h as u8),
    });

    let minute_of_hour = raw.minute_of_hour.map(|minute| match minute {
        m if m > 59 => {
            warn!("Quest {}: minute_of_hour {} exceeds 59 minutes, capping to 59", quest_id, m);
            59
        }
        m if m < 0 => {
            warn!("Quest {}: minute_of_hour {} is negative, using 0", quest_id, m);
            0
        }
        m => m as u8,
    });

    WindowPatch {
        day_offset: raw.day_offset,
        hour_of_day,
        minute_of_hour,
    }
}
