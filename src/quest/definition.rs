//! Quest Definition Structures
//!
//! Raw records are deserialized from TOML quest files; resolved definitions
//! are built from them by the catalog loader, one partial update at a time.

use serde::Deserialize;

use crate::error::LoadError;

/// Upper bound on kill objectives per quest (and on drop bonuses per quest)
pub const MAX_QUEST_OBJECTIVES: usize = 3;

/// Drop rates are expressed out of this many
pub const DROP_RATE_BASE: u32 = 10_000;

const SECONDS_PER_DAY: i64 = 86_400;

// ============================================================================
// Raw records (as they appear in TOML)
// ============================================================================

/// A quest source file: a list of `[[quests]]` tables.
///
/// Records stay untyped until the loader converts them one at a time, so a
/// bad value only costs the record it sits in.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuestFile {
    #[serde(default)]
    pub quests: Vec<toml::Value>,
}

/// Raw quest record. Every field except `id` is optional so a later record
/// with the same id can patch an earlier one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuest {
    pub id: i64,
    pub name: Option<String>,
    /// Fixed time limit in seconds
    pub duration: Option<u32>,
    pub day_offset: Option<u16>,
    pub hour_of_day: Option<i16>,
    pub minute_of_hour: Option<i16>,
    #[serde(default)]
    pub objectives: Vec<RawObjective>,
    #[serde(default)]
    pub drops: Vec<RawDrop>,
}

impl RawQuest {
    pub fn has_recurring_fields(&self) -> bool {
        self.day_offset.is_some() || self.hour_of_day.is_some() || self.minute_of_hour.is_some()
    }
}

/// Kill objective as it appears in TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawObjective {
    /// Monster name; entries without one are ignored
    pub mob: Option<String>,
    pub count: Option<u16>,
}

/// Drop bonus as it appears in TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDrop {
    /// Monster name; absent means any monster
    pub mob: Option<String>,
    pub item: Option<String>,
    pub count: Option<u16>,
    pub rate: Option<u32>,
}

// ============================================================================
// Resolved structures
// ============================================================================

/// Recurring expiry: the next `hour_of_day:minute_of_hour` (or the next
/// `:minute_of_hour` when no hour is set), pushed out by `day_offset` days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecurringWindow {
    pub day_offset: u16,
    /// 0-23, `None` for an hourly window
    pub hour_of_day: Option<u8>,
    /// 0-59
    pub minute_of_hour: u8,
}

impl RecurringWindow {
    pub fn day_offset_secs(&self) -> i64 {
        i64::from(self.day_offset) * SECONDS_PER_DAY
    }
}

/// How a granted quest's deadline is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeLimit {
    /// Never expires
    #[default]
    None,
    /// Expires this many seconds after being granted
    Duration(u32),
    /// Expires at a wall-clock boundary
    Recurring(RecurringWindow),
}

/// Partial update of the recurring window. Fields left `None` keep their
/// previous value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowPatch {
    pub day_offset: Option<u16>,
    pub hour_of_day: Option<Option<u8>>,
    pub minute_of_hour: Option<u8>,
}

impl TimeLimit {
    /// Apply a recurring-window patch on top of the current limit.
    ///
    /// A limit that is not yet recurring starts from an empty window, so the
    /// patch has to carry a minute.
    pub fn apply_window(&self, quest_id: u32, patch: &WindowPatch) -> Result<TimeLimit, LoadError> {
        let previous = match self {
            TimeLimit::Recurring(window) => Some(*window),
            TimeLimit::None | TimeLimit::Duration(_) => None,
        };

        let minute_of_hour = patch.minute_of_hour
            .or(previous.map(|w| w.minute_of_hour))
            .ok_or(LoadError::MissingMinute(quest_id))?;

        Ok(TimeLimit::Recurring(RecurringWindow {
            day_offset: patch.day_offset
                .or(previous.map(|w| w.day_offset))
                .unwrap_or(0),
            hour_of_day: patch.hour_of_day
                .unwrap_or(previous.and_then(|w| w.hour_of_day)),
            minute_of_hour,
        }))
    }
}

/// A kill objective
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Objective {
    pub mob_id: u32,
    pub count: u16,
}

/// Partial update of a kill objective, keyed by monster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectivePatch {
    pub mob_id: u32,
    pub count: Option<u16>,
}

/// An extra item grant rolled on each qualifying kill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropBonus {
    /// 0 matches any monster
    pub mob_id: u32,
    pub item_id: u32,
    pub count: u16,
    /// Chance out of `DROP_RATE_BASE`
    pub rate: u16,
}

impl DropBonus {
    pub fn matches(&self, mob_id: u32) -> bool {
        self.mob_id == 0 || self.mob_id == mob_id
    }
}

/// Partial update of a drop bonus, keyed by triggering monster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropPatch {
    pub mob_id: u32,
    pub item_id: Option<u32>,
    pub count: Option<u16>,
    pub rate: Option<u16>,
}

/// A fully resolved quest definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestDefinition {
    pub id: u32,
    pub name: String,
    pub time_limit: TimeLimit,
    /// Player progress counters are index-aligned with this list
    pub objectives: Vec<Objective>,
    pub drops: Vec<DropBonus>,
}

impl QuestDefinition {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            time_limit: TimeLimit::None,
            objectives: Vec::new(),
            drops: Vec::new(),
        }
    }

    /// Get the objective for a monster
    pub fn objective_for(&self, mob_id: u32) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.mob_id == mob_id)
    }

    /// Get the drop bonus keyed by a monster (0 for the wildcard bonus)
    pub fn drop_for(&self, mob_id: u32) -> Option<&DropBonus> {
        self.drops.iter().find(|d| d.mob_id == mob_id)
    }

    /// Update the objective for `patch.mob_id` in place, or append a new one.
    pub fn apply_objective(&mut self, patch: &ObjectivePatch) -> Result<(), LoadError> {
        if let Some(objective) = self.objectives.iter_mut().find(|o| o.mob_id == patch.mob_id) {
            if let Some(count) = patch.count {
                objective.count = count;
            }
            return Ok(());
        }

        if self.objectives.len() >= MAX_QUEST_OBJECTIVES {
            return Err(LoadError::TooManyEntries {
                quest_id: self.id,
                list: "objectives",
                max: MAX_QUEST_OBJECTIVES,
            });
        }

        let count = patch.count.ok_or(LoadError::IncompleteObjective {
            quest_id: self.id,
            mob_id: patch.mob_id,
        })?;

        self.objectives.push(Objective {
            mob_id: patch.mob_id,
            count,
        });
        Ok(())
    }

    /// Update the drop bonus for `patch.mob_id` in place, or add a new one.
    ///
    /// New bonuses need both an item and a rate; the count defaults to 1.
    pub fn apply_drop(&mut self, patch: &DropPatch) -> Result<(), LoadError> {
        if let Some(drop) = self.drops.iter_mut().find(|d| d.mob_id == patch.mob_id) {
            if let Some(item_id) = patch.item_id {
                drop.item_id = item_id;
            }
            if let Some(count) = patch.count {
                drop.count = count;
            }
            if let Some(rate) = patch.rate {
                drop.rate = rate;
            }
            return Ok(());
        }

        if self.drops.len() >= MAX_QUEST_OBJECTIVES {
            return Err(LoadError::TooManyEntries {
                quest_id: self.id,
                list: "drops",
                max: MAX_QUEST_OBJECTIVES,
            });
        }

        let (Some(item_id), Some(rate)) = (patch.item_id, patch.rate) else {
            return Err(LoadError::IncompleteDrop(self.id));
        };

        self.drops.push(DropBonus {
            mob_id: patch.mob_id,
            item_id,
            count: patch.count.unwrap_or(1),
            rate,
        });
        Ok(())
    }
}
