//! Quest State Tracking
//!
//! Per-player quest log. Entries that are not complete occupy a contiguous
//! prefix of the log (the available partition); completed entries follow.
//! Every structural change goes through `PlayerQuestLog` so the boundary
//! can't drift from the contents.

use serde::{Deserialize, Serialize};

use super::deadline::is_expired;
use super::definition::QuestDefinition;

/// State of a held quest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[serde(rename_all = "snake_case")]
pub enum QuestState {
    Inactive = 0,
    Active = 1,
    /// Terminal
    Complete = 2,
}

impl QuestState {
    pub fn is_complete(&self) -> bool {
        *self == QuestState::Complete
    }
}

/// One held quest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestLogEntry {
    pub quest_id: u32,
    /// Unix seconds, 0 for no deadline
    pub deadline: i64,
    state: QuestState,
    /// Kill counters, index-aligned with the definition's objectives
    pub counts: Vec<u16>,
}

impl QuestLogEntry {
    /// Fresh entry for a newly granted quest
    pub fn new(quest: &QuestDefinition, deadline: i64) -> Self {
        Self {
            quest_id: quest.id,
            deadline,
            state: QuestState::Active,
            counts: vec![0; quest.objectives.len()],
        }
    }

    /// Rebuild an entry from saved data
    pub fn restore(quest_id: u32, deadline: i64, state: QuestState, counts: Vec<u16>) -> Self {
        Self {
            quest_id,
            deadline,
            state,
            counts,
        }
    }

    pub fn state(&self) -> QuestState {
        self.state
    }

    pub fn count(&self, index: usize) -> u16 {
        self.counts.get(index).copied().unwrap_or(0)
    }

    pub fn is_expired(&self, now: i64) -> bool {
        is_expired(self.deadline, now)
    }

    /// Every counter has reached its objective's required count
    pub fn objectives_met(&self, quest: &QuestDefinition) -> bool {
        quest.objectives
            .iter()
            .enumerate()
            .all(|(i, objective)| self.count(i) >= objective.count)
    }
}

/// Result of a `PLAYTIME` query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlayTimeStatus {
    /// Deadline has passed
    Expired,
    /// Quest was completed in time
    Completed,
    /// Neither
    Pending,
}

/// Result of a `HUNTING` query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HuntingStatus {
    /// All kill targets met, quest not yet turned in
    ObjectivesMet,
    /// Targets not met and the deadline has passed
    Expired,
    /// Still hunting, or the quest is already complete
    InProgress,
}

/// All quest state for a single player
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerQuestLog {
    entries: Vec<QuestLogEntry>,
    /// Length of the available (non-complete) prefix
    available: usize,
}

impl PlayerQuestLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from saved entries in any order. Available entries keep
    /// their relative order and move ahead of completed ones.
    pub fn from_entries(entries: Vec<QuestLogEntry>) -> Self {
        let (mut available, completed): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|e| !e.state.is_complete());
        let available_count = available.len();
        available.extend(completed);

        Self {
            entries: available,
            available: available_count,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn available_count(&self) -> usize {
        self.available
    }

    pub fn entries(&self) -> &[QuestLogEntry] {
        &self.entries
    }

    /// Inactive and active entries
    pub fn available(&self) -> &[QuestLogEntry] {
        &self.entries[..self.available]
    }

    pub fn completed(&self) -> &[QuestLogEntry] {
        &self.entries[self.available..]
    }

    /// Mutable access to available entries. State can't be changed through
    /// these references, only counters and deadlines.
    pub fn available_mut(&mut self) -> impl Iterator<Item = &mut QuestLogEntry> {
        self.entries[..self.available].iter_mut()
    }

    /// Index of a quest anywhere in the log
    pub fn position(&self, quest_id: u32) -> Option<usize> {
        self.entries.iter().position(|e| e.quest_id == quest_id)
    }

    /// Index of a quest within the available partition
    pub fn position_available(&self, quest_id: u32) -> Option<usize> {
        self.available().iter().position(|e| e.quest_id == quest_id)
    }

    pub fn get(&self, quest_id: u32) -> Option<&QuestLogEntry> {
        self.entries.iter().find(|e| e.quest_id == quest_id)
    }

    pub fn contains(&self, quest_id: u32) -> bool {
        self.position(quest_id).is_some()
    }

    /// Insert a non-complete entry at the partition boundary, ahead of all
    /// completed entries. Returns its index.
    pub fn push_available(&mut self, entry: QuestLogEntry) -> usize {
        debug_assert!(!entry.state.is_complete());
        let index = self.available;
        self.entries.insert(index, entry);
        self.available += 1;
        index
    }

    /// Overwrite the available entry at `index`, returning the old one
    pub fn replace_available(&mut self, index: usize, entry: QuestLogEntry) -> Option<QuestLogEntry> {
        if index >= self.available || entry.state.is_complete() {
            return None;
        }
        Some(std::mem::replace(&mut self.entries[index], entry))
    }

    /// Remove a quest, shifting later entries left
    pub fn remove(&mut self, quest_id: u32) -> Option<QuestLogEntry> {
        let index = self.position(quest_id)?;
        let entry = self.entries.remove(index);
        if !entry.state.is_complete() {
            self.available -= 1;
        }
        Some(entry)
    }

    /// Change the state of an available entry.
    ///
    /// Completing moves the entry to the front of the completed suffix by
    /// swapping it with the last available slot. Returns the entry's new
    /// index, or `None` if the quest is not in the available partition.
    pub fn set_state(&mut self, quest_id: u32, state: QuestState) -> Option<usize> {
        let index = self.position_available(quest_id)?;
        self.entries[index].state = state;

        if !state.is_complete() {
            return Some(index);
        }

        self.available -= 1;
        self.entries.swap(index, self.available);
        Some(self.available)
    }

    /// Drop entries whose quest fails `keep`, preserving the order of the
    /// rest. Returns the removed entries.
    pub fn retain_quests(&mut self, mut keep: impl FnMut(u32) -> bool) -> Vec<QuestLogEntry> {
        let (kept, removed): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| keep(e.quest_id));

        self.entries = kept;
        self.available = self.entries
            .iter()
            .position(|e| e.state.is_complete())
            .unwrap_or(self.entries.len());
        removed
    }

    /// Available entries whose deadline has passed
    pub fn expired(&self, now: i64) -> impl Iterator<Item = &QuestLogEntry> {
        self.available().iter().filter(move |e| e.is_expired(now))
    }

    /// `HAVEQUEST`: the held state, with inactive reported as active
    pub fn have_quest(&self, quest_id: u32) -> Option<QuestState> {
        self.get(quest_id).map(|e| match e.state {
            QuestState::Inactive => QuestState::Active,
            state => state,
        })
    }

    /// `PLAYTIME`
    pub fn play_time(&self, quest_id: u32, now: i64) -> Option<PlayTimeStatus> {
        self.get(quest_id).map(|e| {
            if e.is_expired(now) {
                PlayTimeStatus::Expired
            } else if e.state.is_complete() {
                PlayTimeStatus::Completed
            } else {
                PlayTimeStatus::Pending
            }
        })
    }

    /// `HUNTING`, checked against the quest's definition
    pub fn hunting(&self, quest: &QuestDefinition, now: i64) -> Option<HuntingStatus> {
        self.get(quest.id).map(|e| {
            if e.state.is_complete() {
                HuntingStatus::InProgress
            } else if e.objectives_met(quest) {
                HuntingStatus::ObjectivesMet
            } else if e.is_expired(now) {
                HuntingStatus::Expired
            } else {
                HuntingStatus::InProgress
            }
        })
    }

    /// Serializable copy of the log
    pub fn snapshot(&self) -> QuestLogSnapshot {
        QuestLogSnapshot {
            entries: self.entries.clone(),
        }
    }

    #[cfg(test)]
    fn assert_partitioned(&self) {
        assert!(self.available <= self.entries.len());
        assert!(self.available().iter().all(|e| !e.state.is_complete()));
        assert!(self.completed().iter().all(|e| e.state.is_complete()));
    }
}

/// Saved form of a player's quest log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestLogSnapshot {
    pub entries: Vec<QuestLogEntry>,
}

impl QuestLogSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn into_log(self) -> PlayerQuestLog {
        PlayerQuestLog::from_entries(self.entries)
    }
}
