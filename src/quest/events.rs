//! Quest Event Types
//!
//! Gameplay events that drive quest progress, and what processing one
//! changed for a player.

use serde::{Deserialize, Serialize};

use crate::error::InventoryError;

/// Events that can trigger quest progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestEvent {
    /// A player killed a monster
    MonsterKilled {
        char_id: u32,
        /// Killer's party; members in range share the kill
        party_id: Option<u32>,
        /// Monster class id
        mob_id: u32,
    },
}

impl QuestEvent {
    /// Get the character ID associated with this event
    pub fn char_id(&self) -> u32 {
        match self {
            QuestEvent::MonsterKilled { char_id, .. } => *char_id,
        }
    }
}

/// One kill counter that moved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectiveUpdate {
    pub quest_id: u32,
    /// Index into the definition's objectives
    pub index: usize,
    pub count: u16,
    pub required: u16,
}

impl ObjectiveUpdate {
    pub fn is_met(&self) -> bool {
        self.count >= self.required
    }
}

/// A drop bonus that passed its roll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Granted {
        quest_id: u32,
        item_id: u32,
        count: u16,
    },
    /// The roll succeeded but the item could not be added
    Failed {
        quest_id: u32,
        item_id: u32,
        reason: InventoryError,
    },
}

/// Everything one kill changed for one player
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KillOutcome {
    pub char_id: u32,
    pub mob_id: u32,
    pub objectives: Vec<ObjectiveUpdate>,
    pub drops: Vec<DropOutcome>,
}

impl KillOutcome {
    pub fn new(char_id: u32, mob_id: u32) -> Self {
        Self {
            char_id,
            mob_id,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.objectives.is_empty() && self.drops.is_empty()
    }

    /// Items actually added to the inventory
    pub fn granted(&self) -> impl Iterator<Item = (u32, u16)> + '_ {
        self.drops.iter().filter_map(|drop| match drop {
            DropOutcome::Granted { item_id, count, .. } => Some((*item_id, *count)),
            DropOutcome::Failed { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_accessors() {
        let event = QuestEvent::MonsterKilled { char_id: 150000, party_id: None, mob_id: 1002 };
        assert_eq!(event.char_id(), 150000);
    }

    #[test]
    fn test_granted_skips_failures() {
        let mut outcome = KillOutcome::new(1, 1002);
        assert!(outcome.is_empty());

        outcome.drops.push(DropOutcome::Granted { quest_id: 1, item_id: 909, count: 2 });
        outcome.drops.push(DropOutcome::Failed {
            quest_id: 1,
            item_id: 1201,
            reason: InventoryError::InventoryFull,
        });

        assert_eq!(outcome.granted().collect::<Vec<_>>(), vec![(909, 2)]);
        assert!(!outcome.is_empty());
    }
}
