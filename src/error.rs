//! Error types for the quest subsystem

use std::path::PathBuf;

use thiserror::Error;

/// Precondition failures of runtime quest-log operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestError {
    /// Quest id does not resolve in the catalog
    #[error("quest {0} not found in catalog")]
    UnknownQuest(u32),

    /// Player already holds the quest (any state)
    #[error("character {char_id} already has quest {quest_id}")]
    AlreadyHeld { char_id: u32, quest_id: u32 },

    /// Player does not hold the quest at all
    #[error("character {char_id} doesn't have quest {quest_id}")]
    NotHeld { char_id: u32, quest_id: u32 },

    /// Quest is held but already completed
    #[error("character {char_id} has completed quest {quest_id}")]
    NotAvailable { char_id: u32, quest_id: u32 },
}

/// Validation failures for a single catalog record
///
/// A record failing with any of these is skipped; the rest of the batch
/// still loads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("quest id must be a positive integer")]
    InvalidId,

    /// Record could not be read as a quest (wrong type, out of range, missing id)
    #[error("quest record {index}: {reason}")]
    InvalidField { index: usize, reason: String },

    #[error("quest {0}: node \"name\" is missing")]
    MissingName(u32),

    #[error("quest {0}: \"duration\" cannot be defined with \"day_offset\", \"hour_of_day\", or \"minute_of_hour\"")]
    ConflictingTimeLimit(u32),

    #[error("quest {0}: node \"minute_of_hour\" is missing")]
    MissingMinute(u32),

    #[error("quest {quest_id}: monster {name} does not exist")]
    UnknownMonster { quest_id: u32, name: String },

    #[error("quest {quest_id}: item {name} does not exist")]
    UnknownItem { quest_id: u32, name: String },

    #[error("quest {quest_id}: {list} list exceeds the maximum of {max}")]
    TooManyEntries {
        quest_id: u32,
        list: &'static str,
        max: usize,
    },

    #[error("quest {quest_id}: new objective for monster {mob_id} has no count")]
    IncompleteObjective { quest_id: u32, mob_id: u32 },

    #[error("quest {0}: new drop bonus needs both \"item\" and \"rate\"")]
    IncompleteDrop(u32),

    #[error("quest {quest_id}: drop rate {rate} exceeds 10000")]
    InvalidRate { quest_id: u32, rate: u32 },
}

/// Whole-file catalog failures
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Reasons an item could not be placed into an inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("inventory is full")]
    InventoryFull,

    #[error("invalid amount {0}")]
    InvalidAmount(u32),
}

/// Quest log persistence failures
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed quest log {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
