//! Quest System Module
//!
//! Data-driven quest catalog loaded from TOML, per-player quest logs with
//! deadlines, and kill-driven progress with bonus drops. The catalog can be
//! hot-reloaded; online logs are reconciled against the new catalog.

pub mod api;
pub mod deadline;
pub mod definition;
pub mod events;
pub mod loader;
pub mod registry;
pub mod runner;
pub mod state;

pub use api::{Clock, ContentLookup, PlayerIterator, QuestNotifier, RandomSource, SaveRequester};
pub use definition::{DropBonus, Objective, QuestDefinition, RecurringWindow, TimeLimit, MAX_QUEST_OBJECTIVES};
pub use events::{DropOutcome, KillOutcome, ObjectiveUpdate, QuestEvent};
pub use registry::{HotReloadEvent, QuestCatalog, QuestRegistry};
pub use runner::{QueryResult, QueryType, QuestRunner};
pub use state::{HuntingStatus, PlayTimeStatus, PlayerQuestLog, QuestLogEntry, QuestLogSnapshot, QuestState};
