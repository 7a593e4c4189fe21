//! Quest Collaborator API
//!
//! Interfaces the quest core calls out to: content lookups, client
//! notifications, save requests, online-player iteration, randomness and the
//! wall clock. The server wires concrete implementations in; tests use fakes.

use chrono::{DateTime, FixedOffset, Local};
use rand::Rng;

use crate::error::InventoryError;
use crate::session::PlayerSession;
use super::state::{PlayerQuestLog, QuestLogEntry};

/// Name and property lookups into the monster and item databases
pub trait ContentLookup: Send + Sync {
    fn resolve_monster_id(&self, name: &str) -> Option<u32>;
    fn resolve_item_id(&self, name: &str) -> Option<u32>;
    /// Max units per inventory slot, `None` for unknown items
    fn item_max_stack(&self, item_id: u32) -> Option<u32>;

    fn item_exists(&self, item_id: u32) -> bool {
        self.item_max_stack(item_id).is_some()
    }

    fn is_item_stackable(&self, item_id: u32) -> bool {
        self.item_max_stack(item_id).is_some_and(|max| max > 1)
    }
}

/// Client-facing quest messages for one player
pub trait QuestNotifier: Send + Sync {
    /// Full log, sent on login
    fn quest_list(&self, log: &PlayerQuestLog);
    fn quest_added(&self, entry: &QuestLogEntry);
    fn quest_deleted(&self, quest_id: u32);
    /// Current counters of `entry`; `mob_id` is the kill that caused it, 0 when seeding
    fn objective_updated(&self, entry: &QuestLogEntry, mob_id: u32);
    fn status_updated(&self, quest_id: u32, active: bool);
    fn item_grant_failed(&self, reason: InventoryError);
    /// Ask the client to refresh quest markers after a batch of changes
    fn quest_info_refresh(&self);
}

/// Forwards a player's state to the storage tier
pub trait SaveRequester: Send + Sync {
    fn request_save(&self, char_id: u32);
}

/// Enumerates online sessions
pub trait PlayerIterator {
    fn for_each_online(&self, f: &mut dyn FnMut(&mut PlayerSession));

    /// Run `f` against one player if online. Returns whether it ran.
    fn with_player(&self, char_id: u32, f: &mut dyn FnMut(&mut PlayerSession)) -> bool {
        let mut found = false;
        self.for_each_online(&mut |session| {
            if session.char_id == char_id {
                f(session);
                found = true;
            }
        });
        found
    }

    /// Visit online members of `party_id` accepted by `predicate`
    fn for_each_party_member(
        &self,
        party_id: u32,
        predicate: &dyn Fn(&PlayerSession) -> bool,
        f: &mut dyn FnMut(&mut PlayerSession),
    ) {
        self.for_each_online(&mut |session| {
            if session.party_id == Some(party_id) && predicate(session) {
                f(session);
            }
        });
    }
}

/// Uniform integer source for drop rolls
pub trait RandomSource: Send + Sync {
    /// Uniform draw in `0..bound`
    fn draw(&self, bound: u32) -> u32;
}

/// `rand`-backed random source
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn draw(&self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..bound)
    }
}

/// Wall clock used for deadlines; the offset decides what "day" and "hour" mean
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Server-local time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}
