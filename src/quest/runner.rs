//! Quest Runner
//!
//! Runtime quest operations against a player's session: granting, replacing,
//! removing and transitioning log entries, script-style queries, kill
//! progress with bonus drops, and post-reload reconciliation.
//!
//! Every operation takes the session by `&mut`; callers serialize access per
//! player. Precondition failures leave the session untouched and are logged.

use std::sync::Arc;
use tracing::{debug, error, info};

use super::api::{Clock, ContentLookup, PlayerIterator, RandomSource, SaveRequester, SystemClock, ThreadRandom};
use super::deadline::compute_deadline;
use super::definition::DROP_RATE_BASE;
use super::events::{DropOutcome, KillOutcome, ObjectiveUpdate, QuestEvent};
use super::registry::QuestRegistry;
use super::state::{HuntingStatus, PlayTimeStatus, QuestLogEntry, QuestState};
use crate::error::{CatalogError, QuestError};
use crate::session::PlayerSession;

/// Which question a script asks about a held quest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// Held state, inactive reported as active
    HaveQuest,
    /// Expired / completed / neither
    PlayTime,
    /// Objectives met / expired / in progress
    Hunting,
}

impl QueryType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "HAVEQUEST" => Some(QueryType::HaveQuest),
            "PLAYTIME" => Some(QueryType::PlayTime),
            "HUNTING" => Some(QueryType::Hunting),
            _ => None,
        }
    }
}

/// Answer to a `QueryType`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryResult {
    /// Quest not held, or its definition is gone
    NotFound,
    State(QuestState),
    PlayTime(PlayTimeStatus),
    Hunting(HuntingStatus),
}

impl QueryResult {
    /// Integer form handed back to NPC scripts
    pub fn code(&self) -> i32 {
        match self {
            QueryResult::NotFound => -1,
            QueryResult::State(state) => *state as i32,
            QueryResult::PlayTime(PlayTimeStatus::Expired) => 2,
            QueryResult::PlayTime(PlayTimeStatus::Completed) => 1,
            QueryResult::PlayTime(PlayTimeStatus::Pending) => 0,
            QueryResult::Hunting(HuntingStatus::ObjectivesMet) => 2,
            QueryResult::Hunting(HuntingStatus::Expired) => 1,
            QueryResult::Hunting(HuntingStatus::InProgress) => 0,
        }
    }
}

/// Applies quest operations to player sessions
pub struct QuestRunner {
    registry: Arc<QuestRegistry>,
    saver: Arc<dyn SaveRequester>,
    rng: Arc<dyn RandomSource>,
    clock: Arc<dyn Clock>,
    /// Forward quest changes to storage right away
    save_on_change: bool,
}

impl QuestRunner {
    pub fn new(registry: Arc<QuestRegistry>, saver: Arc<dyn SaveRequester>) -> Self {
        Self {
            registry,
            saver,
            rng: Arc::new(ThreadRandom),
            clock: Arc::new(SystemClock),
            save_on_change: true,
        }
    }

    pub fn with_random(mut self, rng: Arc<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_save_policy(mut self, save_on_change: bool) -> Self {
        self.save_on_change = save_on_change;
        self
    }

    pub fn registry(&self) -> &Arc<QuestRegistry> {
        &self.registry
    }

    fn content(&self) -> &dyn ContentLookup {
        self.registry.content().as_ref()
    }

    /// Flag the log dirty and, per policy, ask storage to save now
    fn persist(&self, session: &mut PlayerSession) {
        session.save_quest = true;
        if self.save_on_change {
            self.saver.request_save(session.char_id);
        }
    }

    /// Index of `quest_id` in the available partition
    fn available_index(session: &PlayerSession, quest_id: u32) -> Result<usize, QuestError> {
        let char_id = session.char_id;
        match session.quest_log.position_available(quest_id) {
            Some(index) => Ok(index),
            None if session.quest_log.contains(quest_id) => Err(QuestError::NotAvailable { char_id, quest_id }),
            None => Err(QuestError::NotHeld { char_id, quest_id }),
        }
    }

    /// Send the quest list to a freshly logged-in player.
    /// Returns whether anything was sent.
    pub fn login(&self, session: &PlayerSession) -> bool {
        if session.quest_log.available_count() == 0 {
            return false;
        }
        session.notifier.quest_list(&session.quest_log);
        true
    }

    /// Grant a quest
    pub fn add(&self, session: &mut PlayerSession, quest_id: u32) -> Result<(), QuestError> {
        let quest = match self.registry.get(quest_id) {
            None => Err(QuestError::UnknownQuest(quest_id)),
            Some(_) if session.quest_log.contains(quest_id) => {
                Err(QuestError::AlreadyHeld { char_id: session.char_id, quest_id })
            }
            Some(quest) => Ok(quest),
        }
        .inspect_err(|e| error!("quest_add: {}", e))?;

        let deadline = compute_deadline(&quest, &self.clock.now());
        let index = session.quest_log.push_available(QuestLogEntry::new(&quest, deadline));

        let entry = &session.quest_log.entries()[index];
        session.notifier.quest_added(entry);
        session.notifier.objective_updated(entry, 0);
        debug!("Character {} accepted quest {}", session.char_id, quest_id);

        self.persist(session);
        Ok(())
    }

    /// Replace an available quest with a different one, in place
    pub fn change(&self, session: &mut PlayerSession, old_id: u32, new_id: u32) -> Result<(), QuestError> {
        let checked = self.registry
            .get(new_id)
            .ok_or(QuestError::UnknownQuest(new_id))
            .and_then(|quest| {
                if session.quest_log.contains(new_id) {
                    return Err(QuestError::AlreadyHeld { char_id: session.char_id, quest_id: new_id });
                }
                Ok((quest, Self::available_index(session, old_id)?))
            });
        let (quest, index) = checked.inspect_err(|e| error!("quest_change: {}", e))?;

        let deadline = compute_deadline(&quest, &self.clock.now());
        session.quest_log.replace_available(index, QuestLogEntry::new(&quest, deadline));

        session.notifier.quest_deleted(old_id);
        let entry = &session.quest_log.entries()[index];
        session.notifier.quest_added(entry);
        session.notifier.objective_updated(entry, 0);

        self.persist(session);
        Ok(())
    }

    /// Remove a quest in any state
    pub fn delete(&self, session: &mut PlayerSession, quest_id: u32) -> Result<(), QuestError> {
        if session.quest_log.remove(quest_id).is_none() {
            let err = QuestError::NotHeld { char_id: session.char_id, quest_id };
            error!("quest_delete: {}", err);
            return Err(err);
        }

        session.notifier.quest_deleted(quest_id);
        self.persist(session);
        Ok(())
    }

    /// Move an available quest to a new state
    pub fn update_status(&self, session: &mut PlayerSession, quest_id: u32, state: QuestState) -> Result<(), QuestError> {
        Self::available_index(session, quest_id).inspect_err(|e| error!("quest_update_status: {}", e))?;

        session.quest_log.set_state(quest_id, state);
        session.save_quest = true;

        if state.is_complete() {
            session.notifier.quest_deleted(quest_id);
            self.persist(session);
        } else {
            session.notifier.status_updated(quest_id, state == QuestState::Active);
        }
        Ok(())
    }

    /// Answer a script query about a held quest
    pub fn query(&self, session: &PlayerSession, quest_id: u32, query_type: QueryType) -> QueryResult {
        let log = &session.quest_log;
        let now = self.clock.now().timestamp();

        let result = match query_type {
            QueryType::HaveQuest => log.have_quest(quest_id).map(QueryResult::State),
            QueryType::PlayTime => log.play_time(quest_id, now).map(QueryResult::PlayTime),
            QueryType::Hunting => {
                if !log.contains(quest_id) {
                    return QueryResult::NotFound;
                }
                let Some(quest) = self.registry.get(quest_id) else {
                    error!("quest_check: quest {} not found in catalog", quest_id);
                    return QueryResult::NotFound;
                };
                log.hunting(&quest, now).map(QueryResult::Hunting)
            }
        };

        result.unwrap_or(QueryResult::NotFound)
    }

    /// Count a kill towards the player's available quests and roll their
    /// drop bonuses
    pub fn on_monster_killed(&self, session: &mut PlayerSession, mob_id: u32) -> KillOutcome {
        let catalog = self.registry.snapshot();
        let mut outcome = KillOutcome::new(session.char_id, mob_id);

        let PlayerSession { quest_log, inventory, notifier, save_quest, .. } = session;

        for entry in quest_log.available_mut() {
            let Some(quest) = catalog.get(entry.quest_id) else {
                continue;
            };

            // Definition may have gained objectives since the entry was made
            if entry.counts.len() < quest.objectives.len() {
                entry.counts.resize(quest.objectives.len(), 0);
            }

            for (index, objective) in quest.objectives.iter().enumerate() {
                if objective.mob_id != mob_id || entry.counts[index] >= objective.count {
                    continue;
                }
                entry.counts[index] += 1;
                *save_quest = true;
                notifier.objective_updated(entry, mob_id);

                outcome.objectives.push(ObjectiveUpdate {
                    quest_id: entry.quest_id,
                    index,
                    count: entry.counts[index],
                    required: objective.count,
                });
            }

            for drop in quest.drops.iter().filter(|d| d.matches(mob_id)) {
                let Some(max_stack) = self.content().item_max_stack(drop.item_id) else {
                    continue;
                };

                let rate = u32::from(drop.rate);
                if rate < DROP_RATE_BASE && self.rng.draw(DROP_RATE_BASE) >= rate {
                    continue;
                }

                match inventory.add_item(drop.item_id, u32::from(drop.count), max_stack) {
                    Ok(()) => outcome.drops.push(DropOutcome::Granted {
                        quest_id: entry.quest_id,
                        item_id: drop.item_id,
                        count: drop.count,
                    }),
                    Err(reason) => {
                        notifier.item_grant_failed(reason);
                        outcome.drops.push(DropOutcome::Failed {
                            quest_id: entry.quest_id,
                            item_id: drop.item_id,
                            reason,
                        });
                    }
                }
            }
        }

        notifier.quest_info_refresh();

        if !outcome.is_empty() {
            debug!(
                "Character {} killed {}: {} objective updates, {} drops",
                outcome.char_id, mob_id, outcome.objectives.len(), outcome.drops.len()
            );
        }
        outcome
    }

    /// Credit a kill to every online member of a party accepted by `predicate`.
    /// Members with no available quest are left alone.
    pub fn on_party_kill(
        &self,
        players: &dyn PlayerIterator,
        party_id: u32,
        predicate: &dyn Fn(&PlayerSession) -> bool,
        mob_id: u32,
    ) -> Vec<KillOutcome> {
        let mut outcomes = Vec::new();
        players.for_each_party_member(party_id, predicate, &mut |session| {
            if session.quest_log.available_count() > 0 {
                outcomes.push(self.on_monster_killed(session, mob_id));
            }
        });
        outcomes
    }

    /// Process a gameplay event. Party kills are shared with every online
    /// member of the killer's party.
    pub fn handle_event(&self, players: &dyn PlayerIterator, event: &QuestEvent) -> Vec<KillOutcome> {
        match *event {
            QuestEvent::MonsterKilled { party_id: Some(party_id), mob_id, .. } => {
                self.on_party_kill(players, party_id, &|_| true, mob_id)
            }
            QuestEvent::MonsterKilled { char_id, party_id: None, mob_id } => {
                let mut outcomes = Vec::new();
                players.with_player(char_id, &mut |session| {
                    outcomes.push(self.on_monster_killed(session, mob_id));
                });
                outcomes
            }
        }
    }

    /// Drop log entries whose quest no longer exists. Returns how many were
    /// removed.
    pub fn reconcile(&self, session: &mut PlayerSession) -> usize {
        let catalog = self.registry.snapshot();
        let removed = session.quest_log.retain_quests(|quest_id| catalog.contains(quest_id));

        for entry in &removed {
            if !entry.state().is_complete() {
                session.notifier.quest_deleted(entry.quest_id);
            }
        }

        if !removed.is_empty() {
            session.save_quest = true;
            info!("Removed {} stale quests from character {}", removed.len(), session.char_id);
        }
        removed.len()
    }

    /// Reconcile every online player
    pub fn reconcile_all(&self, players: &dyn PlayerIterator) -> usize {
        let mut removed = 0;
        players.for_each_online(&mut |session| removed += self.reconcile(session));
        removed
    }

    /// Rebuild the catalog from its source files, then reconcile every online
    /// player against it
    pub fn reload(&self, players: &dyn PlayerIterator) -> Result<usize, CatalogError> {
        let count = self.registry.load_all()?;
        let removed = self.reconcile_all(players);
        info!("Quest reload: {} definitions, {} stale log entries removed", count, removed);
        Ok(count)
    }
}
