//! Online player sessions and the save queue

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::item::Inventory;
use crate::quest::api::{PlayerIterator, QuestNotifier, SaveRequester};
use crate::quest::state::{PlayerQuestLog, QuestLogSnapshot};

/// Quest-relevant state of one connected character
pub struct PlayerSession {
    pub char_id: u32,
    pub party_id: Option<u32>,
    pub quest_log: PlayerQuestLog,
    /// Quest log changed since the last save
    pub save_quest: bool,
    pub inventory: Inventory,
    pub notifier: Arc<dyn QuestNotifier>,
}

impl PlayerSession {
    pub fn new(char_id: u32, notifier: Arc<dyn QuestNotifier>) -> Self {
        Self {
            char_id,
            party_id: None,
            quest_log: PlayerQuestLog::new(),
            save_quest: false,
            inventory: Inventory::new(),
            notifier,
        }
    }

    /// Session whose quest log is restored from saved data
    pub fn restore(char_id: u32, snapshot: QuestLogSnapshot, notifier: Arc<dyn QuestNotifier>) -> Self {
        Self {
            quest_log: snapshot.into_log(),
            ..Self::new(char_id, notifier)
        }
    }

    pub fn with_party(mut self, party_id: u32) -> Self {
        self.party_id = Some(party_id);
        self
    }

    /// Take the quest log for saving, clearing the dirty flag
    pub fn take_quest_snapshot(&mut self) -> Option<QuestLogSnapshot> {
        if !self.save_quest {
            return None;
        }
        self.save_quest = false;
        Some(self.quest_log.snapshot())
    }
}

/// All online sessions keyed by character id
#[derive(Default)]
pub struct SessionMap {
    sessions: DashMap<u32, PlayerSession>,
}

impl SessionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: PlayerSession) {
        if self.sessions.insert(session.char_id, session).is_some() {
            warn!("Replaced an existing session");
        }
    }

    pub fn remove(&self, char_id: u32) -> Option<PlayerSession> {
        self.sessions.remove(&char_id).map(|(_, session)| session)
    }

    pub fn contains(&self, char_id: u32) -> bool {
        self.sessions.contains_key(&char_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Run `f` against one session, if it is online
    pub fn with_session<R>(&self, char_id: u32, f: impl FnOnce(&mut PlayerSession) -> R) -> Option<R> {
        self.sessions.get_mut(&char_id).map(|mut session| f(session.value_mut()))
    }
}

impl PlayerIterator for SessionMap {
    fn for_each_online(&self, f: &mut dyn FnMut(&mut PlayerSession)) {
        for mut session in self.sessions.iter_mut() {
            f(session.value_mut());
        }
    }

    fn with_player(&self, char_id: u32, f: &mut dyn FnMut(&mut PlayerSession)) -> bool {
        self.with_session(char_id, |session| f(session)).is_some()
    }
}

/// Save requests bound for the storage tier
#[derive(Debug, Clone)]
pub struct SaveQueue {
    tx: mpsc::UnboundedSender<u32>,
}

impl SaveQueue {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<u32>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SaveRequester for SaveQueue {
    fn request_save(&self, char_id: u32) {
        if self.tx.send(char_id).is_err() {
            warn!("Save queue closed, dropping save for character {}", char_id);
        } else {
            debug!("Queued save for character {}", char_id);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::InventoryError;
    use crate::quest::state::{QuestLogEntry, QuestState};
    use std::sync::Mutex;

    /// Notification recorded by `RecordingNotifier`
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Sent {
        List(Vec<u32>),
        Added(u32),
        Deleted(u32),
        Objective { quest_id: u32, mob_id: u32, counts: Vec<u16> },
        Status { quest_id: u32, active: bool },
        GrantFailed(InventoryError),
        Refresh,
    }

    /// Notifier that keeps everything it was asked to send
    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        sent: Mutex<Vec<Sent>>,
    }

    impl RecordingNotifier {
        pub(crate) fn take(&self) -> Vec<Sent> {
            std::mem::take(&mut *self.sent.lock().unwrap())
        }

        fn push(&self, sent: Sent) {
            self.sent.lock().unwrap().push(sent);
        }
    }

    impl QuestNotifier for RecordingNotifier {
        fn quest_list(&self, log: &PlayerQuestLog) {
            self.push(Sent::List(log.entries().iter().map(|e| e.quest_id).collect()));
        }

        fn quest_added(&self, entry: &QuestLogEntry) {
            self.push(Sent::Added(entry.quest_id));
        }

        fn quest_deleted(&self, quest_id: u32) {
            self.push(Sent::Deleted(quest_id));
        }

        fn objective_updated(&self, entry: &QuestLogEntry, mob_id: u32) {
            self.push(Sent::Objective {
                quest_id: entry.quest_id,
                mob_id,
                counts: entry.counts.clone(),
            });
        }

        fn status_updated(&self, quest_id: u32, active: bool) {
            self.push(Sent::Status { quest_id, active });
        }

        fn item_grant_failed(&self, reason: InventoryError) {
            self.push(Sent::GrantFailed(reason));
        }

        fn quest_info_refresh(&self) {
            self.push(Sent::Refresh);
        }
    }

    pub(crate) fn recording_session(char_id: u32) -> (PlayerSession, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        (PlayerSession::new(char_id, notifier.clone()), notifier)
    }

    #[test]
    fn test_party_iteration() {
        let sessions = SessionMap::new();
        for char_id in 1..=4 {
            let (session, _) = recording_session(char_id);
            let session = if char_id <= 3 { session.with_party(10) } else { session };
            sessions.insert(session);
        }

        let mut visited = Vec::new();
        sessions.for_each_party_member(10, &|s| s.char_id != 2, &mut |s| visited.push(s.char_id));
        visited.sort_unstable();
        assert_eq!(visited, vec![1, 3]);

        let mut online = 0;
        sessions.for_each_online(&mut |_| online += 1);
        assert_eq!(online, 4);
    }

    #[test]
    fn test_with_session_mutates() {
        let sessions = SessionMap::new();
        let (session, _) = recording_session(7);
        sessions.insert(session);

        assert_eq!(sessions.with_session(7, |s| { s.save_quest = true; s.char_id }), Some(7));
        assert_eq!(sessions.with_session(8, |s| s.char_id), None);
        assert!(sessions.remove(7).unwrap().save_quest);
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_with_player() {
        let sessions = SessionMap::new();
        for char_id in 1..=3 {
            let (session, _) = recording_session(char_id);
            sessions.insert(session);
        }

        let mut visited = Vec::new();
        assert!(sessions.with_player(2, &mut |s| visited.push(s.char_id)));
        assert!(!sessions.with_player(9, &mut |s| visited.push(s.char_id)));
        assert_eq!(visited, vec![2]);
    }

    #[test]
    fn test_restore_and_snapshot() {
        let snapshot = QuestLogSnapshot {
            entries: vec![
                QuestLogEntry::restore(1, 0, QuestState::Complete, vec![]),
                QuestLogEntry::restore(2, 0, QuestState::Active, vec![1]),
            ],
        };
        let notifier = Arc::new(RecordingNotifier::default());
        let mut session = PlayerSession::restore(5, snapshot, notifier);
        assert_eq!(session.quest_log.available_count(), 1);
        assert_eq!(session.quest_log.entries()[0].quest_id, 2);

        assert!(session.take_quest_snapshot().is_none());
        session.save_quest = true;
        let saved = session.take_quest_snapshot().unwrap();
        assert_eq!(saved.entries.len(), 2);
        assert!(!session.save_quest);
    }

    #[tokio::test]
    async fn test_save_queue() {
        let (queue, mut rx) = SaveQueue::channel();
        queue.request_save(42);
        queue.request_save(43);
        assert_eq!(rx.recv().await, Some(42));
        assert_eq!(rx.recv().await, Some(43));

        drop(rx);
        queue.request_save(44);
    }
}
