use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error};

use crate::error::InventoryError;
use crate::quest::api::QuestNotifier;
use crate::quest::state::{PlayerQuestLog, QuestLogEntry, QuestState};

/// Envelope code for room data frames
pub const ROOM_DATA: u8 = 13;

// ============================================================================
// Server -> Client Messages
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// Full quest log, sent on login
    QuestList {
        quests: Vec<QuestEntryData>,
    },
    QuestAdded {
        quest: QuestEntryData,
    },
    QuestDeleted {
        quest_id: u32,
    },
    QuestObjectiveProgress {
        quest_id: u32,
        /// Kill that caused the update, 0 when seeding a new quest
        mob_id: u32,
        counts: Vec<u16>,
    },
    QuestStatus {
        quest_id: u32,
        active: bool,
    },
    ItemGrantFailed {
        code: u8,
        reason: String,
    },
    /// Ask the client to redraw quest markers
    QuestInfoRefresh,
}

/// Quest log entry for client sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestEntryData {
    pub quest_id: u32,
    pub state: QuestState,
    /// Unix seconds, 0 for none
    pub deadline: i64,
    pub counts: Vec<u16>,
}

impl From<&QuestLogEntry> for QuestEntryData {
    fn from(entry: &QuestLogEntry) -> Self {
        Self {
            quest_id: entry.quest_id,
            state: entry.state(),
            deadline: entry.deadline,
            counts: entry.counts.clone(),
        }
    }
}

impl ServerMessage {
    pub fn msg_type(&self) -> &'static str {
        match self {
            ServerMessage::QuestList { .. } => "questList",
            ServerMessage::QuestAdded { .. } => "questAdded",
            ServerMessage::QuestDeleted { .. } => "questDeleted",
            ServerMessage::QuestObjectiveProgress { .. } => "questObjectiveProgress",
            ServerMessage::QuestStatus { .. } => "questStatus",
            ServerMessage::ItemGrantFailed { .. } => "itemGrantFailed",
            ServerMessage::QuestInfoRefresh => "questInfoRefresh",
        }
    }

    pub fn item_grant_failed(reason: InventoryError) -> Self {
        let code = match reason {
            InventoryError::InvalidAmount(_) => 1,
            InventoryError::InventoryFull => 2,
        };
        ServerMessage::ItemGrantFailed {
            code,
            reason: reason.to_string(),
        }
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a server message to MessagePack format
/// Format: [13, "msg_type", {data}]
pub fn encode_server_message(msg: &ServerMessage) -> Result<Vec<u8>, rmp_serde::encode::Error> {
    rmp_serde::to_vec_named(&(ROOM_DATA, msg.msg_type(), msg))
}

// ============================================================================
// Notifier
// ============================================================================

/// Sends quest notifications down a session's outbound channel
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: UnboundedSender<Vec<u8>>,
}

impl ChannelNotifier {
    pub fn new(tx: UnboundedSender<Vec<u8>>) -> Self {
        Self { tx }
    }

    fn send(&self, msg: ServerMessage) {
        let bytes = match encode_server_message(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to encode {}: {}", msg.msg_type(), e);
                return;
            }
        };

        if self.tx.send(bytes).is_err() {
            debug!("Dropping {} for disconnected client", msg.msg_type());
        }
    }
}

impl QuestNotifier for ChannelNotifier {
    fn quest_list(&self, log: &PlayerQuestLog) {
        self.send(ServerMessage::QuestList {
            quests: log.entries().iter().map(QuestEntryData::from).collect(),
        });
    }

    fn quest_added(&self, entry: &QuestLogEntry) {
        self.send(ServerMessage::QuestAdded { quest: entry.into() });
    }

    fn quest_deleted(&self, quest_id: u32) {
        self.send(ServerMessage::QuestDeleted { quest_id });
    }

    fn objective_updated(&self, entry: &QuestLogEntry, mob_id: u32) {
        self.send(ServerMessage::QuestObjectiveProgress {
            quest_id: entry.quest_id,
            mob_id,
            counts: entry.counts.clone(),
        });
    }

    fn status_updated(&self, quest_id: u32, active: bool) {
        self.send(ServerMessage::QuestStatus { quest_id, active });
    }

    fn item_grant_failed(&self, reason: InventoryError) {
        self.send(ServerMessage::item_grant_failed(reason));
    }

    fn quest_info_refresh(&self) {
        self.send(ServerMessage::QuestInfoRefresh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tokio::sync::mpsc;

    fn decode(bytes: &[u8]) -> (u8, String, Value) {
        rmp_serde::from_slice(bytes).unwrap()
    }

    #[test]
    fn test_envelope() {
        let bytes = encode_server_message(&ServerMessage::QuestStatus { quest_id: 7, active: false }).unwrap();
        let (code, msg_type, data) = decode(&bytes);
        assert_eq!(code, ROOM_DATA);
        assert_eq!(msg_type, "questStatus");
        assert_eq!(data, json!({ "quest_id": 7, "active": false }));
    }

    #[test]
    fn test_grant_failure_codes() {
        assert_eq!(
            ServerMessage::item_grant_failed(InventoryError::InventoryFull),
            ServerMessage::ItemGrantFailed { code: 2, reason: "inventory is full".to_string() }
        );
        assert!(matches!(
            ServerMessage::item_grant_failed(InventoryError::InvalidAmount(0)),
            ServerMessage::ItemGrantFailed { code: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_channel_notifier_sends_messages() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = ChannelNotifier::new(tx);

        let entry = QuestLogEntry::restore(1000, 0, QuestState::Active, vec![2, 0]);
        notifier.quest_added(&entry);
        notifier.objective_updated(&entry, 1002);
        notifier.quest_deleted(1000);
        notifier.item_grant_failed(InventoryError::InventoryFull);

        let (_, msg_type, data) = decode(&rx.recv().await.unwrap());
        assert_eq!(msg_type, "questAdded");
        assert_eq!(
            data,
            json!({ "quest": { "quest_id": 1000, "state": "active", "deadline": 0, "counts": [2, 0] } })
        );

        let (_, msg_type, data) = decode(&rx.recv().await.unwrap());
        assert_eq!(msg_type, "questObjectiveProgress");
        assert_eq!(data["mob_id"], json!(1002));

        let (_, msg_type, data) = decode(&rx.recv().await.unwrap());
        assert_eq!(msg_type, "questDeleted");
        assert_eq!(data["quest_id"], json!(1000));

        let (_, msg_type, data) = decode(&rx.recv().await.unwrap());
        assert_eq!(msg_type, "itemGrantFailed");
        assert_eq!(data["code"], json!(2));
    }

    #[tokio::test]
    async fn test_closed_channel_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let notifier = ChannelNotifier::new(tx);
        notifier.quest_info_refresh();
    }
}
