//! End-to-end quest flow: content and catalog from disk, grant, kills,
//! completion, reload and reconciliation of online players.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;

use quest_server::config::ServerConfig;
use quest_server::content::ContentDb;
use quest_server::protocol::ChannelNotifier;
use quest_server::quest::{
    QueryResult, QueryType, QuestRegistry, QuestRunner, QuestState, RandomSource, TimeLimit,
};
use quest_server::session::{PlayerSession, SaveQueue, SessionMap};
use quest_server::storage::QuestLogStore;

const MONSTERS: &str = r#"
[PORING]
id = 1002
display_name = "Poring"

[LUNATIC]
id = 1063
display_name = "Lunatic"
"#;

const ITEMS: &str = r#"
[Jellopy]
id = 909

[Knife]
id = 1201
category = "equipment"
"#;

const QUESTS: &str = r#"
[[quests]]
id = 1000
name = "Poring Hunt"
duration = 3600
objectives = [{ mob = "PORING", count = 2 }]
drops = [{ mob = "PORING", item = "Jellopy", count = 3, rate = 10000 }]

[[quests]]
id = 1001
name = "Lunatic Hunt"
minute_of_hour = 0
objectives = [{ mob = "LUNATIC", count = 1 }]
drops = [{ item = "Knife", count = 4, rate = 10000 }]
"#;

/// Never rolls a drop unless the rate guarantees it
struct NeverLucky;

impl RandomSource for NeverLucky {
    fn draw(&self, bound: u32) -> u32 {
        bound.saturating_sub(1)
    }
}

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn message_types(rx: &mut mpsc::UnboundedReceiver<Vec<u8>>) -> Vec<String> {
    let mut types = Vec::new();
    while let Ok(bytes) = rx.try_recv() {
        let (_, msg_type, _): (u8, String, Value) = rmp_serde::from_slice(&bytes).unwrap();
        types.push(msg_type);
    }
    types
}

#[tokio::test]
async fn quest_lifecycle_across_reload() {
    let temp_dir = TempDir::new().unwrap();
    let config = ServerConfig {
        data_dir: temp_dir.path().join("data"),
        save_dir: temp_dir.path().join("save"),
        ..ServerConfig::default()
    };

    write(&config.data_dir.join("monsters/field.toml"), MONSTERS);
    write(&config.data_dir.join("items/etc.toml"), ITEMS);
    write(&config.data_dir.join(&config.quest_file), QUESTS);
    write(
        &config.data_dir.join(&config.quest_import),
        "[[quests]]\nid = 1000\nname = \"Poring Extermination\"\n",
    );

    let content = ContentDb::load_from_directory(&config.data_dir).unwrap();
    let registry = Arc::new(QuestRegistry::new(config.quest_sources(), Arc::new(content)));
    assert_eq!(registry.load_all().unwrap(), 2);

    let poring_hunt = registry.get(1000).unwrap();
    assert_eq!(poring_hunt.name, "Poring Extermination");
    assert_eq!(poring_hunt.time_limit, TimeLimit::Duration(3600));
    // Knife is equipment, so its bonus count is capped
    assert_eq!(registry.get(1001).unwrap().drops[0].count, 1);

    let (save_queue, mut save_rx) = SaveQueue::channel();
    let runner = QuestRunner::new(Arc::clone(&registry), Arc::new(save_queue))
        .with_random(Arc::new(NeverLucky));

    let sessions = SessionMap::new();
    let mut outbound = Vec::new();
    for char_id in [150001, 150002] {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = PlayerSession::new(char_id, Arc::new(ChannelNotifier::new(tx))).with_party(9);
        sessions.insert(session);
        outbound.push(rx);
    }

    // Both party members take both quests
    for char_id in [150001, 150002] {
        sessions
            .with_session(char_id, |session| {
                runner.add(session, 1000).unwrap();
                runner.add(session, 1001).unwrap();
                assert!(runner.add(session, 1000).is_err());
            })
            .unwrap();
    }
    for _ in 0..4 {
        assert!(save_rx.recv().await.is_some());
    }
    for rx in &mut outbound {
        assert_eq!(
            message_types(rx),
            vec!["questAdded", "questObjectiveProgress", "questAdded", "questObjectiveProgress"]
        );
    }

    // Shared party kills
    for _ in 0..3 {
        runner.on_party_kill(&sessions, 9, &|_| true, 1002);
    }
    runner.on_party_kill(&sessions, 9, &|s| s.char_id == 150001, 1063);

    sessions
        .with_session(150001, |session| {
            assert_eq!(session.quest_log.get(1000).unwrap().counts, vec![2]);
            assert_eq!(session.quest_log.get(1001).unwrap().counts, vec![1]);
            assert_eq!(session.inventory.count_item(909), 9);
            // Four kills, each matching the wildcard knife bonus
            assert_eq!(session.inventory.count_item(1201), 4);
            assert!(session.save_quest);
            assert_eq!(
                runner.query(session, 1000, QueryType::Hunting).code(),
                2
            );

            runner.update_status(session, 1000, QuestState::Complete).unwrap();
            assert_eq!(session.quest_log.available_count(), 1);
            assert_eq!(
                runner.query(session, 1000, QueryType::HaveQuest),
                QueryResult::State(QuestState::Complete)
            );
            assert!(runner.update_status(session, 1000, QuestState::Active).is_err());
        })
        .unwrap();

    sessions
        .with_session(150002, |session| {
            assert_eq!(session.quest_log.get(1001).unwrap().counts, vec![0]);
        })
        .unwrap();

    // Persist and restore the completed log
    let store = QuestLogStore::new(&config.save_dir);
    let snapshot = sessions
        .with_session(150001, |session| session.take_quest_snapshot())
        .flatten()
        .unwrap();
    store.save(150001, &snapshot).await.unwrap();
    let restored = store.load(150001).await.unwrap().unwrap().into_log();
    assert_eq!(restored.available_count(), 1);
    assert_eq!(restored.get(1000).unwrap().state(), QuestState::Complete);

    for rx in &mut outbound {
        message_types(rx);
    }

    // Quest 1000 disappears from the catalog
    write(&config.data_dir.join(&config.quest_import), "");
    write(
        &config.data_dir.join(&config.quest_file),
        "[[quests]]\nid = 1001\nname = \"Lunatic Hunt\"\nminute_of_hour = 0\n",
    );
    assert_eq!(runner.reload(&sessions).unwrap(), 1);

    for char_id in [150001, 150002] {
        sessions
            .with_session(char_id, |session| {
                assert!(!session.quest_log.contains(1000));
                assert!(session.quest_log.contains(1001));
                assert_eq!(session.quest_log.available_count(), 1);
            })
            .unwrap();
    }

    // Only the player still holding 1000 as available is told about it
    assert!(message_types(&mut outbound[0]).is_empty());
    assert_eq!(message_types(&mut outbound[1]), vec!["questDeleted"]);
}
