use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use quest_server::config::ServerConfig;
use quest_server::content::ContentDb;
use quest_server::quest::{HotReloadEvent, PlayerIterator, QuestRegistry, QuestRunner};
use quest_server::session::{SaveQueue, SessionMap};
use quest_server::storage::QuestLogStore;

/// Write every dirty quest log to storage. Returns how many were saved.
async fn flush_dirty(sessions: &SessionMap, store: &QuestLogStore) -> usize {
    let mut dirty = Vec::new();
    sessions.for_each_online(&mut |session| {
        if let Some(snapshot) = session.take_quest_snapshot() {
            dirty.push((session.char_id, snapshot));
        }
    });

    let mut saved = 0;
    for (char_id, snapshot) in dirty {
        match store.save(char_id, &snapshot).await {
            Ok(()) => saved += 1,
            Err(e) => {
                warn!("Auto-save failed for character {}: {}", char_id, e);
                // Try again next round
                sessions.with_session(char_id, |session| session.save_quest = true);
            }
        }
    }
    saved
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("server.toml"));
    let config = ServerConfig::load(&config_path).unwrap_or_else(|e| {
        error!("Failed to load config: {}, using defaults", e);
        ServerConfig::default()
    });

    // Monster and item databases (loaded from TOML at startup)
    let content = ContentDb::load_from_directory(&config.data_dir).unwrap_or_else(|e| {
        error!("Failed to load content databases: {}", e);
        ContentDb::default()
    });

    let registry = Arc::new(QuestRegistry::new(config.quest_sources(), Arc::new(content)));
    if let Err(e) = registry.load_all() {
        error!("Failed to load quest registry: {}", e);
    }

    let sessions = Arc::new(SessionMap::new());
    let store = Arc::new(QuestLogStore::new(&config.save_dir));
    let (save_queue, mut save_rx) = SaveQueue::channel();
    let runner = Arc::new(
        QuestRunner::new(Arc::clone(&registry), Arc::new(save_queue))
            .with_save_policy(config.save_on_quest_change),
    );

    // Immediate saves requested by quest changes
    let save_sessions = Arc::clone(&sessions);
    let save_store = Arc::clone(&store);
    tokio::spawn(async move {
        while let Some(char_id) = save_rx.recv().await {
            let snapshot = save_sessions
                .with_session(char_id, |session| session.take_quest_snapshot())
                .flatten();
            let Some(snapshot) = snapshot else {
                continue;
            };
            if let Err(e) = save_store.save(char_id, &snapshot).await {
                warn!("Quest save failed for character {}: {}", char_id, e);
                save_sessions.with_session(char_id, |session| session.save_quest = true);
            }
        }
    });

    // Auto-save loop for logs flagged by kill progress
    let autosave_sessions = Arc::clone(&sessions);
    let autosave_store = Arc::clone(&store);
    let autosave_every = Duration::from_secs(config.autosave_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(autosave_every);
        loop {
            interval.tick().await;
            let saved = flush_dirty(&autosave_sessions, &autosave_store).await;
            if saved > 0 {
                info!("Auto-saved {} quest log(s)", saved);
            }
        }
    });

    // Hot-reload watcher for quest files
    if config.hot_reload {
        match registry.start_file_watcher() {
            Ok(mut rx) => {
                let reload_sessions = Arc::clone(&sessions);
                let reload_runner = Arc::clone(&runner);
                tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        match event {
                            HotReloadEvent::Reloaded(count) => {
                                let removed = reload_runner.reconcile_all(&*reload_sessions);
                                info!(
                                    "Quests reloaded: {} definitions, {} stale log entries removed",
                                    count, removed
                                );
                            }
                            HotReloadEvent::Error(e) => {
                                warn!("Quest reload failed, keeping previous catalog: {}", e);
                            }
                        }
                    }
                });
            }
            Err(e) => error!("Failed to start quest file watcher: {}", e),
        }
    }

    info!(
        "Quest server ready: {} quests, {} online",
        registry.count(),
        sessions.len()
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }

    let saved = flush_dirty(&sessions, &store).await;
    info!("Shutting down, saved {} quest log(s)", saved);
}
