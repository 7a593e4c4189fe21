//! Quest Registry
//!
//! Holds the published quest catalog and rebuilds it from the TOML source
//! files. Readers take an `Arc` snapshot; a reload builds a complete new
//! catalog off to the side and swaps it in only when every file parsed.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

use super::api::ContentLookup;
use super::definition::QuestDefinition;
use super::loader::CatalogLoader;
use crate::error::CatalogError;

/// Immutable set of quest definitions keyed by id
#[derive(Debug, Clone, Default)]
pub struct QuestCatalog {
    quests: HashMap<u32, Arc<QuestDefinition>>,
}

impl QuestCatalog {
    pub fn get(&self, quest_id: u32) -> Option<&Arc<QuestDefinition>> {
        self.quests.get(&quest_id)
    }

    pub fn contains(&self, quest_id: u32) -> bool {
        self.quests.contains_key(&quest_id)
    }

    /// Add or replace a definition
    pub fn insert(&mut self, quest: QuestDefinition) {
        self.quests.insert(quest.id, Arc::new(quest));
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.quests.keys().copied()
    }
}

/// Registry for all quest definitions
pub struct QuestRegistry {
    /// Currently published catalog
    catalog: RwLock<Arc<QuestCatalog>>,
    /// Quest files, applied in order
    sources: Vec<PathBuf>,
    content: Arc<dyn ContentLookup>,
}

impl QuestRegistry {
    pub fn new(sources: Vec<PathBuf>, content: Arc<dyn ContentLookup>) -> Self {
        Self {
            catalog: RwLock::new(Arc::new(QuestCatalog::default())),
            sources,
            content,
        }
    }

    /// Registry serving a prebuilt catalog, with no files behind it
    pub fn from_catalog(catalog: QuestCatalog, content: Arc<dyn ContentLookup>) -> Self {
        Self {
            catalog: RwLock::new(Arc::new(catalog)),
            sources: Vec::new(),
            content,
        }
    }

    pub fn content(&self) -> &Arc<dyn ContentLookup> {
        &self.content
    }

    /// Rebuild the catalog from every source file and publish it.
    ///
    /// Records in later files patch records with the same id in earlier
    /// ones. If any file can't be read or parsed the previous catalog stays
    /// published. Returns the number of definitions now in the catalog.
    pub fn load_all(&self) -> Result<usize, CatalogError> {
        info!("Loading quests from {:?}", self.sources);

        let loader = CatalogLoader::new(self.content.as_ref());
        let mut catalog = QuestCatalog::default();
        let mut records = 0;

        for path in &self.sources {
            if !path.exists() {
                warn!("Quest file does not exist: {:?}", path);
                continue;
            }
            let loaded = loader.load_file(&mut catalog, path)?;
            info!("Loaded {} quest records from {:?}", loaded, path);
            records += loaded;
        }

        let count = catalog.len();
        self.publish(catalog);
        info!("Loaded {} quest definitions ({} records)", count, records);

        Ok(count)
    }

    /// Swap in a catalog built elsewhere
    pub fn publish(&self, catalog: QuestCatalog) {
        let mut current = self.catalog.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(catalog);
    }

    /// The currently published catalog
    pub fn snapshot(&self) -> Arc<QuestCatalog> {
        let current = self.catalog.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    /// Get a quest by ID
    pub fn get(&self, quest_id: u32) -> Option<Arc<QuestDefinition>> {
        self.snapshot().get(quest_id).cloned()
    }

    pub fn contains(&self, quest_id: u32) -> bool {
        self.snapshot().contains(quest_id)
    }

    /// Get count of loaded quests
    pub fn count(&self) -> usize {
        self.snapshot().len()
    }

    /// Get all quest IDs, sorted
    pub fn all_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.snapshot().ids().collect();
        ids.sort_unstable();
        ids
    }

    /// Start file watcher for hot-reload.
    ///
    /// The watcher thread reloads the catalog itself; the returned channel
    /// reports each outcome so the caller can reconcile online players.
    pub fn start_file_watcher(
        self: &Arc<Self>,
    ) -> Result<tokio::sync::mpsc::Receiver<HotReloadEvent>, notify::Error> {
        use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
        use std::time::Duration;

        let (tx, rx) = tokio::sync::mpsc::channel(32);
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = notify_tx.send(event);
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(1)),
        )?;

        // Watch the containing directories so editors that replace the file
        // on save are still seen
        let mut watched: Vec<PathBuf> = Vec::new();
        for source in &self.sources {
            let Some(dir) = source.parent() else {
                continue;
            };
            let dir = if dir.as_os_str().is_empty() { PathBuf::from(".") } else { dir.to_path_buf() };
            if watched.contains(&dir) || !dir.exists() {
                continue;
            }
            watcher.watch(&dir, RecursiveMode::NonRecursive)?;
            watched.push(dir);
        }

        let file_names: Vec<_> = self.sources
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_os_string()))
            .collect();
        let registry = Arc::clone(self);

        std::thread::spawn(move || {
            // Keep the watcher alive for the life of the thread
            let _watcher = watcher;
            info!("Quest hot-reload watcher started for {:?}", watched);

            while let Ok(event) = notify_rx.recv() {
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    continue;
                }

                let touched = event.paths.iter().any(|path| {
                    path.file_name().is_some_and(|name| file_names.iter().any(|n| n == name))
                });
                if !touched {
                    continue;
                }

                // Editors tend to emit a burst of events per save
                while notify_rx.recv_timeout(Duration::from_millis(250)).is_ok() {}

                info!("Detected change in {:?}, triggering reload", event.paths);
                let outcome = match registry.load_all() {
                    Ok(count) => {
                        info!("Hot-reload completed successfully");
                        HotReloadEvent::Reloaded(count)
                    }
                    Err(e) => {
                        tracing::error!("Hot-reload failed: {}", e);
                        HotReloadEvent::Error(e.to_string())
                    }
                };

                if tx.blocking_send(outcome).is_err() {
                    // Receiver dropped, nobody is listening any more
                    break;
                }
            }
        });

        Ok(rx)
    }
}

/// Events from the hot-reload watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotReloadEvent {
    /// Catalog was rebuilt; carries the new definition count
    Reloaded(usize),
    /// The reload failed and the previous catalog is still in use
    Error(String),
}
