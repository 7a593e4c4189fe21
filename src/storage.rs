//! Quest log persistence
//!
//! One JSON document per character under the save directory.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StorageError;
use crate::quest::state::QuestLogSnapshot;

pub struct QuestLogStore {
    dir: PathBuf,
}

impl QuestLogStore {
    pub fn new(dir: &Path) -> Self {
        Self { dir: dir.to_path_buf() }
    }

    fn path_for(&self, char_id: u32) -> PathBuf {
        self.dir.join(format!("{}.json", char_id))
    }

    pub async fn save(&self, char_id: u32, snapshot: &QuestLogSnapshot) -> Result<(), StorageError> {
        let path = self.path_for(char_id);
        let json = snapshot
            .to_json()
            .map_err(|source| StorageError::Json { path: path.clone(), source })?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StorageError::Io { path: self.dir.clone(), source })?;

        // Write then rename so a crash never leaves a torn file
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|source| StorageError::Io { path: tmp.clone(), source })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| StorageError::Io { path: path.clone(), source })?;

        debug!("Saved {} quests for character {}", snapshot.entries.len(), char_id);
        Ok(())
    }

    /// Saved log for a character, `None` if it never saved one
    pub async fn load(&self, char_id: u32) -> Result<Option<QuestLogSnapshot>, StorageError> {
        let path = self.path_for(char_id);
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        QuestLogSnapshot::from_json(&json)
            .map(Some)
            .map_err(|source| StorageError::Json { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::state::{QuestLogEntry, QuestState};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = QuestLogStore::new(&temp_dir.path().join("save"));

        assert!(store.load(150000).await.unwrap().is_none());

        let snapshot = QuestLogSnapshot {
            entries: vec![
                QuestLogEntry::restore(1000, 1_714_560_000, QuestState::Active, vec![3, 1]),
                QuestLogEntry::restore(1001, 0, QuestState::Complete, vec![]),
            ],
        };
        store.save(150000, &snapshot).await.unwrap();
        assert_eq!(store.load(150000).await.unwrap(), Some(snapshot));
    }

    #[tokio::test]
    async fn test_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("7.json"), "{ not json").unwrap();

        let store = QuestLogStore::new(temp_dir.path());
        assert!(matches!(store.load(7).await, Err(StorageError::Json { .. })));
    }
}
