//! Server configuration loaded from `server.toml`

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::CatalogError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Root of the content files
    pub data_dir: PathBuf,
    /// Main quest file, relative to `data_dir`
    pub quest_file: PathBuf,
    /// Local overrides applied on top of `quest_file`, relative to `data_dir`
    pub quest_import: PathBuf,
    /// Where quest logs are persisted
    pub save_dir: PathBuf,
    /// Request a save as soon as a quest is granted, replaced, removed or completed
    pub save_on_quest_change: bool,
    /// Reload quests when their files change
    pub hot_reload: bool,
    /// Interval for flushing dirty quest logs
    pub autosave_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            quest_file: PathBuf::from("quests.toml"),
            quest_import: PathBuf::from("import/quests.toml"),
            save_dir: PathBuf::from("save"),
            save_on_quest_change: true,
            hot_reload: true,
            autosave_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            warn!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|source| CatalogError::Io { path: path.to_path_buf(), source })?;
        let config: ServerConfig = toml::from_str(&content)
            .map_err(|source| CatalogError::Parse { path: path.to_path_buf(), source })?;

        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Quest files in load order
    pub fn quest_sources(&self) -> Vec<PathBuf> {
        vec![
            self.data_dir.join(&self.quest_file),
            self.data_dir.join(&self.quest_import),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ServerConfig::load(&temp_dir.path().join("server.toml")).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(
            config.quest_sources(),
            vec![PathBuf::from("data/quests.toml"), PathBuf::from("data/import/quests.toml")]
        );
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("server.toml");
        std::fs::write(&path, "data_dir = \"content\"\nsave_on_quest_change = false\n").unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("content"));
        assert!(!config.save_on_quest_change);
        assert!(config.hot_reload);
        assert_eq!(config.quest_file, PathBuf::from("quests.toml"));
    }

    #[test]
    fn test_bad_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("server.toml");
        std::fs::write(&path, "hot_reload = \"maybe\"\n").unwrap();
        assert!(matches!(ServerConfig::load(&path), Err(CatalogError::Parse { .. })));
    }
}
