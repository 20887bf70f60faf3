//! Persisted game registry.
//!
//! A single JSON document holds every tracked game plus the webhook URL. It
//! is read fresh for every request and fully rewritten after each change.
//! Concurrent writers are not coordinated; the last rename wins.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::models::game::GameEntry;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub games: BTreeMap<String, GameEntry>,
    pub webhook_url: String,
}

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("registry I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Not a JSON object. Handled inside [`ConfigStore::load`].
    #[error("registry document is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("failed to serialize registry: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the registry. A missing document, or one that is not a JSON
    /// object, is replaced by the default one, which is written back
    /// immediately. Fields of the wrong type fall back to their defaults
    /// and malformed game entries are skipped, keeping the rest.
    pub fn load(&self) -> Result<GameConfig, RegistryError> {
        match self.read() {
            Ok(Some(config)) => Ok(config),
            Ok(None) => {
                tracing::info!(path = %self.path.display(), "Registry not found, creating default");
                let config = GameConfig::default();
                self.save(&config)?;
                Ok(config)
            }
            Err(RegistryError::Corrupt(e)) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Registry corrupt, resetting to default");
                let config = GameConfig::default();
                self.save(&config)?;
                Ok(config)
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the document atomically via a sibling temp file and rename.
    pub fn save(&self, config: &GameConfig) -> Result<(), RegistryError> {
        let json = serde_json::to_vec_pretty(config).map_err(RegistryError::Serialize)?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
        temp.write_all(&json)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| RegistryError::Io(e.error))?;
        Ok(())
    }

    fn read(&self) -> Result<Option<GameConfig>, RegistryError> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value: Value = serde_json::from_slice(&data).map_err(RegistryError::Corrupt)?;
        match value {
            Value::Object(root) => Ok(Some(self.merge_over_default(root))),
            _ => Err(RegistryError::Corrupt(serde::de::Error::custom(
                "registry document is not a JSON object",
            ))),
        }
    }

    fn merge_over_default(&self, mut root: Map<String, Value>) -> GameConfig {
        let mut config = GameConfig::default();

        match root.remove("webhook_url") {
            None => {}
            Some(Value::String(url)) => config.webhook_url = url,
            Some(other) => {
                tracing::warn!(path = %self.path.display(), value = %other, "Ignoring non-string webhook_url");
            }
        }

        match root.remove("games") {
            None => {}
            Some(Value::Object(games)) => {
                for (name, raw) in games {
                    match serde_json::from_value::<GameEntry>(raw) {
                        Ok(entry) => {
                            config.games.insert(name, entry);
                        }
                        Err(e) => {
                            tracing::warn!(game = %name, error = %e, "Skipping malformed game entry");
                        }
                    }
                }
            }
            Some(other) => {
                tracing::warn!(path = %self.path.display(), value = %other, "Ignoring non-object games");
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::checksum::Digest;
    use std::fs;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join("game_config.json"))
    }

    #[test]
    fn test_missing_document_creates_default() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = store(&dir);

        let config = store.load()?;

        assert_eq!(config, GameConfig::default());
        let on_disk: serde_json::Value = serde_json::from_slice(&fs::read(store.path())?)?;
        assert_eq!(on_disk, serde_json::json!({ "games": {}, "webhook_url": "" }));
        Ok(())
    }

    #[test]
    fn test_corrupt_document_is_reset() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = store(&dir);
        fs::write(store.path(), b"{ not json")?;

        let config = store.load()?;

        assert_eq!(config, GameConfig::default());
        let reread: GameConfig = serde_json::from_slice(&fs::read(store.path())?)?;
        assert_eq!(reread, GameConfig::default());
        Ok(())
    }

    #[test]
    fn test_wrong_field_types_keep_valid_games() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = store(&dir);
        let document = br#"{
            "games": {
                "chess": {
                    "save_dir": "/saves/chess",
                    "game_executable": "chess.exe",
                    "last_backup_sha": null
                },
                "broken": { "game_executable": "broken.exe" }
            },
            "webhook_url": null
        }"#;
        fs::write(store.path(), document)?;

        let config = store.load()?;

        assert_eq!(config.webhook_url, "");
        assert_eq!(config.games.len(), 1);
        assert_eq!(config.games["chess"].save_dir, PathBuf::from("/saves/chess"));
        assert_eq!(fs::read(store.path())?, document.to_vec());
        Ok(())
    }

    #[test]
    fn test_non_object_document_is_reset() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = store(&dir);
        fs::write(store.path(), b"[1, 2, 3]")?;

        assert_eq!(store.load()?, GameConfig::default());
        let reread: GameConfig = serde_json::from_slice(&fs::read(store.path())?)?;
        assert_eq!(reread, GameConfig::default());
        Ok(())
    }

    #[test]
    fn test_partial_document_gets_defaults() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = store(&dir);
        fs::write(store.path(), br#"{"webhook_url": "https://hooks.example/x"}"#)?;

        let config = store.load()?;

        assert!(config.games.is_empty());
        assert_eq!(config.webhook_url, "https://hooks.example/x");
        Ok(())
    }

    #[test]
    fn test_reads_existing_document() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = store(&dir);
        fs::write(
            store.path(),
            br#"{
                "games": {
                    "chess": {
                        "save_dir": "/saves/chess",
                        "game_executable": "chess.exe",
                        "last_backup_sha": null
                    }
                },
                "webhook_url": ""
            }"#,
        )?;

        let config = store.load()?;
        let chess = &config.games["chess"];
        assert_eq!(chess.save_dir, PathBuf::from("/saves/chess"));
        assert_eq!(chess.last_backup_checksum, None);
        Ok(())
    }

    #[test]
    fn test_save_round_trip_leaves_no_temp_files() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = store(&dir);

        let mut config = GameConfig::default();
        config.webhook_url = "https://hooks.example/y".into();
        config.games.insert(
            "chess".into(),
            GameEntry {
                save_dir: "/saves/chess".into(),
                executable: "chess.exe".into(),
                last_backup_checksum: Some(Digest::empty()),
            },
        );
        store.save(&config)?;

        assert_eq!(store.load()?, config);
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }
}
