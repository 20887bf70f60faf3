use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::registry::GameConfig;
use crate::services::checksum::Digest;

// ── GameEntry ──

/// A tracked game. The name is the key it is stored under in [`GameConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEntry {
    pub save_dir: PathBuf,
    #[serde(rename = "game_executable", default)]
    pub executable: PathBuf,
    #[serde(rename = "last_backup_sha", default)]
    pub last_backup_checksum: Option<Digest>,
}

#[derive(Debug, Deserialize)]
pub struct AddGameRequest {
    pub name: String,
    pub save_dir: String,
    #[serde(default)]
    pub executable: String,
}

/// Entry plus its live checksum, as returned by the listing endpoint.
#[derive(Debug, Serialize)]
pub struct GameStatus {
    pub key: String,
    pub value: GameStatusValue,
}

#[derive(Debug, Serialize)]
pub struct GameStatusValue {
    #[serde(flatten)]
    pub entry: GameEntry,
    pub current_sha: Digest,
    pub up_to_date: bool,
}

impl GameStatus {
    pub fn new(name: String, entry: GameEntry, current: Digest) -> Self {
        let up_to_date = entry.last_backup_checksum.as_ref() == Some(&current);
        Self {
            key: name,
            value: GameStatusValue {
                entry,
                current_sha: current,
                up_to_date,
            },
        }
    }
}

pub fn find<'a>(config: &'a GameConfig, name: &str) -> Option<&'a GameEntry> {
    config.games.get(name)
}

/// Returns false if a game with this name already exists.
pub fn add(config: &mut GameConfig, req: &AddGameRequest) -> bool {
    if config.games.contains_key(&req.name) {
        return false;
    }
    config.games.insert(
        req.name.clone(),
        GameEntry {
            save_dir: PathBuf::from(&req.save_dir),
            executable: PathBuf::from(&req.executable),
            last_backup_checksum: None,
        },
    );
    true
}

pub fn remove(config: &mut GameConfig, name: &str) -> bool {
    config.games.remove(name).is_some()
}

/// Returns false if the game is not registered.
pub fn record_backup(config: &mut GameConfig, name: &str, checksum: Digest) -> bool {
    match config.games.get_mut(name) {
        Some(entry) => {
            entry.last_backup_checksum = Some(checksum);
            true
        }
        None => false,
    }
}
