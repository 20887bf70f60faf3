//! Backup orchestration: archive a game's save directory, checksum it, and
//! record the checksum in the registry.
//!
//! Archiving and checksumming read the directory one after the other without
//! a lock on it, so a directory modified in between gives an archive and a
//! digest that do not describe the same state.

use serde::Serialize;

use crate::models::game::{self, GameStatus};
use crate::models::registry::{ConfigStore, RegistryError};
use crate::services::archive::{backup_label, build_backup, ArchiveOptions, ArchivePayload, BackupCreationError};
use crate::services::checksum::{compute_checksum, ChecksumError, ChecksumOptions, Digest};

#[derive(thiserror::Error, Debug)]
pub enum BackupError {
    #[error("Game not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Creation(#[from] BackupCreationError),

    #[error(transparent)]
    Checksum(#[from] ChecksumError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Serialize)]
pub struct BackupOutcome {
    #[serde(rename = "zip_content")]
    pub payload: ArchivePayload,
    #[serde(rename = "sha")]
    pub checksum: Digest,
}

/// Back up one game and persist its new checksum.
///
/// An unknown game returns [`BackupError::NotFound`] without touching the
/// registry document.
pub fn run_backup(
    store: &ConfigStore,
    game_name: &str,
    archive_options: &ArchiveOptions,
    checksum_options: &ChecksumOptions,
) -> Result<BackupOutcome, BackupError> {
    let mut config = store.load()?;
    let entry = game::find(&config, game_name)
        .ok_or_else(|| BackupError::NotFound(game_name.to_string()))?;
    let save_dir = entry.save_dir.clone();

    let payload = build_backup(&save_dir, &backup_label(game_name), archive_options)?;
    let checksum = compute_checksum(&save_dir, checksum_options)?;

    game::record_backup(&mut config, game_name, checksum.clone());
    store.save(&config)?;

    tracing::info!(
        game = %game_name,
        files = payload.file_count(),
        size = payload.len(),
        sha = %checksum,
        "Backup completed"
    );

    Ok(BackupOutcome { payload, checksum })
}

/// Every registered game with a freshly computed checksum of its save directory.
pub fn list_games(store: &ConfigStore, checksum_options: &ChecksumOptions) -> Result<Vec<GameStatus>, BackupError> {
    let config = store.load()?;
    let mut statuses = Vec::with_capacity(config.games.len());
    for (name, entry) in config.games {
        let current = compute_checksum(&entry.save_dir, checksum_options)?;
        statuses.push(GameStatus::new(name, entry, current));
    }
    Ok(statuses)
}
