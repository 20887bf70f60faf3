use std::path::PathBuf;

use crate::services::archive::ArchiveOptions;
use crate::services::checksum::ChecksumOptions;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub bind_addr: String,
    pub config_file: PathBuf,
    pub temp_dir: PathBuf,
    pub log_level: String,
    pub skip_unreadable: bool,
    pub sorted_checksum: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".into()),
            config_file: PathBuf::from(
                std::env::var("CONFIG_FILE").unwrap_or_else(|_| "game_config.json".into()),
            ),
            temp_dir: std::env::var("BACKUP_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            skip_unreadable: std::env::var("CHECKSUM_SKIP_UNREADABLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            sorted_checksum: std::env::var("CHECKSUM_SORTED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }

    /// Settings rooted in `dir`, for tests and embedding.
    pub fn in_dir(dir: &std::path::Path) -> Self {
        Self {
            port: 0,
            bind_addr: "127.0.0.1".into(),
            config_file: dir.join("game_config.json"),
            temp_dir: dir.to_path_buf(),
            log_level: "info".into(),
            skip_unreadable: true,
            sorted_checksum: false,
        }
    }

    pub fn checksum_options(&self) -> ChecksumOptions {
        ChecksumOptions {
            skip_unreadable: self.skip_unreadable,
            sort_entries: self.sorted_checksum,
        }
    }

    pub fn archive_options(&self) -> ArchiveOptions {
        ArchiveOptions {
            temp_dir: self.temp_dir.clone(),
        }
    }
}
