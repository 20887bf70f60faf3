//! Zip archives of save directories.
//!
//! The archive is written to a named temporary file and read back into
//! memory. The temporary file is removed when it goes out of scope, so
//! nothing is left on disk whether the build succeeds or not.

use base64::{engine::general_purpose, Engine};
use serde::{Serialize, Serializer};
use std::io;
use std::path::{Component, Path, PathBuf};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::fs::walker::{walk_files_with_callback, WalkOptions};

#[derive(thiserror::Error, Debug)]
pub enum BackupCreationError {
    #[error("failed to create backup: {0}")]
    Io(#[from] io::Error),

    #[error("failed to create backup: {0}")]
    Archive(#[from] ZipError),
}

#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    /// Where the temporary archive is written while it is being built
    pub temp_dir: PathBuf,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
        }
    }
}

/// Bytes of a finished zip archive. Serializes as a base64 string.
#[derive(Debug, Clone)]
pub struct ArchivePayload {
    bytes: Vec<u8>,
    file_count: usize,
}

impl ArchivePayload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of files stored in the archive
    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }
}

impl Serialize for ArchivePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

/// Label for a backup of `game_name` taken now, e.g. `chess_20240131_235959`.
pub fn backup_label(game_name: &str) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("{}_{}", sanitize_label(game_name), timestamp)
}

/// Zip every regular file under `root` with deflate compression.
///
/// Entries are named by their path relative to `root`. `label` only names
/// the temporary file. Any I/O failure aborts the whole build.
pub fn build_backup(
    root: &Path,
    label: &str,
    options: &ArchiveOptions,
) -> Result<ArchivePayload, BackupCreationError> {
    let temp = tempfile::Builder::new()
        .prefix(&format!("backup_{}_", sanitize_label(label)))
        .suffix(".zip")
        .tempfile_in(&options.temp_dir)?;

    let walk_options = WalkOptions {
        follow_links: false,
        sort_entries: true,
        skip_errors: false,
    };

    let mut zip = ZipWriter::new(temp.as_file());
    let mut file_count = 0usize;
    let mut zip_error: Option<ZipError> = None;

    walk_files_with_callback(root, &walk_options, |file| {
        let entry_options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(file.size >= u32::MAX as u64);

        if let Err(e) = zip.start_file(entry_name(&file.relative_path), entry_options) {
            zip_error = Some(e);
            return Err(io::Error::new(io::ErrorKind::Other, "zip entry failed"));
        }

        let mut source = std::fs::File::open(&file.path)?;
        io::copy(&mut source, &mut zip)?;
        file_count += 1;
        Ok(())
    })
    .map_err(|e| match zip_error.take() {
        Some(zip_err) => BackupCreationError::Archive(zip_err),
        None => BackupCreationError::Io(e),
    })?;

    zip.finish()?;

    let bytes = std::fs::read(temp.path())?;
    temp.close()?;

    tracing::debug!(root = %root.display(), file_count, size = bytes.len(), "Archive built");

    Ok(ArchivePayload { bytes, file_count })
}

/// Zip entry names always use `/` regardless of platform.
fn entry_name(relative_path: &Path) -> String {
    relative_path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
