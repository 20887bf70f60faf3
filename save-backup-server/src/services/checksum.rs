//! Directory checksums.
//!
//! The digest is SHA-256 over the contents of every regular file under the
//! root, concatenated in traversal order. File paths are not hashed, so two
//! trees with the same bytes in the same visiting order share a digest.
//!
//! Traversal order is the filesystem's own unless `sort_entries` is set.
//! Digests taken without sorting are therefore not portable across
//! filesystems; sorting is opt-in because it changes existing digests.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::fs::walker::{walk_files_with_callback, WalkOptions};

/// Read size used when feeding files into the hasher
const CHUNK_SIZE: usize = 4096;

/// Hex-encoded SHA-256 of a directory tree (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Digest of zero bytes; what an empty or missing directory hashes to.
    pub fn empty() -> Self {
        Self(hex::encode(Sha256::new().finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ChecksumOptions {
    /// Files that cannot be opened or read are left out of the digest
    /// without being reported.
    pub skip_unreadable: bool,

    /// Hash siblings in file-name order.
    pub sort_entries: bool,
}

impl Default for ChecksumOptions {
    fn default() -> Self {
        Self {
            skip_unreadable: true,
            sort_entries: false,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ChecksumError {
    #[error("failed to read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk directory: {0}")]
    Walk(#[from] io::Error),
}

/// Hash every regular file under `root`.
///
/// A missing root or a root with no files yields [`Digest::empty`]. With
/// `skip_unreadable` set this never fails.
pub fn compute_checksum(root: &Path, options: &ChecksumOptions) -> Result<Digest, ChecksumError> {
    compute_checksum_with(root, options, |path| File::open(path))
}

/// Same as [`compute_checksum`], opening each file through `open`.
fn compute_checksum_with<R, F>(root: &Path, options: &ChecksumOptions, mut open: F) -> Result<Digest, ChecksumError>
where
    R: Read,
    F: FnMut(&Path) -> io::Result<R>,
{
    if !root.exists() {
        return Ok(Digest::empty());
    }

    let mut hasher = Sha256::new();

    let walk_options = WalkOptions {
        follow_links: false,
        sort_entries: options.sort_entries,
        skip_errors: options.skip_unreadable,
    };

    let mut unreadable: Option<ChecksumError> = None;
    walk_files_with_callback(root, &walk_options, |file| {
        // A file that fails halfway has already fed part of its bytes; those
        // bytes stay in the digest.
        if let Err(e) = open(&file.path).and_then(|reader| hash_reader(reader, &mut hasher)) {
            if options.skip_unreadable {
                tracing::debug!(path = %file.path.display(), error = %e, "Skipping unreadable file");
            } else {
                unreadable = Some(ChecksumError::Unreadable {
                    path: file.path.display().to_string(),
                    source: e,
                });
                return Err(io::Error::new(io::ErrorKind::Other, "unreadable file"));
            }
        }
        Ok(())
    })
    .map_err(|e| unreadable.take().unwrap_or(ChecksumError::Walk(e)))?;

    Ok(Digest(hex::encode(hasher.finalize())))
}

fn hash_reader<R: Read>(mut reader: R, hasher: &mut Sha256) -> io::Result<()> {
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(())
}
