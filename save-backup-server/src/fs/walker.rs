//! Directory traversal shared by the checksum engine and the archive builder.
//!
//! Only regular files are reported. Symlinks are resolved to their target;
//! links to directories and broken links are skipped.

use std::cmp::Ordering;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Options for directory walking
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Follow symbolic links into directories
    pub follow_links: bool,

    /// Order siblings by file name. Otherwise they keep the order the
    /// filesystem returns them in. Either way a directory's files are
    /// visited before its subdirectories are descended into.
    pub sort_entries: bool,

    /// Log and skip entries that cannot be read instead of aborting
    pub skip_errors: bool,
}

/// A regular file discovered during walking
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Full path to the file
    pub path: PathBuf,

    /// Path relative to the walk root
    pub relative_path: PathBuf,

    /// File size in bytes
    pub size: u64,
}

impl FileInfo {
    /// Returns None for directories, symlinks to directories and broken symlinks.
    fn from_entry(entry: &DirEntry, root: &Path) -> io::Result<Option<Self>> {
        if entry.file_type().is_dir() {
            return Ok(None);
        }

        let path = entry.path().to_path_buf();
        let metadata = if entry.path_is_symlink() {
            match std::fs::metadata(&path) {
                Ok(resolved) if resolved.is_file() => resolved,
                _ => return Ok(None),
            }
        } else {
            entry.metadata()?
        };

        if !metadata.is_file() {
            return Ok(None);
        }

        let mut relative_path = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        if relative_path.as_os_str().is_empty() {
            // Root itself is a file
            relative_path = path
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| path.clone());
        }

        Ok(Some(Self {
            path,
            relative_path,
            size: metadata.len(),
        }))
    }
}

fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type().is_dir().cmp(&b.file_type().is_dir())
}

/// Walk a directory tree and collect every regular file.
pub fn walk_files(root: &Path, options: &WalkOptions) -> io::Result<Vec<FileInfo>> {
    let mut files = Vec::new();
    walk_files_with_callback(root, options, |file| {
        files.push(file.clone());
        Ok(())
    })?;
    Ok(files)
}

/// Walk a directory tree, calling `callback` for each regular file.
///
/// An error returned by the callback stops the walk and is returned as is,
/// regardless of `skip_errors`.
pub fn walk_files_with_callback<F>(root: &Path, options: &WalkOptions, mut callback: F) -> io::Result<()>
where
    F: FnMut(&FileInfo) -> io::Result<()>,
{
    let walker = WalkDir::new(root).follow_links(options.follow_links);
    // Stable sorts, so unsorted walks keep readdir order within each group
    let walker = if options.sort_entries {
        walker.sort_by(|a, b| {
            files_first(a, b).then_with(|| a.file_name().cmp(b.file_name()))
        })
    } else {
        walker.sort_by(files_first)
    };

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if options.skip_errors => {
                tracing::debug!(root = %root.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let file_info = match FileInfo::from_entry(&entry, root) {
            Ok(Some(info)) => info,
            Ok(None) => continue,
            Err(e) if options.skip_errors => {
                tracing::debug!(path = %entry.path().display(), error = %e, "Skipping entry without metadata");
                continue;
            }
            Err(e) => return Err(e),
        };

        callback(&file_info)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_walk_empty_directory() -> io::Result<()> {
        let temp_dir = TempDir::new()?;
        let files = walk_files(temp_dir.path(), &WalkOptions::default())?;
        assert!(files.is_empty());
        Ok(())
    }

    #[test]
    fn test_walk_with_subdirectories() -> io::Result<()> {
        let temp_dir = TempDir::new()?;

        fs::create_dir_all(temp_dir.path().join("slot1/auto"))?;
        fs::write(temp_dir.path().join("profile.dat"), b"profile")?;
        fs::write(temp_dir.path().join("slot1/auto/save.sav"), b"save")?;

        let mut relative: Vec<_> = walk_files(temp_dir.path(), &WalkOptions::default())?
            .into_iter()
            .map(|f| f.relative_path)
            .collect();
        relative.sort();

        assert_eq!(
            relative,
            vec![PathBuf::from("profile.dat"), PathBuf::from("slot1/auto/save.sav")]
        );
        Ok(())
    }

    #[test]
    fn test_sorted_walk_orders_siblings_by_name() -> io::Result<()> {
        let temp_dir = TempDir::new()?;

        for name in ["c.sav", "a.sav", "b.sav"] {
            fs::write(temp_dir.path().join(name), name)?;
        }

        let options = WalkOptions {
            sort_entries: true,
            ..Default::default()
        };
        let names: Vec<_> = walk_files(temp_dir.path(), &options)?
            .into_iter()
            .map(|f| f.relative_path.to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.sav", "b.sav", "c.sav"]);
        Ok(())
    }

    #[test]
    fn test_files_visited_before_subdirectories() -> io::Result<()> {
        let temp_dir = TempDir::new()?;
        for dir in ["a", "m", "z"] {
            fs::create_dir(temp_dir.path().join(dir))?;
            fs::write(temp_dir.path().join(dir).join("x"), b"x")?;
        }
        for file in ["b", "n", "y"] {
            fs::write(temp_dir.path().join(file), file)?;
        }

        let files = walk_files(temp_dir.path(), &WalkOptions::default())?;
        let top_level: Vec<bool> = files
            .iter()
            .map(|f| f.relative_path.components().count() == 1)
            .collect();

        assert_eq!(top_level, vec![true, true, true, false, false, false]);
        Ok(())
    }

    #[test]
    fn test_missing_root() -> io::Result<()> {
        let temp_dir = TempDir::new()?;
        let missing = temp_dir.path().join("nope");

        assert!(walk_files(&missing, &WalkOptions::default()).is_err());

        let lenient = WalkOptions {
            skip_errors: true,
            ..Default::default()
        };
        assert!(walk_files(&missing, &lenient)?.is_empty());
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_symlinks_resolved_or_skipped() -> io::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        fs::write(root.join("real.sav"), b"12345")?;
        fs::create_dir(root.join("dir"))?;
        std::os::unix::fs::symlink(root.join("real.sav"), root.join("link.sav"))?;
        std::os::unix::fs::symlink(root.join("dir"), root.join("dirlink"))?;
        std::os::unix::fs::symlink(root.join("gone"), root.join("broken"))?;

        let mut files = walk_files(root, &WalkOptions::default())?;
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].relative_path, PathBuf::from("link.sav"));
        assert_eq!(files[0].size, 5);
        assert_eq!(files[1].relative_path, PathBuf::from("real.sav"));
        Ok(())
    }

    #[test]
    fn test_callback_error_stops_walk() -> io::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("a"), b"a")?;
        fs::write(temp_dir.path().join("b"), b"b")?;

        let options = WalkOptions {
            skip_errors: true,
            ..Default::default()
        };
        let mut seen = 0;
        let result = walk_files_with_callback(temp_dir.path(), &options, |_| {
            seen += 1;
            Err(io::Error::new(io::ErrorKind::Other, "stop"))
        });

        assert!(result.is_err());
        assert_eq!(seen, 1);
        Ok(())
    }
}
