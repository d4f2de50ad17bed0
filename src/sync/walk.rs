//! Directory tree snapshots.
//!
//! Walks a root once and returns every regular file keyed by its relative
//! path, plus every directory below the root. Traversal order is never part
//! of the result: callers get unordered sets keyed by relative path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use tracing::warn;

use super::error::SyncError;

/// A regular file found during a tree walk.
///
/// Identity is the relative path. Entries are recomputed on every pass and
/// never persisted.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Path relative to the walked root, `/`-separated.
    pub relative: String,
    /// Absolute (root-joined) path for I/O.
    pub absolute: PathBuf,
}

/// Everything one pass needs to know about a tree.
#[derive(Debug, Default)]
pub struct TreeSnapshot {
    /// Regular files, keyed by relative path.
    pub files: HashMap<String, FileEntry>,
    /// Relative paths of all directories below the root.
    pub dirs: Vec<String>,
}

/// Convert a path under `root` into a `/`-separated relative path.
fn relative_path(path: &Path, root: &Path) -> Option<String> {
    let stripped = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = stripped
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None; // the root itself
    }
    Some(parts.join("/"))
}

/// Snapshot all regular files and directories under `root`.
///
/// Unreadable entries are logged and skipped so one bad subtree never blocks
/// a pass. Symlinks are not followed.
pub fn snapshot(root: &Path) -> Result<TreeSnapshot, SyncError> {
    let mut tree = TreeSnapshot::default();

    for entry_result in WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(false)
    {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                warn!("error walking {}: {}", root.display(), e);
                continue;
            }
        };

        let path = entry.path();
        let Some(relative) = relative_path(&path, root) else {
            continue;
        };

        if entry.file_type().is_file() {
            tree.files.insert(
                relative.clone(),
                FileEntry {
                    relative,
                    absolute: path,
                },
            );
        } else if entry.file_type().is_dir() {
            tree.dirs.push(relative);
        }
        // Symlinks and other special files are skipped.
    }

    Ok(tree)
}
