//! Mirroring engine.
//!
//! Plans and applies reconciliation passes: computes the minimal
//! copy/overwrite/delete/prune set from one snapshot pair of the two trees,
//! then applies it to the replica with per-item failure tolerance.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use super::error::SyncError;
use super::hash;
use super::walk;
use crate::events::{EventSink, SyncEvent};

/// A single reconciliation action, identified by relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// File exists only in the source: copy it into the replica.
    Copy { path: String },
    /// File exists in both trees but content differs: replace the replica copy.
    Overwrite { path: String },
    /// File exists only in the replica: remove it.
    Delete { path: String },
    /// Replica directory to remove if it is empty once the file actions ran.
    PruneDir { path: String },
}

impl SyncAction {
    /// Get the relative path this action targets.
    pub fn path(&self) -> &str {
        match self {
            Self::Copy { path } => path,
            Self::Overwrite { path } => path,
            Self::Delete { path } => path,
            Self::PruneDir { path } => path,
        }
    }

    fn order(&self) -> u8 {
        match self {
            Self::Copy { .. } => 0,
            Self::Overwrite { .. } => 1,
            Self::Delete { .. } => 2,
            Self::PruneDir { .. } => 3,
        }
    }
}

/// The full action set computed from one snapshot pair.
///
/// File actions carry no ordering dependency between each other. `PruneDir`
/// actions always come last and deepest-first, and are re-validated against
/// the live filesystem when applied, because earlier deletions in the same
/// pass change directory emptiness.
#[derive(Debug, Default)]
pub struct SyncPass {
    pub actions: Vec<SyncAction>,
}

impl SyncPass {
    /// True when the replica already matches the source.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// A single action that failed during apply.
#[derive(Debug, Clone)]
pub struct ItemFailure {
    pub path: String,
    pub message: String,
}

/// Outcome of one applied pass.
#[derive(Debug, Clone, Default)]
pub struct PassResult {
    pub copied: usize,
    pub overwritten: usize,
    pub deleted: usize,
    pub pruned: usize,
    pub errors: Vec<ItemFailure>,
}

/// One-way mirroring engine: makes the replica tree identical to the source.
#[derive(Clone)]
pub struct SyncEngine {
    source_root: PathBuf,
    replica_root: PathBuf,
    sink: Arc<dyn EventSink>,
}

impl SyncEngine {
    /// Create an engine for the given tree roots.
    pub fn new(
        source_root: impl Into<PathBuf>,
        replica_root: impl Into<PathBuf>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            replica_root: replica_root.into(),
            sink,
        }
    }

    /// Compute the action set for one pass without touching the replica.
    ///
    /// Fails with [`SyncError::SourceMissing`] when the source root is
    /// absent. An absent replica root behaves like an empty replica: every
    /// source file degrades to `Copy` and directories appear implicitly
    /// through parent creation during apply.
    pub fn plan(&self) -> Result<SyncPass, SyncError> {
        if !self.source_root.is_dir() {
            return Err(SyncError::SourceMissing {
                path: self.source_root.clone(),
            });
        }

        let source = walk::snapshot(&self.source_root)?;
        let replica = if self.replica_root.is_dir() {
            walk::snapshot(&self.replica_root)?
        } else {
            walk::TreeSnapshot::default()
        };

        // Equality checks only read file content and touch distinct relative
        // paths, so they run in parallel.
        let mut actions: Vec<SyncAction> = source
            .files
            .par_iter()
            .filter_map(|(rel, entry)| match replica.files.get(rel) {
                None => Some(SyncAction::Copy { path: rel.clone() }),
                Some(existing) => {
                    match hash::files_equal(&entry.absolute, &existing.absolute) {
                        Ok(true) => None,
                        Ok(false) => Some(SyncAction::Overwrite { path: rel.clone() }),
                        Err(e) => {
                            // A file that cannot be read cannot be proven
                            // equal; replace it rather than skip it.
                            debug!("comparison failed for {}: {}", rel, e);
                            Some(SyncAction::Overwrite { path: rel.clone() })
                        }
                    }
                }
            })
            .collect();

        actions.extend(
            replica
                .files
                .keys()
                .filter(|rel| !source.files.contains_key(*rel))
                .map(|rel| SyncAction::Delete { path: rel.clone() }),
        );

        // Sort by action class then path so the pass never depends on
        // filesystem traversal order.
        actions.sort_by(|a, b| (a.order(), a.path()).cmp(&(b.order(), b.path())));

        // A child path always sorts after its parent, so reverse order
        // visits the deepest directories first and lets a pruned child make
        // its parent prunable.
        let mut prune_dirs = replica.dirs;
        prune_dirs.sort_by(|a, b| b.cmp(a));
        actions.extend(
            prune_dirs
                .into_iter()
                .map(|path| SyncAction::PruneDir { path }),
        );

        Ok(SyncPass { actions })
    }

    /// Apply a computed pass to the filesystem.
    ///
    /// Every action is attempted independently: a failure is recorded in the
    /// result, reported through the sink, and the pass moves on. One locked
    /// file never aborts synchronization of the rest of the tree.
    pub fn apply(&self, pass: &SyncPass) -> PassResult {
        let mut result = PassResult::default();

        for action in &pass.actions {
            match self.apply_action(action) {
                Ok(true) => {
                    let path = action.path().to_string();
                    match action {
                        SyncAction::Copy { .. } => {
                            result.copied += 1;
                            self.sink.emit(SyncEvent::Copied { path });
                        }
                        SyncAction::Overwrite { .. } => {
                            result.overwritten += 1;
                            self.sink.emit(SyncEvent::Overwritten { path });
                        }
                        SyncAction::Delete { .. } => {
                            result.deleted += 1;
                            self.sink.emit(SyncEvent::Deleted { path });
                        }
                        SyncAction::PruneDir { .. } => {
                            result.pruned += 1;
                            self.sink.emit(SyncEvent::DirectoryPruned { path });
                        }
                    }
                }
                Ok(false) => {} // prune candidate still holds content
                Err(e) => {
                    let failure = ItemFailure {
                        path: action.path().to_string(),
                        message: e.to_string(),
                    };
                    self.sink.emit(SyncEvent::ItemError {
                        path: failure.path.clone(),
                        cause: failure.message.clone(),
                    });
                    result.errors.push(failure);
                }
            }
        }

        result
    }

    /// Apply one action. Returns `Ok(false)` when a prune candidate turned
    /// out to be non-empty and was kept.
    fn apply_action(&self, action: &SyncAction) -> Result<bool, SyncError> {
        match action {
            SyncAction::Copy { path } | SyncAction::Overwrite { path } => {
                let from = self.source_root.join(path);
                let to = self.replica_root.join(path);
                if let Some(parent) = to.parent() {
                    fs::create_dir_all(parent).map_err(|e| {
                        SyncError::from_io(e, "creating directory", Some(parent.to_path_buf()))
                    })?;
                }
                fs::copy(&from, &to).map_err(|e| SyncError::from_io(e, "copying", Some(to)))?;
                Ok(true)
            }
            SyncAction::Delete { path } => {
                let target = self.replica_root.join(path);
                fs::remove_file(&target)
                    .map_err(|e| SyncError::from_io(e, "deleting", Some(target)))?;
                Ok(true)
            }
            SyncAction::PruneDir { path } => {
                let dir = self.replica_root.join(path);
                // Emptiness is checked live, not from the pass snapshot:
                // deletions and child prunes earlier in this pass change it.
                if !dir_is_empty(&dir)? {
                    return Ok(false);
                }
                fs::remove_dir(&dir)
                    .map_err(|e| SyncError::from_io(e, "removing directory", Some(dir)))?;
                Ok(true)
            }
        }
    }

    /// Run one full pass: plan, then apply.
    ///
    /// Never fails. A missing source skips the pass entirely (no deletions
    /// run against the replica), and any other planning failure is reported
    /// and leaves the replica untouched.
    pub fn run_pass(&self) -> PassResult {
        self.sink.emit(SyncEvent::PassStarted);
        match self.plan() {
            Ok(pass) => self.apply(&pass),
            Err(SyncError::SourceMissing { path }) => {
                self.sink.emit(SyncEvent::SourceMissing {
                    path: path.display().to_string(),
                });
                PassResult::default()
            }
            Err(e) => {
                warn!("pass skipped, planning failed: {}", e);
                PassResult::default()
            }
        }
    }
}

fn dir_is_empty(path: &Path) -> Result<bool, SyncError> {
    let mut entries = fs::read_dir(path)
        .map_err(|e| SyncError::from_io(e, "reading directory", Some(path.to_path_buf())))?;
    Ok(entries.next().is_none())
}
