//! Mirroring module.
//!
//! One-way periodic mirroring: content hashing, tree snapshots, pass
//! planning and execution, and the interval scheduler.

pub mod engine;
pub mod error;
pub mod hash;
pub mod scheduler;
pub mod walk;

pub use engine::{ItemFailure, PassResult, SyncAction, SyncEngine, SyncPass};
pub use error::SyncError;
pub use hash::{files_equal, hash_file};
pub use scheduler::{SchedulerState, StopHandle, SyncScheduler};
pub use walk::{FileEntry, TreeSnapshot};
