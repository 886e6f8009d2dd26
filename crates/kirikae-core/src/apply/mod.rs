//! # Apply & Undo
//!
//! Executes a [`RenamePlan`](crate::types::RenamePlan) against the
//! filesystem. Apply is transactional: the first failure stops it and every
//! move made so far is reversed, newest first. Undo replays a persisted plan
//! backwards and stops at the first precondition it cannot meet.

pub mod transaction;
pub mod undo;

pub use transaction::{ROLLED_BACK_REASON, apply_plan};
pub use undo::{RESTORED_REASON, UndoReport, undo_plan};

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// An item that stopped an apply run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyFailure {
    /// Where the file was.
    pub source: PathBuf,
    /// Where it was going.
    pub destination: PathBuf,
    /// What went wrong.
    pub reason: String,
}

/// Outcome of one [`apply_plan`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyResult {
    /// `true` when no item failed.
    pub success: bool,
    /// Items left in `Moved`.
    pub moved: usize,
    /// Items skipped because the destination was already in place.
    pub skipped: usize,
    /// Items marked `Failed`.
    pub failed: usize,
    /// Moves reversed during rollback.
    pub rolled_back: usize,
    /// The failing items.
    pub failures: Vec<ApplyFailure>,
    /// Wall-clock time spent.
    pub duration: Duration,
}
