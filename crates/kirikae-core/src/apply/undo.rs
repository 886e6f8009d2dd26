use serde::Serialize;
use tracing::{debug, info};

use crate::error::{KirikaeError, Result};
use crate::fs::{MoveOptions, atomic_move, sha256sum};
use crate::types::{PlanStatus, RenamePlan};

/// Reason set on items undo moved back.
pub const RESTORED_REASON: &str = "Restored to original location.";

/// Outcome of a completed [`undo_plan`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UndoReport {
    /// Files moved back with matching content.
    pub restored: usize,
    /// Files moved back whose content no longer matches the recorded hash.
    pub failed: usize,
}

/// Moves every `Moved` (or never-applied `Pending`) item of `plan` back from
/// its destination to its source, in plan order.
///
/// Undo is not transactional: items restored before an error stay restored
/// and the rest are untouched.
///
/// # Errors
///
/// - `KirikaeError::UndoSourceExists` when something already sits at an
///   item's source.
/// - `KirikaeError::UndoDestinationMissing` when an item's destination is
///   gone.
/// - Any error from the move itself.
pub fn undo_plan(plan: &mut RenamePlan) -> Result<UndoReport> {
    let mut report = UndoReport::default();

    for item in plan
        .items
        .iter_mut()
        .filter(|item| matches!(item.status, PlanStatus::Moved | PlanStatus::Pending))
    {
        if item.source.exists() {
            return Err(KirikaeError::UndoSourceExists(item.source.clone()));
        }
        if !item.destination.exists() {
            return Err(KirikaeError::UndoDestinationMissing(item.destination.clone()));
        }

        atomic_move(&item.destination, &item.source, MoveOptions::new())?;
        debug!(source = %item.source.display(), "restored");

        if let Some(expected) = item.media_file.hash.as_deref() {
            let actual = sha256sum(&item.source)?;
            if !actual.eq_ignore_ascii_case(expected) {
                let err = KirikaeError::HashMismatch {
                    path: item.source.clone(),
                    expected: expected.to_string(),
                    actual,
                };
                item.mark(PlanStatus::Failed, err.to_string());
                report.failed += 1;
                continue;
            }
        }
        item.mark(PlanStatus::Moved, RESTORED_REASON);
        report.restored += 1;
    }

    info!(
        plan = %plan.id,
        restored = report.restored,
        failed = report.failed,
        "undo finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MediaFile, MediaType, PlanItem};
    use std::fs;

    fn moved_item(root: &std::path::Path, name: &str, content: &[u8]) -> PlanItem {
        let source = root.join("in").join(name);
        let destination = root.join("out").join(name);
        fs::create_dir_all(destination.parent().unwrap()).unwrap();
        fs::write(&destination, content).unwrap();
        let mut item = PlanItem::pending(MediaFile::new(&source, MediaType::Tv), destination);
        item.status = PlanStatus::Moved;
        item
    }

    #[test]
    fn restores_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut plan = RenamePlan::new(dir.path(), "plex");
        plan.push(moved_item(dir.path(), "a.mkv", b"a"));
        plan.push(moved_item(dir.path(), "b.mkv", b"b"));

        let report = undo_plan(&mut plan).unwrap();
        assert_eq!(report.restored, 2);
        assert!(plan.items.iter().all(|i| i.source.exists() && !i.destination.exists()));
        assert_eq!(plan.items[0].reason.as_deref(), Some(RESTORED_REASON));
    }

    #[test]
    fn missing_destination_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let mut plan = RenamePlan::new(dir.path(), "plex");
        let item = moved_item(dir.path(), "a.mkv", b"a");
        fs::remove_file(&item.destination).unwrap();
        plan.push(item);

        assert!(matches!(
            undo_plan(&mut plan),
            Err(KirikaeError::UndoDestinationMissing(_))
        ));
    }

    #[test]
    fn hash_mismatch_marks_failed() {
        let dir = tempfile::tempdir().unwrap();
        let mut plan = RenamePlan::new(dir.path(), "plex");
        let mut item = moved_item(dir.path(), "a.mkv", b"changed");
        item.media_file.hash = Some("0".repeat(64));
        plan.push(item);

        let report = undo_plan(&mut plan).unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(plan.items[0].status, PlanStatus::Failed);
        assert!(plan.items[0].source.exists());
    }
}
