use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::{ApplyFailure, ApplyResult};
use crate::config::ApplyOptions;
use crate::error::{KirikaeError, Result};
use crate::fs::{MoveOptions, MoveOutcome, atomic_move, files_identical, long_path, sha256sum};
use crate::types::{PlanItem, PlanStatus, RenamePlan};

/// Reason set on items whose move was reversed after a later failure.
pub const ROLLED_BACK_REASON: &str = "Rolled back after a later move failed.";

const SKIPPED_REASON: &str = "Destination already holds identical content.";

/// A completed move that rollback may need to reverse.
#[derive(Debug)]
struct RollbackEntry {
    index: usize,
    source: PathBuf,
    destination: PathBuf,
    /// The destination existed before the move; restore by copying so it stays.
    restore_by_copy: bool,
}

/// Moves every `Pending` item of `plan`, in order.
///
/// Items in any other status are left alone. The first failure marks its
/// item `Failed`, stops the run and reverses every move made so far in
/// reverse order. Rollback is best-effort: a move that cannot be reversed is
/// logged and the rest are still attempted.
pub fn apply_plan(plan: &mut RenamePlan, options: &ApplyOptions) -> ApplyResult {
    let started = Instant::now();
    let mut result = ApplyResult::default();
    let mut stack: Vec<RollbackEntry> = Vec::new();

    for index in 0..plan.items.len() {
        let item = &mut plan.items[index];
        if item.status != PlanStatus::Pending {
            continue;
        }

        if options.skip_identical && already_in_place(item) {
            debug!(destination = %item.destination.display(), "skipping identical destination");
            item.mark(PlanStatus::Skipped, SKIPPED_REASON);
            result.skipped += 1;
            continue;
        }

        let outcome = match atomic_move(&item.source, &item.destination, MoveOptions::new()) {
            Ok(outcome) => outcome,
            Err(err) => {
                record_failure(&mut result, item, &err);
                break;
            }
        };
        stack.push(RollbackEntry {
            index,
            source: item.source.clone(),
            destination: item.destination.clone(),
            restore_by_copy: outcome == MoveOutcome::AlreadyIdentical,
        });

        if options.verify_hash {
            if let Err(err) = verify(item) {
                record_failure(&mut result, item, &err);
                break;
            }
        }

        debug!(
            source = %item.source.display(),
            destination = %item.destination.display(),
            ?outcome,
            "moved"
        );
        item.status = PlanStatus::Moved;
        item.reason = None;
        result.moved += 1;
    }

    if result.failed > 0 {
        rollback(&mut plan.items, stack, &mut result);
    }

    result.success = result.failed == 0;
    result.duration = started.elapsed();
    info!(
        plan = %plan.id,
        success = result.success,
        moved = result.moved,
        skipped = result.skipped,
        failed = result.failed,
        rolled_back = result.rolled_back,
        elapsed_ms = result.duration.as_millis() as u64,
        "apply finished"
    );
    result
}

/// Whether the destination already holds the file's content: by recorded
/// hash when there is one, else by comparing against the source.
fn already_in_place(item: &PlanItem) -> bool {
    if !item.destination.exists() {
        return false;
    }
    let same = match item.media_file.hash.as_deref() {
        Some(expected) => sha256sum(&item.destination).map(|actual| actual.eq_ignore_ascii_case(expected)),
        None => files_identical(&item.source, &item.destination),
    };
    same.unwrap_or(false)
}

fn verify(item: &PlanItem) -> Result<()> {
    let Some(expected) = item.media_file.hash.as_deref() else {
        return Ok(());
    };
    let actual = sha256sum(&item.destination)?;
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(KirikaeError::HashMismatch {
            path: item.destination.clone(),
            expected: expected.to_string(),
            actual,
        })
    }
}

fn record_failure(result: &mut ApplyResult, item: &mut PlanItem, err: &KirikaeError) {
    warn!(source = %item.source.display(), error = %err, "move failed; rolling back");
    item.mark(PlanStatus::Failed, err.to_string());
    result.failed += 1;
    result.failures.push(ApplyFailure {
        source: item.source.clone(),
        destination: item.destination.clone(),
        reason: err.to_string(),
    });
}

fn rollback(items: &mut [PlanItem], stack: Vec<RollbackEntry>, result: &mut ApplyResult) {
    for entry in stack.into_iter().rev() {
        let restored = if entry.restore_by_copy {
            fs::copy(long_path(&entry.destination), long_path(&entry.source))
                .map(|_| ())
                .map_err(|e| KirikaeError::io(&entry.source, e))
        } else {
            atomic_move(&entry.destination, &entry.source, MoveOptions::new()).map(|_| ())
        };

        match restored {
            Ok(()) => {
                debug!(source = %entry.source.display(), "rolled back");
                result.rolled_back += 1;
                let item = &mut items[entry.index];
                if item.status == PlanStatus::Moved {
                    item.mark(PlanStatus::Pending, ROLLED_BACK_REASON);
                    result.moved -= 1;
                }
            }
            Err(err) => warn!(
                source = %entry.source.display(),
                destination = %entry.destination.display(),
                error = %err,
                "rollback failed"
            ),
        }
    }
}
