use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::types::{PlanItem, PlanStatus, RenamePlan};

/// Reason recorded on both items of a colliding pair.
pub const CONFLICT_REASON: &str = "Destination conflict detected.";

/// Comparison key for `destination`: relative to `root_dir` when it lies
/// underneath, `/`-separated and case-folded.
#[must_use]
pub fn destination_key(root_dir: &Path, destination: &Path) -> String {
    let relative = destination.strip_prefix(root_dir).unwrap_or(destination);
    fold(relative)
}

fn fold(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

/// Incremental destination index used while a plan is being built.
#[derive(Debug, Clone)]
pub struct DestinationIndex {
    root_dir: PathBuf,
    seen: HashMap<String, usize>,
}

impl DestinationIndex {
    /// An empty index for a plan rooted at `root_dir`.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            seen: HashMap::new(),
        }
    }

    /// Registers `items[index]`. When its destination is already taken, both
    /// items become `Conflict` and `true` is returned.
    ///
    /// `Failed` items are not registered.
    pub fn register(&mut self, items: &mut [PlanItem], index: usize) -> bool {
        let Some(item) = items.get(index) else {
            return false;
        };
        if item.status == PlanStatus::Failed {
            return false;
        }

        let key = destination_key(&self.root_dir, &item.destination);
        match self.seen.get(&key) {
            Some(&other) if other != index => {
                warn!(destination = %key, "destination conflict");
                mark_conflict(&mut items[other]);
                mark_conflict(&mut items[index]);
                true
            }
            Some(_) => false,
            None => {
                self.seen.insert(key, index);
                false
            }
        }
    }
}

/// Re-checks the whole plan, comparing every non-`Failed` item under both
/// its root-relative and its absolute key. Returns the number of items
/// newly marked `Conflict`.
pub fn sweep_conflicts(plan: &mut RenamePlan) -> usize {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut colliding: Vec<usize> = Vec::new();

    for (idx, item) in plan.items.iter().enumerate() {
        if item.status == PlanStatus::Failed {
            continue;
        }
        let keys = [
            destination_key(&plan.root_dir, &item.destination),
            fold(&item.destination),
        ];
        for key in keys {
            match seen.get(&key) {
                Some(&other) if other != idx => {
                    colliding.push(other);
                    colliding.push(idx);
                }
                Some(_) => {}
                None => {
                    seen.insert(key, idx);
                }
            }
        }
    }

    let mut marked = 0;
    for idx in colliding {
        let item = &mut plan.items[idx];
        if item.status != PlanStatus::Conflict {
            marked += 1;
        }
        mark_conflict(item);
    }
    marked
}

fn mark_conflict(item: &mut PlanItem) {
    item.mark(PlanStatus::Conflict, CONFLICT_REASON);
}
