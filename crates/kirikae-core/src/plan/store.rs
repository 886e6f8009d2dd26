use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{KirikaeError, Result};
use crate::types::RenamePlan;

/// File name a plan is saved under: `plan_<id>.json`.
#[must_use]
pub fn plan_file_name(plan: &RenamePlan) -> String {
    format!("plan_{}.json", plan.id)
}

/// Writes `plan` as pretty-printed JSON into `dir`, creating it if needed.
///
/// # Errors
///
/// I/O and serialization failures.
pub fn save_plan(plan: &RenamePlan, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| KirikaeError::io(dir, e))?;
    let path = dir.join(plan_file_name(plan));
    write_plan(plan, &path)?;
    Ok(path)
}

/// Writes `plan` as pretty-printed JSON to exactly `path`, replacing any
/// previous contents.
///
/// # Errors
///
/// I/O and serialization failures.
pub fn write_plan(plan: &RenamePlan, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(plan)?;
    fs::write(path, json).map_err(|e| KirikaeError::io(path, e))?;
    debug!(plan = %plan.id, path = %path.display(), "plan saved");
    Ok(())
}

/// Reads and validates a plan written by [`save_plan`].
///
/// # Errors
///
/// I/O and parse failures, and `KirikaeError::InvalidPlan` when a path in
/// the plan is relative or a manual item lacks its reason.
pub fn load_plan(path: &Path) -> Result<RenamePlan> {
    let raw = fs::read_to_string(path).map_err(|e| KirikaeError::io(path, e))?;
    let plan: RenamePlan = serde_json::from_str(&raw)?;
    plan.validate()?;
    Ok(plan)
}
