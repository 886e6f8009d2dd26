use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::media::{MediaFile, MediaType};
use super::resolution::ManualReason;
use crate::error::{KirikaeError, Result};

/// Lifecycle state of a single rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Ready to be moved.
    Pending,
    /// Needs a human decision before it can be moved.
    Manual,
    /// Shares a destination with another item.
    Conflict,
    /// Planning or moving failed.
    Failed,
    /// Moved successfully.
    Moved,
    /// Left alone because the destination already holds identical content.
    Skipped,
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Manual => "manual",
            Self::Conflict => "conflict",
            Self::Failed => "failed",
            Self::Moved => "moved",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// One planned move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    /// Current location.
    pub source: PathBuf,
    /// Target location.
    pub destination: PathBuf,
    /// Snapshot of the file this item moves.
    pub media_file: MediaFile,
    /// Current state.
    pub status: PlanStatus,
    /// Human-readable explanation for the current state.
    #[serde(default)]
    pub reason: Option<String>,
    /// Whether a human must review this item.
    #[serde(default)]
    pub manual: bool,
    /// Why review is needed; always set when `status` is `Manual`.
    #[serde(default)]
    pub manual_reason: Option<String>,
    /// Episode span, e.g. `"05-E06"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<String>,
    /// Episode title, joined for spans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_title: Option<String>,
}

impl PlanItem {
    /// A move that is ready to run.
    #[must_use]
    pub fn pending(media_file: MediaFile, destination: PathBuf) -> Self {
        Self::with_status(media_file, destination, PlanStatus::Pending)
    }

    /// A move that needs review. The reason is mandatory.
    #[must_use]
    pub fn manual(media_file: MediaFile, destination: PathBuf, reason: &ManualReason) -> Self {
        let mut item = Self::with_status(media_file, destination, PlanStatus::Manual);
        item.manual = true;
        item.manual_reason = Some(reason.to_string());
        item
    }

    /// An item that cannot be planned. The file stays where it is.
    #[must_use]
    pub fn failed(media_file: MediaFile, reason: impl Into<String>) -> Self {
        let destination = media_file.path.clone();
        let mut item = Self::with_status(media_file, destination, PlanStatus::Failed);
        item.reason = Some(reason.into());
        item
    }

    fn with_status(media_file: MediaFile, destination: PathBuf, status: PlanStatus) -> Self {
        let (episode, episode_title) = match media_file.resolution.assignment() {
            Some(assignment) => (
                Some(assignment.span.to_string()),
                Some(assignment.joined_title()),
            ),
            None => (None, media_file.episode_title.clone()),
        };
        Self {
            source: media_file.path.clone(),
            destination,
            media_file,
            status,
            reason: None,
            manual: false,
            manual_reason: None,
            episode,
            episode_title,
        }
    }

    /// Moves the item to `status` with an explanation.
    pub fn mark(&mut self, status: PlanStatus, reason: impl Into<String>) {
        self.status = status;
        self.reason = Some(reason.into());
    }
}

/// An ordered list of moves under one library root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenamePlan {
    /// Unique plan identifier.
    pub id: Uuid,
    /// When the plan was built.
    pub created_at: DateTime<Utc>,
    /// Library root the plan was built for.
    pub root_dir: PathBuf,
    /// Target platform name, e.g. `"plex"`.
    pub platform: String,
    /// Moves in execution order.
    pub items: Vec<PlanItem>,
    /// Media types present in `items`.
    #[serde(default)]
    pub media_types: BTreeSet<MediaType>,
}

impl RenamePlan {
    /// Creates an empty plan with a fresh id.
    #[must_use]
    pub fn new(root_dir: impl Into<PathBuf>, platform: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            root_dir: root_dir.into(),
            platform: platform.into(),
            items: Vec::new(),
            media_types: BTreeSet::new(),
        }
    }

    /// Appends an item and records its media type.
    pub fn push(&mut self, item: PlanItem) {
        self.media_types.insert(item.media_file.media_type);
        self.items.push(item);
    }

    /// Number of items in `status`.
    #[must_use]
    pub fn count(&self, status: PlanStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }

    /// Checks the structural rules every persisted plan must satisfy.
    pub fn validate(&self) -> Result<()> {
        require_absolute(&self.root_dir, "root_dir")?;
        for (idx, item) in self.items.iter().enumerate() {
            require_absolute(&item.source, &format!("items[{idx}].source"))?;
            require_absolute(&item.destination, &format!("items[{idx}].destination"))?;
            if item.status == PlanStatus::Manual
                && item.manual_reason.as_deref().is_none_or(str::is_empty)
            {
                return Err(KirikaeError::InvalidPlan(format!(
                    "items[{idx}] is manual but has no manual_reason"
                )));
            }
        }
        Ok(())
    }
}

fn require_absolute(path: &Path, field: &str) -> Result<()> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(KirikaeError::InvalidPlan(format!(
            "{field} must be an absolute path, got {}",
            path.display()
        )))
    }
}
