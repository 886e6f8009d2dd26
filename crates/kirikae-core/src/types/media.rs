use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::resolution::Resolution;

/// Coarse classification assigned by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Television episode.
    Tv,
    /// Feature film.
    Movie,
    /// Audio track.
    Music,
    /// Anything the scanner could not classify.
    Unknown,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tv => write!(f, "tv"),
            Self::Movie => write!(f, "movie"),
            Self::Music => write!(f, "music"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A media file discovered by the scanner.
///
/// `season`, `episode` and `episode_title` are filled in by the resolver when
/// a [`Resolution`] is applied; the rest is scanner-owned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFile {
    /// Absolute path to the file.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Scanner classification.
    pub media_type: MediaType,
    /// Last modification time.
    pub modified_date: DateTime<Utc>,
    /// Season number.
    #[serde(default)]
    pub season: Option<u32>,
    /// First episode number covered by this file.
    #[serde(default)]
    pub episode: Option<u32>,
    /// Show or movie title.
    #[serde(default)]
    pub title: Option<String>,
    /// Episode title, joined with `" & "` for spans.
    #[serde(default)]
    pub episode_title: Option<String>,
    /// Release year.
    #[serde(default)]
    pub year: Option<u16>,
    /// SHA-256 hex digest recorded at scan time.
    #[serde(default)]
    pub hash: Option<String>,
    /// Provider ids, e.g. `{"tvdb": "272472"}`.
    #[serde(default)]
    pub metadata_ids: BTreeMap<String, String>,
    /// Outcome of episode resolution.
    #[serde(default)]
    pub resolution: Resolution,
}

impl MediaFile {
    /// Creates a record with no parsed metadata, stamped with the current time.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, media_type: MediaType) -> Self {
        Self {
            path: path.into(),
            size: 0,
            media_type,
            modified_date: Utc::now(),
            season: None,
            episode: None,
            title: None,
            episode_title: None,
            year: None,
            hash: None,
            metadata_ids: BTreeMap::new(),
            resolution: Resolution::Unresolved,
        }
    }

    /// Sets the show or movie title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the season number.
    #[must_use]
    pub fn with_season(mut self, season: u32) -> Self {
        self.season = Some(season);
        self
    }

    /// Sets the recorded content hash.
    #[must_use]
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// File name including extension, or an empty string for odd paths.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// File name without its extension.
    #[must_use]
    pub fn file_stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Lower-cased extension with a leading dot, or empty.
    #[must_use]
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default()
    }

    /// Path relative to `root_dir`, or the full path when it lies elsewhere.
    #[must_use]
    pub fn root_relative_path(&self, root_dir: &Path) -> PathBuf {
        self.path
            .strip_prefix(root_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| self.path.clone())
    }
}
