use std::fmt;

use serde::{Deserialize, Serialize};

use super::episode::{EpisodeCandidate, EpisodeSpan};
use super::media::MediaFile;

/// A concrete episode (or span) chosen for a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Season of the assigned episodes, when known.
    pub season: Option<u32>,
    /// Episodes covered.
    pub span: EpisodeSpan,
    /// Episode titles in ascending episode order.
    pub titles: Vec<String>,
}

impl Assignment {
    /// Builds an assignment over exactly `episodes`, sorted by number.
    ///
    /// `season` falls back to the first episode's season.
    #[must_use]
    pub fn from_episodes(season: Option<u32>, episodes: &[EpisodeCandidate]) -> Option<Self> {
        let mut sorted = episodes.to_vec();
        sorted.sort_by_key(|ep| ep.episode_number);
        let span = EpisodeSpan::covering(&sorted)?;
        Some(Self {
            season: season.or_else(|| sorted.first().map(|ep| ep.season_number)),
            span,
            titles: sorted.into_iter().map(|ep| ep.title).collect(),
        })
    }

    /// Titles joined as `"Title A & Title B"`.
    #[must_use]
    pub fn joined_title(&self) -> String {
        self.titles.join(" & ")
    }
}

/// Why a file needs a human decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ManualReason {
    /// Every matching strategy came up empty.
    NoConfidentMatch,
    /// A confidence oracle answered, but not confidently enough to auto-accept.
    LowOracleConfidence {
        /// The oracle's confidence in `[0.0, 1.0]`.
        confidence: f32,
    },
    /// Another item of the plan already moves this file; only one of the
    /// file's resolutions can be applied.
    SharedSource,
}

impl fmt::Display for ManualReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoConfidentMatch => write!(f, "No confident match after LLM/manual fallback."),
            Self::LowOracleConfidence { confidence } => write!(
                f,
                "Oracle confidence {confidence:.2} is below the auto-accept threshold."
            ),
            Self::SharedSource => write!(f, "Source file is already moved by another plan item."),
        }
    }
}

/// Resolution state of a media file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Resolution {
    /// Not yet processed.
    #[default]
    Unresolved,
    /// Exactly one episode.
    SingleMatch(Assignment),
    /// Two or more episodes in one file.
    SpanMatch(Assignment),
    /// Needs review; may carry a best guess.
    Manual {
        /// Why the file could not be auto-accepted.
        reason: ManualReason,
        /// The fallback guess, if any episode data was available.
        guess: Option<Assignment>,
    },
}

impl Resolution {
    /// Wraps an assignment in the matching variant for its span shape.
    #[must_use]
    pub fn matched(assignment: Assignment) -> Self {
        if assignment.span.is_range() {
            Self::SpanMatch(assignment)
        } else {
            Self::SingleMatch(assignment)
        }
    }

    /// Returns `true` when the file needs review.
    #[must_use]
    pub fn is_manual(&self) -> bool {
        matches!(self, Self::Manual { .. })
    }

    /// The chosen (or guessed) episodes.
    #[must_use]
    pub fn assignment(&self) -> Option<&Assignment> {
        match self {
            Self::Unresolved => None,
            Self::SingleMatch(a) | Self::SpanMatch(a) => Some(a),
            Self::Manual { guess, .. } => guess.as_ref(),
        }
    }

    /// The manual reason, if this is a manual resolution.
    #[must_use]
    pub fn manual_reason(&self) -> Option<&ManualReason> {
        match self {
            Self::Manual { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Writes this resolution onto `media_file`.
    pub fn apply_to(&self, media_file: &mut MediaFile) {
        if let Some(assignment) = self.assignment() {
            if assignment.season.is_some() {
                media_file.season = assignment.season;
            }
            media_file.episode = Some(assignment.span.start());
            media_file.episode_title = Some(assignment.joined_title());
        }
        media_file.resolution = self.clone();
    }
}
