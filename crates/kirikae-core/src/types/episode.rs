use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KirikaeError;

/// One episode as reported by an episode oracle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpisodeCandidate {
    /// Season the episode belongs to.
    pub season_number: u32,
    /// Episode number within the season.
    pub episode_number: u32,
    /// Official episode title.
    pub title: String,
    /// Absolute episode number across all seasons, if the provider has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_number: Option<u32>,
    /// Runtime in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl EpisodeCandidate {
    /// Creates a candidate without runtime or absolute numbering.
    #[must_use]
    pub fn new(season_number: u32, episode_number: u32, title: impl Into<String>) -> Self {
        Self {
            season_number,
            episode_number,
            title: title.into(),
            absolute_number: None,
            duration_ms: None,
        }
    }

    /// Sets the runtime in milliseconds.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// Drops specials (episode 0) so the resolver only sees real episode numbers.
#[must_use]
pub fn normalize_episode_list(episodes: &[EpisodeCandidate]) -> Vec<EpisodeCandidate> {
    episodes
        .iter()
        .filter(|ep| ep.episode_number > 0)
        .cloned()
        .collect()
}

/// The episode numbers a plan item covers.
///
/// Rendered without any season prefix: `E05` for one episode, `05-E06` for a
/// span. Parsing accepts the season-qualified forms too (`S01E05-E06`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EpisodeSpan {
    /// A single episode.
    Single(u32),
    /// Two or more episodes, first and last number inclusive.
    Range(u32, u32),
}

impl EpisodeSpan {
    /// Builds the span covering exactly the given episodes.
    ///
    /// Returns `None` for an empty slice. The slice is expected in ascending
    /// episode order.
    #[must_use]
    pub fn covering(episodes: &[EpisodeCandidate]) -> Option<Self> {
        match episodes {
            [] => None,
            [only] => Some(Self::Single(only.episode_number)),
            [first, .., last] => Some(Self::Range(first.episode_number, last.episode_number)),
        }
    }

    /// First episode number.
    #[must_use]
    pub fn start(self) -> u32 {
        match self {
            Self::Single(ep) | Self::Range(ep, _) => ep,
        }
    }

    /// Last episode number.
    #[must_use]
    pub fn end(self) -> u32 {
        match self {
            Self::Single(ep) | Self::Range(_, ep) => ep,
        }
    }

    /// Returns `true` for a multi-episode span.
    #[must_use]
    pub fn is_range(self) -> bool {
        matches!(self, Self::Range(..))
    }
}

impl fmt::Display for EpisodeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(ep) => write!(f, "E{ep:02}"),
            Self::Range(start, end) => write!(f, "{start:02}-E{end:02}"),
        }
    }
}

impl FromStr for EpisodeSpan {
    type Err = KirikaeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || KirikaeError::InvalidPlan(format!("malformed episode span {s:?}"));

        let upper = s.trim().to_ascii_uppercase();
        // Strip a leading season qualifier: "S01E05-E06" -> "E05-E06"
        let rest = match upper.strip_prefix('S') {
            Some(tail) => tail.trim_start_matches(|c: char| c.is_ascii_digit()),
            None => upper.as_str(),
        };

        let (start, end) = match rest.split_once('-') {
            Some((start, end)) => (start, Some(end)),
            None => (rest, None),
        };
        let start: u32 = start
            .trim_start_matches('E')
            .parse()
            .map_err(|_| invalid())?;

        match end {
            None => Ok(Self::Single(start)),
            Some(end) => {
                let end: u32 = end.trim_start_matches('E').parse().map_err(|_| invalid())?;
                if end < start {
                    return Err(invalid());
                }
                if end == start {
                    Ok(Self::Single(start))
                } else {
                    Ok(Self::Range(start, end))
                }
            }
        }
    }
}

impl From<EpisodeSpan> for String {
    fn from(span: EpisodeSpan) -> Self {
        span.to_string()
    }
}

impl TryFrom<String> for EpisodeSpan {
    type Error = KirikaeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
