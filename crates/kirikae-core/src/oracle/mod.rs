//! # Oracles
//!
//! The collaborators the planner asks for facts it cannot derive from a
//! filename: the list of episodes in a season and, optionally, a scalar
//! confidence for a guess. Network clients live outside this crate; they only
//! need to implement the traits here.

pub mod cache;
pub mod chain;

pub use cache::{EpisodeKey, EpisodeListCache};
pub use chain::{ProviderChain, ProviderHealth};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::EpisodeCandidate;

/// Supplies the episode list for a show.
pub trait EpisodeOracle {
    /// Provider name used in logs and health tracking.
    fn name(&self) -> &str;

    /// Fetches every known episode of `show`, narrowed to `season` when given.
    ///
    /// # Errors
    ///
    /// Any provider failure. Callers treat it as an empty list.
    fn fetch_episode_list(
        &mut self,
        show: &str,
        season: Option<u32>,
        year: Option<u16>,
    ) -> Result<Vec<EpisodeCandidate>>;
}

/// An answer from a [`ConfidenceOracle`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OracleVerdict {
    /// Confidence in `[0.0, 1.0]`.
    pub confidence: f32,
    /// Episode numbers the oracle believes the file contains.
    #[serde(default)]
    pub episode_numbers: Vec<u32>,
    /// Episode titles the oracle believes the file contains.
    #[serde(default)]
    pub titles: Vec<String>,
}

/// Scores a filename against candidate episodes, typically backed by an LLM.
pub trait ConfidenceOracle {
    /// Assesses which of `candidates` the file named `filename` contains.
    ///
    /// # Errors
    ///
    /// Any backend failure.
    fn assess(&self, filename: &str, candidates: &[EpisodeCandidate]) -> Result<OracleVerdict>;
}

/// An oracle answering from an in-memory episode list, e.g. one loaded from a
/// JSON export.
#[derive(Debug, Clone, Default)]
pub struct FixedEpisodeList {
    name: String,
    episodes: Vec<EpisodeCandidate>,
}

impl FixedEpisodeList {
    /// Wraps `episodes` under the provider name `"fixed"`.
    pub fn new(episodes: Vec<EpisodeCandidate>) -> Self {
        Self::named("fixed", episodes)
    }

    /// Wraps `episodes` under a custom provider name.
    pub fn named(name: impl Into<String>, episodes: Vec<EpisodeCandidate>) -> Self {
        Self {
            name: name.into(),
            episodes,
        }
    }
}

impl EpisodeOracle for FixedEpisodeList {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_episode_list(
        &mut self,
        _show: &str,
        season: Option<u32>,
        _year: Option<u16>,
    ) -> Result<Vec<EpisodeCandidate>> {
        Ok(self
            .episodes
            .iter()
            .filter(|ep| season.is_none_or(|s| ep.season_number == s))
            .cloned()
            .collect())
    }
}
