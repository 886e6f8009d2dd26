//! # Configuration
//!
//! Plain option structs with builder-style setters. All of them deserialize
//! with `serde` so an outer layer can load them from a file.

use serde::{Deserialize, Serialize};

/// Options that steer planning for one run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSetConfig {
    /// Show name to use when the file does not carry one.
    pub show_name: Option<String>,
    /// Season to use when the file does not carry one.
    pub season: Option<u32>,
    /// Release year for movie paths.
    pub movie_year: Option<u16>,
    /// Treat files as anthology episodes that may bundle several stories.
    pub anthology: bool,
    /// Ignore filename titles and pair episodes by runtime instead.
    pub untrusted_titles: bool,
    /// Runtime window in minutes for one file, used with `untrusted_titles`.
    pub max_duration: Option<u32>,
}

impl RuleSetConfig {
    /// Create a configuration with every option unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback show name.
    pub fn with_show_name(mut self, show_name: impl Into<String>) -> Self {
        self.show_name = Some(show_name.into());
        self
    }

    /// Set the fallback season.
    pub fn with_season(mut self, season: u32) -> Self {
        self.season = Some(season);
        self
    }

    /// Set the movie release year.
    pub fn with_movie_year(mut self, year: u16) -> Self {
        self.movie_year = Some(year);
        self
    }

    /// Enable or disable anthology handling.
    pub fn with_anthology(mut self, enabled: bool) -> Self {
        self.anthology = enabled;
        self
    }

    /// Pair episodes by runtime within `max_duration` minutes.
    pub fn with_untrusted_titles(mut self, max_duration: u32) -> Self {
        self.untrusted_titles = true;
        self.max_duration = Some(max_duration);
        self
    }
}

/// Score cut-offs for the episode matcher and resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Minimum fuzzy score (0-100) for plain acceptance.
    pub threshold: f64,
    /// Minimum score for a segment match to count in multi-segment resolution.
    pub segment_min_score: f64,
    /// Minimum sequence similarity (0.0-1.0) for the last-resort guess.
    pub fallback_similarity: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            threshold: 75.0,
            segment_min_score: 30.0,
            fallback_similarity: 0.6,
        }
    }
}

impl MatcherConfig {
    /// Create a configuration with default cut-offs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the plain acceptance threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 100.0);
        self
    }

    /// Set the minimum per-segment score.
    pub fn with_segment_min_score(mut self, score: f64) -> Self {
        self.segment_min_score = score.clamp(0.0, 100.0);
        self
    }
}

/// Options for [`apply_plan`](crate::apply::apply_plan).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyOptions {
    /// Re-hash each moved file and fail on mismatch with the recorded hash.
    pub verify_hash: bool,
    /// Skip items whose destination already holds the recorded content.
    pub skip_identical: bool,
}

impl ApplyOptions {
    /// Create options with verification and skipping disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable post-move hash verification.
    pub fn with_verify_hash(mut self, enabled: bool) -> Self {
        self.verify_hash = enabled;
        self
    }

    /// Enable or disable skipping of identical destinations.
    pub fn with_skip_identical(mut self, enabled: bool) -> Self {
        self.skip_identical = enabled;
        self
    }
}
