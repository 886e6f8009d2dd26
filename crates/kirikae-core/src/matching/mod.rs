//! # Matching
//!
//! Text-level building blocks for episode resolution: segment splitting,
//! title normalization, fuzzy metrics and the rule-based episode matcher.

pub mod fuzz;
pub mod matcher;
pub mod normalize;
pub mod segment;

pub use matcher::{EpisodeMatch, EpisodeMatcher, MatchStrategy};
pub use normalize::{normalize, token_set_match};
pub use segment::{SegmentSplitter, Segments};
