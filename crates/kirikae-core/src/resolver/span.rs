//! Helpers for turning a set of matched episodes into one assignment.

use crate::types::{Assignment, EpisodeCandidate, Resolution};

/// Sorts `episodes` by number and, when more than two remain, keeps the
/// adjacent pair with the smallest numeric gap (first such pair on ties).
#[must_use]
pub fn closest_pair(mut episodes: Vec<EpisodeCandidate>) -> Vec<EpisodeCandidate> {
    episodes.sort_by_key(|ep| ep.episode_number);
    if episodes.len() <= 2 {
        return episodes;
    }

    let mut best = 0;
    let mut best_gap = u32::MAX;
    for (i, pair) in episodes.windows(2).enumerate() {
        let gap = pair[1].episode_number - pair[0].episode_number;
        if gap < best_gap {
            best_gap = gap;
            best = i;
        }
    }
    episodes[best..best + 2].to_vec()
}

/// A `SingleMatch` or `SpanMatch` over exactly `episodes`.
#[must_use]
pub fn matched(season: Option<u32>, episodes: &[EpisodeCandidate]) -> Option<Resolution> {
    Assignment::from_episodes(season, episodes).map(Resolution::matched)
}
