//! The resolution strategies, in priority order.
//!
//! Each strategy returns `None` (or an empty list) to pass the file on to the
//! next one. Strategies only read the [`ResolveContext`].

use std::collections::HashSet;

use tracing::debug;

use super::ResolveContext;
use super::span::{closest_pair, matched};
use crate::matching::fuzz::similarity;
use crate::matching::token_set_match;
use crate::types::{Assignment, EpisodeCandidate, ManualReason, Resolution, normalize_episode_list};

/// A single step of the chain.
pub type Strategy = fn(&ResolveContext<'_>) -> Option<Vec<Resolution>>;

/// Every strategy before the final fallback, in the order they are tried.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("early-multi-segment", early_multi_segment),
    ("duration-pairing", duration_pairing),
    ("exact-two-episodes", exact_two_episodes),
    ("dash-span", dash_span),
    ("single-segment-multi-match", single_segment_multi_match),
    ("per-segment", per_segment),
    ("declared-episode", declared_episode),
];

fn sorted_by_number(episodes: &[EpisodeCandidate]) -> Vec<EpisodeCandidate> {
    let mut sorted = episodes.to_vec();
    sorted.sort_by_key(|ep| ep.episode_number);
    sorted
}

fn title_matches(segment: &str, episodes: &[EpisodeCandidate]) -> Vec<EpisodeCandidate> {
    episodes
        .iter()
        .filter(|ep| token_set_match(segment, &ep.title))
        .cloned()
        .collect()
}

/// Matches every segment to its best unclaimed episode and reports the two
/// lowest as a span. With fewer than two matches the first two episodes by
/// number are used instead.
pub fn early_multi_segment(ctx: &ResolveContext<'_>) -> Option<Vec<Resolution>> {
    if ctx.segments.len() < 2 || ctx.episodes.is_empty() {
        return None;
    }

    let mut claimed = HashSet::new();
    let mut used_numbers = HashSet::new();
    let mut found = Vec::new();
    for segment in &ctx.segments {
        let best = ctx
            .matcher
            .match_episodes(segment, &ctx.episodes, &claimed)
            .into_iter()
            .next();
        if let Some(best) = best {
            let episode = &ctx.episodes[best.index];
            if best.score >= ctx.thresholds.segment_min_score
                && used_numbers.insert(episode.episode_number)
            {
                debug!(
                    segment,
                    episode = episode.episode_number,
                    score = best.score,
                    rule = %best.strategy,
                    "segment matched"
                );
                claimed.insert(best.index);
                found.push(episode.clone());
            }
        }
    }

    if found.len() < 2 && ctx.episodes.len() >= 2 {
        found = sorted_by_number(&ctx.episodes);
    }
    if found.len() < 2 {
        return None;
    }
    found.sort_by_key(|ep| ep.episode_number);
    found.truncate(2);
    matched(ctx.info.season, &found).map(|r| vec![r])
}

/// With untrusted titles, groups episodes by runtime: adjacent pairs that fit
/// the `max_duration` window together, everything else alone. Episodes
/// without a known runtime are never paired.
pub fn duration_pairing(ctx: &ResolveContext<'_>) -> Option<Vec<Resolution>> {
    if !ctx.config.untrusted_titles || ctx.episodes.is_empty() {
        return None;
    }
    let window_ms = u64::from(ctx.config.max_duration?) * 60_000;
    let fits = |first: &EpisodeCandidate, second: &EpisodeCandidate| {
        matches!(
            (first.duration_ms, second.duration_ms),
            (Some(a), Some(b)) if a + b <= window_ms
        )
    };

    let mut resolutions = Vec::new();
    let mut i = 0;
    while i < ctx.episodes.len() {
        let first = &ctx.episodes[i];
        if let Some(second) = ctx.episodes.get(i + 1) {
            if fits(first, second) {
                resolutions.extend(matched(ctx.info.season, &[first.clone(), second.clone()]));
                i += 2;
                continue;
            }
        }
        if first.duration_ms.is_some_and(|ms| ms * 100 >= window_ms * 95) {
            debug!(episode = first.episode_number, "episode fills the runtime window");
        }
        resolutions.extend(matched(ctx.info.season, std::slice::from_ref(first)));
        i += 1;
    }
    Some(resolutions)
}

/// Two segments and a two-episode list: pair them without looking at text.
pub fn exact_two_episodes(ctx: &ResolveContext<'_>) -> Option<Vec<Resolution>> {
    if ctx.segments.len() != 2 || ctx.episodes.len() != 2 {
        return None;
    }
    matched(ctx.info.season, &sorted_by_number(&ctx.episodes)).map(|r| vec![r])
}

/// Uses an explicit `E05-E06` range from the filename.
pub fn dash_span(ctx: &ResolveContext<'_>) -> Option<Vec<Resolution>> {
    let (start, end) = ctx.dash_span?;
    let in_range: Vec<EpisodeCandidate> = ctx
        .episodes
        .iter()
        .filter(|ep| (start..=end).contains(&ep.episode_number))
        .cloned()
        .collect();
    if in_range.is_empty() {
        return None;
    }
    matched(ctx.info.season, &closest_pair(in_range)).map(|r| vec![r])
}

/// In anthology mode, one segment whose words hit two or more titles.
pub fn single_segment_multi_match(ctx: &ResolveContext<'_>) -> Option<Vec<Resolution>> {
    if !ctx.config.anthology {
        return None;
    }
    let [segment] = ctx.segments.as_slice() else {
        return None;
    };
    let hits = title_matches(segment, &ctx.episodes);
    if hits.len() < 2 {
        return None;
    }
    matched(ctx.info.season, &closest_pair(hits)).map(|r| vec![r])
}

/// Matches each segment on its own; one resolution per segment with hits.
pub fn per_segment(ctx: &ResolveContext<'_>) -> Option<Vec<Resolution>> {
    let resolutions: Vec<Resolution> = ctx
        .segments
        .iter()
        .filter_map(|segment| {
            let hits = title_matches(segment, &ctx.episodes);
            if hits.is_empty() {
                None
            } else {
                matched(ctx.info.season, &closest_pair(hits))
            }
        })
        .collect();
    if resolutions.is_empty() {
        None
    } else {
        Some(resolutions)
    }
}

/// The file's own episode number, when the list knows it.
pub fn declared_episode(ctx: &ResolveContext<'_>) -> Option<Vec<Resolution>> {
    let number = ctx.declared_episode?;
    let episode = ctx.episodes.iter().find(|ep| ep.episode_number == number)?;
    matched(ctx.info.season, std::slice::from_ref(episode)).map(|r| vec![r])
}

/// Last resort. Always a single `Manual` resolution, carrying the best guess
/// available: segments that closely resemble titles, else the first two
/// episodes, else the first one.
pub fn final_fallback(ctx: &ResolveContext<'_>) -> Resolution {
    let pool = if ctx.episodes.is_empty() {
        ctx.cache
            .find_by_show(&ctx.info.show)
            .map(normalize_episode_list)
            .unwrap_or_default()
    } else {
        ctx.episodes.clone()
    };

    let guess = similar_episodes(ctx, &pool)
        .or_else(|| (pool.len() >= 2).then(|| pool[..2].to_vec()))
        .or_else(|| pool.first().map(|ep| vec![ep.clone()]))
        .and_then(|episodes| Assignment::from_episodes(ctx.info.season, &episodes));

    Resolution::Manual {
        reason: ManualReason::NoConfidentMatch,
        guess,
    }
}

fn similar_episodes(ctx: &ResolveContext<'_>, pool: &[EpisodeCandidate]) -> Option<Vec<EpisodeCandidate>> {
    if ctx.segments.is_empty() || pool.is_empty() {
        return None;
    }

    let mut found: Vec<EpisodeCandidate> = Vec::new();
    for segment in ctx.segments.iter().take(2) {
        let mut best: Option<(f64, &EpisodeCandidate)> = None;
        for episode in pool {
            let score = similarity(segment, &episode.title);
            if score > ctx.thresholds.fallback_similarity && best.is_none_or(|(b, _)| score > b) {
                best = Some((score, episode));
            }
        }
        let (_, episode) = best?;
        if found.iter().any(|ep| ep.episode_number == episode.episode_number) {
            return None;
        }
        found.push(episode.clone());
    }
    Some(found)
}
