use std::collections::{HashMap, HashSet};
use std::fmt;

use regex::Regex;

use super::fuzz::{partial_ratio, token_set_ratio, token_sort_ratio};
use crate::config::MatcherConfig;
use crate::error::Result;
use crate::types::EpisodeCandidate;

/// Bonus added when every rare word of a title appears in the text.
const RARE_WORD_BONUS: f64 = 15.0;
/// How far below the threshold a rare-word anchored match may score.
const RARE_WORD_SLACK: f64 = 20.0;

/// Which rule of the matcher produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStrategy {
    /// A text word is a substring of exactly one title.
    UniqueSubstring,
    /// All rare words of the title appear in the text.
    RareWord,
    /// The fuzzy score alone cleared the threshold.
    Threshold,
    /// Nothing cleared the threshold but the title shares a rare word.
    WeakRareWord,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UniqueSubstring => write!(f, "unique-substring"),
            Self::RareWord => write!(f, "rare-word"),
            Self::Threshold => write!(f, "threshold"),
            Self::WeakRareWord => write!(f, "weak-rare-word"),
        }
    }
}

/// One candidate accepted by [`EpisodeMatcher::match_episodes`].
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeMatch {
    /// Index into the candidate slice.
    pub index: usize,
    /// The candidate's title.
    pub title: String,
    /// Match score, 0-100 (rare-word anchoring may exceed 100).
    pub score: f64,
    /// The rule that produced the match.
    pub strategy: MatchStrategy,
}

/// Fuzzy episode-title matcher.
///
/// Scores a text span (usually one filename segment) against the titles of a
/// season's episodes. Claimed candidates are never returned.
pub struct EpisodeMatcher {
    re_word: Regex,
    threshold: f64,
}

impl EpisodeMatcher {
    /// Constructs a matcher with the default threshold of 75.
    ///
    /// # Errors
    ///
    /// Returns `KirikaeError::RegexError` if the word pattern fails to compile.
    pub fn new() -> Result<Self> {
        Self::with_config(&MatcherConfig::default())
    }

    /// Constructs a matcher using `config.threshold`.
    ///
    /// # Errors
    ///
    /// Returns `KirikaeError::RegexError` if the word pattern fails to compile.
    pub fn with_config(config: &MatcherConfig) -> Result<Self> {
        Ok(Self {
            re_word: Regex::new(r"\w+")?,
            threshold: config.threshold,
        })
    }

    /// The plain acceptance threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn words(&self, text: &str) -> Vec<String> {
        self.re_word
            .find_iter(&text.to_lowercase())
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Matches `text` against `candidates`, best match first.
    ///
    /// Rules, first non-empty result wins:
    /// 1. a word of `text` that is a substring of exactly one title anchors
    ///    that title (score 100, lowest index first);
    /// 2. titles whose rare words all appear in `text` and score within 20 of
    ///    the threshold, plus titles clearing the threshold outright, ranked by
    ///    score;
    /// 3. titles sharing any rare word with `text`, lowest index first.
    ///
    /// Returns an empty list when nothing qualifies.
    #[must_use]
    pub fn match_episodes(
        &self,
        text: &str,
        candidates: &[EpisodeCandidate],
        claimed: &HashSet<usize>,
    ) -> Vec<EpisodeMatch> {
        let title_tokens: Vec<Vec<String>> =
            candidates.iter().map(|ep| self.words(&ep.title)).collect();

        let mut text_words: Vec<String> = Vec::new();
        for word in self.words(text) {
            if !text_words.contains(&word) {
                text_words.push(word);
            }
        }

        let anchored = unique_substring_matches(candidates, &title_tokens, &text_words, claimed);
        if !anchored.is_empty() {
            return anchored;
        }

        let mut frequency: HashMap<&str, usize> = HashMap::new();
        for tokens in &title_tokens {
            for token in tokens {
                *frequency.entry(token.as_str()).or_default() += 1;
            }
        }
        let text_set: HashSet<&str> = text_words.iter().map(String::as_str).collect();

        let mut accepted = Vec::new();
        let mut weak = Vec::new();
        for (index, (candidate, tokens)) in candidates.iter().zip(&title_tokens).enumerate() {
            if claimed.contains(&index) {
                continue;
            }

            let best = token_set_ratio(text, &candidate.title)
                .max(token_sort_ratio(text, &candidate.title))
                .max(partial_ratio(text, &candidate.title));

            let rare: HashSet<&str> = tokens
                .iter()
                .map(String::as_str)
                .filter(|t| frequency.get(t) == Some(&1) && t.chars().count() > 2)
                .collect();
            let all_rare_present = !rare.is_empty() && rare.is_subset(&text_set);

            if all_rare_present && best >= self.threshold - RARE_WORD_SLACK {
                accepted.push(EpisodeMatch {
                    index,
                    title: candidate.title.clone(),
                    score: best + RARE_WORD_BONUS,
                    strategy: MatchStrategy::RareWord,
                });
            } else if best >= self.threshold {
                accepted.push(EpisodeMatch {
                    index,
                    title: candidate.title.clone(),
                    score: best,
                    strategy: MatchStrategy::Threshold,
                });
            } else if !rare.is_disjoint(&text_set) {
                weak.push(EpisodeMatch {
                    index,
                    title: candidate.title.clone(),
                    score: best,
                    strategy: MatchStrategy::WeakRareWord,
                });
            }
        }

        if accepted.is_empty() {
            return weak;
        }
        // Stable sort keeps index order among equal scores.
        accepted.sort_by(|a, b| b.score.total_cmp(&a.score));
        accepted
    }
}

fn unique_substring_matches(
    candidates: &[EpisodeCandidate],
    title_tokens: &[Vec<String>],
    text_words: &[String],
    claimed: &HashSet<usize>,
) -> Vec<EpisodeMatch> {
    let contains = |tokens: &[String], word: &str| tokens.iter().any(|t| t.contains(word));

    let mut matches = Vec::new();
    for (index, (candidate, tokens)) in candidates.iter().zip(title_tokens).enumerate() {
        if claimed.contains(&index) {
            continue;
        }
        let anchored = text_words.iter().any(|word| {
            contains(tokens, word)
                && title_tokens
                    .iter()
                    .filter(|other| contains(other, word))
                    .count()
                    == 1
        });
        if anchored {
            matches.push(EpisodeMatch {
                index,
                title: candidate.title.clone(),
                score: 100.0,
                strategy: MatchStrategy::UniqueSubstring,
            });
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paw_patrol() -> Vec<EpisodeCandidate> {
        vec![
            EpisodeCandidate::new(1, 5, "Pups and the Kitty-tastrophe"),
            EpisodeCandidate::new(1, 6, "Pups Save a Train"),
        ]
    }

    fn matcher() -> EpisodeMatcher {
        EpisodeMatcher::new().unwrap()
    }

    #[test]
    fn unique_substring_anchors_single_title() {
        let matches = matcher().match_episodes(
            "The Kitty Tastrophe Pups Save A Train",
            &paw_patrol(),
            &HashSet::from([0]),
        );
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].index, 1);
        assert_eq!(matches[0].score, 100.0);
        assert_eq!(matches[0].strategy, MatchStrategy::UniqueSubstring);
    }

    #[test]
    fn unique_substring_ties_break_by_index() {
        let matches = matcher().match_episodes(
            "The Kitty Tastrophe Pups Save A Train",
            &paw_patrol(),
            &HashSet::new(),
        );
        let indices: Vec<_> = matches.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn shared_word_falls_through_to_threshold() {
        let matches = matcher().match_episodes("Pups", &paw_patrol(), &HashSet::new());
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].index, 0);
        assert!(matches.iter().all(|m| m.strategy == MatchStrategy::Threshold));
    }

    #[test]
    fn claimed_candidates_are_never_returned() {
        let eps = paw_patrol();
        for text in ["Pups Save a Train", "Train", "Pups", "Kitty"] {
            let matches = matcher().match_episodes(text, &eps, &HashSet::from([1]));
            assert!(matches.iter().all(|m| m.index != 1), "text {text:?}");
        }
    }

    #[test]
    fn rare_word_anchoring_adds_bonus() {
        // "bay" is rare as a token but not a unique substring ("bayside").
        let eps = vec![
            EpisodeCandidate::new(1, 1, "Pups Save Bay"),
            EpisodeCandidate::new(1, 2, "Pups Save Bayside"),
        ];
        let matches = matcher().match_episodes("Pups Save Bay", &eps, &HashSet::new());
        assert_eq!(matches[0].index, 0);
        assert_eq!(matches[0].strategy, MatchStrategy::RareWord);
        assert!(matches[0].score > 100.0);
    }

    #[test]
    fn weak_rare_word_only_when_nothing_accepted() {
        let eps = vec![
            EpisodeCandidate::new(1, 1, "Pups Save Bay Lighthouse"),
            EpisodeCandidate::new(1, 2, "Pups Save Bayside"),
        ];
        let matches = matcher().match_episodes("Bay Zzz", &eps, &HashSet::new());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].index, 0);
        assert_eq!(matches[0].strategy, MatchStrategy::WeakRareWord);
    }

    #[test]
    fn no_overlap_returns_empty() {
        let matches = matcher().match_episodes("zzz qqq", &paw_patrol(), &HashSet::new());
        assert!(matches.is_empty());
        assert!(
            matcher()
                .match_episodes("", &paw_patrol(), &HashSet::new())
                .is_empty()
        );
    }
}
