use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::EpisodeOracle;
use crate::types::EpisodeCandidate;

/// Cache key for one episode-list lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EpisodeKey {
    /// Show title as passed to the oracle.
    pub show: String,
    /// Season, if known.
    pub season: Option<u32>,
    /// Release year, if known.
    pub year: Option<u16>,
}

impl EpisodeKey {
    /// Builds a key.
    pub fn new(show: impl Into<String>, season: Option<u32>, year: Option<u16>) -> Self {
        Self {
            show: show.into(),
            season,
            year,
        }
    }
}

/// Per-run cache of episode lists.
///
/// Each key is fetched at most once; failures are stored as empty lists so a
/// broken provider is not asked again.
#[derive(Debug, Clone, Default)]
pub struct EpisodeListCache {
    lists: BTreeMap<EpisodeKey, Vec<EpisodeCandidate>>,
}

impl EpisodeListCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `episodes` under `key`, replacing any previous entry.
    pub fn insert(&mut self, key: EpisodeKey, episodes: Vec<EpisodeCandidate>) {
        self.lists.insert(key, episodes);
    }

    /// Whether `key` has been fetched or inserted.
    pub fn contains(&self, key: &EpisodeKey) -> bool {
        self.lists.contains_key(key)
    }

    /// Number of cached keys, including empty ones.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Returns the list for `key`, asking `oracle` on first use.
    pub fn fetch(&mut self, oracle: &mut dyn EpisodeOracle, key: &EpisodeKey) -> &[EpisodeCandidate] {
        self.lists.entry(key.clone()).or_insert_with(|| {
            match oracle.fetch_episode_list(&key.show, key.season, key.year) {
                Ok(episodes) => {
                    debug!(
                        provider = oracle.name(),
                        show = %key.show,
                        count = episodes.len(),
                        "fetched episode list"
                    );
                    episodes
                }
                Err(err) => {
                    warn!(
                        provider = oracle.name(),
                        show = %key.show,
                        error = %err,
                        "episode list lookup failed; caching empty list"
                    );
                    Vec::new()
                }
            }
        })
    }

    /// First non-empty list among `(show, season, year)`, `(show, season, -)`,
    /// `(show, -, year)` and `(show, -, -)`.
    pub fn lookup(&self, show: &str, season: Option<u32>, year: Option<u16>) -> Option<&[EpisodeCandidate]> {
        let variants = [(season, year), (season, None), (None, year), (None, None)];
        variants.into_iter().find_map(|(season, year)| {
            self.lists
                .get(&EpisodeKey::new(show, season, year))
                .filter(|list| !list.is_empty())
                .map(Vec::as_slice)
        })
    }

    /// First non-empty list cached for `show` under any season or year.
    pub fn find_by_show(&self, show: &str) -> Option<&[EpisodeCandidate]> {
        self.lists
            .iter()
            .find(|(key, list)| key.show == show && !list.is_empty())
            .map(|(_, list)| list.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{KirikaeError, Result};

    struct Flaky {
        calls: usize,
    }

    impl EpisodeOracle for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn fetch_episode_list(
            &mut self,
            _show: &str,
            _season: Option<u32>,
            _year: Option<u16>,
        ) -> Result<Vec<EpisodeCandidate>> {
            self.calls += 1;
            Err(KirikaeError::Oracle("timeout".into()))
        }
    }

    #[test]
    fn failures_are_cached_as_empty() {
        let mut cache = EpisodeListCache::new();
        let mut oracle = Flaky { calls: 0 };
        let key = EpisodeKey::new("Paw Patrol", Some(1), None);

        assert!(cache.fetch(&mut oracle, &key).is_empty());
        assert!(cache.fetch(&mut oracle, &key).is_empty());
        assert_eq!(oracle.calls, 1);
        assert!(cache.contains(&key));
    }

    #[test]
    fn lookup_tries_key_variants() {
        let mut cache = EpisodeListCache::new();
        cache.insert(EpisodeKey::new("Show", Some(1), Some(2013)), Vec::new());
        cache.insert(
            EpisodeKey::new("Show", None, None),
            vec![EpisodeCandidate::new(1, 1, "Pilot")],
        );

        let found = cache.lookup("Show", Some(1), Some(2013)).unwrap();
        assert_eq!(found[0].title, "Pilot");
        assert!(cache.lookup("Other", Some(1), None).is_none());
    }

    #[test]
    fn find_by_show_ignores_season_and_year() {
        let mut cache = EpisodeListCache::new();
        cache.insert(
            EpisodeKey::new("Show", Some(3), Some(2020)),
            vec![EpisodeCandidate::new(3, 1, "Third")],
        );
        assert_eq!(cache.find_by_show("Show").unwrap()[0].title, "Third");
        assert!(cache.find_by_show("show").is_none());
    }
}
