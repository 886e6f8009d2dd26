use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::EpisodeOracle;
use crate::error::{KirikaeError, Result};
use crate::types::EpisodeCandidate;

/// Providers that failed during this run and are skipped from now on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderHealth {
    unhealthy: BTreeSet<String>,
}

impl ProviderHealth {
    /// Whether `provider` has not failed yet.
    pub fn is_healthy(&self, provider: &str) -> bool {
        !self.unhealthy.contains(provider)
    }

    /// Records a failure of `provider`.
    pub fn mark_unhealthy(&mut self, provider: &str) {
        self.unhealthy.insert(provider.to_string());
    }

    /// Names of failed providers, sorted.
    pub fn unhealthy(&self) -> impl Iterator<Item = &str> {
        self.unhealthy.iter().map(String::as_str)
    }

    /// Forgets every recorded failure.
    pub fn reset(&mut self) {
        self.unhealthy.clear();
    }
}

/// Tries several episode oracles in order until one returns episodes.
///
/// A provider that errors is marked unhealthy and skipped on later calls. A
/// provider that answers with an empty list stays healthy.
#[derive(Default)]
pub struct ProviderChain {
    providers: Vec<Box<dyn EpisodeOracle>>,
    health: ProviderHealth,
}

impl ProviderChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a provider to the end of the chain.
    pub fn with_provider(mut self, provider: impl EpisodeOracle + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Current provider health.
    pub fn health(&self) -> &ProviderHealth {
        &self.health
    }

    /// Mutable provider health, e.g. to reset between runs.
    pub fn health_mut(&mut self) -> &mut ProviderHealth {
        &mut self.health
    }
}

impl EpisodeOracle for ProviderChain {
    fn name(&self) -> &str {
        "chain"
    }

    fn fetch_episode_list(
        &mut self,
        show: &str,
        season: Option<u32>,
        year: Option<u16>,
    ) -> Result<Vec<EpisodeCandidate>> {
        let mut answered = false;
        let mut last_error = None;

        for provider in &mut self.providers {
            if !self.health.is_healthy(provider.name()) {
                debug!(provider = provider.name(), "skipping unhealthy provider");
                continue;
            }
            match provider.fetch_episode_list(show, season, year) {
                Ok(episodes) if !episodes.is_empty() => return Ok(episodes),
                Ok(_) => {
                    debug!(provider = provider.name(), show, "provider returned no episodes");
                    answered = true;
                }
                Err(err) => {
                    warn!(provider = provider.name(), error = %err, "provider failed; marking unhealthy");
                    self.health.mark_unhealthy(provider.name());
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(err) if !answered => Err(err),
            _ if answered => Ok(Vec::new()),
            _ => Err(KirikaeError::Oracle(format!(
                "no healthy provider for {show:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::FixedEpisodeList;

    struct Broken;

    impl EpisodeOracle for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn fetch_episode_list(
            &mut self,
            _show: &str,
            _season: Option<u32>,
            _year: Option<u16>,
        ) -> Result<Vec<EpisodeCandidate>> {
            Err(KirikaeError::Oracle("503".into()))
        }
    }

    #[test]
    fn falls_through_to_next_provider() {
        let mut chain = ProviderChain::new()
            .with_provider(Broken)
            .with_provider(FixedEpisodeList::named("tmdb", Vec::new()))
            .with_provider(FixedEpisodeList::named(
                "anilist",
                vec![EpisodeCandidate::new(1, 1, "Pilot")],
            ));

        let episodes = chain.fetch_episode_list("Show", Some(1), None).unwrap();
        assert_eq!(episodes.len(), 1);
        assert!(!chain.health().is_healthy("broken"));
        assert!(chain.health().is_healthy("tmdb"));
    }

    #[test]
    fn all_failing_is_an_error_and_then_no_provider_is_left() {
        let mut chain = ProviderChain::new().with_provider(Broken);
        assert!(chain.fetch_episode_list("Show", None, None).is_err());
        assert_eq!(chain.health().unhealthy().collect::<Vec<_>>(), vec!["broken"]);

        let err = chain.fetch_episode_list("Show", None, None).unwrap_err();
        assert!(err.to_string().contains("no healthy provider"));

        chain.health_mut().reset();
        assert!(chain.health().is_healthy("broken"));
    }

    #[test]
    fn empty_answer_is_not_an_error() {
        let mut chain = ProviderChain::new().with_provider(FixedEpisodeList::new(Vec::new()));
        assert!(chain.fetch_episode_list("Show", None, None).unwrap().is_empty());
    }
}
