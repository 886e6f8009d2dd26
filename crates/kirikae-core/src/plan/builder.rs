use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::conflict::{DestinationIndex, sweep_conflicts};
use super::rules::RuleSet;
use crate::confidence::route;
use crate::config::{MatcherConfig, RuleSetConfig};
use crate::error::{KirikaeError, Result};
use crate::oracle::{ConfidenceOracle, EpisodeKey, EpisodeListCache, EpisodeOracle, OracleVerdict};
use crate::resolver::{AnthologyResolver, ShowInfo};
use crate::types::{
    Assignment, EpisodeCandidate, ManualReason, MediaFile, MediaType, PlanItem, PlanStatus,
    RenamePlan, Resolution, normalize_episode_list,
};

/// Result of asking the confidence oracle about a manual resolution.
enum Routed {
    Resolved(Resolution),
    Rejected(String),
}

/// Builds a [`RenamePlan`] from scanned media files.
///
/// The builder owns the episode-list cache for its lifetime, so building
/// several plans with one builder asks the oracle at most once per show key.
pub struct PlanBuilder<'a> {
    rule_set: &'a dyn RuleSet,
    config: &'a RuleSetConfig,
    oracle: &'a mut dyn EpisodeOracle,
    confidence: Option<&'a dyn ConfidenceOracle>,
    resolver: AnthologyResolver,
    cache: EpisodeListCache,
}

impl<'a> PlanBuilder<'a> {
    /// Creates a builder with default matcher thresholds.
    ///
    /// # Errors
    ///
    /// Returns `KirikaeError::RegexError` if a pattern fails to compile.
    pub fn new(
        rule_set: &'a dyn RuleSet,
        config: &'a RuleSetConfig,
        oracle: &'a mut dyn EpisodeOracle,
    ) -> Result<Self> {
        Ok(Self {
            rule_set,
            config,
            oracle,
            confidence: None,
            resolver: AnthologyResolver::new()?,
            cache: EpisodeListCache::new(),
        })
    }

    /// Consults `oracle` for files that end in the final manual fallback.
    #[must_use]
    pub fn with_confidence_oracle(mut self, oracle: &'a dyn ConfidenceOracle) -> Self {
        self.confidence = Some(oracle);
        self
    }

    /// Replaces the matcher thresholds.
    ///
    /// # Errors
    ///
    /// Returns `KirikaeError::RegexError` if a pattern fails to compile.
    pub fn with_matcher_config(mut self, thresholds: MatcherConfig) -> Result<Self> {
        self.resolver = AnthologyResolver::with_config(thresholds)?;
        Ok(self)
    }

    /// Starts from an already populated cache.
    #[must_use]
    pub fn with_cache(mut self, cache: EpisodeListCache) -> Self {
        self.cache = cache;
        self
    }

    /// Episode lists fetched so far.
    pub fn cache(&self) -> &EpisodeListCache {
        &self.cache
    }

    /// Plans a move for every file in `files`, in order.
    ///
    /// A file may produce several items when it resolves to more than one
    /// episode group; only the first matched one is `Pending`, the others are
    /// `Manual` with [`ManualReason::SharedSource`]. Unsupported media types
    /// and rule-set failures become `Failed` items; they never abort the build.
    ///
    /// # Errors
    ///
    /// `KirikaeError::InvalidPlan` when `root_dir` is not absolute.
    pub fn build(&mut self, root_dir: impl Into<PathBuf>, files: Vec<MediaFile>) -> Result<RenamePlan> {
        let root_dir = root_dir.into();
        if !root_dir.is_absolute() {
            return Err(KirikaeError::InvalidPlan(format!(
                "root_dir must be an absolute path, got {}",
                root_dir.display()
            )));
        }

        let infos: Vec<Option<ShowInfo>> = files.iter().map(|file| self.show_info(file)).collect();
        for info in infos.iter().flatten() {
            let key = EpisodeKey::new(info.show.as_str(), info.season, info.year);
            if !self.cache.contains(&key) {
                self.cache.fetch(&mut *self.oracle, &key);
            }
        }

        let mut plan = RenamePlan::new(root_dir.clone(), self.rule_set.platform());
        let mut index = DestinationIndex::new(root_dir.clone());
        for (file, info) in files.into_iter().zip(infos) {
            let start = plan.items.len();
            for item in self.plan_file(file, info.as_ref(), &root_dir) {
                plan.push(item);
            }
            for idx in start..plan.items.len() {
                index.register(&mut plan.items, idx);
            }
        }
        sweep_conflicts(&mut plan);

        info!(
            plan = %plan.id,
            items = plan.items.len(),
            pending = plan.count(PlanStatus::Pending),
            manual = plan.count(PlanStatus::Manual),
            conflict = plan.count(PlanStatus::Conflict),
            failed = plan.count(PlanStatus::Failed),
            "plan built"
        );
        Ok(plan)
    }

    fn show_info(&self, file: &MediaFile) -> Option<ShowInfo> {
        let tv = file.media_type == MediaType::Tv && self.rule_set.supports_media_type(MediaType::Tv);
        tv.then(|| self.resolver.parser().show_info(file, self.config))
    }

    fn plan_file(&self, file: MediaFile, info: Option<&ShowInfo>, root_dir: &Path) -> Vec<PlanItem> {
        if !self.rule_set.supports_media_type(file.media_type) {
            let err = KirikaeError::UnsupportedMediaType {
                media_type: file.media_type,
                platform: self.rule_set.platform().to_string(),
            };
            debug!(file = %file.path.display(), "{err}");
            return vec![PlanItem::failed(file, err.to_string())];
        }
        let Some(info) = info else {
            return vec![self.place(file, root_dir, None)];
        };

        let candidates = self
            .cache
            .lookup(&info.show, info.season, info.year)
            .or_else(|| self.cache.find_by_show(&info.show))
            .map(normalize_episode_list)
            .unwrap_or_default();

        // Only the first matched resolution of a file may move it; the rest
        // stay for review with their planned destination as a guess.
        let mut source_claimed = false;
        let mut items = Vec::new();
        for resolution in self.resolver.resolve(&file, info, &self.cache, self.config) {
            let mut copy = file.clone();
            if !info.show.is_empty() {
                copy.title = Some(info.show.clone());
            }
            copy.season = copy.season.or(info.season);
            copy.year = copy.year.or(info.year);

            let resolution = match self.consult(&copy, &candidates, resolution) {
                Routed::Resolved(resolution) => resolution,
                Routed::Rejected(reason) => {
                    items.push(PlanItem::failed(copy, reason));
                    continue;
                }
            };
            let resolution = if resolution.is_manual() {
                resolution
            } else if source_claimed {
                debug!(file = %copy.path.display(), "source already claimed by an earlier item");
                Resolution::Manual {
                    reason: ManualReason::SharedSource,
                    guess: resolution.assignment().cloned(),
                }
            } else {
                source_claimed = true;
                resolution
            };
            resolution.apply_to(&mut copy);
            items.push(self.item_for(copy, &resolution, root_dir));
        }
        items
    }

    fn item_for(&self, file: MediaFile, resolution: &Resolution, root_dir: &Path) -> PlanItem {
        match resolution {
            Resolution::Manual { reason, guess } => {
                let destination = match guess {
                    Some(guess) => self.rule_set.target_path(&file, root_dir, self.config, Some(guess)),
                    None => Ok(file.path.clone()),
                };
                match destination {
                    Ok(destination) => PlanItem::manual(file, destination, reason),
                    Err(err) => PlanItem::failed(file, err.to_string()),
                }
            }
            other => self.place(file, root_dir, other.assignment()),
        }
    }

    fn place(&self, file: MediaFile, root_dir: &Path, hints: Option<&Assignment>) -> PlanItem {
        match self.rule_set.target_path(&file, root_dir, self.config, hints) {
            Ok(destination) => PlanItem::pending(file, destination),
            Err(err) => PlanItem::failed(file, err.to_string()),
        }
    }

    /// Routes a final-fallback manual resolution through the confidence
    /// oracle. Every other resolution passes through untouched.
    fn consult(&self, file: &MediaFile, candidates: &[EpisodeCandidate], resolution: Resolution) -> Routed {
        let Some(oracle) = self.confidence else {
            return Routed::Resolved(resolution);
        };
        if resolution.manual_reason() != Some(&ManualReason::NoConfidentMatch) {
            return Routed::Resolved(resolution);
        }

        let verdict = match oracle.assess(file.file_name(), candidates) {
            Ok(verdict) => verdict,
            Err(err) => {
                warn!(file = %file.path.display(), error = %err, "confidence oracle failed; keeping manual");
                return Routed::Resolved(resolution);
            }
        };
        let picked = Assignment::from_episodes(file.season, &verdict_episodes(&verdict, candidates));
        let status = route(verdict.confidence);
        debug!(
            file = %file.path.display(),
            confidence = verdict.confidence,
            status = %status,
            "oracle verdict"
        );

        match status {
            PlanStatus::Pending => Routed::Resolved(picked.map_or(resolution, Resolution::matched)),
            PlanStatus::Manual => {
                let guess = picked.or_else(|| resolution.assignment().cloned());
                Routed::Resolved(Resolution::Manual {
                    reason: ManualReason::LowOracleConfidence {
                        confidence: verdict.confidence,
                    },
                    guess,
                })
            }
            _ => Routed::Rejected(format!(
                "Oracle confidence {:.2} is below the manual-review threshold.",
                verdict.confidence
            )),
        }
    }
}

/// Candidates named by `verdict`, by number first and by title otherwise.
fn verdict_episodes(verdict: &OracleVerdict, candidates: &[EpisodeCandidate]) -> Vec<EpisodeCandidate> {
    let by_number: Vec<EpisodeCandidate> = candidates
        .iter()
        .filter(|ep| verdict.episode_numbers.contains(&ep.episode_number))
        .cloned()
        .collect();
    if !by_number.is_empty() {
        return by_number;
    }
    candidates
        .iter()
        .filter(|ep| {
            verdict
                .titles
                .iter()
                .any(|title| title.trim().eq_ignore_ascii_case(ep.title.trim()))
        })
        .cloned()
        .collect()
}
