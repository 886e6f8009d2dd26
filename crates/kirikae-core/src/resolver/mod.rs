//! # Anthology Resolver
//!
//! Turns one TV file plus its season's episode list into one or more
//! [`Resolution`]s. The work is an ordered chain of named strategies; the
//! first strategy that produces anything wins, and a final fallback always
//! produces exactly one `Manual` resolution.
//!
//! ```rust
//! use kirikae_core::oracle::{EpisodeKey, EpisodeListCache};
//! use kirikae_core::resolver::AnthologyResolver;
//! use kirikae_core::{EpisodeCandidate, MediaFile, MediaType, RuleSetConfig};
//!
//! let resolver = AnthologyResolver::new().unwrap();
//! let file = MediaFile::new(
//!     "/tv/Paw Patrol-S01E01-Pups And The Kitty Tastrophe Pups Save A Train.mp4",
//!     MediaType::Tv,
//! );
//! let config = RuleSetConfig::new().with_anthology(true);
//! let info = resolver.parser().show_info(&file, &config);
//!
//! let mut cache = EpisodeListCache::new();
//! cache.insert(
//!     EpisodeKey::new("Paw Patrol", Some(1), None),
//!     vec![
//!         EpisodeCandidate::new(1, 5, "Pups and the Kitty-tastrophe"),
//!         EpisodeCandidate::new(1, 6, "Pups Save a Train"),
//!     ],
//! );
//!
//! let resolutions = resolver.resolve(&file, &info, &cache, &config);
//! let span = resolutions[0].assignment().unwrap().span;
//! assert_eq!(span.to_string(), "05-E06");
//! ```

pub mod anthology;
pub mod filename;
pub mod span;

pub use filename::{FilenameParser, ShowInfo};

use tracing::debug;

use crate::config::{MatcherConfig, RuleSetConfig};
use crate::error::Result;
use crate::matching::{EpisodeMatcher, SegmentSplitter};
use crate::oracle::EpisodeListCache;
use crate::types::{EpisodeCandidate, MediaFile, Resolution, normalize_episode_list};

/// Everything a strategy may look at for one file.
pub struct ResolveContext<'a> {
    /// The file being resolved.
    pub file: &'a MediaFile,
    /// Run configuration.
    pub config: &'a RuleSetConfig,
    /// Lookup key the episode list was fetched under.
    pub info: &'a ShowInfo,
    /// Story segments of the title remainder.
    pub segments: Vec<&'a str>,
    /// The season's episodes with specials removed.
    pub episodes: Vec<EpisodeCandidate>,
    /// Every list fetched during this run.
    pub cache: &'a EpisodeListCache,
    /// Explicit episode range in the filename.
    pub dash_span: Option<(u32, u32)>,
    /// Episode number the file claims for itself.
    pub declared_episode: Option<u32>,
    /// Shared matcher.
    pub matcher: &'a EpisodeMatcher,
    /// Score cut-offs.
    pub thresholds: &'a MatcherConfig,
}

/// Ordered strategy chain for TV episode resolution.
pub struct AnthologyResolver {
    splitter: SegmentSplitter,
    matcher: EpisodeMatcher,
    parser: FilenameParser,
    thresholds: MatcherConfig,
}

impl AnthologyResolver {
    /// Constructs a resolver with default thresholds.
    ///
    /// # Errors
    ///
    /// Returns `KirikaeError::RegexError` if a pattern fails to compile.
    pub fn new() -> Result<Self> {
        Self::with_config(MatcherConfig::default())
    }

    /// Constructs a resolver with custom thresholds.
    ///
    /// # Errors
    ///
    /// Returns `KirikaeError::RegexError` if a pattern fails to compile.
    pub fn with_config(thresholds: MatcherConfig) -> Result<Self> {
        Ok(Self {
            splitter: SegmentSplitter::new()?,
            matcher: EpisodeMatcher::with_config(&thresholds)?,
            parser: FilenameParser::new()?,
            thresholds,
        })
    }

    /// The filename parser used to derive show, season and segments.
    pub fn parser(&self) -> &FilenameParser {
        &self.parser
    }

    /// Builds the strategy input for `file` from an already extracted title
    /// `remainder`.
    pub fn context<'a>(
        &'a self,
        file: &'a MediaFile,
        remainder: &'a str,
        info: &'a ShowInfo,
        cache: &'a EpisodeListCache,
        config: &'a RuleSetConfig,
    ) -> ResolveContext<'a> {
        let episodes = cache
            .lookup(&info.show, info.season, info.year)
            .map(normalize_episode_list)
            .unwrap_or_default();
        let file_name = file.file_name();

        ResolveContext {
            file,
            config,
            info,
            segments: self.splitter.split(remainder).collect(),
            episodes,
            cache,
            dash_span: self.parser.dash_span(file_name),
            declared_episode: file.episode.or_else(|| self.parser.declared_episode(file_name)),
            matcher: &self.matcher,
            thresholds: &self.thresholds,
        }
    }

    /// Resolves `file`. Never returns an empty list.
    pub fn resolve(
        &self,
        file: &MediaFile,
        info: &ShowInfo,
        cache: &EpisodeListCache,
        config: &RuleSetConfig,
    ) -> Vec<Resolution> {
        let remainder = self.parser.title_remainder(file);
        let ctx = self.context(file, &remainder, info, cache, config);
        debug!(
            file = %file.path.display(),
            segments = ?ctx.segments,
            episodes = ctx.episodes.len(),
            "resolving"
        );

        for (name, strategy) in anthology::STRATEGIES {
            match strategy(&ctx) {
                Some(resolutions) if !resolutions.is_empty() => {
                    debug!(
                        file = %file.path.display(),
                        strategy = name,
                        count = resolutions.len(),
                        "strategy matched"
                    );
                    return resolutions;
                }
                _ => debug!(strategy = name, "strategy declined"),
            }
        }

        debug!(file = %file.path.display(), "falling back to manual review");
        vec![anthology::final_fallback(&ctx)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::EpisodeKey;
    use crate::types::{EpisodeSpan, ManualReason, MediaType};

    fn paw_patrol_cache() -> EpisodeListCache {
        let mut cache = EpisodeListCache::new();
        cache.insert(
            EpisodeKey::new("Paw Patrol", Some(1), None),
            vec![
                EpisodeCandidate::new(1, 5, "Pups and the Kitty-tastrophe"),
                EpisodeCandidate::new(1, 6, "Pups Save a Train"),
            ],
        );
        cache
    }

    #[test]
    fn paw_patrol_resolves_to_span() {
        let resolver = AnthologyResolver::new().unwrap();
        let file = MediaFile::new(
            "/tv/Paw Patrol-S01E01-Pups And The Kitty Tastrophe Pups Save A Train.mp4",
            MediaType::Tv,
        );
        let config = RuleSetConfig::new().with_anthology(true);
        let info = resolver.parser().show_info(&file, &config);
        assert_eq!(info.show, "Paw Patrol");
        assert_eq!(info.season, Some(1));

        let resolutions = resolver.resolve(&file, &info, &paw_patrol_cache(), &config);
        assert_eq!(resolutions.len(), 1);
        let resolution = &resolutions[0];
        assert!(matches!(resolution, Resolution::SpanMatch(_)));
        let assignment = resolution.assignment().unwrap();
        assert_eq!(assignment.span, EpisodeSpan::Range(5, 6));
        assert_eq!(
            assignment.joined_title(),
            "Pups and the Kitty-tastrophe & Pups Save a Train"
        );
    }

    #[test]
    fn no_episode_list_ends_in_manual_without_guess() {
        let resolver = AnthologyResolver::new().unwrap();
        let file = MediaFile::new("/tv/Unknown Show-S01E01-Something.mkv", MediaType::Tv);
        let config = RuleSetConfig::new();
        let info = resolver.parser().show_info(&file, &config);

        let resolutions = resolver.resolve(&file, &info, &EpisodeListCache::new(), &config);
        assert_eq!(
            resolutions,
            vec![Resolution::Manual {
                reason: ManualReason::NoConfidentMatch,
                guess: None,
            }]
        );
    }

    #[test]
    fn regular_episode_matches_by_title() {
        let resolver = AnthologyResolver::new().unwrap();
        let mut cache = EpisodeListCache::new();
        cache.insert(
            EpisodeKey::new("Sea Tales", Some(1), None),
            vec![
                EpisodeCandidate::new(1, 1, "Ghost Ship"),
                EpisodeCandidate::new(1, 2, "Big Race"),
            ],
        );
        let file = MediaFile::new("/tv/Sea Tales - S01E02 - Big Race.mkv", MediaType::Tv);
        let config = RuleSetConfig::new();
        let info = resolver.parser().show_info(&file, &config);

        let resolutions = resolver.resolve(&file, &info, &cache, &config);
        assert_eq!(resolutions.len(), 1);
        let assignment = resolutions[0].assignment().unwrap();
        assert_eq!(assignment.span, EpisodeSpan::Single(2));
        assert!(!resolutions[0].is_manual());
    }
}
