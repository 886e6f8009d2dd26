use std::path::{Path, PathBuf};

use regex::Regex;

use crate::config::RuleSetConfig;
use crate::error::{KirikaeError, Result};
use crate::types::{Assignment, EpisodeSpan, MediaFile, MediaType};

/// Maps a resolved media file to its place in a platform's library layout.
pub trait RuleSet {
    /// Platform name recorded on the plan, e.g. `"plex"`.
    fn platform(&self) -> &str;

    /// Media types this rule set can place.
    fn supported_media_types(&self) -> &[MediaType];

    /// Whether `media_type` can be placed.
    fn supports_media_type(&self, media_type: MediaType) -> bool {
        self.supported_media_types().contains(&media_type)
    }

    /// Computes the destination of `file` under `base_dir`.
    ///
    /// `hints` carries the resolved episodes when the file's own fields are
    /// not enough (spans, joined titles).
    ///
    /// # Errors
    ///
    /// `KirikaeError::UnsupportedMediaType` for media types the rule set
    /// cannot place.
    fn target_path(
        &self,
        file: &MediaFile,
        base_dir: &Path,
        config: &RuleSetConfig,
        hints: Option<&Assignment>,
    ) -> Result<PathBuf>;
}

/// Plex Media Server naming.
///
/// ```text
/// TV Shows/Show Name/Season 01/Show Name - S01E05-E06 - Title A & Title B.mkv
/// Movies/Movie Name (1999)/Movie Name (1999).mkv
/// ```
pub struct PlexRuleSet {
    re_movie_paren_year: Regex,
    re_movie_dotted_year: Regex,
}

impl PlexRuleSet {
    /// Constructs the rule set with pre-compiled patterns.
    ///
    /// # Errors
    ///
    /// Returns `KirikaeError::RegexError` if a pattern fails to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            re_movie_paren_year: Regex::new(r"^(.*?)\s*\((\d{4})\)")?,
            re_movie_dotted_year: Regex::new(r"^(.*?)\.(\d{4})(?:\.|$)")?,
        })
    }

    fn tv_path(
        &self,
        file: &MediaFile,
        base_dir: &Path,
        config: &RuleSetConfig,
        hints: Option<&Assignment>,
    ) -> PathBuf {
        let show = file
            .title
            .as_deref()
            .or(config.show_name.as_deref())
            .filter(|s| !s.trim().is_empty())
            .map_or_else(|| "Unknown Show".to_string(), sanitize);

        let season = hints
            .and_then(|h| h.season)
            .or(file.season)
            .unwrap_or(1);
        let span = hints
            .map(|h| h.span)
            .unwrap_or(EpisodeSpan::Single(file.episode.unwrap_or(1)));
        let title = hints
            .map(Assignment::joined_title)
            .or_else(|| file.episode_title.clone())
            .filter(|t| !t.trim().is_empty())
            .map_or_else(|| "Unknown Episode".to_string(), |t| sanitize(&t));

        let file_name = format!(
            "{show} - {} - {title}{}",
            episode_code(season, span),
            file.extension()
        );
        base_dir
            .join("TV Shows")
            .join(&show)
            .join(format!("Season {season:02}"))
            .join(file_name)
    }

    fn movie_path(&self, file: &MediaFile, base_dir: &Path, config: &RuleSetConfig) -> PathBuf {
        let stem = file.file_stem();
        let parsed = self
            .re_movie_paren_year
            .captures(stem)
            .or_else(|| self.re_movie_dotted_year.captures(stem))
            .map(|c| (c[1].trim().replace('.', " "), c[2].parse::<u16>().ok()));

        let name = file
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| parsed.as_ref().map(|(name, _)| name.clone()))
            .unwrap_or_else(|| stem.replace('.', " "));
        let name = sanitize(&name);
        let year = config
            .movie_year
            .or(file.year)
            .or_else(|| parsed.and_then(|(_, year)| year));

        let label = match year {
            Some(year) => format!("{name} ({year})"),
            None => name,
        };
        base_dir
            .join("Movies")
            .join(&label)
            .join(format!("{label}{}", file.extension()))
    }
}

impl RuleSet for PlexRuleSet {
    fn platform(&self) -> &str {
        "plex"
    }

    fn supported_media_types(&self) -> &[MediaType] {
        &[MediaType::Tv, MediaType::Movie]
    }

    fn target_path(
        &self,
        file: &MediaFile,
        base_dir: &Path,
        config: &RuleSetConfig,
        hints: Option<&Assignment>,
    ) -> Result<PathBuf> {
        match file.media_type {
            MediaType::Tv => Ok(self.tv_path(file, base_dir, config, hints)),
            MediaType::Movie => Ok(self.movie_path(file, base_dir, config)),
            other => Err(KirikaeError::UnsupportedMediaType {
                media_type: other,
                platform: self.platform().to_string(),
            }),
        }
    }
}

/// `S01E05` or `S01E05-E06`.
fn episode_code(season: u32, span: EpisodeSpan) -> String {
    match span {
        EpisodeSpan::Single(ep) => format!("S{season:02}E{ep:02}"),
        EpisodeSpan::Range(..) => format!("S{season:02}E{span}"),
    }
}

fn sanitize(name: &str) -> String {
    name.trim().replace(['/', '\\'], "-")
}
