use regex::Regex;

use crate::config::RuleSetConfig;
use crate::error::Result;
use crate::types::MediaFile;

/// Show, season and year a file should be looked up under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowInfo {
    /// Show title with any trailing year removed.
    pub show: String,
    /// Season number, if known.
    pub season: Option<u32>,
    /// Release year, if known.
    pub year: Option<u16>,
}

/// Regex-based extraction of the pieces of a TV filename the resolver needs.
pub struct FilenameParser {
    re_remainder: Regex,
    re_span_qualified: Regex,
    re_span: Regex,
    re_show_season: Regex,
    re_episode: Regex,
    re_trailing_year: Regex,
}

impl FilenameParser {
    /// Constructs a parser with pre-compiled patterns.
    ///
    /// # Errors
    ///
    /// Returns `KirikaeError::RegexError` if a pattern fails to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            re_remainder: Regex::new(r"(?i)S\d{2}E\d{2}(?:[-–]E?\d{2})?[-_ ]?(.*)")?,
            re_span_qualified: Regex::new(r"(?i)S(\d{2})E(\d{2,4})-(?:E)?(\d{2,4})")?,
            re_span: Regex::new(r"E(\d+)[-–]E?(\d+)")?,
            re_show_season: Regex::new(
                r"(?i)^(?P<show>.+?)[ ._-]+S(?P<season>\d{1,2})E(?P<episode>\d{2,4})",
            )?,
            re_episode: Regex::new(r"(?i)S\d{1,2}E(\d{2,4})")?,
            re_trailing_year: Regex::new(r"^(.+?)[ (._-]*([12][09][0-9]{2})[ )_.-]*$")?,
        })
    }

    /// The story-title part of the filename, after the `SxxEyy` code.
    ///
    /// `"Show-S01E01-Segment A and Segment B.mp4"` gives
    /// `"Segment A and Segment B"`. Falls back to everything after the first
    /// dash, then to the file's title with any preamble removed.
    #[must_use]
    pub fn title_remainder(&self, file: &MediaFile) -> String {
        let stem = file.file_stem();
        let source = match self.re_remainder.captures(stem).and_then(|c| c.get(1)) {
            Some(m) if !m.as_str().is_empty() => m.as_str(),
            _ => stem.split_once('-').map_or(stem, |(_, rest)| rest),
        };

        let trimmed = source.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
        file.title
            .as_deref()
            .map(strip_preamble)
            .unwrap_or_default()
            .to_string()
    }

    /// An explicit episode range such as `S01E05-E06` or `E05–06`.
    #[must_use]
    pub fn dash_span(&self, file_name: &str) -> Option<(u32, u32)> {
        if let Some(caps) = self.re_span_qualified.captures(file_name) {
            return Some((caps[2].parse().ok()?, caps[3].parse().ok()?));
        }
        let caps = self.re_span.captures(file_name)?;
        Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
    }

    /// The episode number of the first `SxxEyy` code.
    #[must_use]
    pub fn declared_episode(&self, file_name: &str) -> Option<u32> {
        self.re_episode
            .captures(file_name)
            .and_then(|c| c[1].parse().ok())
    }

    /// `(show, season)` from a `Show Name - S01E02` style name.
    #[must_use]
    pub fn show_season(&self, file_name: &str) -> Option<(String, u32)> {
        let caps = self.re_show_season.captures(file_name)?;
        let show = caps["show"].trim_end_matches([' ', '.', '-', '_']).to_string();
        let season = caps["season"].parse().ok()?;
        Some((show, season))
    }

    /// Splits a trailing release year off a show name.
    ///
    /// `"Danger Mouse (2015)"` gives `("Danger Mouse", Some(2015))`.
    #[must_use]
    pub fn split_year(&self, show: &str) -> (String, Option<u16>) {
        match self.re_trailing_year.captures(show) {
            Some(caps) => (caps[1].trim().to_string(), caps[2].parse().ok()),
            None => (show.to_string(), None),
        }
    }

    /// Decides the lookup key for `file`.
    ///
    /// Show: the file's title, the configured show name, the filename, then
    /// the parent directory. Season: the file, the configuration, then the
    /// filename. Year: the file, then a year trailing the show name.
    #[must_use]
    pub fn show_info(&self, file: &MediaFile, config: &RuleSetConfig) -> ShowInfo {
        let parsed = self.show_season(file.file_name());

        let show = non_empty(file.title.as_deref())
            .or_else(|| non_empty(config.show_name.as_deref()))
            .map(str::to_string)
            .or_else(|| parsed.as_ref().map(|(show, _)| show.clone()))
            .filter(|show| !show.is_empty())
            .or_else(|| {
                file.path
                    .parent()
                    .and_then(|p| p.file_name())
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
            })
            .unwrap_or_default();
        let (show, year_in_name) = self.split_year(&show);

        let season = file
            .season
            .or(config.season)
            .or_else(|| parsed.map(|(_, season)| season));

        ShowInfo {
            show,
            season,
            year: file.year.or(year_in_name),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Drops a leading `"Show - "` style preamble from a title.
fn strip_preamble(title: &str) -> &str {
    for delimiter in [" - ", "—", "–", ":"] {
        if let Some((_, rest)) = title.split_once(delimiter) {
            return rest.trim();
        }
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MediaType;

    fn parser() -> FilenameParser {
        FilenameParser::new().unwrap()
    }

    fn tv(path: &str) -> MediaFile {
        MediaFile::new(path, MediaType::Tv)
    }

    #[test]
    fn remainder_after_episode_code() {
        let file = tv("/tv/Paw Patrol-S01E01-Pups And The Kitty Tastrophe Pups Save A Train.mp4");
        assert_eq!(
            parser().title_remainder(&file),
            "Pups And The Kitty Tastrophe Pups Save A Train"
        );

        let file = tv("/tv/Show-S01E05-E06-First Story.mkv");
        assert_eq!(parser().title_remainder(&file), "First Story");
    }

    #[test]
    fn remainder_falls_back_to_dash_then_title() {
        assert_eq!(parser().title_remainder(&tv("/tv/Show-Some Story.mkv")), "Some Story");

        let file = tv("/tv/S01E01-.mkv").with_title("Paw Patrol - Pups Save a Train");
        assert_eq!(parser().title_remainder(&file), "Pups Save a Train");
    }

    #[test]
    fn dash_span_forms() {
        let p = parser();
        assert_eq!(p.dash_span("Show-S01E05-E06.mkv"), Some((5, 6)));
        assert_eq!(p.dash_span("Show-S01E05-06.mkv"), Some((5, 6)));
        assert_eq!(p.dash_span("Show E07–E09.mkv"), Some((7, 9)));
        assert_eq!(p.dash_span("Show-S01E01-Pups.mkv"), None);
    }

    #[test]
    fn show_season_and_year() {
        let p = parser();
        assert_eq!(
            p.show_season("Danger Mouse 2015 - S02E03 - Title.mkv"),
            Some(("Danger Mouse 2015".to_string(), 2))
        );
        assert_eq!(
            p.split_year("Danger Mouse (2015)"),
            ("Danger Mouse".to_string(), Some(2015))
        );
        assert_eq!(p.split_year("Paw Patrol"), ("Paw Patrol".to_string(), None));
        assert_eq!(p.declared_episode("Show.S01E12.mkv"), Some(12));
    }

    #[test]
    fn show_info_precedence() {
        let p = parser();
        let config = RuleSetConfig::new().with_show_name("Configured").with_season(4);

        let file = tv("/tv/Folder/Parsed Show 2013 - S02E01.mkv");
        let info = p.show_info(&file, &RuleSetConfig::new());
        assert_eq!(info.show, "Parsed Show");
        assert_eq!(info.season, Some(2));
        assert_eq!(info.year, Some(2013));

        let info = p.show_info(&file, &config);
        assert_eq!(info.show, "Configured");
        assert_eq!(info.season, Some(4));

        let file = tv("/tv/Folder Show/random.mkv");
        let info = p.show_info(&file, &RuleSetConfig::new());
        assert_eq!(info.show, "Folder Show");
        assert_eq!(info.season, None);

        let file = tv("/tv/x.mkv").with_title("Titled").with_season(7);
        let info = p.show_info(&file, &config);
        assert_eq!((info.show.as_str(), info.season), ("Titled", Some(7)));
    }
}
