use regex::Regex;

use crate::error::Result;

const TRIM_CHARS: &[char] = &[' ', '-', '_'];

/// Splits an anthology title remainder into its story segments.
///
/// Tried in order:
/// 1. explicit delimiters (`" and "`, `" & "`, runs of two or more spaces);
/// 2. a repeated first word (`"Pups Fall Pups Save"` splits before the second `Pups`);
/// 3. the whole trimmed title as one segment.
pub struct SegmentSplitter {
    re_delimiter: Regex,
    re_token: Regex,
}

impl SegmentSplitter {
    /// Constructs a splitter with pre-compiled patterns.
    ///
    /// # Errors
    ///
    /// Returns `KirikaeError::RegexError` if a pattern fails to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            re_delimiter: Regex::new(r"(?i) and | & |\s{2,}")?,
            re_token: Regex::new(r"\S+")?,
        })
    }

    /// Splits `title` into segments. Empty input yields no segments.
    #[must_use]
    pub fn split<'a>(&self, title: &'a str) -> Segments<'a> {
        Segments {
            inner: self.boundaries(title).into_iter(),
        }
    }

    fn boundaries<'a>(&self, title: &'a str) -> Vec<&'a str> {
        let delimited: Vec<&str> = self
            .re_delimiter
            .split(title)
            .map(|piece| piece.trim_matches(TRIM_CHARS))
            .filter(|piece| !piece.is_empty())
            .collect();
        if delimited.len() >= 2 {
            return delimited;
        }

        if let Some(halves) = self.split_on_repeated_first_word(title) {
            return halves;
        }

        let whole = title.trim_matches(TRIM_CHARS);
        if whole.is_empty() {
            Vec::new()
        } else {
            vec![whole]
        }
    }

    fn split_on_repeated_first_word<'a>(&self, title: &'a str) -> Option<Vec<&'a str>> {
        let mut tokens = self.re_token.find_iter(title);
        let first = tokens.next()?.as_str().to_lowercase();
        let repeat = tokens.find(|m| m.as_str().to_lowercase() == first)?;

        let prefix = title[..repeat.start()].trim_matches(TRIM_CHARS);
        let suffix = title[repeat.start()..].trim_matches(TRIM_CHARS);
        if prefix.is_empty() || suffix.is_empty() {
            None
        } else {
            Some(vec![prefix, suffix])
        }
    }
}

/// Ordered segments of one title. Cloning restarts iteration from the
/// clone's current position.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    inner: std::vec::IntoIter<&'a str>,
}

impl<'a> Iterator for Segments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Segments<'_> {}
