//! Title normalization shared by the matcher and the resolver.

use std::collections::HashSet;

/// Lower-cases `text`, turns `-`/`_` into spaces, strips ASCII punctuation and
/// collapses whitespace.
///
/// A token ending in a single `s` (`marthas`) is followed by its split
/// possessive form (`martha s`) so either spelling can overlap.
#[must_use]
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .filter(|c| !c.is_ascii_punctuation())
        .collect();

    let mut tokens: Vec<String> = Vec::new();
    for token in cleaned.split_whitespace() {
        tokens.push(token.to_string());
        if token.chars().count() > 2 && token.ends_with('s') && !token.ends_with("es") {
            tokens.push(format!("{} s", &token[..token.len() - 1]));
        }
    }
    tokens.join(" ")
}

/// The set of tokens in [`normalize`]d `text`.
#[must_use]
pub fn normalized_tokens(text: &str) -> HashSet<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Cheap token-overlap test between a filename segment and an episode title.
///
/// At least one token must overlap. When the shorter side has two tokens or
/// fewer, every one of its tokens must overlap; otherwise two overlapping
/// tokens are enough.
#[must_use]
pub fn token_set_match(segment: &str, title: &str) -> bool {
    let seg_tokens = normalized_tokens(segment);
    let title_tokens = normalized_tokens(title);
    let overlap = seg_tokens.intersection(&title_tokens).count();
    if overlap == 0 {
        return false;
    }
    let shorter = seg_tokens.len().min(title_tokens.len());
    if shorter <= 2 {
        overlap == shorter
    } else {
        overlap >= 2
    }
}
