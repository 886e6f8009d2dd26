//! Fuzzy similarity metrics on a 0-100 scale.
//!
//! The ratios are Indel ratios, `2 * LCS / (len_a + len_b)`, so a short text
//! that is a prefix of a longer title still scores well. All metrics
//! lower-case their inputs and treat any non-alphanumeric character as a
//! token separator. An empty side always scores 0.

use std::collections::BTreeSet;

use super::normalize::normalize;

fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn process(text: &str) -> String {
    tokens(text).join(" ")
}

/// Length of the longest common subsequence.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diagonal = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

fn indel_ratio(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let total = (a.len() + b.len()) as f64;
    200.0 * lcs_len(a, b) as f64 / total
}

fn raw_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    indel_ratio(&a, &b)
}

/// Indel similarity of the two processed strings.
#[must_use]
pub fn ratio(a: &str, b: &str) -> f64 {
    raw_ratio(&process(a), &process(b))
}

/// Best [`ratio`] of the shorter string against every same-length window of
/// the longer one.
#[must_use]
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a = process(a);
    let b = process(b);
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0.0;
    }

    let mut best = 0.0_f64;
    for window in long.windows(short.len()) {
        let score = indel_ratio(&short, window);
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

/// [`ratio`] after sorting each side's tokens alphabetically.
#[must_use]
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let mut ta = tokens(a);
    let mut tb = tokens(b);
    ta.sort();
    tb.sort();
    raw_ratio(&ta.join(" "), &tb.join(" "))
}

/// Set-based similarity: compares the shared tokens against each side's
/// shared-plus-remaining tokens.
///
/// Scores 100 when one side's token set contains the other's.
#[must_use]
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let sa: BTreeSet<String> = tokens(a).into_iter().collect();
    let sb: BTreeSet<String> = tokens(b).into_iter().collect();
    if sa.is_empty() || sb.is_empty() {
        return 0.0;
    }

    let join = |set: Vec<&String>| {
        set.into_iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    };
    let sect = join(sa.intersection(&sb).collect());
    let diff_ab = join(sa.difference(&sb).collect());
    let diff_ba = join(sb.difference(&sa).collect());

    if !sect.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 100.0;
    }

    let combine = |diff: &str| {
        if sect.is_empty() {
            diff.to_string()
        } else {
            format!("{sect} {diff}")
        }
    };
    let combined_ab = combine(&diff_ab);
    let combined_ba = combine(&diff_ba);

    raw_ratio(&sect, &combined_ab)
        .max(raw_ratio(&sect, &combined_ba))
        .max(raw_ratio(&combined_ab, &combined_ba))
}

/// Characters covered by the Ratcliff/Obershelp matching blocks: the longest
/// common substring, then the same search on both sides of it.
fn matching_blocks_len(a: &[char], b: &[char]) -> usize {
    let (mut len, mut at_a, mut at_b) = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        let mut row = vec![0usize; b.len() + 1];
        for (j, &cb) in b.iter().enumerate() {
            if ca == cb {
                row[j + 1] = prev[j] + 1;
                if row[j + 1] > len {
                    len = row[j + 1];
                    at_a = i + 1 - len;
                    at_b = j + 1 - len;
                }
            }
        }
        prev = row;
    }
    if len == 0 {
        return 0;
    }
    len + matching_blocks_len(&a[..at_a], &b[..at_b])
        + matching_blocks_len(&a[at_a + len..], &b[at_b + len..])
}

/// Sequence similarity in `[0.0, 1.0]` between two [`normalize`]d strings,
/// `2 * M / T` over the Ratcliff/Obershelp matching blocks.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = normalize(a).chars().collect();
    let b: Vec<char> = normalize(b).chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    2.0 * matching_blocks_len(&a, &b) as f64 / (a.len() + b.len()) as f64
}
