//! Frequency-based keyword scoring with domain boosts.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use stop_words::{LANGUAGE, get};

use super::quality::TermSet;

/// Default number of keywords returned.
pub const DEFAULT_MAX_KEYWORDS: usize = 20;

/// Academic markers; a word containing one earns a boost.
const ACADEMIC_PHRASES: [&str; 13] = [
    "in this paper",
    "we propose",
    "our method",
    "experimental results",
    "conclusion",
    "future work",
    "related work",
    "methodology",
    "abstract",
    "introduction",
    "we show",
    "we demonstrate",
    "we present",
];

const TECHNICAL_BOOST: f64 = 1.5;
const ACADEMIC_BOOST: f64 = 1.2;
const LONG_WORD_BOOST: f64 = 1.1;

#[allow(clippy::expect_used)]
static WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[a-zA-Z]{3,}\b").expect("word regex is valid") // Static pattern, safe to panic
});

static STOP_WORDS: LazyLock<HashSet<String>> = LazyLock::new(|| {
    get(LANGUAGE::English)
        .into_iter()
        .map(|word| word.to_string())
        .collect()
});

/// A scored keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyword {
    /// Lowercased word.
    pub word: String,
    /// Relative frequency times boosts.
    pub score: f64,
}

/// Scores words of `text` and returns the best `max_keywords`.
///
/// Words are ASCII-alphabetic runs longer than three letters, lowercased,
/// stop words removed. The score is term frequency, boosted for words
/// overlapping a term in `terms`, academic markers and words longer than six
/// letters. Candidates are the `2 * max_keywords` most frequent words.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn extract_keywords(
    text: &str,
    max_keywords: usize,
    terms: &TermSet,
) -> Vec<Keyword> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = WORD
        .find_iter(&lower)
        .map(|found| found.as_str())
        .filter(|word| word.len() > 3 && !STOP_WORDS.contains(*word))
        .collect();
    if words.is_empty() || max_keywords == 0 {
        return Vec::new();
    }

    // (count, first position) per word
    let mut frequency: HashMap<&str, (usize, usize)> = HashMap::new();
    for (index, word) in words.iter().copied().enumerate() {
        frequency.entry(word).or_insert((0, index)).0 += 1;
    }
    let mut candidates: Vec<(&str, usize, usize)> = frequency
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    candidates.truncate(max_keywords.saturating_mul(2));

    let total = words.len() as f64;
    let mut scored: Vec<Keyword> = candidates
        .into_iter()
        .map(|(word, count, _)| {
            let mut score = count as f64 / total;
            if terms.overlaps(word) {
                score *= TECHNICAL_BOOST;
            }
            if ACADEMIC_PHRASES.iter().any(|phrase| word.contains(phrase)) {
                score *= ACADEMIC_BOOST;
            }
            if word.len() > 6 {
                score *= LONG_WORD_BOOST;
            }
            Keyword {
                word: word.to_string(),
                score,
            }
        })
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(max_keywords);
    scored
}
