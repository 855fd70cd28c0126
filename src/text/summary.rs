//! Extractive summaries.

use super::citations::extract_citations;
use super::keywords::extract_keywords;
use super::quality::{TermSet, split_on_periods};

/// Default number of sentences in a summary.
pub const DEFAULT_SUMMARY_SENTENCES: usize = 5;

/// Keywords considered per sentence when scoring.
const KEYWORDS_PER_SENTENCE: usize = 5;

/// Picks up to `max_sentences` sentences of `text`, kept in original order.
///
/// Sentences are split on `.`. When there are no more than `max_sentences`,
/// all are kept. Otherwise each is scored: +1 for 10 to 30 words (+0.5 when
/// longer), +0.5 per keyword, +0.3 per citation, +0.5 when in the first or
/// last fifth of the text. Ties keep the earlier sentence.
///
/// Returns an empty string when `text` has no sentences.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(text: &str, max_sentences: usize, terms: &TermSet) -> String {
    let sentences = split_on_periods(text);
    if sentences.is_empty() || max_sentences == 0 {
        return String::new();
    }
    if sentences.len() <= max_sentences {
        return join_sentences(&sentences);
    }

    let count = sentences.len() as f64;
    let mut scored: Vec<(usize, f64)> = sentences
        .iter()
        .enumerate()
        .map(|(index, sentence)| {
            let mut score = 0.0;
            let words = sentence.split_whitespace().count();
            if (10..=30).contains(&words) {
                score += 1.0;
            } else if words > 30 {
                score += 0.5;
            }
            score += 0.5 * extract_keywords(sentence, KEYWORDS_PER_SENTENCE, terms).len() as f64;
            score += 0.3 * extract_citations(sentence).len() as f64;
            let position = index as f64;
            if position < count * 0.2 || position > count * 0.8 {
                score += 0.5;
            }
            (index, score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    let mut chosen: Vec<usize> = scored
        .into_iter()
        .take(max_sentences)
        .map(|(index, _)| index)
        .collect();
    chosen.sort_unstable();

    let picked: Vec<&str> = chosen.into_iter().map(|index| sentences[index]).collect();
    join_sentences(&picked)
}

fn join_sentences(sentences: &[&str]) -> String {
    format!("{}.", sentences.join(". "))
}
