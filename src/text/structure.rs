//! Line, sentence and paragraph statistics.

use serde::Serialize;

use super::quality::{population_variance, split_on_periods};

/// Layout statistics of a text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStructure {
    pub total_lines: usize,
    pub empty_lines: usize,
    pub non_empty_lines: usize,
    pub total_sentences: usize,
    pub total_words: usize,
    pub total_paragraphs: usize,
    pub avg_sentence_length: f64,
    pub avg_paragraph_length: f64,
    pub sentence_length_variance: f64,
    pub paragraph_length_variance: f64,
}

/// Computes [`TextStructure`] for `text`.
///
/// Sentences are split on `.`, paragraphs on blank lines (`\n\n`); lengths
/// are in words.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn analyze_structure(text: &str) -> TextStructure {
    let lines: Vec<&str> = text.split('\n').collect();
    let empty_lines = lines.iter().filter(|line| line.trim().is_empty()).count();

    let sentence_lengths: Vec<f64> = split_on_periods(text)
        .iter()
        .map(|sentence| sentence.split_whitespace().count() as f64)
        .collect();
    let paragraph_lengths: Vec<f64> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .map(|paragraph| paragraph.split_whitespace().count() as f64)
        .collect();

    TextStructure {
        total_lines: lines.len(),
        empty_lines,
        non_empty_lines: lines.len() - empty_lines,
        total_sentences: sentence_lengths.len(),
        total_words: text.split_whitespace().count(),
        total_paragraphs: paragraph_lengths.len(),
        avg_sentence_length: mean(&sentence_lengths),
        avg_paragraph_length: mean(&paragraph_lengths),
        sentence_length_variance: population_variance(&sentence_lengths),
        paragraph_length_variance: population_variance(&paragraph_lengths),
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
