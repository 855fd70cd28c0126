//! Heuristic text quality scoring.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

/// Texts with fewer trimmed characters than this score all zeros.
pub const MIN_SCORABLE_CHARS: usize = 100;

/// Punctuation stripped from word edges before counting unique words.
const WORD_EDGE_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

/// Domain-specific terms counted toward technical density, keyed by domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermDictionary {
    domains: BTreeMap<String, Vec<String>>,
}

impl Default for TermDictionary {
    fn default() -> Self {
        let domains = [
            (
                "machine_learning",
                &[
                    "neural network",
                    "deep learning",
                    "algorithm",
                    "training",
                    "model",
                    "dataset",
                    "accuracy",
                    "precision",
                    "recall",
                    "f1-score",
                ][..],
            ),
            (
                "physics",
                &[
                    "quantum",
                    "particle",
                    "energy",
                    "momentum",
                    "wave function",
                    "equation",
                    "theory",
                    "experiment",
                    "measurement",
                    "observation",
                ][..],
            ),
            (
                "biology",
                &[
                    "cell",
                    "protein",
                    "gene",
                    "dna",
                    "rna",
                    "enzyme",
                    "metabolism",
                    "organism",
                    "evolution",
                    "mutation",
                ][..],
            ),
            (
                "computer_science",
                &[
                    "algorithm",
                    "complexity",
                    "data structure",
                    "programming",
                    "software",
                    "hardware",
                    "network",
                    "database",
                    "security",
                ][..],
            ),
        ];
        Self {
            domains: domains
                .into_iter()
                .map(|(domain, terms)| {
                    (
                        domain.to_string(),
                        terms.iter().map(|term| (*term).to_string()).collect(),
                    )
                })
                .collect(),
        }
    }
}

impl TermDictionary {
    /// Creates a dictionary from `domain -> terms`.
    #[must_use]
    pub fn new(domains: BTreeMap<String, Vec<String>>) -> Self {
        Self { domains }
    }

    /// Domain names.
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    /// All terms across domains, lowercased, trimmed and deduplicated.
    #[must_use]
    pub fn terms(&self) -> BTreeSet<String> {
        self.domains
            .values()
            .flatten()
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect()
    }

    /// Builds the term set used for per-word lookups.
    #[must_use]
    pub fn term_set(&self) -> TermSet {
        TermSet {
            terms: self.terms(),
        }
    }
}

/// The terms of a [`TermDictionary`], built once and reused across lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermSet {
    terms: BTreeSet<String>,
}

impl TermSet {
    /// Number of distinct terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Whether `word` contains a term or is contained in one, ignoring case.
    #[must_use]
    pub fn overlaps(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        self.terms
            .iter()
            .any(|term| term.contains(&word) || word.contains(term.as_str()))
    }
}

/// Quality scores of one text, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    /// Flesch reading ease rescaled to `[0, 1]`.
    pub readability_score: f64,
    /// Unique words over total words.
    pub word_diversity: f64,
    /// Sentence length variance over 100, capped at 1.
    pub sentence_complexity: f64,
    /// Technical term matches per word, capped at 1.
    pub technical_term_density: f64,
    /// Weighted combination of the other four.
    pub overall_quality: f64,
}

/// Scores text against a [`TermDictionary`].
#[derive(Debug, Clone)]
pub struct QualityAssessor {
    term_patterns: Vec<Regex>,
}

impl Default for QualityAssessor {
    fn default() -> Self {
        Self::new(&TermDictionary::default())
    }
}

impl QualityAssessor {
    /// Compiles one whole-word, case-insensitive matcher per distinct term.
    #[must_use]
    pub fn new(dictionary: &TermDictionary) -> Self {
        let term_patterns = dictionary
            .terms()
            .into_iter()
            .filter_map(|term| {
                Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&term)))
                    .map_err(|e| warn!(term = %term, error = %e, "skipping unmatchable term"))
                    .ok()
            })
            .collect();
        Self { term_patterns }
    }

    /// Scores `text`.
    ///
    /// Returns all zeros when the trimmed text is shorter than
    /// [`MIN_SCORABLE_CHARS`] characters.
    #[must_use]
    #[instrument(skip_all, fields(chars = text.len()))]
    #[allow(clippy::cast_precision_loss)]
    pub fn assess(&self, text: &str) -> QualityMetrics {
        if text.trim().chars().count() < MIN_SCORABLE_CHARS {
            return QualityMetrics::default();
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        let sentences = split_on_periods(text);
        if words.is_empty() || sentences.is_empty() {
            return QualityMetrics::default();
        }
        let word_total = words.len() as f64;

        let words_per_sentence = word_total / sentences.len() as f64;
        let syllables: usize = words.iter().map(|word| count_syllables(word)).sum();
        let syllables_per_word = syllables as f64 / word_total;
        let readability_score = (206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word)
            .clamp(0.0, 100.0)
            / 100.0;

        let unique: HashSet<String> = words
            .iter()
            .map(|word| word.to_lowercase().trim_matches(WORD_EDGE_PUNCTUATION).to_string())
            .collect();
        let word_diversity = unique.len() as f64 / word_total;

        let lengths: Vec<f64> = sentences
            .iter()
            .map(|sentence| sentence.split_whitespace().count() as f64)
            .collect();
        let sentence_complexity = (population_variance(&lengths) / 100.0).min(1.0);

        let technical_matches: usize = self
            .term_patterns
            .iter()
            .map(|pattern| pattern.find_iter(text).count())
            .sum();
        let technical_term_density = (technical_matches as f64 / word_total).min(1.0);

        let overall_quality = 0.30 * readability_score
            + 0.25 * word_diversity
            + 0.20 * sentence_complexity
            + 0.25 * (10.0 * technical_term_density).min(1.0);

        QualityMetrics {
            readability_score,
            word_diversity,
            sentence_complexity,
            technical_term_density,
            overall_quality,
        }
    }
}

/// Estimates syllables by counting vowel groups (`aeiouy`).
///
/// A trailing `e` drops one syllable when more than one was counted. The
/// result is at least 1.
///
/// ```
/// use paperscout_core::text::count_syllables;
///
/// assert_eq!(count_syllables("table"), 1);
/// assert_eq!(count_syllables("beautiful"), 3);
/// assert_eq!(count_syllables("rhythm"), 1);
/// ```
#[must_use]
pub fn count_syllables(word: &str) -> usize {
    let word = word.to_lowercase();
    let mut count = 0;
    let mut previous_was_vowel = false;
    for ch in word.chars() {
        let is_vowel = matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if is_vowel && !previous_was_vowel {
            count += 1;
        }
        previous_was_vowel = is_vowel;
    }
    if word.ends_with('e') && count > 1 {
        count -= 1;
    }
    count.max(1)
}

/// Non-empty, trimmed pieces of `text` split on `.`.
pub(crate) fn split_on_periods(text: &str) -> Vec<&str> {
    text.split('.')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect()
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}
