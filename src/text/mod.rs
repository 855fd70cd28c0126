//! Text quality scoring, citation detection and related text statistics.
//!
//! [`TextProcessor`] bundles a [`TermDictionary`] with the scorers that use
//! it; the free functions work on their own.
//!
//! # Example
//!
//! ```
//! use paperscout_core::text::{QualityMetrics, TextProcessor};
//!
//! let processor = TextProcessor::default();
//! assert_eq!(processor.assess_quality("too short"), QualityMetrics::default());
//! ```

mod citations;
mod keywords;
mod quality;
mod structure;
mod summary;

use serde::Serialize;
use tracing::instrument;

pub use citations::{CitationMention, CitationType, extract_citations};
pub use keywords::{DEFAULT_MAX_KEYWORDS, Keyword, extract_keywords};
pub use quality::{
    MIN_SCORABLE_CHARS, QualityAssessor, QualityMetrics, TermDictionary, TermSet, count_syllables,
};
pub use structure::{TextStructure, analyze_structure};
pub use summary::{DEFAULT_SUMMARY_SENTENCES, summarize};

/// Everything the processor derives from one text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnalysis {
    pub quality_metrics: QualityMetrics,
    pub citations: Vec<CitationMention>,
    pub keywords: Vec<Keyword>,
    pub summary: String,
    pub structure: TextStructure,
}

/// Text analysis configured with a term dictionary.
#[derive(Debug, Clone)]
pub struct TextProcessor {
    dictionary: TermDictionary,
    terms: TermSet,
    assessor: QualityAssessor,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new(TermDictionary::default())
    }
}

impl TextProcessor {
    /// Creates a processor for `dictionary`.
    #[must_use]
    pub fn new(dictionary: TermDictionary) -> Self {
        Self {
            assessor: QualityAssessor::new(&dictionary),
            terms: dictionary.term_set(),
            dictionary,
        }
    }

    /// The configured dictionary.
    #[must_use]
    pub fn dictionary(&self) -> &TermDictionary {
        &self.dictionary
    }

    /// Terms of the dictionary, built once at construction.
    #[must_use]
    pub fn terms(&self) -> &TermSet {
        &self.terms
    }

    /// See [`QualityAssessor::assess`].
    #[must_use]
    pub fn assess_quality(&self, text: &str) -> QualityMetrics {
        self.assessor.assess(text)
    }

    /// See [`extract_keywords`].
    #[must_use]
    pub fn keywords(&self, text: &str, max_keywords: usize) -> Vec<Keyword> {
        extract_keywords(text, max_keywords, &self.terms)
    }

    /// See [`summarize`].
    #[must_use]
    pub fn summarize(&self, text: &str, max_sentences: usize) -> String {
        summarize(text, max_sentences, &self.terms)
    }

    /// Runs every analysis with default limits.
    #[must_use]
    #[instrument(skip_all, fields(chars = text.len()))]
    pub fn analyze(&self, text: &str) -> TextAnalysis {
        TextAnalysis {
            quality_metrics: self.assess_quality(text),
            citations: extract_citations(text),
            keywords: self.keywords(text, DEFAULT_MAX_KEYWORDS),
            summary: self.summarize(text, DEFAULT_SUMMARY_SENTENCES),
            structure: analyze_structure(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_bundles_results() {
        let text = "Deep learning models need large datasets (Smith, 2020). \
            We evaluate the model on three benchmarks [4]. \
            Accuracy improves by a significant margin over the baseline algorithm.";
        let analysis = TextProcessor::default().analyze(text);

        assert_eq!(analysis.citations.len(), 2);
        assert!(analysis.quality_metrics.overall_quality > 0.0);
        assert!(!analysis.keywords.is_empty());
        assert_eq!(analysis.structure.total_sentences, 3);
        assert!(analysis.summary.starts_with("Deep learning models"));
    }

    #[test]
    fn test_custom_dictionary_changes_density() {
        let text = "The catalyst and the reagent reacted quickly in the flask while we watched the \
            colour change from clear to a deep amber over several minutes.";
        let default_density = TextProcessor::default()
            .assess_quality(text)
            .technical_term_density;

        let mut domains = std::collections::BTreeMap::new();
        domains.insert("chemistry".to_string(), vec!["catalyst".to_string(), "reagent".to_string()]);
        let custom_density = TextProcessor::new(TermDictionary::new(domains))
            .assess_quality(text)
            .technical_term_density;

        assert!(default_density.abs() < f64::EPSILON);
        assert!(custom_density > 0.0);
    }

    #[test]
    fn test_keywords_use_terms_built_at_construction() {
        let mut domains = std::collections::BTreeMap::new();
        domains.insert("chemistry".to_string(), vec![" Catalyst ".to_string()]);
        let processor = TextProcessor::new(TermDictionary::new(domains));
        assert_eq!(processor.terms().len(), 1);
        assert_eq!(processor.terms(), &processor.dictionary().term_set());

        let boosted = processor.keywords("banana catalyst", 5);
        let plain = TextProcessor::default().keywords("banana catalyst", 5);
        assert_eq!(boosted[0].word, "catalyst");
        assert!((boosted[0].score - 0.5 * 1.5 * 1.1).abs() < 1e-12);
        assert!((plain[0].score - 0.5 * 1.1).abs() < 1e-12);
    }
}
