//! Per-paper section document: detected sections enriched with key phrases
//! and sentences, plus a summary. This is the `{stem}_sections.json` shape.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use rake::{Rake, StopWords};
use regex::Regex;
use serde::{Deserialize, Serialize};
use stop_words::{LANGUAGE, get};
use tracing::instrument;

use super::types::{Section, SectionType};

/// Key phrases kept per section.
pub const MAX_KEY_PHRASES: usize = 10;

#[allow(clippy::expect_used)]
static SENTENCE_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[.!?]+").expect("sentence boundary regex is valid") // Static pattern, safe to panic
});

/// RAKE keyword extraction with English stop words.
pub struct KeyPhraseExtractor {
    rake: Rake,
}

impl std::fmt::Debug for KeyPhraseExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPhraseExtractor").finish()
    }
}

impl Default for KeyPhraseExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyPhraseExtractor {
    /// Creates an extractor using the bundled English stop-word list.
    #[must_use]
    pub fn new() -> Self {
        let mut stop_words = StopWords::new();
        for word in get(LANGUAGE::English) {
            stop_words.insert(word);
        }
        Self {
            rake: Rake::new(stop_words),
        }
    }

    /// Returns up to [`MAX_KEY_PHRASES`] phrases, best first.
    #[must_use]
    pub fn extract(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.rake
            .run(text)
            .into_iter()
            .take(MAX_KEY_PHRASES)
            .map(|scored| scored.keyword)
            .collect()
    }
}

/// Splits text on runs of `.`, `!` or `?`, keeping trimmed non-empty pieces.
///
/// ```
/// use paperscout_core::sections::split_sentences;
///
/// assert_eq!(split_sentences("One. Two!? Three"), vec!["One", "Two", "Three"]);
/// ```
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    SENTENCE_BOUNDARY
        .split(text)
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .map(str::to_string)
        .collect()
}

/// A detected section with derived annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSection {
    /// The section itself.
    #[serde(flatten)]
    pub section: Section,
    /// RAKE key phrases of the section body.
    #[serde(default)]
    pub key_phrases: Vec<String>,
    /// Sentences of the section body.
    #[serde(default)]
    pub sentences: Vec<String>,
}

/// Totals over a document's sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSummary {
    /// Number of sections.
    pub total_sections: usize,
    /// Sections per type.
    pub section_types: BTreeMap<SectionType, usize>,
    /// Sum of section word counts.
    pub total_words: usize,
    /// Sections touching each page.
    pub page_coverage: BTreeMap<u32, usize>,
}

impl SectionSummary {
    /// Summarizes `sections`.
    #[must_use]
    pub fn from_sections<'a, I>(sections: I) -> Self
    where
        I: IntoIterator<Item = &'a Section>,
    {
        let mut summary = Self::default();
        for section in sections {
            summary.total_sections += 1;
            *summary.section_types.entry(section.section_type).or_default() += 1;
            summary.total_words += section.word_count();
            for page in section.start_page..=section.end_page {
                *summary.page_coverage.entry(page).or_default() += 1;
            }
        }
        summary
    }
}

/// Section analysis of one paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDocument {
    /// Extractor metadata (`file_name`, `page_count`, ...), plus `title` when known.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Sections in text order.
    pub sections: Vec<DocumentSection>,
    /// Totals.
    pub section_summary: SectionSummary,
}

impl SectionDocument {
    /// Annotates detected sections with key phrases and sentences.
    #[must_use]
    #[instrument(skip_all, fields(sections = sections.len()))]
    pub fn build(
        metadata: BTreeMap<String, String>,
        sections: Vec<Section>,
        phrases: &KeyPhraseExtractor,
    ) -> Self {
        let section_summary = SectionSummary::from_sections(&sections);
        let sections = sections
            .into_iter()
            .map(|section| DocumentSection {
                key_phrases: phrases.extract(section.content()),
                sentences: split_sentences(section.content()),
                section,
            })
            .collect();
        Self {
            metadata,
            sections,
            section_summary,
        }
    }

    /// Document title from metadata, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.metadata.get("title").map(String::as_str)
    }

    /// Iterates the plain sections.
    pub fn plain_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().map(|entry| &entry.section)
    }

    /// Iterates sections of one type.
    pub fn sections_of(&self, kind: SectionType) -> impl Iterator<Item = &DocumentSection> {
        self.sections
            .iter()
            .filter(move |entry| entry.section.section_type == kind)
    }
}
