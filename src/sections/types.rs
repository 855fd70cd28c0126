//! Section types and the [`Section`] record.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Logical role of a section within a research paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    /// Abstract or summary.
    Abstract,
    /// Introduction.
    Introduction,
    /// Related work, literature review or background.
    RelatedWork,
    /// Methodology, methods or approach.
    Methodology,
    /// Experiments, experimental setup or evaluation.
    Experiments,
    /// Results or findings.
    Results,
    /// Discussion or analysis.
    Discussion,
    /// Conclusion(s).
    Conclusion,
    /// References or bibliography.
    References,
    /// Appendix or appendices.
    Appendix,
    /// Header-like line that matched no known family.
    Unknown,
}

impl SectionType {
    /// Every variant, in header-matching priority order (`Unknown` last).
    pub const ALL: [Self; 11] = [
        Self::Abstract,
        Self::Introduction,
        Self::RelatedWork,
        Self::Methodology,
        Self::Experiments,
        Self::Results,
        Self::Discussion,
        Self::Conclusion,
        Self::References,
        Self::Appendix,
        Self::Unknown,
    ];

    /// Returns the serialized name, e.g. `related_work`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Abstract => "abstract",
            Self::Introduction => "introduction",
            Self::RelatedWork => "related_work",
            Self::Methodology => "methodology",
            Self::Experiments => "experiments",
            Self::Results => "results",
            Self::Discussion => "discussion",
            Self::Conclusion => "conclusion",
            Self::References => "references",
            Self::Appendix => "appendix",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a serialized name. Unrecognized input yields `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contiguous span of extracted text belonging to one logical section.
///
/// `word_count` always equals the number of whitespace-separated tokens in
/// `content`. It is recomputed by [`Section::set_content`] and on
/// deserialization, so a stored count is never trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SectionRecord")]
pub struct Section {
    /// Header line as detected, trimmed.
    pub title: String,
    /// Classified role.
    #[serde(rename = "type")]
    pub section_type: SectionType,
    content: String,
    /// Page on which the header appears.
    pub start_page: u32,
    /// Page on which the section ends.
    pub end_page: u32,
    word_count: usize,
    /// Source line span `[header line, next header or end)`.
    #[serde(skip)]
    pub line_span: Range<usize>,
}

impl Section {
    /// Creates a section, deriving its word count from `content`.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        section_type: SectionType,
        content: impl Into<String>,
        start_page: u32,
        end_page: u32,
    ) -> Self {
        let content = content.into();
        Self {
            title: title.into(),
            section_type,
            word_count: count_words(&content),
            content,
            start_page,
            end_page,
            line_span: 0..0,
        }
    }

    /// Sets the source line span.
    #[must_use]
    pub fn with_line_span(mut self, line_span: Range<usize>) -> Self {
        self.line_span = line_span;
        self
    }

    /// Body text of the section.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whitespace-separated tokens in the body.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Replaces the body and recomputes the word count.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.word_count = count_words(&self.content);
    }
}

/// Wire form of [`Section`]; any stored `wordCount` is ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SectionRecord {
    title: String,
    #[serde(rename = "type")]
    section_type: SectionType,
    #[serde(default)]
    content: String,
    start_page: u32,
    end_page: u32,
}

impl From<SectionRecord> for Section {
    fn from(record: SectionRecord) -> Self {
        Self::new(
            record.title,
            record.section_type,
            record.content,
            record.start_page,
            record.end_page,
        )
    }
}

pub(crate) fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
