//! In-text citation detection.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Citation style of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationType {
    /// `(Smith, 2020)`, `(Smith et al., 2020, p. 4)`.
    AuthorYear,
    /// `[3]`, `[2-5]`.
    Numbered,
    /// Superscript digits.
    Footnote,
}

/// One citation found in a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationMention {
    /// Matched text.
    pub citation_text: String,
    /// Citation style.
    pub citation_type: CitationType,
    /// Pattern specificity in `[0, 1]`.
    pub confidence: f64,
    /// Character (code point) offset of the match.
    pub position: usize,
}

struct CitationPattern {
    regex: Regex,
    citation_type: CitationType,
    confidence: f64,
}

/// Patterns in the order they are scanned.
#[allow(clippy::expect_used)]
static CITATION_PATTERNS: LazyLock<[CitationPattern; 4]> = LazyLock::new(|| {
    let pattern = |source: &str, citation_type, confidence| CitationPattern {
        regex: Regex::new(source).expect("citation regex is valid"), // Static pattern, safe to panic
        citation_type,
        confidence,
    };
    [
        pattern(
            r"\([A-Z][a-z]+(?:\s+et\s+al\.)?,\s+\d{4}\)",
            CitationType::AuthorYear,
            0.9,
        ),
        pattern(r"\[\d+(?:-\d+)?\]", CitationType::Numbered, 0.7),
        pattern(
            r"\([A-Z][a-z]+(?:\s+et\s+al\.)?,\s+\d{4},\s+p\.\s+\d+\)",
            CitationType::AuthorYear,
            0.9,
        ),
        pattern(r"[¹²³⁴⁵⁶⁷⁸⁹⁰]+", CitationType::Footnote, 0.7),
    ]
});

/// Finds citations in `text`.
///
/// Patterns are scanned in a fixed order (author-year, numbered, author-year
/// with page, footnote). Results are grouped by pattern and ordered by
/// position within each group; sort by `position` for document order.
///
/// ```
/// use paperscout_core::text::{CitationType, extract_citations};
///
/// let found = extract_citations("See [3] and (Smith, 2020).");
/// assert_eq!(found[0].citation_type, CitationType::AuthorYear);
/// assert_eq!(found[1].citation_text, "[3]");
/// ```
#[must_use]
pub fn extract_citations(text: &str) -> Vec<CitationMention> {
    CITATION_PATTERNS
        .iter()
        .flat_map(|pattern| {
            pattern.regex.find_iter(text).map(|found| CitationMention {
                citation_text: found.as_str().to_string(),
                citation_type: pattern.citation_type,
                confidence: pattern.confidence,
                position: text[..found.start()].chars().count(),
            })
        })
        .collect()
}
