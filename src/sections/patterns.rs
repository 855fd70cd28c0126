//! Header classification and page-marker recognition.

use std::sync::LazyLock;

use regex::Regex;

use super::types::SectionType;

/// Confidence of an exact header match.
pub const EXACT_CONFIDENCE: f64 = 1.0;

/// Confidence of a numbered header (`2. Methods`, `IV Results`).
pub const NUMBERED_CONFIDENCE: f64 = 0.8;

/// Header families in priority order. `summary` appears under both abstract
/// and conclusion; abstract wins.
const FAMILIES: [(SectionType, &str); 10] = [
    (SectionType::Abstract, r"abstract|a b s t r a c t|summary"),
    (SectionType::Introduction, r"introduction|1\s+introduction|i\s+introduction"),
    (
        SectionType::RelatedWork,
        r"related\s+work|literature\s+review|background|2\s+related\s+work",
    ),
    (SectionType::Methodology, r"methodology|methods|method|approach|3\s+methodology"),
    (
        SectionType::Experiments,
        r"experiments?|experimental\s+setup|evaluation|4\s+experiments?",
    ),
    (SectionType::Results, r"results|findings|5\s+results"),
    (SectionType::Discussion, r"discussion|analysis|6\s+discussion"),
    (SectionType::Conclusion, r"conclusion|conclusions|summary|7\s+conclusion"),
    (SectionType::References, r"references|bibliography|8\s+references"),
    (SectionType::Appendix, r"appendix|appendices|a\s+appendix"),
];

#[allow(clippy::expect_used)]
static FAMILY_PATTERNS: LazyLock<Vec<(SectionType, Regex)>> = LazyLock::new(|| {
    FAMILIES
        .iter()
        .map(|(kind, alternatives)| {
            let pattern = Regex::new(&format!("^(?:{alternatives})$"))
                .expect("header family regex is valid"); // Static pattern, safe to panic
            (*kind, pattern)
        })
        .collect()
});

#[allow(clippy::expect_used)]
static NUMBERED_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+|[ivx]+)\.?\s+(.+)$").expect("numbered header regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static PAGE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*-+\s*page\s+(\d+)\s*-+\s*$").expect("page marker regex is valid") // Static pattern, safe to panic
});

/// Returns the default page-boundary pattern, matching `--- Page N ---`.
///
/// Capture group 1 holds the page number.
#[must_use]
pub fn default_page_marker() -> Regex {
    PAGE_MARKER.clone()
}

/// Classifies a line as a section header.
///
/// Exact family matches score [`EXACT_CONFIDENCE`], numbered headers whose
/// remainder matches a family score [`NUMBERED_CONFIDENCE`], anything else is
/// `(Unknown, 0.0)`.
///
/// ```
/// use paperscout_core::sections::{SectionType, classify};
///
/// assert_eq!(classify("  ABSTRACT "), (SectionType::Abstract, 1.0));
/// assert_eq!(classify("2. Methods"), (SectionType::Methodology, 0.8));
/// assert_eq!(classify("We used methods from prior work."), (SectionType::Unknown, 0.0));
/// ```
#[must_use]
pub fn classify(line: &str) -> (SectionType, f64) {
    let normalized = normalize(line);
    if normalized.is_empty() {
        return (SectionType::Unknown, 0.0);
    }

    if let Some(kind) = match_family(&normalized) {
        return (kind, EXACT_CONFIDENCE);
    }

    if let Some(captures) = NUMBERED_HEADER.captures(&normalized) {
        if let Some(kind) = captures.get(1).and_then(|rest| match_family(rest.as_str())) {
            return (kind, NUMBERED_CONFIDENCE);
        }
    }

    (SectionType::Unknown, 0.0)
}

fn match_family(text: &str) -> Option<SectionType> {
    FAMILY_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(text))
        .map(|(kind, _)| *kind)
}

/// Lowercases, trims and collapses internal whitespace runs to one space.
fn normalize(line: &str) -> String {
    line.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Exact Match Tests ====================

    #[test]
    fn test_classify_exact_headers() {
        assert_eq!(classify("Introduction"), (SectionType::Introduction, 1.0));
        assert_eq!(classify("RELATED   WORK"), (SectionType::RelatedWork, 1.0));
        assert_eq!(classify("Literature Review"), (SectionType::RelatedWork, 1.0));
        assert_eq!(classify("Experimental Setup"), (SectionType::Experiments, 1.0));
        assert_eq!(classify("Experiment"), (SectionType::Experiments, 1.0));
        assert_eq!(classify("Findings"), (SectionType::Results, 1.0));
        assert_eq!(classify("Bibliography"), (SectionType::References, 1.0));
        assert_eq!(classify("Appendices"), (SectionType::Appendix, 1.0));
    }

    #[test]
    fn test_classify_spaced_abstract() {
        assert_eq!(classify("A B S T R A C T"), (SectionType::Abstract, 1.0));
    }

    #[test]
    fn test_classify_summary_prefers_abstract() {
        assert_eq!(classify("Summary"), (SectionType::Abstract, 1.0));
    }

    #[test]
    fn test_classify_numbered_family_entry_is_exact() {
        assert_eq!(classify("1 Introduction"), (SectionType::Introduction, 1.0));
        assert_eq!(classify("4 Experiments"), (SectionType::Experiments, 1.0));
    }

    // ==================== Numbered Header Tests ====================

    #[test]
    fn test_classify_numbered_headers() {
        assert_eq!(classify("1. Introduction"), (SectionType::Introduction, 0.8));
        assert_eq!(classify("3 Results"), (SectionType::Results, 0.8));
        assert_eq!(classify("IV. Discussion"), (SectionType::Discussion, 0.8));
        assert_eq!(classify("ii related work"), (SectionType::RelatedWork, 0.8));
    }

    #[test]
    fn test_classify_numbered_non_family_is_unknown() {
        assert_eq!(classify("2. Our dataset"), (SectionType::Unknown, 0.0));
    }

    // ==================== Non-Header Tests ====================

    #[test]
    fn test_classify_prose_is_unknown() {
        assert_eq!(classify("In this section we describe the approach."), (SectionType::Unknown, 0.0));
        assert_eq!(classify("Introduction to the problem"), (SectionType::Unknown, 0.0));
        assert_eq!(classify(""), (SectionType::Unknown, 0.0));
        assert_eq!(classify("   "), (SectionType::Unknown, 0.0));
    }

    // ==================== Page Marker Tests ====================

    #[test]
    fn test_default_page_marker() {
        let marker = default_page_marker();
        let captures = marker.captures("--- Page 12 ---").map(|c| c[1].to_string());
        assert_eq!(captures.as_deref(), Some("12"));
        assert!(marker.is_match("  -- page 3 --  "));
        assert!(!marker.is_match("See page 3 for details"));
    }
}
