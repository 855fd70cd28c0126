//! Section detection and analysis for extracted paper text.
//!
//! [`SectionDetector`] splits page-marked text into [`Section`]s using a
//! high-precision header classifier. [`SectionDocument`] adds key phrases and
//! sentences for persistence, and the analyzer functions summarize one paper
//! or compare many.
//!
//! # Example
//!
//! ```
//! use paperscout_core::sections::{SectionType, detect_sections};
//!
//! let text = "Abstract\nWe study X.\n--- Page 2 ---\n1. Introduction\nX is old.";
//! let sections = detect_sections(text);
//! assert_eq!(sections.len(), 2);
//! assert_eq!(sections[1].section_type, SectionType::Introduction);
//! assert_eq!(sections[1].start_page, 2);
//! ```

mod analyzer;
mod detector;
mod document;
mod patterns;
mod types;

pub use analyzer::{
    CrossPaperComparison, DEFAULT_MAX_INSIGHTS, PaperOverview, SALIENCE_MARKERS, SectionDistribution,
    SectionRef, Theme, TypeCoverage, WordCountStats, WordStats, analyze_distribution,
    compare_across_papers, extract_key_insights, render_report,
};
pub use detector::{
    DEFAULT_HEADER_THRESHOLD, DetectorConfig, DetectorState, LineEvent, OpenSection,
    SectionDetector, detect_sections,
};
pub use document::{
    DocumentSection, KeyPhraseExtractor, MAX_KEY_PHRASES, SectionDocument, SectionSummary,
    split_sentences,
};
pub use patterns::{EXACT_CONFIDENCE, NUMBERED_CONFIDENCE, classify, default_page_marker};
pub use types::{Section, SectionType};
