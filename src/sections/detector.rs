//! Line-oriented section detection as an explicit state machine.
//!
//! The detector walks page-marked text one line at a time. Page-marker lines
//! only move the page counter. Every other line is classified; a confident
//! header closes the open section and opens a new one, anything else is
//! appended to the open section or dropped when none is open.

use regex::Regex;
use tracing::{debug, instrument};

use super::patterns::{classify, default_page_marker};
use super::types::{Section, SectionType};

/// Headers must score strictly above this to start a section.
pub const DEFAULT_HEADER_THRESHOLD: f64 = 0.7;

/// Detector settings.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Minimum (exclusive) classification confidence for a header.
    pub header_threshold: f64,
    /// Page-boundary line pattern; capture group 1 is the page number.
    pub page_marker: Regex,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            header_threshold: DEFAULT_HEADER_THRESHOLD,
            page_marker: default_page_marker(),
        }
    }
}

/// A section that has seen its header but not yet its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSection {
    /// Classified role of the header.
    pub section_type: SectionType,
    /// Header line, trimmed.
    pub title: String,
    /// Page of the header line.
    pub start_page: u32,
    /// Body lines so far, verbatim.
    pub buffer: Vec<String>,
    /// Index of the header line in the source text.
    pub first_line: usize,
}

impl OpenSection {
    fn close(self, end_page: u32, end_line: usize) -> Option<Section> {
        let content = self.buffer.join("\n");
        let content = content.trim();
        if content.is_empty() {
            debug!(title = %self.title, "discarding empty section");
            return None;
        }
        Some(
            Section::new(self.title, self.section_type, content, self.start_page, end_page)
                .with_line_span(self.first_line..end_line),
        )
    }
}

/// Detector state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DetectorState {
    /// No header seen yet; lines are discarded.
    #[default]
    NoActiveSection,
    /// Accumulating the body of a section.
    InSection(OpenSection),
}

/// Input to [`SectionDetector::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent<'a> {
    /// A non-marker line.
    Line {
        /// Raw line text.
        text: &'a str,
        /// Page the line is on.
        page: u32,
        /// Line index in the source text.
        index: usize,
    },
    /// No more input.
    EndOfInput {
        /// Page of the final line.
        page: u32,
        /// Total number of source lines.
        line_count: usize,
    },
}

/// Splits page-marked text into [`Section`]s.
#[derive(Debug, Clone, Default)]
pub struct SectionDetector {
    config: DetectorConfig,
}

impl SectionDetector {
    /// Creates a detector with the given settings.
    #[must_use]
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Returns the detector settings.
    #[must_use]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Returns the page number if `line` is a page marker.
    ///
    /// A marker whose number does not parse, or is below 1, is still a
    /// marker; it returns `Some(None)` and leaves the page counter alone.
    fn page_marker(&self, line: &str) -> Option<Option<u32>> {
        self.config.page_marker.captures(line).map(|captures| {
            captures
                .get(1)
                .and_then(|m| m.as_str().parse().ok())
                .filter(|&number: &u32| number >= 1)
        })
    }

    /// Applies one transition, returning the next state and a section if one
    /// was closed.
    #[must_use]
    pub fn step(
        &self,
        state: DetectorState,
        event: LineEvent<'_>,
    ) -> (DetectorState, Option<Section>) {
        match event {
            LineEvent::EndOfInput { page, line_count } => match state {
                DetectorState::InSection(open) => {
                    (DetectorState::NoActiveSection, open.close(page, line_count))
                }
                DetectorState::NoActiveSection => (DetectorState::NoActiveSection, None),
            },
            LineEvent::Line { text, page, index } => {
                let (section_type, confidence) = classify(text);
                if confidence > self.config.header_threshold {
                    let closed = match state {
                        DetectorState::InSection(open) => open.close(page, index),
                        DetectorState::NoActiveSection => None,
                    };
                    let next = DetectorState::InSection(OpenSection {
                        section_type,
                        title: text.trim().to_string(),
                        start_page: page,
                        buffer: Vec::new(),
                        first_line: index,
                    });
                    return (next, closed);
                }

                match state {
                    DetectorState::InSection(mut open) => {
                        open.buffer.push(text.to_string());
                        (DetectorState::InSection(open), None)
                    }
                    DetectorState::NoActiveSection => (DetectorState::NoActiveSection, None),
                }
            }
        }
    }

    /// Detects all sections in `text`, in text order.
    ///
    /// Text before the first header is not captured. Pages start at 1.
    #[must_use]
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub fn detect(&self, text: &str) -> Vec<Section> {
        let mut state = DetectorState::NoActiveSection;
        let mut sections = Vec::new();
        let mut page = 1;
        let mut line_count = 0;

        for (index, line) in text.split('\n').enumerate() {
            line_count = index + 1;
            if let Some(marker) = self.page_marker(line) {
                if let Some(number) = marker {
                    page = number;
                }
                continue;
            }
            let (next, closed) = self.step(state, LineEvent::Line { text: line, page, index });
            state = next;
            sections.extend(closed);
        }

        let (_, closed) = self.step(state, LineEvent::EndOfInput { page, line_count });
        sections.extend(closed);

        debug!(sections = sections.len(), "section detection complete");
        sections
    }
}

/// Detects sections with the default settings.
#[must_use]
pub fn detect_sections(text: &str) -> Vec<Section> {
    SectionDetector::default().detect(text)
}
