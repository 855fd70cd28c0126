//! Statistics over detected sections, within one paper and across papers.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::document::SectionDocument;
use super::types::{Section, SectionType};

/// Words whose presence marks a sentence as a key insight.
pub const SALIENCE_MARKERS: [&str; 7] = [
    "significant",
    "novel",
    "innovative",
    "breakthrough",
    "important",
    "key",
    "crucial",
];

/// Default cap on insights returned by [`extract_key_insights`].
pub const DEFAULT_MAX_INSIGHTS: usize = 10;

/// Salient sentences kept per section.
const MAX_SALIENT_SENTENCES_PER_SECTION: usize = 3;

/// Themes listed in a cross-paper comparison.
const MAX_COMMON_THEMES: usize = 10;

/// Word count statistics for one section type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordStats {
    /// Sections of this type.
    pub count: usize,
    /// Sum of their word counts.
    pub total: usize,
    /// Integer mean.
    pub average: usize,
    /// Smallest word count.
    pub min: usize,
    /// Largest word count.
    pub max: usize,
}

impl WordStats {
    fn from_counts(counts: &[usize]) -> Option<Self> {
        let total: usize = counts.iter().sum();
        Some(Self {
            count: counts.len(),
            total,
            average: total.checked_div(counts.len())?,
            min: *counts.iter().min()?,
            max: *counts.iter().max()?,
        })
    }
}

/// Reference to one section in a [`SectionDistribution`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRef {
    /// Header line.
    pub title: String,
    /// Section type.
    #[serde(rename = "type")]
    pub section_type: SectionType,
    /// Word count.
    pub word_count: usize,
}

impl From<&Section> for SectionRef {
    fn from(section: &Section) -> Self {
        Self {
            title: section.title.clone(),
            section_type: section.section_type,
            word_count: section.word_count(),
        }
    }
}

/// Shape of one paper's sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDistribution {
    /// Number of sections.
    pub total_sections: usize,
    /// Sections per type.
    pub section_types: BTreeMap<SectionType, usize>,
    /// Word statistics per type.
    pub word_distribution: BTreeMap<SectionType, WordStats>,
    /// Sections per `"start-end"` page range.
    pub page_distribution: BTreeMap<String, usize>,
    /// Integer mean word count.
    pub average_section_length: usize,
    /// First section with the largest word count.
    pub longest_section: Option<SectionRef>,
    /// First section with the smallest non-zero word count.
    pub shortest_section: Option<SectionRef>,
}

/// Computes the section distribution of one paper.
#[must_use]
pub fn analyze_distribution<'a, I>(sections: I) -> SectionDistribution
where
    I: IntoIterator<Item = &'a Section>,
{
    let mut distribution = SectionDistribution::default();
    let mut counts_by_type: BTreeMap<SectionType, Vec<usize>> = BTreeMap::new();
    let mut total_words = 0;
    let mut longest: Option<&Section> = None;
    let mut shortest: Option<&Section> = None;

    for section in sections {
        let words = section.word_count();
        distribution.total_sections += 1;
        *distribution
            .section_types
            .entry(section.section_type)
            .or_default() += 1;
        counts_by_type
            .entry(section.section_type)
            .or_default()
            .push(words);
        *distribution
            .page_distribution
            .entry(format!("{}-{}", section.start_page, section.end_page))
            .or_default() += 1;
        total_words += words;

        if words > 0 && longest.is_none_or(|best| words > best.word_count()) {
            longest = Some(section);
        }
        if words > 0 && shortest.is_none_or(|best| words < best.word_count()) {
            shortest = Some(section);
        }
    }

    distribution.average_section_length = total_words
        .checked_div(distribution.total_sections)
        .unwrap_or(0);
    distribution.word_distribution = counts_by_type
        .into_iter()
        .filter_map(|(kind, counts)| WordStats::from_counts(&counts).map(|stats| (kind, stats)))
        .collect();
    distribution.longest_section = longest.map(SectionRef::from);
    distribution.shortest_section = shortest.map(SectionRef::from);
    distribution
}

/// Collects key phrases and salient sentences from sections of `kind`.
///
/// Each matching section contributes its key phrases, then at most three
/// sentences containing a [`SALIENCE_MARKERS`] word (case-insensitive
/// substring). The result is cut to `max_insights`.
#[must_use]
pub fn extract_key_insights(
    document: &SectionDocument,
    kind: SectionType,
    max_insights: usize,
) -> Vec<String> {
    let mut insights = Vec::new();
    for entry in document.sections_of(kind) {
        insights.extend(entry.key_phrases.iter().cloned());
        insights.extend(
            entry
                .sentences
                .iter()
                .filter(|sentence| is_salient(sentence))
                .take(MAX_SALIENT_SENTENCES_PER_SECTION)
                .cloned(),
        );
    }
    insights.truncate(max_insights);
    insights
}

fn is_salient(sentence: &str) -> bool {
    let lower = sentence.to_lowercase();
    SALIENCE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// One paper in a [`CrossPaperComparison`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperOverview {
    /// Source file name.
    pub name: String,
    /// Paper title, `Unknown` when the metadata has none.
    pub title: String,
    /// Number of sections.
    pub section_count: usize,
    /// Total words across sections.
    pub word_count: usize,
    /// Distinct section types present.
    pub section_types: BTreeSet<SectionType>,
}

/// How many papers contain a section type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCoverage {
    /// Papers with at least one section of this type.
    pub paper_count: usize,
    /// `paper_count / total papers`.
    pub coverage: f64,
}

/// Word totals across papers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WordCountStats {
    /// Sum of per-paper word counts.
    pub total: usize,
    /// Mean words per paper.
    pub average: f64,
    /// Smallest per-paper word count.
    pub min: usize,
    /// Largest per-paper word count.
    pub max: usize,
}

/// A frequent word among key insights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    /// Lowercased word.
    pub theme: String,
    /// Occurrences.
    pub count: usize,
}

/// Section structure compared across a corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossPaperComparison {
    /// Number of papers compared.
    pub total_papers: usize,
    /// Per-paper overview, in input order.
    pub papers: Vec<PaperOverview>,
    /// Coverage per section type.
    pub section_type_frequency: BTreeMap<SectionType, TypeCoverage>,
    /// Mean section count.
    pub average_sections_per_paper: f64,
    /// Word totals.
    pub word_count_stats: WordCountStats,
    /// Top words (longer than four characters) among abstract insights.
    pub common_themes: Vec<Theme>,
}

/// Compares section structure across `(name, document)` pairs.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compare_across_papers<'a, I>(papers: I) -> CrossPaperComparison
where
    I: IntoIterator<Item = (&'a str, &'a SectionDocument)>,
{
    let mut comparison = CrossPaperComparison::default();
    let mut type_counts: BTreeMap<SectionType, usize> = BTreeMap::new();
    let mut theme_counts: HashMap<String, usize> = HashMap::new();
    let mut total_sections = 0;

    for (name, document) in papers {
        let section_types: BTreeSet<SectionType> = document
            .plain_sections()
            .map(|section| section.section_type)
            .collect();
        for kind in &section_types {
            *type_counts.entry(*kind).or_default() += 1;
        }

        let overview = PaperOverview {
            name: name.to_string(),
            title: document.title().unwrap_or("Unknown").to_string(),
            section_count: document.sections.len(),
            word_count: document.plain_sections().map(Section::word_count).sum(),
            section_types,
        };
        total_sections += overview.section_count;

        for insight in extract_key_insights(document, SectionType::Abstract, DEFAULT_MAX_INSIGHTS) {
            for word in insight.to_lowercase().split_whitespace() {
                if word.chars().count() > 4 {
                    *theme_counts.entry(word.to_string()).or_default() += 1;
                }
            }
        }

        comparison.papers.push(overview);
    }

    let paper_count = comparison.papers.len();
    comparison.total_papers = paper_count;
    if paper_count == 0 {
        return comparison;
    }

    comparison.section_type_frequency = type_counts
        .into_iter()
        .map(|(kind, count)| {
            (
                kind,
                TypeCoverage {
                    paper_count: count,
                    coverage: count as f64 / paper_count as f64,
                },
            )
        })
        .collect();
    comparison.average_sections_per_paper = total_sections as f64 / paper_count as f64;

    let word_counts: Vec<usize> = comparison.papers.iter().map(|p| p.word_count).collect();
    let total: usize = word_counts.iter().sum();
    comparison.word_count_stats = WordCountStats {
        total,
        average: total as f64 / paper_count as f64,
        min: word_counts.iter().copied().min().unwrap_or(0),
        max: word_counts.iter().copied().max().unwrap_or(0),
    };

    let mut themes: Vec<Theme> = theme_counts
        .into_iter()
        .map(|(theme, count)| Theme { theme, count })
        .collect();
    themes.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.theme.cmp(&b.theme)));
    themes.truncate(MAX_COMMON_THEMES);
    comparison.common_themes = themes;

    comparison
}

/// Renders a plain-text summary of one paper's sections.
#[must_use]
pub fn render_report(document: &SectionDocument) -> String {
    let distribution = analyze_distribution(document.plain_sections());

    let mut report = String::new();
    let _ = writeln!(report, "Section Analysis Report");
    let _ = writeln!(report, "{}", "=".repeat(50));
    let _ = writeln!(report);
    let _ = writeln!(report, "Paper Information:");
    let _ = writeln!(report, "- Title: {}", metadata_or_unknown(document, "title"));
    let _ = writeln!(report, "- Authors: {}", metadata_or_unknown(document, "authors"));
    let _ = writeln!(report, "- Pages: {}", metadata_or_unknown(document, "page_count"));
    let _ = writeln!(report);
    let _ = writeln!(report, "Section Overview:");
    let _ = writeln!(report, "- Total Sections: {}", distribution.total_sections);
    let _ = writeln!(
        report,
        "- Average Section Length: {} words",
        distribution.average_section_length
    );
    let _ = writeln!(report);
    let _ = writeln!(report, "Section Distribution:");

    let mut by_count: Vec<(&SectionType, &usize)> = distribution.section_types.iter().collect();
    by_count.sort_by(|a, b| b.1.cmp(a.1));
    for (kind, count) in by_count {
        let _ = writeln!(report, "- {kind}: {count} section(s)");
    }

    if let Some(longest) = &distribution.longest_section {
        let _ = writeln!(
            report,
            "\nLongest Section: {} ({} words)",
            longest.title, longest.word_count
        );
    }
    if let Some(shortest) = &distribution.shortest_section {
        let _ = writeln!(
            report,
            "Shortest Section: {} ({} words)",
            shortest.title, shortest.word_count
        );
    }

    let insights = extract_key_insights(document, SectionType::Abstract, DEFAULT_MAX_INSIGHTS);
    if !insights.is_empty() {
        let _ = writeln!(report, "\nKey Insights from Abstract:");
        for insight in insights.iter().take(5) {
            let _ = writeln!(report, "- {insight}");
        }
    }

    report
}

fn metadata_or_unknown<'a>(document: &'a SectionDocument, key: &str) -> &'a str {
    document.metadata.get(key).map_or("Unknown", String::as_str)
}
