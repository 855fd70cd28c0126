//! Deterministic, filesystem-safe PDF filenames derived from paper metadata.

use crate::paper::PaperMetadata;

/// Maximum characters kept from the title.
pub const MAX_TITLE_CHARS: usize = 50;

/// Maximum characters kept from the first author's last name.
pub const MAX_AUTHOR_CHARS: usize = 20;

/// Placeholder for missing components.
const UNKNOWN: &str = "unknown";

/// Builds `{lastName}{year}_{title}.pdf` for a paper.
///
/// Missing author or year become `unknown`. The same metadata always yields
/// the same name, which makes downloads idempotent.
///
/// ```
/// use paperscout_core::PaperMetadata;
/// use paperscout_core::download::paper_filename;
///
/// let paper = PaperMetadata::new("id", "Deep Learning: A Review")
///     .with_author("Yann LeCun")
///     .with_year(2015);
/// assert_eq!(paper_filename(&paper), "LeCun2015_Deep_Learning_A_Review.pdf");
/// ```
#[must_use]
pub fn paper_filename(paper: &PaperMetadata) -> String {
    let author = paper
        .first_author_last_name()
        .map_or_else(|| UNKNOWN.to_string(), |name| sanitize_component(name, MAX_AUTHOR_CHARS));
    let year = paper
        .year
        .map_or_else(|| UNKNOWN.to_string(), |year| year.to_string());
    let title = sanitize_component(&paper.title, MAX_TITLE_CHARS);
    format!("{author}{year}_{title}.pdf")
}

/// Sanitizes text into a single filename component of at most `max_chars`.
///
/// Characters invalid on common filesystems, control characters and
/// whitespace become `_`; runs of `_` collapse; leading and trailing `.`/`_`
/// are stripped. Returns `unknown` when nothing survives.
#[must_use]
pub fn sanitize_component(value: &str, max_chars: usize) -> String {
    let mut out = String::new();
    let mut prev_sep = false;
    for ch in value.chars() {
        let mapped = match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        };
        if mapped == '_' {
            if !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else {
            out.push(mapped);
            prev_sep = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    let truncated: String = trimmed.chars().take(max_chars).collect();
    let truncated = truncated.trim_end_matches('_');
    if truncated.is_empty() {
        UNKNOWN.to_string()
    } else {
        truncated.to_string()
    }
}
