//! Bibliographic records returned by the search API.
//!
//! API payloads are loosely typed, so every record is first read into a
//! permissive [`RawPaperRecord`] and then validated into a [`PaperMetadata`].
//! Records that fail validation are rejected individually; the rest of the
//! page is kept.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single API record was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    /// Record has no usable `paperId`.
    #[error("record is missing paperId")]
    MissingPaperId,

    /// Record has no usable `title`.
    #[error("record {paper_id} is missing a title")]
    MissingTitle {
        /// Identifier of the rejected record.
        paper_id: String,
    },

    /// Record reports a negative citation count.
    #[error("record {paper_id} has negative citationCount {count}")]
    NegativeCitationCount {
        /// Identifier of the rejected record.
        paper_id: String,
        /// The reported value.
        count: i64,
    },
}

/// One author of a paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    /// Source-API author identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    /// Display name.
    pub name: String,
}

/// Location of a freely downloadable PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAccessPdf {
    /// Direct PDF URL.
    pub url: String,
    /// Access status reported by the source (e.g. `GREEN`, `GOLD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Permissive shape of an API record before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPaperRecord {
    #[serde(default)]
    pub paper_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Option<Vec<RawAuthor>>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub citation_count: Option<i64>,
    #[serde(default)]
    pub open_access_pdf: Option<RawOpenAccessPdf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAuthor {
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOpenAccessPdf {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// A validated bibliographic record.
///
/// `paper_id` is fixed at construction. `citation_count` is unsigned, so it
/// can never be negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawPaperRecord")]
pub struct PaperMetadata {
    paper_id: String,
    /// Paper title.
    pub title: String,
    /// Authors in byline order.
    pub authors: Vec<Author>,
    /// Publication year, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Abstract text, when provided.
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    /// Number of citing papers.
    pub citation_count: u64,
    /// Open-access PDF location, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_access_pdf: Option<OpenAccessPdf>,
}

impl TryFrom<RawPaperRecord> for PaperMetadata {
    type Error = RecordError;

    fn try_from(raw: RawPaperRecord) -> Result<Self, Self::Error> {
        let paper_id = non_empty(raw.paper_id).ok_or(RecordError::MissingPaperId)?;
        let Some(title) = non_empty(raw.title) else {
            return Err(RecordError::MissingTitle { paper_id });
        };

        let citation_count = match raw.citation_count {
            None => 0,
            Some(count) => u64::try_from(count)
                .map_err(|_| RecordError::NegativeCitationCount {
                    paper_id: paper_id.clone(),
                    count,
                })?,
        };

        let authors = raw
            .authors
            .unwrap_or_default()
            .into_iter()
            .filter_map(|author| {
                non_empty(author.name).map(|name| Author {
                    author_id: author.author_id,
                    name,
                })
            })
            .collect();

        // An entry without a URL carries no downloadable location.
        let open_access_pdf = raw.open_access_pdf.and_then(|pdf| {
            non_empty(pdf.url).map(|url| OpenAccessPdf {
                url,
                status: pdf.status,
            })
        });

        Ok(Self {
            paper_id,
            title,
            authors,
            year: raw.year,
            abstract_text: non_empty(raw.abstract_text),
            citation_count,
            open_access_pdf,
        })
    }
}

impl PaperMetadata {
    /// Creates a record from already-validated parts.
    #[must_use]
    pub fn new(paper_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            paper_id: paper_id.into(),
            title: title.into(),
            authors: Vec::new(),
            year: None,
            abstract_text: None,
            citation_count: 0,
            open_access_pdf: None,
        }
    }

    /// Builder-style setter for the publication year.
    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Builder-style setter for the citation count.
    #[must_use]
    pub fn with_citations(mut self, citation_count: u64) -> Self {
        self.citation_count = citation_count;
        self
    }

    /// Builder-style setter for the open-access PDF URL.
    #[must_use]
    pub fn with_pdf_url(mut self, url: impl Into<String>) -> Self {
        self.open_access_pdf = Some(OpenAccessPdf {
            url: url.into(),
            status: None,
        });
        self
    }

    /// Builder-style setter appending an author.
    #[must_use]
    pub fn with_author(mut self, name: impl Into<String>) -> Self {
        self.authors.push(Author {
            author_id: None,
            name: name.into(),
        });
        self
    }

    /// Stable identifier from the source API.
    #[must_use]
    pub fn paper_id(&self) -> &str {
        &self.paper_id
    }

    /// Whether an open-access PDF URL is known.
    #[must_use]
    pub fn has_open_access_pdf(&self) -> bool {
        self.open_access_pdf.is_some()
    }

    /// The open-access PDF URL, if any.
    #[must_use]
    pub fn pdf_url(&self) -> Option<&str> {
        self.open_access_pdf.as_ref().map(|pdf| pdf.url.as_str())
    }

    /// Last whitespace-separated token of the first author's name.
    #[must_use]
    pub fn first_author_last_name(&self) -> Option<&str> {
        self.authors
            .first()
            .and_then(|author| author.name.split_whitespace().next_back())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<PaperMetadata, RecordError> {
        let raw: RawPaperRecord = serde_json::from_str(json).unwrap();
        PaperMetadata::try_from(raw)
    }

    #[test]
    fn test_full_record_parses() {
        let paper = parse(
            r#"{
                "paperId": "abc123",
                "title": "Attention Is All You Need",
                "authors": [{"authorId": "1", "name": "Ashish Vaswani"}],
                "year": 2017,
                "abstract": "We propose the Transformer.",
                "citationCount": 90000,
                "openAccessPdf": {"url": "https://arxiv.org/pdf/1706.03762", "status": "GREEN"}
            }"#,
        )
        .unwrap();

        assert_eq!(paper.paper_id(), "abc123");
        assert_eq!(paper.year, Some(2017));
        assert_eq!(paper.citation_count, 90000);
        assert!(paper.has_open_access_pdf());
        assert_eq!(paper.pdf_url(), Some("https://arxiv.org/pdf/1706.03762"));
        assert_eq!(paper.first_author_last_name(), Some("Vaswani"));
    }

    #[test]
    fn test_null_citation_count_defaults_to_zero() {
        let paper = parse(r#"{"paperId": "p", "title": "T", "citationCount": null}"#).unwrap();
        assert_eq!(paper.citation_count, 0);

        let paper = parse(r#"{"paperId": "p", "title": "T"}"#).unwrap();
        assert_eq!(paper.citation_count, 0);
        assert!(paper.authors.is_empty());
    }

    #[test]
    fn test_negative_citation_count_rejected() {
        let err = parse(r#"{"paperId": "p", "title": "T", "citationCount": -4}"#).unwrap_err();
        assert_eq!(
            err,
            RecordError::NegativeCitationCount {
                paper_id: "p".to_string(),
                count: -4
            }
        );
    }

    #[test]
    fn test_missing_identity_rejected() {
        assert_eq!(
            parse(r#"{"title": "T"}"#).unwrap_err(),
            RecordError::MissingPaperId
        );
        assert!(matches!(
            parse(r#"{"paperId": "p", "title": "   "}"#).unwrap_err(),
            RecordError::MissingTitle { .. }
        ));
    }

    #[test]
    fn test_open_access_without_url_is_absent() {
        let paper = parse(r#"{"paperId": "p", "title": "T", "openAccessPdf": {"url": ""}}"#).unwrap();
        assert!(!paper.has_open_access_pdf());

        let paper = parse(r#"{"paperId": "p", "title": "T", "openAccessPdf": null}"#).unwrap();
        assert!(paper.pdf_url().is_none());
    }

    #[test]
    fn test_serialization_uses_api_field_names() {
        let paper = PaperMetadata::new("p1", "Title")
            .with_year(2020)
            .with_citations(5)
            .with_pdf_url("https://example.org/p1.pdf");
        let value = serde_json::to_value(&paper).unwrap();

        assert_eq!(value["paperId"], "p1");
        assert_eq!(value["citationCount"], 5);
        assert_eq!(value["openAccessPdf"]["url"], "https://example.org/p1.pdf");
        assert!(value.get("abstract").is_none());
    }

    #[test]
    fn test_persisted_record_round_trips_through_validation() {
        let paper = PaperMetadata::new("p1", "Title").with_author("Grace Hopper");
        let json = serde_json::to_string(&paper).unwrap();
        let back: PaperMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, paper);
    }
}
