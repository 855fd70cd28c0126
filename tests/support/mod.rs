//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod mock_api;

use serde_json::{Value, json};

/// A search record in Semantic Scholar's wire format.
pub fn paper_json(id: &str, title: &str, citations: i64, pdf_url: Option<&str>) -> Value {
    json!({
        "paperId": id,
        "title": title,
        "authors": [{"authorId": "1", "name": "Ada Lovelace"}],
        "year": 2021,
        "abstract": "An abstract.",
        "citationCount": citations,
        "openAccessPdf": pdf_url.map(|url| json!({"url": url, "status": "GREEN"})),
    })
}

/// A search response envelope around `records`.
pub fn search_body(total: u64, offset: usize, records: Vec<Value>) -> Value {
    json!({"total": total, "offset": offset, "data": records})
}

/// Smallest byte string that passes PDF content validation.
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj\n<< >>\nendobj\ntrailer\n<< >>\n%%EOF\n";
