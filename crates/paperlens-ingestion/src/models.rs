//! Data models for the ingestion stage.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Title used when no first-page fragment passes the title heuristic.
pub const UNTITLED_PAPER: &str = "Untitled Paper";
/// Authors used when no first-page fragment looks like an author line.
pub const UNKNOWN_AUTHORS: &str = "Unknown Authors";
/// Abstract sentinel when no "Abstract" block is found.
pub const NO_ABSTRACT: &str = "No abstract found";

/// One run of text on a page, as emitted by the content-stream walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFragment {
    pub text: String,
    /// Horizontal position of the first glyph, in PDF user space.
    pub x: f32,
    /// Baseline position; larger is higher on the page.
    pub y: f32,
    /// 1-based page index.
    pub page: u32,
}

impl ExtractedFragment {
    pub fn new(text: impl Into<String>, x: f32, y: f32, page: u32) -> Self {
        Self { text: text.into(), x, y, page }
    }
}

/// All fragments of one page in content-stream order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfPage {
    pub number: u32,
    pub fragments: Vec<ExtractedFragment>,
}

/// A section of a parsed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSection {
    pub title: String,
    pub content: String,
    pub page: u32,
}

/// Result of layout-based extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDocument {
    pub title: String,
    pub authors: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub full_text: String,
    pub sections: Vec<DocumentSection>,
    pub page_count: usize,
}

impl ParsedDocument {
    pub fn has_title(&self) -> bool {
        self.title != UNTITLED_PAPER
    }

    pub fn has_authors(&self) -> bool {
        self.authors != UNKNOWN_AUTHORS
    }
}

/// Metadata returned by the arXiv export API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub arxiv_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub abstract_text: Option<String>,
    pub pdf_url: String,
    pub published: Option<NaiveDate>,
}

impl PaperMetadata {
    /// Authors as a single display string.
    pub fn authors_display(&self) -> String {
        self.authors.join(", ")
    }
}
