//! Extraction error types.

use paperlens_common::CommonError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractionError>;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF parse error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Document has no usable content: {0}")]
    EmptyDocument(String),

    #[error("Not a recognised arXiv URL or identifier: {0}")]
    InvalidArxivUrl(String),

    #[error("Paper fetch failed: {0}")]
    Fetch(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Sandbox(#[from] CommonError),
}
