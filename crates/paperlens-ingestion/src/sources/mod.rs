//! Remote paper sources.

pub mod arxiv;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::PaperMetadata;

pub use arxiv::{ArxivClient, ArxivId};

/// Anything that can resolve an identifier to metadata and PDF bytes.
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Look up title, authors and abstract for a paper.
    async fn fetch_metadata(&self, id: &ArxivId) -> Result<PaperMetadata>;

    /// Download the PDF at `url`.
    async fn fetch_pdf(&self, url: &str) -> Result<Vec<u8>>;
}
