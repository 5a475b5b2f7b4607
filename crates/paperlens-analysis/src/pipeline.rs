//! End-to-end analysis entry point.
//!
//! Flow for one request:
//!   1. Resolve the input to PDF bytes (arXiv papers are looked up and downloaded)
//!   2. Extract layout fields and body text
//!   3. Pick title/authors: caller hint, then arXiv metadata, then extraction
//!   4. Run the chunked analysis
//!   5. Store the paper and its analysis, only once everything succeeded

use std::sync::Arc;

use chrono::Utc;
use paperlens_ingestion::models::PaperMetadata;
use paperlens_ingestion::pdf_parser::extract_document;
use paperlens_ingestion::sources::{ArxivId, PaperSource};
use paperlens_ingestion::ExtractionError;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::AnalysisError;
use crate::models::PaperAnalysisResult;
use crate::orchestrator::Orchestrator;
use crate::store::{PaperRecord, PaperStore};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
}

/// What the caller hands in.
#[derive(Debug, Clone)]
pub enum PaperInput {
    Pdf(Vec<u8>),
    /// An arXiv URL or bare identifier.
    Arxiv(String),
}

/// Optional caller-supplied overrides. Blank strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct AnalysisHints {
    pub title: Option<String>,
    pub authors: Option<String>,
}

/// A stored paper together with its analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzedPaper {
    pub paper: PaperRecord,
    pub analysis: PaperAnalysisResult,
}

pub struct Analyzer {
    orchestrator: Orchestrator,
    source: Arc<dyn PaperSource>,
    store: Arc<dyn PaperStore>,
}

impl Analyzer {
    pub fn new(
        orchestrator: Orchestrator,
        source: Arc<dyn PaperSource>,
        store: Arc<dyn PaperStore>,
    ) -> Self {
        Self { orchestrator, source, store }
    }

    pub fn store(&self) -> Arc<dyn PaperStore> {
        Arc::clone(&self.store)
    }

    #[instrument(skip_all)]
    pub async fn analyze(
        &self,
        input: PaperInput,
        hints: AnalysisHints,
    ) -> Result<AnalyzedPaper, PipelineError> {
        let (bytes, metadata) = match input {
            PaperInput::Pdf(bytes) => (bytes, None),
            PaperInput::Arxiv(url) => {
                let id = ArxivId::parse(&url)?;
                let meta = self.source.fetch_metadata(&id).await?;
                let bytes = self.source.fetch_pdf(&meta.pdf_url).await?;
                (bytes, Some(meta))
            }
        };

        let doc = extract_document(&bytes)?;

        let title = pick(
            hints.title.as_deref(),
            metadata.as_ref().map(|m| m.title.as_str()),
            &doc.title,
        );
        let meta_authors = metadata.as_ref().map(PaperMetadata::authors_display);
        let authors = pick(hints.authors.as_deref(), meta_authors.as_deref(), &doc.authors);
        let abstract_text = metadata
            .as_ref()
            .and_then(|m| m.abstract_text.clone())
            .unwrap_or_else(|| doc.abstract_text.clone());

        info!(%title, pages = doc.page_count, "Paper extracted, starting analysis");
        let analysis = self.orchestrator.analyze(&doc.full_text, &title, &authors).await?;

        let paper = PaperRecord {
            id: Uuid::new_v4(),
            title,
            authors,
            abstract_text,
            arxiv_id: metadata.map(|m| m.arxiv_id),
            page_count: doc.page_count,
            created_at: Utc::now(),
        };
        self.store.save_paper(paper.clone()).await;
        self.store.save_analysis(paper.id, analysis.clone()).await;
        info!(paper_id = %paper.id, "Paper and analysis stored");

        Ok(AnalyzedPaper { paper, analysis })
    }
}

/// First non-blank of hint, metadata value, extracted value.
fn pick(hint: Option<&str>, from_metadata: Option<&str>, extracted: &str) -> String {
    [hint, from_metadata]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(extracted)
        .to_string()
}
