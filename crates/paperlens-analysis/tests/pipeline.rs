//! `Analyzer` end to end: PDF bytes or arXiv ids in, stored analysis out.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use paperlens_analysis::models::CallStage;
use paperlens_analysis::{
    AnalysisConfig, AnalysisError, AnalysisHints, Analyzer, InMemoryPaperStore, Orchestrator,
    PaperInput, PaperStore, PipelineError,
};
use paperlens_ingestion::chunker::ChunkerConfig;
use paperlens_ingestion::models::PaperMetadata;
use paperlens_ingestion::sources::{ArxivId, PaperSource};
use paperlens_ingestion::ExtractionError;
use paperlens_test_utils::fixtures::first_chunk_reply;
use paperlens_test_utils::{PdfBuilder, ScriptedBackend};
use pretty_assertions::assert_eq;

struct FakeArxiv {
    pdf: Vec<u8>,
    pdf_requests: Mutex<Vec<String>>,
}

impl FakeArxiv {
    fn new(pdf: Vec<u8>) -> Self {
        Self { pdf, pdf_requests: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl PaperSource for FakeArxiv {
    async fn fetch_metadata(&self, id: &ArxivId) -> Result<PaperMetadata, ExtractionError> {
        Ok(PaperMetadata {
            arxiv_id: id.as_str().to_string(),
            title: "Attention Is All You Need".to_string(),
            authors: vec!["Ashish Vaswani".to_string(), "Noam Shazeer".to_string()],
            abstract_text: Some("The dominant sequence transduction models...".to_string()),
            pdf_url: id.pdf_url(),
            published: None,
        })
    }

    async fn fetch_pdf(&self, url: &str) -> Result<Vec<u8>, ExtractionError> {
        self.pdf_requests.lock().unwrap().push(url.to_string());
        Ok(self.pdf.clone())
    }
}

fn paper_pdf() -> Vec<u8> {
    PdfBuilder::new()
        .text_sized("Scaling Sparse Attention Models", 150.0, 740.0, 18.0)
        .text("Jane Doe, John Smith", 200.0, 710.0)
        .lines(
            &[
                "Abstract",
                "We study sparse attention at scale.",
                "Sparse patterns cut memory use.",
                "Experiments cover language modelling.",
                "Results match dense baselines.",
            ],
            660.0,
        )
        .build()
}

fn analyzer(backend: Arc<ScriptedBackend>, config: AnalysisConfig, pdf: Vec<u8>) -> (Analyzer, Arc<InMemoryPaperStore>) {
    let store = Arc::new(InMemoryPaperStore::new());
    let analyzer = Analyzer::new(
        Orchestrator::new(backend, config),
        Arc::new(FakeArxiv::new(pdf)),
        store.clone(),
    );
    (analyzer, store)
}

fn single_call() -> AnalysisConfig {
    AnalysisConfig { generate_title: false, ..Default::default() }
}

#[tokio::test]
async fn test_pdf_input_is_analyzed_and_stored() {
    let backend = Arc::new(ScriptedBackend::new().reply(first_chunk_reply()));
    let (analyzer, store) = analyzer(backend.clone(), single_call(), Vec::new());

    let out = analyzer
        .analyze(PaperInput::Pdf(paper_pdf()), AnalysisHints::default())
        .await
        .unwrap();

    assert_eq!(out.paper.title, "Scaling Sparse Attention Models");
    assert_eq!(out.paper.authors, "Jane Doe, John Smith");
    assert_eq!(out.paper.arxiv_id, None);
    assert_eq!(out.analysis.overview, "X");

    assert_eq!(store.get_paper(out.paper.id).await, Some(out.paper.clone()));
    assert_eq!(store.get_analysis(out.paper.id).await, Some(out.analysis));

    let prompt = &backend.requests()[0].messages[1].content;
    assert!(prompt.contains("Scaling Sparse Attention Models"));
    assert!(prompt.contains("Jane Doe, John Smith"));
}

#[tokio::test]
async fn test_arxiv_metadata_beats_extraction_and_hints_beat_both() {
    let backend = Arc::new(ScriptedBackend::new().reply(first_chunk_reply()));
    let (analyzer, _store) = analyzer(backend, single_call(), paper_pdf());

    let hints = AnalysisHints { title: Some("My Reading Notes".to_string()), authors: None };
    let out = analyzer
        .analyze(PaperInput::Arxiv("https://arxiv.org/abs/1706.03762".to_string()), hints)
        .await
        .unwrap();

    assert_eq!(out.paper.title, "My Reading Notes");
    assert_eq!(out.paper.authors, "Ashish Vaswani, Noam Shazeer");
    assert_eq!(out.paper.arxiv_id.as_deref(), Some("1706.03762"));
    assert_eq!(out.paper.abstract_text, "The dominant sequence transduction models...");
}

#[tokio::test]
async fn test_failed_chunk_stores_nothing() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .reply(first_chunk_reply())
            .fail("connection reset by peer"),
    );
    let config = AnalysisConfig {
        chunker: ChunkerConfig { max_tokens: 20 },
        generate_title: false,
        ..Default::default()
    };
    let (analyzer, store) = analyzer(backend, config, Vec::new());

    let err = analyzer
        .analyze(PaperInput::Pdf(paper_pdf()), AnalysisHints::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Analysis(AnalysisError::Llm { stage: CallStage::Chunk(1), .. })
    ));
    assert!(store.list_papers().await.is_empty());
}

#[tokio::test]
async fn test_invalid_arxiv_url_fails_before_any_call() {
    let backend = Arc::new(ScriptedBackend::new());
    let (analyzer, _store) = analyzer(backend.clone(), single_call(), paper_pdf());

    let err = analyzer
        .analyze(PaperInput::Arxiv("https://example.com/paper".to_string()), AnalysisHints::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Extraction(ExtractionError::InvalidArxivUrl(_))));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_unreadable_pdf_is_extraction_error() {
    let backend = Arc::new(ScriptedBackend::new());
    let (analyzer, store) = analyzer(backend.clone(), single_call(), Vec::new());

    let err = analyzer
        .analyze(PaperInput::Pdf(b"not a pdf".to_vec()), AnalysisHints::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Extraction(_)));
    assert_eq!(backend.call_count(), 0);
    assert!(store.list_papers().await.is_empty());
}
