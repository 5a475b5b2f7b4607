//! paperlens-analysis: Turning extracted text into a merged paper analysis.
//! - One structured model call per chunk, strictly in order
//! - Chunk 0 carries the document-level fields
//! - Token usage and cost accounting across calls
//! - `Analyzer` entry point and the paper store interface

pub mod cost;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod reply;
pub mod store;

pub use cost::{Pricing, UsageTotals};
pub use error::AnalysisError;
pub use models::{AnalysisSection, ChunkAnalysisResult, Complexity, PaperAnalysisResult};
pub use orchestrator::{AnalysisConfig, Orchestrator};
pub use pipeline::{AnalysisHints, AnalyzedPaper, Analyzer, PaperInput, PipelineError};
pub use store::{InMemoryPaperStore, PaperRecord, PaperStore};
