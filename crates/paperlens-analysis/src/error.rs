//! Analysis error types.

use paperlens_llm::LlmError;
use thiserror::Error;

use crate::models::CallStage;

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Any of these aborts the whole analysis. Nothing partial is returned.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("LLM call failed on {stage}: {source}")]
    Llm {
        stage: CallStage,
        #[source]
        source: LlmError,
    },

    #[error("LLM call on {stage} timed out after {secs}s")]
    Timeout { stage: CallStage, secs: u64 },

    #[error("Unusable reply on {stage}: {reason}")]
    MalformedReply { stage: CallStage, reason: String },

    #[error("Nothing to analyze: document text is empty")]
    EmptyDocument,
}

impl AnalysisError {
    /// Stage that failed, if the failure came from a model call.
    pub fn stage(&self) -> Option<CallStage> {
        match self {
            AnalysisError::Llm { stage, .. }
            | AnalysisError::Timeout { stage, .. }
            | AnalysisError::MalformedReply { stage, .. } => Some(*stage),
            AnalysisError::EmptyDocument => None,
        }
    }
}
