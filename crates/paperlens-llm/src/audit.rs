//! Audit records for LLM calls.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// One record per collaborator call made during an analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmAuditEntry {
    pub id: Uuid,
    /// Analysis run this call belongs to.
    pub run_id: Uuid,
    /// "chunk:<i>" or "title".
    pub stage: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub cost_usd: f64,
    pub output_hash: String,
    pub latency_ms: u64,
    pub called_at: chrono::DateTime<Utc>,
}

impl LlmAuditEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        run_id: Uuid,
        stage: impl Into<String>,
        model: String,
        prompt_tokens: u32,
        completion_tokens: u32,
        cost_usd: f64,
        output: &str,
        latency_ms: u64,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(output.as_bytes());
        let output_hash = format!("{:x}", hasher.finalize());

        Self {
            id: Uuid::new_v4(),
            run_id,
            stage: stage.into(),
            model,
            prompt_tokens,
            completion_tokens,
            cost_usd,
            output_hash,
            latency_ms,
            called_at: Utc::now(),
        }
    }

    /// Emit the entry through the tracing pipeline.
    pub fn log(&self) {
        tracing::info!(
            run_id = %self.run_id,
            stage = %self.stage,
            model = %self.model,
            prompt_tokens = self.prompt_tokens,
            completion_tokens = self.completion_tokens,
            cost_usd = self.cost_usd,
            latency_ms = self.latency_ms,
            output_hash = %&self.output_hash[..12],
            "LLM call"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_hash_is_stable_sha256() {
        let run = Uuid::new_v4();
        let a = LlmAuditEntry::new(run, "chunk:0", "gpt-4.1".into(), 10, 5, 0.0, "hello", 3);
        let b = LlmAuditEntry::new(run, "chunk:1", "gpt-4.1".into(), 10, 5, 0.0, "hello", 9);
        assert_eq!(a.output_hash, b.output_hash);
        assert_eq!(a.output_hash.len(), 64);
        assert_ne!(a.id, b.id);
    }
}
