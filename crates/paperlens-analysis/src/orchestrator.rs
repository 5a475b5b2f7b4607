//! Chunked analysis orchestrator.
//!
//! Flow for one paper:
//!   1. Chunk the body text
//!   2. One JSON-mode model call per chunk, strictly in order
//!   3. Fold each parsed reply into an accumulation record
//!   4. Dedup key concepts, optionally generate a title, build the result
//!
//! Any failed call aborts the run; the accumulation is dropped with it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use paperlens_ingestion::chunker::{chunk_text, ChunkerConfig};
use paperlens_llm::audit::LlmAuditEntry;
use paperlens_llm::{LlmBackend, LlmRequest, LlmResponse};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::cost::{Pricing, UsageTotals};
use crate::error::{AnalysisError, Result};
use crate::models::{
    AnalysisSection, CallStage, ChunkAnalysisResult, Complexity, PaperAnalysisResult, NO_OVERVIEW,
    UNKNOWN_READING_TIME,
};
use crate::prompts::{first_chunk_prompt, later_chunk_prompt, title_prompt, SYSTEM_PROMPT};
use crate::reply::{is_usable_title, parse_chunk_reply, parse_title_reply};

/// Tuning knobs for one orchestrator.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub chunker: ChunkerConfig,
    pub max_key_concepts: usize,
    /// Issue the extra title call when chunk 0 gives no usable title.
    pub generate_title: bool,
    pub call_timeout: Duration,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub pricing: Pricing,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            max_key_concepts: 12,
            generate_title: true,
            call_timeout: Duration::from_secs(180),
            max_output_tokens: 4_096,
            temperature: 0.3,
            pricing: Pricing::default(),
        }
    }
}

/// State threaded through the chunk loop. Each step consumes the previous
/// record and returns the next one.
#[derive(Debug, Default)]
struct Accumulation {
    overview: Option<String>,
    complexity: Option<Complexity>,
    reading_time: Option<String>,
    generated_title: Option<String>,
    sections: Vec<AnalysisSection>,
    key_concepts: Vec<String>,
    usage: UsageTotals,
}

impl Accumulation {
    fn absorb(mut self, reply: ChunkAnalysisResult, usage: UsageTotals) -> Self {
        self.overview = self.overview.or(reply.overview);
        self.complexity = self.complexity.or(reply.complexity);
        self.reading_time = self.reading_time.or(reply.reading_time);
        self.generated_title = self.generated_title.or(reply.generated_title);
        self.sections.extend(reply.sections);
        self.key_concepts.extend(reply.key_concepts);
        self.usage = usage;
        self
    }
}

/// Keep the first occurrence of each concept, then cap the list.
pub fn dedup_concepts(concepts: Vec<String>, max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    concepts
        .into_iter()
        .filter(|c| seen.insert(c.clone()))
        .take(max)
        .collect()
}

/// Elapsed wall-clock time as "<seconds>s" with one decimal.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.1}s", elapsed.as_secs_f64())
}

pub struct Orchestrator {
    backend: Arc<dyn LlmBackend>,
    config: AnalysisConfig,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn LlmBackend>, config: AnalysisConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze a paper body. Fails as a whole if any model call fails.
    #[instrument(skip(self, full_text), fields(chars = full_text.len(), model = self.backend.model_id()))]
    pub async fn analyze(
        &self,
        full_text: &str,
        title: &str,
        authors: &str,
    ) -> Result<PaperAnalysisResult> {
        let started = Instant::now();
        let run_id = Uuid::new_v4();

        if full_text.trim().is_empty() {
            return Err(AnalysisError::EmptyDocument);
        }
        let chunks = chunk_text(full_text, &self.config.chunker);
        let chunk_count = chunks.len();
        info!(%run_id, chunk_count, "Starting chunked analysis");

        let mut acc = Accumulation::default();
        for chunk in &chunks {
            let stage = CallStage::Chunk(chunk.index);
            let prompt = if chunk.index == 0 {
                first_chunk_prompt(title, authors, &chunk.content, chunk_count)
            } else {
                later_chunk_prompt(title, &chunk.content, chunk.index, chunk_count)
            };

            let resp = self.call(run_id, stage, prompt).await?;
            let usage = acc.usage.add(resp.prompt_tokens, resp.completion_tokens, &self.config.pricing);
            let reply = parse_chunk_reply(&resp.content, stage)?;
            acc = acc.absorb(reply, usage);
            debug!(chunk = chunk.index, cost_usd = acc.usage.cost_usd, "Chunk merged");
        }

        let key_concepts = dedup_concepts(acc.key_concepts, self.config.max_key_concepts);
        let overview = acc.overview.unwrap_or_else(|| NO_OVERVIEW.to_string());
        let mut usage = acc.usage;

        let final_title = match acc.generated_title.filter(|t| is_usable_title(t)) {
            Some(generated) => generated,
            None if self.config.generate_title => {
                let resp = self
                    .call(run_id, CallStage::Title, title_prompt(&overview, &key_concepts))
                    .await?;
                usage = usage.add(resp.prompt_tokens, resp.completion_tokens, &self.config.pricing);
                match parse_title_reply(&resp.content)?.filter(|t| is_usable_title(t)) {
                    Some(generated) => generated,
                    None => {
                        debug!("Generated title rejected, keeping document title");
                        title.to_string()
                    }
                }
            }
            None => title.to_string(),
        };

        let result = PaperAnalysisResult {
            title: final_title,
            overview,
            sections: acc.sections,
            key_concepts,
            complexity: acc.complexity.unwrap_or_default(),
            reading_time: acc.reading_time.unwrap_or_else(|| UNKNOWN_READING_TIME.to_string()),
            total_tokens: usage.total_tokens(),
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            estimated_cost: usage.rounded_cost(),
            analysis_time: format_elapsed(started.elapsed()),
            chunk_count,
        };

        info!(
            %run_id,
            calls = usage.calls,
            total_tokens = result.total_tokens,
            cost_usd = result.estimated_cost,
            elapsed = %result.analysis_time,
            "Analysis complete"
        );
        Ok(result)
    }

    /// One bounded model call, audited on success.
    async fn call(&self, run_id: Uuid, stage: CallStage, prompt: String) -> Result<LlmResponse> {
        let req = LlmRequest::json(SYSTEM_PROMPT, prompt, self.config.max_output_tokens)
            .with_temperature(self.config.temperature);

        let started = Instant::now();
        let resp = match tokio::time::timeout(self.config.call_timeout, self.backend.complete(req)).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(source)) => {
                warn!(%stage, error = %source, "LLM call failed, aborting analysis");
                return Err(AnalysisError::Llm { stage, source });
            }
            Err(_) => {
                warn!(%stage, "LLM call timed out, aborting analysis");
                return Err(AnalysisError::Timeout {
                    stage,
                    secs: self.config.call_timeout.as_secs(),
                });
            }
        };

        let cost = self.config.pricing.call_cost(resp.prompt_tokens, resp.completion_tokens);
        LlmAuditEntry::new(
            run_id,
            stage.tag(),
            resp.model.clone(),
            resp.prompt_tokens,
            resp.completion_tokens,
            cost,
            &resp.content,
            started.elapsed().as_millis() as u64,
        )
        .log();
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperlens_llm::ResponseFormat;
    use paperlens_test_utils::fixtures::first_chunk_reply;
    use paperlens_test_utils::ScriptedBackend;
    use pretty_assertions::assert_eq;

    fn orchestrator(backend: Arc<ScriptedBackend>, config: AnalysisConfig) -> Orchestrator {
        Orchestrator::new(backend, config)
    }

    fn no_title_call() -> AnalysisConfig {
        AnalysisConfig { generate_title: false, ..Default::default() }
    }

    #[test]
    fn test_dedup_keeps_first_seen_order() {
        let concepts = ["a", "b", "a", "c", "b"].map(String::from).to_vec();
        assert_eq!(dedup_concepts(concepts, 12), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dedup_truncates() {
        let concepts: Vec<String> = (0..20).map(|i| format!("c{i}")).collect();
        let kept = dedup_concepts(concepts, 12);
        assert_eq!(kept.len(), 12);
        assert_eq!(kept[11], "c11");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(12_340)), "12.3s");
        assert_eq!(format_elapsed(Duration::ZERO), "0.0s");
    }

    #[tokio::test]
    async fn test_single_chunk_analysis() {
        let backend = Arc::new(ScriptedBackend::new().reply_with_usage(first_chunk_reply(), 10_000, 2_000));
        let result = orchestrator(backend.clone(), no_title_call())
            .analyze("A short body.", "Original Title", "A. Author")
            .await
            .unwrap();

        assert_eq!(result.chunk_count, 1);
        assert_eq!(result.overview, "X");
        assert_eq!(result.complexity, Complexity::Advanced);
        assert_eq!(result.reading_time, "10 min");
        assert_eq!(result.title, "Original Title");
        assert_eq!(result.input_tokens, 10_000);
        assert_eq!(result.output_tokens, 2_000);
        assert_eq!(result.total_tokens, 12_000);
        assert_eq!(result.estimated_cost, 0.036);
        assert!(result.analysis_time.ends_with('s'));

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].response_format, ResponseFormat::Json);
        assert!(requests[0].messages[1].content.contains("Original Title"));
    }

    #[tokio::test]
    async fn test_missing_document_fields_fall_back() {
        let backend = Arc::new(ScriptedBackend::new().reply(r#"{"sections": []}"#));
        let result = orchestrator(backend, no_title_call())
            .analyze("Body.", "T", "A")
            .await
            .unwrap();
        assert_eq!(result.overview, NO_OVERVIEW);
        assert_eq!(result.complexity, Complexity::Intermediate);
        assert_eq!(result.reading_time, UNKNOWN_READING_TIME);
        assert!(result.key_concepts.is_empty());
    }

    #[tokio::test]
    async fn test_usable_generated_title_skips_title_call() {
        let reply = r#"{"overview":"O","generatedTitle":"How Attention Replaced Recurrence"}"#;
        let backend = Arc::new(ScriptedBackend::new().reply(reply));
        let result = orchestrator(backend.clone(), AnalysisConfig::default())
            .analyze("Body.", "Attention Is All You Need", "A")
            .await
            .unwrap();
        assert_eq!(result.title, "How Attention Replaced Recurrence");
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_title_call_when_chunk_title_too_short() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .reply_with_usage(r#"{"overview":"O","generatedTitle":"Short"}"#, 100, 50)
                .reply_with_usage(r#"{"title":"Attention Without Recurrence, Explained"}"#, 40, 10),
        );
        let result = orchestrator(backend.clone(), AnalysisConfig::default())
            .analyze("Body.", "Original", "A")
            .await
            .unwrap();
        assert_eq!(result.title, "Attention Without Recurrence, Explained");
        assert_eq!(backend.call_count(), 2);
        assert_eq!(result.input_tokens, 140);
        assert_eq!(result.output_tokens, 60);
    }

    #[tokio::test]
    async fn test_rejected_generated_title_keeps_original() {
        let long = "t".repeat(150);
        let backend = Arc::new(
            ScriptedBackend::new()
                .reply(r#"{"overview":"O"}"#)
                .reply(format!(r#"{{"title":"{long}"}}"#)),
        );
        let result = orchestrator(backend, AnalysisConfig::default())
            .analyze("Body.", "Original Title", "A")
            .await
            .unwrap();
        assert_eq!(result.title, "Original Title");
    }

    #[tokio::test]
    async fn test_title_call_failure_aborts() {
        let backend = Arc::new(ScriptedBackend::new().reply(r#"{"overview":"O"}"#).fail("503"));
        let err = orchestrator(backend, AnalysisConfig::default())
            .analyze("Body.", "T", "A")
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(CallStage::Title));
    }

    #[tokio::test]
    async fn test_empty_text_is_an_error() {
        let backend = Arc::new(ScriptedBackend::new());
        let err = orchestrator(backend.clone(), no_title_call())
            .analyze("  \n ", "T", "A")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyDocument));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_hung_call_times_out() {
        let backend = Arc::new(ScriptedBackend::new().hang());
        let config = AnalysisConfig {
            call_timeout: Duration::from_millis(50),
            ..no_title_call()
        };
        let err = orchestrator(backend, config)
            .analyze("Body.", "T", "A")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Timeout { stage: CallStage::Chunk(0), .. }));
    }

    #[tokio::test]
    async fn test_malformed_reply_aborts() {
        let backend = Arc::new(ScriptedBackend::new().reply("Sorry, I can't do that."));
        let err = orchestrator(backend, no_title_call())
            .analyze("Body.", "T", "A")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedReply { .. }));
    }
}
