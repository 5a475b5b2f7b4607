//! Backend selection: turns provider configuration into a concrete backend.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::{
    AnthropicBackend, GeminiBackend, LlmBackend, LlmError, OllamaBackend, OpenAiBackend,
    OpenAiCompatibleBackend,
};

/// Supported provider kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
    Ollama,
    Anthropic,
    Gemini,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::OpenAi           => "openai",
            BackendKind::OpenAiCompatible => "openai_compatible",
            BackendKind::Ollama           => "ollama",
            BackendKind::Anthropic        => "anthropic",
            BackendKind::Gemini           => "gemini",
        }
    }

    /// Environment variable consulted when no key is configured. Ollama
    /// takes no key.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            BackendKind::OpenAi           => Some("PAPERLENS_OPENAI_API_KEY"),
            BackendKind::OpenAiCompatible => Some("PAPERLENS_COMPAT_API_KEY"),
            BackendKind::Ollama           => None,
            BackendKind::Anthropic        => Some("PAPERLENS_ANTHROPIC_API_KEY"),
            BackendKind::Gemini           => Some("PAPERLENS_GEMINI_API_KEY"),
        }
    }

    fn requires_key(&self) -> bool {
        matches!(self, BackendKind::OpenAi | BackendKind::Anthropic | BackendKind::Gemini)
    }
}

/// Everything needed to construct one backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::OpenAi,
            model: "gpt-4.1".to_string(),
            api_key: None,
            base_url: None,
        }
    }
}

/// Build the backend described by `cfg`.
pub fn build_backend(cfg: &BackendConfig) -> Result<Arc<dyn LlmBackend>, LlmError> {
    let key = cfg.api_key.clone().filter(|k| !k.is_empty());
    if cfg.kind.requires_key() && key.is_none() {
        return Err(LlmError::Unavailable(format!(
            "{} configured but no API key found (set llm.api_key or {})",
            cfg.kind.as_str(),
            cfg.kind.api_key_env().unwrap_or_default()
        )));
    }

    let backend: Arc<dyn LlmBackend> = match cfg.kind {
        BackendKind::OpenAi => Arc::new(OpenAiBackend::new(key.unwrap_or_default(), &cfg.model)),
        BackendKind::Anthropic => {
            Arc::new(AnthropicBackend::new(key.unwrap_or_default(), &cfg.model))
        }
        BackendKind::Gemini => Arc::new(GeminiBackend::new(key.unwrap_or_default(), &cfg.model)),
        BackendKind::Ollama => {
            let base = cfg.base_url.as_deref().unwrap_or("http://localhost:11434");
            Arc::new(OllamaBackend::new(base, &cfg.model))
        }
        BackendKind::OpenAiCompatible => {
            let base = cfg.base_url.as_deref().ok_or_else(|| {
                LlmError::Unavailable("openai_compatible backend requires llm.base_url".to_string())
            })?;
            Arc::new(OpenAiCompatibleBackend::new(base, &cfg.model, key))
        }
    };

    tracing::info!(
        provider = cfg.kind.as_str(),
        model = backend.model_id(),
        is_local = backend.is_local(),
        "LLM backend ready"
    );
    Ok(backend)
}
