//! Configuration loading for PaperLens.
//! Reads paperlens.toml from the current directory or the path in PAPERLENS_CONFIG.

use std::path::Path;
use std::time::Duration;

use paperlens_analysis::{AnalysisConfig, Pricing};
use paperlens_ingestion::chunker::ChunkerConfig;
use paperlens_llm::router::{BackendConfig, BackendKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub pricing: PricingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: BackendKind,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    /// Falls back to PAPERLENS_<PROVIDER>_API_KEY when empty.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_provider()          -> BackendKind { BackendKind::OpenAi }
fn default_model()             -> String      { "gpt-4.1".to_string() }
fn default_max_output_tokens() -> u32         { 4_096 }
fn default_temperature()       -> f32         { 0.3 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            api_key: String::new(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    #[serde(default = "default_max_chunk_tokens")]
    pub max_chunk_tokens: usize,
    #[serde(default = "default_max_key_concepts")]
    pub max_key_concepts: usize,
    #[serde(default = "bool_true")]
    pub generate_title: bool,
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

fn default_max_chunk_tokens()  -> usize { 15_000 }
fn default_max_key_concepts()  -> usize { 12 }
fn default_call_timeout_secs() -> u64   { 180 }
fn bool_true()                 -> bool  { true }

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            max_chunk_tokens: default_max_chunk_tokens(),
            max_key_concepts: default_max_key_concepts(),
            generate_title: bool_true(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

/// USD per million tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_input_per_million")]
    pub input_per_million: f64,
    #[serde(default = "default_output_per_million")]
    pub output_per_million: f64,
}

fn default_input_per_million()  -> f64 { 2.00 }
fn default_output_per_million() -> f64 { 8.00 }

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            input_per_million: default_input_per_million(),
            output_per_million: default_output_per_million(),
        }
    }
}

mod tests;

impl Config {
    /// Load configuration from paperlens.toml.
    /// Checks PAPERLENS_CONFIG first, then the current directory. A missing
    /// file means defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("PAPERLENS_CONFIG")
            .unwrap_or_else(|_| "paperlens.toml".to_string());

        if !Path::new(&path).exists() {
            tracing::warn!(
                path = %path,
                "Config file not found, using defaults. Copy paperlens.example.toml to paperlens.toml to customise."
            );
            return Ok(Self::default());
        }
        Self::from_path(&path)
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Backend settings with the API key resolved from the environment
    /// when the file leaves it empty.
    pub fn backend_config(&self) -> BackendConfig {
        self.backend_config_with(|name| std::env::var(name).ok())
    }

    fn backend_config_with(&self, env: impl Fn(&str) -> Option<String>) -> BackendConfig {
        let api_key = if self.llm.api_key.is_empty() {
            self.llm
                .provider
                .api_key_env()
                .and_then(|name| env(name))
                .filter(|k| !k.is_empty())
        } else {
            Some(self.llm.api_key.clone())
        };
        BackendConfig {
            kind: self.llm.provider,
            model: self.llm.model.clone(),
            api_key,
            base_url: self.llm.base_url.clone(),
        }
    }

    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            chunker: ChunkerConfig { max_tokens: self.analysis.max_chunk_tokens },
            max_key_concepts: self.analysis.max_key_concepts,
            generate_title: self.analysis.generate_title,
            call_timeout: Duration::from_secs(self.analysis.call_timeout_secs),
            max_output_tokens: self.llm.max_output_tokens,
            temperature: self.llm.temperature,
            pricing: Pricing {
                input_per_million: self.pricing.input_per_million,
                output_per_million: self.pricing.output_per_million,
            },
        }
    }
}
