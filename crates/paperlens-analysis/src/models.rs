//! Analysis data models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Used when chunk 0 does not supply an overview.
pub const NO_OVERVIEW: &str = "No overview available";
/// Used when chunk 0 does not supply a reading time.
pub const UNKNOWN_READING_TIME: &str = "Unknown";

/// Which model call an event or error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStage {
    Chunk(usize),
    Title,
}

impl CallStage {
    /// Short tag for audit records ("chunk:0", "title").
    pub fn tag(&self) -> String {
        match self {
            CallStage::Chunk(i) => format!("chunk:{}", i),
            CallStage::Title    => "title".to_string(),
        }
    }
}

impl fmt::Display for CallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallStage::Chunk(i) => write!(f, "chunk {}", i),
            CallStage::Title    => f.write_str("title generation"),
        }
    }
}

/// Reader-facing difficulty of a paper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Complexity {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl Complexity {
    /// Case-insensitive; anything unrecognised is `None`.
    pub fn parse_lenient(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner"     => Some(Complexity::Beginner),
            "intermediate" => Some(Complexity::Intermediate),
            "advanced"     => Some(Complexity::Advanced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Beginner     => "Beginner",
            Complexity::Intermediate => "Intermediate",
            Complexity::Advanced     => "Advanced",
        }
    }
}

/// One explained section as returned by the model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisSection {
    pub id: String,
    pub title: String,
    pub original_content: String,
    pub explanation: String,
}

/// Parsed reply for one chunk. The document-level fields are only ever
/// set for chunk 0.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkAnalysisResult {
    pub sections: Vec<AnalysisSection>,
    pub key_concepts: Vec<String>,
    pub overview: Option<String>,
    pub complexity: Option<Complexity>,
    pub reading_time: Option<String>,
    pub generated_title: Option<String>,
}

/// Final merged analysis of one paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperAnalysisResult {
    /// Generated title when one was accepted, otherwise the document title.
    pub title: String,
    pub overview: String,
    pub sections: Vec<AnalysisSection>,
    pub key_concepts: Vec<String>,
    pub complexity: Complexity,
    pub reading_time: String,
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// USD, rounded to 4 decimal places.
    pub estimated_cost: f64,
    /// Wall-clock duration, e.g. "12.3s".
    pub analysis_time: String,
    pub chunk_count: usize,
}
