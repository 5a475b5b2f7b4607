//! Paper and analysis persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::PaperAnalysisResult;

/// A paper as stored alongside its analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperRecord {
    pub id: Uuid,
    pub title: String,
    pub authors: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub arxiv_id: Option<String>,
    pub page_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Storage for papers and their analyses, keyed by paper id.
#[async_trait]
pub trait PaperStore: Send + Sync {
    async fn save_paper(&self, paper: PaperRecord);
    async fn get_paper(&self, id: Uuid) -> Option<PaperRecord>;
    async fn save_analysis(&self, paper_id: Uuid, analysis: PaperAnalysisResult);
    async fn get_analysis(&self, paper_id: Uuid) -> Option<PaperAnalysisResult>;
    /// All stored papers, newest first.
    async fn list_papers(&self) -> Vec<PaperRecord>;
}

#[derive(Default)]
pub struct InMemoryPaperStore {
    papers: RwLock<HashMap<Uuid, PaperRecord>>,
    analyses: RwLock<HashMap<Uuid, PaperAnalysisResult>>,
}

impl InMemoryPaperStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaperStore for InMemoryPaperStore {
    async fn save_paper(&self, paper: PaperRecord) {
        tracing::debug!(paper_id = %paper.id, title = %paper.title, "Storing paper");
        self.papers.write().await.insert(paper.id, paper);
    }

    async fn get_paper(&self, id: Uuid) -> Option<PaperRecord> {
        self.papers.read().await.get(&id).cloned()
    }

    async fn save_analysis(&self, paper_id: Uuid, analysis: PaperAnalysisResult) {
        self.analyses.write().await.insert(paper_id, analysis);
    }

    async fn get_analysis(&self, paper_id: Uuid) -> Option<PaperAnalysisResult> {
        self.analyses.read().await.get(&paper_id).cloned()
    }

    async fn list_papers(&self) -> Vec<PaperRecord> {
        let mut papers: Vec<PaperRecord> = self.papers.read().await.values().cloned().collect();
        papers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        papers
    }
}
