#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sift::config::{RetrievalConfig, ScoringConfig};
use sift::evidence::{
    EvidenceItem, EvidenceSource, Location, Retrieval, RetrievalError, SourceMode,
    SourceType,
};
use sift::orchestrator::Orchestrator;
use sift::synthesis::Synthesizer;

/// What a stub source does when asked to retrieve.
pub enum Behavior {
    /// Return these items (truncated to the requested limit).
    Items(Vec<EvidenceItem>),
    /// Return items computed from the requested limit, used to exercise
    /// refinement's limit doubling.
    PerLimit(Box<dyn Fn(usize) -> Vec<EvidenceItem> + Send + Sync>),
    /// Fail with a backend error.
    Fail,
    /// Sleep past the branch timeout, then return these items.
    Slow(Duration, Vec<EvidenceItem>),
}

/// Scripted evidence source that records the limit of every call.
pub struct StubSource {
    source_type: SourceType,
    behavior: Behavior,
    pub calls: Arc<Mutex<Vec<usize>>>,
}

impl StubSource {
    pub fn new(source_type: SourceType, behavior: Behavior) -> Self {
        Self {
            source_type,
            behavior,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle for asserting call counts/limits after the source moves into
    /// the orchestrator.
    pub fn call_log(&self) -> Arc<Mutex<Vec<usize>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl EvidenceSource for StubSource {
    fn source_type(&self) -> SourceType {
        self.source_type
    }

    async fn retrieve(
        &self,
        _question: &str,
        limit: usize,
    ) -> Result<Retrieval, RetrievalError> {
        self.calls.lock().unwrap().push(limit);
        match &self.behavior {
            Behavior::Items(items) => {
                let mut items = items.clone();
                items.truncate(limit);
                Ok(Retrieval {
                    items,
                    mode: SourceMode::Primary,
                })
            }
            Behavior::PerLimit(f) => {
                let mut items = f(limit);
                items.truncate(limit);
                Ok(Retrieval {
                    items,
                    mode: SourceMode::Primary,
                })
            }
            Behavior::Fail => Err(RetrievalError::Backend("stub backend down".into())),
            Behavior::Slow(delay, items) => {
                tokio::time::sleep(*delay).await;
                Ok(Retrieval {
                    items: items.clone(),
                    mode: SourceMode::Primary,
                })
            }
        }
    }
}

/// Evidence item with the location shape its source type implies.
pub fn item(source_type: SourceType, id: &str, score: f64) -> EvidenceItem {
    let location = match source_type {
        SourceType::Document => Location::Page {
            source: id.to_string(),
            chunk: 0,
        },
        SourceType::Graph => Location::GraphPath {
            path: id.to_string(),
        },
        SourceType::System => Location::System,
    };
    EvidenceItem {
        source_type,
        source_id: id.to_string(),
        content: format!("evidence text for {id}"),
        score,
        location,
    }
}

/// Retrieval config with a short branch timeout so slow-source tests run fast.
pub fn retrieval_config() -> RetrievalConfig {
    RetrievalConfig {
        initial_limit: 3,
        limit_cap: 12,
        max_merged_results: 5,
        branch_timeout_ms: 100,
        docs_path: "/unused/docs.json".into(),
        graph_path: "/unused/graph.json".into(),
        fallback_enabled: true,
    }
}

pub fn scoring_config() -> ScoringConfig {
    ScoringConfig {
        confidence_threshold: 0.62,
        min_evidence_count: 3,
        max_refinement_rounds: 1,
        high_threshold: 0.70,
        medium_threshold: 0.40,
    }
}

/// Orchestrator over stub sources with extractive-only synthesis.
pub fn orchestrator(
    document: StubSource,
    graph: StubSource,
    retrieval: RetrievalConfig,
    scoring: ScoringConfig,
) -> Orchestrator {
    Orchestrator::new(
        Arc::new(document),
        Arc::new(graph),
        Synthesizer::new(None),
        retrieval,
        scoring,
    )
}
