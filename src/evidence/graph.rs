//! Seed-file backed relationship-graph evidence source.
//!
//! Reads directed edges from a JSON file and ranks them by token overlap
//! between the question and the edge's endpoints, predicate, and detail text.
//! Matched edges surface as [`Location::GraphPath`] descriptors.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

use super::{
    overlap_score, tokenize, EvidenceItem, EvidenceSource, Location, Retrieval,
    RetrievalError, SourceMode, SourceType,
};

/// One directed edge in the seed file.
#[derive(Debug, Clone, Deserialize)]
struct SeedEdge {
    subject: String,
    predicate: String,
    object: String,
    #[serde(default)]
    detail: String,
}

impl SeedEdge {
    fn path(&self) -> String {
        format!("{} -[{}]-> {}", self.subject, self.predicate, self.object)
    }

    /// Readable sentence form used as evidence content.
    fn sentence(&self) -> String {
        let relation = self.predicate.replace('_', " ");
        if self.detail.is_empty() {
            format!("{} {} {}.", self.subject, relation, self.object)
        } else {
            format!("{} {} {}. {}", self.subject, relation, self.object, self.detail)
        }
    }

    /// Text the question is matched against.
    fn match_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.subject,
            self.predicate.replace('_', " "),
            self.object,
            self.detail
        )
    }
}

pub struct SeedGraphSource {
    graph_path: PathBuf,
    fallback_enabled: bool,
}

impl SeedGraphSource {
    pub fn new(graph_path: PathBuf, fallback_enabled: bool) -> Self {
        Self {
            graph_path,
            fallback_enabled,
        }
    }

    fn load_edges(&self) -> Result<(Vec<SeedEdge>, SourceMode), RetrievalError> {
        match std::fs::read_to_string(&self.graph_path) {
            Ok(contents) => {
                let edges: Vec<SeedEdge> = serde_json::from_str(&contents)
                    .map_err(|e| RetrievalError::SeedData(format!("bad graph seed JSON: {e}")))?;
                Ok((edges, SourceMode::Primary))
            }
            Err(e) if self.fallback_enabled => {
                debug!(
                    path = %self.graph_path.display(),
                    error = %e,
                    "graph seed unreadable, serving fallback dataset"
                );
                Ok((fallback_edges(), SourceMode::Fallback))
            }
            Err(e) => Err(RetrievalError::SeedData(format!(
                "cannot read {}: {e}",
                self.graph_path.display()
            ))),
        }
    }
}

#[async_trait]
impl EvidenceSource for SeedGraphSource {
    fn source_type(&self) -> SourceType {
        SourceType::Graph
    }

    async fn retrieve(
        &self,
        question: &str,
        limit: usize,
    ) -> Result<Retrieval, RetrievalError> {
        let (edges, mode) = self.load_edges()?;
        let query_tokens = tokenize(question);

        let mut scored: Vec<EvidenceItem> = edges
            .into_iter()
            .map(|edge| {
                let score = overlap_score(&query_tokens, &edge.match_text());
                EvidenceItem {
                    source_type: SourceType::Graph,
                    source_id: edge.path(),
                    content: edge.sentence(),
                    score,
                    location: Location::GraphPath { path: edge.path() },
                }
            })
            .filter(|item| item.score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(Retrieval { items: scored, mode })
    }
}

/// Built-in demo edges served when the configured seed file is unreadable.
fn fallback_edges() -> Vec<SeedEdge> {
    vec![
        SeedEdge {
            subject: "billing-service".into(),
            predicate: "depends_on".into(),
            object: "postgres".into(),
            detail: "Primary transactional store.".into(),
        },
        SeedEdge {
            subject: "platform-team".into(),
            predicate: "owns".into(),
            object: "billing-service".into(),
            detail: "On-call rotation lives in the team runbook.".into(),
        },
        SeedEdge {
            subject: "reporting-job".into(),
            predicate: "reads_from".into(),
            object: "postgres".into(),
            detail: String::new(),
        },
    ]
}
