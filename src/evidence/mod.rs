//! Evidence retrieval layer.
//!
//! Defines [`EvidenceItem`] (one retrieved unit of text with source
//! attribution and a source-local relevance score), the [`EvidenceSource`]
//! trait both retrieval backends implement, and the typed failures the
//! orchestrator recovers from. Concrete sources live in [`document`] and
//! [`graph`]; both are seed-file backed with a built-in fallback dataset.

pub mod document;
pub mod graph;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which knowledge source produced an evidence item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Private per-user document store (chunked text).
    Document,
    /// Shared relationship graph (edges between entities).
    Graph,
    /// Diagnostic items injected by the orchestrator, never by a source.
    System,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Graph => "graph",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an item came from within its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Location {
    /// Document chunk: originating file plus chunk index.
    Page { source: String, chunk: usize },
    /// Graph path descriptor, e.g. `billing-service -[depends_on]-> postgres`.
    GraphPath { path: String },
    /// Orchestrator-injected diagnostic item.
    System,
}

/// One retrieved unit of evidence.
///
/// `score` is source-local relevance and not comparable across sources; the
/// merge step only ever compares it after both branches pass through the same
/// floor and ranking rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub source_type: SourceType,
    /// Stable identifier within the source, e.g. `roadmap.pdf#2`.
    pub source_id: String,
    pub content: String,
    pub score: f64,
    pub location: Location,
}

impl EvidenceItem {
    /// `document:roadmap.pdf#2`, the citation form used in answers.
    pub fn citation(&self) -> String {
        format!("{}:{}", self.source_type, self.source_id)
    }
}

/// Whether a source served its primary backend or its fallback dataset.
/// Observability only; the item shape is identical either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    Primary,
    Fallback,
}

impl SourceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

/// Result of one successful retrieval call.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub items: Vec<EvidenceItem>,
    pub mode: SourceMode,
}

/// Typed retrieval failures. Sources never retry internally; recovery is the
/// orchestrator's job.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("retrieval backend error: {0}")]
    Backend(String),

    #[error("retrieval timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("seed data unavailable: {0}")]
    SeedData(String),
}

/// A retrieval backend the orchestrator can fan out to.
///
/// Implementations must return items sorted descending by score and at most
/// `limit` of them. A call either succeeds or reports a typed failure, no
/// internal retries, no partial results.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// The source type every item returned from this source carries.
    fn source_type(&self) -> SourceType;

    async fn retrieve(&self, question: &str, limit: usize)
        -> Result<Retrieval, RetrievalError>;
}

/// Tokenize into lowercase alphanumeric words.
pub(crate) fn tokenize(text: &str) -> std::collections::HashSet<String> {
    let mut tokens = std::collections::HashSet::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            tokens.insert(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.insert(current);
    }
    tokens
}

/// Fraction of query tokens found in the candidate text, in `[0, 1]`.
pub(crate) fn overlap_score(query_tokens: &std::collections::HashSet<String>, candidate: &str) -> f64 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let candidate_tokens = tokenize(candidate);
    let hits = query_tokens
        .iter()
        .filter(|t| candidate_tokens.contains(*t))
        .count();
    hits as f64 / query_tokens.len() as f64
}
