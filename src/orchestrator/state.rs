//! Request-scoped orchestration state and the terminal answer shape.

use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceItem;
use crate::orchestrator::router::Route;
use crate::orchestrator::telemetry::TelemetryEvent;

/// Immutable per-request input.
#[derive(Debug, Clone, Deserialize)]
pub struct Query {
    pub question: String,
    /// Caller-supplied generation credential, overriding the configured key.
    #[serde(default)]
    pub generation_credential: Option<String>,
    /// Overrides the configured initial per-source retrieval limit.
    #[serde(default)]
    pub limit_override: Option<usize>,
}

impl Query {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            generation_credential: None,
            limit_override: None,
        }
    }
}

/// State-machine stages. `Finalized` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Routed,
    Retrieving,
    Merging,
    Synthesizing,
    Scoring,
    Refining,
    Finalized,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Routed => "routed",
            Self::Retrieving => "retrieving",
            Self::Merging => "merging",
            Self::Synthesizing => "synthesizing",
            Self::Scoring => "scoring",
            Self::Refining => "refining",
            Self::Finalized => "finalized",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a low-tier answer degraded, kept distinguishable so a caller can tell
/// "we looked and found little" from "we couldn't look".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Degradation {
    /// Retrieval ran but produced no usable evidence.
    NoEvidence,
    /// Every required branch failed and fallback was disabled.
    RetrievalUnavailable,
}

/// Final confidence tier applied by the answer-quality policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// The single mutable record threading through one request's state machine.
/// Created at request start, discarded at request end, never shared across
/// requests. Branch outputs land here only after the fan-in barrier.
#[derive(Debug)]
pub struct OrchestrationState {
    pub request_id: String,
    pub query: Query,
    pub route: Route,
    pub route_reason: &'static str,
    pub stage: Stage,
    pub merged_evidence: Vec<EvidenceItem>,
    pub draft_answer: String,
    pub confidence: f64,
    pub reason_code: &'static str,
    pub refinement_attempt: u32,
    pub degraded: Option<Degradation>,
    /// Append-only; branch error lists are concatenated in after the barrier.
    pub errors: Vec<String>,
    /// Append-only; same accumulation rule as `errors`.
    pub telemetry: Vec<TelemetryEvent>,
}

impl OrchestrationState {
    pub fn new(query: Query) -> Self {
        Self {
            request_id: uuid::Uuid::now_v7().to_string(),
            query,
            route: Route::Both,
            route_reason: "",
            stage: Stage::Routed,
            merged_evidence: Vec::new(),
            draft_answer: String::new(),
            confidence: 0.0,
            reason_code: "",
            refinement_attempt: 0,
            degraded: None,
            errors: Vec::new(),
            telemetry: Vec::new(),
        }
    }

    pub fn enter(&mut self, stage: Stage) {
        tracing::trace!(request_id = %self.request_id, stage = %stage, "state transition");
        self.stage = stage;
    }
}

/// The request's terminal output.
#[derive(Debug, Clone, Serialize)]
pub struct FinalAnswer {
    pub route: Route,
    pub answer: String,
    pub evidence: Vec<EvidenceItem>,
    pub confidence: f64,
    pub confidence_tier: ConfidenceTier,
    pub reason_code: &'static str,
    pub refinement_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<Degradation>,
}
