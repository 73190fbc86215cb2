//! The orchestration engine.
//!
//! One [`Orchestrator::run`] call drives a request-scoped state machine:
//! route → fan-out retrieval → merge → synthesize → score → at most one
//! refinement round → finalize. Retrieval branches run concurrently on route
//! `both` with a per-branch timeout; a branch failure never unwinds the run,
//! it is captured as a typed outcome and absorbed at the merge barrier.

pub mod critic;
pub mod finalize;
pub mod merge;
pub mod router;
pub mod state;
pub mod telemetry;

use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::{RetrievalConfig, ScoringConfig, SiftConfig};
use crate::evidence::document::SeedDocumentSource;
use crate::evidence::graph::SeedGraphSource;
use crate::evidence::{
    EvidenceItem, EvidenceSource, Location, RetrievalError, SourceType,
};
use crate::synthesis::gemini::GeminiGenerator;
use crate::synthesis::{Generator, Synthesizer};
use finalize::TierPolicy;
use router::Route;
use state::{Degradation, FinalAnswer, OrchestrationState, Query, Stage};
use telemetry::TelemetryEvent;

/// Canned reply for small-talk queries; no retrieval is consulted.
const DIRECT_ANSWER: &str =
    "Hello! Ask me about document timelines, ownership, or dependency links.";

/// Request-level failures. Everything else degrades into a low-tier answer.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("question must not be empty")]
    EmptyQuestion,
}

/// Everything one retrieval branch brings back to the fan-in barrier. Each
/// branch owns its own error and telemetry lists; the orchestrator
/// concatenates them after the join, so concurrent branches never share a
/// writable accumulator.
struct BranchOutcome {
    source: SourceType,
    items: Vec<EvidenceItem>,
    error: Option<RetrievalError>,
    events: Vec<TelemetryEvent>,
}

pub struct Orchestrator {
    document_source: Arc<dyn EvidenceSource>,
    graph_source: Arc<dyn EvidenceSource>,
    synthesizer: Synthesizer,
    retrieval: RetrievalConfig,
    scoring: ScoringConfig,
    tier_policy: TierPolicy,
}

impl Orchestrator {
    /// Wire an orchestrator from explicit collaborators and configuration.
    /// Config is injected, not ambient, so one process can run differently
    /// tuned orchestrators side by side.
    pub fn new(
        document_source: Arc<dyn EvidenceSource>,
        graph_source: Arc<dyn EvidenceSource>,
        synthesizer: Synthesizer,
        retrieval: RetrievalConfig,
        scoring: ScoringConfig,
    ) -> Self {
        let tier_policy = TierPolicy {
            high_threshold: scoring.high_threshold,
            medium_threshold: scoring.medium_threshold,
        };
        Self {
            document_source,
            graph_source,
            synthesizer,
            retrieval,
            scoring,
            tier_policy,
        }
    }

    /// Production wiring: seed-backed sources plus a Gemini generator when a
    /// key is configured.
    pub fn from_config(config: &SiftConfig) -> anyhow::Result<Self> {
        let document_source = Arc::new(SeedDocumentSource::new(
            config.resolved_docs_path(),
            config.retrieval.fallback_enabled,
        ));
        let graph_source = Arc::new(SeedGraphSource::new(
            config.resolved_graph_path(),
            config.retrieval.fallback_enabled,
        ));

        let generator: Option<Arc<dyn Generator>> = if config.synthesis.gemini_api_key.is_empty() {
            debug!("no generation key configured, synthesis is extractive");
            None
        } else {
            Some(Arc::new(GeminiGenerator::new(&config.synthesis)?))
        };

        Ok(Self::new(
            document_source,
            graph_source,
            Synthesizer::new(generator),
            config.retrieval.clone(),
            config.scoring.clone(),
        ))
    }

    /// Run one request through the state machine.
    ///
    /// Returns `Err` only for malformed input; retrieval and generation
    /// degradation is absorbed into a low-tier [`FinalAnswer`].
    pub async fn run(&self, query: Query) -> Result<FinalAnswer, QueryError> {
        if query.question.trim().is_empty() {
            return Err(QueryError::EmptyQuestion);
        }

        let mut state = OrchestrationState::new(query);
        let decision = router::classify(&state.query.question);
        state.route = decision.route;
        state.route_reason = decision.reason;
        state.telemetry.push(TelemetryEvent::new(
            "route_selected",
            json!({ "route": decision.route.as_str(), "reason": decision.reason }),
        ));

        if state.route == Route::Direct {
            state.enter(Stage::Synthesizing);
            state.draft_answer = DIRECT_ANSWER.to_string();
            state.confidence = 1.0;
            state.reason_code = "direct_route";
            state.telemetry.push(TelemetryEvent::new(
                "synthesis_completed",
                json!({ "mode": "direct" }),
            ));
        } else {
            let base_limit = state
                .query
                .limit_override
                .unwrap_or(self.retrieval.initial_limit)
                .max(1);

            // Bounded by the attempt counter, never by a time budget: at most
            // max_refinement_rounds + 1 retrieval passes.
            loop {
                let limit = pass_limit(
                    base_limit,
                    state.refinement_attempt,
                    self.retrieval.limit_cap,
                );
                self.retrieval_pass(&mut state, limit).await;

                state.enter(Stage::Synthesizing);
                let draft = self
                    .synthesizer
                    .synthesize(
                        &state.query.question,
                        &state.merged_evidence,
                        state.query.generation_credential.as_deref(),
                    )
                    .await;
                state.telemetry.push(TelemetryEvent::new(
                    "synthesis_completed",
                    json!({ "mode": draft.mode.as_str() }),
                ));

                state.enter(Stage::Scoring);
                let assessment = critic::score(
                    state.route,
                    &state.merged_evidence,
                    &draft.text,
                    self.scoring.min_evidence_count,
                );
                state.draft_answer = draft.text;
                state.confidence = assessment.confidence;
                state.reason_code = assessment.reason_code;
                state.telemetry.push(TelemetryEvent::new(
                    "scoring_completed",
                    json!({
                        "confidence": assessment.confidence,
                        "reason_code": assessment.reason_code,
                        "attempt": state.refinement_attempt,
                    }),
                ));

                let refine = assessment.confidence < self.scoring.confidence_threshold
                    && state.refinement_attempt < self.scoring.max_refinement_rounds;
                if !refine {
                    break;
                }

                state.refinement_attempt += 1;
                state.enter(Stage::Refining);
                state.telemetry.push(TelemetryEvent::new(
                    "refinement_started",
                    json!({
                        "attempt": state.refinement_attempt,
                        "next_limit": pass_limit(
                            base_limit,
                            state.refinement_attempt,
                            self.retrieval.limit_cap,
                        ),
                    }),
                ));
            }
        }

        state.telemetry.push(TelemetryEvent::new(
            "orchestration_completed",
            json!({
                "evidence_count": state.merged_evidence.len(),
                "confidence": state.confidence,
                "refinement_attempts": state.refinement_attempt,
                "errors": state.errors,
            }),
        ));
        telemetry::emit(&state.request_id, state.route.as_str(), &state.telemetry);

        Ok(self.tier_policy.finalize(state))
    }

    /// One retrieve→merge pass. Fans out to the route's sources, waits for
    /// every branch to complete or definitively fail, then merges behind the
    /// barrier and injects a diagnostic item if nothing survived.
    async fn retrieval_pass(&self, state: &mut OrchestrationState, limit: usize) {
        state.enter(Stage::Retrieving);
        state.degraded = None;
        let question = state.query.question.clone();

        let outcomes: Vec<BranchOutcome> = match state.route {
            Route::Document => {
                vec![self.run_branch(&self.document_source, &question, limit).await]
            }
            Route::Graph => {
                vec![self.run_branch(&self.graph_source, &question, limit).await]
            }
            Route::Both => {
                let (document, graph) = tokio::join!(
                    self.run_branch(&self.document_source, &question, limit),
                    self.run_branch(&self.graph_source, &question, limit),
                );
                vec![document, graph]
            }
            // Direct never reaches retrieval.
            Route::Direct => Vec::new(),
        };

        state.enter(Stage::Merging);
        let attempted = outcomes.len();
        let mut failed = 0;
        let mut branches: Vec<Vec<EvidenceItem>> = Vec::with_capacity(attempted);
        for outcome in outcomes {
            state.telemetry.extend(outcome.events);
            if let Some(error) = outcome.error {
                failed += 1;
                state.errors.push(format!("{}: {error}", outcome.source));
            }
            branches.push(outcome.items);
        }

        state.merged_evidence = merge::merge(branches, self.retrieval.max_merged_results);
        state.telemetry.push(TelemetryEvent::new(
            "fan_in_completed",
            json!({ "count": state.merged_evidence.len(), "limit": limit }),
        ));

        if state.merged_evidence.is_empty() {
            let kind = if failed == attempted && attempted > 0 && !self.retrieval.fallback_enabled
            {
                Degradation::RetrievalUnavailable
            } else {
                Degradation::NoEvidence
            };
            state.degraded = Some(kind);
            state.merged_evidence.push(system_item(kind));
        }
    }

    /// Run a single branch under the per-branch timeout. A timed-out branch
    /// is a failure; its partial results are discarded because they never
    /// passed the source's final ranking.
    async fn run_branch(
        &self,
        source: &Arc<dyn EvidenceSource>,
        question: &str,
        limit: usize,
    ) -> BranchOutcome {
        let source_type = source.source_type();
        let budget = Duration::from_millis(self.retrieval.branch_timeout_ms);
        let started = Instant::now();

        let (items, error, event) =
            match tokio::time::timeout(budget, source.retrieve(question, limit)).await {
                Ok(Ok(retrieval)) => {
                    let event = TelemetryEvent::new(
                        "branch_completed",
                        json!({
                            "source": source_type.as_str(),
                            "count": retrieval.items.len(),
                            "mode": retrieval.mode.as_str(),
                            "limit": limit,
                        }),
                    );
                    (retrieval.items, None, event)
                }
                Ok(Err(error)) => {
                    let event = TelemetryEvent::new(
                        "branch_failed",
                        json!({
                            "source": source_type.as_str(),
                            "error": error.to_string(),
                        }),
                    );
                    (Vec::new(), Some(error), event)
                }
                Err(_) => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    let error = RetrievalError::Timeout { elapsed_ms };
                    let event = TelemetryEvent::new(
                        "branch_timed_out",
                        json!({
                            "source": source_type.as_str(),
                            "elapsed_ms": elapsed_ms,
                        }),
                    );
                    (Vec::new(), Some(error), event)
                }
            };

        BranchOutcome {
            source: source_type,
            items,
            error,
            events: vec![event],
        }
    }
}

/// Per-source limit for a given pass: doubled per refinement attempt, capped.
fn pass_limit(base: usize, attempt: u32, cap: usize) -> usize {
    base.saturating_mul(1 << attempt.min(8)).min(cap.max(1))
}

/// Diagnostic evidence item injected when a pass produces nothing.
fn system_item(kind: Degradation) -> EvidenceItem {
    let (source_id, content) = match kind {
        Degradation::NoEvidence => (
            "no-evidence",
            "No evidence matched this question in the available sources.",
        ),
        Degradation::RetrievalUnavailable => (
            "retrieval-unavailable",
            "Evidence retrieval failed for every consulted source.",
        ),
    };
    EvidenceItem {
        source_type: SourceType::System,
        source_id: source_id.to_string(),
        content: content.to_string(),
        score: 0.0,
        location: Location::System,
    }
}
