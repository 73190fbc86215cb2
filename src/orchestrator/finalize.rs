//! Answer-quality policy: map confidence to a tier and rewrite the answer
//! accordingly.
//!
//! Deliberately separate from the critic so operators can retune tier
//! thresholds without touching scoring. High passes the answer through,
//! medium appends an explicit caveat, low replaces the answer with a safe
//! source-listing non-answer instead of asserting an unsupported claim.

use crate::evidence::SourceType;
use crate::orchestrator::state::{
    ConfidenceTier, Degradation, FinalAnswer, OrchestrationState, Stage,
};

/// Tier boundaries. Constructed from [`ScoringConfig`](crate::config::ScoringConfig).
#[derive(Debug, Clone, Copy)]
pub struct TierPolicy {
    pub high_threshold: f64,
    pub medium_threshold: f64,
}

impl TierPolicy {
    pub fn tier(&self, confidence: f64) -> ConfidenceTier {
        if confidence >= self.high_threshold {
            ConfidenceTier::High
        } else if confidence >= self.medium_threshold {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    /// Consume the terminal state and produce the request's final answer.
    pub fn finalize(&self, mut state: OrchestrationState) -> FinalAnswer {
        state.enter(Stage::Finalized);
        let tier = self.tier(state.confidence);

        let answer = match tier {
            ConfidenceTier::High => state.draft_answer,
            ConfidenceTier::Medium => format!(
                "{}\n\nNote: confidence in this answer is moderate; verify \
                 against the cited sources.",
                state.draft_answer
            ),
            ConfidenceTier::Low => low_confidence_answer(&state),
        };

        FinalAnswer {
            route: state.route,
            answer,
            evidence: state.merged_evidence,
            confidence: state.confidence,
            confidence_tier: tier,
            reason_code: state.reason_code,
            refinement_attempts: state.refinement_attempt,
            degraded: state.degraded,
        }
    }
}

/// Safe non-answer: name what was (or wasn't) consulted instead of guessing.
fn low_confidence_answer(state: &OrchestrationState) -> String {
    let preamble = match state.degraded {
        Some(Degradation::RetrievalUnavailable) => {
            "I couldn't consult the knowledge sources for this question: \
             retrieval is currently unavailable."
        }
        _ => {
            "I don't have enough grounded evidence to answer this confidently."
        }
    };

    let citations: Vec<String> = state
        .merged_evidence
        .iter()
        .filter(|item| item.source_type != SourceType::System)
        .map(|item| item.citation())
        .collect();
    if citations.is_empty() {
        format!(
            "{preamble} Try asking about document timelines, ownership, or \
             dependencies."
        )
    } else {
        format!(
            "{preamble} The closest material found:\nSources: {}",
            citations.join(", ")
        )
    }
}
