//! Confidence scoring over merged evidence and the draft answer.
//!
//! Pure weighted combination of bounded sub-signals: evidence-count adequacy,
//! average relevance, cross-source diversity (route `Both` only), and whether
//! the draft textually cites a source. The reason code names the dominant
//! deficiency for operator triage; it never affects control flow on its own.

use crate::evidence::{EvidenceItem, SourceType};
use crate::orchestrator::router::Route;
use std::collections::HashSet;

/// The critic's verdict on one synthesis pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    /// In `[0, 1]`.
    pub confidence: f64,
    /// Dominant deficiency, or `"adequate"` / `"direct_route"`.
    pub reason_code: &'static str,
}

/// Signal weights for the hybrid route; diversity only matters when two
/// sources were asked.
const BOTH_WEIGHTS: [(Signal, f64); 4] = [
    (Signal::AverageScore, 0.40),
    (Signal::Count, 0.25),
    (Signal::Diversity, 0.20),
    (Signal::Citation, 0.15),
];

const SINGLE_WEIGHTS: [(Signal, f64); 3] = [
    (Signal::AverageScore, 0.50),
    (Signal::Count, 0.30),
    (Signal::Citation, 0.20),
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Signal {
    Count,
    AverageScore,
    Diversity,
    Citation,
}

impl Signal {
    fn reason_code(self) -> &'static str {
        match self {
            Self::Count => "insufficient_snippets",
            Self::AverageScore => "low_average_score",
            Self::Diversity => "missing_diversity",
            Self::Citation => "missing_citation",
        }
    }
}

/// Score a draft answer against its evidence.
pub fn score(
    route: Route,
    evidence: &[EvidenceItem],
    draft: &str,
    min_evidence_count: usize,
) -> Assessment {
    if route == Route::Direct {
        return Assessment {
            confidence: 1.0,
            reason_code: "direct_route",
        };
    }

    // System diagnostics are not evidence.
    let items: Vec<&EvidenceItem> = evidence
        .iter()
        .filter(|i| i.source_type != SourceType::System)
        .collect();

    if items.is_empty() {
        return Assessment {
            confidence: 0.0,
            reason_code: "insufficient_snippets",
        };
    }

    let count_signal = (items.len() as f64 / min_evidence_count.max(1) as f64).min(1.0);
    let avg_signal = (items.iter().map(|i| i.score).sum::<f64>() / items.len() as f64)
        .clamp(0.0, 1.0);
    // Reward evidence from both sources, not merely "some" evidence: on the
    // hybrid route a single-source result set earns no diversity credit.
    let diversity_signal = {
        let kinds: HashSet<SourceType> = items.iter().map(|i| i.source_type).collect();
        if kinds.len() >= 2 {
            1.0
        } else {
            0.0
        }
    };
    let citation_signal = if has_citation(draft, &items) { 1.0 } else { 0.0 };

    let weights: &[(Signal, f64)] = if route == Route::Both {
        &BOTH_WEIGHTS
    } else {
        &SINGLE_WEIGHTS
    };

    let mut confidence = 0.0;
    let mut dominant: (&'static str, f64) = ("adequate", 0.0);
    for (signal, weight) in weights {
        let value = match signal {
            Signal::Count => count_signal,
            Signal::AverageScore => avg_signal,
            Signal::Diversity => diversity_signal,
            Signal::Citation => citation_signal,
        };
        confidence += weight * value;
        let deficit = weight * (1.0 - value);
        // Deficits under 0.1 are noise, not a deficiency worth triaging.
        if deficit >= 0.1 && deficit > dominant.1 + 1e-9 {
            dominant = (signal.reason_code(), deficit);
        }
    }

    Assessment {
        confidence: (confidence.clamp(0.0, 1.0) * 10_000.0).round() / 10_000.0,
        reason_code: dominant.0,
    }
}

/// True if the draft references at least one evidence id, or carries the
/// extractive synthesizer's `Sources:` trailer.
fn has_citation(draft: &str, items: &[&EvidenceItem]) -> bool {
    if draft.to_lowercase().contains("sources:") {
        return true;
    }
    items.iter().any(|i| draft.contains(&i.source_id))
}
