//! Query routing.
//!
//! Pure, deterministic cue matching that classifies a question into a
//! [`Route`]. No I/O and total over any input string: unmatched questions
//! fall back to [`Route::Both`], trading latency for recall, since a wrong
//! `Direct` classification would silently starve the caller of evidence.

use serde::{Deserialize, Serialize};

/// Which evidence source(s) to consult for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Small talk, answered without retrieval.
    Direct,
    /// Private document store only.
    Document,
    /// Relationship graph only.
    Graph,
    /// Fan out to both sources.
    Both,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Document => "document",
            Self::Graph => "graph",
            Self::Both => "both",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Self::Direct),
            "document" => Ok(Self::Document),
            "graph" => Ok(Self::Graph),
            "both" => Ok(Self::Both),
            _ => Err(format!("unknown route: {s}")),
        }
    }
}

/// A route plus the cue that produced it, for telemetry.
#[derive(Debug, Clone, Serialize)]
pub struct RouteDecision {
    pub route: Route,
    pub reason: &'static str,
}

const GREETING_PREFIXES: &[&str] = &[
    "hi", "hello", "hey", "good morning", "good afternoon", "good evening",
];

const DOCUMENT_CUES: &[&str] = &[
    "pdf", "document", "documents", "file", "files", "page", "pages",
    "timeline", "policy", "upload", "uploaded",
];

const GRAPH_CUES: &[&str] = &[
    "graph", "dependency", "dependencies", "depends", "relationship",
    "relationships", "owner", "owners", "owns", "ownership", "hierarchy",
];

/// Vocabulary that asks to relate material across both sources.
const COMPARISON_CUES: &[&str] = &["compare", "comparison", "versus", "vs", "both", "difference"];

/// Classify a question. Identical input always yields the identical decision.
pub fn classify(question: &str) -> RouteDecision {
    let normalized = question.trim().to_lowercase();

    if is_greeting(&normalized) {
        return RouteDecision {
            route: Route::Direct,
            reason: "greeting",
        };
    }

    let tokens = crate::evidence::tokenize(&normalized);
    let wants_docs = DOCUMENT_CUES.iter().any(|cue| tokens.contains(*cue));
    let wants_graph = GRAPH_CUES.iter().any(|cue| tokens.contains(*cue));
    let wants_comparison = COMPARISON_CUES.iter().any(|cue| tokens.contains(*cue));

    match (wants_docs, wants_graph) {
        (true, true) => RouteDecision {
            route: Route::Both,
            reason: "document_and_graph_cues",
        },
        _ if wants_comparison => RouteDecision {
            route: Route::Both,
            reason: "comparison_cue",
        },
        (true, false) => RouteDecision {
            route: Route::Document,
            reason: "document_cues",
        },
        (false, true) => RouteDecision {
            route: Route::Graph,
            reason: "graph_cues",
        },
        (false, false) => RouteDecision {
            route: Route::Both,
            reason: "no_cues_default_hybrid",
        },
    }
}

/// Greeting = known prefix followed by a word boundary, so "highlight the
/// timeline" never routes to small talk.
fn is_greeting(normalized: &str) -> bool {
    GREETING_PREFIXES.iter().any(|prefix| {
        normalized.strip_prefix(prefix).is_some_and(|rest| {
            rest.chars().next().map_or(true, |c| !c.is_alphanumeric())
        })
    })
}
