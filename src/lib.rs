//! Grounded question answering over two knowledge sources.
//!
//! Sift answers a natural-language question by deciding, per request, which
//! of two independent sources to consult (a private document store and a
//! shared relationship graph), retrieving evidence from one or both
//! concurrently, merging and ranking it deterministically, and synthesizing
//! a cited answer. When the merged evidence scores weak, the orchestrator
//! broadens the search once and retries before answering.
//!
//! | Route | Sources consulted |
//! |----------|---------------------------------|
//! | `direct` | none (small talk) |
//! | `document` | private document store |
//! | `graph` | relationship graph |
//! | `both` | both, concurrently |
//!
//! # Architecture
//!
//! - **Routing**: deterministic cue matching, biased toward retrieval when
//!   ambiguous
//! - **Retrieval**: fan-out over [`evidence::EvidenceSource`] implementations
//!   with per-branch timeouts; failures are typed, never fatal
//! - **Merge**: dynamic score floor, `(source, id)` dedupe, ranked and capped
//! - **Scoring**: weighted critic over count, relevance, diversity, and
//!   citation presence; one bounded refinement round below threshold
//! - **Synthesis**: Gemini via REST when a key is present, extractive
//!   fallback otherwise; a grounding guard keeps answers cited
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`evidence`]: Evidence items, source trait, and the two seed-backed sources
//! - [`orchestrator`]: Router, merger, critic, tier policy, and the state machine
//! - [`synthesis`]: Answer drafting, grounding guard, and the Gemini client

pub mod config;
pub mod evidence;
pub mod orchestrator;
pub mod server;
pub mod synthesis;
