//! Seed-file backed document evidence source.
//!
//! Reads chunked private documents from a JSON file and ranks chunks by
//! stop-word-filtered token overlap with the question. When the seed file is
//! missing and fallback is enabled, serves a small built-in dataset and
//! reports [`SourceMode::Fallback`] so the degradation is observable.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::debug;

use super::{
    overlap_score, tokenize, EvidenceItem, EvidenceSource, Location, Retrieval,
    RetrievalError, SourceMode, SourceType,
};

/// Filler vocabulary that would otherwise dominate overlap scoring because
/// nearly every document chunk mentions it.
const QUERY_STOP_WORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "document", "documents", "does", "file",
    "files", "for", "from", "how", "in", "is", "of", "on", "please", "tell",
    "that", "the", "this", "what", "which", "with",
];

/// One chunk in the seed file.
#[derive(Debug, Clone, Deserialize)]
struct SeedChunk {
    source: String,
    chunk_id: usize,
    content: String,
}

pub struct SeedDocumentSource {
    docs_path: PathBuf,
    fallback_enabled: bool,
}

impl SeedDocumentSource {
    pub fn new(docs_path: PathBuf, fallback_enabled: bool) -> Self {
        Self {
            docs_path,
            fallback_enabled,
        }
    }

    fn load_chunks(&self) -> Result<(Vec<SeedChunk>, SourceMode), RetrievalError> {
        match std::fs::read_to_string(&self.docs_path) {
            Ok(contents) => {
                let chunks: Vec<SeedChunk> = serde_json::from_str(&contents)
                    .map_err(|e| RetrievalError::SeedData(format!("bad document seed JSON: {e}")))?;
                Ok((chunks, SourceMode::Primary))
            }
            Err(e) if self.fallback_enabled => {
                debug!(
                    path = %self.docs_path.display(),
                    error = %e,
                    "document seed unreadable, serving fallback dataset"
                );
                Ok((fallback_chunks(), SourceMode::Fallback))
            }
            Err(e) => Err(RetrievalError::SeedData(format!(
                "cannot read {}: {e}",
                self.docs_path.display()
            ))),
        }
    }
}

#[async_trait]
impl EvidenceSource for SeedDocumentSource {
    fn source_type(&self) -> SourceType {
        SourceType::Document
    }

    async fn retrieve(
        &self,
        question: &str,
        limit: usize,
    ) -> Result<Retrieval, RetrievalError> {
        let (chunks, mode) = self.load_chunks()?;
        let query_tokens = query_tokens(question);

        let mut scored: Vec<EvidenceItem> = chunks
            .into_iter()
            .map(|chunk| {
                let score = overlap_score(&query_tokens, &chunk.content);
                EvidenceItem {
                    source_type: SourceType::Document,
                    source_id: format!("{}#{}", chunk.source, chunk.chunk_id),
                    score,
                    location: Location::Page {
                        source: chunk.source,
                        chunk: chunk.chunk_id,
                    },
                    content: chunk.content,
                }
            })
            .filter(|item| item.score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(Retrieval { items: scored, mode })
    }
}

/// Question tokens minus stop words. Falls back to the unfiltered set when
/// the question is entirely stop words, so matching stays total.
fn query_tokens(question: &str) -> HashSet<String> {
    let all = tokenize(question);
    let filtered: HashSet<String> = all
        .iter()
        .filter(|t| !QUERY_STOP_WORDS.contains(&t.as_str()))
        .cloned()
        .collect();
    if filtered.is_empty() {
        all
    } else {
        filtered
    }
}

/// Built-in demo chunks served when the configured seed file is unreadable.
fn fallback_chunks() -> Vec<SeedChunk> {
    vec![
        SeedChunk {
            source: "onboarding.md".into(),
            chunk_id: 0,
            content: "The platform migration timeline targets Q3: data export in July, \
                      cutover rehearsal in August, production switch in September."
                .into(),
        },
        SeedChunk {
            source: "onboarding.md".into(),
            chunk_id: 1,
            content: "Upload policy: private documents are chunked at 800 characters \
                      with 120 characters of overlap before indexing."
                .into(),
        },
        SeedChunk {
            source: "runbook.md".into(),
            chunk_id: 0,
            content: "The billing service deploy pipeline runs nightly and pages the \
                      on-call owner when the smoke suite fails."
                .into(),
        },
    ]
}
