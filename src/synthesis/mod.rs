//! Answer synthesis.
//!
//! Drafts an answer from the question and ranked evidence. When a
//! [`Generator`] is wired in, the draft comes from the external model and is
//! then passed through a grounding guard that guarantees a citation trailer;
//! with no generator, or on any generation failure, synthesis falls back to
//! an extractive template built purely from the evidence. Generation failure
//! is therefore never fatal to a request.

pub mod gemini;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::evidence::EvidenceItem;

/// Typed generation failures.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation API returned HTTP {status}")]
    Api { status: u16 },

    #[error("generation returned an empty completion")]
    EmptyCompletion,

    #[error("no generation credential available")]
    MissingCredential,
}

/// External free-text generation capability. The orchestration core must
/// function with this collaborator entirely absent.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        credential: Option<&str>,
    ) -> Result<String, GenerationError>;
}

/// How a draft was produced, reported in telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisMode {
    Generated,
    Extractive,
}

impl SynthesisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generated => "generated",
            Self::Extractive => "extractive",
        }
    }
}

pub struct Draft {
    pub text: String,
    pub mode: SynthesisMode,
}

pub struct Synthesizer {
    generator: Option<Arc<dyn Generator>>,
}

impl Synthesizer {
    pub fn new(generator: Option<Arc<dyn Generator>>) -> Self {
        Self { generator }
    }

    /// Draft an answer for `question` grounded in `evidence`.
    pub async fn synthesize(
        &self,
        question: &str,
        evidence: &[EvidenceItem],
        credential: Option<&str>,
    ) -> Draft {
        if evidence.is_empty() {
            return Draft {
                text: no_context_answer(),
                mode: SynthesisMode::Extractive,
            };
        }

        if let Some(generator) = &self.generator {
            let prompt = build_prompt(question, evidence);
            match generator.complete(&prompt, credential).await {
                Ok(text) => {
                    return Draft {
                        text: enforce_grounding(&text, evidence),
                        mode: SynthesisMode::Generated,
                    };
                }
                Err(e) => {
                    warn!(error = %e, "generation failed, falling back to extractive synthesis");
                }
            }
        }

        Draft {
            text: extractive_answer(question, evidence),
            mode: SynthesisMode::Extractive,
        }
    }
}

/// Prompt instructing the model to stay inside the provided context and cite
/// sources in brackets.
fn build_prompt(question: &str, evidence: &[EvidenceItem]) -> String {
    let context: Vec<String> = evidence
        .iter()
        .map(|item| format!("[{}] {}", item.citation(), item.content))
        .collect();
    format!(
        "Answer using only the provided context. Keep it concise. \
         Include source references in brackets.\n\n\
         Question: {question}\n\n\
         Context:\n{}",
        context.join("\n")
    )
}

/// Guarantee generated text carries a citation signal; an uncited draft gets
/// the full source trailer appended, an empty draft is rebuilt extractively.
fn enforce_grounding(generated: &str, evidence: &[EvidenceItem]) -> String {
    let resolved = generated.trim();
    if resolved.is_empty() {
        return extractive_answer("", evidence);
    }
    if has_citation_signal(resolved) {
        return resolved.to_string();
    }
    format!("{resolved}\n\nSources: {}", citation_list(evidence))
}

fn has_citation_signal(answer: &str) -> bool {
    answer.to_lowercase().contains("sources:") || answer.contains('[')
}

/// Template answer assembled from evidence when no generator is available.
fn extractive_answer(question: &str, evidence: &[EvidenceItem]) -> String {
    let lines: Vec<String> = evidence
        .iter()
        .map(|item| format!("- {}", item.content))
        .collect();
    let heading = if question.is_empty() {
        "Grounded summary of the retrieved evidence:".to_string()
    } else {
        format!("Question: {question}\nGrounded summary of the retrieved evidence:")
    };
    format!(
        "{heading}\n{}\nSources: {}",
        lines.join("\n"),
        citation_list(evidence)
    )
}

fn citation_list(evidence: &[EvidenceItem]) -> String {
    evidence
        .iter()
        .map(|item| item.citation())
        .collect::<Vec<_>>()
        .join(", ")
}

fn no_context_answer() -> String {
    "I could not find matching context for this question yet. Try asking \
     about document timelines, ownership, or dependencies."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{Location, SourceType};

    struct FixedGenerator(Result<&'static str, ()>);

    #[async_trait]
    impl Generator for FixedGenerator {
        async fn complete(
            &self,
            _prompt: &str,
            _credential: Option<&str>,
        ) -> Result<String, GenerationError> {
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(()) => Err(GenerationError::Api { status: 500 }),
            }
        }
    }

    fn evidence() -> Vec<EvidenceItem> {
        vec![
            EvidenceItem {
                source_type: SourceType::Document,
                source_id: "plan.md#0".into(),
                content: "Cutover happens in September.".into(),
                score: 0.9,
                location: Location::Page {
                    source: "plan.md".into(),
                    chunk: 0,
                },
            },
            EvidenceItem {
                source_type: SourceType::Graph,
                source_id: "team -[owns]-> billing".into(),
                content: "team owns billing.".into(),
                score: 0.7,
                location: Location::GraphPath {
                    path: "team -[owns]-> billing".into(),
                },
            },
        ]
    }

    #[tokio::test]
    async fn extractive_when_no_generator() {
        let synthesizer = Synthesizer::new(None);
        let draft = synthesizer.synthesize("when is cutover?", &evidence(), None).await;
        assert_eq!(draft.mode, SynthesisMode::Extractive);
        assert!(draft.text.contains("Cutover happens in September."));
        assert!(draft.text.contains("Sources: document:plan.md#0, graph:team -[owns]-> billing"));
    }

    #[tokio::test]
    async fn cited_generation_passes_through() {
        let synthesizer =
            Synthesizer::new(Some(Arc::new(FixedGenerator(Ok("September [plan.md#0].")))));
        let draft = synthesizer.synthesize("when?", &evidence(), None).await;
        assert_eq!(draft.mode, SynthesisMode::Generated);
        assert_eq!(draft.text, "September [plan.md#0].");
    }

    #[tokio::test]
    async fn uncited_generation_gets_source_trailer() {
        let synthesizer =
            Synthesizer::new(Some(Arc::new(FixedGenerator(Ok("Cutover is in September.")))));
        let draft = synthesizer.synthesize("when?", &evidence(), None).await;
        assert!(draft.text.starts_with("Cutover is in September."));
        assert!(draft.text.contains("\n\nSources: document:plan.md#0"));
    }

    #[tokio::test]
    async fn generation_failure_falls_back_to_extractive() {
        let synthesizer = Synthesizer::new(Some(Arc::new(FixedGenerator(Err(())))));
        let draft = synthesizer.synthesize("when?", &evidence(), None).await;
        assert_eq!(draft.mode, SynthesisMode::Extractive);
        assert!(draft.text.contains("Sources:"));
    }

    #[tokio::test]
    async fn empty_evidence_yields_no_context_answer() {
        let synthesizer =
            Synthesizer::new(Some(Arc::new(FixedGenerator(Ok("should not be called")))));
        let draft = synthesizer.synthesize("anything", &[], None).await;
        assert_eq!(draft.mode, SynthesisMode::Extractive);
        assert!(draft.text.contains("could not find matching context"));
    }

    #[test]
    fn prompt_embeds_citations_and_question() {
        let prompt = build_prompt("when is cutover?", &evidence());
        assert!(prompt.contains("Question: when is cutover?"));
        assert!(prompt.contains("[document:plan.md#0] Cutover happens in September."));
    }

    #[test]
    fn empty_generated_draft_is_rebuilt_extractively() {
        let text = enforce_grounding("   ", &evidence());
        assert!(text.contains("Sources:"));
        assert!(text.contains("Cutover happens in September."));
    }
}
