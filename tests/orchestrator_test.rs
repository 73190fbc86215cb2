mod helpers;

use helpers::{item, orchestrator, retrieval_config, scoring_config, Behavior, StubSource};
use sift::evidence::SourceType;
use sift::orchestrator::router::Route;
use sift::orchestrator::state::{ConfidenceTier, Degradation, Query};
use sift::orchestrator::QueryError;
use std::time::Duration;

#[tokio::test]
async fn greeting_routes_direct_without_retrieval() {
    let document = StubSource::new(SourceType::Document, Behavior::Items(vec![]));
    let graph = StubSource::new(SourceType::Graph, Behavior::Items(vec![]));
    let doc_calls = document.call_log();
    let graph_calls = graph.call_log();
    let engine = orchestrator(document, graph, retrieval_config(), scoring_config());

    let answer = engine.run(Query::new("Hello")).await.unwrap();

    assert_eq!(answer.route, Route::Direct);
    assert!(answer.evidence.is_empty());
    assert_eq!(answer.confidence_tier, ConfidenceTier::High);
    assert_eq!(answer.refinement_attempts, 0);
    assert!(doc_calls.lock().unwrap().is_empty(), "direct route must not retrieve");
    assert!(graph_calls.lock().unwrap().is_empty(), "direct route must not retrieve");
}

#[tokio::test]
async fn document_route_merges_with_dynamic_floor() {
    // Scores 0.9 / 0.7 / 0.3 → floor = max(0.12, 0.36) drops the 0.3 item.
    let document = StubSource::new(
        SourceType::Document,
        Behavior::Items(vec![
            item(SourceType::Document, "a.md#0", 0.9),
            item(SourceType::Document, "a.md#1", 0.7),
            item(SourceType::Document, "b.md#0", 0.3),
        ]),
    );
    let graph = StubSource::new(SourceType::Graph, Behavior::Items(vec![]));
    let graph_calls = graph.call_log();
    let engine = orchestrator(document, graph, retrieval_config(), scoring_config());

    let answer = engine
        .run(Query::new("what does the uploaded file say?"))
        .await
        .unwrap();

    assert_eq!(answer.route, Route::Document);
    assert!(graph_calls.lock().unwrap().is_empty(), "document route must not touch graph");
    let scores: Vec<f64> = answer.evidence.iter().map(|i| i.score).collect();
    assert_eq!(scores, vec![0.9, 0.7]);
}

#[tokio::test]
async fn failed_branch_does_not_sink_its_sibling() {
    let document = StubSource::new(SourceType::Document, Behavior::Fail);
    let graph = StubSource::new(
        SourceType::Graph,
        Behavior::Items(vec![
            item(SourceType::Graph, "a -[owns]-> b", 0.9),
            item(SourceType::Graph, "b -[depends_on]-> c", 0.8),
        ]),
    );
    let engine = orchestrator(document, graph, retrieval_config(), scoring_config());

    // No cues → default hybrid route.
    let answer = engine
        .run(Query::new("tell me about the rollout"))
        .await
        .unwrap();

    assert_eq!(answer.route, Route::Both);
    assert!(!answer.evidence.is_empty());
    assert!(answer
        .evidence
        .iter()
        .all(|i| i.source_type == SourceType::Graph));
    // Diversity bonus withheld: single-source evidence on a hybrid route
    // cannot reach the high tier.
    assert_eq!(answer.confidence_tier, ConfidenceTier::Medium);
}

#[tokio::test]
async fn timed_out_branch_is_a_failure_not_a_crash() {
    let document = StubSource::new(
        SourceType::Document,
        Behavior::Slow(
            Duration::from_millis(400),
            vec![item(SourceType::Document, "late.md#0", 0.99)],
        ),
    );
    let graph = StubSource::new(
        SourceType::Graph,
        Behavior::Items(vec![
            item(SourceType::Graph, "a -[owns]-> b", 0.9),
            item(SourceType::Graph, "b -[depends_on]-> c", 0.8),
        ]),
    );
    let engine = orchestrator(document, graph, retrieval_config(), scoring_config());

    let answer = engine.run(Query::new("tell me about the rollout")).await.unwrap();

    // The slow branch's partial results are discarded, not merged late.
    assert!(answer.evidence.iter().all(|i| i.source_type == SourceType::Graph));
    assert_eq!(answer.confidence_tier, ConfidenceTier::Medium);
}

#[tokio::test]
async fn low_confidence_triggers_exactly_one_wider_pass() {
    // First pass (limit 3) finds one weak item; the refined pass (limit 6)
    // finds strong coverage.
    let document = StubSource::new(
        SourceType::Document,
        Behavior::PerLimit(Box::new(|limit| {
            if limit <= 3 {
                vec![item(SourceType::Document, "a.md#0", 0.3)]
            } else {
                vec![
                    item(SourceType::Document, "a.md#0", 0.9),
                    item(SourceType::Document, "a.md#1", 0.85),
                    item(SourceType::Document, "b.md#0", 0.8),
                    item(SourceType::Document, "b.md#1", 0.75),
                ]
            }
        })),
    );
    let graph = StubSource::new(SourceType::Graph, Behavior::Items(vec![]));
    let doc_calls = document.call_log();
    let engine = orchestrator(document, graph, retrieval_config(), scoring_config());

    let answer = engine
        .run(Query::new("summarize the uploaded file"))
        .await
        .unwrap();

    assert_eq!(doc_calls.lock().unwrap().as_slice(), &[3, 6]);
    assert_eq!(answer.refinement_attempts, 1);
    assert_eq!(answer.confidence_tier, ConfidenceTier::High);
    // The final answer is built from the second-pass evidence.
    assert_eq!(answer.evidence.len(), 4);
    assert_eq!(answer.evidence[0].score, 0.9);
}

#[tokio::test]
async fn refinement_is_bounded_when_confidence_stays_low() {
    let document = StubSource::new(
        SourceType::Document,
        Behavior::Items(vec![item(SourceType::Document, "weak.md#0", 0.3)]),
    );
    let graph = StubSource::new(SourceType::Graph, Behavior::Items(vec![]));
    let doc_calls = document.call_log();
    let engine = orchestrator(document, graph, retrieval_config(), scoring_config());

    let answer = engine
        .run(Query::new("summarize the uploaded file"))
        .await
        .unwrap();

    // initial pass + exactly max_refinement_rounds extra passes, then stop
    assert_eq!(doc_calls.lock().unwrap().len(), 2);
    assert_eq!(answer.refinement_attempts, 1);
    assert_ne!(answer.confidence_tier, ConfidenceTier::High);
}

#[tokio::test]
async fn total_failure_degrades_to_low_tier_no_evidence() {
    let document = StubSource::new(SourceType::Document, Behavior::Fail);
    let graph = StubSource::new(SourceType::Graph, Behavior::Fail);
    let engine = orchestrator(document, graph, retrieval_config(), scoring_config());

    let answer = engine.run(Query::new("tell me about the rollout")).await.unwrap();

    assert_eq!(answer.confidence_tier, ConfidenceTier::Low);
    assert_eq!(answer.degraded, Some(Degradation::NoEvidence));
    assert_eq!(answer.evidence.len(), 1);
    assert_eq!(answer.evidence[0].source_type, SourceType::System);
    assert_eq!(answer.evidence[0].source_id, "no-evidence");
}

#[tokio::test]
async fn disabled_fallback_reports_infrastructure_failure() {
    let document = StubSource::new(SourceType::Document, Behavior::Fail);
    let graph = StubSource::new(SourceType::Graph, Behavior::Fail);
    let mut retrieval = retrieval_config();
    retrieval.fallback_enabled = false;
    let engine = orchestrator(document, graph, retrieval, scoring_config());

    let answer = engine.run(Query::new("tell me about the rollout")).await.unwrap();

    assert_eq!(answer.confidence_tier, ConfidenceTier::Low);
    assert_eq!(answer.degraded, Some(Degradation::RetrievalUnavailable));
    assert_eq!(answer.evidence[0].source_id, "retrieval-unavailable");
    assert!(answer.answer.contains("retrieval is currently unavailable"));
}

#[tokio::test]
async fn empty_question_is_a_request_error() {
    let document = StubSource::new(SourceType::Document, Behavior::Items(vec![]));
    let graph = StubSource::new(SourceType::Graph, Behavior::Items(vec![]));
    let engine = orchestrator(document, graph, retrieval_config(), scoring_config());

    let err = engine.run(Query::new("   ")).await.unwrap_err();
    assert!(matches!(err, QueryError::EmptyQuestion));
}

#[tokio::test]
async fn limit_override_replaces_the_initial_limit() {
    let document = StubSource::new(
        SourceType::Document,
        Behavior::Items(vec![
            item(SourceType::Document, "a.md#0", 0.9),
            item(SourceType::Document, "a.md#1", 0.8),
            item(SourceType::Document, "a.md#2", 0.7),
        ]),
    );
    let graph = StubSource::new(SourceType::Graph, Behavior::Items(vec![]));
    let doc_calls = document.call_log();
    let engine = orchestrator(document, graph, retrieval_config(), scoring_config());

    let query = Query {
        question: "summarize the uploaded file".into(),
        generation_credential: None,
        limit_override: Some(5),
    };
    engine.run(query).await.unwrap();

    assert_eq!(doc_calls.lock().unwrap()[0], 5);
}

#[tokio::test]
async fn hybrid_route_merges_both_sources_ranked() {
    let document = StubSource::new(
        SourceType::Document,
        Behavior::Items(vec![
            item(SourceType::Document, "plan.md#0", 0.9),
            item(SourceType::Document, "plan.md#1", 0.5),
        ]),
    );
    let graph = StubSource::new(
        SourceType::Graph,
        Behavior::Items(vec![item(SourceType::Graph, "a -[owns]-> b", 0.7)]),
    );
    let engine = orchestrator(document, graph, retrieval_config(), scoring_config());

    // Document and graph cues together force the hybrid route.
    let answer = engine
        .run(Query::new("does the policy document cover every dependency?"))
        .await
        .unwrap();

    assert_eq!(answer.route, Route::Both);
    let ids: Vec<&str> = answer.evidence.iter().map(|i| i.source_id.as_str()).collect();
    assert_eq!(ids, vec!["plan.md#0", "a -[owns]-> b", "plan.md#1"]);
    assert_eq!(answer.confidence_tier, ConfidenceTier::High);
    assert!(answer.answer.contains("Sources:"));
}
