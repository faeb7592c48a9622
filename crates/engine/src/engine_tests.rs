//! Integration tests for the execution engine.
//!
//! Mock executors observe dispatch; mock adapter clients back the real
//! executors for the end-to-end scenarios. No network, no real database.

use std::collections::HashMap;
use std::io::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use credentials::{CredentialError, CredentialStore};
use db::{InMemoryDb, Persistence as _};
use nodes::mock::MockExecutor;
use nodes::{NodeKind, NodeRegistry, NodeResult, Services};
use scheduler::Scheduler;
use serde_json::{json, Value};

use crate::{Edge, EngineError, Node, Workflow, WorkflowEngine, WorkflowStore};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

struct NoopCredentialStore;

#[async_trait]
impl CredentialStore for NoopCredentialStore {
    async fn get(&self, _user_id: &str) -> Result<HashMap<String, String>, CredentialError> {
        Ok(HashMap::new())
    }

    fn decrypt(&self, blob: &str) -> Result<String, CredentialError> {
        Ok(blob.to_owned())
    }
}

fn node(id: &str, kind: &str, config: Value) -> Node {
    Node { id: id.into(), kind: kind.into(), config, position: None }
}

fn edge(source: &str, target: &str) -> Edge {
    Edge { id: None, source: source.into(), target: target.into() }
}

struct Harness {
    engine: WorkflowEngine,
    db: Arc<InMemoryDb>,
    store: Arc<WorkflowStore>,
    scheduler: Arc<Scheduler>,
}

fn harness(registry: NodeRegistry) -> Harness {
    let db = Arc::new(InMemoryDb::new());
    let store = Arc::new(WorkflowStore::new());
    let scheduler = Scheduler::new();
    let engine = WorkflowEngine::new(
        registry,
        store.clone(),
        scheduler.clone(),
        db.clone(),
        Arc::new(NoopCredentialStore),
    );
    Harness { engine, db, store, scheduler }
}

/// Registry with one recording mock registered under every kind used by the
/// test, all returning free text.
fn mock_registry(kinds: &[(&str, &Arc<MockExecutor>)]) -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    for (kind, executor) in kinds {
        registry.register(NodeKind::parse(kind).expect(kind), (*executor).clone());
    }
    registry
}

/// Service bundle wired entirely to adapter mocks.
fn mock_services(llm: Arc<adapters::mock::MockLlm>, mailer: Arc<adapters::mock::MockMailer>, report_dir: &std::path::Path) -> Services {
    Services {
        llm,
        mailer,
        dispatcher: Arc::new(adapters::mock::MockDispatcher::returning(200, "ok")),
        messenger: Arc::new(adapters::mock::MockMessageSender::new()),
        discord: Arc::new(adapters::mock::MockDiscord::new()),
        drive: Arc::new(adapters::mock::MockDrive::new("https://drive.google.com/file/d/t/view")),
        sheets: Arc::new(adapters::mock::MockSheets::new()),
        images: Arc::new(adapters::mock::MockImageGenerator::returning("generated_images/m.png")),
        social: Arc::new(adapters::mock::MockSocialPoster::new()),
        reports: Arc::new(adapters::mock::MockReportRenderer::into_dir(report_dir)),
    }
}

// ---------------------------------------------------------------------------
// Core invariants
// ---------------------------------------------------------------------------

#[tokio::test]
async fn result_map_has_one_entry_per_node() {
    let a = Arc::new(MockExecutor::returning_text("alpha output, long enough."));
    let workflow = Workflow::new(
        vec![
            node("a", "gpt", json!({})),
            node("b", "gpt", json!({})),
            node("c", "gpt", json!({})),
            node("d", "gpt", json!({})),
        ],
        vec![edge("a", "b"), edge("a", "c"), edge("b", "d"), edge("c", "d")],
    );

    let h = harness(mock_registry(&[("gpt", &a)]));
    let results = h.engine.run(&workflow, None).await.unwrap();

    assert_eq!(results.len(), 4);
    for id in ["a", "b", "c", "d"] {
        assert!(results.contains_key(id));
    }
}

#[tokio::test]
async fn predecessors_complete_before_their_successor_runs() {
    let mock = Arc::new(MockExecutor::returning_text("stable output, long enough."));
    let workflow = Workflow::new(
        vec![node("a", "gpt", json!({})), node("b", "gpt", json!({})), node("c", "gpt", json!({}))],
        vec![edge("a", "c"), edge("b", "c")],
    );

    let h = harness(mock_registry(&[("gpt", &mock)]));
    h.engine.run(&workflow, None).await.unwrap();

    let calls = mock.calls.lock().unwrap();
    let c_call = calls.iter().find(|c| c.node_id == "c").expect("c executed");
    // Both predecessors' results were present when c ran, in edge order.
    let pred_ids: Vec<&str> = c_call.predecessors.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(pred_ids, vec!["a", "b"]);
}

#[tokio::test]
async fn empty_workflow_returns_an_empty_map() {
    let h = harness(NodeRegistry::new());
    let results = h.engine.run(&Workflow::new(vec![], vec![]), None).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn single_node_workflow_has_one_result() {
    let mock = Arc::new(MockExecutor::returning_text("solo result, long enough."));
    let h = harness(mock_registry(&[("gpt", &mock)]));
    let workflow = Workflow::new(vec![node("only", "gpt", json!({}))], vec![]);

    let results = h.engine.run(&workflow, None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results["only"], "solo result, long enough.");
}

#[tokio::test]
async fn cycle_is_rejected_before_any_executor_runs() {
    let mock = Arc::new(MockExecutor::returning_text("never seen output here."));
    let h = harness(mock_registry(&[("gpt", &mock)]));
    let workflow = Workflow::new(
        vec![node("a", "gpt", json!({})), node("b", "gpt", json!({}))],
        vec![edge("a", "b"), edge("b", "a")],
    );

    let err = h.engine.run(&workflow, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Cycle detected in workflow");
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn dangling_edge_is_fatal() {
    let mock = Arc::new(MockExecutor::returning_text("never seen output here."));
    let h = harness(mock_registry(&[("gpt", &mock)]));
    let workflow =
        Workflow::new(vec![node("a", "gpt", json!({}))], vec![edge("a", "missing")]);

    assert!(matches!(
        h.engine.run(&workflow, None).await,
        Err(EngineError::UnknownNodeReference { .. })
    ));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn executor_errors_do_not_halt_the_run() {
    let failing = Arc::new(MockExecutor::returning(NodeResult::Error("Error: quota".into())));
    let downstream = Arc::new(MockExecutor::returning_text("ran anyway, long enough."));

    let mut registry = NodeRegistry::new();
    registry.register(NodeKind::Gpt, failing.clone());
    registry.register(NodeKind::Email, downstream.clone());

    let h = harness(registry);
    let workflow = Workflow::new(
        vec![node("a", "gpt", json!({})), node("b", "email", json!({}))],
        vec![edge("a", "b")],
    );

    let results = h.engine.run(&workflow, None).await.unwrap();
    assert_eq!(results["a"], "Error: quota");
    assert_eq!(downstream.call_count(), 1);

    // The downstream executor saw the error through its predecessor map.
    let calls = downstream.calls.lock().unwrap();
    assert_eq!(calls[0].predecessors[0].1, NodeResult::Error("Error: quota".into()));
}

#[tokio::test]
async fn identical_runs_yield_identical_result_maps() {
    let mock = Arc::new(MockExecutor::returning_text("deterministic output text."));
    let h = harness(mock_registry(&[("gpt", &mock)]));
    let workflow = Workflow::new(
        vec![node("a", "gpt", json!({})), node("b", "gpt", json!({})), node("c", "gpt", json!({}))],
        vec![edge("a", "b"), edge("b", "c")],
    );

    let first = h.engine.run(&workflow, None).await.unwrap();
    let second = h.engine.run(&workflow, None).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn unknown_kind_lands_in_the_map_as_not_implemented() {
    let h = harness(NodeRegistry::new());
    let workflow = Workflow::new(vec![node("x", "telepathy", json!({}))], vec![]);

    let results = h.engine.run(&workflow, None).await.unwrap();
    assert_eq!(results["x"], "telepathy node not implemented");
}

// ---------------------------------------------------------------------------
// Pre-pass registrations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn webhook_nodes_auto_register_the_whole_workflow() {
    let mock = Arc::new(MockExecutor::returning(NodeResult::Notification(
        "Webhook triggered (no URL provided)".into(),
    )));
    let h = harness(mock_registry(&[("webhook", &mock)]));
    let workflow = Workflow::new(
        vec![node("hook-1", "webhook", json!({ "webhook_url": "" }))],
        vec![],
    );

    h.engine.run(&workflow, None).await.unwrap();

    // Stored under the webhook node's own id, trigger-able thereafter.
    let stored = h.store.get("hook-1").expect("auto-registered");
    assert_eq!(stored.nodes.len(), 1);
}

#[tokio::test]
async fn schedule_nodes_register_a_cron_job() {
    let mut registry = NodeRegistry::new();
    registry.register(
        NodeKind::Schedule,
        Arc::new(nodes::executors::schedule::ScheduleExecutor),
    );
    let h = harness(registry);
    let workflow = Workflow::new(
        vec![node("tick", "schedule", json!({ "cron": "*/5 * * * *" }))],
        vec![],
    );

    let results = h.engine.run(&workflow, None).await.unwrap();
    assert_eq!(results["tick"], "Schedule set: */5 * * * *");
    assert!(h.store.contains("scheduled_tick"));
    assert!(h.scheduler.contains("scheduled_tick"));
}

#[tokio::test]
async fn pre_pass_registrations_survive_a_rejected_graph() {
    let h = harness(NodeRegistry::new());
    let workflow = Workflow::new(
        vec![
            node("hook", "webhook", json!({})),
            node("a", "gpt", json!({})),
            node("b", "gpt", json!({})),
        ],
        vec![edge("a", "b"), edge("b", "a")],
    );

    assert!(h.engine.run(&workflow, None).await.is_err());
    // Known (and flagged) behaviour: the registration is not rolled back.
    assert!(h.store.contains("hook"));
}

// ---------------------------------------------------------------------------
// History and counters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn history_row_and_counter_are_written_for_user_runs() {
    let mock = Arc::new(MockExecutor::returning_text("recorded output, long enough."));
    let h = harness(mock_registry(&[("gpt", &mock)]));
    let workflow = Workflow::new(vec![node("a", "gpt", json!({}))], vec![]);

    h.engine.run(&workflow, Some("user-7")).await.unwrap();

    let records = h.db.executions();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, "success");
    assert_eq!(records[0].user_id, "user-7");
    assert_eq!(records[0].result["a"], "recorded output, long enough.");
    assert_eq!(h.db.get_user("user-7").await.unwrap().unwrap().execution_count, 1);
}

#[tokio::test]
async fn graph_errors_are_recorded_as_failed() {
    let h = harness(NodeRegistry::new());
    let workflow = Workflow::new(
        vec![node("a", "gpt", json!({})), node("b", "gpt", json!({}))],
        vec![edge("a", "b"), edge("b", "a")],
    );

    let _ = h.engine.run(&workflow, Some("user-7")).await;

    let records = h.db.executions();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, "failed");
    assert_eq!(records[0].result["error"], "Cycle detected in workflow");
}

// ---------------------------------------------------------------------------
// End-to-end scenarios over real executors and mock adapters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ai_output_flows_into_the_email_body() {
    let llm = Arc::new(adapters::mock::MockLlm::returning("HELLO SUMMARY"));
    let mailer = Arc::new(adapters::mock::MockMailer::new());
    let dir = tempfile::tempdir().unwrap();
    let registry = NodeRegistry::with_services(mock_services(llm, mailer.clone(), dir.path()));

    let h = harness(registry);
    let workflow = Workflow::new(
        vec![
            node("A", "gpt", json!({ "prompt": "Summarise: hello" })),
            node("B", "email", json!({ "to": "u@x.test", "subject": "S", "body": "" })),
        ],
        vec![edge("A", "B")],
    );

    let results = h.engine.run(&workflow, None).await.unwrap();
    assert_eq!(results["A"], "HELLO SUMMARY");
    assert_eq!(results["B"], "Email sent successfully to u@x.test");

    let sent = mailer.sent.lock().unwrap();
    assert!(sent[0].body.contains("AI Generated Content"));
    assert!(sent[0].body.contains("HELLO SUMMARY"));
}

#[tokio::test]
async fn document_content_reaches_both_the_model_and_the_report() {
    let mut fixture = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    write!(fixture, "Seven years of systems programming experience.").unwrap();

    let llm = Arc::new(adapters::mock::MockLlm::returning("Skills: systems programming"));
    let mailer = Arc::new(adapters::mock::MockMailer::new());
    let dir = tempfile::tempdir().unwrap();
    let registry =
        NodeRegistry::with_services(mock_services(llm.clone(), mailer, dir.path()));

    let h = harness(registry);
    let workflow = Workflow::new(
        vec![
            node("D", "document_parser", json!({ "file_path": fixture.path() })),
            node("G", "gpt", json!({ "prompt": "Extract skills" })),
            node("R", "report_generator", json!({ "title": "Rpt", "format": "pdf" })),
        ],
        vec![edge("D", "G"), edge("D", "R"), edge("G", "R")],
    );

    let results = h.engine.run(&workflow, None).await.unwrap();

    // The model prompt ends with the parsed document content.
    let prompt = llm.prompts().remove(0);
    assert!(prompt.starts_with("Extract skills"));
    assert!(prompt.ends_with("Seven years of systems programming experience."));

    // The report exists and carries both the model response and the summary.
    let report_path = results["R"].strip_prefix("Report generated: ").expect("report result");
    let report = std::fs::read_to_string(report_path).unwrap();
    assert!(report.contains("Skills: systems programming"));
    assert!(report.contains("Seven years of systems programming experience."));

    // Clean up the parsed-documents artifact this run produced.
    if let Some(parsed) = results["D"].strip_prefix("Document parsed: ") {
        std::fs::remove_file(parsed).ok();
    }
}

#[tokio::test]
async fn upstream_error_is_not_absorbed_as_an_image_prompt() {
    // The "model" answers with an error-shaped string; absorption must skip
    // it, leaving the image node promptless.
    let llm = Arc::new(adapters::mock::MockLlm::returning("Error: quota"));
    let mailer = Arc::new(adapters::mock::MockMailer::new());
    let dir = tempfile::tempdir().unwrap();
    let registry = NodeRegistry::with_services(mock_services(llm, mailer, dir.path()));

    let h = harness(registry);
    let workflow = Workflow::new(
        vec![
            node("A", "gpt", json!({ "prompt": "anything at all" })),
            node("B", "image_generation", json!({ "prompt": "" })),
        ],
        vec![edge("A", "B")],
    );

    let results = h.engine.run(&workflow, None).await.unwrap();
    assert_eq!(results["A"], "Error: quota");
    assert_eq!(results["B"], "Error: Image prompt is required");
}

#[tokio::test]
async fn triggered_webhook_payload_is_visible_downstream() {
    let dispatcher = Arc::new(adapters::mock::MockDispatcher::returning(200, "ok"));
    let mailer = Arc::new(adapters::mock::MockMailer::new());
    let dir = tempfile::tempdir().unwrap();
    let mut services = mock_services(
        Arc::new(adapters::mock::MockLlm::returning("unused")),
        mailer,
        dir.path(),
    );
    services.dispatcher = dispatcher.clone();
    let registry = NodeRegistry::with_services(services);

    let h = harness(registry);
    let mut workflow = Workflow::new(
        vec![
            node("N", "webhook", json!({ "webhook_url": "https://svc.test/hook" })),
            node("M", "email", json!({ "to": "u@x.test", "subject": "S" })),
        ],
        vec![edge("N", "M")],
    );

    workflow.inject_webhook_payload(&json!({ "x": 1, "y": "z" }), None);
    h.engine.run(&workflow, None).await.unwrap();

    let requests = dispatcher.requests.lock().unwrap();
    assert_eq!(requests[0].payload, json!({ "x": 1, "y": "z" }));
}
