//! Integration tests for the dual-model orchestration pipeline.
//!
//! Uses scripted mock providers to verify the state machine contract:
//! review only happens for SQL answers, transient errors get exactly one
//! retry, and verdicts map to execution eligibility.

use async_trait::async_trait;
use sql_expert::ai::registry::ModelRegistry;
use sql_expert::ai::{AiProvider, CompletionRequest, ProviderError};
use sql_expert::chat::{ChatError, ChatSession, Orchestrator, TurnState, Verdict};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const DDL: &str = "CREATE TABLE \"orders\" (\n    \"id\" integer NOT NULL,\n    \"total\" real\n);";

/// Scripted provider: pops one response per call, records requests.
struct MockProvider {
    responses: std::sync::Mutex<VecDeque<Result<String, ProviderError>>>,
    calls: AtomicUsize,
    last_message: std::sync::Mutex<Option<String>>,
}

impl MockProvider {
    fn new(responses: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: std::sync::Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            last_message: std::sync::Mutex::new(None),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_message(&self) -> Option<String> {
        self.last_message.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiProvider for MockProvider {
    fn provider_tag(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_message.lock().unwrap() = Some(request.message.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ProviderError::Network {
                    provider: "mock".to_string(),
                    message: "script exhausted".to_string(),
                })
            })
    }
}

fn orchestrator_with(
    expert: Arc<MockProvider>,
    reviewer: Option<Arc<MockProvider>>,
) -> Orchestrator {
    let registry = ModelRegistry::from_adapters(
        Some(expert as Arc<dyn AiProvider>),
        reviewer.map(|r| r as Arc<dyn AiProvider>),
    );
    Orchestrator::new(Arc::new(registry))
}

/// An expert answer without SQL finalizes directly; the reviewer is never
/// invoked.
#[tokio::test]
async fn test_no_sql_answer_skips_reviewer() {
    let expert = MockProvider::new(vec![Ok(
        "Your database has one table holding orders.".to_string()
    )]);
    let reviewer = MockProvider::new(vec![Ok("VERDICT: APPROVED\nfine".to_string())]);
    let mut orchestrator = orchestrator_with(Arc::clone(&expert), Some(Arc::clone(&reviewer)));

    let mut session = ChatSession::new("orders-db", 20);
    let turn = orchestrator
        .run_turn(&mut session, DDL, "what does my database contain?")
        .await
        .unwrap();

    assert_eq!(orchestrator.state(), TurnState::Finalized);
    assert_eq!(reviewer.call_count(), 0, "reviewer must not run");
    assert!(turn.review.is_none());
    assert!(turn.sql.is_none());
    assert_eq!(turn.answer, "Your database has one table holding orders.");
}

/// A transient rate limit on the first expert call is retried exactly once.
#[tokio::test(start_paused = true)]
async fn test_transient_error_retried_once() {
    let expert = MockProvider::new(vec![
        Err(ProviderError::RateLimited {
            provider: "mock".to_string(),
            retry_after_secs: Some(1),
        }),
        Ok("No SQL needed: the table is empty.".to_string()),
    ]);
    let mut orchestrator = orchestrator_with(Arc::clone(&expert), None);

    let mut session = ChatSession::new("orders-db", 20);
    let turn = orchestrator
        .run_turn(&mut session, DDL, "anything in there?")
        .await
        .unwrap();

    assert_eq!(expert.call_count(), 2, "exactly one retry");
    assert_eq!(turn.answer, "No SQL needed: the table is empty.");
}

/// Two transient failures in a row exhaust the single retry and fail the
/// turn.
#[tokio::test(start_paused = true)]
async fn test_transient_error_not_retried_twice() {
    let expert = MockProvider::new(vec![
        Err(ProviderError::Network {
            provider: "mock".to_string(),
            message: "reset".to_string(),
        }),
        Err(ProviderError::Network {
            provider: "mock".to_string(),
            message: "reset again".to_string(),
        }),
        Ok("should never be reached".to_string()),
    ]);
    let mut orchestrator = orchestrator_with(Arc::clone(&expert), None);

    let mut session = ChatSession::new("orders-db", 20);
    let result = orchestrator.run_turn(&mut session, DDL, "hello").await;

    assert_eq!(expert.call_count(), 2);
    assert!(result.is_err());
    assert_eq!(orchestrator.state(), TurnState::Failed);
    assert!(session.history().is_empty(), "failed turn leaves no history");
}

/// Authentication failures are terminal: no retry.
#[tokio::test]
async fn test_auth_error_never_retried() {
    let expert = MockProvider::new(vec![
        Err(ProviderError::Auth {
            provider: "mock".to_string(),
            message: "invalid key".to_string(),
        }),
        Ok("should never be reached".to_string()),
    ]);
    let mut orchestrator = orchestrator_with(Arc::clone(&expert), None);

    let mut session = ChatSession::new("orders-db", 20);
    let result = orchestrator.run_turn(&mut session, DDL, "hello").await;

    assert_eq!(expert.call_count(), 1, "auth errors must not retry");
    match result {
        Err(ChatError::Provider { kind, .. }) => assert_eq!(kind, "auth"),
        other => panic!("expected provider error, got: {:?}", other.map(|t| t.answer)),
    }
}

/// Approved verdict: the expert's SQL is final and execution-eligible.
#[tokio::test]
async fn test_approved_verdict_keeps_expert_sql() {
    let expert = MockProvider::new(vec![Ok(
        "Sum the totals:\n```sql\nSELECT SUM(total) FROM orders\n```".to_string(),
    )]);
    let reviewer = MockProvider::new(vec![Ok("VERDICT: APPROVED\nCorrect query.".to_string())]);
    let mut orchestrator = orchestrator_with(Arc::clone(&expert), Some(Arc::clone(&reviewer)));

    let mut session = ChatSession::new("orders-db", 20);
    let turn = orchestrator
        .run_turn(&mut session, DDL, "total revenue?")
        .await
        .unwrap();

    assert_eq!(reviewer.call_count(), 1);
    let review = turn.review.as_ref().unwrap();
    assert_eq!(review.verdict, Verdict::Approved);

    let sql = turn.sql.as_ref().unwrap();
    assert!(sql.eligible);
    assert_eq!(sql.statement, "SELECT SUM(total) FROM orders");
    assert!(sql.original.is_none());

    // Merged answer carries both voices
    assert!(turn.answer.contains("Expert's response:"));
    assert!(turn.answer.contains("Reviewer's comment:"));
}

/// Revised verdict: the replacement runs, the original is kept for audit.
#[tokio::test]
async fn test_revised_verdict_uses_replacement_and_keeps_original() {
    let expert = MockProvider::new(vec![Ok(
        "```sql\nSELECT * FROM orders\n```".to_string()
    )]);
    let reviewer = MockProvider::new(vec![Ok(
        "VERDICT: REVISED\nUnbounded scan.\n```sql\nSELECT id, total FROM orders LIMIT 100\n```"
            .to_string(),
    )]);
    let mut orchestrator = orchestrator_with(Arc::clone(&expert), Some(Arc::clone(&reviewer)));

    let mut session = ChatSession::new("orders-db", 20);
    let turn = orchestrator
        .run_turn(&mut session, DDL, "show me the orders")
        .await
        .unwrap();

    let sql = turn.sql.as_ref().unwrap();
    assert!(sql.eligible);
    assert_eq!(sql.statement, "SELECT id, total FROM orders LIMIT 100");
    assert_eq!(sql.original.as_deref(), Some("SELECT * FROM orders"));
}

/// Rejected verdict: SQL is withheld from execution eligibility entirely.
#[tokio::test]
async fn test_rejected_verdict_withholds_sql() {
    let expert = MockProvider::new(vec![Ok(
        "```sql\nDELETE FROM orders\n```".to_string()
    )]);
    let reviewer = MockProvider::new(vec![Ok(
        "VERDICT: REJECTED\nDestructive statement, refuse to run.".to_string(),
    )]);
    let mut orchestrator = orchestrator_with(Arc::clone(&expert), Some(Arc::clone(&reviewer)));

    let mut session = ChatSession::new("orders-db", 20);
    let turn = orchestrator
        .run_turn(&mut session, DDL, "clear the orders table")
        .await
        .unwrap();

    assert!(turn.sql.is_none(), "rejected SQL must not be eligible");
    let review = turn.review.as_ref().unwrap();
    assert_eq!(review.verdict, Verdict::Rejected);
    // The proposal is still retained for audit
    assert_eq!(review.proposed_sql, "DELETE FROM orders");
}

/// The reviewer critiques the expert's statement - its input carries the
/// proposal rather than asking it to regenerate.
#[tokio::test]
async fn test_reviewer_receives_expert_proposal() {
    let expert = MockProvider::new(vec![Ok(
        "```sql\nSELECT COUNT(*) FROM orders\n```".to_string()
    )]);
    let reviewer = MockProvider::new(vec![Ok("VERDICT: APPROVED\nok".to_string())]);
    let mut orchestrator = orchestrator_with(Arc::clone(&expert), Some(Arc::clone(&reviewer)));

    let mut session = ChatSession::new("orders-db", 20);
    orchestrator
        .run_turn(&mut session, DDL, "how many orders?")
        .await
        .unwrap();

    let reviewer_input = reviewer.last_message().unwrap();
    assert!(reviewer_input.contains("SELECT COUNT(*) FROM orders"));
    assert!(reviewer_input.contains("how many orders?"));
}

/// With no reviewer configured, review is skipped and the expert's SQL is
/// surfaced as eligible.
#[tokio::test]
async fn test_unconfigured_reviewer_skips_review() {
    let expert = MockProvider::new(vec![Ok(
        "```sql\nSELECT 1\n```".to_string()
    )]);
    let mut orchestrator = orchestrator_with(Arc::clone(&expert), None);

    let mut session = ChatSession::new("orders-db", 20);
    let turn = orchestrator
        .run_turn(&mut session, DDL, "ping the database")
        .await
        .unwrap();

    assert!(turn.review.is_none());
    let sql = turn.sql.as_ref().unwrap();
    assert!(sql.eligible);
    assert_eq!(sql.statement, "SELECT 1");
}

/// With no expert configured, the turn fails with a clear signal instead
/// of crashing.
#[tokio::test]
async fn test_unconfigured_expert_is_clear_error() {
    let registry = ModelRegistry::from_adapters(None, None);
    let mut orchestrator = Orchestrator::new(Arc::new(registry));

    let mut session = ChatSession::new("orders-db", 20);
    let result = orchestrator.run_turn(&mut session, DDL, "hello").await;

    assert!(matches!(result, Err(ChatError::RoleUnconfigured(_))));
    assert_eq!(orchestrator.state(), TurnState::Failed);
}

/// Successful turns extend the bounded session history.
#[tokio::test]
async fn test_history_grows_per_turn() {
    let expert = MockProvider::new(vec![
        Ok("First answer.".to_string()),
        Ok("Second answer.".to_string()),
    ]);
    let mut orchestrator = orchestrator_with(Arc::clone(&expert), None);

    let mut session = ChatSession::new("orders-db", 20);
    orchestrator
        .run_turn(&mut session, DDL, "first question")
        .await
        .unwrap();
    orchestrator
        .run_turn(&mut session, DDL, "second question")
        .await
        .unwrap();

    assert_eq!(session.history().len(), 2);
    assert_eq!(session.history()[0].user, "first question");
    assert_eq!(session.history()[1].assistant, "Second answer.");
}
