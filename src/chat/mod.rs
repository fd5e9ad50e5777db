//! Dual-model orchestration.
//!
//! One turn walks a fixed state machine:
//!
//! ```text
//! Idle -> ExpertRequested -> ExpertAnswered -> ReviewRequested -> Reviewed -> Finalized
//! ```
//!
//! with `Failed` reachable from any non-terminal state. The expert call
//! fully resolves before the reviewer starts (the reviewer critiques the
//! expert's proposal, it never regenerates from scratch). An expert answer
//! with no extractable SQL finalizes directly - no review happens for
//! plain explanatory answers.
//!
//! Transient provider errors (rate limit, network, timeout) get at most
//! one retry with bounded backoff; authentication failures and malformed
//! responses never retry. Cancellation is dropping the future: per-turn
//! state is transient, so a cancelled turn leaves the session at Idle.

pub mod session;

pub use session::ChatSession;

use crate::ai::provider::{AiProvider, CompletionRequest, ProviderError};
use crate::ai::registry::{ModelRegistry, Role};
use crate::ai::{DEFAULT_EXPERT_PROMPT, DEFAULT_REVIEWER_PROMPT, extract_sql};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Backoff before the single retry when the server suggests no wait.
const RETRY_BACKOFF_SECS: u64 = 2;
/// Cap on server-suggested rate-limit waits.
const MAX_BACKOFF_SECS: u64 = 30;

/// Orchestration turn states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    ExpertRequested,
    ExpertAnswered,
    ReviewRequested,
    Reviewed,
    Finalized,
    Failed,
}

/// Reviewer judgement over the expert's proposed SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approved,
    Revised,
    Rejected,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Revised => write!(f, "revised"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Outcome of the review step.
#[derive(Debug, Clone)]
pub struct ReviewResult {
    pub verdict: Verdict,
    /// Reviewer commentary with the verdict line stripped
    pub commentary: String,
    /// The expert's original proposal, retained for audit
    pub proposed_sql: String,
    /// The statement that survived review (approved/revised only)
    pub final_sql: Option<String>,
}

/// A SQL statement that passed the pipeline, with its eligibility flag.
///
/// Only approved/revised statements are execution-eligible; this is the
/// contract the execution gate enforces.
#[derive(Debug, Clone)]
pub struct VettedSql {
    pub statement: String,
    /// The expert's original when the reviewer revised it
    pub original: Option<String>,
    pub eligible: bool,
}

/// Final output of one orchestration turn.
#[derive(Debug, Clone)]
pub struct FinalizedTurn {
    /// Merged answer text shown to the user
    pub answer: String,
    pub expert_text: String,
    /// None when the expert answered without SQL or no reviewer is configured
    pub review: Option<ReviewResult>,
    /// None when there was no SQL or the reviewer rejected it
    pub sql: Option<VettedSql>,
}

/// Orchestration failures.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{role} call failed ({kind}): {source}")]
    Provider {
        role: Role,
        kind: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error("No model configured for the {0} role")]
    RoleUnconfigured(Role),
}

impl ChatError {
    fn provider(role: Role, source: ProviderError) -> Self {
        Self::Provider {
            role,
            kind: source.kind(),
            source,
        }
    }
}

/// The dual-model orchestrator: expert proposes, reviewer vets.
pub struct Orchestrator {
    registry: Arc<ModelRegistry>,
    expert_prompt: String,
    reviewer_prompt: String,
    state: TurnState,
}

impl Orchestrator {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            expert_prompt: DEFAULT_EXPERT_PROMPT.to_string(),
            reviewer_prompt: DEFAULT_REVIEWER_PROMPT.to_string(),
            state: TurnState::Idle,
        }
    }

    /// Override the expert system prompt.
    pub fn with_expert_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.expert_prompt = prompt.into();
        self
    }

    /// Override the reviewer system prompt.
    pub fn with_reviewer_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.reviewer_prompt = prompt.into();
        self
    }

    /// Current turn state, for observability.
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Run one orchestration turn: question in, finalized answer out.
    ///
    /// On success the session history is extended with the exchange and the
    /// state machine ends at `Finalized`; on failure it ends at `Failed`
    /// and the session is left untouched, usable for a retry.
    pub async fn run_turn(
        &mut self,
        session: &mut ChatSession,
        schema_ddl: &str,
        question: &str,
    ) -> Result<FinalizedTurn, ChatError> {
        self.state = TurnState::Idle;
        let result = self.drive_turn(session, schema_ddl, question).await;
        match &result {
            Ok(_) => self.state = TurnState::Finalized,
            Err(_) => self.state = TurnState::Failed,
        }
        result
    }

    async fn drive_turn(
        &mut self,
        session: &mut ChatSession,
        schema_ddl: &str,
        question: &str,
    ) -> Result<FinalizedTurn, ChatError> {
        let expert = self
            .registry
            .get(Role::Expert)
            .ok_or(ChatError::RoleUnconfigured(Role::Expert))?;

        self.state = TurnState::ExpertRequested;
        let expert_request = CompletionRequest::new(self.expert_prompt.as_str(), schema_ddl, question)
            .with_history(session.history().to_vec());
        let expert_text = self
            .call_with_retry(expert.as_ref(), &expert_request, Role::Expert)
            .await?;
        self.state = TurnState::ExpertAnswered;

        let proposed_sql = match extract_sql(&expert_text) {
            Some(sql) => sql,
            None => {
                // Plain explanatory answer; nothing to review
                debug!(session = %session.id, "Expert answered without SQL, skipping review");
                session.push_turn(question, &expert_text);
                return Ok(FinalizedTurn {
                    answer: expert_text.clone(),
                    expert_text,
                    review: None,
                    sql: None,
                });
            }
        };

        let Some(reviewer) = self.registry.get(Role::Reviewer) else {
            warn!(session = %session.id, "Reviewer role unconfigured, skipping review");
            session.push_turn(question, &expert_text);
            return Ok(FinalizedTurn {
                answer: expert_text.clone(),
                expert_text,
                review: None,
                sql: Some(VettedSql {
                    statement: proposed_sql,
                    original: None,
                    eligible: true,
                }),
            });
        };

        self.state = TurnState::ReviewRequested;
        let review_message = format!(
            "The user asked:\n{}\n\nThe expert proposed this SQL statement:\n```sql\n{}\n```\n\nReview the proposal.",
            question, proposed_sql
        );
        // The reviewer sees no conversation history; its input is the
        // question, the schema and the proposal.
        let review_request =
            CompletionRequest::new(self.reviewer_prompt.as_str(), schema_ddl, review_message);
        let review_text = self
            .call_with_retry(reviewer.as_ref(), &review_request, Role::Reviewer)
            .await?;
        self.state = TurnState::Reviewed;

        let review = parse_review(&review_text, &proposed_sql);
        info!(
            session = %session.id,
            verdict = %review.verdict,
            "Review complete"
        );

        let sql = match review.verdict {
            Verdict::Approved => Some(VettedSql {
                statement: review.proposed_sql.clone(),
                original: None,
                eligible: true,
            }),
            Verdict::Revised => Some(VettedSql {
                statement: review
                    .final_sql
                    .clone()
                    .unwrap_or_else(|| review.proposed_sql.clone()),
                original: Some(review.proposed_sql.clone()),
                eligible: true,
            }),
            Verdict::Rejected => None,
        };

        let answer = format!(
            "Expert's response:\n{}\n\nReviewer's comment:\n{}",
            expert_text, review.commentary
        );
        session.push_turn(question, &answer);

        Ok(FinalizedTurn {
            answer,
            expert_text,
            review: Some(review),
            sql,
        })
    }

    /// Call a provider, retrying at most once on transient errors.
    async fn call_with_retry(
        &self,
        provider: &dyn AiProvider,
        request: &CompletionRequest,
        role: Role,
    ) -> Result<String, ChatError> {
        match provider.complete(request).await {
            Ok(text) => Ok(text),
            Err(e) if e.is_transient() => {
                let backoff = match &e {
                    ProviderError::RateLimited {
                        retry_after_secs: Some(secs),
                        ..
                    } => Duration::from_secs((*secs).min(MAX_BACKOFF_SECS)),
                    _ => Duration::from_secs(RETRY_BACKOFF_SECS),
                };
                warn!(
                    role = %role,
                    kind = e.kind(),
                    backoff_secs = backoff.as_secs(),
                    "Transient provider error, retrying once"
                );
                tokio::time::sleep(backoff).await;
                provider
                    .complete(request)
                    .await
                    .map_err(|e| ChatError::provider(role, e))
            }
            Err(e) => Err(ChatError::provider(role, e)),
        }
    }
}

/// Parse the reviewer's output into a [`ReviewResult`].
///
/// The verdict line is authoritative when present. Without one, a
/// differing ```sql block means `revised`, otherwise `approved`. A
/// `REVISED` verdict with no replacement statement downgrades to
/// `approved` - the proposal stands.
pub fn parse_review(review_text: &str, proposed_sql: &str) -> ReviewResult {
    let mut verdict = None;
    let mut commentary_lines = Vec::new();

    for line in review_text.lines() {
        let trimmed = line.trim();
        if verdict.is_none() {
            if let Some(rest) = strip_verdict_prefix(trimmed) {
                verdict = parse_verdict_word(rest);
                if verdict.is_some() {
                    continue;
                }
            }
        }
        commentary_lines.push(line);
    }
    let commentary = commentary_lines.join("\n").trim().to_string();

    let replacement = extract_sql(review_text).filter(|sql| sql != proposed_sql);

    let verdict = match verdict {
        Some(Verdict::Revised) if replacement.is_none() => Verdict::Approved,
        Some(v) => v,
        None => {
            if replacement.is_some() {
                Verdict::Revised
            } else {
                Verdict::Approved
            }
        }
    };

    let final_sql = match verdict {
        Verdict::Approved => Some(proposed_sql.to_string()),
        Verdict::Revised => replacement,
        Verdict::Rejected => None,
    };

    ReviewResult {
        verdict,
        commentary,
        proposed_sql: proposed_sql.to_string(),
        final_sql,
    }
}

fn strip_verdict_prefix(line: &str) -> Option<&str> {
    let upper = line.to_uppercase();
    if upper.starts_with("VERDICT:") {
        Some(line["VERDICT:".len()..].trim_start())
    } else {
        None
    }
}

fn parse_verdict_word(rest: &str) -> Option<Verdict> {
    let upper = rest.to_uppercase();
    if upper.starts_with("APPROV") {
        Some(Verdict::Approved)
    } else if upper.starts_with("REVIS") {
        Some(Verdict::Revised)
    } else if upper.starts_with("REJECT") {
        Some(Verdict::Rejected)
    } else {
        None
    }
}
