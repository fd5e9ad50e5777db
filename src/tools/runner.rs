//! SQL execution gate.
//!
//! Thin pass-through to the connection manager's execute, plus the two
//! policies the pipeline relies on:
//! - AI-authored SQL runs only when the orchestrator marked it
//!   execution-eligible (approved or revised by review). Anything else is
//!   refused with a disallowed error before touching the engine.
//! - Statements are classified first: reads go through the row-capped
//!   query path; writes require a writable connection; transaction
//!   control, procedure calls and administrative statements are refused.
//!
//! Execution is always an explicit caller action, never automatic.

use crate::chat::VettedSql;
use crate::db::ConnectionManager;
use crate::error::{DbError, DbResult};
use crate::models::{QueryRequest, QueryResult};
use crate::tools::sql_validator::{StatementKind, classify_sql};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct SqlRunner {
    manager: Arc<ConnectionManager>,
}

impl SqlRunner {
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }

    /// Run AI-authored SQL that went through the review pipeline.
    ///
    /// Refuses statements the pipeline did not mark execution-eligible.
    pub async fn run_vetted(
        &self,
        connection_id: &str,
        vetted: &VettedSql,
        limit: Option<u32>,
        timeout_secs: Option<u32>,
    ) -> DbResult<QueryResult> {
        if !vetted.eligible {
            return Err(DbError::disallowed(
                "statement was not approved by review; execution requires an approved or revised verdict",
            ));
        }
        info!(connection_id = %connection_id, "Running vetted statement");
        self.run_sql(connection_id, &vetted.statement, limit, timeout_secs)
            .await
    }

    /// Run user-authored SQL. An explicit user action, so no review
    /// eligibility applies, but classification and writability still do.
    pub async fn run_sql(
        &self,
        connection_id: &str,
        sql: &str,
        limit: Option<u32>,
        timeout_secs: Option<u32>,
    ) -> DbResult<QueryResult> {
        let config = self.manager.get_config(connection_id).await?;
        let kind = classify_sql(sql, config.db_type)?;

        match kind {
            StatementKind::Read => {
                let mut request = QueryRequest::new(sql);
                request.limit = limit;
                request.timeout_secs = timeout_secs;
                self.manager.execute_query(connection_id, &request).await
            }
            StatementKind::DmlWrite | StatementKind::Ddl => {
                if !config.writable {
                    return Err(DbError::permission(
                        "write",
                        "Connection is read-only; reconnect with ?writable=true to run writes",
                    ));
                }
                let timeout = timeout_secs.map(|t| Duration::from_secs(t as u64));
                self.manager
                    .execute_write(connection_id, sql, &[], timeout)
                    .await
            }
            StatementKind::Transaction => Err(DbError::permission(
                "transaction control",
                "Transaction statements are not supported through this interface",
            )),
            StatementKind::ProcedureCall => Err(DbError::permission(
                "procedure call",
                "Stored procedure calls cannot be verified and are not executed",
            )),
            StatementKind::Administrative | StatementKind::Unknown => Err(DbError::permission(
                "administrative operation",
                "Only queries and, on writable connections, DML/DDL are executed",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vetted(eligible: bool) -> VettedSql {
        VettedSql {
            statement: "SELECT 1".to_string(),
            original: None,
            eligible,
        }
    }

    #[tokio::test]
    async fn test_ineligible_sql_is_disallowed() {
        let runner = SqlRunner::new(Arc::new(ConnectionManager::new()));
        let result = runner.run_vetted("any", &vetted(false), None, None).await;
        assert!(matches!(result, Err(DbError::Disallowed { .. })));
    }

    #[tokio::test]
    async fn test_eligible_sql_reaches_connection_lookup() {
        // With no such connection the gate passes and the manager reports
        // the missing handle - proving the eligibility check came first.
        let runner = SqlRunner::new(Arc::new(ConnectionManager::new()));
        let result = runner.run_vetted("missing", &vetted(true), None, None).await;
        assert!(matches!(result, Err(DbError::ConnectionNotFound { .. })));
    }
}
