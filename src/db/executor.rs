//! Query execution engine.
//!
//! Executes SQL with a row cap and a timeout, uniformly across engines:
//! - Row limits are enforced by streaming: `limit + 1` rows are fetched so
//!   truncation can be detected and flagged instead of failing.
//! - Engine-side errors (syntax, permission, constraint) surface as
//!   [`DbError::Execution`] with the original statement attached.
//!
//! # Architecture
//!
//! Database-specific implementations live in submodules (`mysql`,
//! `postgres`, `sqlite`, `mssql`), each providing the same interface
//! adapted to the driver's type system. The code structure is intentionally
//! parallel to make differences obvious.

use crate::db::pool::{DbPool, MssqlClient};
use crate::db::types::RowToCells;
use crate::error::{DbError, DbResult};
use crate::models::{
    DEFAULT_QUERY_TIMEOUT_SECS, DEFAULT_ROW_LIMIT, MAX_ROW_LIMIT, QueryParam, QueryRequest,
    QueryResult,
};
use futures_util::StreamExt;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Query executor that handles database query execution.
#[derive(Debug)]
pub struct QueryExecutor {
    default_timeout: Duration,
    default_limit: u32,
}

impl QueryExecutor {
    /// Create a new query executor with default settings.
    pub fn new() -> Self {
        Self {
            default_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS as u64),
            default_limit: DEFAULT_ROW_LIMIT,
        }
    }

    /// Create a new query executor with custom settings.
    pub fn with_defaults(timeout_secs: u64, row_limit: u32) -> Self {
        Self {
            default_timeout: Duration::from_secs(timeout_secs),
            default_limit: row_limit.min(MAX_ROW_LIMIT),
        }
    }

    /// Execute a SELECT query and return results.
    pub async fn execute_query(
        &self,
        pool: &DbPool,
        request: &QueryRequest,
    ) -> DbResult<QueryResult> {
        let start = Instant::now();
        // Clamp limit to [1, MAX_ROW_LIMIT] to avoid edge case where limit=0 marks all results as "truncated"
        let row_limit = request
            .limit
            .map(|l| l.clamp(1, MAX_ROW_LIMIT))
            .unwrap_or(self.default_limit);
        let query_timeout = request
            .timeout_secs
            .map(|t| Duration::from_secs(t as u64))
            .unwrap_or(self.default_timeout);

        debug!(
            sql = %request.sql,
            params = request.params.len(),
            limit = row_limit,
            timeout_secs = query_timeout.as_secs(),
            "Executing query"
        );

        let result = match pool {
            DbPool::MySql(p) => {
                let rows =
                    mysql::fetch_rows(p, &request.sql, &request.params, row_limit, query_timeout)
                        .await?;
                process_rows(rows, row_limit, start)
            }
            DbPool::Postgres(p) => {
                let rows = postgres::fetch_rows(
                    p,
                    &request.sql,
                    &request.params,
                    row_limit,
                    query_timeout,
                )
                .await?;
                process_rows(rows, row_limit, start)
            }
            DbPool::SQLite(p) => {
                let rows =
                    sqlite::fetch_rows(p, &request.sql, &request.params, row_limit, query_timeout)
                        .await?;
                process_rows(rows, row_limit, start)
            }
            DbPool::MsSql(client) => {
                let rows =
                    mssql::fetch_rows(client, &request.sql, &request.params, row_limit, query_timeout)
                        .await?;
                process_rows(rows, row_limit, start)
            }
        };

        result.map_err(|e| e.with_statement(&request.sql))
    }

    /// Execute a write operation (INSERT, UPDATE, DELETE) and return
    /// (affected rows, execution time in ms).
    pub async fn execute_write(
        &self,
        pool: &DbPool,
        sql: &str,
        params: &[QueryParam],
        query_timeout: Option<Duration>,
    ) -> DbResult<(u64, u64)> {
        let start = Instant::now();
        let query_timeout = query_timeout.unwrap_or(self.default_timeout);

        debug!(
            sql = %sql,
            params = params.len(),
            timeout_secs = query_timeout.as_secs(),
            "Executing write operation"
        );

        let rows_affected = match pool {
            DbPool::MySql(p) => mysql::execute_write(p, sql, params, query_timeout).await,
            DbPool::Postgres(p) => postgres::execute_write(p, sql, params, query_timeout).await,
            DbPool::SQLite(p) => sqlite::execute_write(p, sql, params, query_timeout).await,
            DbPool::MsSql(client) => mssql::execute_write(client, sql, params, query_timeout).await,
        }
        .map_err(|e| e.with_statement(sql))?;

        let execution_time_ms = start.elapsed().as_millis() as u64;
        Ok((rows_affected, execution_time_ms))
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Process rows from any engine into a QueryResult.
fn process_rows<R: RowToCells>(
    rows: Vec<R>,
    row_limit: u32,
    start: Instant,
) -> DbResult<QueryResult> {
    let execution_time_ms = start.elapsed().as_millis() as u64;

    if rows.is_empty() {
        return Ok(QueryResult::empty(execution_time_ms));
    }

    let columns = rows[0].column_names();
    let total_rows = rows.len();
    let truncated = total_rows > row_limit as usize;
    let rows_to_take = (row_limit as usize).min(total_rows);

    let tuples: Vec<Vec<serde_json::Value>> = rows
        .iter()
        .take(rows_to_take)
        .map(|r| r.to_cells())
        .collect();

    if truncated {
        warn!(
            total_rows = total_rows,
            limit = row_limit,
            "Query result truncated"
        );
    }

    let row_count = tuples.len();
    Ok(QueryResult {
        columns,
        rows: tuples,
        row_count,
        truncated,
        rows_affected: None,
        execution_time_ms,
    })
}

// =============================================================================
// Common Helper Functions
// =============================================================================

fn collect_rows<R>(results: Vec<Result<R, sqlx::Error>>) -> DbResult<Vec<R>> {
    let mut rows = Vec::with_capacity(results.len());
    for result in results {
        rows.push(result.map_err(DbError::from)?);
    }
    Ok(rows)
}

fn timeout_error(operation: &str, timeout: Duration) -> DbError {
    DbError::timeout(operation, timeout.as_secs() as u32)
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================

mod mysql {
    use super::*;
    use sqlx::MySqlPool;
    use sqlx::mysql::{MySqlArguments, MySqlRow};

    pub async fn fetch_rows(
        pool: &MySqlPool,
        sql: &str,
        params: &[QueryParam],
        row_limit: u32,
        query_timeout: Duration,
    ) -> DbResult<Vec<MySqlRow>> {
        // When params is empty, use raw SQL to avoid prepared statement issues
        let fetch_limit = row_limit as usize + 1;
        let rows_future = if params.is_empty() {
            use sqlx::Executor;
            let stream = pool.fetch(sql);
            stream.take(fetch_limit).collect::<Vec<_>>()
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            let stream = query.fetch(pool);
            stream.take(fetch_limit).collect::<Vec<_>>()
        };

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub async fn execute_write(
        pool: &MySqlPool,
        sql: &str,
        params: &[QueryParam],
        query_timeout: Duration,
    ) -> DbResult<u64> {
        let result = if params.is_empty() {
            use sqlx::Executor;
            timeout(query_timeout, pool.execute(sql)).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            timeout(query_timeout, query.execute(pool)).await
        };

        match result {
            Ok(Ok(r)) => Ok(r.rows_affected()),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("write operation", query_timeout)),
        }
    }

    fn bind_param<'q>(
        query: sqlx::query::Query<'q, sqlx::MySql, MySqlArguments>,
        param: &'q QueryParam,
    ) -> sqlx::query::Query<'q, sqlx::MySql, MySqlArguments> {
        match param {
            QueryParam::Null => query.bind(None::<String>),
            QueryParam::Bool(v) => query.bind(*v),
            QueryParam::Int(v) => query.bind(*v),
            QueryParam::Float(v) => query.bind(*v),
            QueryParam::String(v) => query.bind(v.as_str()),
            QueryParam::Bytes(v) => query.bind(v.as_slice()),
        }
    }
}

mod postgres {
    use super::*;
    use sqlx::PgPool;
    use sqlx::postgres::{PgArguments, PgRow};

    pub async fn fetch_rows(
        pool: &PgPool,
        sql: &str,
        params: &[QueryParam],
        row_limit: u32,
        query_timeout: Duration,
    ) -> DbResult<Vec<PgRow>> {
        let fetch_limit = row_limit as usize + 1;
        let rows_future = if params.is_empty() {
            use sqlx::Executor;
            let stream = pool.fetch(sql);
            stream.take(fetch_limit).collect::<Vec<_>>()
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            let stream = query.fetch(pool);
            stream.take(fetch_limit).collect::<Vec<_>>()
        };

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub async fn execute_write(
        pool: &PgPool,
        sql: &str,
        params: &[QueryParam],
        query_timeout: Duration,
    ) -> DbResult<u64> {
        let result = if params.is_empty() {
            use sqlx::Executor;
            timeout(query_timeout, pool.execute(sql)).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            timeout(query_timeout, query.execute(pool)).await
        };

        match result {
            Ok(Ok(r)) => Ok(r.rows_affected()),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("write operation", query_timeout)),
        }
    }

    fn bind_param<'q>(
        query: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
        param: &'q QueryParam,
    ) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
        match param {
            QueryParam::Null => query.bind(None::<String>),
            QueryParam::Bool(v) => query.bind(*v),
            QueryParam::Int(v) => query.bind(*v),
            QueryParam::Float(v) => query.bind(*v),
            QueryParam::String(v) => query.bind(v.as_str()),
            QueryParam::Bytes(v) => query.bind(v.as_slice()),
        }
    }
}

mod sqlite {
    use super::*;
    use sqlx::SqlitePool;
    use sqlx::sqlite::{SqliteArguments, SqliteRow};

    pub async fn fetch_rows(
        pool: &SqlitePool,
        sql: &str,
        params: &[QueryParam],
        row_limit: u32,
        query_timeout: Duration,
    ) -> DbResult<Vec<SqliteRow>> {
        let fetch_limit = row_limit as usize + 1;
        let rows_future = if params.is_empty() {
            use sqlx::Executor;
            let stream = pool.fetch(sql);
            stream.take(fetch_limit).collect::<Vec<_>>()
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            let stream = query.fetch(pool);
            stream.take(fetch_limit).collect::<Vec<_>>()
        };

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub async fn execute_write(
        pool: &SqlitePool,
        sql: &str,
        params: &[QueryParam],
        query_timeout: Duration,
    ) -> DbResult<u64> {
        let result = if params.is_empty() {
            use sqlx::Executor;
            timeout(query_timeout, pool.execute(sql)).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            timeout(query_timeout, query.execute(pool)).await
        };

        match result {
            Ok(Ok(r)) => Ok(r.rows_affected()),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("write operation", query_timeout)),
        }
    }

    fn bind_param<'q>(
        query: sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
        param: &'q QueryParam,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
        match param {
            QueryParam::Null => query.bind(None::<String>),
            QueryParam::Bool(v) => query.bind(*v),
            QueryParam::Int(v) => query.bind(*v),
            QueryParam::Float(v) => query.bind(*v),
            QueryParam::String(v) => query.bind(v.as_str()),
            QueryParam::Bytes(v) => query.bind(v.as_slice()),
        }
    }
}

mod mssql {
    use super::*;
    use futures_util::TryStreamExt;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    pub async fn fetch_rows(
        client: &Arc<Mutex<MssqlClient>>,
        sql: &str,
        params: &[QueryParam],
        row_limit: u32,
        query_timeout: Duration,
    ) -> DbResult<Vec<tiberius::Row>> {
        let fetch_limit = row_limit as usize + 1;
        let mut client = client.lock().await;

        let rows_future = async {
            let mut stream = if params.is_empty() {
                client.simple_query(sql).await?
            } else {
                let owned = to_sql_params(params);
                let refs: Vec<&dyn tiberius::ToSql> =
                    owned.iter().map(|p| p as &dyn tiberius::ToSql).collect();
                client.query(sql, &refs).await?
            };

            // The stream must be drained even past the cap, or the
            // session is left with pending result packets.
            let mut rows = Vec::new();
            while let Some(item) = stream.try_next().await? {
                if let tiberius::QueryItem::Row(row) = item {
                    if rows.len() < fetch_limit {
                        rows.push(row);
                    }
                }
            }
            Ok::<_, tiberius::error::Error>(rows)
        };

        match timeout(query_timeout, rows_future).await {
            Ok(Ok(rows)) => Ok(rows),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub async fn execute_write(
        client: &Arc<Mutex<MssqlClient>>,
        sql: &str,
        params: &[QueryParam],
        query_timeout: Duration,
    ) -> DbResult<u64> {
        let mut client = client.lock().await;

        let write_future = async {
            let result = if params.is_empty() {
                client.execute(sql, &[]).await?
            } else {
                let owned = to_sql_params(params);
                let refs: Vec<&dyn tiberius::ToSql> =
                    owned.iter().map(|p| p as &dyn tiberius::ToSql).collect();
                client.execute(sql, &refs).await?
            };
            Ok::<_, tiberius::error::Error>(result.total())
        };

        match timeout(query_timeout, write_future).await {
            Ok(Ok(rows_affected)) => Ok(rows_affected),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("write operation", query_timeout)),
        }
    }

    /// Owned parameter values implementing tiberius's ToSql.
    enum MsParam {
        Null,
        Bool(bool),
        Int(i64),
        Float(f64),
        String(String),
        Bytes(Vec<u8>),
    }

    impl tiberius::ToSql for MsParam {
        fn to_sql(&self) -> tiberius::ColumnData<'_> {
            match self {
                MsParam::Null => tiberius::ColumnData::String(None),
                MsParam::Bool(v) => tiberius::ColumnData::Bit(Some(*v)),
                MsParam::Int(v) => tiberius::ColumnData::I64(Some(*v)),
                MsParam::Float(v) => tiberius::ColumnData::F64(Some(*v)),
                MsParam::String(v) => {
                    tiberius::ColumnData::String(Some(std::borrow::Cow::from(v.as_str())))
                }
                MsParam::Bytes(v) => {
                    tiberius::ColumnData::Binary(Some(std::borrow::Cow::from(v.as_slice())))
                }
            }
        }
    }

    fn to_sql_params(params: &[QueryParam]) -> Vec<MsParam> {
        params
            .iter()
            .map(|p| match p {
                QueryParam::Null => MsParam::Null,
                QueryParam::Bool(v) => MsParam::Bool(*v),
                QueryParam::Int(v) => MsParam::Int(*v),
                QueryParam::Float(v) => MsParam::Float(*v),
                QueryParam::String(v) => MsParam::String(v.clone()),
                QueryParam::Bytes(v) => MsParam::Bytes(v.clone()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_defaults() {
        let executor = QueryExecutor::new();
        assert_eq!(
            executor.default_timeout,
            Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS as u64)
        );
        assert_eq!(executor.default_limit, DEFAULT_ROW_LIMIT);
    }

    #[test]
    fn test_executor_custom_settings() {
        let executor = QueryExecutor::with_defaults(60, 500);
        assert_eq!(executor.default_timeout, Duration::from_secs(60));
        assert_eq!(executor.default_limit, 500);
    }

    #[test]
    fn test_executor_limit_capped() {
        let executor = QueryExecutor::with_defaults(30, 99999);
        assert_eq!(executor.default_limit, MAX_ROW_LIMIT);
    }
}
