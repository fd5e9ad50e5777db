//! SQL statement classification.
//!
//! Classifies statements with [sqlparser](https://docs.rs/sqlparser/) so
//! the execution gate can route reads through the row-capped query path,
//! route writes to writable connections only, and refuse everything it
//! cannot account for. AST-based classification means no bypass through
//! formatting tricks or SQL dialect variations.

use crate::error::{DbError, DbResult};
use crate::models::DatabaseType;
use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

/// Kind of SQL statement detected by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// SELECT and other read-only queries (SELECT, SHOW, EXPLAIN on reads)
    Read,
    /// INSERT, UPDATE, DELETE, MERGE
    DmlWrite,
    /// CREATE, DROP, ALTER, TRUNCATE
    Ddl,
    /// BEGIN, COMMIT, ROLLBACK, SAVEPOINT
    Transaction,
    /// CALL, EXECUTE, PREPARE (stored procedures)
    ProcedureCall,
    /// GRANT, SET, VACUUM, PRAGMA and friends
    Administrative,
    /// Unknown or unclassifiable statement
    Unknown,
}

/// Get the appropriate SQL dialect for the given database type.
fn get_dialect(db_type: DatabaseType) -> Box<dyn Dialect> {
    match db_type {
        DatabaseType::PostgreSQL => Box::new(PostgreSqlDialect {}),
        DatabaseType::MySQL => Box::new(MySqlDialect {}),
        DatabaseType::MsSQL => Box::new(MsSqlDialect {}),
        DatabaseType::SQLite => Box::new(SQLiteDialect {}),
    }
}

/// Classify a SQL string, returning the most restrictive kind found.
///
/// A multi-statement string is as restricted as its worst member: a
/// trailing INSERT makes the whole input a write.
pub fn classify_sql(sql: &str, db_type: DatabaseType) -> DbResult<StatementKind> {
    let dialect = get_dialect(db_type);

    let statements = Parser::parse_sql(dialect.as_ref(), sql)
        .map_err(|e| DbError::invalid_input(format!("Failed to parse SQL statement: {}", e)))?;

    if statements.is_empty() {
        return Err(DbError::invalid_input("Empty SQL statement"));
    }

    Ok(statements
        .iter()
        .map(classify_statement)
        .max_by_key(|kind| restriction_rank(*kind))
        .unwrap_or(StatementKind::Unknown))
}

/// Validate SQL for read-only execution.
///
/// Returns `Ok(())` for read statements, `Err(DbError::Permission)` for
/// anything that could modify state.
///
/// # Examples
///
/// ```
/// use sql_expert::tools::sql_validator::validate_readonly;
/// use sql_expert::models::DatabaseType;
///
/// assert!(validate_readonly("SELECT * FROM users", DatabaseType::PostgreSQL).is_ok());
/// assert!(validate_readonly("INSERT INTO users VALUES (1)", DatabaseType::PostgreSQL).is_err());
/// ```
pub fn validate_readonly(sql: &str, db_type: DatabaseType) -> DbResult<()> {
    match classify_sql(sql, db_type)? {
        StatementKind::Read => Ok(()),
        kind => Err(DbError::permission(
            kind_name(kind),
            "Connection is read-only; only SELECT-style statements are allowed",
        )),
    }
}

fn restriction_rank(kind: StatementKind) -> u8 {
    match kind {
        StatementKind::Read => 0,
        StatementKind::DmlWrite => 1,
        StatementKind::Ddl => 2,
        StatementKind::Transaction => 3,
        StatementKind::ProcedureCall => 4,
        StatementKind::Administrative => 5,
        StatementKind::Unknown => 6,
    }
}

fn kind_name(kind: StatementKind) -> &'static str {
    match kind {
        StatementKind::Read => "read",
        StatementKind::DmlWrite => "write",
        StatementKind::Ddl => "DDL",
        StatementKind::Transaction => "transaction control",
        StatementKind::ProcedureCall => "procedure call",
        StatementKind::Administrative => "administrative operation",
        StatementKind::Unknown => "unrecognized statement",
    }
}

/// Classify a parsed statement.
fn classify_statement(stmt: &Statement) -> StatementKind {
    match stmt {
        // Read-only operations
        Statement::Query(_) => StatementKind::Read,
        Statement::ShowTables { .. }
        | Statement::ShowColumns { .. }
        | Statement::ShowDatabases { .. }
        | Statement::ShowSchemas { .. }
        | Statement::ShowCreate { .. }
        | Statement::ShowFunctions { .. }
        | Statement::ShowVariable { .. }
        | Statement::ShowVariables { .. }
        | Statement::ShowStatus { .. }
        | Statement::ShowCollation { .. }
        | Statement::ExplainTable { .. } => StatementKind::Read,

        // EXPLAIN inherits the classification of the statement it explains
        Statement::Explain { statement, .. } => {
            let inner = classify_statement(statement);
            if inner == StatementKind::Read {
                StatementKind::Read
            } else {
                inner
            }
        }

        // DML writes
        Statement::Insert(_)
        | Statement::Update { .. }
        | Statement::Delete(_)
        | Statement::Merge { .. }
        | Statement::Copy { .. } => StatementKind::DmlWrite,

        // DDL
        Statement::CreateTable { .. }
        | Statement::CreateView { .. }
        | Statement::CreateIndex(_)
        | Statement::CreateSchema { .. }
        | Statement::CreateDatabase { .. }
        | Statement::CreateSequence { .. }
        | Statement::CreateType { .. }
        | Statement::CreateFunction { .. }
        | Statement::CreateProcedure { .. }
        | Statement::CreateTrigger { .. }
        | Statement::CreateRole { .. }
        | Statement::CreateVirtualTable { .. }
        | Statement::CreateExtension { .. }
        | Statement::AlterTable { .. }
        | Statement::AlterView { .. }
        | Statement::AlterIndex { .. }
        | Statement::AlterSchema { .. }
        | Statement::AlterRole { .. }
        | Statement::AlterType { .. }
        | Statement::Drop { .. }
        | Statement::DropFunction { .. }
        | Statement::DropProcedure { .. }
        | Statement::DropTrigger { .. }
        | Statement::Truncate { .. }
        | Statement::Comment { .. } => StatementKind::Ddl,

        // Transaction control
        Statement::StartTransaction { .. }
        | Statement::Commit { .. }
        | Statement::Rollback { .. }
        | Statement::Savepoint { .. }
        | Statement::ReleaseSavepoint { .. } => StatementKind::Transaction,

        // Procedure/function calls - behavior cannot be verified statically
        Statement::Call { .. }
        | Statement::Execute { .. }
        | Statement::Prepare { .. }
        | Statement::Deallocate { .. } => StatementKind::ProcedureCall,

        // Administrative operations
        Statement::Grant { .. }
        | Statement::Revoke { .. }
        | Statement::Deny { .. }
        | Statement::Set(_)
        | Statement::Use(_)
        | Statement::Kill { .. }
        | Statement::Vacuum { .. }
        | Statement::Analyze { .. }
        | Statement::Discard { .. }
        | Statement::LockTables { .. }
        | Statement::UnlockTables
        | Statement::Flush { .. }
        | Statement::Pragma { .. }
        | Statement::AttachDatabase { .. }
        | Statement::OptimizeTable { .. } => StatementKind::Administrative,

        // Everything else is blocked conservatively
        _ => StatementKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_DB_TYPE: DatabaseType = DatabaseType::PostgreSQL;

    #[test]
    fn test_validate_readonly_select_ok() {
        assert!(validate_readonly("SELECT * FROM users", TEST_DB_TYPE).is_ok());
    }

    #[test]
    fn test_validate_readonly_insert_error() {
        let result = validate_readonly("INSERT INTO users VALUES (1)", TEST_DB_TYPE);
        assert!(matches!(result, Err(DbError::Permission { .. })));
    }

    #[test]
    fn test_validate_readonly_update_error() {
        assert!(validate_readonly("UPDATE users SET name = 'test'", TEST_DB_TYPE).is_err());
    }

    #[test]
    fn test_validate_readonly_create_error() {
        assert!(validate_readonly("CREATE TABLE test (id INT)", TEST_DB_TYPE).is_err());
    }

    #[test]
    fn test_validate_readonly_drop_error() {
        assert!(validate_readonly("DROP TABLE users", TEST_DB_TYPE).is_err());
    }

    #[test]
    fn test_classify_select() {
        assert_eq!(
            classify_sql("SELECT 1", TEST_DB_TYPE).unwrap(),
            StatementKind::Read
        );
    }

    #[test]
    fn test_classify_insert() {
        assert_eq!(
            classify_sql("INSERT INTO t VALUES (1)", TEST_DB_TYPE).unwrap(),
            StatementKind::DmlWrite
        );
    }

    #[test]
    fn test_classify_ddl() {
        assert_eq!(
            classify_sql("CREATE TABLE t (id INT)", TEST_DB_TYPE).unwrap(),
            StatementKind::Ddl
        );
    }

    #[test]
    fn test_classify_transaction() {
        assert_eq!(
            classify_sql("COMMIT", TEST_DB_TYPE).unwrap(),
            StatementKind::Transaction
        );
    }

    #[test]
    fn test_mssql_dialect_brackets() {
        assert!(validate_readonly("SELECT [id] FROM [dbo].[orders]", DatabaseType::MsSQL).is_ok());
    }

    #[test]
    fn test_complex_select_with_subquery() {
        let sql = r#"
            SELECT u.name, (SELECT COUNT(*) FROM orders WHERE user_id = u.id) as order_count
            FROM users u
            WHERE u.id IN (SELECT user_id FROM active_users)
        "#;
        assert!(validate_readonly(sql, TEST_DB_TYPE).is_ok());
    }

    #[test]
    fn test_select_with_union() {
        let sql = "SELECT a FROM t1 UNION ALL SELECT b FROM t2";
        assert!(validate_readonly(sql, TEST_DB_TYPE).is_ok());
    }

    #[test]
    fn test_multiple_statements_take_worst_kind() {
        // If any statement is a write, the whole thing classifies as one
        let sql = "SELECT 1; INSERT INTO users VALUES (1)";
        assert_eq!(
            classify_sql(sql, TEST_DB_TYPE).unwrap(),
            StatementKind::DmlWrite
        );
    }

    #[test]
    fn test_insert_select_blocked() {
        // INSERT ... SELECT should be blocked even though it contains SELECT
        let sql = "INSERT INTO archive SELECT * FROM users WHERE created_at < '2020-01-01'";
        assert!(validate_readonly(sql, TEST_DB_TYPE).is_err());
    }

    #[test]
    fn test_update_with_subquery_blocked() {
        let sql = "UPDATE users SET status = 'inactive' WHERE id IN (SELECT id FROM old_users)";
        assert!(validate_readonly(sql, TEST_DB_TYPE).is_err());
    }

    #[test]
    fn test_empty_sql_is_invalid() {
        assert!(matches!(
            classify_sql("", TEST_DB_TYPE),
            Err(DbError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_explain_select_is_read() {
        assert_eq!(
            classify_sql("EXPLAIN SELECT * FROM users", TEST_DB_TYPE).unwrap(),
            StatementKind::Read
        );
    }

    #[test]
    fn test_explain_delete_is_write() {
        assert_eq!(
            classify_sql("EXPLAIN DELETE FROM users", TEST_DB_TYPE).unwrap(),
            StatementKind::DmlWrite
        );
    }
}
