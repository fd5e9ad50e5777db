//! Schema introspection.
//!
//! Turns a live connection into a normalized [`SchemaSnapshot`]: catalog
//! queries per engine, native type names mapped onto the closed tag set,
//! tables in deterministic (schema, name) order so repeated introspection
//! of an unchanged schema renders byte-identical DDL text.
//!
//! A single unmapped column type never fails the snapshot - it degrades to
//! the `other` tag. A failing catalog query fails introspection entirely,
//! preserving the engine's message.
//!
//! # Architecture
//!
//! SQL queries are organized in the `queries` submodule with constants for
//! each database type. Database-specific implementations are in their
//! respective submodules (postgres, mysql, sqlite, mssql), each providing
//! the same interface.

use crate::db::pool::{DbPool, MssqlClient};
use crate::db::types::normalize_native_type;
use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnDescriptor, DatabaseType, ForeignKeyRef, IndexDescriptor, SchemaSnapshot,
    TableDescriptor,
};
use tracing::debug;

/// Schema introspector producing normalized snapshots.
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Introspect the full schema behind a connection handle.
    pub async fn introspect(pool: &DbPool) -> DbResult<SchemaSnapshot> {
        let result = match pool {
            DbPool::Postgres(p) => postgres::introspect(p).await,
            DbPool::MySql(p) => mysql::introspect(p).await,
            DbPool::SQLite(p) => sqlite::introspect(p).await,
            DbPool::MsSql(client) => mssql::introspect(client).await,
        };

        result.map_err(|e| match e {
            // Catalog-query failures surface as introspection errors with
            // the engine message intact.
            DbError::Execution { message, .. } => DbError::introspection(message, "system catalog"),
            other => other,
        })
    }
}

// =============================================================================
// SQL Query Templates
// =============================================================================

mod queries {
    pub mod postgres {
        pub const LIST_TABLES: &str = r#"
            SELECT table_schema, table_name
            FROM information_schema.tables
            WHERE table_type = 'BASE TABLE'
            AND table_schema NOT IN ('pg_catalog', 'information_schema')
            ORDER BY table_schema, table_name
            "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT
            c.column_name,
            format_type(a.atttypid, a.atttypmod) as column_type,
            c.is_nullable,
            c.column_default,
            CASE WHEN pk.column_name IS NOT NULL THEN true ELSE false END as is_primary_key
        FROM information_schema.columns c
        JOIN pg_class t ON t.relname = c.table_name
        JOIN pg_namespace n ON n.oid = t.relnamespace AND n.nspname = c.table_schema
        JOIN pg_attribute a ON a.attrelid = t.oid AND a.attname = c.column_name
        LEFT JOIN (
            SELECT kcu.column_name
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            WHERE tc.table_name = $1
            AND tc.table_schema = $2
            AND tc.constraint_type = 'PRIMARY KEY'
        ) pk ON c.column_name = pk.column_name
        WHERE c.table_name = $1 AND c.table_schema = $2
        ORDER BY c.ordinal_position
        "#;

        pub const DESCRIBE_FOREIGN_KEYS: &str = r#"
        SELECT
            kcu.column_name,
            ccu.table_name AS foreign_table_name,
            ccu.column_name AS foreign_column_name
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            ON tc.constraint_name = kcu.constraint_name
            AND tc.table_schema = kcu.table_schema
        JOIN information_schema.constraint_column_usage ccu
            ON ccu.constraint_name = tc.constraint_name
            AND ccu.table_schema = tc.table_schema
        WHERE tc.table_name = $1
        AND tc.table_schema = $2
        AND tc.constraint_type = 'FOREIGN KEY'
        "#;

        pub const DESCRIBE_INDEXES: &str = r#"
        SELECT
            i.relname as index_name,
            array_agg(a.attname ORDER BY array_position(ix.indkey, a.attnum)) as column_names,
            ix.indisunique as is_unique,
            am.amname as index_algorithm
        FROM pg_index ix
        JOIN pg_class i ON i.oid = ix.indexrelid
        JOIN pg_class t ON t.oid = ix.indrelid
        JOIN pg_namespace n ON n.oid = t.relnamespace
        LEFT JOIN pg_am am ON am.oid = i.relam
        JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey)
        WHERE t.relname = $1 AND n.nspname = $2 AND NOT ix.indisprimary
        GROUP BY i.relname, ix.indisunique, am.amname
        ORDER BY i.relname
        "#;
    }

    pub mod mysql {
        pub const LIST_TABLES: &str = r#"
            SELECT CONVERT(TABLE_NAME USING utf8) AS TABLE_NAME
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE()
            AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
            "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT
            CONVERT(COLUMN_NAME USING utf8) AS COLUMN_NAME,
            CONVERT(COLUMN_TYPE USING utf8) AS COLUMN_TYPE,
            CONVERT(IS_NULLABLE USING utf8) AS IS_NULLABLE,
            CONVERT(COLUMN_DEFAULT USING utf8) AS COLUMN_DEFAULT,
            CONVERT(COLUMN_KEY USING utf8) AS COLUMN_KEY
        FROM information_schema.columns
        WHERE TABLE_NAME = ? AND TABLE_SCHEMA = DATABASE()
        ORDER BY ORDINAL_POSITION
        "#;

        pub const DESCRIBE_FOREIGN_KEYS: &str = r#"
        SELECT
            CONVERT(COLUMN_NAME USING utf8) AS COLUMN_NAME,
            CONVERT(REFERENCED_TABLE_NAME USING utf8) AS REFERENCED_TABLE_NAME,
            CONVERT(REFERENCED_COLUMN_NAME USING utf8) AS REFERENCED_COLUMN_NAME
        FROM information_schema.KEY_COLUMN_USAGE
        WHERE TABLE_NAME = ?
        AND TABLE_SCHEMA = DATABASE()
        AND REFERENCED_TABLE_NAME IS NOT NULL
        "#;

        pub const DESCRIBE_INDEXES: &str = r#"
        SELECT
            CONVERT(INDEX_NAME USING utf8) AS INDEX_NAME,
            CONVERT(GROUP_CONCAT(COLUMN_NAME ORDER BY SEQ_IN_INDEX) USING utf8) as COLUMN_NAMES,
            NOT NON_UNIQUE as IS_UNIQUE,
            CONVERT(INDEX_TYPE USING utf8) AS INDEX_ALGORITHM
        FROM information_schema.STATISTICS
        WHERE TABLE_NAME = ? AND TABLE_SCHEMA = DATABASE()
        AND INDEX_NAME != 'PRIMARY'
        GROUP BY INDEX_NAME, NON_UNIQUE, INDEX_TYPE
        ORDER BY INDEX_NAME
        "#;
    }

    pub mod sqlite {
        pub const LIST_TABLES: &str = r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table'
            AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#;
    }

    pub mod mssql {
        pub const LIST_TABLES: &str = r#"
            SELECT TABLE_SCHEMA, TABLE_NAME
            FROM INFORMATION_SCHEMA.TABLES
            WHERE TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_SCHEMA, TABLE_NAME
            "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT
            c.COLUMN_NAME,
            c.DATA_TYPE,
            c.IS_NULLABLE,
            c.COLUMN_DEFAULT,
            CASE WHEN pk.COLUMN_NAME IS NOT NULL THEN 1 ELSE 0 END AS IS_PRIMARY_KEY
        FROM INFORMATION_SCHEMA.COLUMNS c
        LEFT JOIN (
            SELECT kcu.COLUMN_NAME
            FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
            JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
                ON tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
                AND tc.TABLE_SCHEMA = kcu.TABLE_SCHEMA
            WHERE tc.TABLE_NAME = @P1
            AND tc.TABLE_SCHEMA = @P2
            AND tc.CONSTRAINT_TYPE = 'PRIMARY KEY'
        ) pk ON c.COLUMN_NAME = pk.COLUMN_NAME
        WHERE c.TABLE_NAME = @P1 AND c.TABLE_SCHEMA = @P2
        ORDER BY c.ORDINAL_POSITION
        "#;

        pub const DESCRIBE_FOREIGN_KEYS: &str = r#"
        SELECT
            kcu.COLUMN_NAME,
            ccu.TABLE_NAME AS REFERENCED_TABLE_NAME,
            ccu.COLUMN_NAME AS REFERENCED_COLUMN_NAME
        FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
        JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
            ON tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
            AND tc.TABLE_SCHEMA = kcu.TABLE_SCHEMA
        JOIN INFORMATION_SCHEMA.CONSTRAINT_COLUMN_USAGE ccu
            ON ccu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME
            AND ccu.TABLE_SCHEMA = tc.TABLE_SCHEMA
        WHERE tc.TABLE_NAME = @P1
        AND tc.TABLE_SCHEMA = @P2
        AND tc.CONSTRAINT_TYPE = 'FOREIGN KEY'
        "#;

        pub const DESCRIBE_INDEXES: &str = r#"
        SELECT
            i.name AS INDEX_NAME,
            STRING_AGG(c.name, ',') WITHIN GROUP (ORDER BY ic.key_ordinal) AS COLUMN_NAMES,
            i.is_unique AS IS_UNIQUE
        FROM sys.indexes i
        JOIN sys.index_columns ic ON i.object_id = ic.object_id AND i.index_id = ic.index_id
        JOIN sys.columns c ON ic.object_id = c.object_id AND ic.column_id = c.column_id
        WHERE i.object_id = OBJECT_ID(@P1)
        AND i.is_primary_key = 0
        AND i.name IS NOT NULL
        GROUP BY i.name, i.is_unique
        ORDER BY i.name
        "#;
    }
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================

mod postgres {
    use super::*;
    use sqlx::{PgPool, Row};

    pub async fn introspect(pool: &PgPool) -> DbResult<SchemaSnapshot> {
        let rows = sqlx::query(queries::postgres::LIST_TABLES)
            .fetch_all(pool)
            .await?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let schema: String = row.get("table_schema");
            let name: String = row.get("table_name");
            tables.push(describe_table(pool, &name, &schema).await?);
        }

        debug!(count = tables.len(), "Introspected PostgreSQL schema");
        Ok(SchemaSnapshot::new(DatabaseType::PostgreSQL, tables))
    }

    async fn describe_table(
        pool: &PgPool,
        table_name: &str,
        schema_name: &str,
    ) -> DbResult<TableDescriptor> {
        let rows = sqlx::query(queries::postgres::DESCRIBE_COLUMNS)
            .bind(table_name)
            .bind(schema_name)
            .fetch_all(pool)
            .await?;

        let mut table = TableDescriptor::new(table_name).with_schema(schema_name);
        let mut primary_key = Vec::new();

        for row in &rows {
            let name: String = row.get("column_name");
            let column_type: String = row.get("column_type");
            let nullable: String = row.get("is_nullable");
            let default_value: Option<String> = row.try_get("column_default").ok().flatten();
            let is_pk: bool = row.get("is_primary_key");

            let tag = normalize_native_type(DatabaseType::PostgreSQL, &column_type);
            let mut col = ColumnDescriptor::new(&name, &column_type, tag, nullable == "YES");
            if let Some(def) = default_value {
                col = col.with_default(def);
            }
            table.columns.push(col);

            if is_pk {
                primary_key.push(name);
            }
        }
        table.primary_key = primary_key;

        table.foreign_keys = fetch_foreign_keys(pool, table_name, schema_name).await?;
        table.indexes = fetch_indexes(pool, table_name, schema_name).await;
        Ok(table)
    }

    async fn fetch_foreign_keys(
        pool: &PgPool,
        table_name: &str,
        schema_name: &str,
    ) -> DbResult<Vec<ForeignKeyRef>> {
        let rows = sqlx::query(queries::postgres::DESCRIBE_FOREIGN_KEYS)
            .bind(table_name)
            .bind(schema_name)
            .fetch_all(pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let column: String = row.get("column_name");
                let ref_table: String = row.get("foreign_table_name");
                let ref_column: String = row.get("foreign_column_name");
                ForeignKeyRef::new(column, ref_table, ref_column)
            })
            .collect())
    }

    async fn fetch_indexes(
        pool: &PgPool,
        table_name: &str,
        schema_name: &str,
    ) -> Vec<IndexDescriptor> {
        let rows = sqlx::query(queries::postgres::DESCRIBE_INDEXES)
            .bind(table_name)
            .bind(schema_name)
            .fetch_all(pool)
            .await
            .unwrap_or_default();

        rows.iter()
            .filter_map(|row| {
                let name: String = row.get("index_name");
                let columns: Vec<String> = row.get("column_names");
                let is_unique: bool = row.get("is_unique");
                let algorithm: Option<String> = row.get("index_algorithm");

                if columns.is_empty() {
                    None
                } else {
                    let mut idx = IndexDescriptor::new(name, columns).with_unique(is_unique);
                    if let Some(algo) = algorithm.filter(|a| !a.is_empty()) {
                        idx = idx.with_algorithm(algo);
                    }
                    Some(idx)
                }
            })
            .collect()
    }
}

mod mysql {
    use super::*;
    use sqlx::{MySqlPool, Row};

    /// Safely get a string from a MySQL row.
    /// MySQL may return VARBINARY instead of VARCHAR depending on charset configuration.
    fn get_string(row: &sqlx::mysql::MySqlRow, column: &str) -> String {
        row.try_get::<String, _>(column)
            .ok()
            .or_else(|| {
                row.try_get::<Vec<u8>, _>(column)
                    .ok()
                    .and_then(|bytes| String::from_utf8(bytes).ok())
            })
            .unwrap_or_default()
    }

    /// Safely get an optional string from a MySQL row.
    fn get_optional_string(row: &sqlx::mysql::MySqlRow, column: &str) -> Option<String> {
        row.try_get::<Option<String>, _>(column)
            .ok()
            .flatten()
            .or_else(|| {
                row.try_get::<Option<Vec<u8>>, _>(column)
                    .ok()
                    .flatten()
                    .and_then(|bytes| String::from_utf8(bytes).ok())
            })
    }

    pub async fn introspect(pool: &MySqlPool) -> DbResult<SchemaSnapshot> {
        let rows = sqlx::query(queries::mysql::LIST_TABLES)
            .fetch_all(pool)
            .await?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let name = get_string(row, "TABLE_NAME");
            if name.is_empty() {
                continue;
            }
            tables.push(describe_table(pool, &name).await?);
        }

        debug!(count = tables.len(), "Introspected MySQL schema");
        Ok(SchemaSnapshot::new(DatabaseType::MySQL, tables))
    }

    async fn describe_table(pool: &MySqlPool, table_name: &str) -> DbResult<TableDescriptor> {
        let rows = sqlx::query(queries::mysql::DESCRIBE_COLUMNS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;

        let mut table = TableDescriptor::new(table_name);
        let mut primary_key = Vec::new();

        for row in &rows {
            let name = get_string(row, "COLUMN_NAME");
            let column_type = get_string(row, "COLUMN_TYPE");
            let nullable = get_string(row, "IS_NULLABLE");
            let default_value = get_optional_string(row, "COLUMN_DEFAULT");
            let column_key = get_string(row, "COLUMN_KEY");

            let tag = normalize_native_type(DatabaseType::MySQL, &column_type);
            let mut col = ColumnDescriptor::new(&name, &column_type, tag, nullable == "YES");
            if let Some(def) = default_value {
                col = col.with_default(def);
            }
            table.columns.push(col);

            if column_key == "PRI" {
                primary_key.push(name);
            }
        }
        table.primary_key = primary_key;

        table.foreign_keys = fetch_foreign_keys(pool, table_name).await?;
        table.indexes = fetch_indexes(pool, table_name).await;
        Ok(table)
    }

    async fn fetch_foreign_keys(
        pool: &MySqlPool,
        table_name: &str,
    ) -> DbResult<Vec<ForeignKeyRef>> {
        let rows = sqlx::query(queries::mysql::DESCRIBE_FOREIGN_KEYS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                ForeignKeyRef::new(
                    get_string(row, "COLUMN_NAME"),
                    get_string(row, "REFERENCED_TABLE_NAME"),
                    get_string(row, "REFERENCED_COLUMN_NAME"),
                )
            })
            .collect())
    }

    async fn fetch_indexes(pool: &MySqlPool, table_name: &str) -> Vec<IndexDescriptor> {
        let rows = sqlx::query(queries::mysql::DESCRIBE_INDEXES)
            .bind(table_name)
            .fetch_all(pool)
            .await
            .unwrap_or_default();

        rows.iter()
            .map(|row| {
                let name = get_string(row, "INDEX_NAME");
                let columns_str = get_string(row, "COLUMN_NAMES");
                let is_unique: i64 = row.try_get("IS_UNIQUE").unwrap_or(0);
                let algorithm = get_optional_string(row, "INDEX_ALGORITHM");
                let columns: Vec<String> = columns_str.split(',').map(|s| s.to_string()).collect();

                let mut idx = IndexDescriptor::new(name, columns).with_unique(is_unique != 0);
                if let Some(algo) = algorithm.filter(|a| !a.is_empty()) {
                    idx = idx.with_algorithm(algo);
                }
                idx
            })
            .collect()
    }
}

mod sqlite {
    use super::*;
    use sqlx::{Row, SqlitePool};

    pub async fn introspect(pool: &SqlitePool) -> DbResult<SchemaSnapshot> {
        let rows = sqlx::query(queries::sqlite::LIST_TABLES)
            .fetch_all(pool)
            .await?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.get("name");
            tables.push(describe_table(pool, &name).await?);
        }

        debug!(count = tables.len(), "Introspected SQLite schema");
        Ok(SchemaSnapshot::new(DatabaseType::SQLite, tables))
    }

    async fn describe_table(pool: &SqlitePool, table_name: &str) -> DbResult<TableDescriptor> {
        let pragma_query = format!("PRAGMA table_info('{}')", table_name);
        let rows = sqlx::query(&pragma_query).fetch_all(pool).await?;

        let mut table = TableDescriptor::new(table_name);
        // pk column reports the 1-based position within the primary key
        let mut pk_columns: Vec<(i32, String)> = Vec::new();

        for row in &rows {
            let name: String = row.get("name");
            let data_type: String = row.get("type");
            let notnull: i32 = row.get("notnull");
            let default_value: Option<String> = row.try_get("dflt_value").ok().flatten();
            let pk: i32 = row.get("pk");

            let tag = normalize_native_type(DatabaseType::SQLite, &data_type);
            let mut col = ColumnDescriptor::new(&name, &data_type, tag, notnull == 0);
            if let Some(def) = default_value {
                col = col.with_default(def);
            }
            table.columns.push(col);

            if pk > 0 {
                pk_columns.push((pk, name));
            }
        }
        pk_columns.sort_by_key(|(pos, _)| *pos);
        table.primary_key = pk_columns.into_iter().map(|(_, name)| name).collect();

        table.foreign_keys = fetch_foreign_keys(pool, table_name).await;
        table.indexes = fetch_indexes(pool, table_name).await;
        Ok(table)
    }

    async fn fetch_foreign_keys(pool: &SqlitePool, table_name: &str) -> Vec<ForeignKeyRef> {
        let fk_query = format!("PRAGMA foreign_key_list('{}')", table_name);
        let rows = sqlx::query(&fk_query)
            .fetch_all(pool)
            .await
            .unwrap_or_default();

        rows.iter()
            .map(|row| {
                let column: String = row.get("from");
                let ref_table: String = row.get("table");
                let ref_column: Option<String> = row.try_get("to").ok().flatten();
                // "to" is NULL when the FK references the parent's primary key
                ForeignKeyRef::new(column, ref_table, ref_column.unwrap_or_default())
            })
            .collect()
    }

    async fn fetch_indexes(pool: &SqlitePool, table_name: &str) -> Vec<IndexDescriptor> {
        let idx_query = format!("PRAGMA index_list('{}')", table_name);
        let idx_list = sqlx::query(&idx_query)
            .fetch_all(pool)
            .await
            .unwrap_or_default();

        let mut indexes = Vec::new();
        for idx_row in &idx_list {
            let name: String = idx_row.get("name");
            let is_unique: i32 = idx_row.get("unique");
            let origin: String = idx_row.try_get("origin").unwrap_or_default();
            // Skip the implicit primary key index; it is rendered inline
            if origin == "pk" {
                continue;
            }

            let columns = fetch_index_columns(pool, &name).await;
            if !columns.is_empty() {
                indexes.push(IndexDescriptor::new(name, columns).with_unique(is_unique != 0));
            }
        }
        indexes.sort_by(|a, b| a.name.cmp(&b.name));
        indexes
    }

    async fn fetch_index_columns(pool: &SqlitePool, index_name: &str) -> Vec<String> {
        let query = format!("PRAGMA index_info('{}')", index_name);
        sqlx::query(&query)
            .fetch_all(pool)
            .await
            .unwrap_or_default()
            .iter()
            .map(|row| row.get("name"))
            .collect()
    }
}

mod mssql {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn get_string(row: &tiberius::Row, idx: usize) -> String {
        row.try_get::<&str, _>(idx)
            .ok()
            .flatten()
            .unwrap_or_default()
            .to_string()
    }

    fn get_optional_string(row: &tiberius::Row, idx: usize) -> Option<String> {
        row.try_get::<&str, _>(idx)
            .ok()
            .flatten()
            .map(|s| s.to_string())
    }

    pub async fn introspect(client: &Arc<Mutex<MssqlClient>>) -> DbResult<SchemaSnapshot> {
        let mut client = client.lock().await;

        let rows = client
            .simple_query(queries::mssql::LIST_TABLES)
            .await?
            .into_first_result()
            .await?;

        let names: Vec<(String, String)> = rows
            .iter()
            .map(|row| (get_string(row, 0), get_string(row, 1)))
            .collect();

        let mut tables = Vec::with_capacity(names.len());
        for (schema, name) in &names {
            tables.push(describe_table(&mut client, name, schema).await?);
        }

        debug!(count = tables.len(), "Introspected MSSQL schema");
        Ok(SchemaSnapshot::new(DatabaseType::MsSQL, tables))
    }

    async fn describe_table(
        client: &mut MssqlClient,
        table_name: &str,
        schema_name: &str,
    ) -> DbResult<TableDescriptor> {
        let rows = client
            .query(
                queries::mssql::DESCRIBE_COLUMNS,
                &[&table_name, &schema_name],
            )
            .await?
            .into_first_result()
            .await?;

        let mut table = TableDescriptor::new(table_name).with_schema(schema_name);
        let mut primary_key = Vec::new();

        for row in &rows {
            let name = get_string(row, 0);
            let data_type = get_string(row, 1);
            let nullable = get_string(row, 2);
            let default_value = get_optional_string(row, 3);
            let is_pk: i32 = row.try_get(4).ok().flatten().unwrap_or(0);

            let tag = normalize_native_type(DatabaseType::MsSQL, &data_type);
            let mut col = ColumnDescriptor::new(&name, &data_type, tag, nullable == "YES");
            if let Some(def) = default_value {
                col = col.with_default(def);
            }
            table.columns.push(col);

            if is_pk != 0 {
                primary_key.push(name);
            }
        }
        table.primary_key = primary_key;

        table.foreign_keys = fetch_foreign_keys(client, table_name, schema_name).await?;
        table.indexes = fetch_indexes(client, table_name, schema_name).await;
        Ok(table)
    }

    async fn fetch_foreign_keys(
        client: &mut MssqlClient,
        table_name: &str,
        schema_name: &str,
    ) -> DbResult<Vec<ForeignKeyRef>> {
        let rows = client
            .query(
                queries::mssql::DESCRIBE_FOREIGN_KEYS,
                &[&table_name, &schema_name],
            )
            .await?
            .into_first_result()
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                ForeignKeyRef::new(get_string(row, 0), get_string(row, 1), get_string(row, 2))
            })
            .collect())
    }

    async fn fetch_indexes(
        client: &mut MssqlClient,
        table_name: &str,
        schema_name: &str,
    ) -> Vec<IndexDescriptor> {
        let qualified = format!("{}.{}", schema_name, table_name);
        let rows = match client
            .query(queries::mssql::DESCRIBE_INDEXES, &[&qualified.as_str()])
            .await
        {
            Ok(stream) => stream.into_first_result().await.unwrap_or_default(),
            Err(_) => Vec::new(),
        };

        rows.iter()
            .filter_map(|row| {
                let name = get_string(row, 0);
                let columns_str = get_string(row, 1);
                let is_unique: bool = row.try_get(2).ok().flatten().unwrap_or(false);

                if name.is_empty() || columns_str.is_empty() {
                    None
                } else {
                    let columns: Vec<String> =
                        columns_str.split(',').map(|s| s.to_string()).collect();
                    Some(IndexDescriptor::new(name, columns).with_unique(is_unique))
                }
            })
            .collect()
    }
}
