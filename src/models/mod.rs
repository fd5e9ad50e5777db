//! Data models for sql-expert.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use connection::{
    ConnectionConfig, ConnectionConfigError, ConnectionInfo, DatabaseType,
};
pub use query::{
    DEFAULT_QUERY_TIMEOUT_SECS, DEFAULT_ROW_LIMIT, MAX_QUERY_TIMEOUT_SECS, MAX_ROW_LIMIT,
    QueryParam, QueryRequest, QueryResult,
};
pub use schema::{
    ColumnDescriptor, ColumnType, ForeignKeyRef, IndexDescriptor, SchemaSnapshot, TableDescriptor,
};
