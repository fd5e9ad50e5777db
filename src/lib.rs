//! sql-expert library.
//!
//! Chat with a live database: the schema is introspected into normalized
//! DDL context, an expert model proposes SQL, a reviewer model vets it,
//! and vetted statements run through a safe, uniform execution path
//! across PostgreSQL, MySQL, MSSQL and SQLite.

pub mod ai;
pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod tools;

pub use chat::{ChatSession, FinalizedTurn, Orchestrator};
pub use config::Config;
pub use db::ConnectionManager;
pub use error::DbError;
