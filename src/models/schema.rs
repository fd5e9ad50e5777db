//! Schema-related data models.
//!
//! Types describing an introspected database schema. A [`SchemaSnapshot`]
//! is produced once per connection, cached, and only replaced on an
//! explicit refresh so the DDL text fed to the AI models stays stable
//! within a conversation.

use crate::models::DatabaseType;
use serde::{Deserialize, Serialize};

/// Normalized column type tag, independent of the engine's native type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Boolean,
    DateTime,
    Binary,
    /// Native type with no mapping; never fails introspection
    Other,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Text => write!(f, "text"),
            Self::Boolean => write!(f, "boolean"),
            Self::DateTime => write!(f, "datetime"),
            Self::Binary => write!(f, "binary"),
            Self::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Full native type (e.g., `varchar(30)`, `bigint unsigned`)
    pub native_type: String,
    /// Normalized type tag derived from the native type
    pub column_type: ColumnType,
    pub nullable: bool,
    /// Raw default expression as reported by the catalog, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl ColumnDescriptor {
    /// Create a new column descriptor.
    pub fn new(
        name: impl Into<String>,
        native_type: impl Into<String>,
        column_type: ColumnType,
        nullable: bool,
    ) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
            column_type,
            nullable,
            default_value: None,
        }
    }

    /// Set the default value expression.
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// Whether the column declares a default value.
    pub fn has_default(&self) -> bool {
        self.default_value.is_some()
    }
}

/// A foreign key relation from one column to a referenced table/column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub column: String,
    pub references_table: String,
    pub references_column: String,
}

impl ForeignKeyRef {
    pub fn new(
        column: impl Into<String>,
        references_table: impl Into<String>,
        references_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            references_table: references_table.into(),
            references_column: references_column.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
    /// BTREE, HASH, etc. where the engine reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
}

impl IndexDescriptor {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            is_unique: false,
            algorithm: None,
        }
    }

    pub fn with_unique(mut self, is_unique: bool) -> Self {
        self.is_unique = is_unique;
        self
    }

    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Columns in ordinal position order
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKeyRef>,
    pub indexes: Vec<IndexDescriptor>,
}

impl TableDescriptor {
    /// Create a new, empty table descriptor.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Set the schema name.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Add a column definition.
    pub fn with_column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    /// Set the primary key columns.
    pub fn with_primary_key(mut self, columns: Vec<String>) -> Self {
        self.primary_key = columns;
        self
    }

    /// Get the fully qualified table name.
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }

    /// Ordering key: schema then name, case-normalized.
    fn sort_key(&self) -> (String, String) {
        (
            self.schema.as_deref().unwrap_or("").to_lowercase(),
            self.name.to_lowercase(),
        )
    }
}

/// An ordered, normalized description of a database schema at a point in time.
///
/// Tables are kept sorted by (schema, name) case-normalized so repeated
/// introspection of an unchanged schema renders byte-identical DDL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub db_type: DatabaseType,
    pub tables: Vec<TableDescriptor>,
}

impl SchemaSnapshot {
    /// Create a snapshot from unordered tables, establishing the canonical order.
    pub fn new(db_type: DatabaseType, mut tables: Vec<TableDescriptor>) -> Self {
        tables.sort_by_key(|t| t.sort_key());
        Self { db_type, tables }
    }

    /// Create an empty snapshot.
    pub fn empty(db_type: DatabaseType) -> Self {
        Self {
            db_type,
            tables: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Look up a table by name (case-insensitive, ignoring schema).
    pub fn find_table(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }
}
