//! DDL text rendering.
//!
//! Renders a [`SchemaSnapshot`] into dialect-appropriate "CREATE TABLE"
//! style text for inclusion in AI prompts. This rendering is independent
//! of the live engine's own dump format; what matters here is dialect
//! quoting, a stable statement layout, and determinism - the same snapshot
//! always renders to byte-identical text so prompts stay cacheable.
//!
//! Statement layout per table: CREATE TABLE, then CREATE INDEX statements,
//! then foreign keys as ALTER TABLE ADD FOREIGN KEY.

use crate::models::{DatabaseType, SchemaSnapshot, TableDescriptor};

/// Render a full snapshot to DDL text.
pub fn render_snapshot(snapshot: &SchemaSnapshot) -> String {
    if snapshot.is_empty() {
        return String::new();
    }

    let db = snapshot.db_type;
    let mut parts: Vec<String> = Vec::new();

    match db {
        DatabaseType::MySQL => parts.push("SET FOREIGN_KEY_CHECKS=0;\n".to_string()),
        DatabaseType::MsSQL => parts.push("SET NOCOUNT ON;\n".to_string()),
        _ => {}
    }

    for table in &snapshot.tables {
        parts.push(render_table(db, table));
        parts.push("\n".to_string());

        let indexes = render_indexes(db, table);
        if !indexes.is_empty() {
            parts.extend(indexes);
            parts.push("\n".to_string());
        }

        let foreign_keys = render_foreign_keys(db, table);
        if !foreign_keys.is_empty() {
            parts.extend(foreign_keys);
            parts.push("\n".to_string());
        }
    }

    if db == DatabaseType::MySQL {
        parts.push("SET FOREIGN_KEY_CHECKS=1;\n".to_string());
    }

    parts.join("\n")
}

/// Quote an identifier using the dialect's quoting rules.
pub fn quote_ident(db: DatabaseType, ident: &str) -> String {
    match db {
        DatabaseType::MySQL => format!("`{}`", ident.replace('`', "``")),
        DatabaseType::MsSQL => format!("[{}]", ident.replace(']', "]]")),
        DatabaseType::PostgreSQL | DatabaseType::SQLite => {
            format!("\"{}\"", ident.replace('"', "\"\""))
        }
    }
}

fn quote_qualified(db: DatabaseType, table: &TableDescriptor) -> String {
    match &table.schema {
        Some(schema) => format!(
            "{}.{}",
            quote_ident(db, schema),
            quote_ident(db, &table.name)
        ),
        None => quote_ident(db, &table.name),
    }
}

fn render_table(db: DatabaseType, table: &TableDescriptor) -> String {
    let mut body: Vec<String> = Vec::with_capacity(table.columns.len() + 1);

    for col in &table.columns {
        let mut line = format!("    {} {}", quote_ident(db, &col.name), col.native_type);
        if !col.nullable {
            line.push_str(" NOT NULL");
        }
        if let Some(default) = &col.default_value {
            line.push_str(&format!(" DEFAULT {}", default));
        }
        body.push(line);
    }

    if !table.primary_key.is_empty() {
        let cols: Vec<String> = table
            .primary_key
            .iter()
            .map(|c| quote_ident(db, c))
            .collect();
        body.push(format!("    PRIMARY KEY ({})", cols.join(", ")));
    }

    format!(
        "CREATE TABLE {} (\n{}\n);",
        quote_qualified(db, table),
        body.join(",\n")
    )
}

fn render_indexes(db: DatabaseType, table: &TableDescriptor) -> Vec<String> {
    table
        .indexes
        .iter()
        .map(|idx| {
            let unique = if idx.is_unique { "UNIQUE " } else { "" };
            let cols: Vec<String> = idx.columns.iter().map(|c| quote_ident(db, c)).collect();
            let name = quote_ident(db, &idx.name);
            let target = quote_qualified(db, table);

            match db {
                DatabaseType::MySQL => {
                    let algorithm = idx.algorithm.as_deref().unwrap_or("BTREE");
                    format!(
                        "CREATE {}INDEX {} ON {} ({}) USING {};",
                        unique,
                        name,
                        target,
                        cols.join(", "),
                        algorithm
                    )
                }
                DatabaseType::MsSQL => format!(
                    "CREATE {}INDEX {} ON {} ({}) WITH (ONLINE = ON);",
                    unique,
                    name,
                    target,
                    cols.join(", ")
                ),
                DatabaseType::PostgreSQL => {
                    // Only spell out non-default access methods
                    let using = match idx.algorithm.as_deref() {
                        Some(algo) if !algo.eq_ignore_ascii_case("btree") => {
                            format!(" USING {}", algo)
                        }
                        _ => String::new(),
                    };
                    format!(
                        "CREATE {}INDEX {} ON {}{} ({});",
                        unique,
                        name,
                        target,
                        using,
                        cols.join(", ")
                    )
                }
                DatabaseType::SQLite => format!(
                    "CREATE {}INDEX {} ON {} ({});",
                    unique,
                    name,
                    target,
                    cols.join(", ")
                ),
            }
        })
        .collect()
}

fn render_foreign_keys(db: DatabaseType, table: &TableDescriptor) -> Vec<String> {
    table
        .foreign_keys
        .iter()
        .map(|fk| {
            format!(
                "ALTER TABLE {} ADD FOREIGN KEY ({}) REFERENCES {} ({});",
                quote_qualified(db, table),
                quote_ident(db, &fk.column),
                quote_ident(db, &fk.references_table),
                quote_ident(db, &fk.references_column)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnDescriptor, ColumnType, ForeignKeyRef, IndexDescriptor};

    fn orders_table() -> TableDescriptor {
        TableDescriptor::new("orders")
            .with_column(ColumnDescriptor::new(
                "id",
                "integer",
                ColumnType::Integer,
                false,
            ))
            .with_column(ColumnDescriptor::new(
                "total",
                "double precision",
                ColumnType::Float,
                true,
            ))
            .with_column(ColumnDescriptor::new(
                "customer_id",
                "integer",
                ColumnType::Integer,
                true,
            ))
            .with_primary_key(vec!["id".to_string()])
    }

    #[test]
    fn test_render_empty_snapshot() {
        let snapshot = SchemaSnapshot::empty(DatabaseType::MySQL);
        assert_eq!(render_snapshot(&snapshot), "");
    }

    #[test]
    fn test_render_is_deterministic() {
        let snapshot = SchemaSnapshot::new(DatabaseType::PostgreSQL, vec![orders_table()]);
        let first = render_snapshot(&snapshot);
        let second = render_snapshot(&snapshot);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_render_postgres_quoting() {
        let snapshot = SchemaSnapshot::new(
            DatabaseType::PostgreSQL,
            vec![orders_table().with_schema("public")],
        );
        let ddl = render_snapshot(&snapshot);
        assert!(ddl.contains("CREATE TABLE \"public\".\"orders\""));
        assert!(ddl.contains("\"id\" integer NOT NULL"));
        assert!(ddl.contains("PRIMARY KEY (\"id\")"));
    }

    #[test]
    fn test_render_mysql_quoting_and_preamble() {
        let snapshot = SchemaSnapshot::new(DatabaseType::MySQL, vec![orders_table()]);
        let ddl = render_snapshot(&snapshot);
        assert!(ddl.starts_with("SET FOREIGN_KEY_CHECKS=0;"));
        assert!(ddl.trim_end().ends_with("SET FOREIGN_KEY_CHECKS=1;"));
        assert!(ddl.contains("CREATE TABLE `orders`"));
    }

    #[test]
    fn test_render_mssql_quoting_and_preamble() {
        let snapshot = SchemaSnapshot::new(
            DatabaseType::MsSQL,
            vec![orders_table().with_schema("dbo")],
        );
        let ddl = render_snapshot(&snapshot);
        assert!(ddl.starts_with("SET NOCOUNT ON;"));
        assert!(ddl.contains("CREATE TABLE [dbo].[orders]"));
    }

    #[test]
    fn test_render_indexes_per_dialect() {
        let table = orders_table().with_schema("public");
        let mut table = table;
        table.indexes.push(
            IndexDescriptor::new("orders_customer_idx", vec!["customer_id".to_string()])
                .with_unique(false),
        );

        let pg = render_snapshot(&SchemaSnapshot::new(
            DatabaseType::PostgreSQL,
            vec![table.clone()],
        ));
        assert!(pg.contains(
            "CREATE INDEX \"orders_customer_idx\" ON \"public\".\"orders\" (\"customer_id\");"
        ));

        table.schema = None;
        let my = render_snapshot(&SchemaSnapshot::new(DatabaseType::MySQL, vec![table.clone()]));
        assert!(my.contains(
            "CREATE INDEX `orders_customer_idx` ON `orders` (`customer_id`) USING BTREE;"
        ));

        let ms = render_snapshot(&SchemaSnapshot::new(DatabaseType::MsSQL, vec![table]));
        assert!(ms.contains(
            "CREATE INDEX [orders_customer_idx] ON [orders] ([customer_id]) WITH (ONLINE = ON);"
        ));
    }

    #[test]
    fn test_render_foreign_keys() {
        let mut table = orders_table();
        table
            .foreign_keys
            .push(ForeignKeyRef::new("customer_id", "customers", "id"));

        let ddl = render_snapshot(&SchemaSnapshot::new(DatabaseType::SQLite, vec![table]));
        assert!(ddl.contains(
            "ALTER TABLE \"orders\" ADD FOREIGN KEY (\"customer_id\") REFERENCES \"customers\" (\"id\");"
        ));
    }

    #[test]
    fn test_render_default_value() {
        let table = TableDescriptor::new("settings").with_column(
            ColumnDescriptor::new("enabled", "boolean", ColumnType::Boolean, false)
                .with_default("true"),
        );
        let ddl = render_snapshot(&SchemaSnapshot::new(DatabaseType::PostgreSQL, vec![table]));
        assert!(ddl.contains("\"enabled\" boolean NOT NULL DEFAULT true"));
    }

    #[test]
    fn test_quote_ident_escapes() {
        assert_eq!(quote_ident(DatabaseType::MySQL, "we`ird"), "`we``ird`");
        assert_eq!(
            quote_ident(DatabaseType::PostgreSQL, "we\"ird"),
            "\"we\"\"ird\""
        );
        assert_eq!(quote_ident(DatabaseType::MsSQL, "we]ird"), "[we]]ird]");
    }
}
