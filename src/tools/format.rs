//! Output formatting for query results.
//!
//! Renders a [`QueryResult`] as an ASCII table (like the MySQL CLI) with
//! widths computed from display width, so wide characters line up.

use crate::models::QueryResult;
use serde_json::Value as JsonValue;
use unicode_width::UnicodeWidthStr;

pub fn format_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(arr) => serde_json::to_string(arr).unwrap_or_default(),
        JsonValue::Object(obj) => serde_json::to_string(obj).unwrap_or_default(),
    }
}

/// Render a query result as an ASCII table with a summary footer.
pub fn format_as_table(result: &QueryResult) -> String {
    if let Some(rows_affected) = result.rows_affected {
        return format!(
            "Query OK, {} row{} affected ({} ms)",
            rows_affected,
            if rows_affected == 1 { "" } else { "s" },
            result.execution_time_ms
        );
    }

    if result.columns.is_empty() {
        return format!("Empty set ({} ms)", result.execution_time_ms);
    }

    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.width()).collect();
    let rendered_rows: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(format_value).collect())
        .collect();
    for row in &rendered_rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.width());
            }
        }
    }

    let separator: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+\n";

    let mut output = String::new();
    output.push_str(&separator);

    let header: String = result
        .columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| format!("| {:^width$} ", col, width = w))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);
    output.push_str(&separator);

    for row in &rendered_rows {
        let line: String = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| {
                // Pad by display width, not char count
                let pad = w.saturating_sub(cell.width());
                format!("| {}{} ", cell, " ".repeat(pad))
            })
            .collect::<String>()
            + "|\n";
        output.push_str(&line);
    }
    output.push_str(&separator);

    output.push_str(&format!(
        "{} row{} in set ({} ms)",
        result.row_count,
        if result.row_count == 1 { "" } else { "s" },
        result.execution_time_ms
    ));
    if result.truncated {
        output.push_str("\n(result truncated by row limit)");
    }
    output
}
