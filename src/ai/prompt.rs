//! System prompts and SQL extraction.
//!
//! The expert is instructed to fence SQL in ```sql blocks; extraction takes
//! the first fenced block. The reviewer is instructed to lead with a
//! VERDICT line so its judgement can be parsed mechanically.

use regex::Regex;
use std::sync::OnceLock;

/// Default system prompt for the expert role.
pub const DEFAULT_EXPERT_PROMPT: &str = "\
You are a database expert. You help users understand their database structure and write SQL queries.
You have access to the database DDL which will be provided in the initialization.
When users ask for queries, you should:
1. Explain the approach you'll take
2. Write the SQL query if needed to fully answer the user's question
3. Explain any performance considerations
4. Point out any potential issues or edge cases
SQL code must be returned in a valid SQL format.
SQL code must be included in ```sql``` code block.
";

/// Default system prompt for the reviewer role.
pub const DEFAULT_REVIEWER_PROMPT: &str = "\
You are a SQL code reviewer. You will be given a user's question, the database DDL, and a
proposed SQL statement from another expert. Do not write a new answer from scratch: critique
and, only where necessary, refine the given statement. Review the following:
1. Query correctness
2. SQL best practices
3. Performance implications
4. Security considerations
5. Edge cases that might have been missed

Start your response with exactly one line in the form:
VERDICT: APPROVED | REVISED | REJECTED
- APPROVED: the statement is correct as given.
- REVISED: include your replacement statement in a ```sql``` code block.
- REJECTED: the statement must not be run; explain why.
Be concise but thorough in your review.
";

fn sql_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```sql\s*(.*?)\s*```").expect("valid regex"))
}

/// Extract the first fenced ```sql block from model output.
pub fn extract_sql(text: &str) -> Option<String> {
    sql_block_re()
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|sql| !sql.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_sql_present() {
        let text = "Here is the query:\n```sql\nSELECT * FROM orders\n```\nDone.";
        assert_eq!(extract_sql(text).as_deref(), Some("SELECT * FROM orders"));
    }

    #[test]
    fn test_extract_sql_takes_first_block() {
        let text = "```sql\nSELECT 1\n```\nor alternatively\n```sql\nSELECT 2\n```";
        assert_eq!(extract_sql(text).as_deref(), Some("SELECT 1"));
    }

    #[test]
    fn test_extract_sql_multiline() {
        let text = "```sql\nSELECT id,\n       total\nFROM orders\nWHERE total > 10\n```";
        let sql = extract_sql(text).unwrap();
        assert!(sql.starts_with("SELECT id,"));
        assert!(sql.ends_with("total > 10"));
    }

    #[test]
    fn test_extract_sql_absent() {
        assert_eq!(extract_sql("The answer is 42, no query needed."), None);
        assert_eq!(extract_sql("```\nnot sql fenced\n```"), None);
    }

    #[test]
    fn test_extract_sql_empty_block() {
        assert_eq!(extract_sql("```sql\n\n```"), None);
    }
}
