//! SQL dump script parsing.
//!
//! Schema dumps are plain SQL files with a mix of statements and comments.
//! [`parse_sql_script`] splits them into executable statements, discarding
//! `/** ... */` comment blocks, `--`/`#`/`//` line comments and inline
//! `/* ... */` comments.

use std::sync::LazyLock;

use regex::Regex;

static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(--|#|//).*").expect("valid regex"));
static INLINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\*[^*]*\*/").expect("valid regex"));
static CREATE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^CREATE\s+TABLE\s+(`[^`]+`|[^\s(]+)").expect("valid regex")
});

/// Split an SQL script into its statements.
///
/// Statements may span several lines and are terminated by `;`. Lines inside
/// a `/** ... */` block are dropped entirely.
pub fn parse_sql_script(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut in_comment_block = false;

    for raw_line in script.lines() {
        let line = raw_line.trim();
        if line.starts_with("/**") {
            in_comment_block = true;
            continue;
        }
        if in_comment_block {
            if line.ends_with("*/") {
                in_comment_block = false;
            }
            continue;
        }
        let line = LINE_COMMENT.replace(line, "");
        let line = INLINE_COMMENT.replace_all(&line, "");
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        current.push(line.to_string());
        if line.ends_with(';') {
            statements.push(current.join(" "));
            current.clear();
        }
    }
    statements
}

/// Table name of a `CREATE TABLE` statement, `None` for any other statement.
pub fn create_table_name(statement: &str) -> Option<String> {
    CREATE_TABLE
        .captures(statement)
        .map(|captures| captures[1].trim_matches('`').to_string())
}
