//! SQL text helpers
//!
//! Identifier and literal quoting for the statements built from user-chosen
//! names, and the zero-row probe statements used to recover column names.

/// Quote an identifier: `my"tbl` → `"my""tbl"`
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal: `O'Brien` → `'O''Brien'`
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `"schema"."table"`
pub fn qualified_name(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

/// Statement text with surrounding whitespace and trailing `;` removed.
pub fn trim_statement(sql: &str) -> &str {
    sql.trim().trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}

/// Probe wrapping the statement as a CTE. Works for joins and set
/// operations since the statement is left intact.
pub fn cte_probe(sql: &str) -> String {
    format!(
        "WITH pgbrowse_probe AS ({}) SELECT * FROM pgbrowse_probe LIMIT 0",
        trim_statement(sql)
    )
}

/// Probe appending `LIMIT 0` to the statement text.
pub fn limit_zero_probe(sql: &str) -> String {
    format!("{} LIMIT 0", trim_statement(sql))
}
