//! SQL text helpers shared by the converge dialects.
//!
//! Identifier quoting, string literals, and the deterministic index-naming
//! convention. Nothing in here executes SQL; these are pure string builders
//! consumed by the dialect drivers.

use std::fmt;

/// How a dialect quotes identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    /// ANSI double quotes (`"name"`), used by Postgres.
    DoubleQuote,
    /// Backticks (`` `name` ``), used by MariaDB/MySQL.
    Backtick,
}

impl QuoteStyle {
    fn quote_char(self) -> char {
        match self {
            QuoteStyle::DoubleQuote => '"',
            QuoteStyle::Backtick => '`',
        }
    }
}

/// A SQL string literal wrapper.
///
/// Display writes the value escaped and quoted with single quotes.
///
/// # Example
/// ```
/// use converge_sql::Lit;
/// assert_eq!(format!("{}", Lit("foo")), "'foo'");
/// assert_eq!(format!("{}", Lit("it's")), "'it''s'");
/// ```
pub struct Lit<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> fmt::Display for Lit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'")?;
        for c in self.0.as_ref().chars() {
            if c == '\'' {
                write!(f, "''")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "'")
    }
}

/// A SQL identifier wrapper with a dialect quote style.
///
/// Display writes the value quoted, doubling any embedded quote characters.
///
/// # Example
/// ```
/// use converge_sql::{Ident, QuoteStyle};
/// assert_eq!(format!("{}", Ident("user", QuoteStyle::DoubleQuote)), "\"user\"");
/// assert_eq!(format!("{}", Ident("user", QuoteStyle::Backtick)), "`user`");
/// ```
pub struct Ident<T: AsRef<str>>(pub T, pub QuoteStyle);

impl<T: AsRef<str>> fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let q = self.1.quote_char();
        write!(f, "{}", q)?;
        for c in self.0.as_ref().chars() {
            if c == q {
                write!(f, "{}{}", q, q)?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "{}", q)
    }
}

/// Quote an identifier for the given dialect style.
///
/// Always quotes, so reserved words like `user`, `order` or `group` are safe
/// as table and column names.
pub fn quote_ident(name: &str, style: QuoteStyle) -> String {
    format!("{}", Ident(name, style))
}

/// Escape a string literal for SQL.
pub fn escape_string(s: &str) -> String {
    format!("{}", Lit(s))
}

/// Maximum length of a generated index name.
///
/// MariaDB caps identifiers at 64 characters and Postgres at 63; generated
/// names are truncated to the common 64-character limit.
pub const INDEX_NAME_LIMIT: usize = 64;

/// Generate the default name for an index on a table.
///
/// Uses the convention `idx_{table}_{firstcolumn}`, truncated to
/// [`INDEX_NAME_LIMIT`] characters.
///
/// # Examples
///
/// ```
/// assert_eq!(converge_sql::default_index_name("user", "email"), "idx_user_email");
/// ```
pub fn default_index_name(table: &str, first_column: &str) -> String {
    truncate_ident(&format!("idx_{}_{}", table, first_column))
}

/// Generate the name for the implicit unique index of a single column.
///
/// ```
/// assert_eq!(converge_sql::unique_index_name("email"), "email_unique");
/// ```
pub fn unique_index_name(column: &str) -> String {
    truncate_ident(&format!("{}_unique", column))
}

/// Truncate a generated identifier to [`INDEX_NAME_LIMIT`] characters,
/// respecting UTF-8 boundaries.
pub fn truncate_ident(name: &str) -> String {
    if name.len() <= INDEX_NAME_LIMIT {
        return name.to_string();
    }
    let mut len = INDEX_NAME_LIMIT;
    while len > 0 && !name.is_char_boundary(len) {
        len -= 1;
    }
    name[..len].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_doubles_embedded_quote_chars() {
        assert_eq!(quote_ident("a\"b", QuoteStyle::DoubleQuote), "\"a\"\"b\"");
        assert_eq!(quote_ident("a`b", QuoteStyle::Backtick), "`a``b`");
    }

    #[test]
    fn default_index_name_truncates_to_limit() {
        let table = "t".repeat(80);
        let name = default_index_name(&table, "col");
        assert_eq!(name.len(), INDEX_NAME_LIMIT);
        assert!(name.starts_with("idx_ttt"));
    }

    #[test]
    fn short_names_pass_through() {
        assert_eq!(truncate_ident("idx_user_email"), "idx_user_email");
    }

    #[test]
    fn truncation_is_exact_at_boundary() {
        let name = "x".repeat(INDEX_NAME_LIMIT);
        assert_eq!(truncate_ident(&name), name);
        let long = "x".repeat(INDEX_NAME_LIMIT + 1);
        assert_eq!(truncate_ident(&long).len(), INDEX_NAME_LIMIT);
    }
}
