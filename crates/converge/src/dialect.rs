//! The dialect seam.
//!
//! Everything engine-visible that differs between database engines goes
//! through the [`Dialect`] trait: type mapping, DDL/DML rendering, catalog
//! introspection and the capability gates. Dialects are plain objects handed
//! to the engine (or looked up in a [`DialectRegistry`]); there is no
//! process-global dialect state.
//!
//! [`DialectRegistry`]: crate::registry::DialectRegistry

use std::fmt;

use converge_schema::{Column, FieldKind, Index, Table, TagMap, bool_tag, tag};
use converge_sql::{Ident, QuoteStyle, escape_string};

use crate::error::Error;
use crate::executor::Connection;

pub mod mariadb;
pub mod postgres;

pub use mariadb::MariaDbDialect;
pub use postgres::PostgresDialect;

/// Identifies a built-in dialect, for registry keys and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectId {
    Postgres,
    MariaDb,
}

impl DialectId {
    /// The canonical registry name.
    pub fn as_str(self) -> &'static str {
        match self {
            DialectId::Postgres => "postgres",
            DialectId::MariaDb => "mariadb",
        }
    }
}

impl fmt::Display for DialectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A database dialect: type mapping, SQL rendering and introspection.
///
/// Default methods describe the common capability set; dialects opt out of
/// operations they cannot perform, and the engine turns a refused gate into
/// [`Error::Capability`] before rendering any SQL.
pub trait Dialect: Send + Sync {
    fn id(&self) -> DialectId;

    /// Identifier quoting style.
    fn quote_style(&self) -> QuoteStyle;

    /// The positional parameter placeholder, 1-based.
    fn placeholder(&self, position: usize) -> String;

    /// Whether the engine folds identifier case when matching live schema
    /// objects against desired ones.
    fn case_insensitive_identifiers(&self) -> bool {
        false
    }

    /// Map a model field to a column, applying its tag metadata.
    ///
    /// Fails with [`Error::UnsupportedType`] when the dialect has no SQL type
    /// for the kind.
    fn map_field_kind(
        &self,
        name: &str,
        kind: FieldKind,
        tags: &TagMap,
        optional: bool,
    ) -> Result<Column, Error>;

    /// Reduce a SQL type to its canonical spelling, so a declared type and
    /// the catalog's report of the same type compare equal.
    fn normalize_type(&self, sql_type: &str) -> String;

    fn create_table_sql(&self, table: &Table) -> String;
    fn add_column_sql(&self, table: &Table, column: &Column) -> String;
    fn alter_column_sql(&self, table: &Table, column: &Column) -> String;
    fn create_index_sql(&self, index: &Index) -> String;
    fn drop_index_sql(&self, index: &Index) -> String;

    fn drop_table_sql(&self, table: &Table) -> String {
        format!("DROP TABLE IF EXISTS {};", Ident(&table.name, self.quote_style()))
    }

    fn rename_table_sql(&self, table: &Table, new_name: &str) -> String {
        let style = self.quote_style();
        format!(
            "ALTER TABLE {} RENAME TO {};",
            Ident(&table.name, style),
            Ident(new_name, style)
        )
    }

    fn insert_sql(&self, table: &Table, columns: &[&Column]) -> String {
        let style = self.quote_style();
        let names = columns
            .iter()
            .map(|column| Ident(&column.name, style).to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let values = (1..=columns.len())
            .map(|position| self.placeholder(position))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({});",
            Ident(&table.name, style),
            names,
            values
        )
    }

    fn update_sql(&self, table: &Table, assignments: &[&Column], keys: &[&Column]) -> String {
        let style = self.quote_style();
        let mut position = 0;
        let set = assignments
            .iter()
            .map(|column| {
                position += 1;
                format!("{} = {}", Ident(&column.name, style), self.placeholder(position))
            })
            .collect::<Vec<_>>()
            .join(", ");
        let filter = keys
            .iter()
            .map(|column| {
                position += 1;
                format!("{} = {}", Ident(&column.name, style), self.placeholder(position))
            })
            .collect::<Vec<_>>()
            .join(" AND ");
        format!(
            "UPDATE {} SET {} WHERE {};",
            Ident(&table.name, style),
            set,
            filter
        )
    }

    /// Insert-or-update in one statement. Dialect syntax differs too much for
    /// a shared rendering.
    fn upsert_sql(&self, table: &Table, columns: &[&Column], keys: &[&Column]) -> String;

    /// Read the live shape of a table from the catalog.
    ///
    /// Returns `Ok(None)` when the table does not exist; only genuine query
    /// failures are errors.
    fn introspect(&self, conn: &mut dyn Connection, table_name: &str)
    -> Result<Option<Table>, Error>;

    fn can_insert(&self) -> bool {
        true
    }
    fn can_update(&self) -> bool {
        true
    }
    fn can_insert_or_update(&self) -> bool {
        true
    }
    fn can_create_index(&self) -> bool {
        true
    }
    fn can_alter_column(&self) -> bool {
        true
    }
    fn can_rename_table(&self) -> bool {
        true
    }
    /// Whether the driver's affected-row counts are meaningful. When false,
    /// DML entry points report 0.
    fn can_return_rows_affected(&self) -> bool {
        true
    }
    /// Foreign keys are modeled but not emitted in this version; the flag is
    /// part of the contract for dialects that cannot enforce them at all.
    fn supports_foreign_keys(&self) -> bool {
        true
    }
}

/// Build a column from a field's name, mapped SQL type and tag metadata.
///
/// This is the dialect-independent half of `map_field_kind`: name override,
/// nullability (optional fields are nullable unless a `nullable` tag says
/// otherwise; primary keys never are), constraint flags and the
/// auto-increment offset. The caller has already chosen `sql_type`.
pub(crate) fn column_from_tags(
    name: &str,
    kind: FieldKind,
    sql_type: String,
    tags: &TagMap,
    optional: bool,
) -> Column {
    let mut column = Column::introspected(
        converge_schema::column_name_override(tags).unwrap_or(name),
        sql_type,
    );
    column.kind = Some(kind);
    column.from_pointer = optional;
    column.primary_key = bool_tag(tags, tag::TAG_PRIMARY).unwrap_or(false);
    column.nullable = !column.primary_key && bool_tag(tags, tag::TAG_NULLABLE).unwrap_or(optional);
    column.unique = bool_tag(tags, tag::TAG_UNIQUE).unwrap_or(false);
    column.indexed = tags.contains_key(tag::TAG_INDEX);
    column.allow_zero = bool_tag(tags, tag::TAG_ALLOW_ZERO).unwrap_or(false);
    column.default = tags.get(tag::TAG_DEFAULT).cloned().filter(|d| !d.is_empty());
    column.width = tags
        .get(tag::TAG_WIDTH)
        .and_then(|w| w.parse().ok())
        .unwrap_or(0);
    match tags.get(tag::TAG_AUTO_INCREMENT).map(String::as_str) {
        None | Some("false") | Some("0") => {}
        Some(value) => {
            column.auto_increment = true;
            column.auto_increment_offset = value.parse().unwrap_or(0).max(0);
        }
    }
    column.tags = tags.clone();
    column
}

/// Declared width for a field, from its `width` tag.
pub(crate) fn declared_width(tags: &TagMap) -> u32 {
    tags.get(tag::TAG_WIDTH)
        .and_then(|w| w.parse().ok())
        .unwrap_or(0)
}

/// Render one column definition clause for CREATE TABLE / ADD COLUMN.
///
/// `auto_increment_keyword` is the per-column clause for auto-increment
/// columns, for dialects that express it as a column attribute rather than a
/// type (MariaDB's `AUTO_INCREMENT`).
pub(crate) fn column_clause(
    column: &Column,
    style: QuoteStyle,
    auto_increment_keyword: Option<&str>,
) -> String {
    let mut clause = format!("{} {}", Ident(&column.name, style), column.sql_type);
    if !column.nullable {
        clause.push_str(" NOT NULL");
    }
    if let Some(default) = render_default(column) {
        clause.push_str(" DEFAULT ");
        clause.push_str(&default);
    }
    if column.auto_increment
        && let Some(keyword) = auto_increment_keyword
    {
        clause.push(' ');
        clause.push_str(keyword);
    }
    if let Some(extra) = column.tags.get(tag::TAG_EXTRA)
        && !extra.is_empty()
    {
        clause.push(' ');
        clause.push_str(extra);
    }
    clause
}

/// Render a column's default value expression.
///
/// Numeric defaults, NULL and call-like expressions (`now()`,
/// `CURRENT_TIMESTAMP`) pass through raw; everything else becomes a quoted
/// string literal.
pub(crate) fn render_default(column: &Column) -> Option<String> {
    let default = column.default.as_deref()?;
    let raw = column.is_numeric()
        || default.ends_with(')')
        || default.eq_ignore_ascii_case("current_timestamp")
        || default.eq_ignore_ascii_case("null")
        || default.eq_ignore_ascii_case("true")
        || default.eq_ignore_ascii_case("false");
    if raw {
        Some(default.to_string())
    } else {
        Some(escape_string(default))
    }
}

/// Render a CREATE TABLE statement, column clauses plus a trailing
/// PRIMARY KEY constraint listing every key column.
pub(crate) fn render_create_table(
    table: &Table,
    style: QuoteStyle,
    auto_increment_keyword: Option<&str>,
    suffix: &str,
) -> String {
    let mut parts: Vec<String> = table
        .columns
        .iter()
        .map(|column| column_clause(column, style, auto_increment_keyword))
        .collect();
    let primary = table.primary_columns();
    if !primary.is_empty() {
        let keys = primary
            .iter()
            .map(|column| Ident(&column.name, style).to_string())
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("PRIMARY KEY ({})", keys));
    }
    format!(
        "CREATE TABLE {} ({}){};",
        Ident(&table.name, style),
        parts.join(", "),
        suffix
    )
}

/// Render a CREATE INDEX statement.
pub(crate) fn render_create_index(index: &Index, style: QuoteStyle, if_not_exists: bool) -> String {
    let unique = if index.is_unique() { "UNIQUE " } else { "" };
    let guard = if if_not_exists { "IF NOT EXISTS " } else { "" };
    let columns = index
        .columns()
        .iter()
        .map(|column| Ident(column, style).to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE {}INDEX {}{} ON {} ({});",
        unique,
        guard,
        Ident(index.name(), style),
        Ident(index.table(), style),
        columns
    )
}
