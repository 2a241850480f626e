//! The table aggregate and index derivation.

use indexmap::IndexMap;
use thiserror::Error;

use crate::column::Column;
use crate::index::Index;
use crate::tag::{self, TagMap, bool_tag};

/// A foreign key constraint. Modeled but not emitted in this version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForeignKey {
    /// Constraint name.
    pub name: String,
    /// Column(s) in this table.
    pub columns: Vec<String>,
    /// Referenced table.
    pub referenced_table: String,
    /// Referenced column(s).
    pub referenced_columns: Vec<String>,
}

/// The aggregate schema unit: columns, indexes and constraints.
///
/// Column order is field declaration order. The dialect handle lives on the
/// engine-side table handle, not here; this type is pure data and is also
/// what catalog introspection produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<Column>,
    /// Secondary and unique indexes.
    pub indexes: Vec<Index>,
    /// Foreign key constraints (modeled only).
    pub foreign_keys: Vec<ForeignKey>,
    extra_options: IndexMap<String, String>,
}

impl Table {
    /// An empty table with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Table {
            name: name.into(),
            ..Table::default()
        }
    }

    /// Find a column by exact name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The primary key columns, in declaration order.
    pub fn primary_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.primary_key).collect()
    }

    /// A copy of the free-form extra options.
    ///
    /// Returns a clone so callers cannot alias the table's internal state.
    pub fn extra_options(&self) -> IndexMap<String, String> {
        self.extra_options.clone()
    }

    /// Replace the free-form extra options.
    pub fn set_extra_options(&mut self, options: IndexMap<String, String>) {
        self.extra_options = options;
    }

    /// Add an index over the given columns unless an identical one (same
    /// column set, any order) already exists. Returns whether it was added.
    pub fn add_index(&mut self, unique: bool, columns: &[&str]) -> bool {
        if self.indexes.iter().any(|idx| idx.is_identical(columns)) {
            return false;
        }
        let cols = columns.iter().map(|c| c.to_string()).collect();
        self.indexes.push(Index::new(&self.name, "", cols, unique));
        true
    }
}

/// A malformed `index` tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexTagError {
    #[error("column {column}: index priority {value:?} is not an integer")]
    BadPriority { column: String, value: String },
}

/// Derive the table's indexes from its columns' tag metadata.
///
/// Columns sharing an `index:<name>` tag form one composite index; within a
/// group, members are ordered by descending declared priority, ties broken by
/// field declaration order. A bare `index` tag creates a single-column index
/// with the deterministic default name. A truthy `unique` tag creates an
/// implicit unique index named `<column>_unique`.
pub fn collect_indexes(table_name: &str, columns: &[Column]) -> Result<Vec<Index>, IndexTagError> {
    let mut indexes: Vec<Index> = Vec::new();
    // name -> (column, priority, declaration order)
    let mut groups: IndexMap<String, Vec<(String, i64, usize)>> = IndexMap::new();

    for (decl_order, col) in columns.iter().enumerate() {
        if let Some(spec) = col.tags.get(tag::TAG_INDEX) {
            match parse_index_tag(spec) {
                IndexSpec::Flag(true) => {
                    push_unless_identical(
                        &mut indexes,
                        Index::new(table_name, "", vec![col.name.clone()], false),
                    );
                }
                IndexSpec::Flag(false) => {}
                IndexSpec::Named { name, priority } => {
                    let priority =
                        priority
                            .map(|raw| {
                                raw.parse::<i64>().map_err(|_| IndexTagError::BadPriority {
                                    column: col.name.clone(),
                                    value: raw,
                                })
                            })
                            .transpose()?
                            .unwrap_or(0);
                    groups
                        .entry(name)
                        .or_default()
                        .push((col.name.clone(), priority, decl_order));
                }
            }
        }
        if bool_tag(&col.tags, tag::TAG_UNIQUE) == Some(true) {
            push_unless_identical(
                &mut indexes,
                Index::new(
                    table_name,
                    converge_sql::unique_index_name(&col.name),
                    vec![col.name.clone()],
                    true,
                ),
            );
        }
    }

    for (name, mut members) in groups {
        // Higher priority first; declaration order for ties.
        members.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        let cols = members.into_iter().map(|(col, _, _)| col).collect();
        push_unless_identical(&mut indexes, Index::new(table_name, name, cols, false));
    }

    Ok(indexes)
}

fn push_unless_identical(indexes: &mut Vec<Index>, index: Index) {
    if !indexes.iter().any(|existing| existing.same_columns(&index)) {
        indexes.push(index);
    }
}

enum IndexSpec {
    /// Bare boolean form: `index`, `index:true`, `index:0`, ...
    Flag(bool),
    /// Named form: `index:<name>[,priority:<N>]`.
    Named { name: String, priority: Option<String> },
}

fn parse_index_tag(spec: &str) -> IndexSpec {
    match spec {
        "" | "true" | "1" => return IndexSpec::Flag(true),
        "false" | "0" => return IndexSpec::Flag(false),
        _ => {}
    }
    let mut name = String::new();
    let mut priority = None;
    for part in spec.split(',') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("priority:") {
            priority = Some(value.trim().to_string());
        } else if !part.is_empty() {
            name = part.to_string();
        }
    }
    IndexSpec::Named { name, priority }
}

/// Look up a tag map's `name` override, if any.
pub fn column_name_override(tags: &TagMap) -> Option<&str> {
    tags.get(tag::TAG_NAME).map(String::as_str).filter(|v| !v.is_empty())
}
