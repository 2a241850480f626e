//! The index model.

use converge_sql::default_index_name;

/// A secondary or unique index.
///
/// Member columns are kept in two orders: `columns` preserves the declared
/// composite order (descending priority) for DDL emission, while identity
/// comparison uses a lexicographically sorted view so that two indexes over
/// the same column set compare identical regardless of order.
///
/// The owning table is referenced by name, not by a live handle.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    name: String,
    table: String,
    columns: Vec<String>,
    sorted_columns: Vec<String>,
    unique: bool,
}

impl Index {
    /// Create an index over the given columns, in DDL emission order.
    ///
    /// An empty `name` means the deterministic default name is used. The
    /// column sequence must be non-empty.
    pub fn new(
        table: impl Into<String>,
        name: impl Into<String>,
        columns: Vec<String>,
        unique: bool,
    ) -> Self {
        assert!(!columns.is_empty(), "an index needs at least one column");
        let mut sorted_columns = columns.clone();
        sorted_columns.sort();
        Index {
            name: name.into(),
            table: table.into(),
            columns,
            sorted_columns,
            unique,
        }
    }

    /// The index name.
    ///
    /// Falls back to `idx_<table>_<firstcolumn>`, truncated to 64 characters,
    /// when no explicit name was declared.
    pub fn name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        default_index_name(&self.table, &self.columns[0])
    }

    /// The owning table's name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Member columns in DDL emission order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether this is a unique index.
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Whether this index covers exactly the given column set, ignoring
    /// order. Used to suppress duplicate index creation.
    pub fn is_identical(&self, columns: &[impl AsRef<str>]) -> bool {
        if self.sorted_columns.len() != columns.len() {
            return false;
        }
        let mut other: Vec<&str> = columns.iter().map(|c| c.as_ref()).collect();
        other.sort();
        self.sorted_columns.iter().map(String::as_str).eq(other)
    }

    /// Whether this index covers the same column set as another index.
    pub fn same_columns(&self, other: &Index) -> bool {
        self.sorted_columns == other.sorted_columns
    }
}
