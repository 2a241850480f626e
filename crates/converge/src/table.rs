//! The table handle: a model bound to a dialect.

use std::fmt;
use std::sync::Arc;

use converge_schema::{ModelDef, SqlValue, Table, collect_indexes, parse_tag, tag};
use tracing::debug;

use crate::dialect::Dialect;
use crate::error::{Error, FieldIssue};
use crate::executor::Connection;
use crate::registry::DialectRegistry;
use crate::sync::{self, SyncReport};

/// A desired table bound to the dialect that will realize it.
///
/// Built once from a [`ModelDef`]; construction validates every field's tag
/// metadata up front and reports all problems in one error, so nothing
/// reaches the database half-checked.
pub struct TableHandle {
    table: Table,
    dialect: Arc<dyn Dialect>,
}

impl fmt::Debug for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableHandle")
            .field("table", &self.table)
            .field("dialect", &self.dialect.id())
            .finish()
    }
}

impl TableHandle {
    /// Build a handle from a model description.
    pub fn from_model(
        name: &str,
        model: &ModelDef,
        dialect: Arc<dyn Dialect>,
    ) -> Result<Self, Error> {
        let mut issues = Vec::new();
        let mut parsed = Vec::new();
        for field in &model.fields {
            match parse_tag(&field.tag) {
                Ok(tags) => parsed.push((field, tags)),
                Err(error) => issues.push(FieldIssue::tag(&field.name, error)),
            }
        }
        if !issues.is_empty() {
            return Err(Error::Validation(issues));
        }

        let mut table = Table::new(name);
        let mut ordinal = 0;
        for (field, tags) in parsed {
            if tags.contains_key(tag::TAG_IGNORE) {
                continue;
            }
            let mut column =
                dialect.map_field_kind(&field.name, field.kind, &tags, field.optional)?;
            if table.column(&column.name).is_some() {
                issues.push(FieldIssue::new(
                    &field.name,
                    format!("duplicate column name {:?}", column.name),
                ));
                continue;
            }
            column.ordinal = ordinal;
            ordinal += 1;
            table.columns.push(column);
        }
        if !issues.is_empty() {
            return Err(Error::Validation(issues));
        }

        table.indexes = collect_indexes(&table.name, &table.columns)?;
        Ok(TableHandle { table, dialect })
    }

    /// Build a handle, resolving the dialect by name from a registry.
    pub fn from_registry(
        name: &str,
        model: &ModelDef,
        registry: &DialectRegistry,
        dialect_name: &str,
    ) -> Result<Self, Error> {
        let dialect = registry
            .get(dialect_name)
            .ok_or_else(|| Error::UnknownDialect(dialect_name.to_string()))?;
        TableHandle::from_model(name, model, dialect)
    }

    /// The desired table shape.
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Add a composite index over the given columns, unless one over the
    /// same column set already exists. Returns whether it was added.
    pub fn add_index(&mut self, unique: bool, columns: &[&str]) -> bool {
        self.table.add_index(unique, columns)
    }

    /// Reconcile the live schema with this table: introspect, diff, execute.
    pub fn sync(&self, conn: &mut dyn Connection) -> Result<SyncReport, Error> {
        sync::sync_table(conn, self.dialect.as_ref(), &self.table)
    }

    /// Render the reconciliation statements against a known live shape,
    /// without executing anything.
    pub fn sync_sql(&self, live: Option<&Table>) -> Vec<String> {
        sync::plan_sql(&self.table, live, self.dialect.as_ref())
    }

    /// Rename the table. The handle keeps describing the old name; rebuild
    /// it for further work against the renamed table.
    pub fn rename_table(&self, conn: &mut dyn Connection, new_name: &str) -> Result<(), Error> {
        if !self.dialect.can_rename_table() {
            return Err(self.refused("rename_table"));
        }
        let statement = self.dialect.rename_table_sql(&self.table, new_name);
        debug!(sql = %statement, "rename table");
        conn.execute(&statement, &[])
            .map_err(|e| Error::execution(&statement, e))?;
        Ok(())
    }

    /// Drop the table if it exists.
    pub fn drop_table(&self, conn: &mut dyn Connection) -> Result<(), Error> {
        let statement = self.dialect.drop_table_sql(&self.table);
        debug!(sql = %statement, "drop table");
        conn.execute(&statement, &[])
            .map_err(|e| Error::execution(&statement, e))?;
        Ok(())
    }

    /// Insert one row. Returns the affected row count.
    ///
    /// Zero values are treated as unset and skipped (letting column defaults
    /// apply) unless the column declares `allow_zero` or is part of the
    /// primary key.
    pub fn insert(&self, conn: &mut dyn Connection, row: &[(&str, SqlValue)]) -> Result<u64, Error> {
        if !self.dialect.can_insert() {
            return Err(self.refused("insert"));
        }
        let (columns, params) = self.bind_row(row)?;
        let statement = self.dialect.insert_sql(&self.table, &columns);
        debug!(sql = %statement, "insert");
        conn.execute(&statement, &params)
            .map(|n| self.affected(n))
            .map_err(|e| Error::execution(&statement, e))
    }

    /// Update the row identified by `key` (one value per primary key column,
    /// in declaration order). Returns the affected row count.
    pub fn update(
        &self,
        conn: &mut dyn Connection,
        assignments: &[(&str, SqlValue)],
        key: &[SqlValue],
    ) -> Result<u64, Error> {
        if !self.dialect.can_update() {
            return Err(self.refused("update"));
        }
        let keys = self.table.primary_columns();
        if keys.is_empty() {
            return Err(Error::NoPrimaryKey(self.table.name.clone()));
        }
        if key.len() != keys.len() {
            return Err(Error::Validation(vec![FieldIssue::new(
                &self.table.name,
                format!("expected {} key values, got {}", keys.len(), key.len()),
            )]));
        }
        let mut columns = Vec::new();
        let mut params = Vec::new();
        let mut issues = Vec::new();
        for (name, value) in assignments {
            match self.table.column(name) {
                None => issues.push(FieldIssue::new(*name, "no such column")),
                Some(column) => {
                    columns.push(column);
                    params.push(column.to_sql_value(value.clone()));
                }
            }
        }
        if !issues.is_empty() {
            return Err(Error::Validation(issues));
        }
        params.extend(key.iter().cloned());
        let statement = self.dialect.update_sql(&self.table, &columns, &keys);
        debug!(sql = %statement, "update");
        conn.execute(&statement, &params)
            .map(|n| self.affected(n))
            .map_err(|e| Error::execution(&statement, e))
    }

    /// Insert one row, updating it in place if its key already exists.
    pub fn insert_or_update(
        &self,
        conn: &mut dyn Connection,
        row: &[(&str, SqlValue)],
    ) -> Result<u64, Error> {
        if !self.dialect.can_insert_or_update() {
            return Err(self.refused("insert_or_update"));
        }
        let keys = self.table.primary_columns();
        if keys.is_empty() {
            return Err(Error::NoPrimaryKey(self.table.name.clone()));
        }
        let (columns, params) = self.bind_row(row)?;
        let statement = self.dialect.upsert_sql(&self.table, &columns, &keys);
        debug!(sql = %statement, "insert or update");
        conn.execute(&statement, &params)
            .map(|n| self.affected(n))
            .map_err(|e| Error::execution(&statement, e))
    }

    fn bind_row<'a>(
        &'a self,
        row: &[(&str, SqlValue)],
    ) -> Result<(Vec<&'a converge_schema::Column>, Vec<SqlValue>), Error> {
        let mut columns = Vec::new();
        let mut params = Vec::new();
        let mut issues = Vec::new();
        for (name, value) in row {
            let Some(column) = self.table.column(name) else {
                issues.push(FieldIssue::new(*name, "no such column"));
                continue;
            };
            if column.is_zero(value) && !column.allow_zero && !column.primary_key {
                continue;
            }
            columns.push(column);
            params.push(column.to_sql_value(value.clone()));
        }
        if !issues.is_empty() {
            return Err(Error::Validation(issues));
        }
        Ok((columns, params))
    }

    fn affected(&self, count: u64) -> u64 {
        if self.dialect.can_return_rows_affected() {
            count
        } else {
            0
        }
    }

    fn refused(&self, operation: &'static str) -> Error {
        Error::Capability {
            operation,
            dialect: self.dialect.id(),
        }
    }
}
