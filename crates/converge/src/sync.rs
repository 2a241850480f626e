//! The reconciliation engine.
//!
//! Diffs a desired table against the live schema and emits the DDL that
//! converges the database toward the model. The diff is strictly additive:
//! live columns and indexes with no desired counterpart are left untouched,
//! so reconciliation never destroys data. The only destructive statement is
//! the DROP half of an index recreation, and that index is rebuilt in the
//! same plan.

use converge_schema::{Column, Index, Table};
use tracing::{debug, info};

use crate::dialect::Dialect;
use crate::error::Error;
use crate::executor::Connection;

/// One planned schema change.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// The table does not exist; create it whole.
    CreateTable,
    /// A desired column is missing from the live table.
    AddColumn(Column),
    /// A live column diverges in type, nullability or default.
    AlterColumn(Column),
    /// A desired index is missing from the live table.
    CreateIndex(Index),
    /// A live index with this name covers a different column set or differs
    /// in uniqueness; drop and rebuild it.
    RecreateIndex(Index),
}

impl Change {
    /// Render this change as one or more statements.
    pub fn to_sql(&self, table: &Table, dialect: &dyn Dialect) -> Vec<String> {
        match self {
            Change::CreateTable => vec![dialect.create_table_sql(table)],
            Change::AddColumn(column) => vec![dialect.add_column_sql(table, column)],
            Change::AlterColumn(column) => vec![dialect.alter_column_sql(table, column)],
            Change::CreateIndex(index) => vec![dialect.create_index_sql(index)],
            Change::RecreateIndex(index) => vec![
                dialect.drop_index_sql(index),
                dialect.create_index_sql(index),
            ],
        }
    }
}

/// What one sync pass did.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Whether the table was created from scratch.
    pub created_table: bool,
    /// Every statement executed, in order.
    pub statements: Vec<String>,
}

/// Compute the additive changes that take `live` to `desired`.
///
/// `live` of `None` means the table does not exist. Columns come before
/// indexes so new indexes can cover new columns.
pub fn plan(desired: &Table, live: Option<&Table>, dialect: &dyn Dialect) -> Vec<Change> {
    let Some(live) = live else {
        let mut changes = vec![Change::CreateTable];
        changes.extend(desired.indexes.iter().cloned().map(Change::CreateIndex));
        return changes;
    };

    let mut changes = Vec::new();
    for column in &desired.columns {
        let actual = live
            .columns
            .iter()
            .find(|c| names_equal(dialect, &c.name, &column.name));
        match actual {
            None => changes.push(Change::AddColumn(column.clone())),
            Some(actual) => {
                if column_differs(column, actual, dialect) {
                    changes.push(Change::AlterColumn(column.clone()));
                }
            }
        }
    }
    for index in &desired.indexes {
        let actual = live
            .indexes
            .iter()
            .find(|i| names_equal(dialect, &i.name(), &index.name()));
        match actual {
            None => changes.push(Change::CreateIndex(index.clone())),
            Some(actual) => {
                if !index.same_columns(actual) || index.is_unique() != actual.is_unique() {
                    changes.push(Change::RecreateIndex(index.clone()));
                }
            }
        }
    }
    changes
}

/// Render the plan against a known live shape, without touching a database.
pub fn plan_sql(desired: &Table, live: Option<&Table>, dialect: &dyn Dialect) -> Vec<String> {
    plan(desired, live, dialect)
        .iter()
        .flat_map(|change| change.to_sql(desired, dialect))
        .collect()
}

/// Introspect, plan and execute in one pass.
///
/// Statements run one at a time outside any transaction; DDL is not
/// transactional on every engine. Execution stops at the first failure and
/// reports it with the offending statement. Re-running after a partial
/// failure is safe: the remaining diff simply shrinks.
pub fn sync_table(
    conn: &mut dyn Connection,
    dialect: &dyn Dialect,
    desired: &Table,
) -> Result<SyncReport, Error> {
    let live = dialect.introspect(conn, &desired.name)?;
    let changes = plan(desired, live.as_ref(), dialect);
    check_capabilities(&changes, dialect)?;

    let mut report = SyncReport {
        created_table: matches!(changes.first(), Some(Change::CreateTable)),
        statements: Vec::new(),
    };
    for change in &changes {
        for statement in change.to_sql(desired, dialect) {
            debug!(sql = %statement, "schema sync");
            conn.execute(&statement, &[])
                .map_err(|e| Error::execution(&statement, e))?;
            report.statements.push(statement);
        }
    }
    info!(
        table = %desired.name,
        statements = report.statements.len(),
        created = report.created_table,
        "schema synchronized"
    );
    Ok(report)
}

fn check_capabilities(changes: &[Change], dialect: &dyn Dialect) -> Result<(), Error> {
    for change in changes {
        let refused = match change {
            Change::CreateIndex(_) | Change::RecreateIndex(_) => {
                (!dialect.can_create_index()).then_some("create index")
            }
            Change::AlterColumn(_) => (!dialect.can_alter_column()).then_some("alter column"),
            _ => None,
        };
        if let Some(operation) = refused {
            return Err(Error::Capability {
                operation,
                dialect: dialect.id(),
            });
        }
    }
    Ok(())
}

pub(crate) fn names_equal(dialect: &dyn Dialect, a: &str, b: &str) -> bool {
    if dialect.case_insensitive_identifiers() {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

fn column_differs(desired: &Column, live: &Column, dialect: &dyn Dialect) -> bool {
    if dialect.normalize_type(&desired.sql_type) != dialect.normalize_type(&live.sql_type) {
        return true;
    }
    if desired.nullable != live.nullable {
        return true;
    }
    if desired.auto_increment {
        // The sequence default belongs to the engine, not the model.
        return false;
    }
    normalize_default(desired.default.as_deref()) != normalize_default(live.default.as_deref())
}

/// Strip the decoration catalogs apply to default expressions (cast suffixes,
/// quoting, spelling of the current-timestamp function) so declared and live
/// defaults compare structurally.
fn normalize_default(default: Option<&str>) -> Option<String> {
    let raw = default?.trim();
    let raw = match raw.split_once("::") {
        Some((value, _cast)) => value.trim(),
        None => raw,
    };
    let raw = raw.trim_matches('\'');
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
        return None;
    }
    let lower = raw.to_ascii_lowercase();
    match lower.as_str() {
        "now()" | "current_timestamp" | "current_timestamp()" => Some("now()".to_string()),
        _ => Some(lower),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MariaDbDialect, PostgresDialect};
    use converge_schema::FieldKind;

    fn desired_pg() -> Table {
        let mut table = Table::new("account");
        let mut id = Column::introspected("id", "BIGSERIAL");
        id.kind = Some(FieldKind::Int64);
        id.primary_key = true;
        id.nullable = false;
        id.auto_increment = true;
        table.columns.push(id);
        let mut email = Column::introspected("email", "VARCHAR(255)");
        email.kind = Some(FieldKind::String);
        email.nullable = false;
        table.columns.push(email);
        table
            .indexes
            .push(Index::new("account", "email_unique", vec!["email".into()], true));
        table
    }

    fn live_pg() -> Table {
        let mut table = Table::new("account");
        let mut id = Column::introspected("id", "int8");
        id.nullable = false;
        id.default = Some("nextval('account_id_seq'::regclass)".into());
        id.auto_increment = true;
        table.columns.push(id);
        let mut email = Column::introspected("email", "varchar");
        email.nullable = false;
        table.columns.push(email);
        table
            .indexes
            .push(Index::new("account", "email_unique", vec!["email".into()], true));
        table
    }

    #[test]
    fn missing_table_plans_create_then_indexes() {
        let dialect = PostgresDialect::new();
        let changes = plan(&desired_pg(), None, &dialect);
        assert!(matches!(changes[0], Change::CreateTable));
        assert!(matches!(changes[1], Change::CreateIndex(_)));
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn matching_live_schema_plans_nothing() {
        let dialect = PostgresDialect::new();
        assert!(plan(&desired_pg(), Some(&live_pg()), &dialect).is_empty());
    }

    #[test]
    fn extra_live_objects_are_never_dropped() {
        let dialect = PostgresDialect::new();
        let mut live = live_pg();
        live.columns.push(Column::introspected("legacy", "text"));
        live.indexes
            .push(Index::new("account", "idx_account_legacy", vec!["legacy".into()], false));
        let changes = plan(&desired_pg(), Some(&live), &dialect);
        assert!(changes.is_empty());
    }

    #[test]
    fn diverging_type_plans_alter() {
        let dialect = PostgresDialect::new();
        let mut live = live_pg();
        live.columns[1].sql_type = "text".into();
        let changes = plan(&desired_pg(), Some(&live), &dialect);
        assert_eq!(changes.len(), 1);
        assert!(matches!(&changes[0], Change::AlterColumn(c) if c.name == "email"));
    }

    #[test]
    fn nullability_divergence_plans_alter() {
        let dialect = PostgresDialect::new();
        let mut live = live_pg();
        live.columns[1].nullable = true;
        let changes = plan(&desired_pg(), Some(&live), &dialect);
        assert!(matches!(&changes[0], Change::AlterColumn(c) if c.name == "email"));
    }

    #[test]
    fn uniqueness_divergence_recreates_index() {
        let dialect = PostgresDialect::new();
        let mut live = live_pg();
        live.indexes[0] = Index::new("account", "email_unique", vec!["email".into()], false);
        let changes = plan(&desired_pg(), Some(&live), &dialect);
        assert_eq!(changes.len(), 1);
        let sql = changes[0].to_sql(&desired_pg(), &dialect);
        assert_eq!(sql[0], "DROP INDEX IF EXISTS \"email_unique\";");
        assert!(sql[1].starts_with("CREATE UNIQUE INDEX"));
    }

    #[test]
    fn identifier_case_folds_only_on_case_insensitive_dialects() {
        let pg = PostgresDialect::new();
        let maria = MariaDbDialect::new();
        assert!(!names_equal(&pg, "Email", "email"));
        assert!(names_equal(&maria, "Email", "email"));
    }

    #[test]
    fn catalog_default_decoration_is_ignored() {
        assert_eq!(
            normalize_default(Some("'pending'::character varying")),
            normalize_default(Some("pending"))
        );
        assert_eq!(
            normalize_default(Some("current_timestamp()")),
            normalize_default(Some("now()"))
        );
        assert_eq!(normalize_default(Some("NULL")), None);
        assert_eq!(normalize_default(None), None);
    }
}
