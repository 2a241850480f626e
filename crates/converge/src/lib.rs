//! Declarative schema reconciliation for SQL databases.
//!
//! Describe a typed data model once, bind it to a dialect, and let the
//! engine converge the live database toward it:
//!
//! ```
//! use std::sync::Arc;
//! use converge::{Connection, Error, FieldDef, FieldKind, ModelDef, PostgresDialect, TableHandle};
//!
//! fn migrate(conn: &mut dyn Connection) -> Result<(), Error> {
//!     let model = ModelDef::new(vec![
//!         FieldDef::new("id", FieldKind::Int64).tag("primary;auto_increment"),
//!         FieldDef::new("email", FieldKind::String).tag("width:255;unique"),
//!     ]);
//!     let users = TableHandle::from_model("users", &model, Arc::new(PostgresDialect::new()))?;
//!     users.sync(conn)?;
//!     Ok(())
//! }
//! ```
//!
//! Reconciliation is additive: columns and indexes that exist in the
//! database but not in the model are never touched, and a second sync
//! against a converged schema executes nothing.

pub mod dialect;
pub mod error;
pub mod executor;
pub mod registry;
pub mod sync;
pub mod table;

pub use converge_schema::{
    Column, FieldDef, FieldKind, ForeignKey, Index, IndexTagError, ModelDef, SqlValue, Table,
    TagError, TagMap, bool_tag, parse_tag,
};

pub use converge_sql::QuoteStyle;

pub use dialect::{Dialect, DialectId, MariaDbDialect, PostgresDialect};
pub use error::{Error, ExecutionError, FieldIssue};
pub use executor::{Connection, Row, RowCursor};
pub use registry::DialectRegistry;
pub use sync::{Change, SyncReport, plan, plan_sql, sync_table};
pub use table::TableHandle;
