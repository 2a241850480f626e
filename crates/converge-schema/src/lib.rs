//! Schema model types for converge.
//!
//! This crate holds the dialect-independent pieces of the schema model: the
//! field tag grammar, the column and index abstractions, the table aggregate
//! and the explicit model description (`ModelDef`) that replaces runtime
//! reflection. The dialect drivers and the reconciliation engine live in the
//! `converge` crate.

mod column;
mod index;
mod model;
mod table;
pub mod tag;
mod value;

pub use column::{Column, FieldKind};
pub use index::Index;
pub use model::{FieldDef, ModelDef};
pub use table::{ForeignKey, IndexTagError, Table, collect_indexes, column_name_override};
pub use tag::{TagError, TagMap, bool_tag, parse_tag};
pub use value::SqlValue;

#[cfg(test)]
mod tests;
