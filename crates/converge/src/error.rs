//! The engine's error taxonomy.

use converge_schema::{FieldKind, IndexTagError, TagError};
use thiserror::Error;

use crate::dialect::DialectId;

/// A driver-level failure, reported by the caller's [`Connection`]
/// implementation.
///
/// [`Connection`]: crate::executor::Connection
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ExecutionError {
    message: String,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        ExecutionError {
            message: message.into(),
        }
    }
}

/// One rejected field, collected during table construction.
#[derive(Debug, Clone, Error)]
#[error("field {field}: {message}")]
pub struct FieldIssue {
    /// Name of the model field.
    pub field: String,
    /// What was wrong with it.
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldIssue {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn tag(field: &str, error: TagError) -> Self {
        FieldIssue::new(field, error.to_string())
    }
}

/// Everything that can go wrong between a model description and the database.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed field metadata. All offending fields are reported at once,
    /// before any DDL is attempted.
    #[error("invalid field metadata: {}", format_issues(.0))]
    Validation(Vec<FieldIssue>),

    /// The dialect has no SQL type for this field kind.
    #[error("no {dialect} type mapping for {kind} fields")]
    UnsupportedType { kind: FieldKind, dialect: DialectId },

    /// A malformed `index` tag.
    #[error(transparent)]
    IndexTag(#[from] IndexTagError),

    /// The dialect does not support the requested operation.
    #[error("{operation} is not supported by the {dialect} dialect")]
    Capability {
        operation: &'static str,
        dialect: DialectId,
    },

    /// A table-level operation needs a primary key the table does not have.
    #[error("table {0} has no primary key")]
    NoPrimaryKey(String),

    /// A statement failed at the database. Carries the statement for context.
    #[error("statement failed: {statement}: {source}")]
    Execution {
        statement: String,
        source: ExecutionError,
    },

    /// No dialect registered under this name.
    #[error("no dialect registered under {0:?}")]
    UnknownDialect(String),
}

impl Error {
    pub(crate) fn execution(statement: impl Into<String>, source: ExecutionError) -> Self {
        Error::Execution {
            statement: statement.into(),
            source,
        }
    }
}

fn format_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
