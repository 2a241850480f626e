//! Execution primitives supplied by the caller.
//!
//! The engine never opens connections or manages pools; it renders SQL and
//! hands statements to whatever blocking driver the environment provides,
//! through these three narrow traits.

use converge_schema::SqlValue;

use crate::error::ExecutionError;

/// A live database connection (or an object behaving like one).
pub trait Connection {
    /// Run a statement that returns no rows. Returns the affected row count.
    fn execute(&mut self, statement: &str, params: &[SqlValue]) -> Result<u64, ExecutionError>;

    /// Run a query and return a cursor over its rows.
    fn query(
        &mut self,
        statement: &str,
        params: &[SqlValue],
    ) -> Result<Box<dyn RowCursor + '_>, ExecutionError>;
}

/// A forward-only cursor over query results.
pub trait RowCursor {
    /// The next row, or `None` once the result set is exhausted.
    fn next_row(&mut self) -> Result<Option<Row>, ExecutionError>;
}

/// One materialized result row.
#[derive(Debug, Clone, Default)]
pub struct Row {
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new(values: Vec<SqlValue>) -> Self {
        Row { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn value(&self, index: usize) -> Result<&SqlValue, ExecutionError> {
        self.values.get(index).ok_or_else(|| {
            ExecutionError::new(format!(
                "row has {} columns, no column {}",
                self.values.len(),
                index
            ))
        })
    }

    /// The text at `index`. NULL and non-text values are errors.
    pub fn text(&self, index: usize) -> Result<&str, ExecutionError> {
        let value = self.value(index)?;
        value
            .as_text()
            .ok_or_else(|| ExecutionError::new(format!("column {index} is not text: {value:?}")))
    }

    /// The text at `index`, or `None` for NULL.
    pub fn opt_text(&self, index: usize) -> Result<Option<&str>, ExecutionError> {
        let value = self.value(index)?;
        if value.is_null() {
            return Ok(None);
        }
        value
            .as_text()
            .map(Some)
            .ok_or_else(|| ExecutionError::new(format!("column {index} is not text: {value:?}")))
    }

    /// The integer at `index`.
    pub fn int(&self, index: usize) -> Result<i64, ExecutionError> {
        let value = self.value(index)?;
        value.as_int().ok_or_else(|| {
            ExecutionError::new(format!("column {index} is not an integer: {value:?}"))
        })
    }

    /// The boolean at `index`. Integer flags coerce, as some catalogs report
    /// booleans numerically.
    pub fn bool(&self, index: usize) -> Result<bool, ExecutionError> {
        let value = self.value(index)?;
        value.as_bool().ok_or_else(|| {
            ExecutionError::new(format!("column {index} is not a boolean: {value:?}"))
        })
    }
}
