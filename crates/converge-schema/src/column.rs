//! The column abstraction shared across dialects.

use crate::tag::TagMap;
use crate::value::SqlValue;

/// The abstract kind of a model field, before dialect type mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// UTF-8 text.
    String,
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 8-bit unsigned integer.
    UInt8,
    /// 16-bit unsigned integer.
    UInt16,
    /// 32-bit unsigned integer.
    UInt32,
    /// 64-bit unsigned integer. Dialects without unsigned types map this to
    /// their largest signed integer type (documented precision loss).
    UInt64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// Boolean.
    Bool,
    /// Raw byte sequence.
    Bytes,
    /// Point-in-time timestamp.
    Timestamp,
}

impl FieldKind {
    /// True for the integer and floating point kinds.
    pub fn is_numeric(self) -> bool {
        !matches!(
            self,
            FieldKind::String | FieldKind::Bool | FieldKind::Bytes | FieldKind::Timestamp
        )
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldKind::String => "string",
            FieldKind::Int8 => "int8",
            FieldKind::Int16 => "int16",
            FieldKind::Int32 => "int32",
            FieldKind::Int64 => "int64",
            FieldKind::UInt8 => "uint8",
            FieldKind::UInt16 => "uint16",
            FieldKind::UInt32 => "uint32",
            FieldKind::UInt64 => "uint64",
            FieldKind::Float32 => "float32",
            FieldKind::Float64 => "float64",
            FieldKind::Bool => "bool",
            FieldKind::Bytes => "bytes",
            FieldKind::Timestamp => "timestamp",
        };
        write!(f, "{}", name)
    }
}

/// One table column: identity plus constraints, shared across dialects.
///
/// Desired columns (built from a model) carry their abstract [`FieldKind`];
/// introspected columns only know the native `sql_type` reported by the
/// catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name, unique within a table. Immutable after table construction.
    pub name: String,
    /// Dialect-rendered SQL type, width included (e.g. `VARCHAR(255)`).
    pub sql_type: String,
    /// Abstract kind; `None` for columns read back from the catalog.
    pub kind: Option<FieldKind>,
    /// Whether the column allows NULL. Never true for primary keys.
    pub nullable: bool,
    /// Whether this column is part of the primary key.
    pub primary_key: bool,
    /// Whether this column has a single-column unique constraint.
    pub unique: bool,
    /// Whether this column participates in a secondary index.
    pub indexed: bool,
    /// Whether the column is auto-incrementing.
    pub auto_increment: bool,
    /// Starting offset for auto-increment sequences (non-negative).
    pub auto_increment_offset: i64,
    /// Persist zero values instead of treating them as unset.
    pub allow_zero: bool,
    /// Default value expression; `None` = no default.
    pub default: Option<String>,
    /// Whether the source field was optional by reference.
    pub from_pointer: bool,
    /// Declared width for variable-length textual types; 0 = unspecified.
    pub width: u32,
    /// Ordinal position within the table; -1 = unassigned.
    pub ordinal: i32,
    /// Raw declared tag metadata, unknown keys included.
    pub tags: TagMap,
}

impl Column {
    /// A column as read back from the live catalog.
    pub fn introspected(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Column {
            name: name.into(),
            sql_type: sql_type.into(),
            kind: None,
            nullable: true,
            primary_key: false,
            unique: false,
            indexed: false,
            auto_increment: false,
            auto_increment_offset: 0,
            allow_zero: false,
            default: None,
            from_pointer: false,
            width: 0,
            ordinal: -1,
            tags: TagMap::new(),
        }
    }

    /// True for textual columns.
    pub fn is_string(&self) -> bool {
        match self.kind {
            Some(kind) => kind == FieldKind::String,
            None => {
                let ty = self.sql_type.to_ascii_lowercase();
                ty.contains("char") || ty.contains("text")
            }
        }
    }

    /// True for integer and floating point columns.
    pub fn is_numeric(&self) -> bool {
        match self.kind {
            Some(kind) => kind.is_numeric(),
            None => {
                let ty = self.sql_type.to_ascii_lowercase();
                ["int", "serial", "float", "double", "real", "decimal", "numeric"]
                    .iter()
                    .any(|t| ty.contains(t))
            }
        }
    }

    /// True for date/time columns.
    pub fn is_date(&self) -> bool {
        match self.kind {
            Some(kind) => kind == FieldKind::Timestamp,
            None => {
                let ty = self.sql_type.to_ascii_lowercase();
                ty.contains("timestamp") || ty.contains("datetime") || ty.contains("date")
            }
        }
    }

    /// Whether a runtime value is the zero value for this column's kind.
    ///
    /// Used by callers that skip unset fields on insert, unless the column
    /// declares `allow_zero`.
    pub fn is_zero(&self, value: &SqlValue) -> bool {
        match value {
            SqlValue::Null => true,
            SqlValue::Bool(b) => !b,
            SqlValue::Int(v) => *v == 0,
            SqlValue::Float(v) => *v == 0.0,
            SqlValue::Text(s) => s.is_empty(),
            SqlValue::Bytes(b) => b.is_empty(),
        }
    }

    /// Map a runtime value to the representation the driver expects.
    ///
    /// Pass-through for primitives; dialect drivers may pre-process values
    /// before handing them to this column (e.g. binary encodings).
    pub fn to_sql_value(&self, value: SqlValue) -> SqlValue {
        value
    }
}
