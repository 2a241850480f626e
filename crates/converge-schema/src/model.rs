//! Explicit model descriptions.
//!
//! Instead of inspecting runtime type information, callers describe a typed
//! model once, ahead of time: one [`FieldDef`] per field, carrying the
//! abstract kind, optionality and the raw tag string. The description is
//! cheap to build, cacheable, and the single input to table construction.

use crate::column::FieldKind;

/// One field of a typed data model.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Field name; becomes the column name unless overridden by a `name` tag.
    pub name: String,
    /// Abstract kind of the field.
    pub kind: FieldKind,
    /// Whether the field is optional by reference (pointer / `Option`).
    pub optional: bool,
    /// Raw tag string, e.g. `"width:255;unique"`.
    pub tag: String,
}

impl FieldDef {
    /// A required field with no tags.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        FieldDef {
            name: name.into(),
            kind,
            optional: false,
            tag: String::new(),
        }
    }

    /// Attach a raw tag string.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Mark the field optional by reference.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// The ahead-of-time description of a typed data model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelDef {
    /// Fields in declaration order.
    pub fields: Vec<FieldDef>,
}

impl ModelDef {
    /// Build a model description from its fields.
    pub fn new(fields: Vec<FieldDef>) -> Self {
        ModelDef { fields }
    }
}
