//! Field bindings and binding sets

use csvplus_schema::{FieldKind, TimeLayout};
use serde::Serialize;

/// How a binding set was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingMode {
    /// Columns matched by header name
    Header,
    /// Columns matched by declaration order, no header row
    Positional,
    /// Encode-side columns, one per non-skipped field
    Output,
}

/// Association of one record field with one CSV column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldBinding {
    pub(crate) field_name: String,
    pub(crate) field_index: usize,
    pub(crate) column_name: String,
    pub(crate) column_index: usize,
    pub(crate) kind: FieldKind,
    pub(crate) layout: Option<TimeLayout>,
    pub(crate) omit_empty: bool,
}

impl FieldBinding {
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Declaration index of the field in its record type.
    pub fn field_index(&self) -> usize {
        self.field_index
    }

    /// Resolved column name; empty in positional mode.
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn column_index(&self) -> usize {
        self.column_index
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Layout for date/time fields.
    pub fn layout(&self) -> Option<&TimeLayout> {
        self.layout.as_ref()
    }

    pub fn omit_empty(&self) -> bool {
        self.omit_empty
    }

    /// Column name for diagnostics, falling back to the column index when
    /// no header was used.
    pub fn column_label(&self) -> String {
        if self.column_name.is_empty() {
            format!("col idx {}", self.column_index)
        } else {
            self.column_name.clone()
        }
    }
}

/// Column name claimed by more than one field; none of them are bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub column_name: String,
    pub fields: Vec<String>,
}

/// Resolved, immutable bindings of one record type for one header shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindingSet {
    pub(crate) type_name: String,
    pub(crate) mode: BindingMode,
    pub(crate) bindings: Vec<FieldBinding>,
    pub(crate) skipped: Vec<String>,
    pub(crate) unbound: Vec<String>,
    pub(crate) collisions: Vec<Collision>,
}

impl BindingSet {
    pub(crate) fn new(type_name: impl Into<String>, mode: BindingMode) -> Self {
        Self {
            type_name: type_name.into(),
            mode,
            bindings: Vec::new(),
            skipped: Vec::new(),
            unbound: Vec::new(),
            collisions: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn mode(&self) -> BindingMode {
        self.mode
    }

    /// Bindings in field declaration order.
    pub fn bindings(&self) -> &[FieldBinding] {
        &self.bindings
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldBinding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Binding of a field by declared name.
    pub fn get(&self, field_name: &str) -> Option<&FieldBinding> {
        self.bindings.iter().find(|b| b.field_name == field_name)
    }

    pub fn is_bound(&self, field_name: &str) -> bool {
        self.get(field_name).is_some()
    }

    /// Column names in binding order; the header row written on encode.
    pub fn header(&self) -> Vec<String> {
        self.bindings.iter().map(|b| b.column_name.clone()).collect()
    }

    /// Smallest row width that covers every bound column.
    pub fn min_row_width(&self) -> usize {
        self.bindings
            .iter()
            .map(|b| b.column_index + 1)
            .max()
            .unwrap_or(0)
    }

    /// Fields excluded by a skip override.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Fields whose column was not found in the header.
    pub fn unbound(&self) -> &[String] {
        &self.unbound
    }

    /// Column names excluded because several fields claimed them.
    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }
}

impl<'a> IntoIterator for &'a BindingSet {
    type Item = &'a FieldBinding;
    type IntoIter = std::slice::Iter<'a, FieldBinding>;

    fn into_iter(self) -> Self::IntoIter {
        self.bindings.iter()
    }
}
