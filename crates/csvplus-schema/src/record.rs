//! Record type descriptors
//!
//! A record type lists its fields once through [`CsvRecord::fields`]. Each
//! [`FieldDef`] carries the declared name, the raw override metadata and a
//! typed accessor the converter uses to read and write the field.

use crate::overrides::FieldOverrides;
use crate::value::{BoxError, CsvMarshal, CsvUnmarshal, FieldKind, FieldValue, Scalar, ScalarKind};
use std::any::TypeId;

/// A type that one CSV row maps to.
///
/// ```rust
/// use csvplus_schema::{field, CsvRecord, FieldDef};
///
/// #[derive(Debug, Default)]
/// struct Item {
///     first: String,
///     second: i64,
///     third: Option<bool>,
/// }
///
/// impl CsvRecord for Item {
///     fn fields() -> Vec<FieldDef<Self>> {
///         vec![
///             field!(Item, first).tag("first"),
///             field!(Item, second).tag("second"),
///             field!(Item, third).tag("third"),
///         ]
///     }
/// }
///
/// assert_eq!(Item::fields().len(), 3);
/// ```
pub trait CsvRecord: Default + 'static {
    /// Field descriptors in declaration order.
    fn fields() -> Vec<FieldDef<Self>>;
}

/// Builtin conversion access to one field of `R`.
pub trait ScalarAccess<R>: Send + Sync {
    fn kind(&self) -> FieldKind;

    /// Store a decoded value. Returns `false` if the scalar does not fit the field type.
    fn store(&self, record: &mut R, value: Scalar) -> bool;

    /// Read the field; `None` when it holds no value.
    fn load(&self, record: &R) -> Option<Scalar>;
}

/// Custom hook access to one field of `R`.
pub trait HookAccess<R>: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn unmarshal(&self, record: &mut R, text: &str) -> Result<(), BoxError>;

    fn marshal(&self, record: &R) -> Result<Vec<u8>, BoxError>;
}

struct ScalarSlot<R, T> {
    get: fn(&R) -> &T,
    get_mut: fn(&mut R) -> &mut T,
}

impl<R, T: FieldValue> ScalarAccess<R> for ScalarSlot<R, T> {
    fn kind(&self) -> FieldKind {
        T::kind()
    }

    fn store(&self, record: &mut R, value: Scalar) -> bool {
        match T::from_scalar(value) {
            Some(value) => {
                *(self.get_mut)(record) = value;
                true
            }
            None => false,
        }
    }

    fn load(&self, record: &R) -> Option<Scalar> {
        (self.get)(record).to_scalar()
    }
}

struct HookSlot<R, T> {
    get: fn(&R) -> &T,
    get_mut: fn(&mut R) -> &mut T,
}

impl<R, T> HookAccess<R> for HookSlot<R, T>
where
    T: CsvUnmarshal + CsvMarshal + 'static,
{
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn unmarshal(&self, record: &mut R, text: &str) -> Result<(), BoxError> {
        *(self.get_mut)(record) = T::unmarshal_csv(text)?;
        Ok(())
    }

    fn marshal(&self, record: &R) -> Result<Vec<u8>, BoxError> {
        (self.get)(record).marshal_csv()
    }
}

/// How a field converts between text and its value.
pub enum FieldCodec<R> {
    /// Builtin scalar/time rules
    Builtin(Box<dyn ScalarAccess<R>>),
    /// The field type's own hooks
    Hook(Box<dyn HookAccess<R>>),
}

/// Descriptor of one record field.
pub struct FieldDef<R> {
    name: String,
    tag: Option<String>,
    layout: Option<String>,
    codec: FieldCodec<R>,
}

impl<R: 'static> FieldDef<R> {
    /// Field converted with the builtin rules of `T`.
    pub fn new<T: FieldValue>(
        name: impl Into<String>,
        get: fn(&R) -> &T,
        get_mut: fn(&mut R) -> &mut T,
    ) -> Self {
        Self {
            name: name.into(),
            tag: None,
            layout: None,
            codec: FieldCodec::Builtin(Box::new(ScalarSlot { get, get_mut })),
        }
    }

    /// Field converted by the `CsvUnmarshal`/`CsvMarshal` hooks of `T`.
    pub fn hook<T>(
        name: impl Into<String>,
        get: fn(&R) -> &T,
        get_mut: fn(&mut R) -> &mut T,
    ) -> Self
    where
        T: CsvUnmarshal + CsvMarshal + 'static,
    {
        Self {
            name: name.into(),
            tag: None,
            layout: None,
            codec: FieldCodec::Hook(Box::new(HookSlot { get, get_mut })),
        }
    }
}

impl<R> FieldDef<R> {
    /// Attach a column tag (`name`, `-`, `name,omitempty`).
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Attach a date/time layout override.
    #[must_use]
    pub fn layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn raw_layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    pub fn codec(&self) -> &FieldCodec<R> {
        &self.codec
    }

    pub fn kind(&self) -> FieldKind {
        match &self.codec {
            FieldCodec::Builtin(slot) => slot.kind(),
            FieldCodec::Hook(hook) => FieldKind::new(ScalarKind::Custom {
                type_name: hook.type_name(),
            }),
        }
    }

    /// Parse this field's override metadata.
    ///
    /// # Errors
    ///
    /// Returns an error when the tag or layout is malformed.
    pub fn overrides(&self) -> crate::Result<FieldOverrides> {
        FieldOverrides::parse(&self.name, self.kind(), self.raw_tag(), self.raw_layout())
    }
}

impl<R> std::fmt::Debug for FieldDef<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("tag", &self.tag)
            .field("layout", &self.layout)
            .finish()
    }
}

/// The field descriptors of one record type, captured once.
pub struct RecordSchema<R> {
    fields: Vec<FieldDef<R>>,
}

impl<R: CsvRecord> RecordSchema<R> {
    pub fn new() -> Self {
        Self { fields: R::fields() }
    }

    pub fn type_id(&self) -> TypeId {
        TypeId::of::<R>()
    }

    pub fn type_name(&self) -> &'static str {
        std::any::type_name::<R>()
    }
}

impl<R: CsvRecord> Default for RecordSchema<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> RecordSchema<R> {
    pub fn fields(&self) -> &[FieldDef<R>] {
        &self.fields
    }

    /// Field at a declaration index.
    pub fn field(&self, index: usize) -> Option<&FieldDef<R>> {
        self.fields.get(index)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<R> std::fmt::Debug for RecordSchema<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordSchema")
            .field("fields", &self.fields)
            .finish()
    }
}

/// Build a builtin-converted [`FieldDef`] for `record.field`.
///
/// The declared name defaults to the field identifier; pass a name first
/// to override it: `field!("First", Item, first)`.
#[macro_export]
macro_rules! field {
    ($record:ty, $field:ident) => {
        $crate::field!(stringify!($field), $record, $field)
    };
    ($name:expr, $record:ty, $field:ident) => {
        $crate::FieldDef::<$record>::new($name, |r| &r.$field, |r| &mut r.$field)
    };
}

/// Build a hook-converted [`FieldDef`] for `record.field`.
#[macro_export]
macro_rules! hook_field {
    ($record:ty, $field:ident) => {
        $crate::hook_field!(stringify!($field), $record, $field)
    };
    ($name:expr, $record:ty, $field:ident) => {
        $crate::FieldDef::<$record>::hook($name, |r| &r.$field, |r| &mut r.$field)
    };
}
