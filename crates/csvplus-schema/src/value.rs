//! Value model shared by the registry and the converter
//!
//! A field's Rust type is described by a [`FieldKind`]; the converter moves
//! data between text and the field through the type-neutral [`Scalar`].

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

/// Boxed error returned by custom conversion hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Scalar category of a field, after unwrapping `Option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScalarKind {
    /// Text, assigned verbatim
    Text,
    /// Signed integer of the given bit width
    Int { bits: u32 },
    /// Unsigned integer of the given bit width
    Uint { bits: u32 },
    /// Floating point of the given bit width (32 or 64)
    Float { bits: u32 },
    /// Boolean
    Bool,
    /// Date/time, converted with a [`crate::TimeLayout`]
    Time,
    /// Type converted by its own [`CsvUnmarshal`]/[`CsvMarshal`] hooks
    Custom { type_name: &'static str },
    /// Type with no builtin conversion.
    ///
    /// Builtin types never report this. A hand-written [`FieldValue`] impl
    /// can use it for a type that must be declared on a record but has no
    /// text form; converting a non-empty column into it or out of it fails
    /// with an unsupported-type error.
    Unsupported { type_name: &'static str },
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarKind::Text => write!(f, "string"),
            ScalarKind::Int { bits } => write!(f, "i{bits}"),
            ScalarKind::Uint { bits } => write!(f, "u{bits}"),
            ScalarKind::Float { bits } => write!(f, "f{bits}"),
            ScalarKind::Bool => write!(f, "bool"),
            ScalarKind::Time => write!(f, "datetime"),
            ScalarKind::Custom { type_name } | ScalarKind::Unsupported { type_name } => {
                write!(f, "{type_name}")
            }
        }
    }
}

/// Declared kind of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldKind {
    pub scalar: ScalarKind,
    /// True for `Option<T>` fields
    pub nullable: bool,
}

impl FieldKind {
    pub const fn new(scalar: ScalarKind) -> Self {
        Self {
            scalar,
            nullable: false,
        }
    }

    /// The same kind wrapped in `Option`.
    #[must_use]
    pub const fn nullable(self) -> Self {
        Self {
            scalar: self.scalar,
            nullable: true,
        }
    }

    pub fn is_time(&self) -> bool {
        self.scalar == ScalarKind::Time
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.nullable {
            write!(f, "Option<{}>", self.scalar)
        } else {
            write!(f, "{}", self.scalar)
        }
    }
}

/// Type-neutral field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Time(DateTime<FixedOffset>),
}

/// A Rust type with builtin CSV conversion.
///
/// `from_scalar` returns `None` when the scalar does not belong to the
/// type; `to_scalar` returns `None` when the field holds no value.
pub trait FieldValue: Sized + 'static {
    fn kind() -> FieldKind;

    fn from_scalar(value: Scalar) -> Option<Self>;

    fn to_scalar(&self) -> Option<Scalar>;
}

/// Custom decode hook: parse a value of this type from column text.
pub trait CsvUnmarshal: Sized {
    fn unmarshal_csv(text: &str) -> Result<Self, BoxError>;
}

/// Custom encode hook: render this value as column text.
pub trait CsvMarshal {
    fn marshal_csv(&self) -> Result<Vec<u8>, BoxError>;
}

impl<T: CsvUnmarshal> CsvUnmarshal for Option<T> {
    fn unmarshal_csv(text: &str) -> Result<Self, BoxError> {
        T::unmarshal_csv(text).map(Some)
    }
}

impl<T: CsvMarshal> CsvMarshal for Option<T> {
    fn marshal_csv(&self) -> Result<Vec<u8>, BoxError> {
        match self {
            Some(value) => value.marshal_csv(),
            None => Ok(Vec::new()),
        }
    }
}

impl FieldValue for String {
    fn kind() -> FieldKind {
        FieldKind::new(ScalarKind::Text)
    }

    fn from_scalar(value: Scalar) -> Option<Self> {
        match value {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    fn to_scalar(&self) -> Option<Scalar> {
        Some(Scalar::Text(self.clone()))
    }
}

macro_rules! signed_field_value {
    ($($ty:ty),*) => {$(
        impl FieldValue for $ty {
            fn kind() -> FieldKind {
                FieldKind::new(ScalarKind::Int { bits: <$ty>::BITS })
            }

            fn from_scalar(value: Scalar) -> Option<Self> {
                match value {
                    Scalar::Int(v) => <$ty>::try_from(v).ok(),
                    _ => None,
                }
            }

            fn to_scalar(&self) -> Option<Scalar> {
                i64::try_from(*self).ok().map(Scalar::Int)
            }
        }
    )*};
}

macro_rules! unsigned_field_value {
    ($($ty:ty),*) => {$(
        impl FieldValue for $ty {
            fn kind() -> FieldKind {
                FieldKind::new(ScalarKind::Uint { bits: <$ty>::BITS })
            }

            fn from_scalar(value: Scalar) -> Option<Self> {
                match value {
                    Scalar::Uint(v) => <$ty>::try_from(v).ok(),
                    _ => None,
                }
            }

            fn to_scalar(&self) -> Option<Scalar> {
                u64::try_from(*self).ok().map(Scalar::Uint)
            }
        }
    )*};
}

signed_field_value!(i8, i16, i32, i64, isize);
unsigned_field_value!(u8, u16, u32, u64, usize);

impl FieldValue for f64 {
    fn kind() -> FieldKind {
        FieldKind::new(ScalarKind::Float { bits: 64 })
    }

    fn from_scalar(value: Scalar) -> Option<Self> {
        match value {
            Scalar::Float(v) => Some(v),
            _ => None,
        }
    }

    fn to_scalar(&self) -> Option<Scalar> {
        Some(Scalar::Float(*self))
    }
}

impl FieldValue for f32 {
    fn kind() -> FieldKind {
        FieldKind::new(ScalarKind::Float { bits: 32 })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_scalar(value: Scalar) -> Option<Self> {
        match value {
            // range was checked when the text was parsed
            Scalar::Float(v) => Some(v as f32),
            _ => None,
        }
    }

    fn to_scalar(&self) -> Option<Scalar> {
        Some(Scalar::Float(f64::from(*self)))
    }
}

impl FieldValue for bool {
    fn kind() -> FieldKind {
        FieldKind::new(ScalarKind::Bool)
    }

    fn from_scalar(value: Scalar) -> Option<Self> {
        match value {
            Scalar::Bool(b) => Some(b),
            _ => None,
        }
    }

    fn to_scalar(&self) -> Option<Scalar> {
        Some(Scalar::Bool(*self))
    }
}

impl FieldValue for DateTime<FixedOffset> {
    fn kind() -> FieldKind {
        FieldKind::new(ScalarKind::Time)
    }

    fn from_scalar(value: Scalar) -> Option<Self> {
        match value {
            Scalar::Time(dt) => Some(dt),
            _ => None,
        }
    }

    fn to_scalar(&self) -> Option<Scalar> {
        Some(Scalar::Time(*self))
    }
}

impl FieldValue for DateTime<Utc> {
    fn kind() -> FieldKind {
        FieldKind::new(ScalarKind::Time)
    }

    fn from_scalar(value: Scalar) -> Option<Self> {
        match value {
            Scalar::Time(dt) => Some(dt.with_timezone(&Utc)),
            _ => None,
        }
    }

    fn to_scalar(&self) -> Option<Scalar> {
        Some(Scalar::Time(self.fixed_offset()))
    }
}

impl FieldValue for NaiveDateTime {
    fn kind() -> FieldKind {
        FieldKind::new(ScalarKind::Time)
    }

    fn from_scalar(value: Scalar) -> Option<Self> {
        match value {
            Scalar::Time(dt) => Some(dt.naive_local()),
            _ => None,
        }
    }

    fn to_scalar(&self) -> Option<Scalar> {
        Some(Scalar::Time(self.and_utc().fixed_offset()))
    }
}

impl FieldValue for NaiveDate {
    fn kind() -> FieldKind {
        FieldKind::new(ScalarKind::Time)
    }

    fn from_scalar(value: Scalar) -> Option<Self> {
        match value {
            Scalar::Time(dt) => Some(dt.date_naive()),
            _ => None,
        }
    }

    fn to_scalar(&self) -> Option<Scalar> {
        self.and_hms_opt(0, 0, 0)
            .map(|midnight| Scalar::Time(midnight.and_utc().fixed_offset()))
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn kind() -> FieldKind {
        T::kind().nullable()
    }

    fn from_scalar(value: Scalar) -> Option<Self> {
        T::from_scalar(value).map(Some)
    }

    fn to_scalar(&self) -> Option<Scalar> {
        self.as_ref().and_then(|value| value.to_scalar())
    }
}
