//! Builtin text <-> scalar rules
//!
//! Integers are base 10 and checked against the field's declared width,
//! floats against `f32`/`f64` range. Booleans accept `true`, `false`, `1`,
//! `0`, `t` and `f` in any case.

use crate::errors::ConversionError;
use csvplus_schema::{FieldKind, Scalar, ScalarKind, TimeLayout};
use std::num::IntErrorKind;

type ConvResult<T> = std::result::Result<T, ConversionError>;

/// Parse column text into a scalar of the given kind.
pub fn parse_scalar(
    field: &str,
    kind: &ScalarKind,
    layout: Option<&TimeLayout>,
    text: &str,
) -> ConvResult<Scalar> {
    match *kind {
        ScalarKind::Text => Ok(Scalar::Text(text.to_string())),
        ScalarKind::Int { bits } => parse_int(text, bits).map(Scalar::Int),
        ScalarKind::Uint { bits } => parse_uint(text, bits).map(Scalar::Uint),
        ScalarKind::Float { bits } => parse_float(text, bits).map(Scalar::Float),
        ScalarKind::Bool => parse_bool(text).map(Scalar::Bool),
        ScalarKind::Time => {
            let layout = layout.cloned().unwrap_or_default();
            layout
                .parse(text)
                .map(Scalar::Time)
                .map_err(|source| ConversionError::Layout {
                    layout: layout.to_string(),
                    source,
                })
        }
        ScalarKind::Custom { type_name } | ScalarKind::Unsupported { type_name } => {
            Err(ConversionError::unsupported(field, type_name))
        }
    }
}

fn parse_int(text: &str, bits: u32) -> ConvResult<i64> {
    let expected = ScalarKind::Int { bits };
    let value = text.parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            ConversionError::overflow(expected)
        }
        _ => ConversionError::syntax(expected),
    })?;

    if bits < 64 {
        let max = (1_i64 << (bits - 1)) - 1;
        let min = -(1_i64 << (bits - 1));
        if value < min || value > max {
            return Err(ConversionError::overflow(expected));
        }
    }
    Ok(value)
}

fn parse_uint(text: &str, bits: u32) -> ConvResult<u64> {
    let expected = ScalarKind::Uint { bits };
    let value = text.parse::<u64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => ConversionError::overflow(expected),
        _ => ConversionError::syntax(expected),
    })?;

    if bits < 64 && value >> bits != 0 {
        return Err(ConversionError::overflow(expected));
    }
    Ok(value)
}

fn is_infinity_literal(text: &str) -> bool {
    let unsigned = text.trim_start_matches(['+', '-']);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

fn parse_float(text: &str, bits: u32) -> ConvResult<f64> {
    let expected = ScalarKind::Float { bits };
    let value = text
        .parse::<f64>()
        .map_err(|_| ConversionError::syntax(expected))?;

    if value.is_infinite() && !is_infinity_literal(text) {
        return Err(ConversionError::overflow(expected));
    }
    if bits == 32 && value.is_finite() && value.abs() > f64::from(f32::MAX) {
        return Err(ConversionError::overflow(expected));
    }
    Ok(value)
}

fn parse_bool(text: &str) -> ConvResult<bool> {
    const TRUE: [&str; 3] = ["true", "1", "t"];
    const FALSE: [&str; 3] = ["false", "0", "f"];

    if TRUE.iter().any(|t| text.eq_ignore_ascii_case(t)) {
        Ok(true)
    } else if FALSE.iter().any(|f| text.eq_ignore_ascii_case(f)) {
        Ok(false)
    } else {
        Err(ConversionError::syntax(ScalarKind::Bool))
    }
}

/// Render a scalar as column text.
#[allow(clippy::cast_possible_truncation)]
pub fn format_scalar(
    kind: &FieldKind,
    layout: Option<&TimeLayout>,
    value: &Scalar,
) -> ConvResult<String> {
    match value {
        Scalar::Text(text) => Ok(text.clone()),
        Scalar::Int(v) => Ok(v.to_string()),
        Scalar::Uint(v) => Ok(v.to_string()),
        Scalar::Float(v) => match kind.scalar {
            ScalarKind::Float { bits: 32 } => Ok((*v as f32).to_string()),
            _ => Ok(v.to_string()),
        },
        Scalar::Bool(v) => Ok(v.to_string()),
        Scalar::Time(v) => {
            let layout = layout.cloned().unwrap_or_default();
            layout.format(v).map_err(|source| ConversionError::Layout {
                layout: layout.to_string(),
                source,
            })
        }
    }
}
