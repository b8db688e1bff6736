//! Per-field override descriptor
//!
//! Raw override metadata attached to a [`crate::FieldDef`] is parsed once,
//! at resolution time, into a [`FieldOverrides`].
//!
//! Column tag syntax:
//!
//! ```text
//! -                     skip the field
//! name                  bind to column `name`
//! name,omitempty        bind to `name`, mark omit-empty
//! ,omitempty            default column name, mark omit-empty
//! ```

use crate::layout::TimeLayout;
use crate::value::FieldKind;
use crate::{Error, Result};

const SKIP_MARKER: &str = "-";
const OMIT_EMPTY: &str = "omitempty";

/// Structured form of a field's override metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldOverrides {
    /// Explicit column name, if the tag names one
    pub column: Option<String>,
    /// Field never binds to a column
    pub skip: bool,
    /// Encode-side hint, no effect on decoding
    pub omit_empty: bool,
    /// Layout for date/time fields; `None` for every other kind
    pub layout: Option<TimeLayout>,
}

impl FieldOverrides {
    /// Parse the column tag and layout override of one field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOverride`] for malformed tags or a layout on a
    /// non-time field, and [`Error::InvalidLayout`] for unusable layouts.
    pub fn parse(
        field: &str,
        kind: FieldKind,
        tag: Option<&str>,
        layout: Option<&str>,
    ) -> Result<Self> {
        let mut overrides = Self::parse_tag(field, tag.unwrap_or(""))?;

        if kind.is_time() {
            let resolved = TimeLayout::from_override(layout).ok_or_else(|| {
                Error::invalid_layout(field, layout.unwrap_or_default())
            })?;
            overrides.layout = Some(resolved);
        } else if layout.is_some_and(|l| !l.trim().is_empty()) {
            return Err(Error::invalid_override(
                field,
                format!("layout override on non date/time field of type {kind}"),
            ));
        }

        Ok(overrides)
    }

    fn parse_tag(field: &str, tag: &str) -> Result<Self> {
        let tag = tag.trim();
        if tag == SKIP_MARKER {
            return Ok(Self {
                skip: true,
                ..Self::default()
            });
        }

        let mut parts = tag.split(',');
        let name = parts.next().unwrap_or_default().trim();
        if name == SKIP_MARKER {
            return Err(Error::invalid_override(
                field,
                format!("skip marker takes no options: '{tag}'"),
            ));
        }

        let mut overrides = Self {
            column: (!name.is_empty()).then(|| name.to_string()),
            ..Self::default()
        };
        for option in parts {
            match option.trim() {
                OMIT_EMPTY => overrides.omit_empty = true,
                "" => {
                    return Err(Error::invalid_override(
                        field,
                        format!("empty option in '{tag}'"),
                    ));
                }
                other => {
                    return Err(Error::invalid_override(
                        field,
                        format!("unknown option '{other}'"),
                    ));
                }
            }
        }
        Ok(overrides)
    }
}
