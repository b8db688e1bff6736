//! Date/time layouts
//!
//! A layout is either one of the RFC 3339 aliases or a chrono strftime
//! pattern. Patterns may leave out components: a missing year defaults to 0,
//! missing month/day default to 1, missing time-of-day components default
//! to 0 and a missing offset defaults to UTC. So `%Y-%m` parses `2000-01`
//! as 2000-01-01T00:00:00Z and `%H:%M` parses `15:04` as
//! 0000-01-01T15:04:00Z.

use chrono::format::{self, Fixed, Item, Numeric, Parsed, StrftimeItems};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::Serialize;
use std::fmt::Write;

/// Textual layout used to parse and format date/time fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "layout", content = "pattern", rename_all = "snake_case")]
pub enum TimeLayout {
    /// RFC 3339 with whole seconds (`2006-01-02T15:04:05Z07:00`)
    #[default]
    Rfc3339,
    /// RFC 3339 with fractional seconds
    Rfc3339Nano,
    /// chrono strftime pattern
    Pattern(String),
}

/// Why a layout could not be applied to a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutMismatch(pub String);

impl std::fmt::Display for LayoutMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for LayoutMismatch {}

impl TimeLayout {
    /// Resolve a layout override. `None`, the empty string and the RFC 3339
    /// aliases map to the named layouts; anything else must be a valid
    /// strftime pattern with at least one date/time specifier.
    ///
    /// Returns `None` for an invalid pattern.
    pub fn from_override(raw: Option<&str>) -> Option<Self> {
        let Some(raw) = raw.map(str::trim) else {
            return Some(Self::Rfc3339);
        };
        let alias = raw.strip_prefix("time.").unwrap_or(raw);
        if raw.is_empty() || alias.eq_ignore_ascii_case("rfc3339") {
            return Some(Self::Rfc3339);
        }
        if alias.eq_ignore_ascii_case("rfc3339nano") {
            return Some(Self::Rfc3339Nano);
        }
        is_valid_pattern(raw).then(|| Self::Pattern(raw.to_string()))
    }

    /// The layout as it would be written in an override.
    pub fn as_str(&self) -> &str {
        match self {
            TimeLayout::Rfc3339 => "RFC3339",
            TimeLayout::Rfc3339Nano => "RFC3339Nano",
            TimeLayout::Pattern(pattern) => pattern,
        }
    }

    /// Parse `text` with this layout.
    ///
    /// # Errors
    ///
    /// Returns a [`LayoutMismatch`] when the text does not match the layout.
    pub fn parse(&self, text: &str) -> Result<DateTime<FixedOffset>, LayoutMismatch> {
        match self {
            TimeLayout::Rfc3339 | TimeLayout::Rfc3339Nano => {
                DateTime::parse_from_rfc3339(text).map_err(|e| LayoutMismatch(e.to_string()))
            }
            TimeLayout::Pattern(pattern) => parse_pattern(pattern, text),
        }
    }

    /// Format `value` with this layout.
    ///
    /// # Errors
    ///
    /// Returns a [`LayoutMismatch`] when chrono cannot render the pattern.
    pub fn format(&self, value: &DateTime<FixedOffset>) -> Result<String, LayoutMismatch> {
        match self {
            TimeLayout::Rfc3339 => Ok(value.to_rfc3339_opts(SecondsFormat::Secs, true)),
            TimeLayout::Rfc3339Nano => Ok(trim_fraction(
                value.to_rfc3339_opts(SecondsFormat::Nanos, true),
            )),
            TimeLayout::Pattern(pattern) => {
                let mut out = String::new();
                write!(out, "{}", value.format_with_items(StrftimeItems::new(pattern)))
                    .map_err(|_| LayoutMismatch(format!("cannot format with layout {pattern}")))?;
                Ok(out)
            }
        }
    }
}

impl std::fmt::Display for TimeLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drop trailing zeros from the fractional seconds, and the `.` itself
/// when nothing is left.
fn trim_fraction(mut text: String) -> String {
    let Some(dot) = text.find('.') else {
        return text;
    };
    let digits_end = text[dot + 1..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(text.len(), |i| dot + 1 + i);
    let kept = text[dot + 1..digits_end].trim_end_matches('0').len();
    let cut_from = if kept == 0 { dot } else { dot + 1 + kept };
    text.replace_range(cut_from..digits_end, "");
    text
}

fn is_valid_pattern(pattern: &str) -> bool {
    let mut has_specifier = false;
    for item in StrftimeItems::new(pattern) {
        match item {
            Item::Error => return false,
            Item::Numeric(..) | Item::Fixed(_) => has_specifier = true,
            _ => {}
        }
    }
    has_specifier
}

/// Components a pattern supplies by itself.
#[derive(Debug, Default)]
struct Supplied {
    timestamp: bool,
    year: bool,
    month: bool,
    day: bool,
    hour: bool,
    minute: bool,
    second: bool,
    offset: bool,
}

impl Supplied {
    fn scan(pattern: &str) -> Self {
        let mut supplied = Self::default();
        for item in StrftimeItems::new(pattern) {
            match item {
                Item::Numeric(Numeric::Timestamp, _) => supplied.timestamp = true,
                Item::Numeric(
                    Numeric::Year
                    | Numeric::YearDiv100
                    | Numeric::YearMod100
                    | Numeric::IsoYear
                    | Numeric::IsoYearDiv100
                    | Numeric::IsoYearMod100,
                    _,
                ) => supplied.year = true,
                Item::Numeric(Numeric::Month, _)
                | Item::Fixed(Fixed::ShortMonthName | Fixed::LongMonthName) => {
                    supplied.month = true;
                }
                Item::Numeric(Numeric::Day, _) => supplied.day = true,
                Item::Numeric(
                    Numeric::Ordinal
                    | Numeric::WeekFromSun
                    | Numeric::WeekFromMon
                    | Numeric::IsoWeek,
                    _,
                ) => {
                    supplied.month = true;
                    supplied.day = true;
                }
                Item::Numeric(Numeric::Hour | Numeric::Hour12, _) => supplied.hour = true,
                Item::Numeric(Numeric::Minute, _) => supplied.minute = true,
                Item::Numeric(Numeric::Second, _) => supplied.second = true,
                Item::Fixed(Fixed::RFC2822 | Fixed::RFC3339) => {
                    supplied.year = true;
                    supplied.month = true;
                    supplied.day = true;
                    supplied.hour = true;
                    supplied.minute = true;
                    supplied.second = true;
                    supplied.offset = true;
                }
                Item::Fixed(
                    Fixed::TimezoneOffset
                    | Fixed::TimezoneOffsetColon
                    | Fixed::TimezoneOffsetDoubleColon
                    | Fixed::TimezoneOffsetTripleColon
                    | Fixed::TimezoneOffsetColonZ
                    | Fixed::TimezoneOffsetZ,
                ) => supplied.offset = true,
                _ => {}
            }
        }
        supplied
    }

    fn fill_defaults(&self, parsed: &mut Parsed) -> format::ParseResult<()> {
        if self.timestamp {
            if !self.offset {
                parsed.set_offset(0)?;
            }
            return Ok(());
        }
        if !self.year {
            parsed.set_year(0)?;
        }
        if !self.month {
            parsed.set_month(1)?;
        }
        if !self.day {
            parsed.set_day(1)?;
        }
        if !self.hour {
            parsed.set_hour(0)?;
        }
        if !self.minute {
            parsed.set_minute(0)?;
        }
        if !self.second {
            parsed.set_second(0)?;
        }
        if !self.offset {
            parsed.set_offset(0)?;
        }
        Ok(())
    }
}

fn parse_pattern(pattern: &str, text: &str) -> Result<DateTime<FixedOffset>, LayoutMismatch> {
    let mut parsed = Parsed::new();
    format::parse(&mut parsed, text, StrftimeItems::new(pattern))
        .map_err(|e| LayoutMismatch(e.to_string()))?;
    Supplied::scan(pattern)
        .fill_defaults(&mut parsed)
        .map_err(|e| LayoutMismatch(e.to_string()))?;
    parsed
        .to_datetime()
        .map_err(|e| LayoutMismatch(e.to_string()))
}
