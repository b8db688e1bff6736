//! Binding resolution algorithms
//!
//! Every declared field has its overrides parsed here, bound or not, so
//! malformed metadata fails the first resolution instead of the first row.

use crate::binding::{BindingMode, BindingSet, Collision, FieldBinding};
use crate::{Error, Result};
use csvplus_schema::{CsvRecord, FieldDef, FieldOverrides, RecordSchema};
use std::collections::HashMap;
use tracing::warn;

fn binding<R>(
    index: usize,
    field: &FieldDef<R>,
    overrides: FieldOverrides,
    column_name: String,
    column_index: usize,
) -> FieldBinding {
    FieldBinding {
        field_name: field.name().to_string(),
        field_index: index,
        column_name,
        column_index,
        kind: field.kind(),
        layout: overrides.layout,
        omit_empty: overrides.omit_empty,
    }
}

/// `Name` -> `name`
fn lower_first(name: &str) -> Option<String> {
    let mut chars = name.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}

fn lookup<'h>(columns: &HashMap<&'h str, usize>, wanted: &str) -> Option<(&'h str, usize)> {
    if let Some((name, index)) = columns.get_key_value(wanted) {
        return Some((*name, *index));
    }
    let lowered = lower_first(wanted)?;
    columns
        .get_key_value(lowered.as_str())
        .map(|(name, index)| (*name, *index))
}

/// Bind fields to header columns by name.
pub(crate) fn resolve_header<R: CsvRecord>(
    schema: &RecordSchema<R>,
    header: &[String],
) -> Result<BindingSet> {
    let mut set = BindingSet::new(schema.type_name(), BindingMode::Header);

    // last occurrence wins for repeated header names
    let columns: HashMap<&str, usize> = header
        .iter()
        .enumerate()
        .map(|(index, name)| (name.as_str(), index))
        .collect();

    let mut candidates = Vec::new();
    for (index, field) in schema.fields().iter().enumerate() {
        let overrides = field.overrides()?;
        if overrides.skip {
            set.skipped.push(field.name().to_string());
            continue;
        }

        let wanted = overrides.column.as_deref().unwrap_or(field.name());
        match lookup(&columns, wanted) {
            Some((column_name, column_index)) => {
                let column_name = column_name.to_string();
                candidates.push(binding(index, field, overrides, column_name, column_index));
            }
            None => set.unbound.push(field.name().to_string()),
        }
    }

    let mut claims: HashMap<&str, Vec<&str>> = HashMap::new();
    for candidate in &candidates {
        claims
            .entry(candidate.column_name.as_str())
            .or_default()
            .push(candidate.field_name.as_str());
    }

    let mut collisions: Vec<Collision> = claims
        .iter()
        .filter(|(_, fields)| fields.len() > 1)
        .map(|(column, fields)| Collision {
            column_name: (*column).to_string(),
            fields: fields.iter().map(ToString::to_string).collect(),
        })
        .collect();
    collisions.sort_by(|a, b| a.column_name.cmp(&b.column_name));

    for collision in &collisions {
        warn!(
            record = schema.type_name(),
            column = %collision.column_name,
            fields = ?collision.fields,
            "Column claimed by several fields, leaving all of them unbound"
        );
    }

    set.bindings = candidates
        .into_iter()
        .filter(|c| !collisions.iter().any(|x| x.column_name == c.column_name))
        .collect();
    set.collisions = collisions;
    Ok(set)
}

/// Bind fields to columns by declaration order.
pub(crate) fn resolve_positional<R: CsvRecord>(
    schema: &RecordSchema<R>,
    columns: usize,
) -> Result<BindingSet> {
    let mut set = BindingSet::new(schema.type_name(), BindingMode::Positional);

    for (index, field) in schema.fields().iter().enumerate() {
        let overrides = field.overrides()?;
        if overrides.skip {
            set.skipped.push(field.name().to_string());
            continue;
        }
        let column_index = set.bindings.len();
        set.bindings
            .push(binding(index, field, overrides, String::new(), column_index));
    }

    if set.bindings.len() != columns {
        return Err(Error::FieldCountMismatch {
            record: schema.type_name().to_string(),
            fields: set.bindings.len(),
            columns,
        });
    }
    Ok(set)
}

/// Encode-side columns: every non-skipped field, in declaration order.
pub(crate) fn resolve_output<R: CsvRecord>(schema: &RecordSchema<R>) -> Result<BindingSet> {
    let mut set = BindingSet::new(schema.type_name(), BindingMode::Output);

    for (index, field) in schema.fields().iter().enumerate() {
        let overrides = field.overrides()?;
        if overrides.skip {
            set.skipped.push(field.name().to_string());
            continue;
        }
        let column_name = overrides
            .column
            .clone()
            .unwrap_or_else(|| field.name().to_string());
        let column_index = set.bindings.len();
        set.bindings
            .push(binding(index, field, overrides, column_name, column_index));
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use csvplus_schema::field;

    #[derive(Debug, Default)]
    struct Item {
        first: String,
        second: i64,
        third: Option<bool>,
    }

    impl CsvRecord for Item {
        fn fields() -> Vec<FieldDef<Self>> {
            vec![
                field!("First", Item, first),
                field!("Second", Item, second),
                field!("Third", Item, third),
            ]
        }
    }

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_lower_first() {
        assert_eq!(lower_first("First").as_deref(), Some("first"));
        assert_eq!(lower_first("ÉCOLE").as_deref(), Some("éCOLE"));
        assert_eq!(lower_first(""), None);
    }

    #[test]
    fn test_header_positions_follow_header() {
        let schema = RecordSchema::<Item>::new();
        let set = resolve_header(&schema, &header(&["Third", "First", "Second"])).unwrap();

        let resolved: Vec<(&str, usize)> = set
            .iter()
            .map(|b| (b.field_name(), b.column_index()))
            .collect();
        assert_eq!(resolved, vec![("First", 1), ("Second", 2), ("Third", 0)]);
        assert!(set.collisions().is_empty());
    }

    #[test]
    fn test_lowercase_header_matches() {
        let schema = RecordSchema::<Item>::new();
        let set = resolve_header(&schema, &header(&["first", "second"])).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("First").unwrap().column_name(), "first");
        assert_eq!(set.unbound(), ["Third".to_string()]);
    }

    #[test]
    fn test_repeated_header_name_last_wins() {
        let schema = RecordSchema::<Item>::new();
        let set = resolve_header(&schema, &header(&["First", "First"])).unwrap();
        assert_eq!(set.get("First").unwrap().column_index(), 1);
    }

    #[test]
    fn test_positional_ignores_names() {
        let schema = RecordSchema::<Item>::new();
        let set = resolve_positional(&schema, 3).unwrap();
        assert_eq!(set.mode(), BindingMode::Positional);
        assert!(set.iter().all(|b| b.column_name().is_empty()));
        assert_eq!(set.get("Third").unwrap().column_index(), 2);
    }

    #[test]
    fn test_positional_count_mismatch() {
        let schema = RecordSchema::<Item>::new();
        let err = resolve_positional(&schema, 2).unwrap_err();
        assert!(matches!(
            err,
            Error::FieldCountMismatch {
                fields: 3,
                columns: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_output_uses_declared_names() {
        let schema = RecordSchema::<Item>::new();
        let set = resolve_output(&schema).unwrap();
        assert_eq!(set.header(), vec!["First", "Second", "Third"]);
        assert!(set.skipped().is_empty());
        assert!(set.iter().all(|b| b.layout().is_none()));
    }
}
