//! Concurrent binding cache
//!
//! Bindings are resolved once per record type and column shape, then shared
//! as `Arc<BindingSet>` by every converter that asks for the same shape.

use crate::binding::BindingSet;
use crate::resolver;
use crate::Result;
use csvplus_schema::{CsvRecord, RecordSchema};
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::{Arc, OnceLock};
use tracing::{debug, trace};

/// Where the column layout of a resolution comes from.
#[derive(Debug, Clone, Copy)]
pub enum ColumnSource<'a> {
    /// Header row names, in column order
    Header(&'a [String]),
    /// No header; width of the first row
    Positional { columns: usize },
    /// Encode side, columns derived from the record type
    Output,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Shape {
    Header(Vec<String>),
    Positional(usize),
    Output,
}

impl From<ColumnSource<'_>> for Shape {
    fn from(source: ColumnSource<'_>) -> Self {
        match source {
            ColumnSource::Header(names) => Shape::Header(names.to_vec()),
            ColumnSource::Positional { columns } => Shape::Positional(columns),
            ColumnSource::Output => Shape::Output,
        }
    }
}

type CacheKey = (TypeId, Shape);

/// Thread-safe cache of resolved field bindings.
#[derive(Debug, Default)]
pub struct FieldRegistry {
    cache: DashMap<CacheKey, Arc<BindingSet>>,
}

static GLOBAL: OnceLock<Arc<FieldRegistry>> = OnceLock::new();

impl FieldRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Process-wide registry shared by the default converters.
    pub fn global() -> Arc<FieldRegistry> {
        GLOBAL.get_or_init(|| Arc::new(FieldRegistry::new())).clone()
    }

    /// Resolve the bindings of `R` for a column source, reusing a cached
    /// result when the same type and shape were resolved before.
    ///
    /// # Errors
    ///
    /// Returns an error when a field's overrides are malformed or, for
    /// positional sources, when the field and column counts differ. Failed
    /// resolutions are not cached.
    pub fn resolve<R: CsvRecord>(
        &self,
        schema: &RecordSchema<R>,
        source: ColumnSource<'_>,
    ) -> Result<Arc<BindingSet>> {
        let key = (schema.type_id(), Shape::from(source));

        if let Some(cached) = self.cache.get(&key) {
            trace!(record = schema.type_name(), "Cache hit for field bindings");
            return Ok(Arc::clone(cached.value()));
        }

        let entry = self.cache.entry(key).or_try_insert_with(|| {
            let set = match source {
                ColumnSource::Header(names) => resolver::resolve_header(schema, names),
                ColumnSource::Positional { columns } => {
                    resolver::resolve_positional(schema, columns)
                }
                ColumnSource::Output => resolver::resolve_output(schema),
            }?;
            debug!(
                record = schema.type_name(),
                mode = ?set.mode(),
                bindings = set.len(),
                collisions = set.collisions().len(),
                "Cache miss, resolved field bindings"
            );
            Ok::<_, crate::Error>(Arc::new(set))
        })?;
        Ok(Arc::clone(entry.value()))
    }

    /// Bindings for a header row.
    pub fn resolve_header<R: CsvRecord>(
        &self,
        schema: &RecordSchema<R>,
        header: &[String],
    ) -> Result<Arc<BindingSet>> {
        self.resolve(schema, ColumnSource::Header(header))
    }

    /// Bindings by declaration order for rows `columns` wide.
    pub fn resolve_positional<R: CsvRecord>(
        &self,
        schema: &RecordSchema<R>,
        columns: usize,
    ) -> Result<Arc<BindingSet>> {
        self.resolve(schema, ColumnSource::Positional { columns })
    }

    /// Encode-side bindings.
    pub fn resolve_output<R: CsvRecord>(
        &self,
        schema: &RecordSchema<R>,
    ) -> Result<Arc<BindingSet>> {
        self.resolve(schema, ColumnSource::Output)
    }

    /// Whether bindings for `R` and this source are cached.
    pub fn contains<R: CsvRecord>(&self, source: ColumnSource<'_>) -> bool {
        self.cache
            .contains_key(&(TypeId::of::<R>(), Shape::from(source)))
    }

    /// Number of cached binding sets
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Drop every cached binding set.
    pub fn clear(&self) {
        self.cache.clear();
    }
}
