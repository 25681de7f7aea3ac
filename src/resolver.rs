//! Table resolution: match raw tables against the schema catalog and build
//! the resolved set on first access.
//!
//! [`TableResolver`] captures a source's raw tables when it is opened and
//! resolves nothing until a table is requested. The first request resolves
//! every table and caches the whole set, including an empty one, for the
//! lifetime of the resolver. Two failure styles coexist on purpose:
//!
//! - building the set is all-or-nothing and returns [`TableError`] when any
//!   table header matches no schema;
//! - looking a name up never fails, it answers [`Lookup::NotFound`].
//!
//! The cache lives in a [`OnceCell`], so a resolver is confined to one
//! thread.

use std::cell::OnceCell;
use std::path::Path;

use log::{debug, info, warn};

use crate::{
    catalog::{ColumnDef, ColumnSpec, SchemaCatalog},
    error::{Result, TableError},
    table::{RawTable, ResolvedTable},
};

/// Source decoder supplying `(metadata, raw tables)` for a locator.
pub trait TableReader {
    type Metadata;

    fn read(&self, source: &Path) -> anyhow::Result<(Self::Metadata, Vec<RawTable>)>;
}

impl<F, M> TableReader for F
where
    F: Fn(&Path) -> anyhow::Result<(M, Vec<RawTable>)>,
{
    type Metadata = M;

    fn read(&self, source: &Path) -> anyhow::Result<(M, Vec<RawTable>)> {
        self(source)
    }
}

/// Result of looking a schema name up in the resolved set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    Found(&'a ResolvedTable),
    NotFound,
}

impl<'a> Lookup<'a> {
    pub fn found(self) -> Option<&'a ResolvedTable> {
        match self {
            Lookup::Found(table) => Some(table),
            Lookup::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// Schema name to resolved table, in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedSet {
    entries: Vec<(String, ResolvedTable)>,
}

impl ResolvedSet {
    /// Stores `table` under `name`, returning the table it replaced.
    pub fn insert(&mut self, name: String, table: ResolvedTable) -> Option<ResolvedTable> {
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, table)),
            None => {
                self.entries.push((name, table));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedTable> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, table)| table)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedTable)> {
        self.entries.iter().map(|(name, table)| (name.as_str(), table))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for ResolvedSet {
    type Item = (String, ResolvedTable);
    type IntoIter = std::vec::IntoIter<(String, ResolvedTable)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

pub fn match_schema<'a>(
    header: &[String],
    catalog: &'a SchemaCatalog,
) -> Result<(&'a str, &'a ColumnSpec)> {
    catalog.match_header(header)
}

/// Display names for `header`, in header order.
pub fn build_columns(header: &[String], schema: &str, spec: &ColumnSpec) -> Result<Vec<String>> {
    Ok(column_defs(header, schema, spec)?
        .into_iter()
        .map(|def| def.display_name.clone())
        .collect())
}

fn column_defs<'a>(
    header: &[String],
    schema: &str,
    spec: &'a ColumnSpec,
) -> Result<Vec<&'a ColumnDef>> {
    header
        .iter()
        .map(|key| {
            spec.get(key).ok_or_else(|| TableError::UnknownColumn {
                key: key.clone(),
                schema: schema.to_string(),
            })
        })
        .collect()
}

pub fn resolve_table(raw: &RawTable, catalog: &SchemaCatalog) -> Result<(String, ResolvedTable)> {
    let header = raw.header();
    let (name, spec) = match_schema(header, catalog)?;
    let defs = column_defs(header, name, spec)?;
    let columns = defs.iter().map(|def| def.display_name.clone()).collect();
    let types = defs.iter().map(|def| def.numeric_type).collect::<Vec<_>>();
    let table = ResolvedTable::from_rows(name, columns, &types, raw.data_rows())?;
    debug!(
        "Resolved table '{}' with {} row(s): {}",
        name,
        table.row_count(),
        table
            .columns()
            .map(|(column, data)| format!("{column}={}", data.kind()))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok((name.to_string(), table))
}

/// Resolves every raw table in order. A later table resolving to an already
/// present schema name replaces the earlier one.
pub fn build_all(raw_tables: &[RawTable], catalog: &SchemaCatalog) -> Result<ResolvedSet> {
    let mut resolved = ResolvedSet::default();
    for raw in raw_tables {
        let (name, table) = resolve_table(raw, catalog)?;
        if resolved.insert(name.clone(), table).is_some() {
            warn!("Table '{name}' appears more than once; keeping the last occurrence");
        }
    }
    Ok(resolved)
}

pub struct TableResolver<M = ()> {
    catalog: SchemaCatalog,
    metadata: M,
    raw_tables: Vec<RawTable>,
    resolved: OnceCell<ResolvedSet>,
}

impl<M> TableResolver<M> {
    /// Reads `source` through `reader` and keeps its raw tables for later
    /// resolution.
    pub fn open<R>(catalog: SchemaCatalog, reader: &R, source: &Path) -> Result<Self>
    where
        R: TableReader<Metadata = M> + ?Sized,
    {
        let (metadata, raw_tables) = reader.read(source).map_err(|error| TableError::Reader {
            source_path: source.to_path_buf(),
            error,
        })?;
        debug!("Read {} raw table(s) from {:?}", raw_tables.len(), source);
        Ok(Self::from_parts(catalog, metadata, raw_tables))
    }

    pub fn from_parts(catalog: SchemaCatalog, metadata: M, raw_tables: Vec<RawTable>) -> Self {
        Self {
            catalog,
            metadata,
            raw_tables,
            resolved: OnceCell::new(),
        }
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub fn raw_tables(&self) -> &[RawTable] {
        &self.raw_tables
    }

    pub fn is_built(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// The whole resolved set, building it on first use. A failed build is
    /// not cached.
    pub fn resolved(&self) -> Result<&ResolvedSet> {
        if let Some(resolved) = self.resolved.get() {
            return Ok(resolved);
        }
        let built = build_all(&self.raw_tables, &self.catalog)?;
        info!(
            "Resolved {} table(s) from {} raw table(s)",
            built.len(),
            self.raw_tables.len()
        );
        Ok(self.resolved.get_or_init(|| built))
    }

    /// Looks up a resolved table by schema name. Absent names are reported as
    /// [`Lookup::NotFound`]; only a failing build is an error.
    pub fn get(&self, name: &str) -> Result<Lookup<'_>> {
        Ok(match self.resolved()?.get(name) {
            Some(table) => Lookup::Found(table),
            None => Lookup::NotFound,
        })
    }

    pub fn schema_names(&self) -> Result<Vec<&str>> {
        Ok(self.resolved()?.names().collect())
    }

    pub fn into_resolved(self) -> Result<ResolvedSet> {
        match self.resolved.into_inner() {
            Some(resolved) => Ok(resolved),
            None => build_all(&self.raw_tables, &self.catalog),
        }
    }
}
