//! Error types for schema matching, table construction, and catalog loading.

use std::path::PathBuf;

use itertools::Itertools;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TableError>;

#[derive(Debug, Error)]
pub enum TableError {
    /// The header's key set equals no schema in the catalog. `expected` holds
    /// the keys of the last schema compared and is only a diagnostic hint.
    #[error(
        "expected column structure [{}], found [{}]",
        .expected.iter().join(", "),
        .header.iter().join(", ")
    )]
    SchemaMismatch {
        header: Vec<String>,
        expected: Vec<String>,
    },

    #[error("column '{key}' is not defined by schema '{schema}'")]
    UnknownColumn { key: String, schema: String },

    #[error("row {row} of table '{schema}' has {found} field(s) but the header has {expected}")]
    RowWidth {
        schema: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("reading tables from {source_path:?} failed: {error:#}")]
    Reader {
        source_path: PathBuf,
        error: anyhow::Error,
    },

    #[error("invalid schema catalog: {0}")]
    Catalog(String),

    #[error("I/O error on {path:?}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("parsing catalog YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("parsing catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}
