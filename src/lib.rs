pub mod catalog;
pub mod data;
pub mod error;
pub mod resolver;
pub mod table;
pub mod text_reader;

use std::{env, sync::OnceLock};

use log::LevelFilter;

pub use crate::{
    catalog::{ColumnDef, ColumnSpec, NumericType, SchemaCatalog},
    data::{ColumnData, Value},
    error::{Result, TableError},
    resolver::{
        Lookup, ResolvedSet, TableReader, TableResolver, build_all, build_columns, match_schema,
        resolve_table,
    },
    table::{RawTable, ResolvedTable},
    text_reader::{DelimitedTextReader, SourceInfo},
};

static LOGGER: OnceLock<()> = OnceLock::new();

/// Installs `env_logger` once. Without `RUST_LOG` the crate logs at info.
pub fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("gcms_tables", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}
