#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use gcms_tables::{ColumnSpec, NumericType, RawTable, SchemaCatalog};
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Catalog with a single two-column `peaks` table.
pub fn peaks_catalog() -> SchemaCatalog {
    SchemaCatalog::new().with_schema(
        "peaks",
        ColumnSpec::new()
            .column("RT", "retention_time", NumericType::Float)
            .column("Area", "area", NumericType::Float),
    )
}

pub fn raw(rows: &[&[&str]]) -> RawTable {
    RawTable::new(rows.iter().map(|row| row.iter().copied()))
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }
}
