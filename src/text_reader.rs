//! Reader for delimited text exports (e.g. the `RESULTS.CSV` an instrument
//! writes next to its binary data).
//!
//! The file is decoded with `encoding_rs` (UTF-8 unless told otherwise) and
//! split into tables at blank lines. Each block is parsed with the `csv`
//! crate without header handling, so the first row of a block becomes the
//! raw table's header and rows may differ in width.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::{resolver::TableReader, table::RawTable};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// Metadata the text reader reports alongside the raw tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub path: PathBuf,
    pub encoding: &'static str,
    pub table_count: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct DelimitedTextReader {
    delimiter: Option<u8>,
    encoding: &'static Encoding,
}

impl Default for DelimitedTextReader {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

impl DelimitedTextReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_encoding(mut self, label: &str) -> Result<Self> {
        self.encoding = resolve_encoding(Some(label))?;
        Ok(self)
    }
}

impl TableReader for DelimitedTextReader {
    type Metadata = SourceInfo;

    fn read(&self, source: &Path) -> Result<(SourceInfo, Vec<RawTable>)> {
        let bytes = fs::read(source).with_context(|| format!("Opening input file {source:?}"))?;
        let text = decode_bytes(&bytes, self.encoding)?;
        let delimiter = resolve_delimiter(source, self.delimiter);
        let tables = split_tables(&text, delimiter)
            .with_context(|| format!("Parsing delimited tables in {source:?}"))?;
        debug!(
            "Split {:?} into {} table(s) using delimiter {:?}",
            source,
            tables.len(),
            delimiter as char
        );
        let info = SourceInfo {
            path: source.to_path_buf(),
            encoding: self.encoding.name(),
            table_count: tables.len(),
        };
        Ok((info, tables))
    }
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

/// Splits `text` into blank-line separated blocks and parses each one.
pub fn split_tables(text: &str, delimiter: u8) -> Result<Vec<RawTable>> {
    let mut tables = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    for line in text.lines().chain(std::iter::once("")) {
        if !line.trim().is_empty() {
            block.push(line);
            continue;
        }
        if block.is_empty() {
            continue;
        }
        let table = parse_block(&block.join("\n"), delimiter)
            .with_context(|| format!("Table {}", tables.len() + 1))?;
        tables.push(table);
        block.clear();
    }
    Ok(tables)
}

fn parse_block(block: &str, delimiter: u8) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true)
        .from_reader(block.as_bytes());
    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", idx + 1))?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    Ok(RawTable::from(rows))
}
