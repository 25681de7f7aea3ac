//! Schema catalog: the declarative description of every known table shape.
//!
//! A catalog is an ordered list of named [`ColumnSpec`]s. Each spec maps the
//! raw column keys an instrument writes into a table header onto a display
//! name and the numeric type the column should be coerced to. Matching is by
//! exact key-set equality and walks the catalog in order, so when two schemas
//! share a key set the one declared first wins.
//!
//! Catalogs are authored as YAML or JSON documents, for example:
//!
//! ```yaml
//! peaks:
//!   RT: [retention_time, float]
//!   Area: [area, float]
//! ```

use std::{
    collections::HashSet,
    fmt,
    fs,
    marker::PhantomData,
    path::Path,
    str::FromStr,
};

use serde::{
    Deserialize, Deserializer,
    de::{self, MapAccess, Visitor},
};

use crate::error::{Result, TableError};

/// Type names are matched case-insensitively: `float` (`float64`, `f64`,
/// `double`) or `integer` (`int`, `int64`, `i64`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum NumericType {
    Integer,
    Float,
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericType::Integer => write!(f, "integer"),
            NumericType::Float => write!(f, "float"),
        }
    }
}

impl FromStr for NumericType {
    type Err = TableError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" | "int64" | "i64" => Ok(NumericType::Integer),
            "float" | "float64" | "f64" | "double" => Ok(NumericType::Float),
            other => Err(TableError::Catalog(format!("unknown numeric type '{other}'"))),
        }
    }
}

impl TryFrom<String> for NumericType {
    type Error = TableError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Display name and numeric type for one raw column key. Serialized as a
/// two element sequence: `[display_name, type]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "(String, NumericType)")]
pub struct ColumnDef {
    pub display_name: String,
    pub numeric_type: NumericType,
}

impl ColumnDef {
    pub fn new(display_name: impl Into<String>, numeric_type: NumericType) -> Self {
        Self {
            display_name: display_name.into(),
            numeric_type,
        }
    }
}

impl From<(String, NumericType)> for ColumnDef {
    fn from((display_name, numeric_type): (String, NumericType)) -> Self {
        Self {
            display_name,
            numeric_type,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSpec {
    columns: Vec<(String, ColumnDef)>,
}

impl ColumnSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the definition for `key`.
    pub fn column(
        mut self,
        key: impl Into<String>,
        display_name: impl Into<String>,
        numeric_type: NumericType,
    ) -> Self {
        let key = key.into();
        let def = ColumnDef::new(display_name, numeric_type);
        match self.columns.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = def,
            None => self.columns.push((key, def)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, def)| def)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnDef)> {
        self.columns.iter().map(|(key, def)| (key.as_str(), def))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// True when the header's key set equals this spec's key set. Order and
    /// repeated header keys are ignored.
    pub fn matches_header(&self, header: &[String]) -> bool {
        let expected: HashSet<&str> = self.keys().collect();
        let found: HashSet<&str> = header.iter().map(String::as_str).collect();
        expected == found
    }
}

impl<'de> Deserialize<'de> for ColumnSpec {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let columns = deserializer.deserialize_map(OrderedEntries::new("column key"))?;
        if let Some(key) = first_duplicate(&columns) {
            return Err(de::Error::custom(format!("duplicate column key '{key}'")));
        }
        Ok(ColumnSpec { columns })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCatalog {
    schemas: Vec<(String, ColumnSpec)>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a schema. A name that is already present keeps its position
    /// and has its spec replaced.
    pub fn with_schema(mut self, name: impl Into<String>, spec: ColumnSpec) -> Self {
        let name = name.into();
        match self.schemas.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = spec,
            None => self.schemas.push((name, spec)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&ColumnSpec> {
        self.schemas
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, spec)| spec)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnSpec)> {
        self.schemas.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Returns the first schema, in catalog order, whose key set equals the
    /// header's key set.
    pub fn match_header(&self, header: &[String]) -> Result<(&str, &ColumnSpec)> {
        for (name, spec) in &self.schemas {
            if spec.matches_header(header) {
                return Ok((name.as_str(), spec));
            }
        }
        let expected = self
            .schemas
            .last()
            .map(|(_, spec)| spec.keys().map(str::to_string).collect())
            .unwrap_or_default();
        Err(TableError::SchemaMismatch {
            header: header.to_vec(),
            expected,
        })
    }

    /// Loads a catalog document, picking the format from the file extension:
    /// `.json` is read as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|error| TableError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        let catalog = match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&raw)?,
            _ => Self::from_yaml_str(&raw)?,
        };
        log::debug!(
            "Loaded {} schema(s) from catalog {:?}",
            catalog.len(),
            path
        );
        Ok(catalog)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let document: CatalogDocument = serde_yaml::from_str(input)?;
        Self::from_entries(document.0)
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        let document: CatalogDocument = serde_json::from_str(input)?;
        Self::from_entries(document.0)
    }

    fn from_entries(schemas: Vec<(String, ColumnSpec)>) -> Result<Self> {
        if let Some(name) = first_duplicate(&schemas) {
            return Err(TableError::Catalog(format!("duplicate schema name '{name}'")));
        }
        Ok(SchemaCatalog { schemas })
    }
}

/// Schemas in document order, before duplicate names are checked.
struct CatalogDocument(Vec<(String, ColumnSpec)>);

impl<'de> Deserialize<'de> for CatalogDocument {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let schemas = deserializer.deserialize_map(OrderedEntries::new("schema name"))?;
        Ok(CatalogDocument(schemas))
    }
}

fn first_duplicate<V>(entries: &[(String, V)]) -> Option<&str> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .map(|(key, _)| key.as_str())
        .find(|key| !seen.insert(*key))
}

/// Collects a map into a vector in document order, keeping repeated keys.
struct OrderedEntries<V> {
    what: &'static str,
    marker: PhantomData<V>,
}

impl<V> OrderedEntries<V> {
    fn new(what: &'static str) -> Self {
        Self {
            what,
            marker: PhantomData,
        }
    }
}

impl<'de, V> Visitor<'de> for OrderedEntries<V>
where
    V: Deserialize<'de>,
{
    type Value = Vec<(String, V)>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a map keyed by {}", self.what)
    }

    fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries: Vec<(String, V)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(entry) = access.next_entry::<String, V>()? {
            entries.push(entry);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn peaks_catalog() -> SchemaCatalog {
        SchemaCatalog::new().with_schema(
            "peaks",
            ColumnSpec::new()
                .column("RT", "retention_time", NumericType::Float)
                .column("Area", "area", NumericType::Float),
        )
    }

    #[test]
    fn match_header_ignores_key_order() {
        let catalog = peaks_catalog();
        let (name, spec) = catalog.match_header(&header(&["Area", "RT"])).unwrap();
        assert_eq!(name, "peaks");
        assert_eq!(spec.len(), 2);
    }

    #[test]
    fn match_header_rejects_subset_and_superset() {
        let catalog = peaks_catalog();
        assert!(catalog.match_header(&header(&["RT"])).is_err());
        assert!(catalog.match_header(&header(&["RT", "Area", "Height"])).is_err());
    }

    #[test]
    fn match_header_prefers_first_schema_with_equal_key_set() {
        let spec = ColumnSpec::new().column("RT", "rt", NumericType::Float);
        let catalog = SchemaCatalog::new()
            .with_schema("first", spec.clone())
            .with_schema("second", spec);
        let (name, _) = catalog.match_header(&header(&["RT"])).unwrap();
        assert_eq!(name, "first");
    }

    #[test]
    fn mismatch_reports_last_schema_keys() {
        let catalog = peaks_catalog().with_schema(
            "compounds",
            ColumnSpec::new().column("Name", "name", NumericType::Float),
        );
        match catalog.match_header(&header(&["Foo", "Bar"])) {
            Err(TableError::SchemaMismatch { header, expected }) => {
                assert_eq!(header, vec!["Foo", "Bar"]);
                assert_eq!(expected, vec!["Name"]);
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }

    #[test]
    fn empty_catalog_mismatch_has_no_expected_keys() {
        match SchemaCatalog::new().match_header(&header(&["RT"])) {
            Err(TableError::SchemaMismatch { expected, .. }) => assert!(expected.is_empty()),
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }

    #[test]
    fn yaml_catalog_preserves_document_order() {
        let catalog = SchemaCatalog::from_yaml_str(
            "zeta:\n  A: [a, float]\nalpha:\n  A: [first_a, int]\n  B: [b, float64]\n",
        )
        .unwrap();
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        let alpha = catalog.get("alpha").unwrap();
        assert_eq!(alpha.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(
            alpha.get("A"),
            Some(&ColumnDef::new("first_a", NumericType::Integer))
        );
    }

    #[test]
    fn json_catalog_rejects_duplicate_schema_names() {
        let err = SchemaCatalog::from_json_str(
            r#"{"peaks": {"RT": ["rt", "float"]}, "peaks": {"RT": ["rt", "float"]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TableError::Catalog(ref message) if message.contains("'peaks'")));
    }

    #[test]
    fn numeric_type_parses_aliases() {
        assert_eq!("Int64".parse::<NumericType>().unwrap(), NumericType::Integer);
        assert_eq!("double".parse::<NumericType>().unwrap(), NumericType::Float);
        assert!(matches!(
            "decimal".parse::<NumericType>(),
            Err(TableError::Catalog(_))
        ));
        assert_eq!(
            NumericType::try_from(" FLOAT ".to_string()).unwrap(),
            NumericType::Float
        );
    }
}
