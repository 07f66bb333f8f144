//! Table Registry - Load table definitions from JSON
//!
//! All table definitions are embedded from `src/tables/*.json` and looked up
//! by name by the rest of the crate.

use super::Quals;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Embedded table JSON files (compiled into the binary)
const TABLE_FILES: &[&str] = &[
    include_str!("../tables/searchconsole.json"),
    include_str!("../tables/pagespeed.json"),
];

/// Column value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Int,
    Double,
    Bool,
    Timestamp,
    Json,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::Timestamp => "timestamp",
            Self::Json => "json",
        };
        f.write_str(s)
    }
}

/// Where a column's value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnSource {
    /// Dot path into the row item
    #[default]
    Item,
    /// The equality qualifier of the same name
    Qual,
    /// The project of the connection's credentials
    Project,
}

/// Column definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub source: ColumnSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Require {
    Required,
    Optional,
}

/// Key column (qualifier) accepted by a list or get
#[derive(Debug, Clone, Deserialize)]
pub struct KeyColumn {
    pub name: String,
    pub require: Require,
}

/// Table definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct TableDef {
    #[serde(skip)]
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub list_key_columns: Vec<KeyColumn>,
    /// Empty when the table has no get
    #[serde(default)]
    pub get_key_columns: Vec<KeyColumn>,
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    pub fn supports_get(&self) -> bool {
        !self.get_key_columns.is_empty()
    }

    pub fn has_project_column(&self) -> bool {
        self.columns
            .iter()
            .any(|c| c.source == ColumnSource::Project)
    }

    /// First required list qualifier missing from `quals`
    pub fn missing_list_key(&self, quals: &Quals) -> Option<&str> {
        missing_key(&self.list_key_columns, quals)
    }

    /// First required get qualifier missing from `quals`
    pub fn missing_get_key(&self, quals: &Quals) -> Option<&str> {
        missing_key(&self.get_key_columns, quals)
    }
}

fn missing_key<'a>(keys: &'a [KeyColumn], quals: &Quals) -> Option<&'a str> {
    keys.iter()
        .filter(|k| k.require == Require::Required)
        .find(|k| quals.get(&k.name).is_none())
        .map(|k| k.name.as_str())
}

/// Root structure of tables/*.json
#[derive(Debug, Clone, Deserialize)]
struct TableConfig {
    #[serde(default)]
    tables: HashMap<String, TableDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<HashMap<String, TableDef>> = OnceLock::new();

/// Get the table registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static HashMap<String, TableDef> {
    REGISTRY.get_or_init(|| {
        let mut tables = HashMap::new();

        for content in TABLE_FILES {
            let partial: TableConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded table JSON: {}", e));
            for (name, mut def) in partial.tables {
                def.name = name.clone();
                tables.insert(name, def);
            }
        }

        tables
    })
}

/// Get a table definition by name
pub fn get_table(name: &str) -> Option<&'static TableDef> {
    get_registry().get(name)
}

/// All table names, sorted
pub fn get_all_table_names() -> Vec<&'static str> {
    let mut names: Vec<_> = get_registry().keys().map(|s| s.as_str()).collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_loads_all_tables() {
        assert_eq!(
            get_all_table_names(),
            vec![
                "googlesearchconsole_indexing_status",
                "googlesearchconsole_pagespeed_analysis",
                "googlesearchconsole_pagespeed_analysis_aggregated",
                "googlesearchconsole_site",
                "googlesearchconsole_sitemap",
            ]
        );
    }

    #[test]
    fn test_every_table_has_project_column() {
        for name in get_all_table_names() {
            let table = get_table(name).unwrap();
            assert!(table.has_project_column(), "{} lacks project", name);
            assert_eq!(table.name, name);
        }
    }

    #[test]
    fn test_item_columns_have_paths() {
        for name in get_all_table_names() {
            for column in &get_table(name).unwrap().columns {
                if column.source == ColumnSource::Item {
                    assert!(column.path.is_some(), "{}.{} has no path", name, column.name);
                }
            }
        }
    }

    #[test]
    fn test_column_names_are_unique() {
        for name in get_all_table_names() {
            let columns = &get_table(name).unwrap().columns;
            let mut names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), columns.len(), "duplicate column in {}", name);
        }
    }

    #[test]
    fn test_missing_required_keys() {
        let table = get_table("googlesearchconsole_indexing_status").unwrap();
        let quals = Quals::new().with("site_url", "https://example.com/");
        assert_eq!(table.missing_list_key(&quals), Some("sitemap_url"));

        let quals = quals.with("sitemap_url", "https://example.com/sitemap.xml");
        assert_eq!(table.missing_list_key(&quals), None);
        assert_eq!(table.missing_get_key(&quals), Some("loc"));
    }

    #[test]
    fn test_optional_keys_are_not_required() {
        let table = get_table("googlesearchconsole_pagespeed_analysis").unwrap();
        let quals = Quals::new().with("sitemap_url", "https://example.com/sitemap.xml");
        assert_eq!(table.missing_list_key(&quals), None);
    }

    #[test]
    fn test_get_support() {
        assert!(get_table("googlesearchconsole_site").unwrap().supports_get());
        assert!(!get_table("googlesearchconsole_sitemap").unwrap().supports_get());
    }
}
