//! Table abstraction layer
//!
//! Every queryable resource is a table: a JSON definition (columns, key
//! columns) plus a list and optionally a get function.
//!
//! # Architecture
//!
//! - [`registry`] - Loads table definitions from embedded JSON
//! - [`projector`] - Maps row items onto columns
//! - [`site`], [`sitemap`], [`indexing_status`], [`pagespeed`] - list/get
//!   functions per table family
//!
//! # Example
//!
//! ```ignore
//! use gscq::{Config, Connection, Quals, Row};
//!
//! async fn pages(conn: &Connection) -> anyhow::Result<Vec<Row>> {
//!     let quals = Quals::new()
//!         .with("site_url", "sc-domain:example.com")
//!         .with("sitemap_url", "https://example.com/sitemap.xml");
//!     let mut rows = Vec::new();
//!     conn.list("googlesearchconsole_indexing_status", &quals, &mut rows).await?;
//!     Ok(rows)
//! }
//! ```

mod indexing_status;
mod pagespeed;
pub mod projector;
pub mod registry;
mod site;
mod sitemap;

pub use projector::{Projector, Row};
pub use registry::{get_all_table_names, get_table, ColumnDef, ColumnType, TableDef};

use crate::connection::Connection;
use anyhow::{anyhow, Result};
use std::collections::HashMap;

/// Equality qualifiers of a query, keyed by column name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quals {
    values: HashMap<String, String>,
}

impl Quals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: &str) {
        self.values.insert(column.to_string(), value.to_string());
    }

    /// Value of a qualifier; empty values count as absent
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .get(column)
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Value of a qualifier, or `""` when absent
    pub fn equals(&self, column: &str) -> &str {
        self.get(column).unwrap_or("")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Quals {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Receives the rows of a list, in output order
pub trait RowSink: Send {
    fn push(&mut self, row: Row) -> Result<()>;
}

impl RowSink for Vec<Row> {
    fn push(&mut self, row: Row) -> Result<()> {
        Vec::push(self, row);
        Ok(())
    }
}

/// Stream every row of `table` matching `quals` into `sink`
///
/// Missing required qualifiers and invalid qualifier values are logged and
/// yield no rows; upstream failures are returned as errors.
pub async fn list(
    conn: &Connection,
    table: &str,
    quals: &Quals,
    sink: &mut dyn RowSink,
) -> Result<()> {
    let Some(def) = get_table(table) else {
        return Err(anyhow!("Unknown table: {}", table));
    };

    if let Some(missing) = def.missing_list_key(quals) {
        tracing::error!(
            table = %def.name,
            "validation_error: {} must be specified",
            missing
        );
        return Ok(());
    }

    let project = resolve_project(conn, def).await?;
    let projector = Projector::new(def, quals, project);

    match table {
        "googlesearchconsole_site" => site::list(conn, &projector, sink).await,
        "googlesearchconsole_sitemap" => sitemap::list(conn, &projector, quals, sink).await,
        "googlesearchconsole_indexing_status" => {
            indexing_status::list(conn, &projector, quals, sink).await
        }
        "googlesearchconsole_pagespeed_analysis" => {
            pagespeed::list_analyses(conn, &projector, quals, sink).await
        }
        "googlesearchconsole_pagespeed_analysis_aggregated" => {
            pagespeed::list_aggregated(conn, &projector, quals, sink).await
        }
        _ => Err(anyhow!("Table {} has no list", table)),
    }
}

/// Fetch the single row of `table` identified by `quals`
pub async fn get(conn: &Connection, table: &str, quals: &Quals) -> Result<Option<Row>> {
    let Some(def) = get_table(table) else {
        return Err(anyhow!("Unknown table: {}", table));
    };

    if !def.supports_get() {
        return Err(anyhow!("Table {} does not support get", table));
    }

    if let Some(missing) = def.missing_get_key(quals) {
        tracing::error!(
            table = %def.name,
            "validation_error: {} must be specified",
            missing
        );
        return Ok(None);
    }

    let project = resolve_project(conn, def).await?;
    let projector = Projector::new(def, quals, project);

    match table {
        "googlesearchconsole_site" => site::get(conn, &projector, quals).await,
        "googlesearchconsole_indexing_status" => {
            indexing_status::get(conn, &projector, quals).await
        }
        "googlesearchconsole_pagespeed_analysis" => {
            pagespeed::get_analysis(conn, &projector, quals).await
        }
        _ => Err(anyhow!("Table {} does not support get", table)),
    }
}

/// Row item for a sitemap entry: its fields plus `result` under `key`
fn entry_item(
    entry: &crate::sitemap::SitemapEntry,
    key: &str,
    result: Option<serde_json::Value>,
) -> Result<serde_json::Value> {
    let mut item = serde_json::to_value(entry)?;
    if let Some(map) = item.as_object_mut() {
        map.insert(key.to_string(), result.unwrap_or(serde_json::Value::Null));
    }
    Ok(item)
}

async fn resolve_project(conn: &Connection, def: &TableDef) -> Result<Option<String>> {
    if def.has_project_column() {
        conn.project().await
    } else {
        Ok(None)
    }
}
