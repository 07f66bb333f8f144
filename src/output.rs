//! Row output
//!
//! Sinks that write rows to a writer as they arrive.

use crate::table::{Row, RowSink};
use anyhow::Result;
use std::io::Write;

/// One JSON object per line
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
    rows: usize,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, rows: 0 }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl<W: Write + Send> RowSink for JsonLinesSink<W> {
    fn push(&mut self, row: Row) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &row)?;
        self.writer.write_all(b"\n")?;
        self.rows += 1;
        Ok(())
    }
}

/// A YAML document per row
pub struct YamlSink<W: Write + Send> {
    writer: W,
    rows: usize,
}

impl<W: Write + Send> YamlSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, rows: 0 }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl<W: Write + Send> RowSink for YamlSink<W> {
    fn push(&mut self, row: Row) -> Result<()> {
        self.writer.write_all(b"---\n")?;
        serde_yaml::to_writer(&mut self.writer, &row)?;
        self.rows += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{get_table, Projector, Quals};
    use serde_json::json;

    fn site_row(site: &str) -> Row {
        let table = get_table("googlesearchconsole_site").unwrap();
        let quals = Quals::new();
        Projector::new(table, &quals, Some("p".to_string()))
            .row(&json!({"siteUrl": site, "permissionLevel": "siteOwner"}))
    }

    #[test]
    fn test_json_lines() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.push(site_row("https://a.example/")).unwrap();
        sink.push(site_row("https://b.example/")).unwrap();
        assert_eq!(sink.rows(), 2);

        let out = String::from_utf8(sink.writer).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(r#"{"site_url":"https://a.example/""#));
    }

    #[test]
    fn test_yaml_documents() {
        let mut sink = YamlSink::new(Vec::new());
        sink.push(site_row("https://a.example/")).unwrap();

        let out = String::from_utf8(sink.writer).unwrap();
        assert!(out.starts_with("---\n"));
        assert!(out.contains("site_url: https://a.example/"));
        assert!(out.contains("project: p"));
    }
}
