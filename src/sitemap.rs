//! Sitemap Reader
//!
//! Fetches a sitemap over HTTP and parses it into an ordered list of entries.
//! Sitemap index documents are expanded one level: child sitemaps are
//! fetched concurrently and their entries concatenated in index order.

use crate::gcp::http::HttpClient;
use anyhow::{bail, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;

/// One `<url>` entry of a sitemap, in document order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapEntry {
    pub loc: String,
    pub change_freq: Option<String>,
    pub last_mod: Option<String>,
    pub priority: Option<f64>,
}

impl SitemapEntry {
    pub fn new(loc: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            change_freq: None,
            last_mod: None,
            priority: None,
        }
    }
}

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq)]
pub enum SitemapDocument {
    /// `<urlset>`: page entries
    UrlSet(Vec<SitemapEntry>),
    /// `<sitemapindex>`: locations of child sitemaps
    Index(Vec<String>),
}

/// Fetch and parse a sitemap, expanding a sitemap index into its entries
pub async fn fetch_sitemap(http: &HttpClient, url: &str) -> Result<Vec<SitemapEntry>> {
    url::Url::parse(url).with_context(|| format!("Invalid sitemap URL: {}", url))?;

    let body = http.get_text(url).await?;
    let document =
        parse_sitemap(&body).with_context(|| format!("Failed to parse sitemap {}", url))?;

    match document {
        SitemapDocument::UrlSet(entries) => {
            tracing::debug!(sitemap = %url, entries = entries.len(), "Sitemap loaded");
            Ok(entries)
        }
        SitemapDocument::Index(children) => {
            tracing::debug!(sitemap = %url, children = children.len(), "Sitemap index loaded");
            let fetches = children.iter().map(|child| fetch_child(http, child));
            let parts = futures::future::try_join_all(fetches).await?;
            Ok(parts.into_iter().flatten().collect())
        }
    }
}

async fn fetch_child(http: &HttpClient, url: &str) -> Result<Vec<SitemapEntry>> {
    let body = http.get_text(url).await?;
    match parse_sitemap(&body).with_context(|| format!("Failed to parse sitemap {}", url))? {
        SitemapDocument::UrlSet(entries) => Ok(entries),
        SitemapDocument::Index(_) => {
            tracing::warn!(sitemap = %url, "Nested sitemap index ignored");
            Ok(Vec::new())
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    None,
    Loc,
    ChangeFreq,
    LastMod,
    Priority,
}

/// Parse sitemap XML
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root: Option<bool> = None; // Some(true) = index
    let mut entries = Vec::new();
    let mut children = Vec::new();
    let mut current: Option<SitemapEntry> = None;
    let mut field = Field::None;
    let mut nested = 0usize;

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("Malformed XML at byte {}", reader.buffer_position()))?;

        match event {
            Event::Start(e) => {
                let name = e.local_name();
                let name = name.as_ref();
                if current.is_some() && (nested > 0 || field_for(name).is_none()) {
                    // Extension elements (image:, video:, news:) may carry their own <loc>
                    nested += 1;
                    field = Field::None;
                    continue;
                }
                match name {
                    b"urlset" if root.is_none() => root = Some(false),
                    b"sitemapindex" if root.is_none() => root = Some(true),
                    b"url" | b"sitemap" => current = Some(SitemapEntry::new(String::new())),
                    _ => field = field_for(name).unwrap_or(Field::None),
                }
            }
            Event::Text(e) => {
                let text = e.unescape().context("Invalid XML text")?;
                assign(&mut current, field, &text);
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                let text = String::from_utf8_lossy(&raw);
                assign(&mut current, field, text.trim());
            }
            Event::End(_) if nested > 0 => nested -= 1,
            Event::End(e) => match e.local_name().as_ref() {
                b"url" => {
                    if let Some(entry) = current.take().filter(|e| !e.loc.is_empty()) {
                        entries.push(entry);
                    }
                }
                b"sitemap" => {
                    if let Some(entry) = current.take().filter(|e| !e.loc.is_empty()) {
                        children.push(entry.loc);
                    }
                }
                _ => field = Field::None,
            },
            Event::Eof => break,
            _ => {}
        }
    }

    match root {
        Some(false) => Ok(SitemapDocument::UrlSet(entries)),
        Some(true) => Ok(SitemapDocument::Index(children)),
        None => bail!("Document has no <urlset> or <sitemapindex> root"),
    }
}

fn field_for(name: &[u8]) -> Option<Field> {
    match name {
        b"loc" => Some(Field::Loc),
        b"changefreq" => Some(Field::ChangeFreq),
        b"lastmod" => Some(Field::LastMod),
        b"priority" => Some(Field::Priority),
        _ => None,
    }
}

fn assign(current: &mut Option<SitemapEntry>, field: Field, text: &str) {
    let Some(entry) = current.as_mut() else {
        return;
    };
    if text.is_empty() {
        return;
    }

    match field {
        Field::Loc => entry.loc = text.to_string(),
        Field::ChangeFreq => entry.change_freq = Some(text.to_string()),
        Field::LastMod => entry.last_mod = Some(text.to_string()),
        Field::Priority => match text.parse::<f64>() {
            Ok(p) => entry.priority = Some(p),
            Err(_) => tracing::debug!(value = %text, "Ignoring unparsable sitemap priority"),
        },
        Field::None => {}
    }
}
