//! googlesearchconsole_indexing_status
//!
//! One row per page of a sitemap, with the URL inspection result for that
//! page. Inspections run through the batch fan-out; a page whose inspection
//! failed still gets a row, with null inspection columns.

use super::{entry_item, Projector, Quals, Row, RowSink};
use crate::batch::fan_out;
use crate::connection::Connection;
use crate::gcp::searchconsole;
use crate::sitemap::{fetch_sitemap, SitemapEntry};
use anyhow::Result;

pub async fn list(
    conn: &Connection,
    projector: &Projector<'_>,
    quals: &Quals,
    sink: &mut dyn RowSink,
) -> Result<()> {
    let site_url = quals.equals("site_url").to_string();
    let sitemap_url = quals.equals("sitemap_url");

    let entries = fetch_sitemap(conn.http(), sitemap_url)
        .await
        .inspect_err(|e| tracing::error!(sitemap_url, "sitemap_error: {}", e))?;

    let client = conn.client().await?.clone();
    let collated = fan_out(entries, &conn.config().batch_options(), move |page_url| {
        let client = client.clone();
        let site_url = site_url.clone();
        async move { searchconsole::inspect_url(&client, &page_url, &site_url).await }
    })
    .await;

    let inspected = collated.iter().filter(|c| c.result.is_some()).count();
    tracing::info!(
        pages = collated.len(),
        inspected,
        "Inspected sitemap pages"
    );

    for c in collated {
        sink.push(projector.row(&entry_item(&c.entry, "inspection", c.result)?))?;
    }
    Ok(())
}

pub async fn get(conn: &Connection, projector: &Projector<'_>, quals: &Quals) -> Result<Option<Row>> {
    let site_url = quals.equals("site_url");
    let loc = quals.equals("loc");

    let client = conn.client().await?;
    let inspection = searchconsole::inspect_url(client, loc, site_url)
        .await
        .inspect_err(|e| tracing::error!(loc, "api_error: inspect url: {}", e))?;

    let item = entry_item(&SitemapEntry::new(loc), "inspection", Some(inspection))?;
    Ok(Some(projector.row(&item)))
}
