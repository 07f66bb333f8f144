//! googlesearchconsole_pagespeed_analysis and
//! googlesearchconsole_pagespeed_analysis_aggregated

use super::{entry_item, Projector, Quals, Row, RowSink};
use crate::batch::fan_out;
use crate::connection::Connection;
use crate::gcp::pagespeed::{run_pagespeed, Strategy, ORIGIN_FIELDS, PAGE_FIELDS};
use crate::sitemap::{fetch_sitemap, SitemapEntry};
use anyhow::Result;
use serde_json::{json, Value};

/// Strategy requested by the `strategy` qualifier, or the configured default.
///
/// The second value is what the `strategy` column reports. `None` when the
/// qualifier is not a known strategy.
fn resolve_strategy(conn: &Connection, quals: &Quals) -> Option<(Strategy, String)> {
    let requested = quals
        .get("strategy")
        .unwrap_or(conn.config().default_strategy.as_str());

    match Strategy::parse(requested) {
        Some(strategy) => Some((strategy, requested.to_string())),
        None => {
            tracing::error!(
                strategy = requested,
                "validation_error: strategy must be 'desktop' or 'mobile'"
            );
            None
        }
    }
}

fn analysis_item(entry: &SitemapEntry, strategy: &str, analysis: Option<Value>) -> Result<Value> {
    let mut item = entry_item(entry, "analysis", analysis)?;
    if let Some(map) = item.as_object_mut() {
        map.insert("strategy".to_string(), json!(strategy));
    }
    Ok(item)
}

pub async fn list_analyses(
    conn: &Connection,
    projector: &Projector<'_>,
    quals: &Quals,
    sink: &mut dyn RowSink,
) -> Result<()> {
    let Some((strategy, label)) = resolve_strategy(conn, quals) else {
        return Ok(());
    };
    let sitemap_url = quals.equals("sitemap_url");

    let entries = fetch_sitemap(conn.http(), sitemap_url)
        .await
        .inspect_err(|e| tracing::error!(sitemap_url, "sitemap_error: {}", e))?;

    let client = conn.client().await?.clone();
    let collated = fan_out(entries, &conn.config().batch_options(), move |page_url| {
        let client = client.clone();
        async move { run_pagespeed(&client, &page_url, strategy, PAGE_FIELDS).await }
    })
    .await;

    let analysed = collated.iter().filter(|c| c.result.is_some()).count();
    tracing::info!(
        pages = collated.len(),
        analysed,
        strategy = %strategy,
        "Analysed sitemap pages"
    );

    for c in collated {
        sink.push(projector.row(&analysis_item(&c.entry, &label, c.result)?))?;
    }
    Ok(())
}

pub async fn get_analysis(
    conn: &Connection,
    projector: &Projector<'_>,
    quals: &Quals,
) -> Result<Option<Row>> {
    let Some((strategy, label)) = resolve_strategy(conn, quals) else {
        return Ok(None);
    };
    let loc = quals.equals("loc");

    let client = conn.client().await?;
    let analysis = run_pagespeed(client, loc, strategy, PAGE_FIELDS)
        .await
        .inspect_err(|e| tracing::error!(loc, "api_error: run pagespeed: {}", e))?;

    let item = analysis_item(&SitemapEntry::new(loc), &label, Some(analysis))?;
    Ok(Some(projector.row(&item)))
}

/// Origin-level field data for a whole site: a single row
pub async fn list_aggregated(
    conn: &Connection,
    projector: &Projector<'_>,
    quals: &Quals,
    sink: &mut dyn RowSink,
) -> Result<()> {
    let Some((strategy, label)) = resolve_strategy(conn, quals) else {
        return Ok(());
    };
    let site_url = quals.equals("site_url");

    let client = conn.client().await?;
    let analysis = run_pagespeed(client, site_url, strategy, ORIGIN_FIELDS)
        .await
        .inspect_err(|e| tracing::error!(site_url, "api_error: run pagespeed: {}", e))?;

    sink.push(projector.row(&json!({
        "strategy": label,
        "analysis": analysis,
    })))
}
