//! googlesearchconsole_sitemap
//!
//! Submitted sitemaps of every site in the account. A `site_url` qualifier
//! keeps only that site; a site missing from the account yields no rows.

use super::{Projector, Quals, RowSink};
use crate::connection::Connection;
use crate::gcp::searchconsole;
use anyhow::Result;
use serde_json::json;

pub async fn list(
    conn: &Connection,
    projector: &Projector<'_>,
    quals: &Quals,
    sink: &mut dyn RowSink,
) -> Result<()> {
    let client = conn.client().await?;

    let wanted = quals.get("site_url");
    let sites: Vec<String> = searchconsole::list_sites(client)
        .await
        .inspect_err(|e| tracing::error!("api_error: list sites: {}", e))?
        .iter()
        .filter_map(|s| s.get("siteUrl").and_then(|v| v.as_str()))
        .filter(|site| wanted.map_or(true, |w| w == *site))
        .map(String::from)
        .collect();

    if sites.is_empty() {
        if let Some(site_url) = wanted {
            tracing::debug!(site_url, "Site not in account, no sitemaps");
        }
    }

    for site_url in &sites {
        let sitemaps = searchconsole::list_sitemaps(client, site_url)
            .await
            .inspect_err(|e| tracing::error!(site_url = %site_url, "api_error: list sitemaps: {}", e))?;

        for sitemap in sitemaps {
            sink.push(projector.row(&json!({
                "siteUrl": site_url,
                "sitemap": sitemap,
            })))?;
        }
    }
    Ok(())
}
