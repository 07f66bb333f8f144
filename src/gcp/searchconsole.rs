//! Search Console API
//!
//! Sites, sitemaps and URL inspection.

use super::client::GscClient;
use anyhow::Result;
use serde_json::{json, Value};

/// List every site (property) visible to the credentials
pub async fn list_sites(client: &GscClient) -> Result<Vec<Value>> {
    let url = client.webmasters_url("sites");
    let response = client.search_console_get(&url).await?;
    Ok(items_at(&response, "siteEntry"))
}

/// Get a single site
pub async fn get_site(client: &GscClient, site_url: &str) -> Result<Value> {
    let url = client.site_url(site_url, "");
    client.search_console_get(&url).await
}

/// List the sitemaps submitted for a site
pub async fn list_sitemaps(client: &GscClient, site_url: &str) -> Result<Vec<Value>> {
    let url = client.site_url(site_url, "sitemaps");
    let response = client.search_console_get(&url).await?;
    Ok(items_at(&response, "sitemap"))
}

/// Inspect the index status of one page within a site
///
/// Returns the `inspectionResult` object (null if the API omitted it).
pub async fn inspect_url(client: &GscClient, page_url: &str, site_url: &str) -> Result<Value> {
    let url = client.url_inspection_url();
    let body = json!({
        "inspectionUrl": page_url,
        "siteUrl": site_url,
    });

    let mut response = client.search_console_post(&url, &body).await?;
    Ok(response
        .get_mut("inspectionResult")
        .map(Value::take)
        .unwrap_or(Value::Null))
}

fn items_at(response: &Value, key: &str) -> Vec<Value> {
    response
        .get(key)
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}
