//! Google API Client
//!
//! Combines authentication and HTTP functionality for the Search Console
//! and PageSpeed Insights APIs.

use super::auth::{GcpCredentials, TokenSource, PAGESPEED_SCOPES, SEARCH_CONSOLE_SCOPES};
use super::http::HttpClient;
use anyhow::Result;
use serde_json::Value;

/// Default Search Console API root
pub const SEARCH_CONSOLE_ENDPOINT: &str = "https://searchconsole.googleapis.com";

/// Default PageSpeed Insights API root
pub const PAGESPEED_ENDPOINT: &str = "https://pagespeedonline.googleapis.com";

/// API roots, overridable for testing against mock servers
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub search_console: String,
    pub pagespeed: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            search_console: SEARCH_CONSOLE_ENDPOINT.to_string(),
            pagespeed: PAGESPEED_ENDPOINT.to_string(),
        }
    }
}

/// Authenticated client for both Google APIs
#[derive(Clone)]
pub struct GscClient {
    search_console_auth: GcpCredentials,
    pagespeed_auth: GcpCredentials,
    pub http: HttpClient,
    pub endpoints: Endpoints,
}

impl GscClient {
    pub fn new(source: TokenSource, http: HttpClient, endpoints: Endpoints) -> Self {
        Self {
            search_console_auth: GcpCredentials::new(source.clone(), SEARCH_CONSOLE_SCOPES),
            pagespeed_auth: GcpCredentials::new(source, PAGESPEED_SCOPES),
            http,
            endpoints,
        }
    }

    /// GET against the Search Console API
    pub async fn search_console_get(&self, url: &str) -> Result<Value> {
        let token = self.search_console_auth.get_token().await?;
        match self.http.get(url, &token).await {
            Err(e) if is_unauthorized(&e) => {
                let token = self.search_console_auth.refresh_token().await?;
                self.http.get(url, &token).await
            }
            result => result,
        }
    }

    /// POST against the Search Console API
    pub async fn search_console_post(&self, url: &str, body: &Value) -> Result<Value> {
        let token = self.search_console_auth.get_token().await?;
        match self.http.post(url, &token, body).await {
            Err(e) if is_unauthorized(&e) => {
                let token = self.search_console_auth.refresh_token().await?;
                self.http.post(url, &token, body).await
            }
            result => result,
        }
    }

    /// GET against the PageSpeed Insights API
    pub async fn pagespeed_get(&self, url: &str) -> Result<Value> {
        let token = self.pagespeed_auth.get_token().await?;
        match self.http.get(url, &token).await {
            Err(e) if is_unauthorized(&e) => {
                let token = self.pagespeed_auth.refresh_token().await?;
                self.http.get(url, &token).await
            }
            result => result,
        }
    }

    // =========================================================================
    // Search Console API helpers
    // =========================================================================

    /// Build a Webmasters v3 URL
    pub fn webmasters_url(&self, path: &str) -> String {
        format!(
            "{}/webmasters/v3/{}",
            self.endpoints.search_console.trim_end_matches('/'),
            path
        )
    }

    /// Build a site-scoped Webmasters v3 URL (site URLs are path-encoded)
    pub fn site_url(&self, site_url: &str, resource: &str) -> String {
        let encoded = urlencoding::encode(site_url);
        if resource.is_empty() {
            self.webmasters_url(&format!("sites/{}", encoded))
        } else {
            self.webmasters_url(&format!("sites/{}/{}", encoded, resource))
        }
    }

    /// Build the URL Inspection endpoint
    pub fn url_inspection_url(&self) -> String {
        format!(
            "{}/v1/urlInspection/index:inspect",
            self.endpoints.search_console.trim_end_matches('/')
        )
    }

    // =========================================================================
    // PageSpeed Insights API helpers
    // =========================================================================

    /// Build the runPagespeed endpoint (without query string)
    pub fn run_pagespeed_url(&self) -> String {
        format!(
            "{}/pagespeedonline/v5/runPagespeed",
            self.endpoints.pagespeed.trim_end_matches('/')
        )
    }
}

/// A cached token rejected by the API is refreshed once and the call retried
fn is_unauthorized(error: &anyhow::Error) -> bool {
    error.to_string().contains("401")
}
