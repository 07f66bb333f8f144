//! HTTP utilities for Google REST API calls

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut cut = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP client wrapper for Google API calls and plain document fetches
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with a per-request timeout
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("gscq/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make an authenticated GET request and parse the JSON response
    pub async fn get(&self, url: &str, token: &str) -> Result<Value> {
        tracing::debug!("GET {}", url);
        self.send_json(self.client.get(url).bearer_auth(token)).await
    }

    /// Make an authenticated POST request with a JSON body
    pub async fn post(&self, url: &str, token: &str, body: &Value) -> Result<Value> {
        tracing::debug!("POST {}", url);
        self.send_json(self.client.post(url).bearer_auth(token).json(body))
            .await
    }

    /// Fetch a document as text without authentication (sitemaps)
    pub async fn get_text(&self, url: &str) -> Result<String> {
        tracing::debug!("GET {} (document)", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            tracing::error!("Document fetch error: {} - {}", status, sanitize_for_log(&body));
            return Err(anyhow::anyhow!("Document request failed: {}", status));
        }

        Ok(body)
    }

    async fn send_json(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Only the sanitized/truncated body is logged
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(anyhow::anyhow!("API request failed: {}", status));
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).context("Failed to parse response JSON")
    }
}

/// Format an API error for display
/// Maps status codes to short messages instead of echoing raw API details
pub fn format_api_error(error: &anyhow::Error) -> String {
    let error_str = format!("{:#}", error);

    if error_str.contains("403") {
        return "Permission denied. Check that the credentials have access to the Search Console property.".to_string();
    }
    if error_str.contains("401") {
        return "Authentication failed. Check the configured credentials.".to_string();
    }
    if error_str.contains("404") {
        return "Resource not found.".to_string();
    }
    if error_str.contains("429") {
        return "Rate limit exceeded. Lower --batch-size or set --max-in-flight.".to_string();
    }
    if error_str.contains("400") {
        return "Invalid request. Check your parameters.".to_string();
    }
    if error_str.contains("500") || error_str.contains("503") {
        return "Google service temporarily unavailable. Please try again.".to_string();
    }

    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(120)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(sanitized.contains("500 bytes total"));
    }

    #[test]
    fn test_sanitize_respects_char_boundaries() {
        let body = "é".repeat(150);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("truncated"));
    }

    #[test]
    fn test_format_api_error_maps_status_codes() {
        let err = anyhow::anyhow!("API request failed: 429 Too Many Requests");
        assert!(format_api_error(&err).contains("Rate limit"));

        let err = anyhow::anyhow!("API request failed: 403 Forbidden");
        assert!(format_api_error(&err).starts_with("Permission denied"));
    }

    #[test]
    fn test_format_api_error_passes_through_other_errors() {
        let err = anyhow::anyhow!("sitemap has no <urlset> or <sitemapindex> root");
        assert_eq!(
            format_api_error(&err),
            "sitemap has no <urlset> or <sitemapindex> root"
        );
    }
}
