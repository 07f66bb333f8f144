//! PageSpeed Insights API

use super::client::GscClient;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fmt;

/// Response fields requested for per-page analysis
pub const PAGE_FIELDS: &str = "id,loadingExperience,analysisUTCTimestamp";

/// Response fields requested for origin-level (aggregated) analysis
pub const ORIGIN_FIELDS: &str = "id,originLoadingExperience,analysisUTCTimestamp";

/// Analysis strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    #[default]
    Desktop,
    Mobile,
}

impl Strategy {
    /// Parse a strategy, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "desktop" => Some(Self::Desktop),
            "mobile" => Some(Self::Mobile),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
        }
    }

    /// The value the API expects
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Self::Desktop => "DESKTOP",
            Self::Mobile => "MOBILE",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run a PageSpeed analysis for one URL
pub async fn run_pagespeed(
    client: &GscClient,
    page_url: &str,
    strategy: Strategy,
    fields: &str,
) -> Result<Value> {
    let url = url::Url::parse_with_params(
        &client.run_pagespeed_url(),
        &[
            ("url", page_url),
            ("strategy", strategy.as_api_str()),
            ("fields", fields),
        ],
    )
    .context("Failed to build PageSpeed request URL")?;

    client.pagespeed_get(url.as_str()).await
}
