//! GCP Projects
//!
//! Derives the project associated with the configured credentials.

use anyhow::{Context, Result};
use serde_json::Value;

/// Extract the project id from service account (or ADC user) key JSON.
///
/// `project_id` wins over `quota_project_id`; keys carrying neither yield `None`.
pub fn project_id_from_credentials(content: &str) -> Result<Option<String>> {
    let data: Value =
        serde_json::from_str(content).context("Failed to parse credentials JSON")?;

    let project = ["project_id", "quota_project_id"]
        .iter()
        .find_map(|key| {
            data.get(*key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
        })
        .map(|s| s.to_string());

    Ok(project)
}
