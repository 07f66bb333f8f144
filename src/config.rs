//! Configuration Management
//!
//! Connection settings for gscq, loaded from a JSON file.

use crate::batch::{BatchOptions, DEFAULT_BATCH_SIZE};
use crate::gcp::client::{Endpoints, PAGESPEED_ENDPOINT, SEARCH_CONSOLE_ENDPOINT};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service account key: a file path or the inline JSON content
    pub credentials: Option<String>,
    /// Static OAuth access token, used instead of `credentials`/ADC
    pub access_token: Option<String>,
    /// URLs per batch when fanning out over a sitemap
    pub batch_size: usize,
    /// Global cap on concurrent remote calls during a list (none = unbounded)
    pub max_in_flight: Option<usize>,
    /// Deadline in seconds for a whole list invocation
    pub list_timeout_secs: Option<u64>,
    /// Timeout in seconds for a single HTTP request
    pub request_timeout_secs: u64,
    /// Strategy used when no `strategy` qualifier is given
    pub default_strategy: String,
    pub search_console_endpoint: String,
    pub pagespeed_endpoint: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: None,
            access_token: None,
            batch_size: DEFAULT_BATCH_SIZE,
            max_in_flight: None,
            list_timeout_secs: None,
            request_timeout_secs: 60,
            default_strategy: "desktop".to_string(),
            search_console_endpoint: SEARCH_CONSOLE_ENDPOINT.to_string(),
            pagespeed_endpoint: PAGESPEED_ENDPOINT.to_string(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gscq").join("config.json"))
    }

    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.max_in_flight == Some(0) {
            bail!("max_in_flight must be at least 1");
        }
        if crate::gcp::pagespeed::Strategy::parse(&self.default_strategy).is_none() {
            bail!(
                "default_strategy must be 'desktop' or 'mobile', got '{}'",
                self.default_strategy
            );
        }
        Ok(())
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            batch_size: self.batch_size,
            max_in_flight: self.max_in_flight,
            deadline: self.list_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            search_console: self.search_console_endpoint.clone(),
            pagespeed: self.pagespeed_endpoint.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Returns the content of the given file, or the inline content as it is.
///
/// A leading `~` is expanded to the home directory. Values that look like an
/// absolute path but do not exist are an error rather than inline content.
pub fn path_or_contents(poc: &str) -> Result<String> {
    if poc.is_empty() {
        return Ok(String::new());
    }

    let path = match poc.strip_prefix('~') {
        Some(rest) => {
            let home = dirs::home_dir().context("Unable to determine home directory")?;
            home.join(rest.trim_start_matches(['/', '\\']))
        }
        None => PathBuf::from(poc),
    };

    if path.is_file() {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    if poc.starts_with('~') || (poc.len() > 1 && (poc.starts_with('/') || poc.starts_with('\\'))) {
        bail!("{}: no such file or dir", path.display());
    }

    Ok(poc.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("gscq-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.default_strategy, "desktop");
        assert!(config.max_in_flight.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let path = temp_file(r#"{"batch_size": 10, "max_in_flight": 4}"#);
        let config = Config::load_from(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.batch_size, 10);
        assert_eq!(config.max_in_flight, Some(4));
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.search_console_endpoint, SEARCH_CONSOLE_ENDPOINT);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let path = temp_file(r#"{"default_strategy": "tablet"}"#);
        assert!(Config::load_from(&path).is_err());
        std::fs::remove_file(&path).unwrap();

        let config = Config {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_batch_options_from_config() {
        let config = Config {
            batch_size: 7,
            list_timeout_secs: Some(30),
            ..Default::default()
        };
        let options = config.batch_options();
        assert_eq!(options.batch_size, 7);
        assert_eq!(options.deadline, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_path_or_contents_reads_file() {
        let path = temp_file(r#"{"project_id": "p"}"#);
        let content = path_or_contents(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(content, r#"{"project_id": "p"}"#);
    }

    #[test]
    fn test_path_or_contents_inline() {
        let inline = r#"{"type": "service_account"}"#;
        assert_eq!(path_or_contents(inline).unwrap(), inline);
        assert_eq!(path_or_contents("").unwrap(), "");
    }

    #[test]
    fn test_path_or_contents_missing_absolute_path() {
        let err = path_or_contents("/definitely/not/here/key.json").unwrap_err();
        assert!(err.to_string().contains("no such file or dir"));
    }
}
