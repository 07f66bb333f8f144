//! GCP Authentication
//!
//! Handles authentication using a service account key, Application Default
//! Credentials (ADC), or a caller-supplied static access token.

use anyhow::{Context, Result};
use gcp_auth::{CustomServiceAccount, TokenProvider};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Read-only scope for the Search Console API
pub const SEARCH_CONSOLE_SCOPES: &[&str] =
    &["https://www.googleapis.com/auth/webmasters.readonly"];

/// Scope for the PageSpeed Insights API
pub const PAGESPEED_SCOPES: &[&str] = &["openid"];

/// Token expiry buffer - refresh tokens this much before they actually expire
/// This prevents using tokens that are about to expire during a request
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if we can't determine expiry (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Where access tokens come from
#[derive(Clone)]
pub enum TokenSource {
    /// A gcp_auth provider (service account key or ADC)
    Provider(Arc<dyn TokenProvider>),
    /// A fixed bearer token, e.g. from `gcloud auth print-access-token`
    Static(String),
}

impl TokenSource {
    /// Build a token source from service account key JSON
    pub fn from_service_account_json(json: &str) -> Result<Self> {
        let account = CustomServiceAccount::from_json(json)
            .context("Unable to parse service account key")?;
        Ok(Self::Provider(Arc::new(account)))
    }

    /// Build a token source from Application Default Credentials
    pub async fn application_default() -> Result<Self> {
        let provider = gcp_auth::provider().await.context(
            "Failed to initialize GCP authentication. Run 'gcloud auth application-default login' or configure credentials",
        )?;
        Ok(Self::Provider(provider))
    }
}

/// GCP credentials holder with token caching, bound to one set of scopes
#[derive(Clone)]
pub struct GcpCredentials {
    source: TokenSource,
    scopes: &'static [&'static str],
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

impl GcpCredentials {
    pub fn new(source: TokenSource, scopes: &'static [&'static str]) -> Self {
        Self {
            source,
            scopes,
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Get an access token for API calls
    pub async fn get_token(&self) -> Result<String> {
        let provider = match &self.source {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::Provider(provider) => provider,
        };

        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let token = provider
            .token(self.scopes)
            .await
            .context("Failed to get access token")?;

        let token_str = token.as_str().to_string();

        // Fixed TTL regardless of the provider's reported expiry
        let expires_at = Instant::now() + DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER;

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token_str.clone(),
                expires_at,
            });
        }

        tracing::debug!(
            scopes = ?self.scopes,
            "New token cached, expires in ~{} minutes",
            (DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(token_str)
    }

    /// Force refresh the token
    pub async fn refresh_token(&self) -> Result<String> {
        {
            let mut cache = self.token_cache.write().await;
            *cache = None;
        }

        self.get_token().await
    }
}
