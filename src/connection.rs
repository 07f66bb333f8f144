//! Connection
//!
//! Session state shared by every query against one configuration: the HTTP
//! transport, the lazily-authenticated API client and the memoized project.

use crate::config::{path_or_contents, Config};
use crate::gcp::auth::TokenSource;
use crate::gcp::client::GscClient;
use crate::gcp::http::HttpClient;
use crate::gcp::projects::project_id_from_credentials;
use crate::table::{self, Quals, Row, RowSink};
use anyhow::{Context, Result};
use tokio::sync::OnceCell;
use tracing::Instrument;
use uuid::Uuid;

pub struct Connection {
    config: Config,
    http: HttpClient,
    client: OnceCell<GscClient>,
    project: OnceCell<Option<String>>,
}

impl Connection {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let http = HttpClient::new(config.request_timeout())?;

        Ok(Self {
            config,
            http,
            client: OnceCell::new(),
            project: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Unauthenticated transport (sitemap documents)
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// The authenticated API client, built on first use
    pub async fn client(&self) -> Result<&GscClient> {
        self.client
            .get_or_try_init(|| async {
                let source = self.token_source().await?;
                Ok(GscClient::new(
                    source,
                    self.http.clone(),
                    self.config.endpoints(),
                ))
            })
            .await
    }

    async fn token_source(&self) -> Result<TokenSource> {
        if let Some(token) = self.config.access_token.as_deref().filter(|t| !t.is_empty()) {
            tracing::debug!("Using static access token");
            return Ok(TokenSource::Static(token.to_string()));
        }

        match self.config.credentials.as_deref().filter(|c| !c.is_empty()) {
            Some(credentials) => {
                let content = path_or_contents(credentials)
                    .context("Failed to load credentials")?;
                tracing::debug!("Using service account credentials");
                TokenSource::from_service_account_json(&content)
            }
            None => {
                tracing::debug!("Using Application Default Credentials");
                TokenSource::application_default().await
            }
        }
    }

    /// Project of the configured credentials, derived once per connection
    pub async fn project(&self) -> Result<Option<String>> {
        self.project
            .get_or_try_init(|| async {
                let Some(credentials) =
                    self.config.credentials.as_deref().filter(|c| !c.is_empty())
                else {
                    return Ok(None);
                };
                let content = path_or_contents(credentials)
                    .context("Failed to load credentials")?;
                project_id_from_credentials(&content)
            })
            .await
            .cloned()
    }

    /// Stream the rows of `table` matching `quals` into `sink`
    pub async fn list(&self, table: &str, quals: &Quals, sink: &mut dyn RowSink) -> Result<()> {
        let span = tracing::info_span!("list", table = %table, invocation = %Uuid::new_v4());
        table::list(self, table, quals, sink).instrument(span).await
    }

    /// Fetch the single row of `table` identified by `quals`
    pub async fn get(&self, table: &str, quals: &Quals) -> Result<Option<Row>> {
        let span = tracing::info_span!("get", table = %table, invocation = %Uuid::new_v4());
        table::get(self, table, quals).instrument(span).await
    }
}
