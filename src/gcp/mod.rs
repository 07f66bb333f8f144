//! Google API interaction module
//!
//! This module provides the remote side of every table: authentication,
//! the HTTP transport, and one module per remote API.
//!
//! # Module Structure
//!
//! - [`auth`] - Service account, ADC or static-token authentication
//! - [`client`] - Authenticated client and endpoint helpers
//! - [`http`] - HTTP utilities for REST API calls
//! - [`projects`] - Project derivation from credentials
//! - [`searchconsole`] - Sites, sitemaps and URL inspection
//! - [`pagespeed`] - PageSpeed Insights analysis
//!
//! # Example
//!
//! ```ignore
//! use gscq::gcp::{auth::TokenSource, client::{Endpoints, GscClient}, http::HttpClient};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let source = TokenSource::application_default().await?;
//!     let http = HttpClient::new(std::time::Duration::from_secs(60))?;
//!     let client = GscClient::new(source, http, Endpoints::default());
//!     let sites = gscq::gcp::searchconsole::list_sites(&client).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod pagespeed;
pub mod projects;
pub mod searchconsole;
