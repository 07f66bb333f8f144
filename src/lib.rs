//! gscq - Google Search Console and PageSpeed Insights as tables
//!
//! Sites, submitted sitemaps, per-page index status and per-page or
//! origin-level PageSpeed field data, queried by table name with equality
//! qualifiers. Sitemap-driven tables fan out one remote call per page in
//! bounded batches and return rows in sitemap order.

pub mod batch;
pub mod config;
pub mod connection;
pub mod gcp;
pub mod output;
pub mod sitemap;
pub mod table;

/// Version injected at compile time via GSCQ_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("GSCQ_VERSION") {
    Some(v) => v,
    None => "dev",
};

pub use config::Config;
pub use connection::Connection;
pub use table::{Quals, Row, RowSink};
