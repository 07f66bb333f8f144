//! googlesearchconsole_site

use super::{Projector, Quals, Row, RowSink};
use crate::connection::Connection;
use crate::gcp::searchconsole;
use anyhow::Result;

pub async fn list(conn: &Connection, projector: &Projector<'_>, sink: &mut dyn RowSink) -> Result<()> {
    let client = conn.client().await?;
    let sites = searchconsole::list_sites(client)
        .await
        .inspect_err(|e| tracing::error!("api_error: list sites: {}", e))?;

    tracing::debug!("Listed {} sites", sites.len());
    for site in &sites {
        sink.push(projector.row(site))?;
    }
    Ok(())
}

pub async fn get(conn: &Connection, projector: &Projector<'_>, quals: &Quals) -> Result<Option<Row>> {
    let site_url = quals.equals("site_url");
    let client = conn.client().await?;
    let site = searchconsole::get_site(client, site_url)
        .await
        .inspect_err(|e| tracing::error!(site_url, "api_error: get site: {}", e))?;

    Ok(Some(projector.row(&site)))
}
