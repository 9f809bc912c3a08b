use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::DATE;
use tracing::{debug, info};

use crate::config::DkConfig;
use crate::error::FetchError;
use crate::http_client::http_client;

#[derive(Debug, Clone)]
pub struct DkResponse {
    pub date: String,
    pub body: String,
}

/// One GET against the event group endpoint. Anything but a 200 aborts with
/// [`FetchError::UnexpectedStatus`]; there are no retries.
pub fn fetch_event_group(cfg: &DkConfig) -> Result<DkResponse> {
    fetch_event_group_with(http_client()?, cfg)
}

pub fn fetch_event_group_with(client: &Client, cfg: &DkConfig) -> Result<DkResponse> {
    let url = cfg.event_group_url();
    info!(event_group = cfg.event_group, %url, "requesting event group");

    let resp = client
        .get(&url)
        .query(&[("format", "json")])
        .send()
        .map_err(FetchError::from)
        .context("draftkings request failed")?;

    let status = resp.status();
    if status != StatusCode::OK {
        return Err(FetchError::UnexpectedStatus {
            status: status.as_u16(),
        }
        .into());
    }

    // The server's Date header is the capture timestamp of every row.
    let date = resp
        .headers()
        .get(DATE)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(FetchError::MissingDate)?;

    let body = resp
        .text()
        .map_err(FetchError::from)
        .context("failed reading draftkings body")?;
    debug!(bytes = body.len(), %date, "event group body received");

    Ok(DkResponse { date, body })
}
