use anyhow::{Context, Result};
use reqwest::blocking::Client;
use tracing::info;

use crate::config::DkConfig;
use crate::dk_fetch::{DkResponse, fetch_event_group, fetch_event_group_with};
use crate::export::{ExportReport, RowContext, event_records, export_rows, join_events};
use crate::flatten::{flatten_offers, parse_event_group_json};

/// Fetch, flatten, join and write. Nothing touches the output file unless
/// every earlier stage succeeded.
pub fn run(cfg: &DkConfig) -> Result<ExportReport> {
    let response = fetch_event_group(cfg)?;
    export_response(cfg, &response)
}

pub fn run_with_client(client: &Client, cfg: &DkConfig) -> Result<ExportReport> {
    let response = fetch_event_group_with(client, cfg)?;
    export_response(cfg, &response)
}

pub fn export_response(cfg: &DkConfig, response: &DkResponse) -> Result<ExportReport> {
    let group = parse_event_group_json(&response.body)
        .with_context(|| format!("event group {}", cfg.event_group))?;
    let offer_outcomes = flatten_offers(&group)?;
    let events = event_records(&group);
    info!(
        outcomes = offer_outcomes.len(),
        events = events.len(),
        "flattened event group"
    );

    let ctx = RowContext {
        timestamp: &response.date,
        sport: &cfg.sport,
        sportsbook: &cfg.sportsbook,
    };
    let joined = join_events(offer_outcomes, &events, &ctx);
    if joined.dropped > 0 {
        info!(dropped = joined.dropped, "dropped incomplete rows");
    }

    export_rows(&cfg.output_path, joined)
}
