use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use dk_odds::config::{DEFAULT_LOG_FILTER, DkConfig};
use dk_odds::pipeline;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let mut cfg = DkConfig::from_env();
    if let Some(raw) = parse_flag_arg("event-group") {
        cfg.event_group = raw
            .parse::<u32>()
            .with_context(|| format!("invalid --event-group {raw}"))?;
    }
    if let Some(path) = parse_flag_arg("out") {
        cfg.output_path = PathBuf::from(path);
    }

    let filter = EnvFilter::try_new(&cfg.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let report = pipeline::run(&cfg)?;

    println!("DraftKings export complete");
    println!("Event group: {}", cfg.event_group);
    println!("File: {}", report.path.display());
    println!("Rows written: {}", report.rows_written);
    if report.rows_dropped > 0 {
        println!("Rows dropped (incomplete): {}", report.rows_dropped);
    }

    Ok(())
}

/// Accepts `--name value` and `--name=value`.
fn parse_flag_arg(name: &str) -> Option<String> {
    let long = format!("--{name}");
    let prefix = format!("--{name}=");
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if *arg == long {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
