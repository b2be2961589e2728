//! Grid Probe CLI
//!
//! Requests one node of the campaign tree from a live backend and prints the
//! rows the grid would receive, with each field formatted and classified.
//!
//! Usage:
//!   cargo run --features cli --bin grid_probe -- \
//!     --config config/grid.yaml \
//!     --level adset \
//!     --parent C100 \
//!     --start 0 --end 200
//!
//! Without `--config`, configuration comes from `ADS_GRID_*` environment
//! variables (a `.env` file is honoured).
//!
//! Examples:
//!   # Root listing, raw JSON
//!   cargo run --features cli --bin grid_probe -- --json
//!
//!   # Ads of one ad-set for another period
//!   cargo run --features cli --bin grid_probe -- \
//!     --level ad --parent AS9 --period LAST_7D

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;

use ads_grid::cells::format_field;
use ads_grid::{GridSourceConfig, HierarchicalDataSource, Level, ReqwestTransport};

/// Fetch one node of the campaign/ad-set/ad tree
#[derive(Parser, Debug)]
#[command(name = "grid_probe")]
#[command(about = "Request one grid node from the backend and print its rows")]
struct Args {
    /// YAML configuration file (default: ADS_GRID_* environment variables)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Level to list: campaign, adset or ad (or 0, 1, 2)
    #[arg(long, short = 'l', default_value = "campaign", value_parser = parse_level)]
    level: Level,

    /// Parent row id (campaign id for ad-sets, ad-set id for ads)
    #[arg(long, short = 'p')]
    parent: Option<String>,

    /// First row of the window
    #[arg(long, default_value_t = 0)]
    start: u64,

    /// Row after the last one in the window
    #[arg(long, default_value_t = 100)]
    end: u64,

    /// Override the configured reporting period
    #[arg(long, env = "ADS_GRID_PERIOD")]
    period: Option<String>,

    /// Output rows as JSON
    #[arg(long)]
    json: bool,
}

fn parse_level(s: &str) -> Result<Level, String> {
    match s.to_ascii_lowercase().as_str() {
        "campaign" | "campaigns" | "0" => Ok(Level::Campaign),
        "adset" | "adsets" | "ad-set" | "1" => Ok(Level::AdSet),
        "ad" | "ads" | "2" => Ok(Level::Ad),
        other => Err(format!(
            "unknown level '{}' (expected campaign, adset or ad)",
            other
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GridSourceConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => GridSourceConfig::from_env().context("reading ADS_GRID_* environment")?,
    };
    if let Some(period) = &args.period {
        config.period = period.clone();
    }

    if args.level.requires_parent() && args.parent.is_none() {
        bail!("--parent is required for {} rows", args.level);
    }

    let transport = Arc::new(ReqwestTransport::from_config(&config)?);
    let source = HierarchicalDataSource::new(&config, transport)?;

    let started = Instant::now();
    let response = source
        .request_rows(args.parent.as_deref(), args.level, args.start, args.end)
        .await
        .with_context(|| format!("fetching {} rows", args.level))?;
    let elapsed = started.elapsed();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response.rows)?);
        return Ok(());
    }

    println!(
        "\nLevel: {}  Parent: {}  Window: {}..{}  Period: {}",
        args.level,
        args.parent.as_deref().unwrap_or("-"),
        args.start,
        args.end,
        config.period
    );
    println!(
        "Envelope: {}  Rows: {}  Total: {}  ({} ms)\n",
        response
            .shape
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "none located".to_string()),
        response.len(),
        response
            .total_hint
            .map(|t| t.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        elapsed.as_millis()
    );

    for (i, row) in response.rows.iter().enumerate() {
        println!("[{}] {}", i, row.id().unwrap_or_else(|| "?".to_string()));
        let Some(fields) = row.fields() else {
            println!("    {}", row.as_value());
            continue;
        };
        for field in fields.keys() {
            let cell = format_field(row, field);
            println!("    {:<24} {:<32} [{}]", field, cell.text, cell.bucket);
        }
    }

    Ok(())
}
