use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use nst_ingest::config::{IngestConfig, parse_rate_windows};
use nst_ingest::fetch::{FetchClient, HttpTransport};
use nst_ingest::http_cache::HttpCache;
use nst_ingest::pipeline;
use nst_ingest::rate_limit::RateLimiter;
use nst_ingest::teams::TeamDirectory;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = resolve_config();
    let teams = TeamDirectory::nhl();

    let transport = HttpTransport::new().context("unable to build http transport")?;
    let limiter = RateLimiter::new(&config.windows, Instant::now());
    let cache = HttpCache::open(config.cache_path.clone(), config.cache_ttl);
    let mut client = FetchClient::new(config.base_url.clone(), transport, limiter, cache);

    let summary = pipeline::run(&config, &teams, &mut client).context("ingest run failed")?;

    println!("Ingest complete");
    println!("Seasons: {} through {}", config.from_season, config.thru_season);
    println!("Output: {}", config.out_dir.display());
    println!("Rows paired: {}", summary.rows_paired);
    println!("Records stored: {}", summary.stored);
    println!("Already stored: {}", summary.skipped_existing);
    println!("Network requests: {}", summary.requests_issued);
    if !summary.failed.is_empty() {
        println!("Failed records: {}", summary.failed.len());
        for err in summary.failed.iter().take(10) {
            println!(" - {err}");
        }
    }

    Ok(())
}

/// Env defaults first, then command-line overrides.
fn resolve_config() -> IngestConfig {
    let mut config = IngestConfig::from_env();
    if let Some(year) = arg_value("--from").and_then(|v| v.parse::<i32>().ok()) {
        config.from_season = year;
    }
    if let Some(year) = arg_value("--thru").and_then(|v| v.parse::<i32>().ok()) {
        config.thru_season = year;
    }
    if let Some(dir) = arg_value("--out") {
        config.out_dir = PathBuf::from(dir);
    }
    if let Some(path) = arg_value("--cache") {
        config.cache_path = PathBuf::from(path);
    }
    if let Some(secs) = arg_value("--cache-ttl").and_then(|v| v.parse::<u64>().ok()) {
        config.cache_ttl = Duration::from_secs(secs);
    }
    if let Some(raw) = arg_value("--rate-windows") {
        let windows = parse_rate_windows(&raw);
        if !windows.is_empty() {
            config.windows = windows;
        }
    }
    config
}

fn arg_value(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&format!("{flag}=")) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
