//! Air-quality time-lapse viewer engine.
//!
//! Animates date-indexed particulate rasters over a base map with:
//! - Deterministic frame URL generation from a date range and parameter
//! - Eager prefetching of rasters and fire-detection vectors
//! - A looping playback clock with cross-fade frame transitions
//! - A pluggable map shell (the binary ships a log-stream shell)

mod config;
mod session;
mod shell;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use prefetch::HttpFetcher;
use viewer_common::Parameter;

use config::ViewerConfig;
use session::ViewerSession;
use shell::TracingShell;

#[derive(Parser, Debug)]
#[command(name = "viewer")]
#[command(about = "Time-lapse playback engine for air-quality raster overlays")]
struct Args {
    /// Configuration YAML file
    #[arg(long, env = "VIEWER_CONFIG")]
    config: Option<PathBuf>,

    /// Object store base URL (overrides config)
    #[arg(long, env = "STORE_BASE_URL")]
    base_url: Option<String>,

    /// First day of the frame range, YYYY-MM-DD (overrides config)
    #[arg(long)]
    start_date: Option<String>,

    /// Last day of the frame range, inclusive (overrides config)
    #[arg(long)]
    end_date: Option<String>,

    /// Raster parameter: pm25 or pm10 (overrides config)
    #[arg(long)]
    parameter: Option<Parameter>,

    /// Overlay opacity, 0.0 to 1.0 (overrides config)
    #[arg(long)]
    opacity: Option<f64>,

    /// Start playing immediately
    #[arg(long)]
    autoplay: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn apply_to(&self, config: &mut ViewerConfig) {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(start) = &self.start_date {
            config.start_date = start.clone();
        }
        if let Some(end) = &self.end_date {
            config.end_date = end.clone();
        }
        if let Some(parameter) = self.parameter {
            config.parameter = parameter;
        }
        if let Some(opacity) = self.opacity {
            config.opacity = opacity;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting air-quality time-lapse viewer");

    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    args.apply_to(&mut config);

    let fetcher = Arc::new(HttpFetcher::new()?);
    let shell = Arc::new(TracingShell::new());
    let session = ViewerSession::new(config, fetcher, shell)?;

    session.start().await?;
    if args.autoplay {
        session.play().await;
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    session.shutdown().await;

    Ok(())
}
