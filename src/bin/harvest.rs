//! Comment harvester CLI.
//!
//! Opens the given page in a Chromium instance, scrolls until the content
//! extent stabilises, and writes the collected comment text to a file.
//!
//! Usage examples:
//!   Launch a local headless Chromium:
//!     $ HARVEST_CHROME_BIN=/path/to/chrome \
//!       cargo run --bin harvest -- https://example.com/watch?v=abc
//!   Attach to an already-running browser:
//!     $ cargo run --bin harvest -- --cdp-url ws://127.0.0.1:9222/... \
//!       https://example.com/watch?v=abc

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use comment_harvest::browser::BrowserPlan;
use comment_harvest::collector::{CollectorSettings, IncrementalCollector};
use comment_harvest::config::{HarvestConfig, HarvestConfigOverrides, Verbosity};
use comment_harvest::exporter::TextExporter;
use comment_harvest::logging::{HarvestLogRecord, HarvestLogger, LogCallback, LogConfig};
use comment_harvest::runtime::ChromiumRuntime;
use log::info;

#[derive(Parser)]
#[command(
    name = "harvest",
    author,
    version,
    about = "Collect visible comment text from a lazily rendered page"
)]
struct Cli {
    /// Page URL to harvest comments from.
    url: String,

    /// CSS selector for comment text nodes.
    #[arg(long)]
    selector: Option<String>,

    /// Milliseconds to wait after each scroll before rescanning.
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Stop after this many scroll cycles even if the page keeps growing.
    #[arg(long)]
    max_cycles: Option<u32>,

    /// Output file for the collected comments.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Attach to a running browser over this CDP URL instead of launching.
    #[arg(long)]
    cdp_url: Option<String>,

    /// Chrome/Chromium executable to launch.
    #[arg(long)]
    chrome_bin: Option<PathBuf>,

    /// Show the launched browser window.
    #[arg(long)]
    show_browser: bool,

    /// Increase log verbosity (pass multiple times for DEBUG).
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_env_logger();

    let cli = Cli::parse();
    let config = build_config(&cli).context("failed to build configuration")?;
    let logger = HarvestLogger::with_config(LogConfig {
        verbose: config.verbose,
        external_logger: Some(forwarding_callback()),
    });

    let runtime = ChromiumRuntime::new();
    let plan = BrowserPlan::from_config(&config);
    runtime
        .launch(&plan)
        .await
        .context("failed to start browser")?;

    let outcome = run_harvest(&cli.url, &config, &runtime, &logger).await;

    // Tear the browser down even when collection failed.
    runtime
        .shutdown()
        .await
        .context("failed to shut down browser")?;

    let harvest = outcome?;
    info!(
        "collected {} comments in {} cycles -> {}",
        harvest.comments.len(),
        harvest.cycles,
        config.output_path.display()
    );
    Ok(())
}

async fn run_harvest(
    url: &str,
    config: &HarvestConfig,
    runtime: &ChromiumRuntime,
    logger: &HarvestLogger,
) -> Result<comment_harvest::collector::Harvest> {
    runtime
        .open(url)
        .await
        .with_context(|| format!("failed to open {url}"))?;

    let collector = IncrementalCollector::new(runtime, CollectorSettings::from(config), logger);
    let harvest = collector.collect().await.context("collection failed")?;

    let exporter = TextExporter::new(&config.output_path);
    exporter
        .export(&harvest.comments)
        .await
        .context("failed to write artifact")?;

    Ok(harvest)
}

fn build_config(cli: &Cli) -> Result<HarvestConfig> {
    let base = HarvestConfig::from_env().context("invalid HARVEST_* environment")?;

    let overrides = HarvestConfigOverrides {
        comment_selector: cli.selector.clone(),
        scroll_delay_ms: cli.delay_ms,
        max_cycles: cli.max_cycles.map(Some),
        output_path: cli.output.clone(),
        verbose: (cli.verbose > 0).then(|| verbosity_from_count(cli.verbose)),
        headless: cli.show_browser.then_some(false),
        cdp_url: cli.cdp_url.clone().map(Some),
        chrome_executable: cli.chrome_bin.clone().map(Some),
        user_data_dir: None,
    };

    Ok(base.with_overrides(overrides))
}

fn forwarding_callback() -> LogCallback {
    Arc::new(|record: &HarvestLogRecord| {
        let category = record.category.as_deref().unwrap_or("harvest");
        match record.level {
            comment_harvest::logging::LogLevel::Error => {
                log::error!("[{category}] {}", record.message)
            }
            comment_harvest::logging::LogLevel::Info => {
                log::info!("[{category}] {}", record.message)
            }
            comment_harvest::logging::LogLevel::Debug => {
                log::debug!("[{category}] {}", record.message)
            }
        }
    })
}

fn verbosity_from_count(count: u8) -> Verbosity {
    match count {
        0 => Verbosity::Medium,
        1 => Verbosity::Detailed,
        _ => Verbosity::Detailed,
    }
}

fn init_env_logger() {
    if env::var("RUST_LOG").is_err() {
        unsafe {
            env::set_var("RUST_LOG", "info");
        }
    }

    let _ = env_logger::Builder::from_env(env_logger::Env::default())
        .format_timestamp_secs()
        .try_init();
}
