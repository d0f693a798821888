//! `scraperd` — the Scraper Development Daemon's process entry point.
//!
//! Parses flags, wires logging, connects to the backend and browser
//! driver, resolves `--city`, and either runs one of the one-shot loop
//! modes once or hands off to the [`Supervisor`]'s long-running scheduling
//! loop until a termination signal arrives.

use std::fs;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, error, info, warn};

use scraperd::backend::{resolve_city, Backend, HttpBackend};
use scraperd::browser::{BrowserDriver, ThirtyfourDriver};
use scraperd::cli::{Cli, OneShotMode};
use scraperd::config::Config;
use scraperd::domain::CityId;
use scraperd::loops::{ContactLoop, DirectoryLoop, DiscoveryLoop, PeriodicLoop};
use scraperd::scratchpad::Scratchpad;
use scraperd::Supervisor;

/// Mirrors the daemon's documented exit codes (§6): 0 clean, 1 on missing
/// required configuration or a one-shot mode's fatal error. 124 (agent
/// subprocess timeout) is recorded internally and never surfaces here.
const EXIT_OK: i32 = 0;
const EXIT_CONFIG_ERROR: i32 = 1;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(&cli) {
        eprintln!("Failed to initialize logging: {e:#}");
        std::process::exit(EXIT_CONFIG_ERROR);
    }

    let code = match run(cli).await {
        Ok(()) => EXIT_OK,
        Err(e) => {
            error!(error = %e, "scraperd: fatal error");
            EXIT_CONFIG_ERROR
        }
    };
    std::process::exit(code);
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let config = Config::load(cli.config.as_ref()).unwrap_or_default();
    let scratchpad = Scratchpad::from_config(&config.scratchpad);
    scratchpad.ensure_dir().context("Failed to create scratchpad directory")?;

    let log_file = fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(scratchpad.daemon_log_path())
        .context("Failed to open daemon log file")?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stdout)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(log_file)
            .with_ansi(false)
            .init();
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::from_config(&config.backend)?);

    let city_id = resolve_city_flag(backend.as_ref(), cli.city.as_deref()).await?;

    info!(webdriver_url = %config.browser.webdriver_url, "scraperd: connecting to headless-browser service");
    let driver: Arc<dyn BrowserDriver> = Arc::new(
        ThirtyfourDriver::connect(&config.browser.webdriver_url)
            .await
            .context("Failed to connect to headless-browser service")?,
    );

    if let Some(mode) = cli.one_shot_mode() {
        return run_one_shot(mode, backend, driver, &config).await;
    }

    let mut config = config;
    config.scheduler.workers = cli.clamped_workers();

    let supervisor = Arc::new(Supervisor::new(backend, driver, config, city_id));
    let shutdown = supervisor.shutdown_signal();

    let run_handle = tokio::spawn({
        let supervisor = supervisor.clone();
        async move { supervisor.run().await }
    });

    wait_for_termination_signal().await;
    info!("scraperd: termination signal received, shutting down");
    let _ = shutdown.send(true);

    if let Err(e) = run_handle.await {
        warn!(error = %e, "scraperd: supervisor task join error during shutdown");
    }

    Ok(())
}

async fn run_one_shot(mode: OneShotMode, backend: Arc<dyn Backend>, driver: Arc<dyn BrowserDriver>, config: &Config) -> Result<()> {
    let navigation_timeout = std::time::Duration::from_millis(config.browser.navigation_timeout_ms);

    match mode {
        OneShotMode::Directory => {
            info!("scraperd: running directory loop once");
            let loop_ = DirectoryLoop::new(backend, driver.clone(), navigation_timeout);
            loop_.tick().await?;
        }
        OneShotMode::Contact => {
            info!("scraperd: running contact-extraction loop once");
            let loop_ = ContactLoop::new(backend, driver.clone(), navigation_timeout);
            loop_.tick().await?;
        }
        OneShotMode::Discovery => {
            info!("scraperd: running market-discovery loop once");
            let session_id = uuid::Uuid::new_v4().to_string();
            let loop_ = DiscoveryLoop::new(backend, driver.clone(), navigation_timeout, session_id);
            loop_.tick().await?;
        }
    }

    driver.close().await.context("Failed to close browser session")?;
    Ok(())
}

async fn resolve_city_flag(backend: &dyn Backend, city: Option<&str>) -> Result<Option<CityId>> {
    let Some(slug) = city else { return Ok(None) };

    let cities = backend.list_all_cities().await.context("Failed to list cities")?;
    let city = resolve_city(&cities, slug).context("Failed to resolve --city")?;
    debug!(slug, resolved = %city.id, "resolve_city_flag: resolved");
    Ok(Some(city.id.clone()))
}

#[cfg(unix)]
async fn wait_for_termination_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "wait_for_termination_signal: failed to install SIGINT handler");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "wait_for_termination_signal: failed to install SIGTERM handler");
            let _ = sigint.recv().await;
            return;
        }
    };

    tokio::select! {
        _ = sigint.recv() => debug!("wait_for_termination_signal: SIGINT received"),
        _ = sigterm.recv() => debug!("wait_for_termination_signal: SIGTERM received"),
    }
}

#[cfg(not(unix))]
async fn wait_for_termination_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
