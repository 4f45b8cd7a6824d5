//! sitewatch CLI
//!
//! Local execution entry point. For AWS Lambda, use `sitewatch-lambda`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use sitewatch::{
    config::load_config,
    error::Result,
    models::Config,
    report::{CheckReport, SiteSummary},
    scheduler::{Scheduler, SweepSummary, run_periodic},
    storage::{LocalStorage, MemoryStorage, ObjectStore},
};

/// sitewatch - website monitoring and llms.txt regeneration
#[derive(Parser, Debug)]
#[command(
    name = "sitewatch",
    version,
    about = "Monitors websites and regenerates llms.txt when they change"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Storage directory (overrides storage.data_dir)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Keep all state in memory; nothing is written to disk
    #[arg(long)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the RPC endpoint and run periodic checks
    #[cfg(feature = "server")]
    Serve {
        /// Address to bind (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run periodic checks until interrupted
    Run,

    /// Start monitoring a site
    Add {
        url: String,

        /// Hours between checks
        #[arg(long)]
        interval_hours: Option<f64>,

        /// Page budget per crawl
        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// Stop monitoring a site
    Remove { url: String },

    /// List monitored sites
    List,

    /// Check one site now, or every due site
    Check { url: Option<String> },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown requested");
}

async fn open_scheduler(config: &Config, ephemeral: bool) -> Result<Arc<Scheduler>> {
    let store: Arc<dyn ObjectStore> = if ephemeral {
        log::info!("Using in-memory storage");
        Arc::new(MemoryStorage::new())
    } else {
        log::info!("Using storage at {}", config.storage.data_dir.display());
        Arc::new(LocalStorage::new(&config.storage.data_dir))
    };
    Ok(Arc::new(Scheduler::open(config, store).await?))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config);
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }
    init_logging(cli.verbose, &config.logging.level);
    if !cli.config.exists() {
        log::warn!("No config at {}, using defaults", cli.config.display());
    }

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    match cli.command {
        #[cfg(feature = "server")]
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let scheduler = open_scheduler(&config, cli.ephemeral).await?;

            let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
            let driver = tokio::spawn(run_periodic(
                Arc::clone(&scheduler),
                config.scheduler.tick_interval(),
                async move {
                    let mut stop_rx = stop_rx;
                    let _ = stop_rx.changed().await;
                },
            ));

            let served = sitewatch::server::serve(&bind, scheduler, shutdown_signal()).await;
            let _ = stop_tx.send(true);
            if let Err(e) = driver.await {
                log::error!("Periodic driver panicked: {}", e);
            }
            served?;
        }

        Command::Run => {
            let scheduler = open_scheduler(&config, cli.ephemeral).await?;
            run_periodic(scheduler, config.scheduler.tick_interval(), shutdown_signal()).await;
        }

        Command::Add {
            url,
            interval_hours,
            max_pages,
        } => {
            let scheduler = open_scheduler(&config, cli.ephemeral).await?;
            let interval_secs = interval_hours.map(|h| (h * 3600.0).round().max(0.0) as u64);
            let added = scheduler.add_site(&url, interval_secs, max_pages).await?;

            log::info!(
                "Monitoring {} every {:.1}h ({} pages)",
                added.site.url,
                added.site.check_interval_hours(),
                added.site.max_pages
            );
            if let Some(result) = &added.initial_result {
                print_json(&CheckReport::from(result))?;
            }
        }

        Command::Remove { url } => {
            let scheduler = open_scheduler(&config, cli.ephemeral).await?;
            let site = scheduler.remove_site(&url).await?;
            log::info!("Removed {}", site.url);
        }

        Command::List => {
            let scheduler = open_scheduler(&config, cli.ephemeral).await?;
            let sites: Vec<SiteSummary> = scheduler
                .list_sites()
                .await
                .iter()
                .map(SiteSummary::from)
                .collect();

            if sites.is_empty() {
                log::info!("No sites are being monitored.");
            }
            for site in &sites {
                let never = || "Never".to_string();
                println!(
                    "{}  every {:.1}h  max {} pages  last check: {}  last update: {}",
                    site.url,
                    site.check_interval_hours,
                    site.max_pages,
                    site.last_check.map_or_else(never, |t| t.to_rfc3339()),
                    site.last_update.map_or_else(never, |t| t.to_rfc3339()),
                );
            }
        }

        Command::Check { url } => {
            let scheduler = open_scheduler(&config, cli.ephemeral).await?;
            match url {
                Some(url) => {
                    let result = scheduler.check_site(&url).await?;
                    print_json(&CheckReport::from(&result))?;
                }
                None => {
                    let results = scheduler.check_due().await;
                    let summary = SweepSummary::from_results(&results);
                    let reports: Vec<CheckReport> = results.iter().map(CheckReport::from).collect();
                    print_json(&reports)?;
                    log::info!(
                        "{} checked, {} updated, {} error(s), {} skipped",
                        summary.checked,
                        summary.updated,
                        summary.errors,
                        summary.skipped
                    );
                }
            }
        }

        Command::Validate => {
            log::info!("✓ Config OK ({})", cli.config.display());
        }
    }

    Ok(())
}
