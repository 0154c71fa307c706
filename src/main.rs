//! CEC TV GW
//!
//! Runs cec-client, tracks the TV's power and input from its traffic, and
//! exposes that state on the console.

use anyhow::{Context, Result};
use clap::Parser;
use std::future::pending;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cec_tv_gw::adapter::AdapterProcess;
use cec_tv_gw::config::{AppConfig, ConfigWatcher};
use cec_tv_gw::{sniffer, CecSession, StateChange};

/// Config file picked up from the working directory when none is given
const DEFAULT_CONFIG: &str = "config.yaml";

/// CEC TV GW - Track and control a TV over HDMI-CEC via cec-client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults to ./config.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Also write JSON logs to a daily rolling file in this directory
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Open the interactive console
    #[arg(long)]
    repl: bool,

    /// Only print decoded adapter traffic
    #[arg(long, conflicts_with = "repl")]
    sniffer: bool,

    /// Print state changes (or sniffer frames) as JSON lines on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let _log_guard = init_logging(&args.log_level, args.log_file.as_deref())?;

    info!("Starting CEC TV GW v{}...", env!("CARGO_PKG_VERSION"));

    let (config, config_path) = load_config(args.config.as_deref()).await?;

    let mut adapter = AdapterProcess::spawn(&config.adapter.program, &config.adapter.args)
        .context("Failed to start CEC adapter")?;
    let (stdout, stdin) = adapter.take_pipes()?;

    if args.sniffer {
        // cec-client quits when its stdin closes
        let _stdin = stdin;
        tokio::select! {
            res = sniffer::run_sniffer(stdout, args.json) => {
                res.context("Sniffer failed")?;
            }
            _ = shutdown_signal() => {}
        }
        adapter.stop().await;
        return Ok(());
    }

    let session = CecSession::start(stdout, stdin, config.timing());

    if args.json {
        session.machine().subscribe(Arc::new(print_change));
    }

    let repl = if args.repl {
        let machine = session.machine();
        let name = config.name.clone();
        Some(tokio::task::spawn_blocking(move || {
            cli::run_repl(machine, &name)
        }))
    } else {
        None
    };

    let watcher = match config_path {
        Some(path) => match ConfigWatcher::new(path) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("Config hot-reload disabled: {:#}", e);
                None
            }
        },
        None => None,
    };

    let repl_running = run_app(session, config, watcher, repl).await;

    adapter.stop().await;
    info!("CEC TV GW shutdown complete");

    if repl_running {
        // The console thread is parked in readline; don't wait for it
        std::process::exit(0);
    }

    Ok(())
}

/// Main event loop; returns whether the console is still running
async fn run_app(
    mut session: CecSession,
    mut config: AppConfig,
    mut watcher: Option<ConfigWatcher>,
    mut repl: Option<JoinHandle<Result<()>>>,
) -> bool {
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            res = session.wait() => {
                match res {
                    Ok(()) => warn!("CEC adapter closed its output, stopping"),
                    Err(e) => error!("CEC adapter failed: {}", e),
                }
                break;
            }

            Some(new_config) = next_config(&mut watcher) => {
                info!("📝 Configuration file changed, reloading...");
                if new_config.adapter != config.adapter {
                    warn!("Adapter settings changed; restart to apply them");
                }
                session.update_timing(new_config.timing());
                config = new_config;
                info!("✅ Configuration reloaded");
            }

            res = wait_repl(&mut repl) => {
                match res {
                    Ok(Ok(())) => info!("Console closed"),
                    Ok(Err(e)) => error!("Console failed: {:#}", e),
                    Err(e) => error!("Console task failed: {}", e),
                }
                repl = None;
                break;
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }
    }

    if let Err(e) = session.shutdown().await {
        warn!("CEC session ended with error: {}", e);
    }

    repl.is_some()
}

async fn next_config(watcher: &mut Option<ConfigWatcher>) -> Option<AppConfig> {
    match watcher {
        Some(watcher) => watcher.next_config().await,
        None => pending().await,
    }
}

async fn wait_repl(
    repl: &mut Option<JoinHandle<Result<()>>>,
) -> Result<Result<()>, tokio::task::JoinError> {
    match repl {
        Some(handle) => handle.await,
        None => pending().await,
    }
}

fn print_change(change: StateChange) {
    match serde_json::to_string(&change) {
        Ok(line) => println!("{}", line),
        Err(e) => warn!("Failed to serialize state change: {}", e),
    }
}

async fn load_config(path: Option<&Path>) -> Result<(AppConfig, Option<PathBuf>)> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG);
            if !default.exists() {
                info!("No {} found, using built-in defaults", DEFAULT_CONFIG);
                return Ok((AppConfig::default(), None));
            }
            default
        }
    };

    let config = AppConfig::load(&path).await?;
    info!("Configuration file: {}", path.display());
    Ok((config, Some(path)))
}

fn init_logging(level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "cec-tv-gw.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    info!("Shutdown signal received");
}
