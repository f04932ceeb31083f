//! fxwatch - Currency Threshold Alerts Server
//!
//! Checks favorite currency conversions against live rates and notifies
//! subscribers when a threshold is crossed.

mod config;
mod routes;
mod scheduler;
mod state;

use clap::Parser;
use config::AppConfig;
use fxwatch_alerts::{Database, ThresholdDispatcher};
use fxwatch_rates::ExchangeRatesClient;
use state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// fxwatch CLI
#[derive(Parser, Debug)]
#[command(name = "fxwatch")]
#[command(about = "Currency threshold alerts server", long_about = None)]
struct Args {
    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// HTTP port, overrides PORT
    #[arg(short, long)]
    port: Option<u16>,

    /// Run the threshold check in-process every N seconds, overrides CHECK_INTERVAL_SECS
    #[arg(long)]
    check_interval: Option<u64>,
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
    }
    warn!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    init_logging(&args.log_level);

    let mut config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.check_interval.is_some() {
        config.check_interval_secs = args.check_interval;
    }

    info!("fxwatch starting...");
    info!("  Environment: {:?}", config.environment);
    info!("  Port: {}", config.port);
    info!("  Max checks per run: {}", config.dispatcher.max_checks_per_run);

    let http = match reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
    {
        Ok(http) => http,
        Err(e) => {
            error!(error = %e, "Failed to build HTTP client");
            std::process::exit(1);
        }
    };

    let db = match Database::connect(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            std::process::exit(1);
        }
    };
    info!("Database initialized");

    let rates = Arc::new(ExchangeRatesClient::with_http_client(
        http.clone(),
        config.rates_base_url.clone(),
    ));
    let notifier = config.notifier.build(http);
    info!(channel = notifier.channel(), "Notifier configured");

    let dispatcher = Arc::new(ThresholdDispatcher::new(
        Arc::new(db.clone()),
        rates.clone(),
        notifier,
        config.dispatcher.clone(),
    ));

    let (shutdown_tx, shutdown) = watch::channel(false);

    let scheduler_handle = config.check_interval_secs.filter(|&s| s > 0).map(|secs| {
        tokio::spawn(scheduler::run_threshold_scheduler(
            dispatcher.clone(),
            config.api_key.clone(),
            Duration::from_secs(secs),
            shutdown.clone(),
        ))
    });

    let state = Arc::new(AppState {
        dispatcher,
        rates,
        db: db.clone(),
        api_key: config.api_key.clone(),
        shutdown,
    });
    let app = routes::create_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, port = config.port, "Failed to bind HTTP listener");
            std::process::exit(1);
        }
    };
    info!("Server listening on http://0.0.0.0:{}", config.port);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
    {
        error!(error = %e, "Server error");
    }

    // Wait for the scheduler to wind down, then abort
    if let Some(mut handle) = scheduler_handle {
        if tokio::time::timeout(Duration::from_secs(5), &mut handle)
            .await
            .is_err()
        {
            warn!("Scheduler did not stop in time, aborting");
            handle.abort();
        }
    }
    db.close().await;
    info!("Shutdown complete");
}
