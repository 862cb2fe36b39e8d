use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, watch};

use tradesafe::api::{self, AppState};
use tradesafe::config::{Config, LoggingConfig};
use tradesafe::dashboard::DashboardService;
use tradesafe::event::PushEvent;
use tradesafe::scheduler;

const PUSH_CHANNEL_CAPACITY: usize = 64;

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        logging
            .level
            .parse()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        tracing::error!(panic = %panic_info, "Unrecoverable panic, exiting");
        eprintln!("Application panicked: {}", panic_info);
        std::process::exit(1);
    }));
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => tracing::info!("Ctrl+C received"),
                    _ = sigterm.recv() => tracing::info!("SIGTERM received, shutting down gracefully"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler, waiting for Ctrl+C only");
                tokio::signal::ctrl_c().await.ok();
                tracing::info!("Ctrl+C received");
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Ctrl+C received");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load config
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            eprintln!("Make sure config/default.toml exists or TRADESAFE_CONFIG points to a config file");
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging);
    install_panic_hook();

    let finnhub_status = if config.finnhub.is_configured() {
        "Configured"
    } else {
        "Not Configured - Using Mock Data"
    };
    tracing::info!(
        port = config.server.port,
        environment = %config.server.environment,
        finnhub = finnhub_status,
        signal_interval = %config.scheduler.signal_interval,
        portfolio_interval = %config.scheduler.portfolio_interval,
        "Starting tradesafe"
    );

    let service = Arc::new(
        DashboardService::from_config(&config).context("failed to build dashboard service")?,
    );
    service.warm_up(config.signals.initial_batches).await;

    // Channels
    let (events_tx, _) = broadcast::channel::<PushEvent>(PUSH_CHANNEL_CAPACITY);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let tasks = vec![
        scheduler::spawn_signal_refresh(
            service.clone(),
            events_tx.clone(),
            config.scheduler.signal_interval()?,
            shutdown_rx.clone(),
        ),
        scheduler::spawn_portfolio_refresh(
            service.clone(),
            events_tx.clone(),
            config.scheduler.portfolio_interval()?,
            shutdown_rx.clone(),
        ),
        scheduler::spawn_heartbeat(config.scheduler.heartbeat_interval()?, shutdown_rx.clone()),
    ];

    let signal_shutdown = shutdown_tx.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        let _ = signal_shutdown.send(true);
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, "Dashboard API listening");

    let state = AppState::new(
        service,
        events_tx,
        shutdown_rx,
        &config.server.environment,
    );
    let served = api::start_server(state, listener).await;

    let _ = shutdown_tx.send(true);
    for task in tasks {
        let _ = task.await;
    }
    served.context("dashboard API server failed")?;
    tracing::info!("Process terminated");
    Ok(())
}
