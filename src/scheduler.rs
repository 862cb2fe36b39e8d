//! Periodic triggers for the dashboard. Each loop awaits its tick body before
//! waiting for the next tick, so a trigger never overlaps itself.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::dashboard::DashboardService;
use crate::event::PushEvent;

async fn run_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut on_tick: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::info!(task = name, period_ms = period.as_millis() as u64, "Scheduled task started");

    loop {
        tokio::select! {
            _ = ticker.tick() => on_tick().await,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    tracing::info!(task = name, "Scheduled task shutting down");
}

fn publish(events: &broadcast::Sender<PushEvent>, event: PushEvent) {
    let name = event.name();
    match events.send(event) {
        Ok(receivers) => tracing::debug!(event = name, receivers, "Push event broadcast"),
        Err(_) => tracing::debug!(event = name, "No connected clients for push event"),
    }
}

pub fn spawn_signal_refresh(
    service: Arc<DashboardService>,
    events: broadcast::Sender<PushEvent>,
    period: Duration,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(run_periodic("signal-refresh", period, shutdown, move || {
        let service = service.clone();
        let events = events.clone();
        async move {
            tracing::info!("Generating new trading signals...");
            let fresh = service.generate().await;
            if !fresh.is_empty() {
                let count = fresh.len();
                publish(&events, PushEvent::NewSignals(fresh));
                tracing::info!(count, "Emitted new signals");
            }
        }
    }))
}

pub fn spawn_portfolio_refresh(
    service: Arc<DashboardService>,
    events: broadcast::Sender<PushEvent>,
    period: Duration,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(run_periodic("portfolio-refresh", period, shutdown, move || {
        let service = service.clone();
        let events = events.clone();
        async move {
            let snapshot = service.tick_portfolio().await;
            tracing::info!(
                portfolio_value = snapshot.portfolio_value,
                daily_profit = snapshot.daily_profit,
                "Portfolio data updated"
            );
            publish(&events, PushEvent::PortfolioUpdate(snapshot));
        }
    }))
}

pub fn spawn_heartbeat(period: Duration, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(run_periodic("heartbeat", period, shutdown, || async {
        tracing::info!("Server health check - Running OK");
    }))
}
