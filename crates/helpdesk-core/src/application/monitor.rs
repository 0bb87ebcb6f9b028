//! Periodic escalation monitor
//!
//! Runs one escalation check per interval tick until the shutdown signal
//! flips to `true`. A failing tick is logged and the loop carries on.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::ports::inbound::TicketUseCases;

#[derive(Debug, Default)]
pub struct MonitorStats {
    pub ticks: AtomicU64,
    pub escalations: AtomicU64,
    pub failed_ticks: AtomicU64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MonitorSnapshot {
    pub ticks: u64,
    pub escalations: u64,
    pub failed_ticks: u64,
}

impl MonitorStats {
    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            escalations: self.escalations.load(Ordering::Relaxed),
            failed_ticks: self.failed_ticks.load(Ordering::Relaxed),
        }
    }
}

pub struct EscalationMonitor {
    tickets: Arc<dyn TicketUseCases>,
    check_interval: Duration,
    stats: Arc<MonitorStats>,
}

impl EscalationMonitor {
    pub fn new(tickets: Arc<dyn TicketUseCases>, check_interval: Duration) -> Self {
        Self { tickets, check_interval, stats: Arc::new(MonitorStats::default()) }
    }

    pub fn stats(&self) -> Arc<MonitorStats> {
        self.stats.clone()
    }

    /// Run a single check and record it
    pub async fn tick(&self) -> u64 {
        self.stats.ticks.fetch_add(1, Ordering::Relaxed);
        match self.tickets.run_escalation_check().await {
            Ok(fired) => {
                let count = fired.len() as u64;
                self.stats.escalations.fetch_add(count, Ordering::Relaxed);
                if count > 0 {
                    tracing::info!(escalated = count, "escalation tick");
                } else {
                    tracing::debug!("escalation tick found nothing to escalate");
                }
                count
            }
            Err(e) => {
                self.stats.failed_ticks.fetch_add(1, Ordering::Relaxed);
                tracing::error!(error = %e, "escalation tick failed");
                0
            }
        }
    }

    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> MonitorSnapshot {
        let mut ticker = interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(check_interval_secs = self.check_interval.as_secs(), "escalation monitor started");

        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        tracing::info!("escalation monitor shutting down");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        let snapshot = self.stats.snapshot();
        tracing::info!(
            ticks = snapshot.ticks,
            escalations = snapshot.escalations,
            failed_ticks = snapshot.failed_ticks,
            "escalation monitor stopped"
        );
        snapshot
    }
}
