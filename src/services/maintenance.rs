//! Background cache sweeping.
//!
//! Reads already ignore expired rows; the sweep only reclaims space and
//! enforces `cache.max_entries`.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::CacheConfig;
use crate::db::Store;
use crate::services::Clock;

const JOB_NAME: &str = "cache_sweep";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub expired_entries: u64,
    pub expired_alerts: u64,
    pub trimmed_entries: u64,
}

#[derive(Clone)]
pub struct CacheSweeper {
    store: Store,
    config: CacheConfig,
    clock: Clock,
    running: Arc<RwLock<bool>>,
}

impl CacheSweeper {
    #[must_use]
    pub fn new(store: Store, config: CacheConfig, clock: Clock) -> Self {
        Self {
            store,
            config,
            clock,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// One pass: expired cache rows, expired alerts, then the size bound.
    pub async fn sweep_once(&self) -> Result<SweepReport> {
        let now = (self.clock)();

        let expired_entries = self.store.delete_expired_cache_entries(now).await?;
        let expired_alerts = self.store.delete_expired_alerts(now).await?;
        let trimmed_entries = if self.config.max_entries > 0 {
            self.store.trim_cache_entries(self.config.max_entries).await?
        } else {
            0
        };

        let report = SweepReport {
            expired_entries,
            expired_alerts,
            trimmed_entries,
        };

        metrics::counter!("cache_sweep_deleted_total", "kind" => "expired_entry")
            .increment(expired_entries);
        metrics::counter!("cache_sweep_deleted_total", "kind" => "expired_alert")
            .increment(expired_alerts);
        metrics::counter!("cache_sweep_deleted_total", "kind" => "trimmed_entry")
            .increment(trimmed_entries);

        Ok(report)
    }

    async fn run_job(&self) {
        let start = std::time::Instant::now();
        info!(event = "job_started", job_name = JOB_NAME, "Starting cache sweep");

        match self.sweep_once().await {
            Ok(report) => info!(
                event = "job_finished",
                job_name = JOB_NAME,
                expired_entries = report.expired_entries,
                expired_alerts = report.expired_alerts,
                trimmed_entries = report.trimmed_entries,
                duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                "Cache sweep finished"
            ),
            Err(e) => error!(
                event = "job_failed",
                job_name = JOB_NAME,
                error = %e,
                "Cache sweep failed"
            ),
        }
    }

    /// Runs until [`stop`](Self::stop) is called. Returns immediately when
    /// neither an interval nor a cron expression is configured.
    pub async fn start(&self) -> Result<()> {
        if self.config.sweep_interval_minutes == 0 && self.config.sweep_cron.is_none() {
            info!("Cache sweeper is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;

        if let Some(cron_expr) = &self.config.sweep_cron {
            self.run_with_cron(cron_expr).await
        } else {
            self.run_with_interval().await
        }
    }

    pub async fn stop(&self) {
        *self.running.write().await = false;
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let sweeper = self.clone();
        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let sweeper = sweeper.clone();
            Box::pin(async move {
                if !*sweeper.running.read().await {
                    return;
                }
                sweeper.run_job().await;
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;
        info!("Cache sweeper running with cron: {}", cron_expr);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let minutes = self.config.sweep_interval_minutes;
        info!("Cache sweeper running every {}m", minutes);

        let mut ticker = interval(Duration::from_secs(u64::from(minutes) * 60));
        // The first tick fires immediately; skip it so startup stays quiet.
        ticker.tick().await;

        let mut shutdown_check = interval(Duration::from_secs(1));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !*self.running.read().await {
                        break;
                    }
                    self.run_job().await;
                }
                _ = shutdown_check.tick() => {
                    if !*self.running.read().await {
                        break;
                    }
                }
            }
        }

        info!("Cache sweeper stopped");
        Ok(())
    }
}
