//! Periodic flush trigger.
//!
//! Every `interval` the scheduler spawns one flush task (build snapshot, then
//! export). At most one flush is in flight: if the previous one is still
//! pushing when the next tick fires, that tick is skipped and the counters keep
//! accumulating for the following one.
//!
//! The loop is an ordinary tokio task. It holds no runtime open by itself, and
//! `SchedulerHandle::stop` ends the loop without cancelling a flush that has
//! already started.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::exporter::{ExportSummary, Exporter};
use super::snapshot::SnapshotBuilder;

pub struct Scheduler {
    builder: Arc<SnapshotBuilder>,
    exporter: Arc<Exporter>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(builder: SnapshotBuilder, exporter: Exporter, interval: Duration) -> Self {
        Self {
            builder: Arc::new(builder),
            exporter: Arc::new(exporter),
            interval,
        }
    }

    /// Start ticking. The first flush happens one interval from now.
    pub fn spawn(self) -> SchedulerHandle {
        let interval = self.interval;
        let task = tokio::spawn(self.run());
        tracing::info!(interval_ms = interval.as_millis() as u64, "metrics scheduler started");
        SchedulerHandle { task }
    }

    /// Build and export one snapshot right now.
    pub async fn flush_once(&self) -> ExportSummary {
        flush(&self.builder, &self.exporter).await
    }

    async fn run(self) {
        let mut tick = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut in_flight: Option<JoinHandle<()>> = None;

        loop {
            tick.tick().await;

            if in_flight.as_ref().is_some_and(|h| !h.is_finished()) {
                tracing::warn!("previous metrics flush still running; skipping tick");
                continue;
            }

            let builder = Arc::clone(&self.builder);
            let exporter = Arc::clone(&self.exporter);
            in_flight = Some(tokio::spawn(async move {
                flush(&builder, &exporter).await;
            }));
        }
    }
}

async fn flush(builder: &SnapshotBuilder, exporter: &Exporter) -> ExportSummary {
    let snapshot = builder.build().await;
    let summary = exporter.send(snapshot.into_lines()).await;
    tracing::debug!(
        source = builder.source(),
        attempted = summary.attempted,
        delivered = summary.delivered,
        failed = summary.failed,
        "metrics flushed"
    );
    summary
}

/// Handle to the ticking loop.
pub struct SchedulerHandle {
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop ticking. A flush already in progress runs to completion.
    pub fn stop(self) {
        self.task.abort();
        tracing::info!("metrics scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}
