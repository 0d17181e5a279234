//! Snapshot building: drain everything, sample probes, emit metric lines.
//!
//! Line order is fixed: requests, auth, active users, system, latency, pizza,
//! chaos. Counters are emitted even when zero so an idle service still shows
//! up; latency and failed probes are omitted instead of being reported as 0.

use std::sync::Arc;
use std::time::Duration;

use pizzapulse_core::protocol::event::LatencyCategory;
use pizzapulse_core::protocol::line::MetricLine;

use super::probe::{sample_bounded, SampleSource};
use super::registry::RegistryDrain;
use super::telemetry::Telemetry;

/// One flush worth of metric lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    lines: Vec<MetricLine>,
}

impl Snapshot {
    pub fn lines(&self) -> &[MetricLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<MetricLine> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// First line with this prefix whose context tag has this value.
    pub fn find(&self, prefix: &str, tag_value: &str) -> Option<&MetricLine> {
        self.lines.iter().find(|l| {
            l.prefix() == prefix && l.tags().get(1).is_some_and(|(_, v)| v == tag_value)
        })
    }

    /// Encoded lines, in order.
    pub fn encoded(&self) -> Vec<String> {
        self.lines.iter().map(MetricLine::encode).collect()
    }
}

/// Probe results for one snapshot. `None` means the probe failed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemReadings {
    pub cpu: Option<f64>,
    pub memory: Option<f64>,
}

/// Pure line construction.
pub fn lines_from(
    source: &str,
    counters: &RegistryDrain,
    system: SystemReadings,
    latency: &[(LatencyCategory, Option<f64>)],
) -> Vec<MetricLine> {
    let mut out = Vec::with_capacity(16 + counters.chaos.len());

    out.push(MetricLine::new("request", source, ("method", "all"), "total", counters.requests_all));
    for (method, n) in counters.requests {
        out.push(MetricLine::new("request", source, ("method", method.as_str()), "total", n));
    }

    for (outcome, n) in counters.auth {
        out.push(MetricLine::new("auth", source, ("status", outcome.as_str()), "total", n));
    }

    out.push(MetricLine::new("user", source, ("type", "active"), "total", counters.active_users));

    if let Some(cpu) = system.cpu {
        out.push(MetricLine::new("system", source, ("type", "cpu"), "usage", cpu));
    }
    if let Some(memory) = system.memory {
        out.push(MetricLine::new("system", source, ("type", "memory"), "usage", memory));
    }

    for (category, mean) in latency {
        if let Some(mean) = mean {
            out.push(MetricLine::new(
                "latency",
                source,
                ("type", category.as_str()),
                "mean_ms",
                *mean,
            ));
        }
    }

    for (outcome, n) in counters.orders {
        out.push(MetricLine::new("pizza", source, ("status", outcome.as_str()), "total", n));
    }
    out.push(MetricLine::new("pizza", source, ("type", "revenue"), "total", counters.revenue));

    for (kind, n) in &counters.chaos {
        out.push(MetricLine::new("chaos", source, ("type", kind.as_str()), "total", *n));
    }

    out
}

/// Drains the shared `Telemetry` and samples the system probes.
pub struct SnapshotBuilder {
    telemetry: Telemetry,
    source: String,
    cpu: Arc<dyn SampleSource>,
    memory: Arc<dyn SampleSource>,
    probe_timeout: Duration,
}

impl SnapshotBuilder {
    pub fn new(
        telemetry: Telemetry,
        source: impl Into<String>,
        cpu: Arc<dyn SampleSource>,
        memory: Arc<dyn SampleSource>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            telemetry,
            source: source.into(),
            cpu,
            memory,
            probe_timeout,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Counters and latency are drained before the probes run, so a slow probe
    /// does not widen the window the counters describe.
    pub async fn build(&self) -> Snapshot {
        let counters = self.telemetry.drain_counters();
        let latency: Vec<(LatencyCategory, Option<f64>)> = LatencyCategory::ALL
            .iter()
            .map(|c| (*c, self.telemetry.drain_latency(*c)))
            .collect();

        let system = SystemReadings {
            cpu: self.read(self.cpu.as_ref()).await,
            memory: self.read(self.memory.as_ref()).await,
        };

        Snapshot {
            lines: lines_from(&self.source, &counters, system, &latency),
        }
    }

    async fn read(&self, probe: &dyn SampleSource) -> Option<f64> {
        match sample_bounded(probe, self.probe_timeout).await {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(
                    probe = probe.name(),
                    code = e.code().as_str(),
                    error = %e,
                    "probe skipped"
                );
                None
            }
        }
    }
}
