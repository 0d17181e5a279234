//! System sample sources (CPU and memory utilization).
//!
//! Both probes share one `sysinfo::System` and run on the blocking pool. The
//! CPU reading is the average since the previous refresh, so the probe is
//! primed once at construction and each flush reports usage over the whole
//! interval.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use sysinfo::System;

use pizzapulse_core::error::{PulseError, Result};

/// Pull-based probe returning one percentage (0..=100) per query.
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Used as the `type` tag and in logs.
    fn name(&self) -> &'static str;
    async fn sample(&self) -> Result<f64>;
}

/// Query `source`, giving up after `timeout`. Non-finite readings are failures.
pub async fn sample_bounded(source: &dyn SampleSource, timeout: Duration) -> Result<f64> {
    let name = source.name();
    let value = tokio::time::timeout(timeout, source.sample())
        .await
        .map_err(|_| PulseError::ProbeTimeout(name))??;

    if !value.is_finite() {
        return Err(PulseError::Probe {
            probe: name,
            reason: format!("non-finite reading {value}"),
        });
    }
    Ok(value.clamp(0.0, 100.0))
}

type SharedSystem = Arc<Mutex<System>>;

fn lock(system: &SharedSystem) -> MutexGuard<'_, System> {
    system.lock().unwrap_or_else(|e| e.into_inner())
}

/// Build the CPU and memory probes over a single shared `System`.
pub fn system_probes() -> (CpuProbe, MemoryProbe) {
    let mut system = System::new();
    system.refresh_cpu_usage();
    let system = Arc::new(Mutex::new(system));

    (
        CpuProbe {
            system: Arc::clone(&system),
        },
        MemoryProbe { system },
    )
}

pub struct CpuProbe {
    system: SharedSystem,
}

#[async_trait]
impl SampleSource for CpuProbe {
    fn name(&self) -> &'static str {
        "cpu"
    }

    async fn sample(&self) -> Result<f64> {
        let system = Arc::clone(&self.system);
        tokio::task::spawn_blocking(move || {
            let mut sys = lock(&system);
            sys.refresh_cpu_usage();
            if sys.cpus().is_empty() {
                return Err(PulseError::Probe {
                    probe: "cpu",
                    reason: "no cpus reported".into(),
                });
            }
            Ok(f64::from(sys.global_cpu_usage()))
        })
        .await
        .map_err(|e| PulseError::Internal(format!("cpu probe task failed: {e}")))?
    }
}

pub struct MemoryProbe {
    system: SharedSystem,
}

#[async_trait]
impl SampleSource for MemoryProbe {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn sample(&self) -> Result<f64> {
        let system = Arc::clone(&self.system);
        tokio::task::spawn_blocking(move || {
            let mut sys = lock(&system);
            sys.refresh_memory();
            let (used, total) = match sys.cgroup_limits() {
                Some(cgroup) => (cgroup.rss, cgroup.total_memory),
                None => (sys.used_memory(), sys.total_memory()),
            };
            used_percent(used, total)
        })
        .await
        .map_err(|e| PulseError::Internal(format!("memory probe task failed: {e}")))?
    }
}

fn used_percent(used: u64, total: u64) -> Result<f64> {
    if total == 0 {
        return Err(PulseError::Probe {
            probe: "memory",
            reason: "total memory reported as zero".into(),
        });
    }
    Ok(used as f64 / total as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    #[async_trait]
    impl SampleSource for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }
        async fn sample(&self) -> Result<f64> {
            Ok(self.0)
        }
    }

    struct Stuck;

    #[async_trait]
    impl SampleSource for Stuck {
        fn name(&self) -> &'static str {
            "stuck"
        }
        async fn sample(&self) -> Result<f64> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn bounded_sample_clamps() {
        let v = sample_bounded(&Fixed(130.0), Duration::from_millis(100)).await.unwrap();
        assert_eq!(v, 100.0);
    }

    #[tokio::test]
    async fn bounded_sample_rejects_nan() {
        let err = sample_bounded(&Fixed(f64::NAN), Duration::from_millis(100))
            .await
            .unwrap_err();
        assert_eq!(err.code().as_str(), "PROBE_FAILED");
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_sample_times_out() {
        let err = sample_bounded(&Stuck, Duration::from_millis(250)).await.unwrap_err();
        assert_eq!(err.code().as_str(), "PROBE_TIMEOUT");
    }

    #[test]
    fn used_percent_handles_zero_total() {
        assert!(used_percent(1, 0).is_err());
        assert_eq!(used_percent(1, 4).unwrap(), 25.0);
    }

    #[tokio::test]
    async fn real_probes_report_percentages() {
        let (cpu, memory) = system_probes();
        let timeout = Duration::from_secs(5);

        let m = sample_bounded(&memory, timeout).await.unwrap();
        assert!((0.0..=100.0).contains(&m));

        // Some sandboxes hide /proc/stat; only check the range when it works.
        if let Ok(c) = sample_bounded(&cpu, timeout).await {
            assert!((0.0..=100.0).contains(&c));
        }
    }
}
