//! Telemetry pipeline: in-process aggregation and periodic export.
//!
//! Request handling records into `Telemetry` (atomics, no awaits). The
//! `Scheduler` wakes on its own cadence, `SnapshotBuilder` drains everything
//! into metric lines, and `Exporter` pushes each line to the sink. Nothing in
//! here can fail a request: probe and push errors are logged and dropped.

pub mod exporter;
pub mod latency;
pub mod probe;
pub mod registry;
pub mod scheduler;
pub mod snapshot;
pub mod telemetry;

pub use exporter::{ExportSummary, Exporter, HttpSink, MetricSink};
pub use probe::SampleSource;
pub use scheduler::{Scheduler, SchedulerHandle};
pub use snapshot::{Snapshot, SnapshotBuilder};
pub use telemetry::Telemetry;
