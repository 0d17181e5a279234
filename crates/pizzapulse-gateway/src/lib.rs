//! pizzapulse gateway library entry.
//!
//! Wires the telemetry pipeline (`obs`) into an axum HTTP stack: the guard and
//! tracking middleware feed the shared `Telemetry`, and a background
//! `Scheduler` drains it to the metrics sink. Consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
pub mod transport;
