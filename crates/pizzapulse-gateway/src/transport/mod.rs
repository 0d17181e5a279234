//! HTTP integration.
//!
//! `path_guard` rejects hostile request paths before anything else runs;
//! `http` reports every request that gets past it to the telemetry handle.

pub mod http;
pub mod path_guard;
