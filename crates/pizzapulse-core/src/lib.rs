//! pizzapulse core: transport-agnostic telemetry primitives and error types.
//!
//! This crate defines the inbound event vocabulary (what the HTTP layer reports)
//! and the outbound wire line (what the sink receives). It carries no runtime or
//! transport dependencies so the classification and serialization rules can be
//! tested in isolation.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Unknown input is classified as "ignored" rather than surfacing as an error, so
//! telemetry accounting can never take a request down with it.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorCode, PulseError, Result};
