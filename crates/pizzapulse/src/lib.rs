//! Top-level facade crate for pizzapulse.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use pizzapulse_core::*;
}

pub mod gateway {
    pub use pizzapulse_gateway::*;
}
