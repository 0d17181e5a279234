//! Shared application state.
//!
//! Holds the loaded config, the telemetry recording handle, and the draining
//! flag flipped on shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::PulseConfig;
use crate::obs::Telemetry;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    telemetry: Telemetry,
}

struct AppStateInner {
    cfg: PulseConfig,
    draining: AtomicBool,
}

impl AppState {
    pub fn new(cfg: PulseConfig, telemetry: Telemetry) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                draining: AtomicBool::new(false),
            }),
            telemetry,
        }
    }

    pub fn cfg(&self) -> &PulseConfig {
        &self.inner.cfg
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Mark draining state.
    pub fn set_draining(&self) {
        self.inner.draining.store(true, Ordering::Relaxed);
    }

    /// Return whether draining is active.
    pub fn is_draining(&self) -> bool {
        self.inner.draining.load(Ordering::Relaxed)
    }
}
