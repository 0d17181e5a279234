//! Recording handle shared by the HTTP layer and the flush task.
//!
//! Built once in `main` and cloned into `AppState` and the `SnapshotBuilder`.
//! Every `on_*` call is synchronous and never touches the network.

use std::sync::Arc;

use pizzapulse_core::protocol::event::{
    AuthOutcome, HttpMethod, LatencyCategory, OrderOutcome, SessionChange,
};

use super::latency::LatencyAggregator;
use super::registry::{CounterEvent, CounterRegistry, RegistryDrain};

#[derive(Clone, Default)]
pub struct Telemetry {
    inner: Arc<TelemetryInner>,
}

#[derive(Default)]
struct TelemetryInner {
    counters: CounterRegistry,
    latency: LatencyAggregator,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_http_request_received(&self, method: HttpMethod) {
        self.inner.counters.record(CounterEvent::HttpRequest(method));
    }

    /// 200 counts as success, >= 400 as failure, anything else is ignored.
    pub fn on_auth_outcome(&self, status: u16) {
        if let Some(outcome) = AuthOutcome::from_status(status) {
            self.inner.counters.record(CounterEvent::Auth(outcome));
        }
    }

    /// Moves the active-session gauge per `SessionChange::classify`.
    pub fn on_session_shape_observed(&self, method: HttpMethod, path: &str, status: u16) {
        if let Some(change) = SessionChange::classify(method, path, status) {
            self.inner.counters.record(CounterEvent::Session(change));
        }
    }

    pub fn on_request_completed(&self, method: HttpMethod, path: &str, duration_ms: f64) {
        for category in LatencyCategory::for_request(method, path) {
            self.inner.latency.observe(*category, duration_ms);
        }
    }

    pub fn on_order_outcome(&self, success: bool, revenue: Option<f64>) {
        let outcome = if success {
            OrderOutcome::Sold
        } else {
            OrderOutcome::Failure
        };
        self.inner
            .counters
            .record(CounterEvent::Order { outcome, revenue });
    }

    pub fn on_chaos_incident(&self, kind: &str) {
        self.inner.counters.record(CounterEvent::Chaos(kind));
    }

    pub fn drain_counters(&self) -> RegistryDrain {
        self.inner.counters.drain_all()
    }

    pub fn drain_latency(&self, category: LatencyCategory) -> Option<f64> {
        self.inner.latency.drain(category)
    }

    pub fn active_users(&self) -> i64 {
        self.inner.counters.active_users()
    }
}
