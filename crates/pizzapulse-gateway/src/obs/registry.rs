//! Counter registry.
//!
//! Every accumulator is a single atomic, so `add` and `drain` on the same
//! accumulator are ordered by the atomic's modification order: an increment
//! lands either before a drain (and is returned by it) or after it (and is
//! returned by the next one). Drains across different accumulators are not
//! atomic with each other.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use dashmap::DashMap;
use pizzapulse_core::protocol::event::{AuthOutcome, HttpMethod, OrderOutcome, SessionChange};
use pizzapulse_core::protocol::line::FieldValue;

/// Resettable integer counter.
#[derive(Debug, Default)]
pub struct Accumulator {
    value: AtomicU64,
}

impl Accumulator {
    /// Increment by 1.
    pub fn inc(&self) {
        self.add(1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, v: u64) {
        self.value.fetch_add(v, Ordering::Relaxed);
    }

    /// Return the current value and reset to zero.
    pub fn drain(&self) -> u64 {
        self.value.swap(0, Ordering::Relaxed)
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Running signed value. Never reset.
#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicI64,
}

impl Gauge {
    /// Add an arbitrary signed delta.
    pub fn add(&self, v: i64) {
        self.value.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Resettable float sum, stored as `f64` bits.
#[derive(Debug, Default)]
pub struct FloatAccumulator {
    bits: AtomicU64,
}

impl FloatAccumulator {
    pub fn add(&self, v: f64) {
        // The closure never returns None, so this cannot fail.
        let _ = self
            .bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| {
                Some((f64::from_bits(cur) + v).to_bits())
            });
    }

    pub fn drain(&self) -> f64 {
        f64::from_bits(self.bits.swap(0f64.to_bits(), Ordering::Relaxed))
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

/// Counters keyed by a dynamic label. Keys are never removed, so once a kind
/// has been seen it keeps being exported (as zero when idle).
#[derive(Debug, Default)]
pub struct KeyedAccumulator {
    map: DashMap<String, AtomicU64>,
}

impl KeyedAccumulator {
    pub fn inc(&self, key: &str) {
        if let Some(counter) = self.map.get(key) {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.map
            .entry(key.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Drain every key, sorted by key.
    pub fn drain(&self) -> Vec<(String, u64)> {
        let mut out: Vec<(String, u64)> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().swap(0, Ordering::Relaxed)))
            .collect();
        out.sort();
        out
    }
}

/// Events the registry understands.
#[derive(Debug, Clone, Copy)]
pub enum CounterEvent<'a> {
    HttpRequest(HttpMethod),
    Auth(AuthOutcome),
    Order {
        outcome: OrderOutcome,
        revenue: Option<f64>,
    },
    Session(SessionChange),
    Chaos(&'a str),
}

/// Values drained in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryDrain {
    pub requests_all: u64,
    pub requests: [(HttpMethod, u64); 4],
    pub auth: [(AuthOutcome, u64); 2],
    /// Gauge value at drain time (not reset).
    pub active_users: i64,
    pub orders: [(OrderOutcome, u64); 2],
    pub revenue: f64,
    pub chaos: Vec<(String, u64)>,
}

impl RegistryDrain {
    /// Look a value up by accumulator name (`request.get`, `auth.failure`,
    /// `user.active`, `pizza.sold`, `pizza.revenue`, `chaos.<kind>`, ...).
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        let (group, key) = name.split_once('.')?;
        match group {
            "request" if key == "all" => Some(self.requests_all.into()),
            "request" => self
                .requests
                .iter()
                .find(|(m, _)| m.as_str() == key)
                .map(|(_, v)| (*v).into()),
            "auth" => self
                .auth
                .iter()
                .find(|(a, _)| a.as_str() == key)
                .map(|(_, v)| (*v).into()),
            "user" if key == "active" => Some(self.active_users.into()),
            "pizza" if key == "revenue" => Some(self.revenue.into()),
            "pizza" => self
                .orders
                .iter()
                .find(|(o, _)| o.as_str() == key)
                .map(|(_, v)| (*v).into()),
            "chaos" => self
                .chaos
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| (*v).into()),
            _ => None,
        }
    }
}

/// Process-wide counters, shared by request handlers and the flush task.
#[derive(Debug, Default)]
pub struct CounterRegistry {
    requests_all: Accumulator,
    requests: [Accumulator; 4],
    auth: [Accumulator; 2],
    active_users: Gauge,
    orders: [Accumulator; 2],
    revenue: FloatAccumulator,
    chaos: KeyedAccumulator,
}

impl CounterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// O(1) and lock-free, except the first sighting of a chaos kind.
    pub fn record(&self, event: CounterEvent<'_>) {
        match event {
            CounterEvent::HttpRequest(method) => {
                self.requests_all.inc();
                if let Some(i) = method_slot(method) {
                    self.requests[i].inc();
                }
            }
            CounterEvent::Auth(outcome) => self.auth[auth_slot(outcome)].inc(),
            CounterEvent::Order { outcome, revenue } => {
                self.orders[order_slot(outcome)].inc();
                if outcome == OrderOutcome::Sold {
                    if let Some(r) = revenue.filter(|r| r.is_finite()) {
                        self.revenue.add(r);
                    }
                }
            }
            CounterEvent::Session(change) => self.active_users.add(change.delta()),
            CounterEvent::Chaos(kind) => self.chaos.inc(kind),
        }
    }

    /// Drain every resettable accumulator and read the gauge.
    pub fn drain_all(&self) -> RegistryDrain {
        let [get, post, put, delete] = HttpMethod::TRACKED;
        RegistryDrain {
            requests_all: self.requests_all.drain(),
            requests: [
                (get, self.requests[0].drain()),
                (post, self.requests[1].drain()),
                (put, self.requests[2].drain()),
                (delete, self.requests[3].drain()),
            ],
            auth: [
                (AuthOutcome::Success, self.auth[0].drain()),
                (AuthOutcome::Failure, self.auth[1].drain()),
            ],
            active_users: self.active_users.get(),
            orders: [
                (OrderOutcome::Sold, self.orders[0].drain()),
                (OrderOutcome::Failure, self.orders[1].drain()),
            ],
            revenue: self.revenue.drain(),
            chaos: self.chaos.drain(),
        }
    }

    pub fn active_users(&self) -> i64 {
        self.active_users.get()
    }
}

fn method_slot(method: HttpMethod) -> Option<usize> {
    HttpMethod::TRACKED.iter().position(|m| *m == method)
}

fn auth_slot(outcome: AuthOutcome) -> usize {
    match outcome {
        AuthOutcome::Success => 0,
        AuthOutcome::Failure => 1,
    }
}

fn order_slot(outcome: OrderOutcome) -> usize {
    match outcome {
        OrderOutcome::Sold => 0,
        OrderOutcome::Failure => 1,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn drain_returns_then_resets() {
        let reg = CounterRegistry::new();
        for _ in 0..3 {
            reg.record(CounterEvent::HttpRequest(HttpMethod::Get));
        }

        let first = reg.drain_all();
        assert_eq!(first.get("request.get"), Some(FieldValue::Int(3)));
        assert_eq!(first.get("request.all"), Some(FieldValue::Int(3)));

        let second = reg.drain_all();
        assert_eq!(second.get("request.get"), Some(FieldValue::Int(0)));
    }

    #[test]
    fn get_reads_without_resetting() {
        let acc = Accumulator::default();
        acc.inc();
        acc.add(4);
        assert_eq!(acc.get(), 5);
        assert_eq!(acc.get(), 5);
        assert_eq!(acc.drain(), 5);
        assert_eq!(acc.get(), 0);

        let revenue = FloatAccumulator::default();
        revenue.add(0.25);
        revenue.add(0.5);
        assert_eq!(revenue.get(), 0.75);
        assert_eq!(revenue.drain(), 0.75);
        assert_eq!(revenue.get(), 0.0);
    }

    #[test]
    fn foreign_method_only_counts_toward_all() {
        let reg = CounterRegistry::new();
        reg.record(CounterEvent::HttpRequest(HttpMethod::Other));

        let d = reg.drain_all();
        assert_eq!(d.requests_all, 1);
        assert!(d.requests.iter().all(|(_, v)| *v == 0));
    }

    #[test]
    fn gauge_survives_drain() {
        let reg = CounterRegistry::new();
        reg.record(CounterEvent::Session(SessionChange::Start));
        assert_eq!(reg.drain_all().active_users, 1);
        assert_eq!(reg.drain_all().active_users, 1);

        reg.record(CounterEvent::Session(SessionChange::End));
        assert_eq!(reg.drain_all().active_users, 0);
    }

    #[test]
    fn revenue_only_on_sold() {
        let reg = CounterRegistry::new();
        reg.record(CounterEvent::Order { outcome: OrderOutcome::Sold, revenue: Some(0.05) });
        reg.record(CounterEvent::Order { outcome: OrderOutcome::Sold, revenue: Some(0.0025) });
        reg.record(CounterEvent::Order { outcome: OrderOutcome::Failure, revenue: Some(9.0) });
        reg.record(CounterEvent::Order { outcome: OrderOutcome::Sold, revenue: Some(f64::NAN) });

        let d = reg.drain_all();
        assert_eq!(d.get("pizza.sold"), Some(FieldValue::Int(3)));
        assert_eq!(d.get("pizza.failure"), Some(FieldValue::Int(1)));
        assert!((d.revenue - 0.0525).abs() < 1e-12);
        assert_eq!(reg.drain_all().revenue, 0.0);
    }

    #[test]
    fn chaos_kinds_stay_listed_after_drain() {
        let reg = CounterRegistry::new();
        reg.record(CounterEvent::Chaos("url_encoding"));
        reg.record(CounterEvent::Chaos("url_encoding"));

        assert_eq!(reg.drain_all().get("chaos.url_encoding"), Some(FieldValue::Int(2)));
        assert_eq!(reg.drain_all().chaos, vec![("url_encoding".to_string(), 0)]);
    }

    #[test]
    fn unknown_names_are_none() {
        let d = CounterRegistry::new().drain_all();
        assert_eq!(d.get("request.patch"), None);
        assert_eq!(d.get("nonsense"), None);
    }

    #[test]
    fn concurrent_increments_are_never_lost_across_drains() {
        let reg = Arc::new(CounterRegistry::new());
        let threads = 8;
        let per_thread = 10_000u64;

        let writers: Vec<_> = (0..threads)
            .map(|_| {
                let reg = Arc::clone(&reg);
                std::thread::spawn(move || {
                    for _ in 0..per_thread {
                        reg.record(CounterEvent::HttpRequest(HttpMethod::Post));
                    }
                })
            })
            .collect();

        let mut drained = 0u64;
        while writers.iter().any(|w| !w.is_finished()) {
            drained += reg.drain_all().requests[1].1;
        }
        for w in writers {
            w.join().unwrap();
        }
        drained += reg.drain_all().requests[1].1;

        assert_eq!(drained, threads * per_thread);
    }
}
