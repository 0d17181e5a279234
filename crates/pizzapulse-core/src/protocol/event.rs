//! Inbound event vocabulary.
//!
//! The request-handling layer describes what happened in terms of HTTP method,
//! path and status. This module turns those raw facts into the small closed set
//! of things the counters care about.

/// Auth router mount point (register, login, logout, user update).
pub const AUTH_PATH: &str = "/api/auth";

/// Order submission endpoint.
pub const ORDER_PATH: &str = "/api/order";

/// HTTP method as seen by the request counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    /// Anything else (PATCH, OPTIONS, garbage). Counted only in the `all` total.
    Other,
}

impl HttpMethod {
    /// Methods with a dedicated counter, in export order.
    pub const TRACKED: [HttpMethod; 4] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
    ];

    /// Case-insensitive parse. Never fails.
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("GET") {
            HttpMethod::Get
        } else if s.eq_ignore_ascii_case("POST") {
            HttpMethod::Post
        } else if s.eq_ignore_ascii_case("PUT") {
            HttpMethod::Put
        } else if s.eq_ignore_ascii_case("DELETE") {
            HttpMethod::Delete
        } else {
            HttpMethod::Other
        }
    }

    /// Tag value used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Other => "other",
        }
    }
}

/// Result of an authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Success,
    Failure,
}

impl AuthOutcome {
    /// 200 is a success, any status >= 400 a failure. Everything else is not an
    /// auth attempt worth counting.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200 => Some(AuthOutcome::Success),
            s if s >= 400 => Some(AuthOutcome::Failure),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AuthOutcome::Success => "success",
            AuthOutcome::Failure => "failure",
        }
    }
}

/// Result of a pizza order submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOutcome {
    Sold,
    Failure,
}

impl OrderOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderOutcome::Sold => "sold",
            OrderOutcome::Failure => "failure",
        }
    }
}

/// Change applied to the active-session gauge.
///
/// This is a heuristic: any successful POST or PUT under the auth router counts
/// as a new session, any successful DELETE as an ended one. A user update
/// (`PUT /api/auth/:id`) therefore also looks like a login. Token expiry and
/// repeated logouts are never reconciled, so the gauge approximates concurrent
/// users and may drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    Start,
    End,
}

impl SessionChange {
    /// Classify a finished request. Only 2xx responses under the auth router
    /// move the gauge.
    pub fn classify(method: HttpMethod, path: &str, status: u16) -> Option<Self> {
        if !(200..300).contains(&status) || !is_auth_path(path) {
            return None;
        }
        match method {
            HttpMethod::Post | HttpMethod::Put => Some(SessionChange::Start),
            HttpMethod::Delete => Some(SessionChange::End),
            _ => None,
        }
    }

    /// Signed delta for the gauge.
    pub fn delta(self) -> i64 {
        match self {
            SessionChange::Start => 1,
            SessionChange::End => -1,
        }
    }
}

/// Latency series a request duration is recorded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LatencyCategory {
    All,
    PizzaCreation,
}

impl LatencyCategory {
    /// Every category, in export order.
    pub const ALL: [LatencyCategory; 2] = [LatencyCategory::All, LatencyCategory::PizzaCreation];

    /// Categories a request of this shape belongs to. `All` is always first.
    pub fn for_request(method: HttpMethod, path: &str) -> &'static [LatencyCategory] {
        if is_pizza_creation(method, path) {
            &Self::ALL
        } else {
            &Self::ALL[..1]
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LatencyCategory::All => "all",
            LatencyCategory::PizzaCreation => "pizza-creation",
        }
    }
}

/// POST to the order endpoint creates pizzas.
pub fn is_pizza_creation(method: HttpMethod, path: &str) -> bool {
    method == HttpMethod::Post && normalize_path(path) == ORDER_PATH
}

/// True for the auth router mount point and everything below it.
pub fn is_auth_path(path: &str) -> bool {
    let path = normalize_path(path);
    path == AUTH_PATH
        || path
            .strip_prefix(AUTH_PATH)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!(HttpMethod::parse("get"), HttpMethod::Get);
        assert_eq!(HttpMethod::parse("Delete"), HttpMethod::Delete);
        assert_eq!(HttpMethod::parse("PATCH"), HttpMethod::Other);
        assert_eq!(HttpMethod::parse(""), HttpMethod::Other);
    }

    #[test]
    fn auth_outcome_ignores_non_attempt_statuses() {
        assert_eq!(AuthOutcome::from_status(200), Some(AuthOutcome::Success));
        assert_eq!(AuthOutcome::from_status(401), Some(AuthOutcome::Failure));
        assert_eq!(AuthOutcome::from_status(503), Some(AuthOutcome::Failure));
        assert_eq!(AuthOutcome::from_status(201), None);
        assert_eq!(AuthOutcome::from_status(304), None);
    }

    #[test]
    fn latency_categories() {
        assert_eq!(
            LatencyCategory::for_request(HttpMethod::Post, "/api/order"),
            &[LatencyCategory::All, LatencyCategory::PizzaCreation]
        );
        assert_eq!(
            LatencyCategory::for_request(HttpMethod::Get, "/api/order"),
            &[LatencyCategory::All]
        );
        assert_eq!(
            LatencyCategory::for_request(HttpMethod::Post, "/api/order/menu"),
            &[LatencyCategory::All]
        );
    }

    #[test]
    fn root_path_normalizes() {
        assert!(!is_auth_path("/"));
        assert!(is_auth_path("/api/auth/"));
    }

    #[test]
    fn auth_router_covers_sub_paths_on_segment_boundary() {
        assert!(is_auth_path("/api/auth/3"));
        assert!(is_auth_path("/api/auth/3/"));
        assert!(!is_auth_path("/api/authors"));
        assert!(!is_auth_path("/api/franchise"));
        assert_eq!(
            SessionChange::classify(HttpMethod::Put, "/api/auth/3", 200),
            Some(SessionChange::Start)
        );
    }
}
