//! Path guard (pre-handler chaos defender).
//!
//! Purpose:
//! - Reject encoded-path tricks before routing or telemetry sees the request.
//! - After percent-decoding, a path must be `/` followed only by ASCII
//!   alphanumerics and `_ - / .`, with no `%` left over (double encoding), no
//!   NUL, and no longer than `server.max_path_len` bytes.
//! - Each rejection counts as a `url_encoding` chaos incident. Paths that do
//!   not decode at all are refused without counting.

use std::borrow::Cow;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::app_state::AppState;

/// Chaos kind recorded for rejected paths.
pub const URL_ENCODING_INCIDENT: &str = "url_encoding";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRejection {
    /// Percent-decoding failed (bad escape or invalid UTF-8).
    Undecodable,
    /// Decoded fine but is not an acceptable path.
    Disallowed { decoded: String },
}

/// Decode and vet a raw request path.
pub fn check_path(raw: &str, max_len: usize) -> Result<(), PathRejection> {
    let decoded = percent_decode(raw).ok_or(PathRejection::Undecodable)?;

    let allowed = decoded.starts_with('/')
        && decoded.len() <= max_len
        && decoded
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'/' | b'.'));

    if allowed {
        Ok(())
    } else {
        Err(PathRejection::Disallowed { decoded })
    }
}

pub async fn guard(State(app): State<AppState>, req: Request, next: Next) -> Response {
    let max_len = app.cfg().server.max_path_len;

    match check_path(req.uri().path(), max_len) {
        Ok(()) => next.run(req).await,
        Err(PathRejection::Disallowed { decoded }) => {
            tracing::warn!(
                path = %req.uri().path(),
                decoded_path = %decoded,
                method = %req.method(),
                "chaos attempt detected"
            );
            app.telemetry().on_chaos_incident(URL_ENCODING_INCIDENT);
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "rejected", "reason": "Invalid request path" })),
            )
                .into_response()
        }
        Err(PathRejection::Undecodable) => {
            tracing::error!(path = %req.uri().path(), "path decoding failed");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "error", "message": "Invalid request path encoding" })),
            )
                .into_response()
        }
    }
}

/// Strict `%XX` decoding. `None` on a truncated or non-hex escape, or when the
/// result is not UTF-8.
fn percent_decode(raw: &str) -> Option<String> {
    if !escapes_well_formed(raw) {
        return None;
    }
    urlencoding::decode(raw).ok().map(Cow::into_owned)
}

/// Every `%` must be followed by two hex digits. `urlencoding` passes broken
/// escapes through untouched.
fn escapes_well_formed(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'%')
        .all(|(i, _)| {
            bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_paths_pass() {
        assert_eq!(check_path("/api/order/menu", 2000), Ok(()));
        assert_eq!(check_path("/", 2000), Ok(()));
        assert_eq!(check_path("/docs/v1.2_final-draft", 2000), Ok(()));
        assert_eq!(check_path("/api/%6Frder", 2000), Ok(()));
    }

    #[test]
    fn hostile_paths_are_disallowed() {
        for raw in ["/%3Cscript%3E", "/api/%2525", "/a%00b", "/api/a;b", "/caf%C3%A9"] {
            assert!(
                matches!(check_path(raw, 2000), Err(PathRejection::Disallowed { .. })),
                "raw={raw}"
            );
        }
    }

    #[test]
    fn double_encoding_leaves_a_percent() {
        assert_eq!(
            check_path("/api/%2541", 2000),
            Err(PathRejection::Disallowed {
                decoded: "/api/%41".into()
            })
        );
    }

    #[test]
    fn broken_escapes_are_undecodable() {
        assert_eq!(check_path("/api/%zz", 2000), Err(PathRejection::Undecodable));
        assert_eq!(check_path("/api/%4", 2000), Err(PathRejection::Undecodable));
        assert_eq!(check_path("/%ff%fe", 2000), Err(PathRejection::Undecodable));
    }

    #[test]
    fn escape_check() {
        assert!(escapes_well_formed("/a%2Fb%3c"));
        assert!(escapes_well_formed("/plain"));
        assert!(!escapes_well_formed("/trailing%"));
        assert!(!escapes_well_formed("/half%a"));
        assert!(!escapes_well_formed("/bad%g1"));
    }

    #[test]
    fn length_limit_applies_to_decoded_path() {
        let long = format!("/{}", "a".repeat(20));
        assert_eq!(check_path(&long, 21), Ok(()));
        assert!(check_path(&long, 20).is_err());
    }
}
