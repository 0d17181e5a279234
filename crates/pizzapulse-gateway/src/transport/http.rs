//! Request tracking middleware.
//!
//! Installed around every route. Reports the method before the handler runs
//! and the duration, auth outcome, session shape and order outcome after it.
//! Handlers that submit orders attach an `OrderReport` to their response.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;

use pizzapulse_core::protocol::event::{is_auth_path, HttpMethod};

use crate::app_state::AppState;

/// Order result attached to a response as an extension.
///
/// ```ignore
/// (Extension(OrderReport::sold(Some(order.total))), Json(order))
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderReport {
    pub success: bool,
    pub revenue: Option<f64>,
}

impl OrderReport {
    pub fn sold(revenue: Option<f64>) -> Self {
        Self {
            success: true,
            revenue,
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            revenue: None,
        }
    }
}

pub async fn track(State(app): State<AppState>, req: Request, next: Next) -> Response {
    let telemetry = app.telemetry();
    let method = HttpMethod::parse(req.method().as_str());
    let path = req.uri().path().to_owned();

    telemetry.on_http_request_received(method);
    let started = Instant::now();

    let res = next.run(req).await;

    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    let status = res.status().as_u16();

    telemetry.on_request_completed(method, &path, elapsed_ms);
    if is_auth_path(&path) {
        telemetry.on_auth_outcome(status);
        telemetry.on_session_shape_observed(method, &path, status);
    }
    if let Some(report) = res.extensions().get::<OrderReport>() {
        telemetry.on_order_outcome(report.success, report.revenue);
    }

    res
}
