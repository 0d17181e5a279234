//! Axum router wiring.
//!
//! Layer order, outermost first: path guard, request tracking, routes. A
//! request refused by the guard is therefore never counted as traffic.

use axum::{middleware, routing::get, Router};

use crate::{app_state::AppState, ops, transport};

/// Ops routes only.
pub fn build_router(state: AppState) -> Router {
    instrument(Router::new(), state)
}

/// Mount application routes next to the ops endpoints and wrap everything in
/// the guard and tracking layers.
pub fn instrument(routes: Router<AppState>, state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .merge(routes)
        .fallback(ops::unknown_endpoint)
        .layer(middleware::from_fn_with_state(state.clone(), transport::http::track))
        .layer(middleware::from_fn_with_state(state.clone(), transport::path_guard::guard))
        .with_state(state)
}
