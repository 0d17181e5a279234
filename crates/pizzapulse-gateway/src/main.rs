//! pizzapulse gateway binary.
//!
//! Composition root: loads config, builds the telemetry handle, starts the
//! metrics scheduler, and serves the instrumented router until Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use pizzapulse_core::error::{PulseError, Result};
use pizzapulse_gateway::obs::{probe, Exporter, HttpSink, Scheduler, SnapshotBuilder, Telemetry};
use pizzapulse_gateway::{app_state::AppState, config, router};

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = config::resolve_path();
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .map_err(|e| PulseError::InvalidConfig(format!("server.listen: {e}")))?;

    let telemetry = Telemetry::new();

    let (cpu, memory) = probe::system_probes();
    let builder = SnapshotBuilder::new(
        telemetry.clone(),
        cfg.metrics.source.clone(),
        Arc::new(cpu),
        Arc::new(memory),
        cfg.metrics.probe_timeout(),
    );
    let exporter = Exporter::new(
        Arc::new(HttpSink::new(&cfg.metrics)?),
        cfg.metrics.max_concurrent_pushes,
    );
    let scheduler = Scheduler::new(builder, exporter, cfg.metrics.flush_interval()).spawn();

    let state = AppState::new(cfg, telemetry);
    let app = router::build_router(state.clone());

    tracing::info!(%listen, config = %path, "pizzapulse-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| PulseError::Internal(format!("bind {listen}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .map_err(|e| PulseError::Internal(format!("server failed: {e}")))?;

    scheduler.stop();
    tracing::info!("pizzapulse-gateway stopped");
    Ok(())
}

async fn shutdown_signal(state: AppState) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    state.set_draining();
    tracing::info!("shutdown requested; draining");
}
