mod auth;
mod error;
mod routes;
mod state;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use linkweaver_core::Config;
use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "failed to load configuration");
            std::process::exit(1);
        }
    };

    info!("LinkWeaver server v{} starting...", env!("CARGO_PKG_VERSION"));

    let state = Arc::new(AppState::new(config));

    if let Err(err) = state.refresh_seo_cache().await {
        warn!(error = %err, "initial SEO cache refresh failed, starting with an empty cache");
    }

    spawn_seo_cache_warmer(state.clone());

    let app = routes::build_router(state);

    let port: u16 = std::env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("LinkWeaver server listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, "failed to bind listener");
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        error!(error = %err, "server error");
        std::process::exit(1);
    }

    info!("LinkWeaver server shutting down");
}

/// Periodically rebuilds the SEO cache in the background so a burst of
/// requests right after the TTL expires doesn't all pay the refresh cost
/// (§4.E refresh, mirroring the teacher's periodic consolidation loop).
fn spawn_seo_cache_warmer(state: Arc<AppState>) {
    tokio::spawn(async move {
        let interval_secs: u64 = std::env::var("SEO_CACHE_WARM_INTERVAL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(600);

        loop {
            tokio::time::sleep(Duration::from_secs(interval_secs)).await;
            if let Err(err) = state.refresh_seo_cache().await {
                warn!(error = %err, "background SEO cache refresh failed, keeping last good cache");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
