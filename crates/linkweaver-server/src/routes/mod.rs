//! Router assembly and CORS (§6).

mod catalog_stats;
mod catalog_sync;
mod dismiss;
mod health;
mod link_audit;
mod meta_generate;
mod seo_metrics;
mod smart_link;

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_bearer_auth;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let origin: HeaderValue = state
        .config
        .allowed_origin
        .parse()
        .unwrap_or_else(|_| HeaderValue::from_static("*"));

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([axum::http::header::AUTHORIZATION, axum::http::header::CONTENT_TYPE]);

    let authenticated = Router::new()
        .route(
            "/api/catalog-sync",
            post(catalog_sync::catalog_sync).delete(catalog_sync::catalog_delete),
        )
        .route("/api/catalog-sync-batch", post(catalog_sync::catalog_sync_batch))
        .route("/api/smart-link", post(smart_link::smart_link))
        .route("/api/link-audit", post(link_audit::link_audit))
        .route("/api/meta-generate", post(meta_generate::meta_generate))
        .route(
            "/api/dismiss-opportunity",
            get(dismiss::list_dismissed)
                .post(dismiss::dismiss_opportunity)
                .delete(dismiss::restore_opportunity),
        )
        .route("/api/seo-metrics", get(seo_metrics::seo_metrics).post(seo_metrics::refresh_seo_metrics))
        .route("/api/catalog-stats", get(catalog_stats::catalog_stats))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer_auth));

    Router::new()
        .route("/api/health", get(health::health))
        .merge(authenticated)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
