//! Rudder - HTTP API for chart release lifecycle management
//!
//! Exposes repository listing, chart search and release install, upgrade,
//! rollback, delete and queries as a JSON REST API under `/api/v1`.

pub mod api;
pub mod config;
pub mod error;
pub mod state;

use axum::Router;
use axum::routing::{get, post};
use rudder_release::ReleaseBackend;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::{ApiError, ErrorBody, ServerError};
pub use state::AppState;

/// Build the HTTP router
pub fn router<B: ReleaseBackend + 'static>(state: AppState<B>) -> Router {
    Router::new()
        .route("/healthz", get(api::healthz))
        .route("/api/v1/repos", get(api::list_repos::<B>))
        .route("/api/v1/charts", get(api::list_charts::<B>))
        .route("/api/v1/releases", get(api::list_releases::<B>))
        .route("/api/v1/release", post(api::install_release::<B>))
        .route(
            "/api/v1/release/{name}",
            get(api::get_release::<B>)
                .patch(api::update_release::<B>)
                .delete(api::delete_release::<B>),
        )
        .route("/api/v1/release/{name}/history", get(api::get_release_history::<B>))
        .route("/api/v1/release/{name}/status", get(api::get_release_status::<B>))
        .route("/api/v1/release/{name}/content", get(api::get_release_content::<B>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
