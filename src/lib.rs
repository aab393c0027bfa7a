pub mod api;
pub mod cache;
pub mod cart;
pub mod config;
pub mod entities;
pub mod error;
pub mod middleware;
pub mod state;
pub mod store;

use axum::{middleware::from_fn, Router};
use tower_http::trace::TraceLayer;

use crate::api::create_api_router;
use crate::middleware::logging::logging_middleware;
use crate::state::AppState;

/// The full HTTP application, ready to be served.
pub fn app(state: AppState) -> Router {
    create_api_router(state)
        .layer(from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
