use crate::handlers;
use crate::state::AppState;
use axum::{Router, routing::post};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/forecast",
            post(handlers::forecast).options(handlers::preflight),
        )
        .route(
            "/api/forecast",
            post(handlers::forecast).options(handlers::preflight),
        )
        .with_state(state)
}
