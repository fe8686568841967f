//! Axum router configuration with middleware.
//!
//! All chat routes are under `/api/v1/`; `/health` sits at the root.
//! Middleware: CORS, request tracing, per-request timeout.

use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    let api_routes = Router::new()
        // Chats
        .route("/chats", post(handlers::chat::create_chat))
        .route("/chats/lookup", get(handlers::chat::find_chat))
        .route("/chats/{id}", get(handlers::chat::get_chat))
        .route("/users/{user_id}/chats", get(handlers::chat::list_user_chats))
        // Messages
        .route(
            "/chats/{id}/messages",
            get(handlers::message::list_messages).post(handlers::message::send_message),
        )
        .route("/chats/{id}/read", post(handlers::message::mark_read));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness check.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::handlers::tests::test_state;

    #[tokio::test]
    async fn test_router_builds_without_route_conflicts() {
        let (_dir, state) = test_state().await;
        let _router = build_router(state);
    }

    #[tokio::test]
    async fn test_health_check() {
        let axum::Json(body) = health_check().await;
        assert_eq!(body["status"], "ok");
    }
}
