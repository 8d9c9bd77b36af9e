use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Lifecycle
        .route("/interview/start", post(handlers::start_interview))
        .route("/interview/end", post(handlers::end_interview))
        // Turns
        .route("/interview/answer", post(handlers::submit_answer))
        .route("/interview/listen/start", post(handlers::start_listening))
        .route("/interview/listen/stop", post(handlers::stop_listening))
        // Code
        .route("/interview/code/run", post(handlers::run_code))
        .route("/interview/code/edit", post(handlers::edit_code))
        .route("/interview/code/submit", post(handlers::submit_code))
        // Devices and page signals
        .route("/interview/media/mute", post(handlers::set_muted))
        .route("/interview/integrity", post(handlers::record_integrity))
        // Queries
        .route("/interview/status", get(handlers::get_status))
        .route("/interview/transcript", get(handlers::get_transcript))
        .route("/interview/results", get(handlers::get_results))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
