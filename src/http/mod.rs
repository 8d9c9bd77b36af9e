//! HTTP control API for a UI driving the interview
//!
//! - GET  /health
//! - POST /interview/start, /interview/end
//! - POST /interview/answer (typed answer)
//! - POST /interview/listen/start, /interview/listen/stop (voice answer)
//! - POST /interview/code/run, /interview/code/edit, /interview/code/submit
//! - POST /interview/media/mute
//! - POST /interview/integrity (page visibility, fullscreen, unload)
//! - GET  /interview/status, /interview/transcript, /interview/results

mod handlers;
mod routes;
mod state;

pub use handlers::ErrorResponse;
pub use routes::create_router;
pub use state::AppState;
