use crate::session::InterviewSession;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The interview this process drives
    pub session: InterviewSession,
}

impl AppState {
    pub fn new(session: InterviewSession) -> Self {
        Self { session }
    }
}
