use super::state::AppState;
use crate::code::GateError;
use crate::integrity::{IntegrityEvent, IntegrityResponse};
use crate::session::{EndReason, SessionError};
use crate::speech::StartOutcome;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct RunCodeRequest {
    pub code: String,

    /// Defaults to the question's language, then the configured default
    pub language: Option<String>,

    #[serde(default)]
    pub stdin: String,
}

#[derive(Debug, Deserialize)]
pub struct EditCodeRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct MuteRequest {
    pub muted: bool,
}

#[derive(Debug, Deserialize)]
pub struct IntegrityRequest {
    pub event: IntegrityEvent,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub status: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListenResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct IntegrityReply {
    /// "ignored", "warning", "confirm_unload" or "allow_unload"
    pub action: String,
    pub message: Option<String>,
    pub tab_switch_count: u32,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// 409 for lifecycle state, 422 for rejected input or gates, 502 for the backend
fn status_for(e: &SessionError) -> StatusCode {
    match e {
        SessionError::InvalidState { .. }
        | SessionError::TurnInFlight
        | SessionError::AlreadyCompleted
        | SessionError::NoCurrentQuestion
        | SessionError::CodeAwaitingSubmit
        | SessionError::MicrophoneGated(_)
        | SessionError::Media(_) => StatusCode::CONFLICT,
        SessionError::EmptyAnswer
        | SessionError::Recognition(_)
        | SessionError::Code(GateError::NotRunSuccessfully)
        | SessionError::Code(GateError::Submitting)
        | SessionError::Code(GateError::QuestionChanged)
        | SessionError::Code(GateError::ExecutionFailed(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::Code(GateError::Api(_)) | SessionError::Api(_) => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(e: SessionError) -> Response {
    let status = status_for(&e);
    if status == StatusCode::BAD_GATEWAY {
        error!("Backend failure: {}", e);
    } else {
        warn!("Request rejected: {}", e);
    }

    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /interview/start
pub async fn start_interview(State(state): State<AppState>) -> impl IntoResponse {
    info!("Start requested");

    match state.session.start().await {
        Ok(started) => {
            let status = if started { "in_progress" } else { "starting" };
            let code = if started {
                StatusCode::OK
            } else {
                StatusCode::ACCEPTED
            };
            (
                code,
                Json(StartResponse {
                    status: status.to_string(),
                    session_id: state.session.session_id().await,
                }),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /interview/answer
pub async fn submit_answer(
    State(state): State<AppState>,
    Json(req): Json<AnswerRequest>,
) -> impl IntoResponse {
    match state.session.submit_answer(&req.text, false).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /interview/listen/start
pub async fn start_listening(State(state): State<AppState>) -> impl IntoResponse {
    match state.session.start_listening().await {
        Ok(outcome) => {
            let status = match outcome {
                StartOutcome::AlreadyListening => "already_listening",
                _ => "listening",
            };
            (
                StatusCode::OK,
                Json(ListenResponse {
                    status: status.to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /interview/listen/stop
///
/// Submits whatever was captured; `null` when nothing usable was said.
pub async fn stop_listening(State(state): State<AppState>) -> impl IntoResponse {
    match state.session.stop_listening().await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /interview/code/run
pub async fn run_code(
    State(state): State<AppState>,
    Json(req): Json<RunCodeRequest>,
) -> impl IntoResponse {
    match state
        .session
        .run_code(&req.code, req.language.as_deref(), &req.stdin)
        .await
    {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /interview/code/edit
pub async fn edit_code(
    State(state): State<AppState>,
    Json(req): Json<EditCodeRequest>,
) -> impl IntoResponse {
    state.session.edit_code(&req.code).await;
    let gate = state.session.code_gate_state().await;
    (StatusCode::OK, Json(gate)).into_response()
}

/// POST /interview/code/submit
pub async fn submit_code(State(state): State<AppState>) -> impl IntoResponse {
    match state.session.submit_code().await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /interview/media/mute
pub async fn set_muted(
    State(state): State<AppState>,
    Json(req): Json<MuteRequest>,
) -> impl IntoResponse {
    match state.session.set_muted(req.muted).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /interview/integrity
pub async fn record_integrity(
    State(state): State<AppState>,
    Json(req): Json<IntegrityRequest>,
) -> impl IntoResponse {
    let response = state.session.record_integrity_event(req.event).await;
    let tab_switch_count = state.session.integrity_counters().tab_switch_count;

    let (action, message) = match response {
        IntegrityResponse::Ignored => ("ignored", None),
        IntegrityResponse::Warning(warning) => ("warning", Some(warning.message)),
        IntegrityResponse::ConfirmUnload => (
            "confirm_unload",
            Some("Leaving will end your interview. Are you sure?".to_string()),
        ),
        IntegrityResponse::AllowUnload => ("allow_unload", None),
    };

    (
        StatusCode::OK,
        Json(IntegrityReply {
            action: action.to_string(),
            message,
            tab_switch_count,
        }),
    )
        .into_response()
}

/// POST /interview/end
pub async fn end_interview(State(state): State<AppState>) -> impl IntoResponse {
    info!("End requested");

    match state.session.end(EndReason::UserEnded).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /interview/status
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.status().await))
}

/// GET /interview/transcript
pub async fn get_transcript(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.transcript().await))
}

/// GET /interview/results
///
/// Results captured at end, otherwise read back from the backend.
pub async fn get_results(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(results) = state.session.end_results().await {
        return (StatusCode::OK, Json(results)).into_response();
    }

    match state.session.fetch_results().await {
        Ok(results) => (StatusCode::OK, Json(results)).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
