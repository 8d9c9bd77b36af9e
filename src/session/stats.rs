use super::events::{EndReason, Phase};
use super::types::{Progress, Question};
use crate::code::GateState;
use serde::Serialize;

/// Point-in-time view of a session for display
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub phase: Phase,

    /// Backend-issued identifier, once started
    pub session_id: Option<String>,

    pub current_question: Option<Question>,

    pub progress: Progress,

    /// `answered / total`, zero while the total is unknown
    pub percentage: f64,

    pub completed: bool,

    /// Interviewer speech queued or playing
    pub speaking: bool,

    pub listening: bool,

    /// Whether `start_listening` would be accepted right now
    pub microphone_armable: bool,

    pub muted: bool,

    /// False when no microphone was acquired
    pub mute_controls_enabled: bool,

    pub code_gate: GateState,

    pub remaining_secs: u64,

    pub elapsed_secs: u64,

    pub tab_switch_count: u32,

    pub transcript_entries: usize,

    pub end_reason: Option<EndReason>,

    pub last_error: Option<String>,
}
