use super::types::{Progress, Question, TranscriptEntry};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of an interview session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    Starting,
    /// Session creation failed; `start()` may be retried
    StartFailed(String),
    InProgress,
    /// `end()` is in flight
    Completing,
    Ended,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::NotStarted => write!(f, "not started"),
            Phase::Starting => write!(f, "starting"),
            Phase::StartFailed(reason) => write!(f, "start failed ({})", reason),
            Phase::InProgress => write!(f, "in progress"),
            Phase::Completing => write!(f, "completing"),
            Phase::Ended => write!(f, "ended"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    UserEnded,
    TimeUp,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndReason::UserEnded => "user_ended",
            EndReason::TimeUp => "time_up",
        }
    }
}

/// Notification for UI layers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    PhaseChanged { phase: Phase },
    TranscriptAppended { entry: TranscriptEntry },
    QuestionChanged { question: Question },
    ProgressUpdated { progress: Progress },
    /// Non-fatal problem the candidate should see
    Warning { message: String },
    Completed,
    Ended { reason: EndReason },
}
