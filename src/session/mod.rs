//! Interview session lifecycle
//!
//! `InterviewSession` owns one interview from start to end:
//! - creating the backend session and presenting the first question
//! - serialized answer turns (typed, spoken or code)
//! - microphone gating around speech, submissions and code runs
//! - the countdown that ends the session with `time_up`
//! - writing results exactly once and releasing media

mod config;
mod error;
mod events;
#[allow(clippy::module_inception)]
mod session;
mod stats;
mod types;

pub use config::SessionConfig;
pub use error::SessionError;
pub use events::{EndReason, Phase, SessionEvent};
pub use session::{EndOutcome, InterviewSession, SessionPorts, TurnReport};
pub use stats::SessionStatus;
pub use types::{IntegrityCounters, Progress, Question, Speaker, Transcript, TranscriptEntry};
