pub mod api;
pub mod code;
pub mod config;
pub mod conversation;
pub mod http;
pub mod integrity;
pub mod media;
pub mod session;
pub mod speech;
pub mod timer;

pub use api::{HttpBackend, InterviewBackend};
pub use code::{CodeExecutionGate, GateError, GateState};
pub use config::Config;
pub use conversation::{ConversationClient, NextStep, TurnOutcome};
pub use http::{create_router, AppState};
pub use integrity::{IntegrityEvent, IntegrityMonitor, IntegrityResponse};
pub use media::{HeadlessMediaDevices, MediaController, MediaDevices};
pub use session::{
    EndOutcome, EndReason, InterviewSession, Phase, SessionConfig, SessionError, SessionEvent,
    SessionPorts, SessionStatus, TurnReport,
};
pub use speech::{SpeechInputCapture, SpeechOutputQueue, SpeechRecognizer, SpeechSynthesizer};
pub use timer::CountdownTimer;
