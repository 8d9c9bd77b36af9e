pub mod client;
pub mod messages;

pub use client::{ApiError, HttpBackend, InterviewBackend};
pub use messages::{
    CandidateRef, CodeContext, CodeSubmission, DeviceMetrics, EndSessionRequest,
    EndSessionResponse, ExecuteCodeRequest, ExecuteCodeResponse, InterviewSettings,
    QuestionPollResponse, SessionResults, StartSessionRequest, StartSessionResponse,
    SubmitAnswerRequest, SubmitAnswerResponse, WireProgress, WireQuestion,
};
