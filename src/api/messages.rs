use crate::session::{Question, TranscriptEntry};
use serde::{Deserialize, Serialize};

// ============================================================================
// Session start
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSettings {
    pub job_role: String,
    pub experience_level: String,
    pub interview_type: String,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub user: CandidateRef,
    pub configuration: InterviewSettings,
    /// Free-form context (resume summary, job description) passed through untouched
    #[serde(default)]
    pub context: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub session_id: String,
    /// Welcome message spoken by the interviewer
    pub message: String,
    #[serde(default)]
    pub first_question: Option<WireQuestion>,
}

/// Question as sent by the backend. Numbering fields are optional on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireQuestion {
    pub id: String,
    #[serde(default)]
    pub question_number: Option<u32>,
    #[serde(default)]
    pub total_questions: Option<u32>,
    #[serde(alias = "question")]
    pub text: String,
    #[serde(default)]
    pub requires_code: bool,
    #[serde(default)]
    pub language: Option<String>,
}

impl WireQuestion {
    /// Convert to a domain question, numbering it `fallback_ordinal` when the
    /// backend omitted the ordinal.
    pub fn into_question(self, fallback_ordinal: u32, fallback_total: u32) -> Question {
        Question {
            id: self.id,
            ordinal: self.question_number.filter(|n| *n > 0).unwrap_or(fallback_ordinal),
            total_count: self
                .total_questions
                .filter(|n| *n > 0)
                .unwrap_or(fallback_total),
            text: self.text,
            requires_code: self.requires_code,
            language: self.language,
        }
    }
}

// ============================================================================
// Conversation turns
// ============================================================================

/// Code attached to an answer when the current question requires code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeContext {
    pub code: String,
    pub language: String,
    pub output: String,
    #[serde(default)]
    pub execution_time: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub session_id: String,
    pub message: String,
    pub question_id: String,
    /// Seconds between the question becoming current and the answer being sent
    pub response_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_context: Option<CodeContext>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireProgress {
    #[serde(default)]
    pub answered: u32,
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerResponse {
    #[serde(default)]
    pub ai_response: Option<String>,
    #[serde(default)]
    pub short_response: Option<String>,
    #[serde(default)]
    pub current_question: Option<WireQuestion>,
    #[serde(default)]
    pub progress: WireProgress,
    /// Authoritative completion flag, when the backend sends one
    #[serde(default)]
    pub completed: Option<bool>,
}

impl SubmitAnswerResponse {
    /// Interviewer text for this turn; the full response wins over the short one.
    pub fn ai_text(&self) -> Option<&str> {
        fn non_blank(t: &Option<String>) -> Option<&str> {
            t.as_deref().map(str::trim).filter(|t| !t.is_empty())
        }
        non_blank(&self.ai_response).or_else(|| non_blank(&self.short_response))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPollResponse {
    #[serde(default)]
    pub question: Option<WireQuestion>,
    #[serde(default)]
    pub completed: Option<bool>,
}

// ============================================================================
// Code execution
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteCodeRequest {
    pub session_id: String,
    pub language: String,
    pub code: String,
    pub stdin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteCodeResponse {
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub execution_time: Option<f64>,
    #[serde(default)]
    pub memory: Option<u64>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExecuteCodeResponse {
    /// A run counts as successful only with a zero (or absent) exit code and no error
    pub fn succeeded(&self) -> bool {
        self.exit_code.unwrap_or(0) == 0
            && self.error.as_deref().map_or(true, |e| e.trim().is_empty())
    }
}

// ============================================================================
// Session end
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSubmission {
    pub question_id: String,
    pub language: String,
    pub code: String,
    pub output: String,
    #[serde(default)]
    pub execution_time: Option<f64>,
    /// False for a solution that ran but was never submitted
    pub submitted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResults {
    pub termination_reason: String,
    pub elapsed_seconds: u64,
    pub questions_answered: u32,
    pub total_questions: u32,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetrics {
    pub tab_switch_count: u32,
    pub fullscreen_exits: u32,
    pub microphone_available: bool,
    pub camera_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionRequest {
    pub session_id: String,
    pub results: SessionResults,
    pub conversation_history: Vec<TranscriptEntry>,
    pub code_submissions: Vec<CodeSubmission>,
    pub device_metrics: DeviceMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionResponse {
    #[serde(default)]
    pub scores: serde_json::Value,
    #[serde(default)]
    pub configuration: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub results: serde_json::Value,
}
