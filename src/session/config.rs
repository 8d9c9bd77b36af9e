use crate::api::{CandidateRef, InterviewSettings};
use crate::config::Config;
use std::time::Duration;

/// Configuration for one interview session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Candidate the session is created for
    pub candidate: CandidateRef,

    /// Interview configuration sent to the backend at start
    pub settings: InterviewSettings,

    /// Free-form context forwarded at start (resume summary, job description)
    pub context: serde_json::Value,

    /// Wall-clock budget for the whole interview
    pub time_limit: Duration,

    /// Response time reported when no question presentation time is known
    pub fallback_response_time: Duration,

    /// Delay used in place of speech when no synthesizer is available
    pub simulated_speech: Duration,

    /// How long a captured transcript stays visible after listening stops
    pub transcript_grace: Duration,

    /// Language assumed for code questions that do not name one
    pub default_code_language: String,
}

impl SessionConfig {
    pub fn from_config(config: &Config) -> Self {
        let interview = &config.interview;
        Self {
            candidate: CandidateRef {
                id: interview.user_id.clone(),
                name: interview.user_name.clone(),
            },
            settings: InterviewSettings {
                job_role: interview.job_role.clone(),
                experience_level: interview.experience_level.clone(),
                interview_type: interview.interview_type.clone(),
                duration_minutes: interview.duration_minutes,
            },
            time_limit: Duration::from_secs(interview.duration_minutes as u64 * 60),
            simulated_speech: Duration::from_millis(config.speech.simulated_speech_ms),
            transcript_grace: Duration::from_millis(config.speech.transcript_grace_ms),
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            candidate: CandidateRef {
                id: "anonymous".to_string(),
                name: None,
            },
            settings: InterviewSettings {
                job_role: "Software Engineer".to_string(),
                experience_level: "mid".to_string(),
                interview_type: "technical".to_string(),
                duration_minutes: 30,
            },
            context: serde_json::Value::Null,
            time_limit: Duration::from_secs(30 * 60), // 30 minutes
            fallback_response_time: Duration::from_secs(30),
            simulated_speech: Duration::from_secs(2),
            transcript_grace: Duration::from_millis(1500),
            default_code_language: "python".to_string(),
        }
    }
}
