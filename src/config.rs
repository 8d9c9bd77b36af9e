use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub backend: BackendConfig,
    pub interview: InterviewConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the interview service, e.g. "http://localhost:8000/api/interview"
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Bearer token issued by the auth layer, if the backend requires one
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterviewConfig {
    pub user_id: String,
    pub user_name: Option<String>,
    pub job_role: String,
    pub experience_level: String,
    pub interview_type: String,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Delay used when no synthesis capability is available
    pub simulated_speech_ms: u64,
    /// How long a stopped transcript stays visible before it is cleared
    pub transcript_grace_ms: u64,
    /// Speaking rate of the console synthesizer
    pub words_per_minute: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            simulated_speech_ms: 2000,
            transcript_grace_ms: 1500,
            words_per_minute: 180,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Failed to parse interview config")
    }
}
