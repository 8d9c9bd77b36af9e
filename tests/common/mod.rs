#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use interview_orchestrator::api::{
    ApiError, EndSessionRequest, EndSessionResponse, ExecuteCodeRequest, ExecuteCodeResponse,
    InterviewBackend, QuestionPollResponse, StartSessionRequest, StartSessionResponse,
    SubmitAnswerRequest, SubmitAnswerResponse, WireProgress, WireQuestion,
};
use interview_orchestrator::media::{
    HeadlessMediaDevices, MediaConstraints, MediaDevices, MediaTrack,
};
use interview_orchestrator::speech::{
    RecognitionEvent, RecognitionError, SpeechRecognizer, SpeechSynthesizer,
};
use interview_orchestrator::{InterviewSession, SessionConfig, SessionPorts};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// Backend
// ============================================================================

/// One scripted reply to an answer submission
pub enum SubmitStep {
    Reply(SubmitAnswerResponse),
    NetworkError,
}

/// In-memory interview backend with scripted replies and call counters
#[derive(Default)]
pub struct ScriptedBackend {
    pub start_response: Mutex<Option<StartSessionResponse>>,
    pub start_failures: AtomicU32,
    pub start_delay: Mutex<Duration>,
    pub submit_script: Mutex<VecDeque<SubmitStep>>,
    pub submit_delay: Mutex<Duration>,
    pub poll_script: Mutex<VecDeque<QuestionPollResponse>>,
    pub execute_script: Mutex<VecDeque<ExecuteCodeResponse>>,
    pub execute_delay: Mutex<Duration>,
    pub end_fails: Mutex<bool>,

    pub start_calls: AtomicU32,
    pub submit_calls: AtomicU32,
    pub poll_calls: AtomicU32,
    pub execute_calls: AtomicU32,
    pub end_calls: AtomicU32,

    pub submitted: Mutex<Vec<SubmitAnswerRequest>>,
    pub ended: Mutex<Vec<EndSessionRequest>>,
}

impl ScriptedBackend {
    /// Backend whose session opens with `welcome` and `first_question`
    pub fn opening(welcome: &str, first_question: Option<WireQuestion>) -> Self {
        let backend = Self::default();
        *backend.start_response.lock().unwrap() = Some(StartSessionResponse {
            session_id: "session-1".to_string(),
            message: welcome.to_string(),
            first_question,
        });
        backend
    }

    pub fn push_reply(&self, reply: SubmitAnswerResponse) {
        self.submit_script
            .lock()
            .unwrap()
            .push_back(SubmitStep::Reply(reply));
    }

    pub fn push_network_error(&self) {
        self.submit_script
            .lock()
            .unwrap()
            .push_back(SubmitStep::NetworkError);
    }

    pub fn push_poll(&self, poll: QuestionPollResponse) {
        self.poll_script.lock().unwrap().push_back(poll);
    }

    pub fn push_execution(&self, result: ExecuteCodeResponse) {
        self.execute_script.lock().unwrap().push_back(result);
    }

    pub fn set_submit_delay(&self, delay: Duration) {
        *self.submit_delay.lock().unwrap() = delay;
    }

    pub fn set_execute_delay(&self, delay: Duration) {
        *self.execute_delay.lock().unwrap() = delay;
    }

    pub fn set_start_delay(&self, delay: Duration) {
        *self.start_delay.lock().unwrap() = delay;
    }

    pub fn last_submitted(&self) -> Option<SubmitAnswerRequest> {
        self.submitted.lock().unwrap().last().cloned()
    }

    pub fn last_ended(&self) -> Option<EndSessionRequest> {
        self.ended.lock().unwrap().last().cloned()
    }

    pub fn count(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InterviewBackend for ScriptedBackend {
    async fn start_session(
        &self,
        _request: &StartSessionRequest,
    ) -> Result<StartSessionResponse, ApiError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.start_delay.lock().unwrap();
        tokio::time::sleep(delay).await;

        let failures = self.start_failures.load(Ordering::SeqCst);
        if failures > 0 {
            self.start_failures.store(failures - 1, Ordering::SeqCst);
            return Err(ApiError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        self.start_response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ApiError::Decode("no scripted start".to_string()))
    }

    async fn submit_answer(
        &self,
        request: &SubmitAnswerRequest,
    ) -> Result<SubmitAnswerResponse, ApiError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(request.clone());

        let delay = *self.submit_delay.lock().unwrap();
        tokio::time::sleep(delay).await;

        let step = self.submit_script.lock().unwrap().pop_front();
        match step {
            Some(SubmitStep::Reply(reply)) => Ok(reply),
            Some(SubmitStep::NetworkError) => {
                Err(ApiError::Network("connection reset".to_string()))
            }
            None => Err(ApiError::Decode("no scripted reply".to_string())),
        }
    }

    async fn fetch_question(&self, _session_id: &str) -> Result<QuestionPollResponse, ApiError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .poll_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn execute_code(
        &self,
        _request: &ExecuteCodeRequest,
    ) -> Result<ExecuteCodeResponse, ApiError> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.execute_delay.lock().unwrap();
        tokio::time::sleep(delay).await;
        Ok(self
            .execute_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| execution("ok\n", 0)))
    }

    async fn end_session(
        &self,
        request: &EndSessionRequest,
    ) -> Result<EndSessionResponse, ApiError> {
        self.end_calls.fetch_add(1, Ordering::SeqCst);
        self.ended.lock().unwrap().push(request.clone());

        if *self.end_fails.lock().unwrap() {
            return Err(ApiError::Timeout);
        }
        Ok(EndSessionResponse {
            scores: serde_json::json!({ "overall": 7.5 }),
            configuration: serde_json::Value::Null,
            created_at: Some("2026-10-18T10:00:00Z".to_string()),
            results: serde_json::json!({ "answered": request.results.questions_answered }),
        })
    }

    async fn conversation_history(
        &self,
        _session_id: &str,
    ) -> Result<serde_json::Value, ApiError> {
        Ok(serde_json::json!([]))
    }

    async fn results(&self, session_id: &str) -> Result<serde_json::Value, ApiError> {
        Ok(serde_json::json!({ "sessionId": session_id }))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// Wire builders
// ============================================================================

pub fn question(id: &str, number: u32, total: u32, text: &str) -> WireQuestion {
    WireQuestion {
        id: id.to_string(),
        question_number: Some(number),
        total_questions: Some(total),
        text: text.to_string(),
        requires_code: false,
        language: None,
    }
}

pub fn code_question(id: &str, number: u32, total: u32, text: &str) -> WireQuestion {
    WireQuestion {
        requires_code: true,
        language: Some("python".to_string()),
        ..question(id, number, total, text)
    }
}

pub fn reply(
    ai: Option<&str>,
    next: Option<WireQuestion>,
    answered: u32,
    total: u32,
) -> SubmitAnswerResponse {
    SubmitAnswerResponse {
        ai_response: ai.map(str::to_string),
        short_response: None,
        current_question: next,
        progress: WireProgress { answered, total },
        completed: None,
    }
}

pub fn completed_reply(ai: Option<&str>, answered: u32, total: u32) -> SubmitAnswerResponse {
    SubmitAnswerResponse {
        completed: Some(true),
        ..reply(ai, None, answered, total)
    }
}

pub fn execution(output: &str, exit_code: i32) -> ExecuteCodeResponse {
    ExecuteCodeResponse {
        output: output.to_string(),
        execution_time: Some(0.05),
        memory: None,
        exit_code: Some(exit_code),
        error: if exit_code == 0 {
            None
        } else {
            Some("Traceback (most recent call last)".to_string())
        },
    }
}

// ============================================================================
// Speech
// ============================================================================

/// Recognizer driven by the test through `say`/`fail`
#[derive(Default)]
pub struct ScriptedRecognizer {
    sender: Mutex<Option<mpsc::Sender<RecognitionEvent>>>,
    pub start_calls: AtomicU32,
    pub stop_calls: AtomicU32,
}

impl ScriptedRecognizer {
    pub async fn say_final(&self, text: &str) {
        self.send(RecognitionEvent::Final(text.to_string())).await;
    }

    pub async fn say_interim(&self, text: &str) {
        self.send(RecognitionEvent::Interim(text.to_string())).await;
    }

    pub async fn fail(&self, error: RecognitionError) {
        self.send(RecognitionEvent::Error(error)).await;
    }

    /// Close the result stream without an end-of-speech event
    pub fn hang_up(&self) {
        self.sender.lock().unwrap().take();
    }

    async fn send(&self, event: RecognitionEvent) {
        let sender = self.sender.lock().unwrap().clone();
        if let Some(sender) = sender {
            let _ = sender.send(event).await;
        }
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn start(&self) -> Result<mpsc::Receiver<RecognitionEvent>, RecognitionError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(32);
        *self.sender.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn stop(&self) -> Result<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        // Closing the channel ends the stream after buffered results
        self.sender.lock().unwrap().take();
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Synthesizer that records what it said
#[derive(Default)]
pub struct RecordingVoice {
    pub spoken: Mutex<Vec<String>>,
    pub delay: Duration,
}

impl RecordingVoice {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for RecordingVoice {
    async fn speak(&self, text: &str, _audio_hint: Option<&str>) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Devices that refuse every request
pub struct NoMediaDevices;

#[async_trait]
impl MediaDevices for NoMediaDevices {
    async fn acquire(&self, _: MediaConstraints) -> Result<Vec<Box<dyn MediaTrack>>> {
        anyhow::bail!("permission denied")
    }

    fn name(&self) -> &str {
        "none"
    }
}

// ============================================================================
// Session wiring
// ============================================================================

pub struct Harness {
    pub session: InterviewSession,
    pub backend: Arc<ScriptedBackend>,
    pub recognizer: Arc<ScriptedRecognizer>,
    pub voice: Arc<RecordingVoice>,
}

pub fn test_config() -> SessionConfig {
    SessionConfig {
        time_limit: Duration::from_secs(30 * 60),
        simulated_speech: Duration::from_millis(10),
        transcript_grace: Duration::from_millis(100),
        ..SessionConfig::default()
    }
}

pub fn harness(backend: ScriptedBackend) -> Harness {
    harness_with(backend, test_config(), RecordingVoice::default())
}

pub fn harness_with(
    backend: ScriptedBackend,
    config: SessionConfig,
    voice: RecordingVoice,
) -> Harness {
    let backend = Arc::new(backend);
    let recognizer = Arc::new(ScriptedRecognizer::default());
    let voice = Arc::new(voice);

    let session = InterviewSession::new(
        config,
        SessionPorts {
            backend: backend.clone(),
            recognizer: recognizer.clone(),
            primary_voice: Some(voice.clone()),
            fallback_voice: None,
            media: Arc::new(HeadlessMediaDevices),
        },
    );

    Harness {
        session,
        backend,
        recognizer,
        voice,
    }
}

/// Standard two-question interview opening
pub fn two_question_backend() -> ScriptedBackend {
    ScriptedBackend::opening(
        "Welcome to your interview.",
        Some(question("q1", 1, 2, "Tell me about a project you are proud of.")),
    )
}
