use super::config::SessionConfig;
use super::error::SessionError;
use super::events::{EndReason, Phase, SessionEvent};
use super::stats::SessionStatus;
use super::types::{IntegrityCounters, Progress, Question, Speaker, Transcript, TranscriptEntry};
use crate::api::{
    ApiError, CodeContext, CodeSubmission, DeviceMetrics, EndSessionRequest, EndSessionResponse,
    ExecuteCodeResponse, InterviewBackend, SessionResults, StartSessionRequest,
};
use crate::code::{CodeExecutionGate, GateError, GateState};
use crate::conversation::{ConversationClient, NextStep, TurnOutcome};
use crate::integrity::{IntegrityEvent, IntegrityMonitor, IntegrityResponse};
use crate::media::{MediaController, MediaDevices};
use crate::speech::{
    is_placeholder, SpeechInputCapture, SpeechOutputQueue, SpeechRecognizer, SpeechSynthesizer,
    StartOutcome,
};
use crate::timer::CountdownTimer;
use serde::Serialize;
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, Mutex};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

const EVENT_CAPACITY: usize = 256;

/// Capabilities a session is wired to
pub struct SessionPorts {
    pub backend: Arc<dyn InterviewBackend>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    /// Networked voice
    pub primary_voice: Option<Arc<dyn SpeechSynthesizer>>,
    /// Local voice used when the primary one fails or is unavailable
    pub fallback_voice: Option<Arc<dyn SpeechSynthesizer>>,
    pub media: Arc<dyn MediaDevices>,
}

/// Result of a submitted turn
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TurnReport {
    /// A new question is current
    Advanced {
        question: Question,
        progress: Progress,
    },
    /// The last question was answered
    Completed { progress: Progress },
    /// The session ended while the answer was in flight; the reply was ignored
    Discarded,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EndOutcome {
    Ended {
        reason: EndReason,
        /// Backend scoring summary; `None` if the end call failed
        results: Option<EndSessionResponse>,
    },
    /// Another `end()` got there first
    AlreadyEnding,
}

/// Mutable session state; every transition happens under one lock
struct SessionState {
    phase: Phase,
    session_id: Option<String>,
    current_question: Option<Question>,
    /// When the current question became answerable
    presented_at: Option<Instant>,
    transcript: Transcript,
    progress: Progress,
    completed: bool,
    turn_in_flight: bool,
    started_at: Option<Instant>,
    submissions: Vec<CodeSubmission>,
    end_reason: Option<EndReason>,
    end_results: Option<EndSessionResponse>,
    last_error: Option<String>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            phase: Phase::NotStarted,
            session_id: None,
            current_question: None,
            presented_at: None,
            transcript: Transcript::new(),
            progress: Progress::default(),
            completed: false,
            turn_in_flight: false,
            started_at: None,
            submissions: Vec::new(),
            end_reason: None,
            end_results: None,
            last_error: None,
        }
    }

    fn elapsed_secs(&self) -> u64 {
        self.started_at.map_or(0, |t| t.elapsed().as_secs())
    }
}

struct Shared {
    config: SessionConfig,
    conversation: ConversationClient,
    gate: CodeExecutionGate,
    speech_out: SpeechOutputQueue,
    speech_in: SpeechInputCapture,
    media: MediaController,
    integrity: IntegrityMonitor,
    timer: CountdownTimer,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

/// What a turn captured before going to the network
struct TurnTicket {
    session_id: String,
    question: Question,
    presented_at: Option<Instant>,
}

/// Orchestrates one interview: start → (ask → answer)* → complete → end
#[derive(Clone)]
pub struct InterviewSession {
    inner: Arc<Shared>,
}

impl InterviewSession {
    /// Wire a session to its capabilities. Must be called inside a tokio runtime.
    pub fn new(config: SessionConfig, ports: SessionPorts) -> Self {
        let media = MediaController::new(ports.media);
        let speech_out = SpeechOutputQueue::new(
            ports.primary_voice,
            ports.fallback_voice,
            config.simulated_speech,
        );
        let speech_in =
            SpeechInputCapture::new(ports.recognizer, media.clone(), config.transcript_grace);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        info!(
            "Interview session prepared via {} ({}s limit)",
            ports.backend.name(),
            config.time_limit.as_secs()
        );

        Self {
            inner: Arc::new(Shared {
                conversation: ConversationClient::new(Arc::clone(&ports.backend)),
                gate: CodeExecutionGate::new(ports.backend),
                timer: CountdownTimer::new(config.time_limit),
                integrity: IntegrityMonitor::new(),
                state: Mutex::new(SessionState::new()),
                config,
                speech_out,
                speech_in,
                media,
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    fn emit_all(&self, events: Vec<SessionEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    fn warn_candidate(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.emit(SessionEvent::Warning { message });
    }

    // ------------------------------------------------------------------------
    // Start
    // ------------------------------------------------------------------------

    /// Create the backend session and present the first question
    ///
    /// Returns `Ok(false)` when another `start()` is already in flight.
    pub async fn start(&self) -> Result<bool, SessionError> {
        {
            let mut state = self.inner.state.lock().await;
            match state.phase.clone() {
                Phase::NotStarted | Phase::StartFailed(_) => {
                    state.phase = Phase::Starting;
                }
                Phase::Starting => {
                    debug!("Start already in flight");
                    return Ok(false);
                }
                phase => {
                    return Err(SessionError::InvalidState {
                        operation: "start",
                        phase,
                    });
                }
            }
        }
        self.emit(SessionEvent::PhaseChanged {
            phase: Phase::Starting,
        });

        let availability = self.inner.media.acquire().await;
        if !availability.microphone {
            self.warn_candidate("No microphone detected. You can type your answers instead.");
        }

        let request = StartSessionRequest {
            user: self.inner.config.candidate.clone(),
            configuration: self.inner.config.settings.clone(),
            context: self.inner.config.context.clone(),
        };

        let opening = match self.inner.conversation.open(&request).await {
            Ok(opening) => opening,
            Err(e) => {
                error!("Failed to start interview: {}", e);
                let phase = Phase::StartFailed(e.to_string());
                {
                    let mut state = self.inner.state.lock().await;
                    if state.phase == Phase::Starting {
                        state.phase = phase.clone();
                    }
                    state.last_error = Some(e.to_string());
                }
                self.emit(SessionEvent::PhaseChanged { phase });
                self.warn_candidate(format!("Could not start the interview: {}", e));
                return Err(SessionError::Api(e));
            }
        };

        let mut events = Vec::new();
        {
            let mut state = self.inner.state.lock().await;
            if state.phase != Phase::Starting {
                warn!("Session torn down while starting, ignoring backend session");
                return Err(SessionError::InvalidState {
                    operation: "start",
                    phase: state.phase.clone(),
                });
            }

            info!("Interview {} started", opening.session_id);
            state.session_id = Some(opening.session_id);
            state.started_at = Some(Instant::now());

            let welcome = state.transcript.append(Speaker::Ai, opening.welcome.clone());
            self.inner.speech_out.enqueue(opening.welcome.clone());
            events.push(SessionEvent::TranscriptAppended { entry: welcome });

            if let Some(question) = opening.first_question {
                if !opening.welcome.contains(question.text.as_str()) {
                    let entry = state.transcript.append(Speaker::Ai, question.text.clone());
                    self.inner.speech_out.enqueue(question.text.clone());
                    events.push(SessionEvent::TranscriptAppended { entry });
                }
                state.progress.advance(0, question.total_count);
                state.current_question = Some(question.clone());
                events.push(SessionEvent::QuestionChanged { question });
                events.push(SessionEvent::ProgressUpdated {
                    progress: state.progress,
                });
            }
            state.presented_at = Some(Instant::now());
            state.phase = Phase::InProgress;
            events.push(SessionEvent::PhaseChanged {
                phase: Phase::InProgress,
            });
        }
        self.emit_all(events);

        self.inner.integrity.arm();
        if self.inner.timer.start().await {
            self.watch_timer();
        }

        Ok(true)
    }

    /// End the session with `time_up` once the countdown expires
    fn watch_timer(&self) {
        let weak: Weak<Shared> = Arc::downgrade(&self.inner);
        let timer = self.inner.timer.clone();

        tokio::spawn(async move {
            if !timer.finished().await {
                return;
            }
            let Some(inner) = weak.upgrade() else {
                return;
            };

            let session = InterviewSession { inner };
            session.warn_candidate("Time is up. Ending the interview.");
            if let Err(e) = session.end(EndReason::TimeUp).await {
                warn!("Time-up end rejected: {}", e);
            }
        });
    }

    // ------------------------------------------------------------------------
    // Turns
    // ------------------------------------------------------------------------

    /// Submit an answer for the current question
    ///
    /// With `is_code`, the successful run held by the code gate is attached
    /// as the answer's code context.
    pub async fn submit_answer(&self, text: &str, is_code: bool) -> Result<TurnReport, SessionError> {
        let text = text.trim().to_string();
        if text.is_empty() || (!is_code && is_placeholder(&text)) {
            return Err(SessionError::EmptyAnswer);
        }

        let ticket = self.begin_turn().await?;

        let code_context = if is_code {
            match self.inner.gate.begin_submit().await {
                Ok(context) => Some(context),
                Err(e) => {
                    self.abort_turn().await;
                    self.warn_candidate(e.to_string());
                    return Err(e.into());
                }
            }
        } else {
            if ticket.question.requires_code
                && self.inner.gate.state().await == GateState::RanSuccessfully
            {
                self.abort_turn().await;
                return Err(SessionError::CodeAwaitingSubmit);
            }
            None
        };

        let response_time = ticket
            .presented_at
            .map(|t| t.elapsed().as_secs())
            .unwrap_or_else(|| self.inner.config.fallback_response_time.as_secs());

        let outcome = match self
            .inner
            .conversation
            .submit(
                &ticket.session_id,
                &text,
                &ticket.question,
                response_time,
                code_context.clone(),
            )
            .await
        {
            Ok(outcome) => Ok(self
                .inner
                .conversation
                .resolve_next_question(&ticket.session_id, outcome)
                .await),
            Err(e) => Err(e),
        };

        if is_code {
            self.inner.gate.finish_submit(outcome.is_ok()).await;
        }

        self.finish_turn(text, ticket, code_context, outcome).await
    }

    async fn begin_turn(&self) -> Result<TurnTicket, SessionError> {
        let mut state = self.inner.state.lock().await;

        if state.phase != Phase::InProgress {
            return Err(SessionError::InvalidState {
                operation: "submit an answer",
                phase: state.phase.clone(),
            });
        }
        if state.completed {
            return Err(SessionError::AlreadyCompleted);
        }
        if state.turn_in_flight {
            return Err(SessionError::TurnInFlight);
        }

        let session_id = state.session_id.clone().ok_or(SessionError::InvalidState {
            operation: "submit an answer",
            phase: state.phase.clone(),
        })?;
        let question = state
            .current_question
            .clone()
            .ok_or(SessionError::NoCurrentQuestion)?;

        state.turn_in_flight = true;
        Ok(TurnTicket {
            session_id,
            question,
            presented_at: state.presented_at,
        })
    }

    async fn abort_turn(&self) {
        self.inner.state.lock().await.turn_in_flight = false;
    }

    async fn finish_turn(
        &self,
        answer: String,
        ticket: TurnTicket,
        code_context: Option<CodeContext>,
        outcome: Result<TurnOutcome, ApiError>,
    ) -> Result<TurnReport, SessionError> {
        let mut events = Vec::new();
        let mut question_changed = false;

        let report = {
            let mut state = self.inner.state.lock().await;
            state.turn_in_flight = false;

            if state.phase != Phase::InProgress {
                info!("Session ended while answer was in flight, discarding reply");
                return Ok(TurnReport::Discarded);
            }

            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(e) => {
                    let entry = state.transcript.append(
                        Speaker::System,
                        format!("Could not submit your answer: {}. Please try again.", e),
                    );
                    state.last_error = Some(e.to_string());
                    drop(state);

                    self.emit(SessionEvent::TranscriptAppended { entry });
                    self.warn_candidate(format!("Answer not delivered: {}", e));
                    return Err(SessionError::Api(e));
                }
            };

            let entry = state.transcript.append(Speaker::Candidate, answer);
            events.push(SessionEvent::TranscriptAppended { entry });

            if let Some(context) = code_context {
                state.submissions.push(CodeSubmission {
                    question_id: ticket.question.id.clone(),
                    language: context.language,
                    code: context.code,
                    output: context.output,
                    execution_time: context.execution_time,
                    submitted: true,
                });
            }

            state
                .progress
                .advance(outcome.progress.answered, outcome.progress.total);

            match outcome.next {
                NextStep::Question(question) => {
                    // The interviewer's reply is the question's transcript entry;
                    // it lands before the question becomes current.
                    let spoken = outcome.ai_text.unwrap_or_else(|| question.text.clone());
                    let entry = state.transcript.append(Speaker::Ai, spoken.clone());
                    self.inner.speech_out.enqueue(spoken);
                    events.push(SessionEvent::TranscriptAppended { entry });

                    state.progress.advance(0, question.total_count);
                    state.current_question = Some(question.clone());
                    state.presented_at = Some(Instant::now());
                    question_changed = true;

                    events.push(SessionEvent::QuestionChanged {
                        question: question.clone(),
                    });
                    events.push(SessionEvent::ProgressUpdated {
                        progress: state.progress,
                    });
                    TurnReport::Advanced {
                        question,
                        progress: state.progress,
                    }
                }
                NextStep::Pending => {
                    // resolve_next_question never leaves a turn pending; keep
                    // the current question answerable if it ever does
                    warn!("Turn resolved without a next question");
                    if let Some(text) = outcome.ai_text {
                        let entry = state.transcript.append(Speaker::Ai, text.clone());
                        self.inner.speech_out.enqueue(text);
                        events.push(SessionEvent::TranscriptAppended { entry });
                    }
                    state.presented_at = Some(Instant::now());
                    TurnReport::Advanced {
                        question: ticket.question.clone(),
                        progress: state.progress,
                    }
                }
                NextStep::Complete => {
                    if let Some(text) = outcome.ai_text {
                        let entry = state.transcript.append(Speaker::Ai, text.clone());
                        self.inner.speech_out.enqueue(text);
                        events.push(SessionEvent::TranscriptAppended { entry });
                    }
                    events.push(SessionEvent::ProgressUpdated {
                        progress: state.progress,
                    });

                    if !state.completed {
                        info!(
                            "Interview complete ({}/{} answered)",
                            state.progress.answered, state.progress.total
                        );
                        state.completed = true;
                        events.push(SessionEvent::Completed);
                    }
                    TurnReport::Completed {
                        progress: state.progress,
                    }
                }
            }
        };

        if question_changed {
            self.inner.gate.reset().await;
        }
        self.emit_all(events);
        Ok(report)
    }

    // ------------------------------------------------------------------------
    // Voice input
    // ------------------------------------------------------------------------

    /// Why the microphone cannot be armed right now, if anything
    pub async fn microphone_block(&self) -> Option<&'static str> {
        {
            let state = self.inner.state.lock().await;
            if state.phase != Phase::InProgress {
                return Some("the interview is not in progress");
            }
            if state.completed {
                return Some("the interview is complete");
            }
            if state.turn_in_flight {
                return Some("an answer is being submitted");
            }
        }

        if self.inner.speech_out.is_busy() {
            return Some("the interviewer is speaking");
        }
        if self.inner.gate.awaiting_submit().await {
            return Some("submit your code first");
        }
        if !self.inner.media.availability().microphone {
            return Some("no microphone");
        }
        if self.inner.media.is_muted() {
            return Some("the microphone is muted");
        }
        None
    }

    /// Arm the microphone and start capturing an answer
    pub async fn start_listening(&self) -> Result<StartOutcome, SessionError> {
        if let Some(reason) = self.microphone_block().await {
            self.warn_candidate(format!("Cannot listen: {}", reason));
            return Err(SessionError::MicrophoneGated(reason));
        }

        match self.inner.speech_in.start().await {
            StartOutcome::Muted => Err(SessionError::MicrophoneGated("the microphone is muted")),
            StartOutcome::Unavailable(e) => {
                self.warn_candidate(e.placeholder());
                Err(SessionError::Recognition(e))
            }
            outcome => Ok(outcome),
        }
    }

    /// Stop capturing and submit what was said
    ///
    /// Returns `Ok(None)` when nothing usable was captured.
    pub async fn stop_listening(&self) -> Result<Option<TurnReport>, SessionError> {
        match self.inner.speech_in.stop().await {
            Some(answer) => self.submit_answer(&answer, false).await.map(Some),
            None => {
                self.warn_candidate("No answer captured. Please try again or type your answer.");
                Ok(None)
            }
        }
    }

    pub async fn live_transcript(&self) -> String {
        self.inner.speech_in.live_transcript().await
    }

    pub async fn set_muted(&self, muted: bool) -> Result<(), SessionError> {
        self.inner.media.set_muted(muted).await?;
        if muted && self.inner.speech_in.is_listening() {
            // Whatever was captured so far is dropped
            let _ = self.inner.speech_in.stop().await;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Code
    // ------------------------------------------------------------------------

    /// Run candidate code for the current (code) question
    pub async fn run_code(
        &self,
        code: &str,
        language: Option<&str>,
        stdin: &str,
    ) -> Result<ExecuteCodeResponse, SessionError> {
        let (session_id, question) = {
            let state = self.inner.state.lock().await;
            if state.phase != Phase::InProgress || state.completed {
                return Err(SessionError::InvalidState {
                    operation: "run code",
                    phase: state.phase.clone(),
                });
            }
            match (&state.session_id, &state.current_question) {
                (Some(id), Some(question)) => (id.clone(), question.clone()),
                _ => return Err(SessionError::NoCurrentQuestion),
            }
        };

        let language = language
            .map(str::to_string)
            .or(question.language)
            .unwrap_or_else(|| self.inner.config.default_code_language.clone());

        match self.inner.gate.run(&session_id, &language, code, stdin).await {
            Ok(result) => Ok(result),
            Err(e) => {
                self.warn_candidate(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Report an edit in the code editor
    pub async fn edit_code(&self, code: &str) {
        self.inner.gate.edit(code).await;
    }

    /// Submit the last successful run as the answer to the current question
    pub async fn submit_code(&self) -> Result<TurnReport, SessionError> {
        let Some(run) = self.inner.gate.last_run().await else {
            let e = GateError::NotRunSuccessfully;
            self.warn_candidate(e.to_string());
            return Err(e.into());
        };

        let message = format!(
            "Here is my {} solution:\n\n{}\n\nOutput:\n{}",
            run.language,
            run.code,
            run.result.output.trim_end()
        );
        self.submit_answer(&message, true).await
    }

    pub async fn code_gate_state(&self) -> GateState {
        self.inner.gate.state().await
    }

    // ------------------------------------------------------------------------
    // Integrity
    // ------------------------------------------------------------------------

    /// Feed a page-level signal into the monitor; never changes the phase
    pub async fn record_integrity_event(&self, event: IntegrityEvent) -> IntegrityResponse {
        let response = self.inner.integrity.observe(event);
        if let IntegrityResponse::Warning(warning) = &response {
            self.emit(SessionEvent::Warning {
                message: warning.message.clone(),
            });
        }
        response
    }

    // ------------------------------------------------------------------------
    // End
    // ------------------------------------------------------------------------

    /// Finish the interview and write results
    ///
    /// Only the first caller proceeds; concurrent callers get `AlreadyEnding`.
    /// Media, timer and capture are released whatever the backend says.
    pub async fn end(&self, reason: EndReason) -> Result<EndOutcome, SessionError> {
        let (session_id, results, history, mut submissions, question_id) = {
            let mut state = self.inner.state.lock().await;
            match state.phase.clone() {
                Phase::InProgress => state.phase = Phase::Completing,
                Phase::Completing | Phase::Ended => {
                    debug!("End already in flight ({})", reason.as_str());
                    return Ok(EndOutcome::AlreadyEnding);
                }
                phase => {
                    return Err(SessionError::InvalidState {
                        operation: "end",
                        phase,
                    });
                }
            }

            let results = SessionResults {
                termination_reason: reason.as_str().to_string(),
                elapsed_seconds: state.elapsed_secs(),
                questions_answered: state.progress.answered,
                total_questions: state.progress.total,
                completed: state.completed,
            };
            (
                state.session_id.clone().unwrap_or_default(),
                results,
                state.transcript.entries().to_vec(),
                state.submissions.clone(),
                state.current_question.as_ref().map(|q| q.id.clone()),
            )
        };
        self.emit(SessionEvent::PhaseChanged {
            phase: Phase::Completing,
        });
        info!("Ending interview {} ({})", session_id, reason.as_str());

        self.inner.timer.stop().await;
        let _ = self.inner.speech_in.stop().await;

        if let Some(question_id) = question_id {
            if let Some(pending) = self.inner.gate.pending_submission(&question_id).await {
                submissions.push(pending);
            }
        }

        let counters = self.inner.integrity.counters();
        let availability = self.inner.media.availability();
        let request = EndSessionRequest {
            session_id,
            results,
            conversation_history: history,
            code_submissions: submissions,
            device_metrics: DeviceMetrics {
                tab_switch_count: counters.tab_switch_count,
                fullscreen_exits: counters.fullscreen_exits,
                microphone_available: availability.microphone,
                camera_available: availability.camera,
            },
        };

        let end_results = match self.inner.conversation.backend().end_session(&request).await {
            Ok(response) => Some(response),
            Err(e) => {
                error!("Failed to write interview results: {}", e);
                self.warn_candidate(format!("Results could not be saved: {}", e));
                None
            }
        };

        self.release_resources().await;

        {
            let mut state = self.inner.state.lock().await;
            state.phase = Phase::Ended;
            state.end_reason = Some(reason);
            state.end_results = end_results.clone();
        }
        self.emit(SessionEvent::PhaseChanged {
            phase: Phase::Ended,
        });
        self.emit(SessionEvent::Ended { reason });

        Ok(EndOutcome::Ended {
            reason,
            results: end_results,
        })
    }

    async fn release_resources(&self) {
        self.inner.timer.stop().await;
        self.inner.media.release().await;
        self.inner.integrity.disarm();
        self.inner.speech_out.shutdown();
    }

    /// Release everything without writing results (abandoned session)
    pub async fn teardown(&self) {
        let _ = self.inner.speech_in.stop().await;
        self.release_resources().await;

        let mut state = self.inner.state.lock().await;
        if state.phase != Phase::Ended && state.phase != Phase::Completing {
            info!("Session torn down in phase {}", state.phase);
            state.phase = Phase::Ended;
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub async fn phase(&self) -> Phase {
        self.inner.state.lock().await.phase.clone()
    }

    pub async fn session_id(&self) -> Option<String> {
        self.inner.state.lock().await.session_id.clone()
    }

    pub async fn current_question(&self) -> Option<Question> {
        self.inner.state.lock().await.current_question.clone()
    }

    pub async fn progress(&self) -> Progress {
        self.inner.state.lock().await.progress
    }

    pub async fn is_completed(&self) -> bool {
        self.inner.state.lock().await.completed
    }

    pub async fn transcript(&self) -> Vec<TranscriptEntry> {
        self.inner.state.lock().await.transcript.entries().to_vec()
    }

    pub async fn end_results(&self) -> Option<EndSessionResponse> {
        self.inner.state.lock().await.end_results.clone()
    }

    pub fn integrity_counters(&self) -> IntegrityCounters {
        self.inner.integrity.counters()
    }

    pub fn is_speaking(&self) -> bool {
        self.inner.speech_out.is_busy()
    }

    /// Resolve once the interviewer has finished speaking
    pub async fn wait_for_speech(&self) {
        self.inner.speech_out.wait_idle().await;
    }

    /// Stored results from the backend (recovery/replay)
    pub async fn fetch_results(&self) -> Result<serde_json::Value, SessionError> {
        let session_id = self.session_id().await.ok_or(SessionError::InvalidState {
            operation: "fetch results",
            phase: Phase::NotStarted,
        })?;
        Ok(self.inner.conversation.backend().results(&session_id).await?)
    }

    /// Conversation history from the backend (recovery/replay)
    pub async fn fetch_history(&self) -> Result<serde_json::Value, SessionError> {
        let session_id = self.session_id().await.ok_or(SessionError::InvalidState {
            operation: "fetch history",
            phase: Phase::NotStarted,
        })?;
        Ok(self
            .inner
            .conversation
            .backend()
            .conversation_history(&session_id)
            .await?)
    }

    pub async fn status(&self) -> SessionStatus {
        let microphone_armable = self.microphone_block().await.is_none();
        let code_gate = self.inner.gate.state().await;
        let counters = self.inner.integrity.counters();

        let state = self.inner.state.lock().await;
        SessionStatus {
            phase: state.phase.clone(),
            session_id: state.session_id.clone(),
            current_question: state.current_question.clone(),
            progress: state.progress,
            percentage: state.progress.percentage(),
            completed: state.completed,
            speaking: self.inner.speech_out.is_busy(),
            listening: self.inner.speech_in.is_listening(),
            microphone_armable,
            muted: self.inner.media.is_muted(),
            mute_controls_enabled: self.inner.media.mute_controls_enabled(),
            code_gate,
            remaining_secs: self.inner.timer.remaining_secs(),
            elapsed_secs: state.elapsed_secs(),
            tab_switch_count: counters.tab_switch_count,
            transcript_entries: state.transcript.len(),
            end_reason: state.end_reason,
            last_error: state.last_error.clone(),
        }
    }
}
