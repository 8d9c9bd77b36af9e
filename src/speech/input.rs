use super::backend::{
    is_placeholder, RecognitionError, RecognitionEvent, SpeechRecognizer, LISTENING_PLACEHOLDER,
};
use crate::media::MediaController;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long `stop()` waits for the recognizer to flush its last final result
const FINAL_RESULT_WAIT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureState {
    Idle,
    Listening,
}

/// Result of asking the capture to start listening
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyListening,
    /// Microphone is muted; nothing was started
    Muted,
    /// Recognizer could not start; a placeholder transcript is shown instead
    Unavailable(RecognitionError),
}

/// Interim + finalized text of the utterance being captured
#[derive(Debug, Default)]
struct LiveTranscript {
    finalized: String,
    interim: String,
    placeholder: Option<String>,
    taken: bool,
}

impl LiveTranscript {
    fn listening() -> Self {
        Self {
            placeholder: Some(LISTENING_PLACEHOLDER.to_string()),
            ..Self::default()
        }
    }

    fn failed(error: &RecognitionError) -> Self {
        Self {
            placeholder: Some(error.placeholder().to_string()),
            ..Self::default()
        }
    }

    fn apply(&mut self, event: RecognitionEvent) {
        match event {
            RecognitionEvent::Interim(text) => {
                self.placeholder = None;
                self.interim = text;
            }
            RecognitionEvent::Final(text) => {
                self.placeholder = None;
                if !self.finalized.is_empty() {
                    self.finalized.push(' ');
                }
                self.finalized.push_str(text.trim());
                self.interim.clear();
            }
            RecognitionEvent::Error(e) => *self = Self::failed(&e),
            RecognitionEvent::Ended => {}
        }
    }

    fn text(&self) -> String {
        if let Some(placeholder) = &self.placeholder {
            return placeholder.clone();
        }
        format!("{} {}", self.finalized, self.interim)
            .trim()
            .to_string()
    }
}

struct CaptureInner {
    state: CaptureState,
    live: LiveTranscript,
    /// Bumped on every start so stale pump/clear tasks can tell they are stale
    generation: u64,
    pump: Option<JoinHandle<()>>,
    clear_task: Option<JoinHandle<()>>,
}

/// Start/stop wrapper around a speech recognizer with a live transcript
#[derive(Clone)]
pub struct SpeechInputCapture {
    recognizer: Arc<dyn SpeechRecognizer>,
    media: MediaController,
    inner: Arc<Mutex<CaptureInner>>,
    listening: Arc<AtomicBool>,
    grace_period: Duration,
}

impl SpeechInputCapture {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        media: MediaController,
        grace_period: Duration,
    ) -> Self {
        Self {
            recognizer,
            media,
            inner: Arc::new(Mutex::new(CaptureInner {
                state: CaptureState::Idle,
                live: LiveTranscript::default(),
                generation: 0,
                pump: None,
                clear_task: None,
            })),
            listening: Arc::new(AtomicBool::new(false)),
            grace_period,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    pub async fn state(&self) -> CaptureState {
        self.inner.lock().await.state
    }

    /// Text to display: partial results, or a placeholder
    pub async fn live_transcript(&self) -> String {
        self.inner.lock().await.live.text()
    }

    pub async fn start(&self) -> StartOutcome {
        let mut inner = self.inner.lock().await;

        if inner.state == CaptureState::Listening {
            debug!("Already listening");
            return StartOutcome::AlreadyListening;
        }

        if self.media.is_muted() {
            warn!("Microphone is muted, unmute before answering");
            return StartOutcome::Muted;
        }

        if let Some(task) = inner.clear_task.take() {
            task.abort();
        }
        inner.generation += 1;

        let rx = match self.recognizer.start().await {
            Ok(rx) => rx,
            Err(e) => {
                warn!("{} failed to start: {}", self.recognizer.name(), e);
                inner.live = LiveTranscript::failed(&e);
                return StartOutcome::Unavailable(e);
            }
        };

        inner.live = LiveTranscript::listening();
        inner.state = CaptureState::Listening;
        self.listening.store(true, Ordering::SeqCst);
        inner.pump = Some(tokio::spawn(Self::pump(
            rx,
            Arc::clone(&self.inner),
            Arc::clone(&self.listening),
            inner.generation,
        )));

        info!("Listening via {}", self.recognizer.name());
        StartOutcome::Started
    }

    /// Stop listening and take the captured answer
    ///
    /// Returns `None` when nothing usable was said: empty text, a placeholder,
    /// or an answer already taken by an earlier `stop()`.
    pub async fn stop(&self) -> Option<String> {
        let pump = {
            let mut inner = self.inner.lock().await;
            if inner.state == CaptureState::Listening {
                if let Err(e) = self.recognizer.stop().await {
                    warn!("{} failed to stop cleanly: {}", self.recognizer.name(), e);
                }
            }
            inner.pump.take()
        };

        if let Some(mut pump) = pump {
            if tokio::time::timeout(FINAL_RESULT_WAIT, &mut pump).await.is_err() {
                debug!("Recognizer did not close its stream in time");
                pump.abort();
            }
        }

        let mut inner = self.inner.lock().await;
        inner.state = CaptureState::Idle;
        self.listening.store(false, Ordering::SeqCst);

        let text = inner.live.text();
        let already_taken = std::mem::replace(&mut inner.live.taken, true);

        let generation = inner.generation;
        let shared = Arc::clone(&self.inner);
        let grace = self.grace_period;
        inner.clear_task = Some(tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let mut inner = shared.lock().await;
            if inner.generation == generation && inner.state == CaptureState::Idle {
                inner.live = LiveTranscript::default();
            }
        }));

        if already_taken || is_placeholder(&text) {
            debug!("No usable transcript captured");
            return None;
        }

        info!("Captured answer ({} chars)", text.len());
        Some(text)
    }

    async fn pump(
        mut rx: mpsc::Receiver<RecognitionEvent>,
        inner: Arc<Mutex<CaptureInner>>,
        listening: Arc<AtomicBool>,
        generation: u64,
    ) {
        loop {
            let Some(event) = rx.recv().await else {
                // Recognizer closed its stream without a terminal event
                let mut inner = inner.lock().await;
                if inner.generation == generation && inner.state == CaptureState::Listening {
                    debug!("Recognizer stream closed, capture is idle");
                    inner.state = CaptureState::Idle;
                    listening.store(false, Ordering::SeqCst);
                }
                break;
            };

            let mut inner = inner.lock().await;
            if inner.generation != generation {
                break;
            }

            let terminal = matches!(
                event,
                RecognitionEvent::Error(_) | RecognitionEvent::Ended
            );
            if let RecognitionEvent::Error(e) = &event {
                warn!("Speech recognition error: {}", e);
            }
            inner.live.apply(event);

            if terminal {
                inner.state = CaptureState::Idle;
                listening.store(false, Ordering::SeqCst);
                break;
            }
        }
    }
}
