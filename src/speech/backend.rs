use anyhow::Result;
use thiserror::Error;
use tokio::sync::mpsc;

/// Text-to-speech capability
///
/// Implementations:
/// - networked voices (primary)
/// - local/platform voices (fallback), e.g. `ConsoleSynthesizer`
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `text` and resolve once playback has finished
    async fn speak(&self, text: &str, audio_hint: Option<&str>) -> Result<()>;

    /// Whether the capability can be used right now
    fn is_available(&self) -> bool {
        true
    }

    /// Synthesizer name for logging
    fn name(&self) -> &str;
}

/// Why speech recognition stopped producing results
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    #[error("no speech detected")]
    NoSpeech,

    #[error("microphone permission denied")]
    NotAllowed,

    #[error("recognition network error")]
    Network,

    #[error("recognition aborted")]
    Aborted,

    #[error("speech recognition not supported")]
    NotSupported,

    #[error("recognition failed: {0}")]
    Other(String),
}

impl RecognitionError {
    /// Text shown in place of a transcript after this error
    pub fn placeholder(&self) -> &'static str {
        match self {
            RecognitionError::NoSpeech => NO_SPEECH_PLACEHOLDER,
            RecognitionError::NotAllowed => "Microphone access denied. Please allow microphone access.",
            RecognitionError::Network => "Speech recognition network error. Please type your answer.",
            RecognitionError::Aborted => "Speech recognition stopped.",
            RecognitionError::NotSupported => "Speech recognition is not available. Please type your answer.",
            RecognitionError::Other(_) => "Speech recognition error. Please try again.",
        }
    }
}

pub const NO_SPEECH_PLACEHOLDER: &str = "No speech detected. Please try again.";
pub const LISTENING_PLACEHOLDER: &str = "Listening...";

/// Event delivered by a recognizer while it is listening
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Hypothesis for the utterance in progress; replaces the previous interim text
    Interim(String),
    /// Finalized segment; appended to the transcript
    Final(String),
    /// Recognition failed; the session stops listening
    Error(RecognitionError),
    /// Recognizer ended on its own (end of utterance, silence timeout)
    Ended,
}

/// Speech-to-text capability with interim and final results
#[async_trait::async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Begin recognition
    ///
    /// Returns a channel receiver that will receive recognition events
    async fn start(&self) -> Result<mpsc::Receiver<RecognitionEvent>, RecognitionError>;

    /// Stop recognition. Must tolerate being called when already stopped.
    async fn stop(&self) -> Result<()>;

    /// Recognizer name for logging
    fn name(&self) -> &str;
}

/// All placeholder texts that must never be submitted as an answer
pub fn is_placeholder(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || text == LISTENING_PLACEHOLDER {
        return true;
    }

    [
        RecognitionError::NoSpeech,
        RecognitionError::NotAllowed,
        RecognitionError::Network,
        RecognitionError::Aborted,
        RecognitionError::NotSupported,
        RecognitionError::Other(String::new()),
    ]
    .iter()
    .any(|e| e.placeholder() == text)
}
