pub mod backend;
pub mod console;
pub mod input;
pub mod output;

pub use backend::{
    is_placeholder, RecognitionError, RecognitionEvent, SpeechRecognizer, SpeechSynthesizer,
    LISTENING_PLACEHOLDER, NO_SPEECH_PLACEHOLDER,
};
pub use console::{ConsoleSynthesizer, UnavailableRecognizer};
pub use input::{CaptureState, SpeechInputCapture, StartOutcome};
pub use output::{SpeechOutputQueue, SpeechQueueItem};
