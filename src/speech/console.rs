// Terminal stand-ins for the platform speech capabilities

use super::backend::{RecognitionError, RecognitionEvent, SpeechRecognizer, SpeechSynthesizer};
use anyhow::Result;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;

/// Local synthesizer that prints the text and takes as long as reading it aloud would
pub struct ConsoleSynthesizer {
    words_per_minute: u32,
}

impl ConsoleSynthesizer {
    pub fn new(words_per_minute: u32) -> Self {
        Self {
            words_per_minute: words_per_minute.max(1),
        }
    }

    /// Time needed to say `text` at the configured rate
    pub fn speaking_time(&self, text: &str) -> Duration {
        let words = text.split_whitespace().count() as u64;
        Duration::from_millis(words * 60_000 / self.words_per_minute as u64)
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for ConsoleSynthesizer {
    async fn speak(&self, text: &str, _audio_hint: Option<&str>) -> Result<()> {
        let mut stdout = std::io::stdout();
        writeln!(stdout, "\n[interviewer] {}", text)?;
        stdout.flush()?;

        tokio::time::sleep(self.speaking_time(text)).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

/// Recognizer for hosts without speech-to-text; answers are typed instead
pub struct UnavailableRecognizer;

#[async_trait::async_trait]
impl SpeechRecognizer for UnavailableRecognizer {
    async fn start(&self) -> Result<mpsc::Receiver<RecognitionEvent>, RecognitionError> {
        Err(RecognitionError::NotSupported)
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}
