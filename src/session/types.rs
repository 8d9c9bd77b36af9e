use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The question the candidate is currently answering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,

    /// 1-based position in the interview
    pub ordinal: u32,

    /// Number of questions the backend plans to ask
    pub total_count: u32,

    pub text: String,

    /// Whether the answer goes through the run-then-submit code flow
    pub requires_code: bool,

    /// Programming language for code questions
    pub language: Option<String>,
}

/// Who produced a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Ai,
    Candidate,
    System,
}

/// A single, immutable line of the interview transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    pub id: Uuid,
    pub speaker: Speaker,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only transcript, ordered by arrival
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return a copy of it
    pub fn append(&mut self, speaker: Speaker, text: impl Into<String>) -> TranscriptEntry {
        let entry = TranscriptEntry {
            id: Uuid::new_v4(),
            speaker,
            text: text.into(),
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        entry
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_by(&self, speaker: Speaker) -> usize {
        self.entries.iter().filter(|e| e.speaker == speaker).count()
    }
}

/// Answered/total question counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub answered: u32,
    pub total: u32,
}

impl Progress {
    pub fn new(answered: u32, total: u32) -> Self {
        Self { answered, total }
    }

    /// Completion ratio in `[0, 1]`; zero until the total is known
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.answered as f64 / self.total as f64).min(1.0)
    }

    /// Merge counters reported by the backend. Never moves backwards.
    pub fn advance(&mut self, answered: u32, total: u32) {
        self.answered = self.answered.max(answered);
        self.total = self.total.max(total);
    }

    pub fn is_exhausted(&self) -> bool {
        self.total > 0 && self.answered >= self.total
    }
}

/// Exam-integrity counters; monotonic for the lifetime of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityCounters {
    pub tab_switch_count: u32,
    pub fullscreen_exits: u32,
}
