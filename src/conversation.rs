//! Turn-taking protocol with the interview backend
//!
//! One `submit` is one network call. Callers serialize turns per session.
//! When a reply does not embed the next question, `resolve_next_question`
//! is the single place that decides where it comes from: polling, or
//! fallback numbering when the backend has nothing to offer.

use crate::api::{
    ApiError, CodeContext, InterviewBackend, StartSessionRequest, SubmitAnswerRequest,
};
use crate::session::{Progress, Question};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Spoken when the backend gives neither a question nor any text
const CONTINUE_PROMPT: &str = "Please continue with your answer.";

/// What the session received when it was created
#[derive(Debug, Clone)]
pub struct SessionOpening {
    pub session_id: String,
    pub welcome: String,
    pub first_question: Option<Question>,
}

/// Where the interview goes after a turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    /// A new question is current
    Question(Question),
    /// More questions remain but none was embedded in the reply
    Pending,
    /// No questions remain
    Complete,
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Interviewer reply to surface before anything else
    pub ai_text: Option<String>,
    pub next: NextStep,
    pub progress: Progress,
    pub answered_question_id: String,
}

impl TurnOutcome {
    pub fn is_complete(&self) -> bool {
        self.next == NextStep::Complete
    }
}

#[derive(Clone)]
pub struct ConversationClient {
    backend: Arc<dyn InterviewBackend>,
}

impl ConversationClient {
    pub fn new(backend: Arc<dyn InterviewBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn InterviewBackend> {
        &self.backend
    }

    /// Create the backend session
    pub async fn open(&self, request: &StartSessionRequest) -> Result<SessionOpening, ApiError> {
        let response = self.backend.start_session(request).await?;
        info!("Backend session {} created", response.session_id);

        Ok(SessionOpening {
            session_id: response.session_id,
            welcome: response.message,
            first_question: response.first_question.map(|q| q.into_question(1, 0)),
        })
    }

    /// Submit one answer
    pub async fn submit(
        &self,
        session_id: &str,
        answer: &str,
        question: &Question,
        response_time_secs: u64,
        code_context: Option<CodeContext>,
    ) -> Result<TurnOutcome, ApiError> {
        let request = SubmitAnswerRequest {
            session_id: session_id.to_string(),
            message: answer.to_string(),
            question_id: question.id.clone(),
            response_time: response_time_secs,
            code_context,
        };

        debug!(
            "Submitting answer to question {} ({}s)",
            question.id, response_time_secs
        );
        let response = self.backend.submit_answer(&request).await?;

        let progress = Progress::new(response.progress.answered, response.progress.total);
        let ai_text = response.ai_text().map(str::to_string);

        let completed = response.completed == Some(true)
            || (response.current_question.is_none() && progress.is_exhausted());

        let next = if completed {
            NextStep::Complete
        } else {
            match response.current_question {
                Some(wire) => NextStep::Question(
                    wire.into_question(progress.answered + 1, progress.total.max(question.total_count)),
                ),
                None => NextStep::Pending,
            }
        };

        info!(
            "Turn accepted: progress {}/{}, next={}",
            progress.answered,
            progress.total,
            match &next {
                NextStep::Question(q) => q.id.as_str(),
                NextStep::Pending => "pending",
                NextStep::Complete => "complete",
            }
        );

        Ok(TurnOutcome {
            ai_text,
            next,
            progress,
            answered_question_id: question.id.clone(),
        })
    }

    /// Replace a `Pending` next step with a concrete question or completion
    ///
    /// Polls the backend once; if that yields nothing new, numbers a question
    /// from the progress counters so the interview never stalls.
    pub async fn resolve_next_question(&self, session_id: &str, outcome: TurnOutcome) -> TurnOutcome {
        if outcome.next != NextStep::Pending {
            return outcome;
        }

        let ordinal = outcome.progress.answered + 1;
        let total = outcome.progress.total;

        let polled = match self.backend.fetch_question(session_id).await {
            Ok(poll) if poll.completed == Some(true) => {
                info!("Question poll reports the interview complete");
                return TurnOutcome {
                    next: NextStep::Complete,
                    ..outcome
                };
            }
            Ok(poll) => poll
                .question
                .map(|q| q.into_question(ordinal, total))
                .filter(|q| q.id != outcome.answered_question_id),
            Err(e) => {
                warn!("Question poll failed: {}", e);
                None
            }
        };

        let question = polled.unwrap_or_else(|| {
            warn!(
                "No next question from backend, numbering fallback question {}",
                ordinal
            );
            Question {
                id: format!("q{}", ordinal),
                ordinal,
                total_count: total,
                text: outcome
                    .ai_text
                    .clone()
                    .unwrap_or_else(|| CONTINUE_PROMPT.to_string()),
                requires_code: false,
                language: None,
            }
        });

        TurnOutcome {
            next: NextStep::Question(question),
            ..outcome
        }
    }
}
