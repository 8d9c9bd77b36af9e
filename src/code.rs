//! Run-then-submit gate for coding questions
//!
//! `NotRun -> RanSuccessfully -> Submitting -> NotRun`. Editing the code after
//! a successful run drops the gate back to `NotRun`, so only code that was
//! actually executed can be submitted.

use crate::api::{
    ApiError, CodeContext, CodeSubmission, ExecuteCodeRequest, ExecuteCodeResponse,
    InterviewBackend,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    NotRun,
    RanSuccessfully,
    Submitting,
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("Run your code successfully before submitting")]
    NotRunSuccessfully,

    #[error("A submission is already in progress")]
    Submitting,

    #[error("The question changed while the code was running")]
    QuestionChanged,

    #[error("Code execution failed: {0}")]
    ExecutionFailed(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Outcome of the last successful run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub language: String,
    pub code: String,
    pub result: ExecuteCodeResponse,
}

#[derive(Debug)]
struct GateInner {
    state: GateState,
    last_run: Option<ExecutionRecord>,
    /// Bumped on every reset so runs started for an earlier question are dropped
    generation: u64,
}

#[derive(Clone)]
pub struct CodeExecutionGate {
    backend: Arc<dyn InterviewBackend>,
    inner: Arc<Mutex<GateInner>>,
}

impl CodeExecutionGate {
    pub fn new(backend: Arc<dyn InterviewBackend>) -> Self {
        Self {
            backend,
            inner: Arc::new(Mutex::new(GateInner {
                state: GateState::NotRun,
                last_run: None,
                generation: 0,
            })),
        }
    }

    pub async fn state(&self) -> GateState {
        self.inner.lock().await.state
    }

    /// True while a successful run is waiting to be submitted; voice input
    /// stays disarmed until then.
    pub async fn awaiting_submit(&self) -> bool {
        self.state().await != GateState::NotRun
    }

    pub async fn last_run(&self) -> Option<ExecutionRecord> {
        self.inner.lock().await.last_run.clone()
    }

    /// Execute code remotely. A failed run is an ordinary outcome, not fatal.
    pub async fn run(
        &self,
        session_id: &str,
        language: &str,
        code: &str,
        stdin: &str,
    ) -> Result<ExecuteCodeResponse, GateError> {
        let generation = {
            let inner = self.inner.lock().await;
            if inner.state == GateState::Submitting {
                return Err(GateError::Submitting);
            }
            inner.generation
        };

        let request = ExecuteCodeRequest {
            session_id: session_id.to_string(),
            language: language.to_string(),
            code: code.to_string(),
            stdin: stdin.to_string(),
        };

        info!("Executing {} code ({} bytes)", language, code.len());
        let outcome = self.backend.execute_code(&request).await;

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            info!("Discarding code run for a question that is no longer current");
            return Err(GateError::QuestionChanged);
        }
        if inner.state == GateState::Submitting {
            // A submit started while this run was in flight; it owns the gate now
            return Err(GateError::Submitting);
        }

        match outcome {
            Ok(result) if result.succeeded() => {
                info!(
                    "Code ran successfully in {:.3}s",
                    result.execution_time.unwrap_or_default()
                );
                inner.state = GateState::RanSuccessfully;
                inner.last_run = Some(ExecutionRecord {
                    language: language.to_string(),
                    code: code.to_string(),
                    result: result.clone(),
                });
                Ok(result)
            }
            Ok(result) => {
                let reason = result
                    .error
                    .clone()
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| format!("exit code {}", result.exit_code.unwrap_or(-1)));
                warn!("Code run failed: {}", reason);
                inner.state = GateState::NotRun;
                inner.last_run = None;
                Err(GateError::ExecutionFailed(reason))
            }
            Err(e) => {
                warn!("Code execution request failed: {}", e);
                inner.state = GateState::NotRun;
                inner.last_run = None;
                Err(GateError::Api(e))
            }
        }
    }

    /// Record an edit. Changing code after a successful run requires a re-run.
    pub async fn edit(&self, code: &str) {
        let mut inner = self.inner.lock().await;
        if inner.state != GateState::RanSuccessfully {
            return;
        }

        let unchanged = inner
            .last_run
            .as_ref()
            .map_or(false, |run| run.code == code);
        if !unchanged {
            info!("Code edited after a successful run, re-run required");
            inner.state = GateState::NotRun;
            inner.last_run = None;
        }
    }

    /// Claim the successful run for submission
    pub async fn begin_submit(&self) -> Result<CodeContext, GateError> {
        let mut inner = self.inner.lock().await;
        match inner.state {
            GateState::Submitting => Err(GateError::Submitting),
            GateState::NotRun => {
                warn!("Submit refused: code has not run successfully");
                Err(GateError::NotRunSuccessfully)
            }
            GateState::RanSuccessfully => {
                let run = inner
                    .last_run
                    .as_ref()
                    .ok_or(GateError::NotRunSuccessfully)?;
                let context = CodeContext {
                    code: run.code.clone(),
                    language: run.language.clone(),
                    output: run.result.output.clone(),
                    execution_time: run.result.execution_time,
                };
                inner.state = GateState::Submitting;
                Ok(context)
            }
        }
    }

    /// Finish a submission. On failure the run stays claimable for a retry.
    pub async fn finish_submit(&self, accepted: bool) {
        let mut inner = self.inner.lock().await;
        if inner.state != GateState::Submitting {
            return;
        }

        if accepted {
            inner.state = GateState::NotRun;
            inner.last_run = None;
        } else {
            inner.state = GateState::RanSuccessfully;
        }
    }

    /// A successful run that was never submitted, for the end-of-session payload
    pub async fn pending_submission(&self, question_id: &str) -> Option<CodeSubmission> {
        let inner = self.inner.lock().await;
        if inner.state == GateState::NotRun {
            return None;
        }

        inner.last_run.as_ref().map(|run| CodeSubmission {
            question_id: question_id.to_string(),
            language: run.language.clone(),
            code: run.code.clone(),
            output: run.result.output.clone(),
            execution_time: run.result.execution_time,
            submitted: false,
        })
    }

    /// Forget any run; used when a new question becomes current
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.state = GateState::NotRun;
        inner.last_run = None;
        inner.generation += 1;
    }
}
