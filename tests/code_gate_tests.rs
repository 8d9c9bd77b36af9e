mod common;

use anyhow::Result;
use common::*;
use interview_orchestrator::{CodeExecutionGate, GateError, GateState, SessionError, TurnReport};
use std::sync::Arc;
use std::time::Duration;

/// Interview whose first question requires code
fn coding_backend() -> ScriptedBackend {
    ScriptedBackend::opening(
        "Welcome.",
        Some(code_question("q1", 1, 2, "Reverse a linked list.")),
    )
}

const SOLUTION: &str = "def reverse(head):\n    return head\n";

#[tokio::test]
async fn test_failed_run_blocks_submission() -> Result<()> {
    let backend = coding_backend();
    backend.push_execution(execution("", 1));
    let h = harness(backend);
    h.session.start().await?;

    let result = h.session.run_code(SOLUTION, None, "").await;
    assert!(matches!(
        result,
        Err(SessionError::Code(GateError::ExecutionFailed(_)))
    ));
    assert_eq!(h.session.code_gate_state().await, GateState::NotRun);

    assert!(matches!(
        h.session.submit_code().await,
        Err(SessionError::Code(GateError::NotRunSuccessfully))
    ));
    assert_eq!(ScriptedBackend::count(&h.backend.submit_calls), 0);
    Ok(())
}

#[tokio::test]
async fn test_successful_run_gates_voice_until_submitted() -> Result<()> {
    let backend = coding_backend();
    backend.push_execution(execution("[3, 2, 1]\n", 0));
    backend.push_reply(reply(
        Some("Good. Next question."),
        Some(question("q2", 2, 2, "What is the complexity?")),
        1,
        2,
    ));
    let h = harness(backend);
    h.session.start().await?;
    h.session.wait_for_speech().await;

    let result = h.session.run_code(SOLUTION, None, "").await?;
    assert_eq!(result.output, "[3, 2, 1]\n");
    assert_eq!(h.session.code_gate_state().await, GateState::RanSuccessfully);

    // Voice and typed answers wait for the code to be submitted
    assert!(matches!(
        h.session.start_listening().await,
        Err(SessionError::MicrophoneGated(_))
    ));
    assert!(!h.session.status().await.microphone_armable);
    assert!(matches!(
        h.session.submit_answer("it reverses the list", false).await,
        Err(SessionError::CodeAwaitingSubmit)
    ));

    let report = h.session.submit_code().await?;
    assert!(matches!(report, TurnReport::Advanced { .. }));
    assert_eq!(h.session.code_gate_state().await, GateState::NotRun);

    let submitted = h.backend.last_submitted().unwrap();
    assert_eq!(submitted.question_id, "q1");
    assert!(submitted.message.starts_with("Here is my python solution:"));
    let context = submitted.code_context.expect("code context attached");
    assert_eq!(context.code, SOLUTION);
    assert_eq!(context.language, "python");
    assert_eq!(context.output, "[3, 2, 1]\n");

    h.session
        .end(interview_orchestrator::EndReason::UserEnded)
        .await?;
    let ended = h.backend.last_ended().unwrap();
    assert_eq!(ended.code_submissions.len(), 1);
    assert!(ended.code_submissions[0].submitted);
    Ok(())
}

#[tokio::test]
async fn test_editing_after_a_run_requires_another_run() -> Result<()> {
    let h = harness(coding_backend());
    h.session.start().await?;

    h.session.run_code(SOLUTION, None, "").await?;
    h.session.edit_code(SOLUTION).await;
    assert_eq!(h.session.code_gate_state().await, GateState::RanSuccessfully);

    h.session.edit_code("def reverse(head):\n    pass\n").await;
    assert_eq!(h.session.code_gate_state().await, GateState::NotRun);
    assert!(matches!(
        h.session.submit_code().await,
        Err(SessionError::Code(GateError::NotRunSuccessfully))
    ));
    Ok(())
}

#[tokio::test]
async fn test_rejected_submission_can_be_retried() -> Result<()> {
    let backend = coding_backend();
    backend.push_network_error();
    backend.push_reply(reply(
        None,
        Some(question("q2", 2, 2, "Next?")),
        1,
        2,
    ));
    let h = harness(backend);
    h.session.start().await?;
    h.session.run_code(SOLUTION, None, "").await?;

    assert!(matches!(
        h.session.submit_code().await,
        Err(SessionError::Api(_))
    ));
    assert_eq!(h.session.code_gate_state().await, GateState::RanSuccessfully);

    let report = h.session.submit_code().await?;
    assert!(matches!(report, TurnReport::Advanced { .. }));
    assert_eq!(ScriptedBackend::count(&h.backend.submit_calls), 2);
    Ok(())
}

#[tokio::test]
async fn test_unsubmitted_run_is_reported_at_end() -> Result<()> {
    let h = harness(coding_backend());
    h.session.start().await?;
    h.session.run_code(SOLUTION, Some("python"), "").await?;

    h.session
        .end(interview_orchestrator::EndReason::UserEnded)
        .await?;

    let ended = h.backend.last_ended().unwrap();
    assert_eq!(ended.code_submissions.len(), 1);
    assert_eq!(ended.code_submissions[0].question_id, "q1");
    assert!(!ended.code_submissions[0].submitted);
    Ok(())
}

#[tokio::test]
async fn test_run_code_requires_an_active_interview() {
    let h = harness(coding_backend());

    assert!(matches!(
        h.session.run_code(SOLUTION, None, "").await,
        Err(SessionError::InvalidState { .. })
    ));
    assert_eq!(ScriptedBackend::count(&h.backend.execute_calls), 0);
}

#[tokio::test]
async fn test_gate_claims_a_run_only_once() -> Result<()> {
    let backend = Arc::new(ScriptedBackend::default());
    let gate = CodeExecutionGate::new(backend.clone());

    assert!(matches!(
        gate.begin_submit().await,
        Err(GateError::NotRunSuccessfully)
    ));

    gate.run("session-1", "python", SOLUTION, "").await?;
    let context = gate.begin_submit().await?;
    assert_eq!(context.code, SOLUTION);
    assert_eq!(gate.state().await, GateState::Submitting);

    assert!(matches!(gate.begin_submit().await, Err(GateError::Submitting)));
    assert!(matches!(
        gate.run("session-1", "python", SOLUTION, "").await,
        Err(GateError::Submitting)
    ));

    gate.finish_submit(true).await;
    assert_eq!(gate.state().await, GateState::NotRun);
    assert!(gate.last_run().await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_failed_run_clears_a_previous_success() -> Result<()> {
    let backend = Arc::new(ScriptedBackend::default());
    backend.push_execution(execution("ok\n", 0));
    backend.push_execution(execution("", 2));
    let gate = CodeExecutionGate::new(backend.clone());

    gate.run("session-1", "python", SOLUTION, "").await?;
    assert_eq!(gate.state().await, GateState::RanSuccessfully);

    assert!(gate.run("session-1", "python", "broken", "").await.is_err());
    assert_eq!(gate.state().await, GateState::NotRun);
    assert!(gate.pending_submission("q1").await.is_none());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_run_finishing_after_the_question_changed_is_dropped() -> Result<()> {
    let backend = coding_backend();
    backend.set_execute_delay(Duration::from_secs(5));
    backend.push_reply(reply(
        Some("Let's talk design."),
        Some(question("q2", 2, 2, "How would you shard this?")),
        1,
        2,
    ));
    let h = harness(backend);
    h.session.start().await?;
    h.session.wait_for_speech().await;

    let session = h.session.clone();
    let run = tokio::spawn(async move { session.run_code(SOLUTION, None, "").await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let report = h.session.submit_answer("I would explain it instead", false).await?;
    assert!(matches!(report, TurnReport::Advanced { .. }));

    let result = run.await?;
    assert!(matches!(
        result,
        Err(SessionError::Code(GateError::QuestionChanged))
    ));

    let current = h.session.current_question().await.unwrap();
    assert_eq!(current.id, "q2");
    assert!(!current.requires_code);
    assert_eq!(h.session.code_gate_state().await, GateState::NotRun);
    assert!(matches!(
        h.session.submit_code().await,
        Err(SessionError::Code(GateError::NotRunSuccessfully))
    ));

    h.session.wait_for_speech().await;
    assert_eq!(h.session.microphone_block().await, None);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_gate_reset_during_a_run_discards_the_result() -> Result<()> {
    let backend = Arc::new(ScriptedBackend::default());
    backend.set_execute_delay(Duration::from_secs(2));
    let gate = CodeExecutionGate::new(backend.clone());

    let running = gate.clone();
    let run = tokio::spawn(async move { running.run("session-1", "python", SOLUTION, "").await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    gate.reset().await;

    assert!(matches!(run.await?, Err(GateError::QuestionChanged)));
    assert_eq!(gate.state().await, GateState::NotRun);
    assert!(gate.last_run().await.is_none());
    Ok(())
}
