mod common;

use anyhow::Result;
use common::*;
use interview_orchestrator::media::MediaController;
use interview_orchestrator::speech::{
    CaptureState, RecognitionError, SpeechInputCapture, StartOutcome, LISTENING_PLACEHOLDER,
};
use interview_orchestrator::{HeadlessMediaDevices, SessionError, TurnReport};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

async fn capture() -> (SpeechInputCapture, Arc<ScriptedRecognizer>, MediaController) {
    let recognizer = Arc::new(ScriptedRecognizer::default());
    let media = MediaController::new(Arc::new(HeadlessMediaDevices));
    media.acquire().await;
    let capture =
        SpeechInputCapture::new(recognizer.clone(), media.clone(), Duration::from_millis(100));
    (capture, recognizer, media)
}

#[tokio::test]
async fn test_stop_returns_finalized_transcript() -> Result<()> {
    let (capture, recognizer, _media) = capture().await;

    assert_eq!(capture.start().await, StartOutcome::Started);
    assert!(capture.is_listening());
    assert_eq!(capture.live_transcript().await, LISTENING_PLACEHOLDER);

    recognizer.say_interim("I would use").await;
    recognizer.say_final("I would use a hash map").await;
    recognizer.say_interim("keyed by user").await;

    let answer = capture.stop().await;
    assert_eq!(answer.as_deref(), Some("I would use a hash map keyed by user"));
    assert_eq!(capture.state().await, CaptureState::Idle);
    assert_eq!(recognizer.stop_calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_second_start_while_listening_is_a_noop() {
    let (capture, recognizer, _media) = capture().await;

    assert_eq!(capture.start().await, StartOutcome::Started);
    assert_eq!(capture.start().await, StartOutcome::AlreadyListening);
    assert_eq!(recognizer.start_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_muted_microphone_refuses_to_listen() -> Result<()> {
    let (capture, recognizer, media) = capture().await;
    media.set_muted(true).await?;

    assert_eq!(capture.start().await, StartOutcome::Muted);
    assert!(!capture.is_listening());
    assert_eq!(recognizer.start_calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_no_speech_is_never_submitted() {
    let (capture, recognizer, _media) = capture().await;

    capture.start().await;
    recognizer.say_interim("um").await;
    recognizer.fail(RecognitionError::NoSpeech).await;

    assert_eq!(capture.stop().await, None);
}

#[tokio::test]
async fn test_captured_answer_is_taken_once() {
    let (capture, recognizer, _media) = capture().await;

    capture.start().await;
    recognizer.say_final("binary search").await;

    assert_eq!(capture.stop().await.as_deref(), Some("binary search"));
    assert_eq!(capture.stop().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_transcript_clears_after_grace_period() {
    let (capture, recognizer, _media) = capture().await;

    capture.start().await;
    recognizer.say_final("a trie").await;
    capture.stop().await;
    assert_eq!(capture.live_transcript().await, "a trie");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(capture.live_transcript().await, "");
}

#[tokio::test]
async fn test_voice_answer_is_submitted_for_current_question() -> Result<()> {
    let backend = two_question_backend();
    backend.push_reply(reply(
        None,
        Some(question("q2", 2, 2, "Second?")),
        1,
        2,
    ));
    let h = harness(backend);
    h.session.start().await?;
    h.session.wait_for_speech().await;

    assert_eq!(h.session.start_listening().await?, StartOutcome::Started);
    h.recognizer.say_final("A distributed cache.").await;

    let report = h.session.stop_listening().await?;
    assert!(matches!(report, Some(TurnReport::Advanced { .. })));
    assert_eq!(
        h.backend.last_submitted().unwrap().message,
        "A distributed cache."
    );
    Ok(())
}

#[tokio::test]
async fn test_empty_capture_submits_nothing() -> Result<()> {
    let h = harness(two_question_backend());
    h.session.start().await?;
    h.session.wait_for_speech().await;

    h.session.start_listening().await?;
    assert_eq!(h.session.stop_listening().await?, None);
    assert_eq!(ScriptedBackend::count(&h.backend.submit_calls), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_microphone_is_gated_while_interviewer_speaks() -> Result<()> {
    let h = harness_with(
        two_question_backend(),
        test_config(),
        RecordingVoice::with_delay(Duration::from_secs(3)),
    );
    h.session.start().await?;

    assert!(matches!(
        h.session.start_listening().await,
        Err(SessionError::MicrophoneGated(_))
    ));
    assert!(h.session.is_speaking());

    h.session.wait_for_speech().await;
    assert_eq!(h.session.start_listening().await?, StartOutcome::Started);
    Ok(())
}

#[tokio::test]
async fn test_muting_stops_an_active_capture() -> Result<()> {
    let h = harness(two_question_backend());
    h.session.start().await?;
    h.session.wait_for_speech().await;

    h.session.start_listening().await?;
    h.session.set_muted(true).await?;

    let status = h.session.status().await;
    assert!(status.muted);
    assert!(!status.listening);
    assert!(matches!(
        h.session.start_listening().await,
        Err(SessionError::MicrophoneGated(_))
    ));

    h.session.set_muted(false).await?;
    assert_eq!(h.session.start_listening().await?, StartOutcome::Started);
    Ok(())
}

#[tokio::test]
async fn test_no_microphone_disables_voice_but_not_typing() -> Result<()> {
    let backend = Arc::new(two_question_backend());
    backend.push_reply(reply(
        None,
        Some(question("q2", 2, 2, "Second?")),
        1,
        2,
    ));
    let session = interview_orchestrator::InterviewSession::new(
        test_config(),
        interview_orchestrator::SessionPorts {
            backend: backend.clone(),
            recognizer: Arc::new(ScriptedRecognizer::default()),
            primary_voice: None,
            fallback_voice: None,
            media: Arc::new(NoMediaDevices),
        },
    );
    session.start().await?;
    session.wait_for_speech().await;

    let status = session.status().await;
    assert!(!status.mute_controls_enabled);
    assert!(!status.microphone_armable);
    assert!(matches!(
        session.start_listening().await,
        Err(SessionError::MicrophoneGated(_))
    ));

    let report = session.submit_answer("typed answer", false).await?;
    assert!(matches!(report, TurnReport::Advanced { .. }));
    Ok(())
}

#[tokio::test]
async fn test_closed_recognizer_stream_returns_capture_to_idle() -> Result<()> {
    let (capture, recognizer, _media) = capture().await;

    assert_eq!(capture.start().await, StartOutcome::Started);
    recognizer.say_final("half an answer").await;
    recognizer.hang_up();

    for _ in 0..10 {
        if !capture.is_listening() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(!capture.is_listening());
    assert_eq!(capture.state().await, CaptureState::Idle);

    assert_eq!(capture.start().await, StartOutcome::Started);
    assert_eq!(recognizer.start_calls.load(Ordering::SeqCst), 2);
    Ok(())
}
