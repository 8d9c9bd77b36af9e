use anyhow::{Context, Result};
use clap::Parser;
use interview_orchestrator::session::Speaker;
use interview_orchestrator::speech::{ConsoleSynthesizer, UnavailableRecognizer};
use interview_orchestrator::{
    create_router, AppState, Config, EndReason, HeadlessMediaDevices, HttpBackend,
    IntegrityEvent, InterviewSession, SessionConfig, SessionError, SessionEvent, SessionPorts,
    TurnReport,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "interview-orchestrator")]
#[command(about = "Voice-driven technical interview session")]
struct Args {
    /// Config file (without extension)
    #[arg(short, long, default_value = "config/interview")]
    config: String,

    /// Serve the HTTP control API instead of running a console interview
    #[arg(long)]
    serve: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Interview Orchestrator v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Backend: {}", cfg.backend.base_url);

    let backend = Arc::new(HttpBackend::new(&cfg.backend)?);
    let ports = SessionPorts {
        backend,
        recognizer: Arc::new(UnavailableRecognizer),
        primary_voice: None,
        fallback_voice: Some(Arc::new(ConsoleSynthesizer::new(
            cfg.speech.words_per_minute,
        ))),
        media: Arc::new(HeadlessMediaDevices),
    };
    let session = InterviewSession::new(SessionConfig::from_config(&cfg), ports);

    if args.serve {
        serve(&cfg, session).await
    } else {
        run_console(session).await
    }
}

async fn serve(cfg: &Config, session: InterviewSession) -> Result<()> {
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Control API listening on http://{}", addr);

    let app = create_router(AppState::new(session.clone()));
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    session.teardown().await;
    Ok(())
}

async fn run_console(session: InterviewSession) -> Result<()> {
    let mut events = session.subscribe();
    let mut printer = tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            };
            match event {
                // Interviewer lines are printed by the console synthesizer
                SessionEvent::TranscriptAppended { entry } if entry.speaker == Speaker::System => {
                    println!("[system] {}", entry.text);
                }
                SessionEvent::Warning { message } => println!("[warning] {}", message),
                SessionEvent::QuestionChanged { question } => {
                    println!(
                        "--- Question {}/{}{} ---",
                        question.ordinal,
                        question.total_count,
                        if question.requires_code { " (code)" } else { "" }
                    );
                }
                SessionEvent::Completed => {
                    println!("All questions answered. Type /end to finish.");
                }
                SessionEvent::Ended { reason } => {
                    println!("Interview ended ({}).", reason.as_str());
                    break;
                }
                _ => {}
            }
        }
    });

    session.start().await?;
    println!("Type your answers. Commands: /run <file>, /submit, /mute, /unmute, /hide, /status, /end");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut printer_done = false;
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
            // Printer exits once the session has ended (e.g. time up)
            _ = &mut printer => {
                printer_done = true;
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !handle_line(&session, line).await? {
            break;
        }
    }

    if let Err(e) = session.end(EndReason::UserEnded).await {
        info!("Session not ended: {}", e);
    }
    session.teardown().await;
    if !printer_done {
        // Let the final events print
        let _ = tokio::time::timeout(Duration::from_secs(1), printer).await;
    }
    Ok(())
}

/// Returns `false` when the console loop should stop
async fn handle_line(session: &InterviewSession, line: &str) -> Result<bool> {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));

    let result = match command {
        "/end" => return Ok(false),
        "/run" => {
            let code = match tokio::fs::read_to_string(rest.trim()).await {
                Ok(code) => code,
                Err(e) => {
                    error!("Failed to read {}: {}", rest.trim(), e);
                    return Ok(true);
                }
            };
            session.edit_code(&code).await;
            session.run_code(&code, None, "").await.map(|result| {
                println!("{}", result.output);
            })
        }
        "/submit" => session.submit_code().await.map(print_report),
        "/mute" => session.set_muted(true).await,
        "/unmute" => session.set_muted(false).await,
        "/hide" => {
            session
                .record_integrity_event(IntegrityEvent::VisibilityHidden)
                .await;
            Ok(())
        }
        "/status" => {
            let status = session.status().await;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        _ => session.submit_answer(line, false).await.map(print_report),
    };

    match result {
        Ok(()) => {}
        // Already reported through a warning event
        Err(SessionError::Api(_)) | Err(SessionError::Code(_)) => {}
        Err(e) => error!("{}", e),
    }
    Ok(true)
}

fn print_report(report: TurnReport) {
    if let TurnReport::Completed { progress } = report {
        info!("Answered {}/{}", progress.answered, progress.total);
    }
}
