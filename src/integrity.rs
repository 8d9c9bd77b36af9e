use crate::session::IntegrityCounters;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Page-level signal reported by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityEvent {
    VisibilityHidden,
    VisibilityVisible,
    FullscreenExited,
    FullscreenEntered,
    UnloadAttempt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityWarning {
    pub event: IntegrityEvent,
    pub tab_switch_count: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityResponse {
    /// Nothing to do (not monitoring, or a benign event)
    Ignored,
    /// Non-fatal warning for the candidate
    Warning(IntegrityWarning),
    /// Ask the candidate to confirm leaving the page
    ConfirmUnload,
    AllowUnload,
}

/// Counts tab switches and fullscreen exits while an interview is running
///
/// Warnings never change the session lifecycle. Counters only grow.
#[derive(Clone, Default)]
pub struct IntegrityMonitor {
    tab_switches: Arc<AtomicU32>,
    fullscreen_exits: Arc<AtomicU32>,
    armed: Arc<AtomicBool>,
}

impl IntegrityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting
    pub fn arm(&self) {
        if !self.armed.swap(true, Ordering::SeqCst) {
            info!("Integrity monitoring armed");
        }
    }

    /// Stop counting; counters are kept
    pub fn disarm(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            info!(
                "Integrity monitoring disarmed ({} tab switches)",
                self.tab_switches.load(Ordering::SeqCst)
            );
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    pub fn counters(&self) -> IntegrityCounters {
        IntegrityCounters {
            tab_switch_count: self.tab_switches.load(Ordering::SeqCst),
            fullscreen_exits: self.fullscreen_exits.load(Ordering::SeqCst),
        }
    }

    pub fn observe(&self, event: IntegrityEvent) -> IntegrityResponse {
        match event {
            IntegrityEvent::UnloadAttempt => {
                if self.is_armed() {
                    IntegrityResponse::ConfirmUnload
                } else {
                    IntegrityResponse::AllowUnload
                }
            }
            IntegrityEvent::VisibilityVisible | IntegrityEvent::FullscreenEntered => {
                debug!("Integrity event {:?}", event);
                IntegrityResponse::Ignored
            }
            IntegrityEvent::VisibilityHidden | IntegrityEvent::FullscreenExited => {
                if !self.is_armed() {
                    return IntegrityResponse::Ignored;
                }

                if event == IntegrityEvent::FullscreenExited {
                    self.fullscreen_exits.fetch_add(1, Ordering::SeqCst);
                }
                let count = self.tab_switches.fetch_add(1, Ordering::SeqCst) + 1;

                let message = match event {
                    IntegrityEvent::FullscreenExited => format!(
                        "Fullscreen exited. Please stay in fullscreen during the interview (warning {}).",
                        count
                    ),
                    _ => format!(
                        "Tab switch detected. Please stay on the interview page (warning {}).",
                        count
                    ),
                };
                warn!("Integrity signal {:?} (count {})", event, count);

                IntegrityResponse::Warning(IntegrityWarning {
                    event,
                    tab_switch_count: count,
                    message,
                })
            }
        }
    }
}
