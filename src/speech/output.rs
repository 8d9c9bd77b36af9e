use super::backend::SpeechSynthesizer;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One "speak this text" request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechQueueItem {
    pub id: Uuid,
    pub text: String,
    /// Voice/style hint passed through to the synthesizer
    pub audio_hint: Option<String>,
}

/// Single-consumer FIFO of interviewer speech
///
/// Items are spoken strictly in enqueue order by one drain task. Each item
/// is tried on the primary synthesizer, then the secondary one; when neither
/// is available the item is "spoken" by waiting a fixed simulated duration.
/// A failed item never stalls the items behind it.
#[derive(Clone)]
pub struct SpeechOutputQueue {
    tx: mpsc::UnboundedSender<SpeechQueueItem>,

    /// True while an item is being spoken
    speaking: Arc<AtomicBool>,

    /// Items queued or playing
    pending: Arc<watch::Sender<usize>>,

    closed: Arc<AtomicBool>,

    drain_task: Arc<JoinHandle<()>>,
}

impl SpeechOutputQueue {
    /// Create the queue and spawn its drain loop on the current runtime
    pub fn new(
        primary: Option<Arc<dyn SpeechSynthesizer>>,
        secondary: Option<Arc<dyn SpeechSynthesizer>>,
        simulated_duration: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let speaking = Arc::new(AtomicBool::new(false));
        let (pending_tx, _) = watch::channel(0usize);
        let pending = Arc::new(pending_tx);

        info!(
            "Speech output queue ready (primary={}, secondary={})",
            primary.as_ref().map_or("none", |s| s.name()),
            secondary.as_ref().map_or("none", |s| s.name())
        );

        let drain_task = tokio::spawn(Self::drain(
            rx,
            primary,
            secondary,
            simulated_duration,
            Arc::clone(&speaking),
            Arc::clone(&pending),
        ));

        Self {
            tx,
            speaking,
            pending,
            closed: Arc::new(AtomicBool::new(false)),
            drain_task: Arc::new(drain_task),
        }
    }

    /// Append text to the queue. Never interrupts the item currently playing.
    pub fn enqueue(&self, text: impl Into<String>) -> Uuid {
        self.enqueue_with_hint(text, None)
    }

    pub fn enqueue_with_hint(&self, text: impl Into<String>, audio_hint: Option<String>) -> Uuid {
        let item = SpeechQueueItem {
            id: Uuid::new_v4(),
            text: text.into(),
            audio_hint,
        };
        let id = item.id;

        if self.closed.load(Ordering::SeqCst) {
            warn!("Speech queue is shut down, dropping item {}", id);
            return id;
        }

        // Count before sending so the drain loop can never decrement first
        self.pending.send_modify(|n| *n += 1);
        if self.tx.send(item).is_err() {
            warn!("Speech queue is shut down, dropping item {}", id);
            self.pending.send_modify(|n| *n = n.saturating_sub(1));
        } else {
            debug!("Enqueued speech item {}", id);
        }

        id
    }

    /// Whether an item is being spoken right now
    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    /// Whether anything is queued or playing
    pub fn is_busy(&self) -> bool {
        *self.pending.borrow() > 0
    }

    pub fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    /// Resolve once every queued item has been spoken
    pub async fn wait_idle(&self) {
        let mut rx = self.pending.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    /// Stop the drain loop and drop anything not yet spoken
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Shutting down speech output queue");
        self.drain_task.abort();
        self.speaking.store(false, Ordering::SeqCst);
        self.pending.send_replace(0);
    }

    async fn drain(
        mut rx: mpsc::UnboundedReceiver<SpeechQueueItem>,
        primary: Option<Arc<dyn SpeechSynthesizer>>,
        secondary: Option<Arc<dyn SpeechSynthesizer>>,
        simulated_duration: Duration,
        speaking: Arc<AtomicBool>,
        pending: Arc<watch::Sender<usize>>,
    ) {
        while let Some(item) = rx.recv().await {
            speaking.store(true, Ordering::SeqCst);
            Self::play(&item, [&primary, &secondary], simulated_duration).await;
            speaking.store(false, Ordering::SeqCst);
            pending.send_modify(|n| *n = n.saturating_sub(1));
        }

        debug!("Speech drain loop stopped");
    }

    async fn play(
        item: &SpeechQueueItem,
        synthesizers: [&Option<Arc<dyn SpeechSynthesizer>>; 2],
        simulated_duration: Duration,
    ) {
        let mut attempted = false;

        for synth in synthesizers.into_iter().flatten() {
            if !synth.is_available() {
                continue;
            }
            attempted = true;

            match synth.speak(&item.text, item.audio_hint.as_deref()).await {
                Ok(()) => {
                    debug!("{} spoke item {}", synth.name(), item.id);
                    return;
                }
                Err(e) => {
                    warn!("{} failed on item {}: {}", synth.name(), item.id, e);
                }
            }
        }

        if attempted {
            warn!("All synthesizers failed for item {}, skipping", item.id);
        } else {
            debug!(
                "No synthesizer available, simulating {}ms of speech",
                simulated_duration.as_millis()
            );
            tokio::time::sleep(simulated_duration).await;
        }
    }
}
