use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info};

const TICK: Duration = Duration::from_secs(1);

/// One-second countdown that expires exactly once
#[derive(Clone)]
pub struct CountdownTimer {
    remaining_secs: Arc<AtomicU64>,
    started: Arc<AtomicBool>,
    fired: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    /// `None` while running, `Some(true)` once expired, `Some(false)` once stopped
    outcome: Arc<watch::Sender<Option<bool>>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl CountdownTimer {
    pub fn new(duration: Duration) -> Self {
        let (outcome, _) = watch::channel(None);
        Self {
            remaining_secs: Arc::new(AtomicU64::new(duration.as_secs())),
            started: Arc::new(AtomicBool::new(false)),
            fired: Arc::new(AtomicBool::new(false)),
            stopped: Arc::new(AtomicBool::new(false)),
            outcome: Arc::new(outcome),
            ticker: Arc::new(Mutex::new(None)),
        }
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs.load(Ordering::SeqCst)
    }

    pub fn has_expired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Start ticking. Returns false if the timer was already started.
    pub async fn start(&self) -> bool {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("Countdown already started");
            return false;
        }

        info!("Countdown started: {}s", self.remaining_secs());

        let timer = self.clone();
        let task = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + TICK, TICK);
            loop {
                ticks.tick().await;
                if timer.tick() || timer.has_expired() {
                    break;
                }
            }
        });

        *self.ticker.lock().await = Some(task);
        true
    }

    /// Stop ticking without firing
    pub async fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.outcome.send_if_modified(|outcome| {
            if outcome.is_none() {
                *outcome = Some(false);
                true
            } else {
                false
            }
        });

        if let Some(task) = self.ticker.lock().await.take() {
            task.abort();
            debug!("Countdown stopped at {}s", self.remaining_secs());
        }
    }

    /// Advance the countdown by one second
    ///
    /// Returns true only for the tick that expired the timer; ticks after
    /// expiry (including a burst of late ticks) return false.
    pub fn tick(&self) -> bool {
        if self.stopped.load(Ordering::SeqCst) {
            return false;
        }

        let previous = self
            .remaining_secs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |r| {
                Some(r.saturating_sub(1))
            })
            .unwrap_or(0);

        if previous.saturating_sub(1) > 0 {
            return false;
        }

        if self
            .fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            info!("Countdown expired");
            self.outcome.send_replace(Some(true));
            return true;
        }

        false
    }

    /// Resolve once the countdown expires (`true`) or is stopped (`false`)
    pub async fn finished(&self) -> bool {
        let mut rx = self.outcome.subscribe();
        let result = match rx.wait_for(|outcome| outcome.is_some()).await {
            Ok(outcome) => (*outcome).unwrap_or(false),
            Err(_) => false,
        };
        result
    }
}
