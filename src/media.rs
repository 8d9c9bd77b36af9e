//! Camera and microphone ownership
//!
//! `MediaController` owns the session's media tracks from acquisition until
//! they are released exactly once. Mute/unmute toggles the audio tracks in
//! place; without a microphone the mute controls report themselves disabled.

use anyhow::{bail, Result};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

/// A live capture track
pub trait MediaTrack: Send + Sync {
    fn kind(&self) -> TrackKind;

    fn set_enabled(&self, enabled: bool);

    /// Stop the track. May fail if the platform already stopped it.
    fn stop(&self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
}

/// Camera/microphone acquisition capability
#[async_trait::async_trait]
pub trait MediaDevices: Send + Sync {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<Vec<Box<dyn MediaTrack>>>;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("no microphone available")]
    MicrophoneUnavailable,

    #[error("media already released")]
    Released,
}

/// What acquisition produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAvailability {
    pub camera: bool,
    pub microphone: bool,
}

#[derive(Clone)]
pub struct MediaController {
    devices: Arc<dyn MediaDevices>,
    tracks: Arc<Mutex<Vec<Box<dyn MediaTrack>>>>,
    muted: Arc<AtomicBool>,
    microphone: Arc<AtomicBool>,
    camera: Arc<AtomicBool>,
    released: Arc<AtomicBool>,
}

impl MediaController {
    pub fn new(devices: Arc<dyn MediaDevices>) -> Self {
        Self {
            devices,
            tracks: Arc::new(Mutex::new(Vec::new())),
            muted: Arc::new(AtomicBool::new(false)),
            microphone: Arc::new(AtomicBool::new(false)),
            camera: Arc::new(AtomicBool::new(false)),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Acquire camera and microphone, degrading to audio-only, then to nothing
    ///
    /// Never fails: missing devices only disable the controls that need them.
    pub async fn acquire(&self) -> MediaAvailability {
        if self.released.load(Ordering::SeqCst) {
            warn!("Media already released, not acquiring again");
            return self.availability();
        }

        let mut tracks = self.tracks.lock().await;
        if !tracks.is_empty() {
            return self.availability();
        }

        let attempts = [
            MediaConstraints {
                video: true,
                audio: true,
            },
            MediaConstraints {
                video: false,
                audio: true,
            },
        ];

        for constraints in attempts {
            match self.devices.acquire(constraints).await {
                Ok(acquired) => {
                    *tracks = acquired;
                    break;
                }
                Err(e) => warn!(
                    "{} could not acquire {:?}: {}",
                    self.devices.name(),
                    constraints,
                    e
                ),
            }
        }

        let microphone = tracks.iter().any(|t| t.kind() == TrackKind::Audio);
        let camera = tracks.iter().any(|t| t.kind() == TrackKind::Video);
        self.microphone.store(microphone, Ordering::SeqCst);
        self.camera.store(camera, Ordering::SeqCst);

        info!(
            "Media acquired via {} (camera={}, microphone={})",
            self.devices.name(),
            camera,
            microphone
        );

        self.availability()
    }

    pub fn availability(&self) -> MediaAvailability {
        MediaAvailability {
            camera: self.camera.load(Ordering::SeqCst),
            microphone: self.microphone.load(Ordering::SeqCst),
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    /// Mute controls are usable only with a live microphone
    pub fn mute_controls_enabled(&self) -> bool {
        self.microphone.load(Ordering::SeqCst) && !self.released.load(Ordering::SeqCst)
    }

    pub async fn set_muted(&self, muted: bool) -> Result<(), MediaError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(MediaError::Released);
        }
        if !self.microphone.load(Ordering::SeqCst) {
            return Err(MediaError::MicrophoneUnavailable);
        }

        let tracks = self.tracks.lock().await;
        for track in tracks.iter().filter(|t| t.kind() == TrackKind::Audio) {
            track.set_enabled(!muted);
        }
        self.muted.store(muted, Ordering::SeqCst);

        info!("Microphone {}", if muted { "muted" } else { "unmuted" });
        Ok(())
    }

    /// Stop every track. Safe to call any number of times.
    pub async fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }

        let tracks = std::mem::take(&mut *self.tracks.lock().await);
        for track in &tracks {
            if let Err(e) = track.stop() {
                warn!("Ignoring {:?} track stop failure: {}", track.kind(), e);
            }
        }

        self.microphone.store(false, Ordering::SeqCst);
        self.camera.store(false, Ordering::SeqCst);
        info!("Released {} media tracks", tracks.len());
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

/// Track with no hardware behind it
pub struct VirtualTrack {
    kind: TrackKind,
    enabled: AtomicBool,
    stopped: AtomicBool,
}

impl VirtualTrack {
    pub fn new(kind: TrackKind) -> Self {
        Self {
            kind,
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

impl MediaTrack for VirtualTrack {
    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn stop(&self) -> Result<()> {
        if self.stopped.swap(true, Ordering::SeqCst) {
            bail!("track already stopped");
        }
        Ok(())
    }
}

/// Devices for headless/console sessions: a virtual microphone, no camera
pub struct HeadlessMediaDevices;

#[async_trait::async_trait]
impl MediaDevices for HeadlessMediaDevices {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<Vec<Box<dyn MediaTrack>>> {
        if constraints.video {
            bail!("no camera on a headless host");
        }
        Ok(vec![Box::new(VirtualTrack::new(TrackKind::Audio))])
    }

    fn name(&self) -> &str {
        "headless"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoDevices;

    #[async_trait::async_trait]
    impl MediaDevices for NoDevices {
        async fn acquire(&self, _: MediaConstraints) -> Result<Vec<Box<dyn MediaTrack>>> {
            bail!("permission denied")
        }

        fn name(&self) -> &str {
            "none"
        }
    }

    #[tokio::test]
    async fn headless_devices_fall_back_to_audio_only() {
        let media = MediaController::new(Arc::new(HeadlessMediaDevices));
        let availability = media.acquire().await;

        assert!(availability.microphone);
        assert!(!availability.camera);
        assert!(media.mute_controls_enabled());
    }

    #[tokio::test]
    async fn mute_is_refused_without_a_microphone() {
        let media = MediaController::new(Arc::new(NoDevices));
        let availability = media.acquire().await;

        assert_eq!(availability, MediaAvailability::default());
        assert!(!media.mute_controls_enabled());
        assert_eq!(
            media.set_muted(true).await,
            Err(MediaError::MicrophoneUnavailable)
        );
        assert!(!media.is_muted());
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let media = MediaController::new(Arc::new(HeadlessMediaDevices));
        media.acquire().await;
        media.set_muted(true).await.unwrap();
        assert!(media.is_muted());

        media.release().await;
        media.release().await;

        assert!(media.is_released());
        assert_eq!(media.set_muted(false).await, Err(MediaError::Released));
    }
}
