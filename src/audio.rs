// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::any::Any;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{error, info, span, warn, Level, Span};

use crate::config;
use crate::tracks::Sound;

pub mod cpal;
pub mod decode;
pub mod mixer;
pub mod mock;

/// Errors reported by playback devices and the backend.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("unable to load sound {sound}: {reason}")]
    Load { sound: String, reason: String },

    #[error("playback of {sound} was rejected: {reason}")]
    Rejected { sound: String, reason: String },

    #[error("unknown sound {0}")]
    UnknownSound(String),

    #[error("playback of {0} was superseded by a later pause")]
    Superseded(String),
}

/// A looping, playable resource for a single sound. Handles start out paused.
pub trait Track: Send + Sync {
    /// Starts or resumes playback. This may block while the output device decides whether to
    /// honor the request.
    fn play(&self) -> Result<(), PlaybackError>;

    /// Pauses playback, keeping the current position. A no-op if already paused.
    fn pause(&self);

    /// Moves the playback position back to the start.
    fn rewind(&self);

    /// Sets the output gain, 0.0 to 1.0.
    fn set_gain(&self, gain: f32);

    fn gain(&self) -> f32;

    fn is_paused(&self) -> bool;
}

/// An output device that can create playable tracks.
pub trait Device: Any + fmt::Display + Send + Sync {
    /// Creates a paused, looping track for the given sound.
    fn load(&self, sound: &Sound) -> Result<Arc<dyn Track>, PlaybackError>;

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<mock::Device>, Box<dyn Error>>;
}

/// Lists the output devices known to cpal.
pub fn list_devices() -> Result<Vec<cpal::DeviceInfo>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Gets the device described by the configuration. No configuration selects the default
/// output device.
pub fn get_device(config: Option<&config::Audio>) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    let config = match config {
        Some(config) => config.clone(),
        None => config::Audio::new(cpal::DEFAULT_DEVICE),
    };

    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(device)));
    };

    Ok(Arc::new(cpal::Device::get(&config)?))
}

/// The backend's bookkeeping for a single loaded track.
struct Slot {
    /// The track itself.
    track: Arc<dyn Track>,
    /// True if the most recent request for this sound was a play. Set before any suspension
    /// point so a later pause always wins over a pending play.
    wants_play: Arc<AtomicBool>,
    /// Serializes play requests for this sound.
    lane: Arc<tokio::sync::Mutex<()>>,
}

/// Owns one track per loaded sound and exposes playback primitives keyed by sound id.
///
/// Every per-sound operation on an id that was never loaded is a silent no-op.
pub struct Backend {
    slots: HashMap<String, Slot>,
    /// Load order, used for the *_all operations.
    order: Vec<String>,
    span: Span,
}

impl Default for Backend {
    fn default() -> Self {
        Backend::new()
    }
}

impl Backend {
    /// Creates an empty backend.
    pub fn new() -> Backend {
        Backend {
            slots: HashMap::new(),
            order: Vec::new(),
            span: span!(Level::INFO, "backend"),
        }
    }

    /// Loads a track for the sound. Returns false if the device couldn't create one, in which
    /// case nothing is registered for the sound.
    pub fn load(&mut self, device: &dyn Device, sound: &Sound) -> bool {
        let _enter = self.span.enter();

        match device.load(sound) {
            Ok(track) => {
                info!(
                    sound = sound.id(),
                    device = device.to_string(),
                    "Loaded sound."
                );
                if self
                    .slots
                    .insert(
                        sound.id().to_string(),
                        Slot {
                            track,
                            wants_play: Arc::new(AtomicBool::new(false)),
                            lane: Arc::new(tokio::sync::Mutex::new(())),
                        },
                    )
                    .is_none()
                {
                    self.order.push(sound.id().to_string());
                }
                true
            }
            Err(e) => {
                error!(
                    err = e.to_string(),
                    sound = sound.id(),
                    "Unable to load sound."
                );
                false
            }
        }
    }

    /// Returns true if a track is loaded for the sound.
    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    /// Returns the loaded sound ids in load order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|id| id.as_str())
    }

    /// Requests playback of a sound. The request is recorded immediately; the returned future
    /// resolves once the device has accepted or refused it. If a pause for the same sound is
    /// issued while the play is pending, the track ends up paused and the play reports
    /// [`PlaybackError::Superseded`].
    pub fn play(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<(), PlaybackError>> + Send + 'static {
        let slot = self.slots.get(id).map(|slot| {
            slot.wants_play.store(true, Ordering::SeqCst);
            (
                slot.track.clone(),
                slot.wants_play.clone(),
                slot.lane.clone(),
            )
        });
        let id = id.to_string();

        async move {
            let (track, wants_play, lane) =
                slot.ok_or_else(|| PlaybackError::UnknownSound(id.clone()))?;
            let _lane = lane.lock().await;

            if !wants_play.load(Ordering::SeqCst) {
                return Err(PlaybackError::Superseded(id));
            }
            if !track.is_paused() {
                return Ok(());
            }

            let result = {
                let track = track.clone();
                tokio::task::spawn_blocking(move || track.play())
                    .await
                    .map_err(|e| PlaybackError::Rejected {
                        sound: id.clone(),
                        reason: e.to_string(),
                    })?
            };
            if let Err(e) = result {
                warn!(err = e.to_string(), sound = id, "Playback rejected.");
                return Err(e);
            }

            if !wants_play.load(Ordering::SeqCst) {
                track.pause();
                return Err(PlaybackError::Superseded(id));
            }
            Ok(())
        }
    }

    /// Pauses a sound, keeping its position. Also cancels any pending play for it.
    pub fn pause(&self, id: &str) {
        if let Some(slot) = self.slots.get(id) {
            slot.wants_play.store(false, Ordering::SeqCst);
            slot.track.pause();
        }
    }

    /// Sets the output gain of a sound. Returns false for unknown sounds.
    pub fn set_gain(&self, id: &str, gain: f32) -> bool {
        match self.slots.get(id) {
            Some(slot) => {
                slot.track.set_gain(gain.clamp(0.0, 1.0));
                true
            }
            None => false,
        }
    }

    /// Gets the output gain of a sound.
    pub fn gain(&self, id: &str) -> Option<f32> {
        self.slots.get(id).map(|slot| slot.track.gain())
    }

    /// Returns true if the sound is loaded and not paused.
    pub fn is_playing(&self, id: &str) -> bool {
        self.slots
            .get(id)
            .is_some_and(|slot| !slot.track.is_paused())
    }

    /// Returns true if any loaded sound is playing.
    pub fn any_playing(&self) -> bool {
        self.ids().any(|id| self.is_playing(id))
    }

    /// Plays every loaded sound that isn't already playing and reports the outcome per sound.
    pub async fn play_all(&self) -> Vec<(String, Result<(), PlaybackError>)> {
        let ids: Vec<String> = self
            .ids()
            .filter(|id| !self.is_playing(id))
            .map(|id| id.to_string())
            .collect();
        let results = join_all(ids.iter().map(|id| self.play(id))).await;
        ids.into_iter().zip(results).collect()
    }

    /// Pauses every loaded sound.
    pub fn pause_all(&self) {
        for id in self.order.iter() {
            self.pause(id);
        }
    }

    /// Pauses every loaded sound and moves it back to the start.
    pub fn stop_all(&self) {
        let _enter = self.span.enter();

        for id in self.order.iter() {
            self.pause(id);
            if let Some(slot) = self.slots.get(id) {
                slot.track.rewind();
            }
        }
        info!(sounds = self.order.len(), "Stopped all sounds.");
    }
}
