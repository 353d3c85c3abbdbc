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
use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use parking_lot::Mutex;
use tracing::{info, span, Level};

use crate::{audio::PlaybackError, tracks::Sound};

/// A mock device. Doesn't actually play anything, but tracks play state, gain and position
/// for every track it has loaded.
#[derive(Clone)]
pub struct Device {
    name: String,
    /// How long each play request blocks before resolving.
    play_latency: Duration,
    /// When set, every play request is refused, like an output that hasn't been unlocked yet.
    reject_plays: Arc<AtomicBool>,
    /// The tracks loaded through this device.
    tracks: Arc<Mutex<HashMap<String, Arc<Track>>>>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            play_latency: Duration::ZERO,
            reject_plays: Arc::new(AtomicBool::new(false)),
            tracks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Makes every play request block for the given duration before resolving.
    pub fn with_play_latency(mut self, play_latency: Duration) -> Device {
        self.play_latency = play_latency;
        self
    }

    /// Controls whether play requests are refused.
    pub fn set_reject_plays(&self, reject_plays: bool) {
        self.reject_plays.store(reject_plays, Ordering::Relaxed);
    }

    /// Gets the track loaded for the given sound.
    pub fn track(&self, id: &str) -> Option<Arc<Track>> {
        self.tracks.lock().get(id).cloned()
    }
}

impl crate::audio::Device for Device {
    /// Creates a mock track. Sounds without a file can't be loaded.
    fn load(&self, sound: &Sound) -> Result<Arc<dyn crate::audio::Track>, PlaybackError> {
        if sound.file().as_os_str().is_empty() {
            return Err(PlaybackError::Load {
                sound: sound.id().to_string(),
                reason: "no file given".to_string(),
            });
        }

        let track = Arc::new(Track {
            sound: sound.id().to_string(),
            play_latency: self.play_latency,
            reject_plays: self.reject_plays.clone(),
            state: Mutex::new(TrackState {
                paused: true,
                gain: 1.0,
                position: Duration::ZERO,
                plays: 0,
            }),
        });
        self.tracks
            .lock()
            .insert(sound.id().to_string(), track.clone());
        Ok(track)
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<Device>, Box<dyn std::error::Error>> {
        Ok(Arc::new(self.clone()))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name,)
    }
}

struct TrackState {
    paused: bool,
    gain: f32,
    position: Duration,
    plays: usize,
}

/// A mock track.
pub struct Track {
    sound: String,
    play_latency: Duration,
    reject_plays: Arc<AtomicBool>,
    state: Mutex<TrackState>,
}

impl Track {
    /// Returns how many play requests this track has accepted.
    pub fn plays(&self) -> usize {
        self.state.lock().plays
    }

    /// Returns the current playback position.
    pub fn position(&self) -> Duration {
        self.state.lock().position
    }

    /// Moves the playback position forward, as if the track had been playing.
    pub fn advance(&self, elapsed: Duration) {
        self.state.lock().position += elapsed;
    }
}

impl crate::audio::Track for Track {
    fn play(&self) -> Result<(), PlaybackError> {
        let span = span!(Level::INFO, "play sound (mock)");
        let _enter = span.enter();

        if !self.play_latency.is_zero() {
            thread::sleep(self.play_latency);
        }
        if self.reject_plays.load(Ordering::Relaxed) {
            return Err(PlaybackError::Rejected {
                sound: self.sound.clone(),
                reason: "the output has not been unlocked".to_string(),
            });
        }

        let mut state = self.state.lock();
        state.paused = false;
        state.plays += 1;
        info!(sound = self.sound, gain = state.gain, "Playing sound.");
        Ok(())
    }

    fn pause(&self) {
        self.state.lock().paused = true;
    }

    fn rewind(&self) {
        self.state.lock().position = Duration::ZERO;
    }

    fn set_gain(&self, gain: f32) {
        self.state.lock().gain = gain;
    }

    fn gain(&self) -> f32 {
        self.state.lock().gain
    }

    fn is_paused(&self) -> bool {
        self.state.lock().paused
    }
}
