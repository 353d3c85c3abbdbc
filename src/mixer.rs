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
use std::{collections::HashMap, sync::Arc};

use tracing::{error, info, span, warn, Level, Span};

use crate::{
    audio::{self, Backend, PlaybackError},
    presets::{Preset, PresetError, PresetStore},
    state::{self, MixState},
    tracks::Sounds,
};

pub mod display;

use display::Display;

/// The fader volume substituted when a sound is switched on with its fader at zero.
pub const DEFAULT_TOGGLE_VOLUME: u8 = 50;

/// The output gain applied when a single sound is switched on.
pub const INITIAL_TOGGLE_GAIN: f32 = 0.5;

/// Errors reported by mixer operations. None of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum MixerError {
    #[error("preset {0} not found")]
    PresetNotFound(String),

    #[error("no active sounds in the mix")]
    EmptyMix,

    #[error("playback rejected for {}", .sounds.join(", "))]
    PlaybackRejected { sounds: Vec<String> },

    #[error(transparent)]
    Preset(#[from] PresetError),
}

/// A point in time view of one sound.
#[derive(Clone, Debug, PartialEq)]
pub struct SoundStatus {
    pub id: String,
    pub name: String,
    /// The requested volume held in the mix state.
    pub volume: u8,
    /// The volume shown on the sound's fader.
    pub fader: u8,
    pub playing: bool,
    /// The gain derived from the requested and master volumes.
    pub effective_gain: f32,
}

/// The mixing engine. Owns the mix state, the playback backend and the preset store, and
/// keeps the display in step with them.
pub struct Mixer {
    sounds: Arc<Sounds>,
    backend: Backend,
    state: MixState,
    /// What each sound's fader shows. Switching a sound off zeroes its requested volume but
    /// leaves the fader alone.
    faders: HashMap<String, u8>,
    presets: PresetStore,
    display: Arc<dyn Display>,
    /// The aggregate play state as last shown on the main button.
    is_playing: bool,
    span: Span,
}

impl Mixer {
    /// Creates a new mixer, loading a track for every sound in the catalog. Sounds that fail to
    /// load stay in the mix state but every playback operation on them is a no-op.
    pub fn new(
        sounds: Arc<Sounds>,
        device: Arc<dyn audio::Device>,
        presets: PresetStore,
        display: Arc<dyn Display>,
    ) -> Mixer {
        let span = span!(Level::INFO, "mixer");
        let mut backend = Backend::new();
        {
            let _enter = span.enter();
            for sound in sounds.list() {
                if !backend.load(device.as_ref(), sound) {
                    warn!(sound = sound.id(), "Sound is unavailable.");
                }
            }
            info!(
                sounds = sounds.len(),
                presets = presets.len(),
                device = device.to_string(),
                "Mixer ready."
            );
        }

        Mixer {
            state: MixState::new(sounds.ids()),
            faders: sounds.ids().map(|id| (id.to_string(), 0)).collect(),
            sounds,
            backend,
            presets,
            display,
            is_playing: false,
            span,
        }
    }

    /// Switches a single sound on or off. Switching on uses the fader volume, or
    /// [`DEFAULT_TOGGLE_VOLUME`] if the fader is at zero, and only counts once the backend has
    /// confirmed playback. Switching off zeroes the requested volume.
    pub async fn toggle_sound(&mut self, id: &str) -> Result<(), MixerError> {
        if !self.is_available(id) {
            return Ok(());
        }

        let result = if self.backend.is_playing(id) {
            self.backend.pause(id);
            self.state.set_volume(id, 0);
            self.display.update_sound_play_button(id, false);
            Ok(())
        } else {
            let mut volume = self.fader(id);
            if volume == 0 {
                volume = DEFAULT_TOGGLE_VOLUME;
                self.faders.insert(id.to_string(), volume);
                self.display.update_volume_display(id, volume);
            }
            self.state.set_volume(id, i32::from(volume));
            self.backend.set_gain(id, INITIAL_TOGGLE_GAIN);

            let outcome = self.backend.play(id).await;
            self.confirm_plays(vec![(id.to_string(), outcome)])
        };

        self.update_main_play_button_state();
        result
    }

    /// Sets the requested volume of a sound and applies the derived gain. The play state is left
    /// alone, even at volume zero.
    pub fn set_sound_volume(&mut self, id: &str, volume: i32) {
        if !self.is_available(id) {
            return;
        }

        let volume = state::clamp_volume(volume);
        self.faders.insert(id.to_string(), volume);
        if let Some(gain) = self.state.set_volume(id, i32::from(volume)) {
            self.backend.set_gain(id, gain);
        }
        self.display.update_volume_display(id, volume);
        self.update_main_play_button_state();
    }

    /// Sets the master volume and re-applies the derived gain to every playing sound.
    pub fn set_master_volume(&mut self, volume: i32) {
        let master_volume = self.state.set_master_volume(volume);
        self.display.update_master_volume_display(master_volume);

        for id in self.backend.ids() {
            if !self.backend.is_playing(id) {
                continue;
            }
            if let Some(gain) = self.state.effective_gain(id) {
                self.backend.set_gain(id, gain);
            }
        }
    }

    /// Pauses everything if anything plays, leaving requested volumes untouched. Otherwise
    /// starts every sound, substituting [`DEFAULT_TOGGLE_VOLUME`] for faders at zero.
    pub async fn toggle_all_sounds(&mut self) -> Result<(), MixerError> {
        if self.backend.any_playing() {
            self.pause_all();
            return Ok(());
        }

        let ids: Vec<String> = self.backend.ids().map(|id| id.to_string()).collect();
        for id in ids.iter() {
            let mut volume = self.fader(id);
            if volume == 0 {
                volume = DEFAULT_TOGGLE_VOLUME;
                self.faders.insert(id.clone(), volume);
                self.display.update_volume_display(id, volume);
            }
            if let Some(gain) = self.state.set_volume(id, i32::from(volume)) {
                self.backend.set_gain(id, gain);
            }
        }

        let outcomes = self.backend.play_all().await;
        let result = self.confirm_plays(outcomes);
        self.update_main_play_button_state();
        result
    }

    /// Pauses every sound without touching requested volumes. A no-op if nothing plays.
    pub fn pause_all(&mut self) {
        if !self.backend.any_playing() {
            return;
        }

        self.backend.pause_all();
        for id in self.sounds.ids() {
            self.display.update_sound_play_button(id, false);
        }
        self.update_main_play_button_state();
    }

    /// Stops everything, rewinds every sound and returns every volume to its default.
    pub fn reset_all(&mut self) {
        self.backend.stop_all();
        self.state.reset_all();
        for fader in self.faders.values_mut() {
            *fader = 0;
        }
        self.is_playing = false;
        self.display.reset_ui();

        let _enter = self.span.enter();
        info!("Mixer reset.");
    }

    /// Replaces the whole mix with a preset. Built-in presets are looked up first, then saved
    /// presets by id.
    pub async fn load_preset(&mut self, key: &str) -> Result<(), MixerError> {
        let preset = self
            .find_preset(key)
            .ok_or_else(|| MixerError::PresetNotFound(key.to_string()))?;

        self.backend.stop_all();
        self.state.apply_preset(preset.sounds());
        for id in self.sounds.ids() {
            if !self.backend.contains(id) {
                self.state.set_volume(id, 0);
            }
            let volume = self.state.volume(id).unwrap_or(0);
            self.faders.insert(id.to_string(), volume);
            self.display.update_volume_display(id, volume);
            self.display.update_sound_play_button(id, false);
        }

        let mut pending = Vec::new();
        for id in self.backend.ids() {
            if self.state.volume(id).unwrap_or(0) == 0 {
                continue;
            }
            if let Some(gain) = self.state.effective_gain(id) {
                self.backend.set_gain(id, gain);
            }
            pending.push((id.to_string(), self.backend.play(id)));
        }

        let (ids, plays): (Vec<String>, Vec<_>) = pending.into_iter().unzip();
        let outcomes = futures_util::future::join_all(plays).await;
        let result = self.confirm_plays(ids.into_iter().zip(outcomes).collect());
        self.update_main_play_button_state();

        let _enter = self.span.enter();
        info!(preset = key, name = preset.name(), "Loaded preset.");
        result
    }

    /// Saves the current requested volumes as a new preset and returns its id.
    pub fn save_current_preset(&mut self, name: &str) -> Result<String, MixerError> {
        if !self.state.has_active() {
            return Err(MixerError::EmptyMix);
        }

        let id = self.presets.save(name, &self.state.snapshot())?;
        let _enter = self.span.enter();
        info!(preset = id, name = name.trim(), "Saved preset.");
        Ok(id)
    }

    /// Deletes a saved preset. Built-in presets can't be deleted.
    pub fn delete_preset(&mut self, id: &str) -> Result<Preset, MixerError> {
        let preset = self
            .presets
            .delete(id)?
            .ok_or_else(|| MixerError::PresetNotFound(id.to_string()))?;

        let _enter = self.span.enter();
        info!(preset = id, name = preset.name(), "Deleted preset.");
        Ok(preset)
    }

    /// Returns the status of every sound in catalog order.
    pub fn status(&self) -> Vec<SoundStatus> {
        self.sounds
            .list()
            .iter()
            .map(|sound| SoundStatus {
                id: sound.id().to_string(),
                name: sound.name().to_string(),
                volume: self.state.volume(sound.id()).unwrap_or(0),
                fader: self.fader(sound.id()),
                playing: self.backend.is_playing(sound.id()),
                effective_gain: self.state.effective_gain(sound.id()).unwrap_or(0.0),
            })
            .collect()
    }

    pub fn master_volume(&self) -> u8 {
        self.state.master_volume()
    }

    /// Returns true if any sound is playing.
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn sounds(&self) -> &Sounds {
        &self.sounds
    }

    pub fn presets(&self) -> &PresetStore {
        &self.presets
    }

    /// Returns true if the sound was loaded. Unknown and unloadable sounds are logged.
    fn is_available(&self, id: &str) -> bool {
        if self.backend.contains(id) {
            return true;
        }

        let _enter = self.span.enter();
        if self.sounds.contains(id) {
            warn!(sound = id, "Sound is unavailable.");
        } else {
            warn!(sound = id, "Sound not found.");
        }
        false
    }

    fn fader(&self, id: &str) -> u8 {
        self.faders.get(id).copied().unwrap_or(0)
    }

    fn find_preset(&self, key: &str) -> Option<Preset> {
        self.sounds
            .default_preset(key)
            .or_else(|| self.presets.get(key))
            .cloned()
    }

    /// Marks every confirmed sound as on. Sounds whose play failed, or didn't leave them
    /// playing, go back to off with a requested volume of zero.
    fn confirm_plays(
        &mut self,
        outcomes: Vec<(String, Result<(), PlaybackError>)>,
    ) -> Result<(), MixerError> {
        let _enter = self.span.enter();

        let mut rejected = Vec::new();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) if self.backend.is_playing(&id) => {
                    self.display.update_sound_play_button(&id, true);
                }
                Ok(()) => {
                    warn!(sound = id, "Sound is not playing after play.");
                    self.state.set_volume(&id, 0);
                    self.display.update_sound_play_button(&id, false);
                    rejected.push(id);
                }
                Err(e) => {
                    error!(err = e.to_string(), sound = id, "Unable to play sound.");
                    self.state.set_volume(&id, 0);
                    self.display.update_sound_play_button(&id, false);
                    rejected.push(id);
                }
            }
        }

        if rejected.is_empty() {
            Ok(())
        } else {
            Err(MixerError::PlaybackRejected { sounds: rejected })
        }
    }

    fn update_main_play_button_state(&mut self) {
        self.is_playing = self.backend.any_playing();
        self.display.update_main_play_button(self.is_playing);
    }
}

#[cfg(test)]
mod test {
    use std::{collections::BTreeMap, error::Error, path::Path, sync::Arc, time::Duration};

    use crate::{
        audio::{mock, Track},
        presets::{Preset, PresetError, PresetStore},
        tracks::{Sound, Sounds},
    };

    use super::{
        display::test::{Notification, Recorder},
        Mixer, MixerError, DEFAULT_TOGGLE_VOLUME, INITIAL_TOGGLE_GAIN,
    };

    fn sound(id: &str) -> Sound {
        Sound::new(
            id,
            &id.to_uppercase(),
            Path::new(&format!("{}.ogg", id)),
            None,
        )
    }

    fn mixer() -> Result<(Mixer, mock::Device, Arc<Recorder>), Box<dyn Error>> {
        let mut default_presets = BTreeMap::new();
        default_presets.insert(
            "rainy".to_string(),
            Preset::new(
                "rainy",
                "Rainy Day",
                BTreeMap::from([("rain".to_string(), 30), ("wind".to_string(), 0)]),
            ),
        );
        let sounds = Arc::new(Sounds::new(
            vec![sound("rain"), sound("wind"), sound("fire")],
            default_presets,
        )?);

        let device = mock::Device::get("mock-output");
        let recorder = Arc::new(Recorder::default());
        let mixer = Mixer::new(
            sounds,
            Arc::new(device.clone()),
            PresetStore::in_memory(),
            recorder.clone(),
        );
        Ok((mixer, device, recorder))
    }

    fn track(device: &mock::Device, id: &str) -> Arc<mock::Track> {
        device.track(id).expect("track should be loaded")
    }

    fn volume(mixer: &Mixer, id: &str) -> u8 {
        mixer
            .status()
            .into_iter()
            .find(|status| status.id == id)
            .map(|status| status.volume)
            .expect("sound should exist")
    }

    fn fader(mixer: &Mixer, id: &str) -> u8 {
        mixer
            .status()
            .into_iter()
            .find(|status| status.id == id)
            .map(|status| status.fader)
            .expect("sound should exist")
    }

    #[tokio::test]
    async fn test_unloadable_sound_stays_off() -> Result<(), Box<dyn Error>> {
        let mut default_presets = BTreeMap::new();
        default_presets.insert(
            "storm".to_string(),
            Preset::new(
                "storm",
                "Storm",
                BTreeMap::from([("rain".to_string(), 40), ("thunder".to_string(), 30)]),
            ),
        );
        let sounds = Arc::new(Sounds::new(
            vec![
                sound("rain"),
                Sound::new("thunder", "Thunder", Path::new(""), None),
            ],
            default_presets,
        )?);
        let device = mock::Device::get("mock-output");
        let mut mixer = Mixer::new(
            sounds,
            Arc::new(device.clone()),
            PresetStore::in_memory(),
            Arc::new(Recorder::default()),
        );
        assert!(device.track("thunder").is_none());

        mixer.toggle_sound("thunder").await?;
        assert_eq!(0, volume(&mixer, "thunder"));

        mixer.set_sound_volume("thunder", 40);
        assert_eq!(0, volume(&mixer, "thunder"));
        assert_eq!(0, fader(&mixer, "thunder"));
        assert!(matches!(
            mixer.save_current_preset("Only thunder"),
            Err(MixerError::EmptyMix)
        ));

        mixer.load_preset("storm").await?;
        assert_eq!(40, volume(&mixer, "rain"));
        assert!(!track(&device, "rain").is_paused());
        assert_eq!(0, volume(&mixer, "thunder"));
        assert_eq!(0, fader(&mixer, "thunder"));
        assert!(mixer
            .status()
            .iter()
            .all(|status| status.playing == (status.volume > 0)));

        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_sound_defaults_to_half_volume() -> Result<(), Box<dyn Error>> {
        let (mut mixer, device, recorder) = mixer()?;

        mixer.toggle_sound("rain").await?;
        let rain = track(&device, "rain");
        assert!(!rain.is_paused());
        assert_eq!(INITIAL_TOGGLE_GAIN, rain.gain());
        assert_eq!(DEFAULT_TOGGLE_VOLUME, volume(&mixer, "rain"));
        assert!(mixer.is_playing());

        let notifications = recorder.take();
        assert_eq!(
            vec![
                Notification::Volume("rain".into(), 50),
                Notification::SoundButton("rain".into(), true),
                Notification::MainButton(true),
            ],
            notifications
        );

        // Off zeroes the requested volume, but the fader stays.
        mixer.toggle_sound("rain").await?;
        assert!(rain.is_paused());
        assert_eq!(0, volume(&mixer, "rain"));
        assert_eq!(50, fader(&mixer, "rain"));
        assert!(!mixer.is_playing());
        assert_eq!(Some(false), recorder.main_button());

        // And on again restarts from the fader.
        mixer.toggle_sound("rain").await?;
        assert!(!rain.is_paused());
        assert_eq!(50, volume(&mixer, "rain"));
        assert_eq!(2, rain.plays());
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_sound_uses_fader_volume() -> Result<(), Box<dyn Error>> {
        let (mut mixer, device, recorder) = mixer()?;

        mixer.set_sound_volume("wind", 80);
        assert!(track(&device, "wind").is_paused());
        recorder.take();

        mixer.toggle_sound("wind").await?;
        assert_eq!(80, volume(&mixer, "wind"));
        assert!(!recorder
            .take()
            .iter()
            .any(|notification| matches!(notification, Notification::Volume(_, _))));

        mixer.toggle_sound("wind").await?;
        mixer.toggle_sound("wind").await?;
        assert_eq!(80, volume(&mixer, "wind"));
        assert!(!track(&device, "wind").is_paused());
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_unknown_sound() -> Result<(), Box<dyn Error>> {
        let (mut mixer, _, recorder) = mixer()?;

        mixer.toggle_sound("thunder").await?;
        mixer.set_sound_volume("thunder", 40);
        assert!(recorder.take().is_empty());
        assert!(!mixer.is_playing());
        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_play_leaves_sound_off() -> Result<(), Box<dyn Error>> {
        let (mut mixer, device, recorder) = mixer()?;
        device.set_reject_plays(true);

        match mixer.toggle_sound("fire").await {
            Err(MixerError::PlaybackRejected { sounds }) => assert_eq!(vec!["fire"], sounds),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(track(&device, "fire").is_paused());
        assert_eq!(0, volume(&mixer, "fire"));
        assert_eq!(50, fader(&mixer, "fire"));
        assert_eq!(Some(false), recorder.sound_button("fire"));
        assert_eq!(Some(false), recorder.main_button());

        device.set_reject_plays(false);
        mixer.toggle_sound("fire").await?;
        assert_eq!(50, volume(&mixer, "fire"));
        assert_eq!(Some(true), recorder.sound_button("fire"));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_sound_volume_keeps_play_state() -> Result<(), Box<dyn Error>> {
        let (mut mixer, device, _) = mixer()?;
        mixer.toggle_sound("rain").await?;

        mixer.set_sound_volume("rain", 70);
        let rain = track(&device, "rain");
        assert!((rain.gain() - 0.7).abs() < 1e-6);

        mixer.set_sound_volume("rain", 0);
        assert_eq!(0.0, rain.gain());
        assert!(!rain.is_paused());
        assert!(mixer.is_playing());

        mixer.set_sound_volume("rain", 250);
        assert_eq!(100, volume(&mixer, "rain"));
        assert_eq!(1.0, rain.gain());
        Ok(())
    }

    #[tokio::test]
    async fn test_master_volume_applies_to_playing_sounds() -> Result<(), Box<dyn Error>> {
        let (mut mixer, device, recorder) = mixer()?;
        mixer.set_sound_volume("rain", 80);
        mixer.set_sound_volume("wind", 40);
        mixer.toggle_sound("rain").await?;

        mixer.set_master_volume(50);
        assert_eq!(50, mixer.master_volume());
        assert!((track(&device, "rain").gain() - 0.4).abs() < 1e-6);
        // Paused sounds keep their old gain.
        assert!((track(&device, "wind").gain() - 0.4).abs() < 1e-6);
        assert!(recorder.take().contains(&Notification::MasterVolume(50)));

        mixer.set_master_volume(-20);
        assert_eq!(0, mixer.master_volume());
        assert_eq!(0.0, track(&device, "rain").gain());
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_all_sounds() -> Result<(), Box<dyn Error>> {
        let (mut mixer, device, recorder) = mixer()?;
        mixer.set_sound_volume("wind", 20);
        mixer.set_master_volume(50);

        mixer.toggle_all_sounds().await?;
        for id in ["rain", "wind", "fire"] {
            assert!(!track(&device, id).is_paused(), "{} should play", id);
            assert_eq!(1, track(&device, id).plays());
            assert_eq!(Some(true), recorder.sound_button(id));
        }
        assert_eq!(50, volume(&mixer, "rain"));
        assert_eq!(20, volume(&mixer, "wind"));
        assert!((track(&device, "rain").gain() - 0.25).abs() < 1e-6);
        assert!((track(&device, "wind").gain() - 0.1).abs() < 1e-6);
        assert_eq!(Some(true), recorder.main_button());

        // Master pause leaves the requested volumes alone.
        mixer.toggle_all_sounds().await?;
        for id in ["rain", "wind", "fire"] {
            assert!(track(&device, id).is_paused(), "{} should be paused", id);
            assert_eq!(Some(false), recorder.sound_button(id));
        }
        assert_eq!(50, volume(&mixer, "rain"));
        assert_eq!(20, volume(&mixer, "wind"));
        assert_eq!(Some(false), recorder.main_button());
        assert!(!mixer.is_playing());
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_all_pauses_partial_mix() -> Result<(), Box<dyn Error>> {
        let (mut mixer, device, _) = mixer()?;
        mixer.toggle_sound("fire").await?;

        mixer.toggle_all_sounds().await?;
        assert!(track(&device, "fire").is_paused());
        assert_eq!(0, track(&device, "rain").plays());
        assert_eq!(50, volume(&mixer, "fire"));
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_all() -> Result<(), Box<dyn Error>> {
        let (mut mixer, device, recorder) = mixer()?;
        mixer.set_master_volume(30);
        mixer.toggle_all_sounds().await?;
        track(&device, "rain").advance(Duration::from_secs(12));

        mixer.reset_all();
        assert_eq!(100, mixer.master_volume());
        for status in mixer.status() {
            assert_eq!(0, status.volume);
            assert_eq!(0, status.fader);
            assert!(!status.playing);
            assert_eq!(Duration::ZERO, track(&device, &status.id).position());
        }
        assert!(!mixer.is_playing());
        assert_eq!(Some(&Notification::Reset), recorder.take().last());
        Ok(())
    }

    #[tokio::test]
    async fn test_load_default_preset() -> Result<(), Box<dyn Error>> {
        let (mut mixer, device, recorder) = mixer()?;
        mixer.set_sound_volume("fire", 90);
        mixer.toggle_sound("fire").await?;
        track(&device, "fire").advance(Duration::from_secs(3));

        mixer.load_preset("rainy").await?;
        assert!(!track(&device, "rain").is_paused());
        assert_eq!(30, volume(&mixer, "rain"));
        assert!((track(&device, "rain").gain() - 0.3).abs() < 1e-6);
        for id in ["wind", "fire"] {
            assert!(track(&device, id).is_paused(), "{} should be paused", id);
            assert_eq!(0, volume(&mixer, id));
            assert_eq!(0, fader(&mixer, id));
        }
        assert_eq!(Duration::ZERO, track(&device, "fire").position());
        assert_eq!(Some(true), recorder.main_button());
        assert_eq!(Some(true), recorder.sound_button("rain"));
        assert_eq!(Some(false), recorder.sound_button("fire"));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_missing_preset() -> Result<(), Box<dyn Error>> {
        let (mut mixer, device, _) = mixer()?;
        mixer.toggle_sound("wind").await?;

        assert!(matches!(
            mixer.load_preset("stormy").await,
            Err(MixerError::PresetNotFound(key)) if key == "stormy"
        ));
        assert!(!track(&device, "wind").is_paused());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_and_load_preset() -> Result<(), Box<dyn Error>> {
        let (mut mixer, device, _) = mixer()?;
        assert!(matches!(
            mixer.save_current_preset("Nothing"),
            Err(MixerError::EmptyMix)
        ));

        mixer.set_sound_volume("wind", 60);
        mixer.set_sound_volume("fire", 25);
        let id = mixer.save_current_preset("  Campfire ")?;

        // Changes after the save don't leak into the preset.
        mixer.set_sound_volume("wind", 10);
        let preset = mixer
            .presets()
            .get(&id)
            .expect("preset should exist")
            .clone();
        assert_eq!("Campfire", preset.name());
        assert_eq!(60, preset.volume("wind"));
        assert_eq!(25, preset.volume("fire"));
        assert_eq!(0, preset.volume("rain"));

        mixer.load_preset(&id).await?;
        assert_eq!(60, volume(&mixer, "wind"));
        assert_eq!(25, volume(&mixer, "fire"));
        assert!(!track(&device, "wind").is_paused());
        assert!(track(&device, "rain").is_paused());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_duplicate_name() -> Result<(), Box<dyn Error>> {
        let (mut mixer, _, _) = mixer()?;
        mixer.set_sound_volume("rain", 40);

        mixer.save_current_preset("Evening")?;
        assert!(matches!(
            mixer.save_current_preset(" Evening "),
            Err(MixerError::Preset(PresetError::DuplicateName(name))) if name == "Evening"
        ));
        mixer.save_current_preset("evening")?;
        assert!(matches!(
            mixer.save_current_preset("   "),
            Err(MixerError::Preset(PresetError::InvalidName))
        ));
        assert_eq!(2, mixer.presets().len());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_preset() -> Result<(), Box<dyn Error>> {
        let (mut mixer, _, _) = mixer()?;
        mixer.set_sound_volume("rain", 40);
        let id = mixer.save_current_preset("Drizzle")?;

        assert_eq!("Drizzle", mixer.delete_preset(&id)?.name());
        assert!(matches!(
            mixer.delete_preset(&id),
            Err(MixerError::PresetNotFound(_))
        ));
        assert!(matches!(
            mixer.delete_preset("rainy"),
            Err(MixerError::PresetNotFound(_))
        ));
        assert!(mixer.presets().is_empty());
        Ok(())
    }
}
