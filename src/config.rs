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
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::{
    controller::{drivers, Controller},
    mixer::{display::Display, Mixer},
    presets::PresetStore,
    tracks::Sounds,
};

pub mod audio;
pub mod catalog;
pub mod controller;
mod error;
pub mod mixer;

pub use audio::Audio;
pub use error::ConfigError;

/// Parses a sound catalog from a YAML file. Sound files are relative to the catalog.
pub fn parse_catalog(path: &Path) -> Result<Arc<Sounds>, Box<dyn Error>> {
    let sounds = catalog::Catalog::deserialize(path)?.to_sounds(base_path(path))?;
    Ok(Arc::new(sounds))
}

/// Opens the preset store named by the mixer configuration, or an in-memory one if there is
/// none.
pub fn open_presets(
    config: &mixer::Mixer,
    config_path: &Path,
) -> Result<PresetStore, Box<dyn Error>> {
    Ok(match config.presets() {
        Some(presets) => PresetStore::open(&base_path(config_path).join(presets))?,
        None => PresetStore::in_memory(),
    })
}

/// Builds the mixer described by the given config file.
pub fn init_mixer(path: &Path, display: Arc<dyn Display>) -> Result<Mixer, Box<dyn Error>> {
    let config = mixer::Mixer::deserialize(path)?;
    init_mixer_from_config(&config, path, display)
}

fn init_mixer_from_config(
    config: &mixer::Mixer,
    path: &Path,
    display: Arc<dyn Display>,
) -> Result<Mixer, Box<dyn Error>> {
    let sounds = parse_catalog(&base_path(path).join(config.catalog()))?;
    let presets = open_presets(config, path)?;
    let device = crate::audio::get_device(config.audio())?;

    info!(
        config = %path.display(),
        sounds = sounds.len(),
        presets = presets.len(),
        "Loaded configuration."
    );
    Ok(Mixer::new(sounds, device, presets, display))
}

/// Initializes the mixer and controller from the given config file and returns the controller.
/// The controller owns the mixer and can be waited on until its input is finished.
pub fn init_mixer_and_controller(
    path: &Path,
    display: Arc<dyn Display>,
) -> Result<Controller, Box<dyn Error>> {
    let config = mixer::Mixer::deserialize(path)?;
    let mixer = init_mixer_from_config(&config, path, display)?;
    let driver = drivers::driver(config.controller(), base_path(path))?;
    Ok(Controller::new(mixer, driver))
}

/// Relative paths in a config file are resolved against its directory.
fn base_path(path: &Path) -> &Path {
    path.parent().unwrap_or(Path::new("."))
}
