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
use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::Deserialize;

use super::{audio::Audio, controller::Controller, error::ConfigError};

/// The top level mixer configuration.
#[derive(Deserialize)]
pub struct Mixer {
    /// The output device. Defaults to the host's default output.
    audio: Option<Audio>,
    /// The sound catalog, relative to this file.
    catalog: PathBuf,
    /// Where saved presets live, relative to this file. Without it presets only last until exit.
    presets: Option<PathBuf>,
    /// How commands reach the mixer. Defaults to the keyboard.
    #[serde(default)]
    controller: Controller,
}

impl Mixer {
    /// Parse a mixer configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Mixer, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Mixer>()?)
    }

    pub fn audio(&self) -> Option<&Audio> {
        self.audio.as_ref()
    }

    pub fn catalog(&self) -> &Path {
        &self.catalog
    }

    pub fn presets(&self) -> Option<&Path> {
        self.presets.as_deref()
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, fs, path::Path};

    use crate::config::controller::Controller;

    use super::Mixer;

    #[test]
    fn test_mixer() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("mixer.yaml");
        fs::write(
            &path,
            "audio:\n  device: mock-output\n  channels: 2\ncatalog: sounds.yaml\npresets: presets.json\n",
        )?;

        let mixer = Mixer::deserialize(&path)?;
        assert_eq!(
            Some("mock-output"),
            mixer.audio().map(|audio| audio.device())
        );
        assert_eq!(Some(2), mixer.audio().and_then(|audio| audio.channels()));
        assert_eq!(Path::new("sounds.yaml"), mixer.catalog());
        assert_eq!(Some(Path::new("presets.json")), mixer.presets());
        assert!(matches!(mixer.controller(), Controller::Keyboard));
        Ok(())
    }
}
