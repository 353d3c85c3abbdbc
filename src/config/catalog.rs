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
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use config::{Config, File};
use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::{
    presets::Preset,
    tracks::{Sound, Sounds},
};

/// The catalog of sounds and built-in presets.
#[derive(Deserialize)]
pub struct Catalog {
    /// The sounds in display order.
    sounds: Vec<CatalogSound>,
    /// Built-in presets keyed by preset key.
    #[serde(default)]
    presets: BTreeMap<String, CatalogPreset>,
}

#[derive(Deserialize)]
struct CatalogSound {
    id: String,
    name: String,
    /// The audio file, relative to the catalog.
    file: PathBuf,
    icon: Option<String>,
}

/// A preset as written in a catalog.
#[derive(Deserialize, Serialize, Debug, PartialEq)]
pub struct CatalogPreset {
    name: String,
    sounds: BTreeMap<String, u8>,
}

impl Catalog {
    /// Parse a catalog from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Catalog, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Catalog>()?)
    }

    /// Builds the sound registry. Sound files are resolved relative to base_path.
    pub fn to_sounds(&self, base_path: &Path) -> Result<Sounds, ConfigError> {
        let sounds = self
            .sounds
            .iter()
            .map(|sound| {
                Sound::new(
                    &sound.id,
                    &sound.name,
                    &base_path.join(&sound.file),
                    sound.icon.clone(),
                )
            })
            .collect();
        let presets = self
            .presets
            .iter()
            .map(|(key, preset)| {
                (
                    key.clone(),
                    Preset::new(key, &preset.name, preset.sounds.clone()),
                )
            })
            .collect();

        Ok(Sounds::new(sounds, presets)?)
    }
}

/// Writes presets in the catalog's preset format, keyed by preset id, so saved presets can be
/// promoted to built-in ones.
pub fn export_presets<'a, I>(presets: I) -> Result<String, serde_yml::Error>
where
    I: IntoIterator<Item = &'a Preset>,
{
    let presets: BTreeMap<&str, CatalogPreset> = presets
        .into_iter()
        .map(|preset| {
            (
                preset.id(),
                CatalogPreset {
                    name: preset.name().to_string(),
                    sounds: preset.sounds().clone(),
                },
            )
        })
        .collect();
    serde_yml::to_string(&presets)
}
