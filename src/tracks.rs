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
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::presets::Preset;

/// Errors that can occur while building or querying the sound registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("sound ids must not be empty")]
    EmptyId,

    #[error("duplicate sound id {0}")]
    DuplicateSound(String),

    #[error("unable to find sound {0}")]
    UnknownSound(String),
}

/// A single looping ambient track in the catalog.
pub struct Sound {
    /// The stable identifier of the sound.
    id: String,
    /// The display name of the sound.
    name: String,
    /// The audio file backing the sound.
    file: PathBuf,
    /// An optional icon hint for displays.
    icon: Option<String>,
}

impl Sound {
    /// Creates a new sound.
    pub fn new(id: &str, name: &str, file: &Path, icon: Option<String>) -> Sound {
        Sound {
            id: id.to_string(),
            name: name.to_string(),
            file: file.to_path_buf(),
            icon,
        }
    }

    /// Gets the id of the sound.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Gets the display name of the sound.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the file backing the sound.
    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }
}

impl fmt::Display for Sound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) [{}]",
            self.name,
            self.id,
            crate::util::filename_display(&self.file)
        )
    }
}

/// The static catalog of sounds and the built-in presets shipped with it.
pub struct Sounds {
    /// The sounds in catalog order.
    sounds: Vec<Arc<Sound>>,
    /// Maps a sound id to its position in the catalog.
    index: HashMap<String, usize>,
    /// The built-in presets, keyed by their preset key.
    default_presets: BTreeMap<String, Preset>,
}

impl Sounds {
    /// Creates a new sound registry. Sound ids must be unique and non-empty.
    pub fn new(
        sounds: Vec<Sound>,
        default_presets: BTreeMap<String, Preset>,
    ) -> Result<Sounds, RegistryError> {
        let mut index = HashMap::with_capacity(sounds.len());
        for (position, sound) in sounds.iter().enumerate() {
            if sound.id.trim().is_empty() {
                return Err(RegistryError::EmptyId);
            }
            if index.insert(sound.id.clone(), position).is_some() {
                return Err(RegistryError::DuplicateSound(sound.id.clone()));
            }
        }

        Ok(Sounds {
            sounds: sounds.into_iter().map(Arc::new).collect(),
            index,
            default_presets,
        })
    }

    /// Returns true if the registry has no sounds.
    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    /// Returns the number of sounds in the registry.
    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    /// Gets a sound from the registry.
    pub fn get(&self, id: &str) -> Result<Arc<Sound>, RegistryError> {
        match self.index.get(id) {
            Some(position) => Ok(Arc::clone(&self.sounds[*position])),
            None => Err(RegistryError::UnknownSound(id.to_string())),
        }
    }

    /// Returns true if the registry knows the given sound id.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Returns the sounds in catalog order.
    pub fn list(&self) -> &[Arc<Sound>] {
        &self.sounds
    }

    /// Returns the sound ids in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sounds.iter().map(|sound| sound.id())
    }

    /// Gets a built-in preset by its key.
    pub fn default_preset(&self, key: &str) -> Option<&Preset> {
        self.default_presets.get(key)
    }

    /// Returns the built-in presets ordered by key.
    pub fn default_presets(&self) -> impl Iterator<Item = (&String, &Preset)> {
        self.default_presets.iter()
    }
}
