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
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{info, span, Level, Span};

use crate::state::MAX_VOLUME;

/// Errors produced by the preset store.
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("a preset named {0} already exists")]
    DuplicateName(String),

    #[error("preset names must not be empty")]
    InvalidName,

    #[error("unable to persist presets: {0}")]
    Persist(#[from] io::Error),

    #[error("malformed preset file: {0}")]
    Format(#[from] serde_json::Error),
}

/// A named, immutable snapshot of per-sound volumes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preset {
    /// The built-in key or generated id of the preset.
    id: String,
    /// The display name of the preset.
    name: String,
    /// The nonzero volumes of the preset. Sounds missing here are off.
    sounds: BTreeMap<String, u8>,
}

impl Preset {
    /// Creates a new preset. Volumes are clamped and silent entries are dropped.
    pub fn new(id: &str, name: &str, sounds: BTreeMap<String, u8>) -> Preset {
        Preset {
            id: id.to_string(),
            name: name.to_string(),
            sounds: sounds
                .into_iter()
                .filter(|(_, volume)| *volume > 0)
                .map(|(id, volume)| (id, volume.min(MAX_VOLUME)))
                .collect(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the nonzero volumes of the preset.
    pub fn sounds(&self) -> &BTreeMap<String, u8> {
        &self.sounds
    }

    /// Gets the volume of a sound in the preset, 0 if the preset doesn't mention it.
    pub fn volume(&self, id: &str) -> u8 {
        self.sounds.get(id).copied().unwrap_or(0)
    }
}

/// The on-disk representation of a user preset. Records are keyed by preset id.
#[derive(Deserialize, Serialize)]
struct Record {
    name: String,
    sounds: BTreeMap<String, u8>,
}

/// Stores user presets, optionally persisting them to a JSON file.
pub struct PresetStore {
    /// The user presets, keyed by generated id.
    presets: BTreeMap<String, Preset>,
    /// Where to persist the presets. None keeps them for the process lifetime only.
    path: Option<PathBuf>,
    /// The logging span.
    span: Span,
}

impl PresetStore {
    /// Creates an empty store that is never persisted.
    pub fn in_memory() -> PresetStore {
        PresetStore {
            presets: BTreeMap::new(),
            path: None,
            span: span!(Level::INFO, "presets"),
        }
    }

    /// Opens a durable store. A missing file is treated as an empty store.
    pub fn open(path: &Path) -> Result<PresetStore, PresetError> {
        let mut store = PresetStore::in_memory();
        store.path = Some(path.to_path_buf());

        if !path.exists() {
            return Ok(store);
        }

        let records: BTreeMap<String, Record> = serde_json::from_str(&fs::read_to_string(path)?)?;
        store.presets = records
            .into_iter()
            .map(|(id, record)| {
                let preset = Preset::new(&id, &record.name, record.sounds);
                (id, preset)
            })
            .collect();

        {
            let _enter = store.span.enter();
            info!(
                path = path.display().to_string(),
                count = store.presets.len(),
                "Loaded presets."
            );
        }
        Ok(store)
    }

    /// Returns true if a user preset has exactly the given name.
    pub fn exists(&self, name: &str) -> bool {
        self.presets.values().any(|preset| preset.name == name)
    }

    /// Saves a copy of the given volumes under a new name and returns the generated id.
    pub fn save(
        &mut self,
        name: &str,
        sounds: &BTreeMap<String, u8>,
    ) -> Result<String, PresetError> {
        let _enter = self.span.enter();

        let name = name.trim();
        if name.is_empty() {
            return Err(PresetError::InvalidName);
        }
        if self.exists(name) {
            return Err(PresetError::DuplicateName(name.to_string()));
        }

        let id = self.generate_id();
        self.presets
            .insert(id.clone(), Preset::new(&id, name, sounds.clone()));
        if let Err(e) = self.persist() {
            self.presets.remove(&id);
            return Err(e);
        }

        info!(id, name, "Saved preset.");
        Ok(id)
    }

    /// Gets a user preset by id.
    pub fn get(&self, id: &str) -> Option<&Preset> {
        self.presets.get(id)
    }

    /// Deletes a user preset, returning it if it existed.
    pub fn delete(&mut self, id: &str) -> Result<Option<Preset>, PresetError> {
        let _enter = self.span.enter();

        let removed = match self.presets.remove(id) {
            Some(removed) => removed,
            None => return Ok(None),
        };
        if let Err(e) = self.persist() {
            self.presets.insert(id.to_string(), removed);
            return Err(e);
        }

        info!(id, name = removed.name, "Deleted preset.");
        Ok(Some(removed))
    }

    /// Lists the user presets ordered by id.
    pub fn list(&self) -> impl Iterator<Item = &Preset> {
        self.presets.values()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Generates a timestamp derived id that isn't used by any stored preset.
    fn generate_id(&self) -> String {
        let mut millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        loop {
            let id = format!("custom-{}", millis);
            if !self.presets.contains_key(&id) {
                return id;
            }
            millis += 1;
        }
    }

    /// Rewrites the whole store file. The file is replaced atomically.
    fn persist(&self) -> Result<(), PresetError> {
        let path = match &self.path {
            Some(path) => path,
            None => return Ok(()),
        };

        let records: BTreeMap<&String, Record> = self
            .presets
            .iter()
            .map(|(id, preset)| {
                (
                    id,
                    Record {
                        name: preset.name.clone(),
                        sounds: preset.sounds.clone(),
                    },
                )
            })
            .collect();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let staging = path.with_extension("tmp");
        fs::write(&staging, serde_json::to_string_pretty(&records)?)?;
        fs::rename(&staging, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;
    use std::error::Error;

    use super::{PresetError, PresetStore};

    fn mix(entries: &[(&str, u8)]) -> BTreeMap<String, u8> {
        entries
            .iter()
            .map(|(id, volume)| (id.to_string(), *volume))
            .collect()
    }

    #[test]
    fn test_save_and_get() -> Result<(), Box<dyn Error>> {
        let mut store = PresetStore::in_memory();
        let id = store.save("  Evening  ", &mix(&[("rain", 30), ("wind", 0)]))?;

        let preset = store.get(&id).expect("expected preset");
        assert_eq!("Evening", preset.name());
        assert_eq!(&mix(&[("rain", 30)]), preset.sounds());
        assert!(store.exists("Evening"));
        assert!(!store.exists("evening"));
        Ok(())
    }

    #[test]
    fn test_duplicate_and_invalid_names() -> Result<(), Box<dyn Error>> {
        let mut store = PresetStore::in_memory();
        store.save("Storm", &mix(&[("rain", 80)]))?;

        assert!(matches!(
            store.save(" Storm ", &mix(&[("wind", 10)])),
            Err(PresetError::DuplicateName(name)) if name == "Storm"
        ));
        assert!(matches!(
            store.save("   ", &mix(&[("wind", 10)])),
            Err(PresetError::InvalidName)
        ));

        // Names are case sensitive.
        store.save("storm", &mix(&[("wind", 10)]))?;
        assert_eq!(2, store.len());
        Ok(())
    }

    #[test]
    fn test_saved_snapshot_is_copied() -> Result<(), Box<dyn Error>> {
        let mut store = PresetStore::in_memory();
        let mut sounds = mix(&[("rain", 30)]);
        let id = store.save("Copy", &sounds)?;

        sounds.insert("rain".to_string(), 90);
        assert_eq!(30, store.get(&id).expect("expected preset").volume("rain"));
        Ok(())
    }

    #[test]
    fn test_ids_are_unique() -> Result<(), Box<dyn Error>> {
        let mut store = PresetStore::in_memory();
        let first = store.save("One", &mix(&[("rain", 10)]))?;
        let second = store.save("Two", &mix(&[("rain", 20)]))?;

        assert_ne!(first, second);
        assert!(first.starts_with("custom-"));
        Ok(())
    }

    #[test]
    fn test_durable_store() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("presets.json");

        let (kept, deleted) = {
            let mut store = PresetStore::open(&path)?;
            assert!(store.is_empty());
            let kept = store.save("Cabin", &mix(&[("fire", 60), ("wind", 20)]))?;
            let deleted = store.save("Cafe", &mix(&[("cafe", 40)]))?;
            assert!(store.delete(&deleted)?.is_some());
            assert!(store.delete(&deleted)?.is_none());
            (kept, deleted)
        };

        let store = PresetStore::open(&path)?;
        assert_eq!(1, store.len());
        let cabin = store.get(&kept).expect("expected preset");
        assert_eq!("Cabin", cabin.name());
        assert_eq!(60, cabin.volume("fire"));
        assert_eq!(20, cabin.volume("wind"));
        assert!(store.get(&deleted).is_none());
        Ok(())
    }

    #[test]
    fn test_malformed_store() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("presets.json");
        std::fs::write(&path, "not json")?;

        assert!(matches!(
            PresetStore::open(&path),
            Err(PresetError::Format(_))
        ));
        Ok(())
    }
}
