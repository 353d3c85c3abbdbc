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

/// The loudest volume a sound or the master can be set to.
pub const MAX_VOLUME: u8 = 100;

/// The master volume after initialization or a reset.
pub const DEFAULT_MASTER_VOLUME: u8 = 100;

/// Clamps an untrusted volume into the 0-100 range.
pub fn clamp_volume(volume: i32) -> u8 {
    volume.clamp(0, MAX_VOLUME as i32) as u8
}

/// Combines a sound volume and the master volume into a normalized output gain in [0.0, 1.0].
pub fn effective_gain(volume: u8, master_volume: u8) -> f32 {
    let scaled = f32::from(volume) * f32::from(master_volume) / 100.0;
    scaled.clamp(0.0, f32::from(MAX_VOLUME)) / 100.0
}

/// The authoritative record of every sound's requested volume and the master volume.
///
/// Every sound id handed to [`MixState::new`] keeps an entry for the lifetime of the state, so
/// lookups for known sounds never miss. Ids outside that set are ignored by every mutator.
pub struct MixState {
    volumes: HashMap<String, u8>,
    master_volume: u8,
}

impl MixState {
    /// Creates a new mix state with every sound off and the master at full volume.
    pub fn new<'a, I>(ids: I) -> MixState
    where
        I: IntoIterator<Item = &'a str>,
    {
        MixState {
            volumes: ids.into_iter().map(|id| (id.to_string(), 0)).collect(),
            master_volume: DEFAULT_MASTER_VOLUME,
        }
    }

    /// Gets the requested volume of a sound.
    pub fn volume(&self, id: &str) -> Option<u8> {
        self.volumes.get(id).copied()
    }

    /// Gets the master volume.
    pub fn master_volume(&self) -> u8 {
        self.master_volume
    }

    /// Stores a sound's volume and returns the resulting effective gain. Returns None for
    /// unknown sounds.
    pub fn set_volume(&mut self, id: &str, volume: i32) -> Option<f32> {
        let master_volume = self.master_volume;
        self.volumes.get_mut(id).map(|stored| {
            *stored = clamp_volume(volume);
            effective_gain(*stored, master_volume)
        })
    }

    /// Stores the master volume. Gains already applied to the backend are not touched.
    pub fn set_master_volume(&mut self, volume: i32) -> u8 {
        self.master_volume = clamp_volume(volume);
        self.master_volume
    }

    /// Gets the effective gain of a sound at the current master volume.
    pub fn effective_gain(&self, id: &str) -> Option<f32> {
        self.volume(id)
            .map(|volume| effective_gain(volume, self.master_volume))
    }

    /// Turns every sound off and restores the master volume.
    pub fn reset_all(&mut self) {
        self.volumes.values_mut().for_each(|volume| *volume = 0);
        self.master_volume = DEFAULT_MASTER_VOLUME;
    }

    /// Returns a copy of the current per-sound volumes.
    pub fn snapshot(&self) -> BTreeMap<String, u8> {
        self.volumes
            .iter()
            .map(|(id, volume)| (id.clone(), *volume))
            .collect()
    }

    /// Overwrites every sound's volume from the given mapping. Sounds missing from the mapping
    /// are turned off and entries for unknown sounds are ignored.
    pub fn apply_preset(&mut self, sounds: &BTreeMap<String, u8>) {
        for (id, volume) in self.volumes.iter_mut() {
            *volume = sounds.get(id).copied().unwrap_or(0).min(MAX_VOLUME);
        }
    }

    /// Returns true if at least one sound has a nonzero volume.
    pub fn has_active(&self) -> bool {
        self.volumes.values().any(|volume| *volume > 0)
    }
}
