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
    error::Error,
    path::{Path, PathBuf},
    time::Duration,
};

use duration_string::DurationString;
use serde::Deserialize;

const DEFAULT_SCRIPT_INTERVAL: Duration = Duration::from_secs(1);

/// Allows users to specify various controllers.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Controller {
    #[default]
    Keyboard,
    Script(ScriptController),
    Multi(HashMap<String, Controller>),
}

/// Replays commands from a file.
#[derive(Deserialize, Clone, Debug)]
pub struct ScriptController {
    /// The script, relative to the config file.
    path: PathBuf,
    /// How long to wait between commands, e.g. "500ms" or "2m".
    interval: Option<String>,
}

impl ScriptController {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the interval between commands.
    pub fn interval(&self) -> Result<Duration, Box<dyn Error>> {
        match &self.interval {
            Some(interval) => Ok(DurationString::from_string(interval.clone())?.into()),
            None => Ok(DEFAULT_SCRIPT_INTERVAL),
        }
    }
}
