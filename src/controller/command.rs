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
use std::time::Duration;

use duration_string::DurationString;

use super::Event;

const TOGGLE: &str = "toggle";
const VOLUME: &str = "volume";
const MASTER: &str = "master";
const ALL: &str = "all";
const PAUSE: &str = "pause";
const RESET: &str = "reset";
const LOAD: &str = "load";
const SAVE: &str = "save";
const DELETE_PRESET: &str = "delete_preset";
const TIMER: &str = "timer";
const STATUS: &str = "status";
const QUIT: &str = "quit";

/// The one line summary of every command.
pub const USAGE: &str = "toggle <sound>, volume <sound> <0-100>, master <0-100>, all, pause, \
reset, load <preset>, save <name>, delete_preset <id>, timer <duration|off>, status, quit";

/// A parsed line of input.
#[derive(Debug, PartialEq)]
pub enum Command {
    Event(Event),
    /// The input source is done.
    Quit,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unrecognized command '{0}'")]
    Unknown(String),

    #[error("{0} requires {1}")]
    MissingArgument(&'static str, &'static str),

    #[error("'{0}' is not a volume")]
    InvalidVolume(String),

    #[error("'{0}' is not a duration")]
    InvalidDuration(String),
}

/// Parses a single line of input. Commands are case insensitive, arguments are not.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    let mut args = rest.split_whitespace();

    let event = match command.to_lowercase().as_str() {
        "" => return Err(ParseError::Empty),
        TOGGLE => Event::ToggleSound(required(args.next(), TOGGLE, "a sound")?.to_string()),
        VOLUME => {
            let sound = required(args.next(), VOLUME, "a sound")?;
            let volume = volume(required(args.next(), VOLUME, "a volume")?)?;
            Event::SetSoundVolume(sound.to_string(), volume)
        }
        MASTER => Event::SetMasterVolume(volume(required(args.next(), MASTER, "a volume")?)?),
        ALL => Event::ToggleAll,
        PAUSE => Event::PauseAll,
        RESET => Event::Reset,
        LOAD => Event::LoadPreset(required(args.next(), LOAD, "a preset")?.to_string()),
        SAVE => {
            // Names may contain spaces.
            let name = required(Some(rest).filter(|rest| !rest.is_empty()), SAVE, "a name")?;
            Event::SavePreset(name.to_string())
        }
        DELETE_PRESET => {
            let id = required(args.next(), DELETE_PRESET, "a preset id")?;
            Event::DeletePreset(id.to_string())
        }
        TIMER => {
            let duration = required(args.next(), TIMER, "a duration or off")?;
            if duration.eq_ignore_ascii_case("off") {
                Event::SleepTimer(None)
            } else {
                let parsed: Duration = DurationString::from_string(duration.to_string())
                    .map_err(|_| ParseError::InvalidDuration(duration.to_string()))?
                    .into();
                Event::SleepTimer(Some(parsed))
            }
        }
        STATUS => Event::Status,
        QUIT => return Ok(Command::Quit),
        _ => return Err(ParseError::Unknown(command.to_string())),
    };
    Ok(Command::Event(event))
}

fn required<'a>(
    arg: Option<&'a str>,
    command: &'static str,
    what: &'static str,
) -> Result<&'a str, ParseError> {
    arg.ok_or(ParseError::MissingArgument(command, what))
}

/// Volumes are passed through as given, the mixer clamps them.
fn volume(arg: &str) -> Result<i32, ParseError> {
    arg.parse::<i32>()
        .map_err(|_| ParseError::InvalidVolume(arg.to_string()))
}
