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
use std::{fs, io, path::PathBuf, time::Duration};

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, warn, Instrument, Level};

use super::{
    command::{self, Command, ParseError},
    Event,
};

/// A driver that replays commands from a file, one per line, waiting between each. Blank lines
/// and lines starting with '#' are skipped. Unless the script ends with quit, the mixer keeps
/// running once the script is done.
pub struct Driver {
    path: PathBuf,
    interval: Duration,
}

impl Driver {
    pub fn new(path: PathBuf, interval: Duration) -> Driver {
        Driver { path, interval }
    }

    /// Parses every command in the script, skipping and logging lines that don't parse.
    /// Anything after quit is ignored.
    fn commands(script: &str) -> Vec<Command> {
        let mut commands = Vec::new();
        for (number, line) in script.lines().enumerate() {
            if line.trim_start().starts_with('#') {
                continue;
            }
            match command::parse(line) {
                Ok(Command::Quit) => {
                    commands.push(Command::Quit);
                    break;
                }
                Ok(command) => commands.push(command),
                Err(ParseError::Empty) => {}
                Err(e) => warn!(
                    line = number + 1,
                    err = e.to_string(),
                    "Skipping script line."
                ),
            }
        }
        commands
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        let path = self.path.clone();
        let interval = self.interval;

        tokio::spawn(
            async move {
                let script = fs::read_to_string(&path)?;
                info!(path = %path.display(), "Script driver started.");

                for command in Driver::commands(&script) {
                    match command {
                        Command::Event(event) => events_tx
                            .send(event)
                            .await
                            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?,
                        Command::Quit => {
                            info!("Script finished.");
                            return Ok(());
                        }
                    }
                    tokio::time::sleep(interval).await;
                }

                info!("Script finished, leaving the mixer running.");
                events_tx.closed().await;
                Ok(())
            }
            .instrument(span!(Level::INFO, "script driver")),
        )
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, io::Write, sync::Arc, time::Duration};

    use tokio::sync::mpsc;

    use crate::controller::{command::Command, Driver as _, Event};

    use super::Driver;

    #[test]
    fn test_commands() {
        let commands = Driver::commands(
            "# evening\n\ntoggle rain\nbogus\nmaster 40\nquit\ntoggle wind\n",
        );
        assert_eq!(
            vec![
                Command::Event(Event::ToggleSound("rain".into())),
                Command::Event(Event::SetMasterVolume(40)),
                Command::Quit,
            ],
            commands
        );
    }

    #[tokio::test]
    async fn test_script_driver() -> Result<(), Box<dyn Error>> {
        let mut script = tempfile::NamedTempFile::new()?;
        writeln!(script, "load rainy\nvolume wind 10\nquit")?;

        let driver = Arc::new(Driver::new(
            script.path().to_path_buf(),
            Duration::from_millis(1),
        ));
        let (events_tx, mut events_rx) = mpsc::channel(1);
        let join = driver.monitor_events(events_tx);

        assert_eq!(
            Some(Event::LoadPreset("rainy".into())),
            events_rx.recv().await
        );
        assert_eq!(
            Some(Event::SetSoundVolume("wind".into(), 10)),
            events_rx.recv().await
        );
        assert_eq!(None, events_rx.recv().await);
        join.await??;
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_script() {
        let driver = Driver::new("does/not/exist.txt".into(), Duration::ZERO);
        let (events_tx, _events_rx) = mpsc::channel(1);
        let result = driver.monitor_events(events_tx).await;
        assert!(matches!(result, Ok(Err(_))));
    }
}
