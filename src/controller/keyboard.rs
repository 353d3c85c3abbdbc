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
use std::io;

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, warn, Level};

use super::{
    command::{self, Command, ParseError, USAGE},
    Event,
};

/// A driver that reads commands from the keyboard.
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Reads and dispatches a single line. Returns false once the input is finished.
    fn monitor_io<R, W>(
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<bool, io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(writer, "Command: ")?;
        writer.flush()?;
        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Ok(false);
        }

        match command::parse(&input) {
            Ok(Command::Event(event)) => events_tx
                .blocking_send(event)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?,
            Ok(Command::Quit) => return Ok(false),
            Err(ParseError::Empty) => {}
            Err(e) => {
                warn!(
                    input = input.trim(),
                    err = e.to_string(),
                    "Unrecognized input"
                );
                writeln!(writer, "{}. Commands: {}", e, USAGE)?;
            }
        }
        Ok(true)
    }
}

impl Default for Driver {
    fn default() -> Self {
        Driver::new()
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");
            println!("Commands: {}", USAGE);

            while Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())? {}

            info!("Keyboard driver finished.");
            Ok(())
        })
    }
}

#[cfg(test)]
mod test {
    use std::io::{self, BufReader, BufWriter};

    use tokio::sync::mpsc;

    use crate::controller::Event;

    use super::Driver;

    fn get_event(input: &str) -> Result<(bool, Option<Event>), io::Error> {
        let (sender, mut receiver) = mpsc::channel::<Event>(1);

        let reader = BufReader::new(input.as_bytes());
        let writer = BufWriter::new(Vec::new());
        let more = Driver::monitor_io(&sender, reader, writer)?;

        // Force the sender to close.
        drop(sender);
        Ok((more, receiver.blocking_recv()))
    }

    #[test]
    fn test_keyboard_events() -> Result<(), io::Error> {
        assert_eq!(
            (true, Some(Event::ToggleSound("rain".into()))),
            get_event("toggle rain\n")?
        );
        assert_eq!(
            (true, Some(Event::SetSoundVolume("fire".into(), 20))),
            get_event("volume fire 20\n")?
        );
        assert_eq!((true, Some(Event::ToggleAll)), get_event("ALL\n")?);
        assert_eq!((true, None), get_event("unrecognized\n")?);
        assert_eq!((true, None), get_event("\n")?);
        assert_eq!((false, None), get_event("quit\n")?);
        assert_eq!((false, None), get_event("")?);
        Ok(())
    }
}
