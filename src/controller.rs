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
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, Sender, WeakSender};
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, span, Instrument, Level};

use crate::mixer::Mixer;
use crate::util::duration_display;

pub mod command;
pub mod drivers;
pub mod keyboard;
pub mod multi;
pub mod script;

/// Controller events that will trigger behavior in the mixer.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Switches a single sound on or off.
    ToggleSound(String),

    /// Sets the requested volume of a sound.
    SetSoundVolume(String, i32),

    SetMasterVolume(i32),

    /// Pauses everything if anything plays, otherwise starts every sound.
    ToggleAll,

    /// Pauses everything. If nothing plays, does nothing.
    PauseAll,

    /// Stops everything and returns every volume to its default.
    Reset,

    /// Replaces the mix with a built-in or saved preset.
    LoadPreset(String),

    /// Saves the current mix under a name.
    SavePreset(String),

    DeletePreset(String),

    /// Pauses everything once the duration elapses. None cancels a pending timer.
    SleepTimer(Option<Duration>),

    /// Reports the state of every sound.
    Status,
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// Controls a mixer.
pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Creates a new controller with the given driver.
    pub fn new(mixer: Mixer, driver: Arc<dyn Driver>) -> Controller {
        Controller {
            handle: tokio::spawn(
                Controller::trigger_events(mixer, driver)
                    .instrument(span!(Level::INFO, "controller")),
            ),
        }
    }

    /// Join will block until the controller finishes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    /// Triggers mixer events by watching the driver and getting events from it. Runs until every
    /// sender the driver holds is gone.
    async fn trigger_events(mut mixer: Mixer, driver: Arc<dyn Driver>) {
        let (events_tx, mut events_rx) = mpsc::channel(1);
        let timer_tx = events_tx.downgrade();
        let join_handle = driver.monitor_events(events_tx);
        let mut sleep_timer: Option<JoinHandle<()>> = None;

        info!(sounds = mixer.sounds().len(), "Controller started.");

        while let Some(event) = events_rx.recv().await {
            info!(event = format!("{:?}", event), "Received event.");

            let result = match event {
                Event::ToggleSound(id) => mixer.toggle_sound(&id).await,
                Event::SetSoundVolume(id, volume) => {
                    mixer.set_sound_volume(&id, volume);
                    Ok(())
                }
                Event::SetMasterVolume(volume) => {
                    mixer.set_master_volume(volume);
                    Ok(())
                }
                Event::ToggleAll => mixer.toggle_all_sounds().await,
                Event::PauseAll => {
                    mixer.pause_all();
                    Ok(())
                }
                Event::Reset => {
                    mixer.reset_all();
                    Ok(())
                }
                Event::LoadPreset(key) => mixer.load_preset(&key).await,
                Event::SavePreset(name) => mixer.save_current_preset(&name).map(|id| {
                    info!(id, name, "Preset saved.");
                }),
                Event::DeletePreset(id) => mixer.delete_preset(&id).map(|_| ()),
                Event::SleepTimer(duration) => {
                    if let Some(timer) = sleep_timer.take() {
                        timer.abort();
                    }
                    sleep_timer = duration.map(|duration| start_sleep_timer(&timer_tx, duration));
                    Ok(())
                }
                Event::Status => {
                    report_status(&mixer);
                    Ok(())
                }
            };

            if let Err(e) = result {
                error!(err = e.to_string(), "Error talking to mixer.");
            }
        }

        info!("Controller closing.");
        if let Some(timer) = sleep_timer.take() {
            timer.abort();
        }
        match join_handle.await {
            Ok(Err(e)) => error!(err = e.to_string(), "Driver failed."),
            Err(e) => error!("Error waiting for event monitor to stop: {}", e),
            Ok(Ok(())) => {}
        }
    }
}

/// Sends a pause once the duration elapses. The timer doesn't keep the event channel open.
fn start_sleep_timer(timer_tx: &WeakSender<Event>, duration: Duration) -> JoinHandle<()> {
    info!(
        duration = duration_display(duration),
        "Sleep timer started."
    );

    let timer_tx = timer_tx.clone();
    tokio::spawn(
        async move {
            tokio::time::sleep(duration).await;
            if let Some(events_tx) = timer_tx.upgrade() {
                info!("Sleep timer elapsed.");
                let _ = events_tx.send(Event::PauseAll).await;
            }
        }
        .in_current_span(),
    )
}

fn report_status(mixer: &Mixer) {
    for status in mixer.status() {
        info!(
            sound = status.id,
            name = status.name,
            volume = status.volume,
            fader = status.fader,
            playing = status.playing,
            gain = status.effective_gain,
            "Sound status."
        );
    }
    info!(
        master_volume = mixer.master_volume(),
        playing = mixer.is_playing(),
        presets = mixer.presets().len(),
        "Mixer status."
    );
}
