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
use tracing::info;

/// Receives notifications about every visible state change of the mixer. Notifications are
/// fire and forget.
pub trait Display: Send + Sync {
    /// The fader of a sound now shows the given volume.
    fn update_volume_display(&self, sound: &str, volume: u8);

    /// The play button of a sound is now on or off.
    fn update_sound_play_button(&self, sound: &str, on: bool);

    /// The main play button is now on or off.
    fn update_main_play_button(&self, on: bool);

    /// The master fader now shows the given volume.
    fn update_master_volume_display(&self, volume: u8);

    /// Everything goes back to its defaults.
    fn reset_ui(&self);
}

/// A display that reports every change to the log.
pub struct LogDisplay {}

impl Display for LogDisplay {
    fn update_volume_display(&self, sound: &str, volume: u8) {
        info!(sound, volume, "Volume changed.");
    }

    fn update_sound_play_button(&self, sound: &str, on: bool) {
        info!(sound, on, "Sound button changed.");
    }

    fn update_main_play_button(&self, on: bool) {
        info!(on, "Main button changed.");
    }

    fn update_master_volume_display(&self, volume: u8) {
        info!(volume, "Master volume changed.");
    }

    fn reset_ui(&self) {
        info!("Display reset.");
    }
}

#[cfg(test)]
pub mod test {
    use parking_lot::Mutex;

    /// A notification received by the recorder.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Notification {
        Volume(String, u8),
        SoundButton(String, bool),
        MainButton(bool),
        MasterVolume(u8),
        Reset,
    }

    /// Records notifications for later inspection.
    #[derive(Default)]
    pub struct Recorder {
        notifications: Mutex<Vec<Notification>>,
    }

    impl Recorder {
        /// Takes every notification received so far.
        pub fn take(&self) -> Vec<Notification> {
            std::mem::take(&mut *self.notifications.lock())
        }

        /// Returns the last main button state shown, if any.
        pub fn main_button(&self) -> Option<bool> {
            self.notifications
                .lock()
                .iter()
                .rev()
                .find_map(|notification| match notification {
                    Notification::MainButton(on) => Some(*on),
                    _ => None,
                })
        }

        /// Returns the last button state shown for the sound, if any.
        pub fn sound_button(&self, sound: &str) -> Option<bool> {
            self.notifications
                .lock()
                .iter()
                .rev()
                .find_map(|notification| match notification {
                    Notification::SoundButton(id, on) if id == sound => Some(*on),
                    _ => None,
                })
        }

        fn push(&self, notification: Notification) {
            self.notifications.lock().push(notification);
        }
    }

    impl super::Display for Recorder {
        fn update_volume_display(&self, sound: &str, volume: u8) {
            self.push(Notification::Volume(sound.to_string(), volume));
        }

        fn update_sound_play_button(&self, sound: &str, on: bool) {
            self.push(Notification::SoundButton(sound.to_string(), on));
        }

        fn update_main_play_button(&self, on: bool) {
            self.push(Notification::MainButton(on));
        }

        fn update_master_volume_display(&self, volume: u8) {
            self.push(Notification::MasterVolume(volume));
        }

        fn reset_ui(&self) {
            self.push(Notification::Reset);
        }
    }
}
