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
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use tracing::{error, info, span, Level};

use crate::{
    audio::{
        decode,
        mixer::{LoopMixer, Voice},
        Device as AudioDevice, PlaybackError, Track,
    },
    config,
    tracks::Sound,
};

/// The device name that selects the host's default output device.
pub const DEFAULT_DEVICE: &str = "default";

/// Frames mixed per block handed to the output stream.
const BLOCK_FRAMES: usize = 512;

/// Number of mixed blocks that may be queued ahead of the output stream.
const QUEUED_BLOCKS: usize = 4;

/// A summary of an output device, used for listing.
pub struct DeviceInfo {
    pub name: String,
    pub host: String,
    pub max_channels: u16,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name, self.max_channels, self.host
        )
    }
}

/// An output device backed by a continuously running cpal stream. Every loaded sound becomes
/// a voice in a shared loop mixer that feeds the stream.
pub struct Device {
    name: String,
    host_id: cpal::HostId,
    output: OutputManager,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}, Rate={}) ({})",
            self.name,
            self.output.mixer.num_channels(),
            self.output.mixer.sample_rate(),
            self.host_id.name()
        )
    }
}

/// Owns the mixing and output threads.
struct OutputManager {
    mixer: LoopMixer,
    /// Cleared by the stream's error callback.
    healthy: Arc<AtomicBool>,
    /// Dropping this stops the output thread, which in turn stops the producer.
    shutdown_tx: Option<Sender<()>>,
    output_thread: Option<thread::JoinHandle<()>>,
    producer_thread: Option<thread::JoinHandle<()>>,
}

impl OutputManager {
    /// Starts the producer and output threads and waits until the stream is playing.
    fn start(
        device: cpal::Device,
        stream_config: cpal::StreamConfig,
        sample_format: cpal::SampleFormat,
    ) -> Result<OutputManager, Box<dyn Error>> {
        let mixer = LoopMixer::new(stream_config.channels, stream_config.sample_rate.0);
        let healthy = Arc::new(AtomicBool::new(true));
        let (blocks_tx, blocks_rx) = crossbeam_channel::bounded::<Vec<f32>>(QUEUED_BLOCKS);
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), String>>(1);

        // Producer thread: mixes blocks until the stream hangs up.
        let producer_mixer = mixer.clone();
        let producer_thread = thread::spawn(move || {
            let block_samples = BLOCK_FRAMES * usize::from(producer_mixer.num_channels());
            loop {
                let mut block = vec![0.0f32; block_samples];
                producer_mixer.process_into_output(&mut block, BLOCK_FRAMES);
                if blocks_tx.send(block).is_err() {
                    return;
                }
            }
        });

        // The stream isn't Send, so it lives and dies on its own thread.
        let output_healthy = healthy.clone();
        let output_thread = thread::spawn(move || {
            let stream = match sample_format {
                cpal::SampleFormat::I16 => {
                    build_stream::<i16>(&device, &stream_config, blocks_rx, output_healthy)
                }
                cpal::SampleFormat::I32 => {
                    build_stream::<i32>(&device, &stream_config, blocks_rx, output_healthy)
                }
                cpal::SampleFormat::U16 => {
                    build_stream::<u16>(&device, &stream_config, blocks_rx, output_healthy)
                }
                _ => build_stream::<f32>(&device, &stream_config, blocks_rx, output_healthy),
            };

            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(format!("unable to create stream: {}", e)));
                    return;
                }
            };
            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(format!("unable to start stream: {}", e)));
                return;
            }
            let _ = ready_tx.send(Ok(()));

            // Returns once the shutdown sender is dropped.
            let _ = shutdown_rx.recv();
            drop(stream);
        });

        let mut manager = OutputManager {
            mixer,
            healthy,
            shutdown_tx: Some(shutdown_tx),
            output_thread: Some(output_thread),
            producer_thread: Some(producer_thread),
        };

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(manager),
            Ok(Err(e)) => {
                manager.stop();
                Err(e.into())
            }
            Err(e) => {
                manager.stop();
                Err(e.into())
            }
        }
    }

    fn stop(&mut self) {
        self.shutdown_tx.take();
        if let Some(thread) = self.output_thread.take() {
            let _ = thread.join();
        }
        if let Some(thread) = self.producer_thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for OutputManager {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Builds an output stream that drains mixed blocks, converting to the device's sample type.
/// Underruns are filled with silence.
fn build_stream<T>(
    device: &cpal::Device,
    stream_config: &cpal::StreamConfig,
    blocks_rx: Receiver<Vec<f32>>,
    healthy: Arc<AtomicBool>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let mut pending: Vec<f32> = Vec::new();
    let mut offset = 0;
    device.build_output_stream(
        stream_config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            for sample in data.iter_mut() {
                if offset >= pending.len() {
                    if let Ok(block) = blocks_rx.try_recv() {
                        pending = block;
                        offset = 0;
                    }
                }
                let value = pending.get(offset).copied().unwrap_or(0.0);
                offset += 1;
                *sample = T::from_sample(value);
            }
        },
        move |err| {
            error!(err = %err, "Output stream error.");
            healthy.store(false, Ordering::Relaxed);
        },
        None,
    )
}

impl Device {
    /// Lists the output devices of every available host.
    pub fn list() -> Result<Vec<DeviceInfo>, Box<dyn Error>> {
        let mut devices: Vec<DeviceInfo> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.output_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let output_configs = match device.supported_output_configs() {
                    Ok(output_configs) => output_configs,
                    Err(_) => continue,
                };
                let max_channels = output_configs
                    .map(|output_config| output_config.channels())
                    .max()
                    .unwrap_or(0);

                if max_channels > 0 {
                    devices.push(DeviceInfo {
                        name: device.name()?,
                        host: host_id.name().to_string(),
                        max_channels,
                    });
                }
            }
        }

        devices.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(devices)
    }

    /// Opens the configured output device and starts its stream.
    pub fn get(config: &config::Audio) -> Result<Device, Box<dyn Error>> {
        let name = config.device();
        let (host_id, device) = Device::find(name)?;
        let default_config = device.default_output_config()?;

        let stream_config = cpal::StreamConfig {
            channels: config.channels().unwrap_or(default_config.channels()),
            sample_rate: cpal::SampleRate(
                config
                    .sample_rate()
                    .unwrap_or(default_config.sample_rate().0),
            ),
            buffer_size: cpal::BufferSize::Default,
        };

        let span = span!(Level::INFO, "output device");
        let _enter = span.enter();
        info!(
            device = name,
            channels = stream_config.channels,
            sample_rate = stream_config.sample_rate.0,
            "Starting output stream."
        );

        let output = OutputManager::start(
            device.clone(),
            stream_config,
            default_config.sample_format(),
        )?;

        Ok(Device {
            name: device.name()?,
            host_id,
            output,
        })
    }

    fn find(name: &str) -> Result<(cpal::HostId, cpal::Device), Box<dyn Error>> {
        if name == DEFAULT_DEVICE {
            let host = cpal::default_host();
            return match host.default_output_device() {
                Some(device) => Ok((host.id(), device)),
                None => Err("no default output device available".into()),
            };
        }

        for host_id in cpal::available_hosts() {
            let host = cpal::host_from_id(host_id)?;
            let Ok(devices) = host.output_devices() else {
                continue;
            };
            for device in devices {
                let Ok(device_name) = device.name() else {
                    continue;
                };
                if device_name.trim() == name {
                    return Ok((host_id, device));
                }
            }
        }
        Err(format!("no device found with name {}", name).into())
    }
}

impl AudioDevice for Device {
    fn load(&self, sound: &Sound) -> Result<Arc<dyn Track>, PlaybackError> {
        let samples = decode::load_loop(
            sound.file(),
            self.output.mixer.sample_rate(),
            self.output.mixer.num_channels(),
        )
        .map_err(|e| PlaybackError::Load {
            sound: sound.id().to_string(),
            reason: e.to_string(),
        })?;

        let voice = Arc::new(Voice::new(
            sound.id(),
            samples,
            self.output.mixer.num_channels(),
        ));
        self.output.mixer.add_voice(voice.clone());

        Ok(Arc::new(LoopTrack {
            voice,
            healthy: self.output.healthy.clone(),
        }))
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<crate::audio::mock::Device>, Box<dyn Error>> {
        Err("not a mock".into())
    }
}

/// A track that plays through the shared loop mixer.
struct LoopTrack {
    voice: Arc<Voice>,
    healthy: Arc<AtomicBool>,
}

impl Track for LoopTrack {
    fn play(&self) -> Result<(), PlaybackError> {
        if !self.healthy.load(Ordering::Relaxed) {
            return Err(PlaybackError::Rejected {
                sound: self.voice.id().to_string(),
                reason: "the output stream is not running".into(),
            });
        }
        self.voice.play();
        Ok(())
    }

    fn pause(&self) {
        self.voice.pause();
    }

    fn rewind(&self) {
        self.voice.rewind();
    }

    fn set_gain(&self, gain: f32) {
        self.voice.set_gain(gain);
    }

    fn gain(&self) -> f32 {
        self.voice.gain()
    }

    fn is_paused(&self) -> bool {
        self.voice.is_paused()
    }
}
