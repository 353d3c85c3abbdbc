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
// Looping voice mixing that can be used by both CPAL and test implementations
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// A decoded, looping sound that the mixer can play.
pub struct Voice {
    /// The id of the sound this voice plays.
    id: String,
    /// Interleaved samples, already converted to the mixer's channel count and sample rate.
    samples: Arc<Vec<f32>>,
    /// Number of interleaved channels in samples.
    num_channels: usize,
    /// The next frame to be mixed.
    position: AtomicUsize,
    paused: AtomicBool,
    /// The output gain, stored as f32 bits.
    gain: AtomicU32,
}

impl Voice {
    /// Creates a new paused voice at full gain.
    pub fn new(id: &str, samples: Vec<f32>, num_channels: u16) -> Voice {
        Voice {
            id: id.to_string(),
            samples: Arc::new(samples),
            num_channels: usize::from(num_channels.max(1)),
            position: AtomicUsize::new(0),
            paused: AtomicBool::new(true),
            gain: AtomicU32::new(1.0f32.to_bits()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn play(&self) {
        self.paused.store(false, Ordering::Release);
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    pub fn rewind(&self) {
        self.position.store(0, Ordering::Release);
    }

    pub fn set_gain(&self, gain: f32) {
        self.gain.store(gain.to_bits(), Ordering::Release);
    }

    pub fn gain(&self) -> f32 {
        f32::from_bits(self.gain.load(Ordering::Acquire))
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Returns the frame that will be mixed next.
    pub fn position(&self) -> usize {
        self.position.load(Ordering::Acquire)
    }

    /// Returns the loop length in frames.
    pub fn num_frames(&self) -> usize {
        self.samples.len() / self.num_channels
    }

    /// Adds up to output.len() / num_channels frames of this voice into output, wrapping
    /// around at the end of the loop.
    fn mix_into(&self, output: &mut [f32], num_channels: usize) {
        let num_frames = self.num_frames();
        if num_frames == 0 || num_channels != self.num_channels {
            return;
        }

        let gain = self.gain();
        let start_position = self.position();
        let mut position = start_position % num_frames;
        for frame in output.chunks_exact_mut(num_channels) {
            let start = position * num_channels;
            for (out, sample) in frame
                .iter_mut()
                .zip(&self.samples[start..start + num_channels])
            {
                *out += sample * gain;
            }
            position = (position + 1) % num_frames;
        }
        // A rewind that raced with this block wins.
        let _ = self.position.compare_exchange(
            start_position,
            position,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

/// Mixes every unpaused voice into interleaved output blocks.
#[derive(Clone)]
pub struct LoopMixer {
    /// The voices known to the mixer, paused or not.
    voices: Arc<RwLock<Vec<Arc<Voice>>>>,
    /// Number of output channels
    num_channels: u16,
    /// Sample rate
    sample_rate: u32,
}

impl LoopMixer {
    /// Creates a new loop mixer
    pub fn new(num_channels: u16, sample_rate: u32) -> Self {
        Self {
            voices: Arc::new(RwLock::new(Vec::new())),
            num_channels: num_channels.max(1),
            sample_rate,
        }
    }

    /// Adds a voice, replacing any voice with the same id.
    pub fn add_voice(&self, voice: Arc<Voice>) {
        let mut voices = self.voices.write();
        voices.retain(|existing| existing.id() != voice.id());
        voices.push(voice);
    }

    /// Mixes num_frames frames into output, which must hold num_frames * num_channels samples.
    /// Samples are clamped to [-1.0, 1.0].
    pub fn process_into_output(&self, output: &mut [f32], num_frames: usize) {
        let num_channels = self.num_channels as usize;
        let len = (num_frames * num_channels).min(output.len());
        let output = &mut output[..len];
        output.fill(0.0);

        for voice in self.voices.read().iter() {
            if !voice.is_paused() {
                voice.mix_into(output, num_channels);
            }
        }

        for sample in output.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }

    /// Gets the number of output channels
    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }

    /// Gets the sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn voice(id: &str, samples: Vec<f32>) -> Arc<Voice> {
        Arc::new(Voice::new(id, samples, 2))
    }

    #[test]
    fn test_paused_voices_are_silent() {
        let mixer = LoopMixer::new(2, 44100);
        mixer.add_voice(voice("rain", vec![0.5; 8]));

        let mut output = vec![1.0; 8];
        mixer.process_into_output(&mut output, 4);
        assert_eq!(vec![0.0; 8], output);
    }

    #[test]
    fn test_voices_loop_with_gain() {
        let mixer = LoopMixer::new(2, 44100);
        let rain = voice("rain", vec![0.1, 0.2, 0.3, 0.4]);
        rain.set_gain(0.5);
        rain.play();
        mixer.add_voice(rain.clone());

        let mut output = vec![0.0; 6];
        mixer.process_into_output(&mut output, 3);
        assert_eq!(vec![0.05, 0.1, 0.15, 0.2, 0.05, 0.1], output);
        assert_eq!(1, rain.position());

        rain.rewind();
        assert_eq!(0, rain.position());
    }

    #[test]
    fn test_voices_are_summed_and_clamped() {
        let mixer = LoopMixer::new(2, 44100);
        let rain = voice("rain", vec![0.75, -0.75]);
        let wind = voice("wind", vec![0.5, -0.5]);
        rain.play();
        wind.play();
        mixer.add_voice(rain);
        mixer.add_voice(wind.clone());

        let mut output = vec![0.0; 2];
        mixer.process_into_output(&mut output, 1);
        assert_eq!(vec![1.0, -1.0], output);

        wind.set_gain(0.0);
        mixer.process_into_output(&mut output, 1);
        assert_eq!(vec![0.75, -0.75], output);
    }

    #[test]
    fn test_add_voice_replaces_same_id() {
        let mixer = LoopMixer::new(2, 44100);
        let first = voice("rain", vec![0.25, 0.25]);
        let second = voice("rain", vec![0.5, 0.5]);
        first.play();
        second.play();
        mixer.add_voice(first);
        mixer.add_voice(second);

        let mut output = vec![0.0; 2];
        mixer.process_into_output(&mut output, 1);
        assert_eq!(vec![0.5, 0.5], output);
    }
}
