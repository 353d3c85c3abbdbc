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
use std::fs::File;
use std::path::Path;

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::warn;

/// Number of frames handed to the resampler at a time.
const RESAMPLE_CHUNK_FRAMES: usize = 1024;

/// Error types for decoding sound files into loops
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Resampling failed: {0}Hz -> {1}Hz")]
    ResamplingFailed(u32, u32),

    #[error("Unsupported audio file '{0}': {1}")]
    Unsupported(String, String),

    #[error("Audio file error: {0}")]
    AudioError(#[from] SymphoniaError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A sound file decoded into memory as interleaved f32 samples.
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub num_channels: u16,
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Returns the number of frames in the decoded audio.
    pub fn num_frames(&self) -> usize {
        self.samples.len() / usize::from(self.num_channels.max(1))
    }
}

/// Decodes an entire audio file (WAV, MP3, FLAC, OGG and anything else symphonia supports).
pub fn decode_file(path: &Path) -> Result<DecodedAudio, DecodeError> {
    let file_path = path.display().to_string();
    let file = File::open(path).map_err(|e| {
        DecodeError::IoError(std::io::Error::new(
            e.kind(),
            format!("{}: {}", file_path, e),
        ))
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Create a hint to help the format registry guess the format
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::Unsupported(file_path.clone(), e.to_string()))?;
    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::Unsupported(file_path.clone(), "no audio track".into()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut num_channels = track
        .codec_params
        .channels
        .map(|channels| channels.count() as u16)
        .unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::Unsupported(file_path.clone(), e.to_string()))?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                num_channels = spec.channels.count() as u16;
                sample_rate = spec.rate;

                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buffer.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(file = %file_path, err = e, "Skipping undecodable packet.");
            }
            Err(e) => return Err(e.into()),
        }
    }

    if samples.is_empty() || num_channels == 0 || sample_rate == 0 {
        let reason = "no audio decoded".to_string();
        return Err(DecodeError::Unsupported(file_path, reason));
    }

    Ok(DecodedAudio {
        samples,
        num_channels,
        sample_rate,
    })
}

/// Converts interleaved samples between channel counts. Sources with more channels than the
/// output are folded by averaging every channel onto output channel (index % to); sources with
/// fewer channels are repeated across the output, so mono ends up on every channel.
pub fn remap_channels(samples: &[f32], from: u16, to: u16) -> Vec<f32> {
    let (from, to) = (usize::from(from.max(1)), usize::from(to.max(1)));
    if from == to {
        return samples.to_vec();
    }

    let mut remapped = Vec::with_capacity(samples.len() / from * to);
    for frame in samples.chunks_exact(from) {
        for channel in 0..to {
            if from > to {
                let folded = frame.iter().skip(channel).step_by(to);
                let count = folded.len();
                remapped.push(folded.sum::<f32>() / count as f32);
            } else {
                remapped.push(frame[channel % from]);
            }
        }
    }
    remapped
}

/// Resamples interleaved samples from one sample rate to another.
pub fn resample(
    samples: &[f32],
    num_channels: u16,
    from: u32,
    to: u32,
) -> Result<Vec<f32>, DecodeError> {
    if from == to {
        return Ok(samples.to_vec());
    }

    let num_channels = usize::from(num_channels.max(1));
    let capacity = samples.len() / num_channels;
    let mut planar: Vec<Vec<f32>> = vec![Vec::with_capacity(capacity); num_channels];
    for frame in samples.chunks_exact(num_channels) {
        for (channel, sample) in planar.iter_mut().zip(frame) {
            channel.push(*sample);
        }
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(
        f64::from(to) / f64::from(from),
        1.0,
        params,
        RESAMPLE_CHUNK_FRAMES,
        num_channels,
    )
    .map_err(|_| DecodeError::ResamplingFailed(from, to))?;

    let num_frames = planar[0].len();
    let mut resampled: Vec<Vec<f32>> = vec![Vec::new(); num_channels];
    let mut position = 0;
    while position < num_frames {
        let end = (position + RESAMPLE_CHUNK_FRAMES).min(num_frames);
        let chunk: Vec<&[f32]> = planar
            .iter()
            .map(|channel| &channel[position..end])
            .collect();
        let output = if end - position == RESAMPLE_CHUNK_FRAMES {
            resampler.process(&chunk, None)
        } else {
            resampler.process_partial(Some(&chunk), None)
        }
        .map_err(|_| DecodeError::ResamplingFailed(from, to))?;

        for (channel, processed) in resampled.iter_mut().zip(output) {
            channel.extend(processed);
        }
        position = end;
    }

    let frames = resampled[0].len();
    let mut interleaved = Vec::with_capacity(frames * num_channels);
    for frame in 0..frames {
        for channel in resampled.iter() {
            interleaved.push(channel[frame]);
        }
    }
    Ok(interleaved)
}

/// Decodes a sound file into a loop matching the given output format.
pub fn load_loop(
    path: &Path,
    sample_rate: u32,
    num_channels: u16,
) -> Result<Vec<f32>, DecodeError> {
    let decoded = decode_file(path)?;
    let remapped = remap_channels(&decoded.samples, decoded.num_channels, num_channels);
    resample(&remapped, num_channels, decoded.sample_rate, sample_rate)
}
