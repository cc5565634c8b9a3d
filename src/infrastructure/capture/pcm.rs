//! Raw PCM helpers for captured fragments
//!
//! Fragments travel as little-endian signed 16-bit mono samples at the
//! device rate, so any split point between two fragments is a valid one.

use rubato::{FftFixedIn, Resampler};

use super::flac_encoder::TARGET_SAMPLE_RATE;
use crate::application::ports::CaptureError;

/// Average interleaved channels down to mono
pub fn downmix(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

pub fn to_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Decode s16le bytes; a trailing odd byte is ignored
pub fn from_bytes(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Resample mono audio from `source_rate` to 16 kHz
pub fn resample_to_target(samples: &[i16], source_rate: u32) -> Result<Vec<i16>, CaptureError> {
    if source_rate == TARGET_SAMPLE_RATE || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let input: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();
    let ratio = TARGET_SAMPLE_RATE as f64 / source_rate as f64;
    let output_len = (input.len() as f64 * ratio).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        TARGET_SAMPLE_RATE as usize,
        1024,
        2,
        1,
    )
    .map_err(|e| CaptureError::EncodingFailed(format!("Resampler init failed: {}", e)))?;

    let mut output = Vec::with_capacity(output_len);
    let mut pos = 0;

    while pos < input.len() {
        let needed = resampler.input_frames_next();
        let end = (pos + needed).min(input.len());
        let mut chunk = input[pos..end].to_vec();
        chunk.resize(needed, 0.0);

        let resampled = resampler
            .process(&[chunk], None)
            .map_err(|e| CaptureError::EncodingFailed(format!("Resampling failed: {}", e)))?;

        output.extend(resampled[0].iter().map(|&s| f32_to_i16(s)));
        pos = end;
    }

    output.truncate(output_len);
    Ok(output)
}
