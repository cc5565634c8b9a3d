//! Microphone capture adapter

mod cpal_host;
mod flac_encoder;
mod pcm;

pub use cpal_host::CpalCaptureHost;
pub use flac_encoder::{encode_to_flac, EncodingError, TARGET_SAMPLE_RATE};
