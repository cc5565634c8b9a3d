//! FLAC container for sealed recordings
//!
//! Recordings are stored as 16 kHz mono 16-bit FLAC: lossless, accepted
//! by the note service, and decodable by the playback engine.

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::error::Verify;
use flacenc::source::MemSource;

/// Sample rate of sealed recordings
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// The encoder step that failed, with flacenc's own message
#[derive(Debug, thiserror::Error)]
#[error("Cannot encode recording ({stage}): {detail}")]
pub struct EncodingError {
    pub stage: &'static str,
    pub detail: String,
}

impl EncodingError {
    fn at(stage: &'static str, detail: impl std::fmt::Debug) -> Self {
        Self {
            stage,
            detail: format!("{detail:?}"),
        }
    }
}

/// Encode mono 16 kHz samples as a FLAC stream
pub fn encode_to_flac(samples: &[i16]) -> Result<Vec<u8>, EncodingError> {
    let widened: Vec<i32> = samples.iter().copied().map(i32::from).collect();
    let source = MemSource::from_samples(&widened, 1, 16, TARGET_SAMPLE_RATE as usize);

    let encoder = flacenc::config::Encoder::default()
        .into_verified()
        .map_err(|(_, e)| EncodingError::at("config", e))?;
    let block_size = encoder.block_size;
    let stream = flacenc::encode_with_fixed_block_size(&encoder, source, block_size)
        .map_err(|e| EncodingError::at("encode", e))?;

    let mut sink = ByteSink::new();
    stream
        .write(&mut sink)
        .map_err(|e| EncodingError::at("write", e))?;
    Ok(sink.into_inner())
}
