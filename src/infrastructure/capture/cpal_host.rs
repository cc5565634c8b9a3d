//! Microphone capture using cpal
//!
//! The cpal stream is not `Send`, so it lives on a dedicated capture thread
//! for as long as the input is held. The recorder side only shares the
//! sample buffer and a collecting flag with that thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BuildStreamError, SampleFormat, SampleRate, StreamConfig};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::flac_encoder::{encode_to_flac, TARGET_SAMPLE_RATE};
use super::pcm;
use crate::application::ports::{
    CaptureError, CaptureHandles, CaptureHost, CaptureSupport, InputStream, MediaRecorder,
};
use crate::domain::recording::AudioMimeType;

/// Poll interval of the capture thread while holding the stream
const HOLD_POLL: Duration = Duration::from_millis(50);

/// Capture host backed by the default cpal input device
#[derive(Debug, Default)]
pub struct CpalCaptureHost;

impl CpalCaptureHost {
    pub fn new() -> Self {
        Self
    }

    fn input_config(device: &cpal::Device) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let configs = device
            .supported_input_configs()
            .map_err(|e| CaptureError::DeviceUnavailable(format!("Failed to get configs: {}", e)))?;

        // Prefer mono, and ranges that include the target rate
        let mut best: Option<cpal::SupportedStreamConfigRange> = None;
        for config in configs {
            if config.sample_format() != SampleFormat::I16
                && config.sample_format() != SampleFormat::F32
            {
                continue;
            }
            let includes_target = config.min_sample_rate().0 <= TARGET_SAMPLE_RATE
                && config.max_sample_rate().0 >= TARGET_SAMPLE_RATE;
            let better = match &best {
                None => true,
                Some(current) => {
                    config.channels() < current.channels()
                        || (includes_target && current.min_sample_rate().0 > TARGET_SAMPLE_RATE)
                }
            };
            if better {
                best = Some(config);
            }
        }

        let range = best.ok_or_else(|| {
            CaptureError::DeviceUnavailable("No suitable input format".to_string())
        })?;

        let sample_rate = if range.min_sample_rate().0 <= TARGET_SAMPLE_RATE
            && range.max_sample_rate().0 >= TARGET_SAMPLE_RATE
        {
            SampleRate(TARGET_SAMPLE_RATE)
        } else {
            range.min_sample_rate()
        };

        Ok((
            StreamConfig {
                channels: range.channels(),
                sample_rate,
                buffer_size: cpal::BufferSize::Default,
            },
            range.sample_format(),
        ))
    }

    fn open_stream(
        buffer: &Arc<Mutex<Vec<i16>>>,
        collecting: &Arc<AtomicBool>,
    ) -> Result<(cpal::Stream, u32), CaptureError> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| CaptureError::DeviceUnavailable("No input device".to_string()))?;
        let (config, format) = Self::input_config(&device)?;
        let channels = config.channels;

        let on_error =
            |err: cpal::StreamError| warn!(error = %err, "Audio input stream error");
        let stream = match format {
            SampleFormat::I16 => {
                let buffer = Arc::clone(buffer);
                let collecting = Arc::clone(collecting);
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        if collecting.load(Ordering::SeqCst) {
                            let mono = pcm::downmix(data, channels);
                            if let Ok(mut buffer) = buffer.lock() {
                                buffer.extend_from_slice(&mono);
                            }
                        }
                    },
                    on_error,
                    None,
                )
            }
            SampleFormat::F32 => {
                let buffer = Arc::clone(buffer);
                let collecting = Arc::clone(collecting);
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if collecting.load(Ordering::SeqCst) {
                            let samples: Vec<i16> =
                                data.iter().map(|&s| pcm::f32_to_i16(s)).collect();
                            let mono = pcm::downmix(&samples, channels);
                            if let Ok(mut buffer) = buffer.lock() {
                                buffer.extend_from_slice(&mono);
                            }
                        }
                    },
                    on_error,
                    None,
                )
            }
            other => {
                return Err(CaptureError::DeviceUnavailable(format!(
                    "Unsupported sample format {other:?}"
                )))
            }
        }
        .map_err(map_build_error)?;

        stream
            .play()
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;
        Ok((stream, config.sample_rate.0))
    }

    /// Open the stream and hold it until `release` is set
    fn hold_stream(
        buffer: Arc<Mutex<Vec<i16>>>,
        collecting: Arc<AtomicBool>,
        release: Arc<AtomicBool>,
        ready: oneshot::Sender<Result<u32, CaptureError>>,
    ) {
        let stream = match Self::open_stream(&buffer, &collecting) {
            Ok((stream, sample_rate)) => {
                let _ = ready.send(Ok(sample_rate));
                stream
            }
            Err(err) => {
                let _ = ready.send(Err(err));
                return;
            }
        };

        while !release.load(Ordering::SeqCst) {
            std::thread::sleep(HOLD_POLL);
        }
        drop(stream);
        debug!("Capture thread released the input device");
    }
}

fn map_build_error(err: BuildStreamError) -> CaptureError {
    match err {
        BuildStreamError::DeviceNotAvailable => {
            CaptureError::DeviceUnavailable("Input device not available".to_string())
        }
        BuildStreamError::BackendSpecific { err } => {
            let message = err.to_string();
            let lower = message.to_lowercase();
            if lower.contains("permission") || lower.contains("denied") {
                CaptureError::PermissionDenied
            } else {
                CaptureError::DeviceUnavailable(message)
            }
        }
        other => CaptureError::DeviceUnavailable(other.to_string()),
    }
}

#[async_trait]
impl CaptureHost for CpalCaptureHost {
    fn support(&self) -> CaptureSupport {
        if cpal::available_hosts().is_empty() {
            CaptureSupport::NoCaptureApi
        } else {
            CaptureSupport::Available
        }
    }

    async fn acquire(&self) -> Result<CaptureHandles, CaptureError> {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let collecting = Arc::new(AtomicBool::new(false));
        let release = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = oneshot::channel();

        let thread = {
            let buffer = Arc::clone(&buffer);
            let collecting = Arc::clone(&collecting);
            let release = Arc::clone(&release);
            std::thread::Builder::new()
                .name("voicenote-capture".to_string())
                .spawn(move || Self::hold_stream(buffer, collecting, release, ready_tx))
                .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?
        };

        let sample_rate = ready_rx
            .await
            .map_err(|_| CaptureError::DeviceUnavailable("Capture thread exited".to_string()))??;
        debug!(sample_rate, "Input device acquired");

        Ok(CaptureHandles {
            input: Box::new(CpalInput {
                release,
                thread: Some(thread),
            }),
            recorder: Box::new(CpalMediaRecorder {
                buffer,
                collecting,
                sample_rate,
            }),
        })
    }
}

/// Holds the capture thread; stopping joins it
struct CpalInput {
    release: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl InputStream for CpalInput {
    /// Release is synchronous: the device is closed when this returns. The
    /// join waits at most one `HOLD_POLL`.
    fn stop_tracks(&mut self) {
        self.release.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            join_off_runtime(thread);
        }
    }
}

/// Join `thread`, letting a multi-thread runtime move its other tasks off
/// this worker while we wait
fn join_off_runtime(thread: JoinHandle<()>) {
    let on_worker = tokio::runtime::Handle::try_current()
        .map(|handle| handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread)
        .unwrap_or(false);
    let joined = if on_worker {
        tokio::task::block_in_place(|| thread.join())
    } else {
        thread.join()
    };
    if joined.is_err() {
        warn!("Capture thread panicked");
    }
}

impl Drop for CpalInput {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

/// Recorder over the shared sample buffer. Fragments are s16le mono at the
/// device rate; `seal` resamples and encodes FLAC.
struct CpalMediaRecorder {
    buffer: Arc<Mutex<Vec<i16>>>,
    collecting: Arc<AtomicBool>,
    sample_rate: u32,
}

impl CpalMediaRecorder {
    fn drain(&self) -> Vec<u8> {
        match self.buffer.lock() {
            Ok(mut buffer) => pcm::to_bytes(&std::mem::take(&mut *buffer)),
            Err(_) => Vec::new(),
        }
    }
}

impl MediaRecorder for CpalMediaRecorder {
    fn mime_type(&self) -> AudioMimeType {
        AudioMimeType::Flac
    }

    fn start(&mut self, timeslice_ms: u64) -> Result<(), CaptureError> {
        debug!(timeslice_ms, "Recorder collecting");
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.clear();
        }
        self.collecting.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&mut self) {
        self.collecting.store(false, Ordering::SeqCst);
    }

    fn resume(&mut self) {
        self.collecting.store(true, Ordering::SeqCst);
    }

    fn request_data(&mut self) -> Vec<u8> {
        self.drain()
    }

    fn stop(&mut self) -> Vec<u8> {
        self.collecting.store(false, Ordering::SeqCst);
        self.drain()
    }

    fn seal(&self, data: Vec<u8>) -> Result<Vec<u8>, CaptureError> {
        let samples = pcm::from_bytes(&data);
        if samples.is_empty() {
            return Err(CaptureError::EncodingFailed("No audio data captured".to_string()));
        }
        let resampled = pcm::resample_to_target(&samples, self.sample_rate)?;
        encode_to_flac(&resampled).map_err(|e| CaptureError::EncodingFailed(e.to_string()))
    }
}
