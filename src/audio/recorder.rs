//! Microphone capture using CPAL for input and hound for WAV writing.
//!
//! One capture attempt calibrates for ambient noise, waits for speech, and
//! records until the endpoint detector reports the phrase complete. Attempts
//! that time out waiting for speech are retried; after all retries the
//! recorder returns `None`, which is the caller's non-exceptional signal
//! that no usable speech was captured this turn.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, Stream, StreamConfig};
use hound::{WavSpec, WavWriter};

use super::endpoint::{CaptureConfig, EndpointDetector, FrameOutcome};
use super::paths::normalize_wav_extension;

/// How long the capture loop waits for the device to deliver a frame before
/// declaring the stream stalled.
const STREAM_STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors that can occur during one capture attempt.
#[derive(Debug, Clone)]
pub enum CaptureError {
    NoInputDevice,
    NoSupportedConfig,
    /// No speech started within the timeout window. Retried, not fatal.
    Timeout,
    StreamFailed(String),
    WriteFailed(String),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::NoInputDevice => write!(f, "No audio input device found"),
            CaptureError::NoSupportedConfig => write!(f, "No supported audio configuration"),
            CaptureError::Timeout => write!(f, "No speech detected within the timeout window"),
            CaptureError::StreamFailed(e) => write!(f, "Audio stream failed: {}", e),
            CaptureError::WriteFailed(e) => write!(f, "Failed to write WAV file: {}", e),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Something that can capture one utterance to a WAV file.
///
/// `record` blocks the calling thread for the whole capture, including the
/// ambient calibration and all internal retries.
pub trait Recorder: Send {
    fn record(&mut self, destination: &Path) -> Option<PathBuf>;
}

/// Captures utterances from the default input device.
pub struct Microphone {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    capture: CaptureConfig,
}

impl Microphone {
    /// Open the default input device with its default configuration.
    pub fn new(capture: CaptureConfig) -> Result<Self, CaptureError> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoInputDevice)?;

        log::info!("Using audio input device: {:?}", device.name());

        let supported_config = device
            .default_input_config()
            .map_err(|_| CaptureError::NoSupportedConfig)?;

        log::info!(
            "Audio config: {} Hz, {} channels, {:?}",
            supported_config.sample_rate().0,
            supported_config.channels(),
            supported_config.sample_format()
        );

        let sample_format = supported_config.sample_format();
        let config: StreamConfig = supported_config.into();

        Ok(Self {
            device,
            config,
            sample_format,
            capture,
        })
    }

    /// Record one utterance, retrying timed-out attempts.
    ///
    /// Returns the WAV path on success, `None` once all attempts are spent.
    pub fn record(&self, destination: &Path) -> Option<PathBuf> {
        record_with_retries(self.capture.retries, || self.record_once(destination))
    }

    /// One capture attempt: calibrate, wait for speech, collect the phrase,
    /// write it as 16-bit mono WAV at `destination` (extension normalized
    /// to `.wav`).
    fn record_once(&self, destination: &Path) -> Result<PathBuf, CaptureError> {
        let wav_path = normalize_wav_extension(destination);

        let (frame_tx, frame_rx) = mpsc::channel::<Vec<f32>>();
        let stream = self.build_stream(frame_tx)?;
        stream
            .play()
            .map_err(|e| CaptureError::StreamFailed(e.to_string()))?;

        log::info!("Calibrating for ambient noise...");
        let mut detector = EndpointDetector::new(self.capture.clone(), self.config.sample_rate.0);

        loop {
            let frame = frame_rx
                .recv_timeout(STREAM_STALL_TIMEOUT)
                .map_err(|_| CaptureError::StreamFailed("audio stream stalled".to_string()))?;

            match detector.push_frame(&frame) {
                FrameOutcome::PhraseStarted => log::info!("Recording started"),
                FrameOutcome::PhraseComplete => break,
                FrameOutcome::TimedOut => return Err(CaptureError::Timeout),
                _ => {}
            }
        }

        drop(stream);
        let samples = detector.take_phrase();
        log::info!("Recording complete");

        write_wav(&wav_path, &samples, self.config.sample_rate.0)?;
        log::info!("Audio saved as WAV: {:?}", wav_path);
        Ok(wav_path)
    }

    fn build_stream(&self, frame_tx: mpsc::Sender<Vec<f32>>) -> Result<Stream, CaptureError> {
        let err_fn = |err| log::error!("Audio stream error: {}", err);

        match self.sample_format {
            SampleFormat::I16 => self.build_stream_typed::<i16>(frame_tx, err_fn),
            SampleFormat::U16 => self.build_stream_typed::<u16>(frame_tx, err_fn),
            SampleFormat::F32 => self.build_stream_typed::<f32>(frame_tx, err_fn),
            _ => Err(CaptureError::NoSupportedConfig),
        }
    }

    fn build_stream_typed<T>(
        &self,
        frame_tx: mpsc::Sender<Vec<f32>>,
        err_fn: impl FnMut(cpal::StreamError) + Send + 'static,
    ) -> Result<Stream, CaptureError>
    where
        T: cpal::SizedSample + Send + 'static,
        f32: FromSample<T>,
    {
        let config = self.config.clone();
        let channels = config.channels as usize;

        let stream = self
            .device
            .build_input_stream(
                &config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    // Mix interleaved channels down to mono.
                    let frame: Vec<f32> = data
                        .chunks(channels.max(1))
                        .map(|chunk| {
                            chunk.iter().map(|&s| f32::from_sample(s)).sum::<f32>()
                                / chunk.len() as f32
                        })
                        .collect();
                    // Receiver gone means the attempt ended; nothing to do.
                    let _ = frame_tx.send(frame);
                },
                err_fn,
                None,
            )
            .map_err(|e| CaptureError::StreamFailed(e.to_string()))?;

        Ok(stream)
    }
}

impl Recorder for Microphone {
    fn record(&mut self, destination: &Path) -> Option<PathBuf> {
        Microphone::record(self, destination)
    }
}

/// Run capture attempts until one succeeds or the attempts are spent.
fn record_with_retries<F>(retries: u32, mut attempt: F) -> Option<PathBuf>
where
    F: FnMut() -> Result<PathBuf, CaptureError>,
{
    let retries = retries.max(1);
    for n in 1..=retries {
        match attempt() {
            Ok(path) => return Some(path),
            Err(CaptureError::Timeout) => {
                log::warn!("Listening timed out, retrying ({}/{})", n, retries);
            }
            Err(e) => {
                log::error!("Failed to record audio: {}", e);
            }
        }
    }
    log::error!("Recording failed after all retries");
    None
}

/// Write mono f32 samples as a 16-bit PCM WAV file.
fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), CaptureError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer =
        WavWriter::create(path, spec).map_err(|e| CaptureError::WriteFailed(e.to_string()))?;

    for &sample in samples {
        writer
            .write_sample(sample_to_i16(sample))
            .map_err(|e| CaptureError::WriteFailed(e.to_string()))?;
    }

    writer
        .finalize()
        .map_err(|e| CaptureError::WriteFailed(e.to_string()))
}

/// Convert a [-1.0, 1.0] sample to i16 for WAV writing.
fn sample_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    (clamped * i16::MAX as f32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_spend_exactly_the_configured_attempts() {
        let mut attempts = 0;
        let result = record_with_retries(3, || {
            attempts += 1;
            Err(CaptureError::Timeout)
        });
        assert!(result.is_none());
        assert_eq!(attempts, 3);
    }

    #[test]
    fn first_success_stops_retrying() {
        let mut attempts = 0;
        let result = record_with_retries(3, || {
            attempts += 1;
            if attempts == 2 {
                Ok(PathBuf::from("/tmp/clip.wav"))
            } else {
                Err(CaptureError::Timeout)
            }
        });
        assert_eq!(result, Some(PathBuf::from("/tmp/clip.wav")));
        assert_eq!(attempts, 2);
    }

    #[test]
    fn zero_retries_still_attempts_once() {
        let mut attempts = 0;
        let _ = record_with_retries(0, || {
            attempts += 1;
            Err(CaptureError::StreamFailed("gone".to_string()))
        });
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_sample_to_i16() {
        assert_eq!(sample_to_i16(0.0), 0);
        assert_eq!(sample_to_i16(1.0), i16::MAX);
        assert_eq!(sample_to_i16(-1.0), -i16::MAX);

        // Out-of-range input is clamped.
        assert_eq!(sample_to_i16(2.0), i16::MAX);
        assert_eq!(sample_to_i16(-2.0), -i16::MAX);
    }

    #[test]
    fn write_wav_roundtrips_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let samples = vec![0.0, 0.5, -0.5, 1.0];

        write_wav(&path, &samples, 16000).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);

        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read.len(), 4);
        assert_eq!(read[0], 0);
        assert_eq!(read[3], i16::MAX);
    }
}
