//! Audio playback through the default output device using rodio.
//!
//! Playback deliberately blocks the calling turn: the orchestrator must not
//! start the next capture while the assistant is still speaking, so `play`
//! polls the sink until it drains instead of handing back a future.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink};

/// Poll interval while waiting for the sink to drain.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub enum PlaybackError {
    NoOutputDevice,
    OpenFailed(String),
    DecodeFailed(String),
    SinkFailed(String),
}

impl std::fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackError::NoOutputDevice => write!(f, "No audio output device found"),
            PlaybackError::OpenFailed(e) => write!(f, "Failed to open audio file: {}", e),
            PlaybackError::DecodeFailed(e) => write!(f, "Failed to decode audio file: {}", e),
            PlaybackError::SinkFailed(e) => write!(f, "Failed to start playback: {}", e),
        }
    }
}

impl std::error::Error for PlaybackError {}

/// Something that can play an audio file to completion.
///
/// `play` returns only after playback finishes or fails.
pub trait Player: Send {
    fn play(&mut self, path: &Path) -> Result<(), PlaybackError>;
}

/// Plays WAV or MP3 files through the default output device.
///
/// The output stream is opened per call and torn down when playback ends,
/// so the device is free between turns.
pub struct Speaker;

impl Speaker {
    pub fn new() -> Self {
        Speaker
    }
}

impl Default for Speaker {
    fn default() -> Self {
        Self::new()
    }
}

impl Player for Speaker {
    fn play(&mut self, path: &Path) -> Result<(), PlaybackError> {
        let file = File::open(path).map_err(|e| PlaybackError::OpenFailed(e.to_string()))?;
        let source =
            Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::DecodeFailed(e.to_string()))?;

        let (_stream, handle) =
            OutputStream::try_default().map_err(|_| PlaybackError::NoOutputDevice)?;
        let sink = Sink::try_new(&handle).map_err(|e| PlaybackError::SinkFailed(e.to_string()))?;

        log::debug!("Playing audio file: {:?}", path);
        sink.append(source);

        // Blocking wait with a fixed poll interval.
        while !sink.empty() {
            std::thread::sleep(POLL_INTERVAL);
        }

        log::debug!("Playback finished: {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_reports_missing_file_as_open_error() {
        let mut speaker = Speaker::new();
        let result = speaker.play(Path::new("/tmp/voxloop-does-not-exist.wav"));
        assert!(matches!(result, Err(PlaybackError::OpenFailed(_))));
    }
}
