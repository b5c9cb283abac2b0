//! Audio capture and playback.

pub mod endpoint;
pub mod paths;
pub mod player;
pub mod recorder;

pub use endpoint::{CaptureConfig, EndpointDetector, FrameOutcome};
pub use paths::{audio_dir, create_audio_dir, delete_file};
pub use player::{PlaybackError, Player, Speaker};
pub use recorder::{CaptureError, Microphone, Recorder};
