//! Energy-based utterance endpoint detection.
//!
//! The detector is a pure state machine over mono sample frames: it performs
//! an ambient-noise calibration pass, waits for frame energy to cross the
//! speech threshold, then collects the phrase until enough trailing silence
//! accumulates. It does no I/O, so the capture retry logic can be driven by
//! matching on explicit outcomes instead of catching broad errors.

use serde::{Deserialize, Serialize};

/// Ratio applied to the measured ambient energy when dynamic thresholding
/// is enabled.
pub const DYNAMIC_ENERGY_RATIO: f32 = 1.5;

/// Floor for the dynamic threshold so a dead-silent room cannot push the
/// threshold down to where sensor noise registers as speech.
const MIN_DYNAMIC_THRESHOLD: f32 = 50.0;

/// Tuning for one capture attempt.
///
/// Energy values are RMS amplitudes on the 16-bit integer scale, so the
/// defaults carry over from typical microphone setups (2000 is a quiet room
/// with a consumer mic).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Maximum seconds to wait for speech to start before the attempt fails.
    pub timeout_secs: f32,
    /// Hard cap on phrase length; `None` means unlimited.
    pub phrase_time_limit_secs: Option<f32>,
    /// Total capture attempts before giving up on the turn.
    pub retries: u32,
    /// Speech/silence decision baseline (i16 RMS scale).
    pub energy_threshold: f32,
    /// Trailing silence that ends the phrase.
    pub pause_threshold_secs: f32,
    /// Phrases with less voiced audio than this are discarded.
    pub phrase_threshold_secs: f32,
    /// Re-derive the threshold from ambient noise during calibration.
    pub dynamic_energy_threshold: bool,
    /// Ambient-noise calibration window before each attempt.
    pub calibration_duration_secs: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10.0,
            phrase_time_limit_secs: None,
            retries: 3,
            energy_threshold: 2000.0,
            pause_threshold_secs: 1.0,
            phrase_threshold_secs: 0.1,
            dynamic_energy_threshold: true,
            calibration_duration_secs: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Calibrating,
    Waiting,
    InPhrase,
}

/// What the detector concluded from one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Calibrating,
    WaitingForSpeech,
    PhraseStarted,
    InPhrase,
    /// The phrase is finished; retrieve it with [`EndpointDetector::take_phrase`].
    PhraseComplete,
    /// No speech started within the timeout window.
    TimedOut,
}

pub struct EndpointDetector {
    config: CaptureConfig,
    sample_rate: u32,
    phase: Phase,
    threshold: f32,
    calibrated_samples: u64,
    calibration_energy_sum: f64,
    calibration_frames: u32,
    waited_samples: u64,
    silence_samples: u64,
    phrase: Vec<f32>,
}

impl EndpointDetector {
    pub fn new(config: CaptureConfig, sample_rate: u32) -> Self {
        let phase = if config.calibration_duration_secs > 0.0 {
            Phase::Calibrating
        } else {
            Phase::Waiting
        };
        let threshold = config.energy_threshold;
        Self {
            config,
            sample_rate,
            phase,
            threshold,
            calibrated_samples: 0,
            calibration_energy_sum: 0.0,
            calibration_frames: 0,
            waited_samples: 0,
            silence_samples: 0,
            phrase: Vec::new(),
        }
    }

    /// The speech/silence baseline currently in effect. Before calibration
    /// completes this is the configured threshold.
    pub fn effective_threshold(&self) -> f32 {
        self.threshold
    }

    /// Feed one mono frame and advance the state machine.
    pub fn push_frame(&mut self, frame: &[f32]) -> FrameOutcome {
        if frame.is_empty() {
            return match self.phase {
                Phase::Calibrating => FrameOutcome::Calibrating,
                Phase::Waiting => FrameOutcome::WaitingForSpeech,
                Phase::InPhrase => FrameOutcome::InPhrase,
            };
        }

        let energy = frame_energy(frame);

        match self.phase {
            Phase::Calibrating => {
                self.calibration_energy_sum += f64::from(energy);
                self.calibration_frames += 1;
                self.calibrated_samples += frame.len() as u64;

                if self.secs(self.calibrated_samples) >= self.config.calibration_duration_secs {
                    if self.config.dynamic_energy_threshold {
                        let ambient =
                            (self.calibration_energy_sum / f64::from(self.calibration_frames)) as f32;
                        self.threshold = (ambient * DYNAMIC_ENERGY_RATIO).max(MIN_DYNAMIC_THRESHOLD);
                        log::debug!(
                            "Ambient calibration done: ambient={:.0}, threshold={:.0}",
                            ambient,
                            self.threshold
                        );
                    }
                    self.phase = Phase::Waiting;
                }
                FrameOutcome::Calibrating
            }
            Phase::Waiting => {
                if energy >= self.threshold {
                    self.phase = Phase::InPhrase;
                    self.silence_samples = 0;
                    self.phrase.extend_from_slice(frame);
                    FrameOutcome::PhraseStarted
                } else {
                    self.waited_samples += frame.len() as u64;
                    if self.secs(self.waited_samples) >= self.config.timeout_secs {
                        FrameOutcome::TimedOut
                    } else {
                        FrameOutcome::WaitingForSpeech
                    }
                }
            }
            Phase::InPhrase => {
                self.phrase.extend_from_slice(frame);
                if energy >= self.threshold {
                    self.silence_samples = 0;
                } else {
                    self.silence_samples += frame.len() as u64;
                }

                let phrase_secs = self.secs(self.phrase.len() as u64);
                let silence_secs = self.secs(self.silence_samples);
                let limit_hit = self
                    .config
                    .phrase_time_limit_secs
                    .is_some_and(|limit| phrase_secs >= limit);

                if silence_secs >= self.config.pause_threshold_secs || limit_hit {
                    let voiced_secs = phrase_secs - silence_secs;
                    if voiced_secs >= self.config.phrase_threshold_secs {
                        FrameOutcome::PhraseComplete
                    } else {
                        // Too short to be speech; discard and keep listening.
                        log::debug!(
                            "Discarding {:.2}s blip (below {:.2}s phrase threshold)",
                            voiced_secs,
                            self.config.phrase_threshold_secs
                        );
                        self.phrase.clear();
                        self.silence_samples = 0;
                        self.phase = Phase::Waiting;
                        FrameOutcome::WaitingForSpeech
                    }
                } else {
                    FrameOutcome::InPhrase
                }
            }
        }
    }

    /// Take the collected phrase after [`FrameOutcome::PhraseComplete`].
    pub fn take_phrase(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.phrase)
    }

    fn secs(&self, samples: u64) -> f32 {
        samples as f32 / self.sample_rate as f32
    }
}

/// RMS energy of a frame of [-1.0, 1.0] samples, scaled to the i16 range.
pub fn frame_energy(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = frame.iter().map(|s| s * s).sum();
    (sum_squares / frame.len() as f32).sqrt() * f32::from(i16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 1000;

    fn frame(value: f32) -> Vec<f32> {
        // 100 samples = 0.1s at RATE
        vec![value; 100]
    }

    fn config() -> CaptureConfig {
        CaptureConfig {
            timeout_secs: 1.0,
            phrase_time_limit_secs: None,
            retries: 3,
            energy_threshold: 2000.0,
            pause_threshold_secs: 0.3,
            phrase_threshold_secs: 0.25,
            dynamic_energy_threshold: false,
            calibration_duration_secs: 0.0,
        }
    }

    #[test]
    fn frame_energy_is_rms_on_i16_scale() {
        assert_eq!(frame_energy(&[]), 0.0);
        assert_eq!(frame_energy(&frame(0.0)), 0.0);
        let energy = frame_energy(&frame(0.5));
        assert!((energy - 0.5 * f32::from(i16::MAX)).abs() < 1.0);
    }

    #[test]
    fn times_out_when_no_speech_starts() {
        let mut detector = EndpointDetector::new(config(), RATE);
        for _ in 0..9 {
            assert_eq!(detector.push_frame(&frame(0.0)), FrameOutcome::WaitingForSpeech);
        }
        // Tenth silent frame reaches the 1.0s timeout.
        assert_eq!(detector.push_frame(&frame(0.0)), FrameOutcome::TimedOut);
    }

    #[test]
    fn phrase_completes_after_trailing_silence() {
        let mut detector = EndpointDetector::new(config(), RATE);
        assert_eq!(detector.push_frame(&frame(0.5)), FrameOutcome::PhraseStarted);
        for _ in 0..4 {
            assert_eq!(detector.push_frame(&frame(0.5)), FrameOutcome::InPhrase);
        }
        assert_eq!(detector.push_frame(&frame(0.0)), FrameOutcome::InPhrase);
        assert_eq!(detector.push_frame(&frame(0.0)), FrameOutcome::InPhrase);
        assert_eq!(detector.push_frame(&frame(0.0)), FrameOutcome::PhraseComplete);

        // 5 voiced + 3 silent frames, 100 samples each.
        assert_eq!(detector.take_phrase().len(), 800);
    }

    #[test]
    fn short_blip_is_discarded_and_listening_resumes() {
        let mut detector = EndpointDetector::new(config(), RATE);

        // 0.1s blip, below the 0.25s phrase threshold.
        assert_eq!(detector.push_frame(&frame(0.5)), FrameOutcome::PhraseStarted);
        assert_eq!(detector.push_frame(&frame(0.0)), FrameOutcome::InPhrase);
        assert_eq!(detector.push_frame(&frame(0.0)), FrameOutcome::InPhrase);
        assert_eq!(
            detector.push_frame(&frame(0.0)),
            FrameOutcome::WaitingForSpeech
        );

        // A real phrase afterwards still completes.
        assert_eq!(detector.push_frame(&frame(0.5)), FrameOutcome::PhraseStarted);
        for _ in 0..2 {
            detector.push_frame(&frame(0.5));
        }
        detector.push_frame(&frame(0.0));
        detector.push_frame(&frame(0.0));
        assert_eq!(detector.push_frame(&frame(0.0)), FrameOutcome::PhraseComplete);
    }

    #[test]
    fn phrase_time_limit_ends_long_phrases() {
        let mut detector = EndpointDetector::new(
            CaptureConfig {
                phrase_time_limit_secs: Some(0.3),
                ..config()
            },
            RATE,
        );
        assert_eq!(detector.push_frame(&frame(0.5)), FrameOutcome::PhraseStarted);
        assert_eq!(detector.push_frame(&frame(0.5)), FrameOutcome::InPhrase);
        assert_eq!(detector.push_frame(&frame(0.5)), FrameOutcome::PhraseComplete);
    }

    #[test]
    fn dynamic_calibration_raises_threshold_above_ambient() {
        let mut detector = EndpointDetector::new(
            CaptureConfig {
                dynamic_energy_threshold: true,
                calibration_duration_secs: 0.2,
                ..config()
            },
            RATE,
        );

        // Noisy room: ambient RMS ~= 0.2 * i16::MAX.
        assert_eq!(detector.push_frame(&frame(0.2)), FrameOutcome::Calibrating);
        assert_eq!(detector.push_frame(&frame(0.2)), FrameOutcome::Calibrating);

        let ambient = 0.2 * f32::from(i16::MAX);
        let expected = ambient * DYNAMIC_ENERGY_RATIO;
        assert!((detector.effective_threshold() - expected).abs() < 1.0);

        // Slightly above ambient is still silence; well above it is speech.
        assert_eq!(
            detector.push_frame(&frame(0.25)),
            FrameOutcome::WaitingForSpeech
        );
        assert_eq!(detector.push_frame(&frame(0.5)), FrameOutcome::PhraseStarted);
    }

    #[test]
    fn static_threshold_is_kept_when_dynamic_is_off() {
        let mut detector = EndpointDetector::new(
            CaptureConfig {
                calibration_duration_secs: 0.2,
                ..config()
            },
            RATE,
        );
        detector.push_frame(&frame(0.2));
        detector.push_frame(&frame(0.2));
        assert_eq!(detector.effective_threshold(), 2000.0);
    }
}
