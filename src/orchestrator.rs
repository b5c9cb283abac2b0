//! Turn orchestration.
//!
//! Drives the conversation loop: capture speech, transcribe it, check
//! for an exit phrase, generate a reply, synthesize it, and play it
//! back. Each pass through the loop is one turn; a failed turn logs the
//! error, deletes the turn's audio artifacts, backs off briefly, and
//! the loop starts a fresh turn.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::{delete_file, Player, Recorder};
use crate::conversation::Conversation;
use crate::providers::{Generator, ProviderError, Synthesizer, Transcriber};

/// Phrases that end the session. Matched case-insensitively as
/// substrings of the raw transcription, before it is added to the
/// conversation.
const EXIT_PHRASES: &[&str] = &["goodbye", "arrivederci"];

const CAPTURE_FILE: &str = "input.wav";
const OUTPUT_STEM: &str = "output";

const RECOVERY_BACKOFF: Duration = Duration::from_secs(1);

pub fn is_exit_phrase(transcription: &str) -> bool {
    let lowered = transcription.to_lowercase();
    EXIT_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}

/// Outcome of a single turn.
#[derive(Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A full exchange happened: reply generated and delivered.
    Completed,
    /// Nothing usable was captured; listen again without touching the
    /// conversation.
    Retry,
    /// The user said an exit phrase.
    Exit,
}

#[derive(Debug)]
pub enum TurnError {
    Transcription(ProviderError),
    Generation(ProviderError),
    Synthesis(ProviderError),
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::Transcription(e) => write!(f, "transcription failed: {}", e),
            TurnError::Generation(e) => write!(f, "response generation failed: {}", e),
            TurnError::Synthesis(e) => write!(f, "speech synthesis failed: {}", e),
        }
    }
}

impl Error for TurnError {}

pub struct Orchestrator {
    transcriber: Box<dyn Transcriber>,
    generator: Box<dyn Generator>,
    synthesizer: Box<dyn Synthesizer>,
    recorder: Box<dyn Recorder>,
    player: Box<dyn Player>,
    conversation: Conversation,
    audio_dir: PathBuf,
    delete_audio: bool,
    current_capture: Option<PathBuf>,
    current_output: Option<PathBuf>,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transcriber: Box<dyn Transcriber>,
        generator: Box<dyn Generator>,
        synthesizer: Box<dyn Synthesizer>,
        recorder: Box<dyn Recorder>,
        player: Box<dyn Player>,
        system_prompt: &str,
        audio_dir: PathBuf,
        delete_audio: bool,
    ) -> Self {
        Self {
            transcriber,
            generator,
            synthesizer,
            recorder,
            player,
            conversation: Conversation::new(system_prompt),
            audio_dir,
            delete_audio,
            current_capture: None,
            current_output: None,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Runs turns until the user says an exit phrase.
    pub async fn run(&mut self) {
        loop {
            match self.run_turn().await {
                Ok(TurnOutcome::Exit) => {
                    log::info!("Exit phrase detected, ending session");
                    break;
                }
                Ok(_) => {}
                Err(e) => self.recover(e).await,
            }
        }
    }

    /// One pass of the conversation loop.
    pub async fn run_turn(&mut self) -> Result<TurnOutcome, TurnError> {
        self.current_capture = None;
        self.current_output = None;

        let destination = self.audio_dir.join(CAPTURE_FILE);
        let Some(capture_path) = self.recorder.record(&destination) else {
            log::error!("Failed to capture audio, listening again");
            return Ok(TurnOutcome::Retry);
        };
        self.current_capture = Some(capture_path.clone());

        let transcription = self
            .transcriber
            .transcribe(&capture_path)
            .await
            .map_err(TurnError::Transcription)?;

        // Silence is a valid outcome, not an error: just listen again.
        if transcription.trim().is_empty() {
            log::info!("Heard nothing, listening again");
            return Ok(TurnOutcome::Retry);
        }

        log::info!("You said: {}", transcription);

        // Checked against the raw transcription before it enters the
        // conversation, so the farewell itself is never sent to the LLM.
        if is_exit_phrase(&transcription) {
            return Ok(TurnOutcome::Exit);
        }

        self.conversation.push_user(transcription);

        let reply = self
            .generator
            .generate(&self.conversation)
            .await
            .map_err(TurnError::Generation)?;

        log::info!("Response: {}", reply);
        self.conversation.push_assistant(reply.clone());

        let output_path = self
            .audio_dir
            .join(OUTPUT_STEM)
            .with_extension(self.synthesizer.output_extension());
        self.current_output = Some(output_path.clone());

        self.synthesizer
            .synthesize(&reply, &output_path)
            .await
            .map_err(TurnError::Synthesis)?;

        if self.synthesizer.plays_own_audio() {
            log::debug!("Synthesizer handles its own playback, skipping");
        } else if let Err(e) = self.player.play(&output_path) {
            // The exchange already happened; a playback failure only
            // costs this reply's audio.
            log::warn!("Playback failed: {}", e);
        }

        if self.delete_audio {
            delete_file(&capture_path);
            delete_file(&output_path);
            self.current_capture = None;
            self.current_output = None;
        }

        Ok(TurnOutcome::Completed)
    }

    /// Logs the failure, removes the turn's audio artifacts, and backs
    /// off before the next attempt.
    async fn recover(&mut self, error: TurnError) {
        log::error!("Turn failed: {}", error);

        if let Some(path) = self.current_capture.take() {
            delete_file(&path);
        }
        if let Some(path) = self.current_output.take() {
            delete_file(&path);
        }

        tokio::time::sleep(RECOVERY_BACKOFF).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_phrase_matches_case_insensitively() {
        assert!(is_exit_phrase("Goodbye"));
        assert!(is_exit_phrase("GOODBYE"));
        assert!(is_exit_phrase("arrivederci"));
    }

    #[test]
    fn exit_phrase_matches_as_substring() {
        assert!(is_exit_phrase("Okay then, goodbye for now."));
        assert!(is_exit_phrase("Arrivederci, my friend!"));
    }

    #[test]
    fn ordinary_speech_is_not_an_exit() {
        assert!(!is_exit_phrase("What organic fertilizers are available?"));
        assert!(!is_exit_phrase(""));
        assert!(!is_exit_phrase("good buy"));
    }
}
