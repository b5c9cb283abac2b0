//! Offline backends served over localhost HTTP.
//!
//! The `local` provider kind bypasses remote credential lookup: these
//! clients target a configurable localhost base URL (the local model
//! reference) and send no Authorization header.
//!
//! Transcription expects a FastWhisperAPI-style server, generation an
//! Ollama server (via its OpenAI-compatible endpoint), and synthesis a
//! MeloTTS server.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use super::openai::OpenAiGenerator;
use crate::providers::http::{error_from_response, http_client};
use crate::providers::{write_audio_file, ProviderError, Synthesizer, Transcriber, TtsProvider};

const WHISPER_MODEL: &str = "base";
const OLLAMA_MODEL: &str = "llama3:8b";

/// Transcription against a FastWhisperAPI server.
pub struct LocalTranscriber {
    base_url: String,
}

impl LocalTranscriber {
    pub fn new(base_url: String) -> Self {
        Self { base_url }
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[async_trait]
impl Transcriber for LocalTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<String, ProviderError> {
        let file_bytes = tokio::fs::read(audio)
            .await
            .map_err(|e| ProviderError::Io(e.to_string()))?;

        let filename = audio
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let file_part = Part::bytes(file_bytes)
            .file_name(filename)
            .mime_str("audio/wav")
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let form = Form::new()
            .part("file", file_part)
            .text("model", WHISPER_MODEL)
            .text("response_format", "json");

        let response = http_client()
            .post(format!("{}/v1/transcriptions", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(parsed.text)
    }
}

/// Generation against an Ollama server's OpenAI-compatible endpoint.
pub fn generator(base_url: String) -> OpenAiGenerator {
    OpenAiGenerator::with_base_url(base_url, None, OLLAMA_MODEL)
}

/// Synthesis against a MeloTTS server.
pub struct MeloTtsSynthesizer {
    base_url: String,
}

impl MeloTtsSynthesizer {
    pub fn new(base_url: String) -> Self {
        Self { base_url }
    }
}

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
}

#[async_trait]
impl Synthesizer for MeloTtsSynthesizer {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<PathBuf, ProviderError> {
        let response = http_client()
            .post(format!("{}/convert/tts", self.base_url))
            .json(&TtsRequest { text })
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        write_audio_file(output, &bytes).await?;
        Ok(output.to_path_buf())
    }

    fn output_extension(&self) -> &'static str {
        TtsProvider::MeloTts.output_extension()
    }
}
