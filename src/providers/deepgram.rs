//! Deepgram backends: prerecorded transcription and Aura speech synthesis.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::providers::http::{error_from_response, http_client};
use crate::providers::{write_audio_file, ProviderError, Synthesizer, Transcriber, TtsProvider};

const LISTEN_URL: &str = "https://api.deepgram.com/v1/listen?model=nova-2&smart_format=true";
const SPEAK_URL: &str =
    "https://api.deepgram.com/v1/speak?model=aura-asteria-en&encoding=linear16&container=wav";

pub struct DeepgramTranscriber {
    api_key: String,
}

impl DeepgramTranscriber {
    pub fn new(api_key: String) -> Self {
        Self { api_key }
    }
}

#[derive(Debug, Deserialize)]
struct ListenResponse {
    results: ListenResults,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    channels: Vec<ListenChannel>,
}

#[derive(Debug, Deserialize)]
struct ListenChannel {
    alternatives: Vec<ListenAlternative>,
}

#[derive(Debug, Deserialize)]
struct ListenAlternative {
    transcript: String,
}

#[async_trait]
impl Transcriber for DeepgramTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<String, ProviderError> {
        let file_bytes = tokio::fs::read(audio)
            .await
            .map_err(|e| ProviderError::Io(e.to_string()))?;

        log::info!("Transcribing audio file: {:?} ({} bytes)", audio, file_bytes.len());

        let response = http_client()
            .post(LISTEN_URL)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/wav")
            .body(file_bytes)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let parsed: ListenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        // An empty transcript is a valid "no input" outcome, not an error.
        let transcript = parsed
            .results
            .channels
            .into_iter()
            .next()
            .and_then(|channel| channel.alternatives.into_iter().next())
            .map(|alternative| alternative.transcript)
            .unwrap_or_default();

        Ok(transcript)
    }
}

pub struct DeepgramSynthesizer {
    api_key: String,
}

impl DeepgramSynthesizer {
    pub fn new(api_key: String) -> Self {
        Self { api_key }
    }
}

#[derive(Debug, Serialize)]
struct SpeakRequest<'a> {
    text: &'a str,
}

#[async_trait]
impl Synthesizer for DeepgramSynthesizer {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<PathBuf, ProviderError> {
        let response = http_client()
            .post(SPEAK_URL)
            .header("Authorization", format!("Token {}", self.api_key))
            .json(&SpeakRequest { text })
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
        TtsProvider::Deepgram.output_extension()
    }
}
