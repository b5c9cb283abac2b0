//! OpenAI backends: Whisper transcription, chat completions, and speech
//! synthesis.
//!
//! The structs take an explicit base URL so any OpenAI-compatible service
//! (Groq, a local Ollama server) can reuse them; `new` targets the real
//! OpenAI endpoint. A `None` API key skips the Authorization header for
//! local servers that don't check one.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::conversation::{Conversation, Turn};
use crate::providers::http::{error_from_response, http_client};
use crate::providers::{write_audio_file, Generator, ProviderError, Synthesizer, Transcriber, TtsProvider};

pub(crate) const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

const DEFAULT_STT_MODEL: &str = "whisper-1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o";
const DEFAULT_TTS_MODEL: &str = "tts-1";
const DEFAULT_TTS_VOICE: &str = "nova";

// ---------------------------------------------------------------------------
// Transcription
// ---------------------------------------------------------------------------

pub struct OpenAiTranscriber {
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiTranscriber {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(OPENAI_BASE_URL, Some(api_key), DEFAULT_STT_MODEL)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            model: model.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<String, ProviderError> {
        let file_bytes = tokio::fs::read(audio)
            .await
            .map_err(|e| ProviderError::Io(e.to_string()))?;

        let filename = audio
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        log::info!(
            "Transcribing audio file: {} ({} bytes)",
            filename,
            file_bytes.len()
        );

        let file_part = Part::bytes(file_bytes)
            .file_name(filename)
            .mime_str("audio/wav")
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let form = Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "json")
            .text("temperature", "0");

        let mut request = http_client()
            .post(format!("{}/audio/transcriptions", self.base_url))
            .multipart(form);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
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

        log::debug!("Transcription successful: {} chars", parsed.text.len());
        Ok(parsed.text)
    }
}

// ---------------------------------------------------------------------------
// Response generation
// ---------------------------------------------------------------------------

pub struct OpenAiGenerator {
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(OPENAI_BASE_URL, Some(api_key), DEFAULT_LLM_MODEL)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            model: model.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, conversation: &Conversation) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            messages: conversation.turns(),
        };

        let mut request = http_client()
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ProviderError::Parse("chat response contained no message content".to_string())
            })
    }
}

// ---------------------------------------------------------------------------
// Speech synthesis
// ---------------------------------------------------------------------------

pub struct OpenAiSynthesizer {
    api_key: String,
    model: String,
    voice: String,
}

impl OpenAiSynthesizer {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: DEFAULT_TTS_MODEL.to_string(),
            voice: DEFAULT_TTS_VOICE.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
}

#[async_trait]
impl Synthesizer for OpenAiSynthesizer {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<PathBuf, ProviderError> {
        let body = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
        };

        let response = http_client()
            .post(format!("{}/audio/speech", OPENAI_BASE_URL))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
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
        TtsProvider::OpenAi.output_extension()
    }
}
