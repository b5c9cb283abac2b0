//! ElevenLabs speech synthesis.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use crate::providers::http::{error_from_response, http_client};
use crate::providers::{write_audio_file, ProviderError, Synthesizer, TtsProvider};

const TTS_BASE_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";
const MODEL_ID: &str = "eleven_turbo_v2";

/// Stock "Rachel" voice.
const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

pub struct ElevenLabsSynthesizer {
    api_key: String,
    voice_id: String,
}

impl ElevenLabsSynthesizer {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            voice_id: DEFAULT_VOICE_ID.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

#[async_trait]
impl Synthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<PathBuf, ProviderError> {
        let response = http_client()
            .post(format!("{}/{}", TTS_BASE_URL, self.voice_id))
            .header("xi-api-key", &self.api_key)
            .json(&TtsRequest {
                text,
                model_id: MODEL_ID,
            })
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
        TtsProvider::ElevenLabs.output_extension()
    }
}
