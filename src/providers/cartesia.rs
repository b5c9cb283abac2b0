//! Cartesia speech synthesis.
//!
//! Cartesia delivery plays the audio as part of synthesis, so the
//! orchestrator must not run its own playback afterwards
//! (`plays_own_audio` returns true).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use crate::audio::{Player, Speaker};
use crate::providers::http::{error_from_response, http_client};
use crate::providers::{write_audio_file, ProviderError, Synthesizer, TtsProvider};

const TTS_URL: &str = "https://api.cartesia.ai/tts/bytes";
const API_VERSION: &str = "2024-06-10";
const MODEL_ID: &str = "sonic-english";

/// Stock "Barbershop Man" voice.
const DEFAULT_VOICE_ID: &str = "a0e99841-438c-4a64-b679-ae501e7d6091";

pub struct CartesiaSynthesizer {
    api_key: String,
    voice_id: String,
}

impl CartesiaSynthesizer {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            voice_id: DEFAULT_VOICE_ID.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    model_id: &'a str,
    transcript: &'a str,
    voice: TtsVoice<'a>,
    output_format: TtsOutputFormat<'a>,
}

#[derive(Debug, Serialize)]
struct TtsVoice<'a> {
    mode: &'a str,
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct TtsOutputFormat<'a> {
    container: &'a str,
    bit_rate: u32,
    sample_rate: u32,
}

#[async_trait]
impl Synthesizer for CartesiaSynthesizer {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<PathBuf, ProviderError> {
        let body = TtsRequest {
            model_id: MODEL_ID,
            transcript: text,
            voice: TtsVoice {
                mode: "id",
                id: &self.voice_id,
            },
            output_format: TtsOutputFormat {
                container: "mp3",
                bit_rate: 128_000,
                sample_rate: 44_100,
            },
        };

        let response = http_client()
            .post(TTS_URL)
            .header("X-API-Key", &self.api_key)
            .header("Cartesia-Version", API_VERSION)
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

        // Delivery includes playback; a failure to play is non-fatal since
        // the audio file already exists.
        let path = output.to_path_buf();
        match tokio::task::spawn_blocking(move || Speaker::new().play(&path)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("Cartesia playback failed: {}", e),
            Err(e) => log::warn!("Cartesia playback task failed: {}", e),
        }

        Ok(output.to_path_buf())
    }

    fn output_extension(&self) -> &'static str {
        TtsProvider::Cartesia.output_extension()
    }

    fn plays_own_audio(&self) -> bool {
        true
    }
}
