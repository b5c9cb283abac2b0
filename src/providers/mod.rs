//! Provider gateway: pluggable backends for transcription, response
//! generation, and speech synthesis.
//!
//! Each concern is a trait object built from config by the factory
//! functions at the bottom of this module. Remote backends look up
//! credentials through [`crate::api_keys`]; the `local` kind targets
//! localhost servers and needs none.

pub mod cartesia;
pub mod deepgram;
pub mod elevenlabs;
pub mod groq;
mod http;
pub mod local;
pub mod openai;

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api_keys;
use crate::config::Config;
use crate::conversation::Conversation;

#[derive(Debug)]
pub enum ProviderError {
    /// No credential found in the environment or the OS keyring.
    MissingApiKey(&'static str),
    Network(String),
    Api { status: u16, message: String },
    Parse(String),
    Io(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::MissingApiKey(var) => write!(
                f,
                "no API key found: set {} or store it in the system keyring",
                var
            ),
            ProviderError::Network(msg) => write!(f, "network error: {}", msg),
            ProviderError::Api { status, message } => {
                write!(f, "API error (status {}): {}", status, message)
            }
            ProviderError::Parse(msg) => write!(f, "failed to parse response: {}", msg),
            ProviderError::Io(msg) => write!(f, "audio file error: {}", msg),
        }
    }
}

impl Error for ProviderError {}

/// Converts recorded speech to text. An empty string is a valid result
/// meaning nothing intelligible was said.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<String, ProviderError>;
}

/// Produces the assistant's next reply from the conversation so far.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, conversation: &Conversation) -> Result<String, ProviderError>;
}

/// Renders reply text to an audio file at `output`.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<PathBuf, ProviderError>;

    /// File extension the backend produces, without the dot.
    fn output_extension(&self) -> &'static str;

    /// True when synthesis already played the audio and the caller must
    /// not play the file again.
    fn plays_own_audio(&self) -> bool {
        false
    }
}

macro_rules! provider_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "unknown {} '{}' (expected one of: {})",
                        stringify!($name),
                        other,
                        [$($text),+].join(", ")
                    )),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let text = match self {
                    $($name::$variant => $text),+
                };
                f.write_str(text)
            }
        }
    };
}

provider_enum! {
    /// Speech-to-text backend.
    SttProvider {
        OpenAi => "openai",
        Groq => "groq",
        Deepgram => "deepgram",
        Local => "local",
    }
}

provider_enum! {
    /// Response-generation backend.
    LlmProvider {
        OpenAi => "openai",
        Groq => "groq",
        Local => "local",
    }
}

provider_enum! {
    /// Text-to-speech backend.
    TtsProvider {
        OpenAi => "openai",
        Deepgram => "deepgram",
        ElevenLabs => "elevenlabs",
        MeloTts => "melotts",
        Cartesia => "cartesia",
    }
}

impl TtsProvider {
    /// Extension of the audio file each backend writes. Deepgram is the
    /// only backend returning uncompressed WAV; everything else streams
    /// MP3.
    pub fn output_extension(self) -> &'static str {
        match self {
            TtsProvider::Deepgram => "wav",
            TtsProvider::OpenAi
            | TtsProvider::ElevenLabs
            | TtsProvider::MeloTts
            | TtsProvider::Cartesia => "mp3",
        }
    }

    pub fn plays_own_audio(self) -> bool {
        matches!(self, TtsProvider::Cartesia)
    }
}

/// Writes synthesized audio bytes to disk, mapping failures into
/// [`ProviderError::Io`].
pub(crate) async fn write_audio_file(path: &Path, bytes: &[u8]) -> Result<(), ProviderError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| ProviderError::Io(format!("failed to write {}: {}", path.display(), e)))
}

fn require_key(key: Option<String>, env_var: &'static str) -> Result<String, ProviderError> {
    key.ok_or(ProviderError::MissingApiKey(env_var))
}

pub fn build_transcriber(config: &Config) -> Result<Box<dyn Transcriber>, ProviderError> {
    let provider = config.stt_provider;
    let key = api_keys::transcription_api_key(provider);
    Ok(match provider {
        SttProvider::OpenAi => Box::new(openai::OpenAiTranscriber::new(require_key(
            key,
            "OPENAI_API_KEY",
        )?)),
        SttProvider::Groq => Box::new(groq::transcriber(require_key(key, "GROQ_API_KEY")?)),
        SttProvider::Deepgram => Box::new(deepgram::DeepgramTranscriber::new(require_key(
            key,
            "DEEPGRAM_API_KEY",
        )?)),
        SttProvider::Local => Box::new(local::LocalTranscriber::new(config.local_stt_url.clone())),
    })
}

pub fn build_generator(config: &Config) -> Result<Box<dyn Generator>, ProviderError> {
    let provider = config.llm_provider;
    let key = api_keys::generation_api_key(provider);
    Ok(match provider {
        LlmProvider::OpenAi => Box::new(openai::OpenAiGenerator::new(require_key(
            key,
            "OPENAI_API_KEY",
        )?)),
        LlmProvider::Groq => Box::new(groq::generator(require_key(key, "GROQ_API_KEY")?)),
        LlmProvider::Local => Box::new(local::generator(config.local_llm_url.clone())),
    })
}

pub fn build_synthesizer(config: &Config) -> Result<Box<dyn Synthesizer>, ProviderError> {
    let provider = config.tts_provider;
    let key = api_keys::synthesis_api_key(provider);
    Ok(match provider {
        TtsProvider::OpenAi => Box::new(openai::OpenAiSynthesizer::new(require_key(
            key,
            "OPENAI_API_KEY",
        )?)),
        TtsProvider::Deepgram => Box::new(deepgram::DeepgramSynthesizer::new(require_key(
            key,
            "DEEPGRAM_API_KEY",
        )?)),
        TtsProvider::ElevenLabs => Box::new(elevenlabs::ElevenLabsSynthesizer::new(require_key(
            key,
            "ELEVENLABS_API_KEY",
        )?)),
        TtsProvider::MeloTts => {
            Box::new(local::MeloTtsSynthesizer::new(config.local_tts_url.clone()))
        }
        TtsProvider::Cartesia => Box::new(cartesia::CartesiaSynthesizer::new(require_key(
            key,
            "CARTESIA_API_KEY",
        )?)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_round_trip() {
        assert_eq!("openai".parse::<SttProvider>().unwrap(), SttProvider::OpenAi);
        assert_eq!("GROQ".parse::<SttProvider>().unwrap(), SttProvider::Groq);
        assert_eq!("local".parse::<LlmProvider>().unwrap(), LlmProvider::Local);
        assert_eq!(
            "elevenlabs".parse::<TtsProvider>().unwrap(),
            TtsProvider::ElevenLabs
        );
        assert_eq!(TtsProvider::MeloTts.to_string(), "melotts");
    }

    #[test]
    fn unknown_provider_name_is_rejected() {
        let err = "whisperx".parse::<SttProvider>().unwrap_err();
        assert!(err.contains("whisperx"));
        assert!(err.contains("openai"));
    }

    #[test]
    fn only_deepgram_synthesizes_wav() {
        assert_eq!(TtsProvider::Deepgram.output_extension(), "wav");
        for provider in [
            TtsProvider::OpenAi,
            TtsProvider::ElevenLabs,
            TtsProvider::MeloTts,
            TtsProvider::Cartesia,
        ] {
            assert_eq!(provider.output_extension(), "mp3");
        }
    }

    #[test]
    fn only_cartesia_plays_its_own_audio() {
        assert!(TtsProvider::Cartesia.plays_own_audio());
        assert!(!TtsProvider::OpenAi.plays_own_audio());
        assert!(!TtsProvider::Deepgram.plays_own_audio());
    }

    #[test]
    fn missing_key_error_names_the_env_var() {
        let err = ProviderError::MissingApiKey("OPENAI_API_KEY");
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn provider_serde_uses_lowercase() {
        let json = serde_json::to_string(&TtsProvider::ElevenLabs).unwrap();
        assert_eq!(json, "\"elevenlabs\"");
        let parsed: SttProvider = serde_json::from_str("\"deepgram\"").unwrap();
        assert_eq!(parsed, SttProvider::Deepgram);
    }
}
