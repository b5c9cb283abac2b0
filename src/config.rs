//! Application configuration.
//!
//! Loaded from `$XDG_CONFIG_HOME/voxloop/config.json`; a missing file
//! means defaults, and a file that fails to parse logs a warning and
//! falls back to defaults rather than aborting. Environment variables
//! override the file, and CLI flags override both (see [`crate::cli`]).

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::audio::CaptureConfig;
use crate::providers::{LlmProvider, SttProvider, TtsProvider};

const CONFIG_DIR: &str = "voxloop";
const CONFIG_FILE: &str = "config.json";

const DEFAULT_LOCAL_STT_URL: &str = "http://localhost:8000";
const DEFAULT_LOCAL_LLM_URL: &str = "http://localhost:11434/v1";
const DEFAULT_LOCAL_TTS_URL: &str = "http://localhost:8888";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant called AgroImperial from \
Innovation Imperial. You are friendly and professional, and you understand everything about \
farming from production to business, including organic regulations, laws, permits, and \
certifications, especially in inter-African trade and organic farming. Your answers are \
insightful but short, summarized as clean plain text. Do not put asterisks in the response.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub stt_provider: SttProvider,
    pub llm_provider: LlmProvider,
    pub tts_provider: TtsProvider,
    pub local_stt_url: String,
    pub local_llm_url: String,
    pub local_tts_url: String,
    pub system_prompt: String,
    /// Delete each turn's audio files after the turn completes.
    pub delete_audio: bool,
    pub capture: CaptureConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stt_provider: SttProvider::OpenAi,
            llm_provider: LlmProvider::OpenAi,
            tts_provider: TtsProvider::OpenAi,
            local_stt_url: DEFAULT_LOCAL_STT_URL.to_string(),
            local_llm_url: DEFAULT_LOCAL_LLM_URL.to_string(),
            local_tts_url: DEFAULT_LOCAL_TTS_URL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            delete_audio: false,
            capture: CaptureConfig::default(),
        }
    }
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Loads the config file, falling back to defaults when it is
    /// missing or malformed.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            log::warn!("Could not determine config directory, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse {}: {}. Using defaults",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("Failed to read {}: {}. Using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Applies `VOXLOOP_*` environment variable overrides on top of the
    /// file-based config. Unparseable values log a warning and leave the
    /// existing setting in place.
    pub fn apply_env_overrides(&mut self) {
        override_parsed("VOXLOOP_STT_PROVIDER", &mut self.stt_provider);
        override_parsed("VOXLOOP_LLM_PROVIDER", &mut self.llm_provider);
        override_parsed("VOXLOOP_TTS_PROVIDER", &mut self.tts_provider);
        override_string("VOXLOOP_LOCAL_STT_URL", &mut self.local_stt_url);
        override_string("VOXLOOP_LOCAL_LLM_URL", &mut self.local_llm_url);
        override_string("VOXLOOP_LOCAL_TTS_URL", &mut self.local_tts_url);
        override_string("VOXLOOP_SYSTEM_PROMPT", &mut self.system_prompt);
    }
}

fn override_parsed<T: FromStr<Err = String>>(var: &str, slot: &mut T) {
    if let Ok(value) = std::env::var(var) {
        match value.parse() {
            Ok(parsed) => *slot = parsed,
            Err(e) => log::warn!("Ignoring {}: {}", var, e),
        }
    }
}

fn override_string(var: &str, slot: &mut String) {
    if let Ok(value) = std::env::var(var) {
        if !value.trim().is_empty() {
            *slot = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_openai() {
        let config = Config::default();
        assert_eq!(config.stt_provider, SttProvider::OpenAi);
        assert_eq!(config.llm_provider, LlmProvider::OpenAi);
        assert_eq!(config.tts_provider, TtsProvider::OpenAi);
        assert!(!config.delete_audio);
    }

    #[test]
    fn partial_config_file_fills_in_defaults() {
        let config: Config = serde_json::from_str(r#"{"tts_provider": "deepgram"}"#).unwrap();
        assert_eq!(config.tts_provider, TtsProvider::Deepgram);
        assert_eq!(config.stt_provider, SttProvider::OpenAi);
        assert_eq!(config.local_llm_url, DEFAULT_LOCAL_LLM_URL);
    }

    #[test]
    fn config_round_trips_through_json() {
        let mut config = Config::default();
        config.stt_provider = SttProvider::Groq;
        config.delete_audio = true;
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.stt_provider, SttProvider::Groq);
        assert!(parsed.delete_audio);
    }

    #[test]
    fn env_override_replaces_provider() {
        let mut config = Config::default();
        std::env::set_var("VOXLOOP_TTS_PROVIDER", "elevenlabs");
        config.apply_env_overrides();
        std::env::remove_var("VOXLOOP_TTS_PROVIDER");
        assert_eq!(config.tts_provider, TtsProvider::ElevenLabs);
    }

    #[test]
    fn invalid_env_override_is_ignored() {
        let mut config = Config::default();
        std::env::set_var("VOXLOOP_STT_PROVIDER", "not-a-provider");
        config.apply_env_overrides();
        std::env::remove_var("VOXLOOP_STT_PROVIDER");
        assert_eq!(config.stt_provider, SttProvider::OpenAi);
    }
}
