//! Credential lookup for remote providers.
//!
//! An environment variable always wins; the OS keyring (service
//! "voxloop", username = the same variable name) is the fallback so a
//! key survives across shells without living in a dotfile. Key material
//! is never logged.

use keyring::Entry;

use crate::providers::{LlmProvider, SttProvider, TtsProvider};

const SERVICE_NAME: &str = "voxloop";

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const GROQ_API_KEY: &str = "GROQ_API_KEY";
pub const DEEPGRAM_API_KEY: &str = "DEEPGRAM_API_KEY";
pub const ELEVENLABS_API_KEY: &str = "ELEVENLABS_API_KEY";
pub const CARTESIA_API_KEY: &str = "CARTESIA_API_KEY";

fn lookup(var: &str) -> Option<String> {
    if let Ok(value) = std::env::var(var) {
        if !value.trim().is_empty() {
            log::debug!("Using {} from environment", var);
            return Some(value);
        }
    }

    match Entry::new(SERVICE_NAME, var) {
        Ok(entry) => match entry.get_password() {
            Ok(value) => {
                log::debug!("Using {} from system keyring", var);
                Some(value)
            }
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                log::warn!("Keyring lookup for {} failed: {}", var, e);
                None
            }
        },
        Err(e) => {
            log::warn!("Keyring unavailable for {}: {}", var, e);
            None
        }
    }
}

pub fn transcription_api_key(provider: SttProvider) -> Option<String> {
    match provider {
        SttProvider::OpenAi => lookup(OPENAI_API_KEY),
        SttProvider::Groq => lookup(GROQ_API_KEY),
        SttProvider::Deepgram => lookup(DEEPGRAM_API_KEY),
        SttProvider::Local => None,
    }
}

pub fn generation_api_key(provider: LlmProvider) -> Option<String> {
    match provider {
        LlmProvider::OpenAi => lookup(OPENAI_API_KEY),
        LlmProvider::Groq => lookup(GROQ_API_KEY),
        LlmProvider::Local => None,
    }
}

pub fn synthesis_api_key(provider: TtsProvider) -> Option<String> {
    match provider {
        TtsProvider::OpenAi => lookup(OPENAI_API_KEY),
        TtsProvider::Deepgram => lookup(DEEPGRAM_API_KEY),
        TtsProvider::ElevenLabs => lookup(ELEVENLABS_API_KEY),
        TtsProvider::MeloTts => None,
        TtsProvider::Cartesia => lookup(CARTESIA_API_KEY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-global, so each test uses a variable no other
    // test touches.

    #[test]
    fn env_var_wins() {
        std::env::set_var("VOXLOOP_TEST_KEY_A", "sk-from-env");
        assert_eq!(lookup("VOXLOOP_TEST_KEY_A"), Some("sk-from-env".to_string()));
        std::env::remove_var("VOXLOOP_TEST_KEY_A");
    }

    #[test]
    fn blank_env_var_is_ignored() {
        std::env::set_var("VOXLOOP_TEST_KEY_B", "   ");
        // Falls through to the keyring, which has no such entry.
        assert_eq!(lookup("VOXLOOP_TEST_KEY_B"), None);
        std::env::remove_var("VOXLOOP_TEST_KEY_B");
    }

    #[test]
    fn local_providers_need_no_key() {
        assert_eq!(transcription_api_key(SttProvider::Local), None);
        assert_eq!(generation_api_key(LlmProvider::Local), None);
        assert_eq!(synthesis_api_key(TtsProvider::MeloTts), None);
    }
}
