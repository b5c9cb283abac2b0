//! Groq backends.
//!
//! Groq exposes an OpenAI-compatible API surface, so transcription and chat
//! reuse the OpenAI clients pointed at the Groq endpoint.

use super::openai::{OpenAiGenerator, OpenAiTranscriber};

pub(crate) const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

const STT_MODEL: &str = "whisper-large-v3";
const LLM_MODEL: &str = "llama3-8b-8192";

pub fn transcriber(api_key: String) -> OpenAiTranscriber {
    OpenAiTranscriber::with_base_url(GROQ_BASE_URL, Some(api_key), STT_MODEL)
}

pub fn generator(api_key: String) -> OpenAiGenerator {
    OpenAiGenerator::with_base_url(GROQ_BASE_URL, Some(api_key), LLM_MODEL)
}
