//! voxloop: a voice-driven conversational assistant.
//!
//! Captures an utterance from the microphone, transcribes it, feeds the
//! conversation to an LLM, and speaks the reply, looping until the user
//! says goodbye. Speech-to-text, generation, and synthesis backends are
//! all pluggable.

pub mod api_keys;
pub mod audio;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod orchestrator;
pub mod providers;
