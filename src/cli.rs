//! Command-line interface and logging setup.

use clap::Parser;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "voxloop", version, about = "Voice-driven conversational assistant")]
pub struct Args {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Silence all log output
    #[arg(short, long)]
    pub quiet: bool,

    /// Speech-to-text provider (openai, groq, deepgram, local)
    #[arg(long)]
    pub stt: Option<String>,

    /// Response-generation provider (openai, groq, local)
    #[arg(long)]
    pub llm: Option<String>,

    /// Text-to-speech provider (openai, deepgram, elevenlabs, melotts, cartesia)
    #[arg(long)]
    pub tts: Option<String>,

    /// Delete each turn's audio files once the turn completes
    #[arg(long)]
    pub delete_audio: bool,
}

impl Args {
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Off;
        }
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    /// Applies CLI flags on top of the loaded config. Invalid provider
    /// names warn and keep the configured value.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(stt) = &self.stt {
            match stt.parse() {
                Ok(provider) => config.stt_provider = provider,
                Err(e) => log::warn!("Ignoring --stt: {}", e),
            }
        }
        if let Some(llm) = &self.llm {
            match llm.parse() {
                Ok(provider) => config.llm_provider = provider,
                Err(e) => log::warn!("Ignoring --llm: {}", e),
            }
        }
        if let Some(tts) = &self.tts {
            match tts.parse() {
                Ok(provider) => config.tts_provider = provider,
                Err(e) => log::warn!("Ignoring --tts: {}", e),
            }
        }
        if self.delete_audio {
            config.delete_audio = true;
        }
    }
}

pub fn init_logging(level: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .filter_module("voxloop", level)
        .format_timestamp_millis()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{LlmProvider, SttProvider, TtsProvider};

    fn parse(args: &[&str]) -> Args {
        Args::parse_from(std::iter::once("voxloop").chain(args.iter().copied()))
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(parse(&[]).log_level(), log::LevelFilter::Info);
        assert_eq!(parse(&["-v"]).log_level(), log::LevelFilter::Debug);
        assert_eq!(parse(&["-vvv"]).log_level(), log::LevelFilter::Trace);
        assert_eq!(parse(&["-q"]).log_level(), log::LevelFilter::Off);
    }

    #[test]
    fn provider_flags_override_config() {
        let args = parse(&["--stt", "groq", "--llm", "local", "--tts", "cartesia"]);
        let mut config = Config::default();
        args.apply_to(&mut config);
        assert_eq!(config.stt_provider, SttProvider::Groq);
        assert_eq!(config.llm_provider, LlmProvider::Local);
        assert_eq!(config.tts_provider, TtsProvider::Cartesia);
    }

    #[test]
    fn invalid_provider_flag_keeps_config_value() {
        let args = parse(&["--tts", "bogus"]);
        let mut config = Config::default();
        args.apply_to(&mut config);
        assert_eq!(config.tts_provider, TtsProvider::OpenAi);
    }

    #[test]
    fn delete_audio_flag_sets_config() {
        let args = parse(&["--delete-audio"]);
        let mut config = Config::default();
        args.apply_to(&mut config);
        assert!(config.delete_audio);
    }
}
