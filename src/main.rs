use clap::Parser;

use voxloop::audio::{create_audio_dir, Microphone, Speaker};
use voxloop::cli::{self, Args};
use voxloop::config::Config;
use voxloop::orchestrator::Orchestrator;
use voxloop::providers::{build_generator, build_synthesizer, build_transcriber};

#[tokio::main]
async fn main() {
    // A missing .env file is fine; shell environment still applies.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    cli::init_logging(args.log_level());

    let mut config = Config::load();
    config.apply_env_overrides();
    args.apply_to(&mut config);

    log::info!(
        "Providers: stt={} llm={} tts={}",
        config.stt_provider,
        config.llm_provider,
        config.tts_provider
    );

    let transcriber = match build_transcriber(&config) {
        Ok(t) => t,
        Err(e) => {
            log::error!("Cannot set up transcription: {}", e);
            std::process::exit(1);
        }
    };
    let generator = match build_generator(&config) {
        Ok(g) => g,
        Err(e) => {
            log::error!("Cannot set up response generation: {}", e);
            std::process::exit(1);
        }
    };
    let synthesizer = match build_synthesizer(&config) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Cannot set up speech synthesis: {}", e);
            std::process::exit(1);
        }
    };

    let recorder = match Microphone::new(config.capture.clone()) {
        Ok(m) => m,
        Err(e) => {
            log::error!("Cannot open microphone: {}", e);
            std::process::exit(1);
        }
    };

    let audio_dir = match create_audio_dir() {
        Ok(dir) => dir,
        Err(e) => {
            log::error!("Cannot create audio directory: {}", e);
            std::process::exit(1);
        }
    };

    let mut orchestrator = Orchestrator::new(
        transcriber,
        generator,
        synthesizer,
        Box::new(recorder),
        Box::new(Speaker::new()),
        &config.system_prompt,
        audio_dir,
        config.delete_audio,
    );

    orchestrator.run().await;
}
