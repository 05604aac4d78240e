// src/main.rs — HealthMate entry point

use std::sync::Arc;

use clap::Parser;

use healthmate::cli::{Cli, Commands};
use healthmate::infra::config::Config;
use healthmate::infra::logger;
use healthmate::provider::google::GoogleProvider;
use healthmate::provider::gtts::GttsSpeech;
use healthmate::provider::{InferenceProvider, SpeechProvider};

#[tokio::main]
async fn main() {
    // Initialize logging (respects RUST_LOG)
    logger::init_logging("warn");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config (falls back to defaults if no config.toml)
    let config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };

    let api_key = resolve_api_key()?;
    let provider: Arc<dyn InferenceProvider> = Arc::new(GoogleProvider::new(api_key));
    let speech: Arc<dyn SpeechProvider> = Arc::new(GttsSpeech::new());

    match cli.command {
        Some(Commands::Analyze {
            image,
            output,
            speak,
        }) => {
            healthmate::cli::analyze::run_analyze(
                provider,
                speech,
                &config,
                cli.model.as_deref(),
                &image,
                output.as_deref(),
                speak.as_deref(),
                cli.quiet,
            )
            .await
        }
        Some(Commands::Chat { image }) => {
            healthmate::cli::chat::run_chat(
                provider,
                speech,
                &config,
                cli.model.as_deref(),
                image.as_deref(),
                cli.quiet,
            )
            .await
        }
        None => {
            // Default: interactive session
            healthmate::cli::chat::run_chat(
                provider,
                speech,
                &config,
                cli.model.as_deref(),
                None,
                cli.quiet,
            )
            .await
        }
    }
}

/// Resolve the Gemini API key from the environment.
fn resolve_api_key() -> anyhow::Result<String> {
    std::env::var("GEMINI_API_KEY")
        .or_else(|_| std::env::var("GOOGLE_API_KEY"))
        .map_err(|_| {
            anyhow::anyhow!("No API key found. Set GEMINI_API_KEY or GOOGLE_API_KEY.")
        })
}
