// src/cli/analyze.rs — One-shot analysis command

use std::path::Path;
use std::sync::Arc;

use crate::core::intake::ImageIntake;
use crate::core::orchestrator::ChatOrchestrator;
use crate::core::report;
use crate::core::session::Session;
use crate::infra::config::Config;
use crate::provider::{InferenceProvider, SpeechProvider};

/// Upload one image, run the analysis, print the report. Optionally write it
/// to a file and/or synthesize it to mp3.
#[allow(clippy::too_many_arguments)]
pub async fn run_analyze(
    provider: Arc<dyn InferenceProvider>,
    speech: Arc<dyn SpeechProvider>,
    config: &Config,
    model: Option<&str>,
    image: &Path,
    output: Option<&Path>,
    speak: Option<&Path>,
    quiet: bool,
) -> anyhow::Result<()> {
    let raw = std::fs::read(image)?;

    let intake = ImageIntake::new(config.upload.max_bytes);
    let handle = intake.validate_and_decode(&raw, raw.len() as u64)?;

    let mut session = Session::new();
    let mut orchestrator = ChatOrchestrator::new(provider, config);
    if let Some(m) = model {
        orchestrator = orchestrator.with_model(m);
    }
    if !quiet {
        orchestrator = orchestrator.with_progress(super::progress::terminal_progress());
    }

    orchestrator.attach_image(&mut session, handle);
    let report_text = orchestrator.analyze(&mut session).await?;
    println!("{}", report_text);

    if let Some(path) = output {
        report::export_to(&session, path)?;
        eprintln!("Report written to {}", path.display());
    }

    if let Some(path) = speak {
        let audio = speech
            .synthesize(&report_text, &config.speech.language)
            .await?;
        std::fs::write(path, &audio)?;
        eprintln!("Audio written to {}", path.display());
    }

    Ok(())
}
