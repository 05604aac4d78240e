// src/cli/chat.rs — Interactive REPL

use std::path::Path;
use std::sync::Arc;

use crate::core::intake::ImageIntake;
use crate::core::orchestrator::ChatOrchestrator;
use crate::core::report;
use crate::core::session::Session;
use crate::infra::config::Config;
use crate::infra::paths;
use crate::provider::{InferenceProvider, SpeechProvider};

/// Run the interactive chat session.
pub async fn run_chat(
    provider: Arc<dyn InferenceProvider>,
    speech: Arc<dyn SpeechProvider>,
    config: &Config,
    model: Option<&str>,
    image: Option<&Path>,
    quiet: bool,
) -> anyhow::Result<()> {
    let model_name = model.unwrap_or(&config.model.name);
    eprintln!(
        "healthmate v{} | {}/{} | upload limit {} MiB\n",
        env!("CARGO_PKG_VERSION"),
        provider.id(),
        model_name,
        config.upload.max_bytes / (1024 * 1024),
    );

    let intake = ImageIntake::new(config.upload.max_bytes);
    let mut session = Session::new();
    let mut orchestrator = ChatOrchestrator::new(provider, config).with_model(model_name);
    if !quiet {
        orchestrator = orchestrator.with_progress(super::progress::terminal_progress());
    }

    if let Some(path) = image {
        upload(&intake, &mut orchestrator, &mut session, path);
    }

    while let Some(input) = read_input() {
        let trimmed = input.trim();

        if trimmed == "quit" || trimmed == "exit" || trimmed == "/quit" {
            break;
        }

        if trimmed.starts_with('/') {
            handle_slash_command(
                trimmed,
                &intake,
                &mut orchestrator,
                &mut session,
                speech.as_ref(),
                config,
            )
            .await;
            continue;
        }

        if trimmed.is_empty() {
            continue;
        }

        // Free text is a follow-up question about the current image.
        match orchestrator.ask(&mut session, trimmed).await {
            Ok(response) => println!("{}", response),
            Err(e) => eprintln!("[error] {}", e),
        }
    }

    eprintln!(
        "\nSession {}: {} turn(s), status {:?}",
        session.id,
        session.history().len(),
        session.status(),
    );
    Ok(())
}

fn read_input() -> Option<String> {
    use std::io::{self, BufRead, Write};

    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    let mut line = String::new();
    match stdin.lock().read_line(&mut line) {
        Ok(0) => None, // EOF
        Ok(_) => Some(line),
        Err(_) => None,
    }
}

fn upload(
    intake: &ImageIntake,
    orchestrator: &mut ChatOrchestrator,
    session: &mut Session,
    path: &Path,
) {
    let raw = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("[error] could not read {}: {}", path.display(), e);
            return;
        }
    };

    match intake.validate_and_decode(&raw, raw.len() as u64) {
        Ok(handle) => orchestrator.attach_image(session, handle),
        Err(e) => eprintln!("[error] {}", e),
    }
}

fn write_audio(path: &Path, audio: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, audio)
}

async fn handle_slash_command(
    input: &str,
    intake: &ImageIntake,
    orchestrator: &mut ChatOrchestrator,
    session: &mut Session,
    speech: &dyn SpeechProvider,
    config: &Config,
) {
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/upload" => {
            if arg.is_empty() {
                eprintln!("  Usage: /upload <path-to-image>");
            } else {
                upload(intake, orchestrator, session, Path::new(arg));
            }
        }

        "/analyze" => match orchestrator.analyze(session).await {
            Ok(report_text) => println!("{}", report_text),
            Err(e) => eprintln!("[error] {}", e),
        },

        "/export" => {
            let result = if arg.is_empty() {
                report::export_to_dir(session, &paths::reports_dir())
            } else {
                report::export_to(session, Path::new(arg)).map(|_| arg.into())
            };
            match result {
                Ok(path) => eprintln!("  Report written to {}", path.display()),
                Err(e) => eprintln!("[error] {}", e),
            }
        }

        "/speak" => match report::latest_report(session) {
            Ok(text) => {
                eprintln!("  Synthesizing report...");
                match speech.synthesize(text, &config.speech.language).await {
                    Ok(audio) => {
                        let path = if arg.is_empty() {
                            paths::reports_dir().join("xray_diagnosis_report.mp3")
                        } else {
                            arg.into()
                        };
                        match write_audio(&path, &audio) {
                            Ok(()) => eprintln!("  Audio written to {}", path.display()),
                            Err(e) => eprintln!("[error] could not write audio: {}", e),
                        }
                    }
                    Err(e) => eprintln!("[error] {}", e),
                }
            }
            Err(e) => eprintln!("[error] {}", e),
        },

        "/status" => {
            eprintln!("  Session: {}", session.id);
            eprintln!("  Status: {:?}", session.status());
            match session.image() {
                Some(img) => {
                    let (w, h) = img.dimensions();
                    eprintln!(
                        "  Image: {} {}x{} ({} bytes)",
                        img.format(),
                        w,
                        h,
                        img.byte_size()
                    );
                }
                None => eprintln!("  Image: none"),
            }
            eprintln!(
                "  History: {} turn(s) | provider context: {} turn(s)",
                session.history().len(),
                orchestrator.handle_len(),
            );
        }

        "/help" => {
            eprintln!("Slash commands:");
            eprintln!("  /upload <path>     Upload an X-ray image (starts a fresh context)");
            eprintln!("  /analyze           Run the analysis on the uploaded image");
            eprintln!("  /export [path]     Write the latest report to a text file");
            eprintln!("  /speak [path]      Synthesize the latest report to mp3");
            eprintln!("  /status            Show session status");
            eprintln!("  /help              Show this help");
            eprintln!("  /quit, quit, exit  End session");
            eprintln!("Anything else is sent as a follow-up question.");
        }

        _ => {
            eprintln!("Unknown command: {}. Type /help for commands.", cmd);
        }
    }
}
