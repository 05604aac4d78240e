// src/cli/progress.rs — Terminal progress renderer

use crate::core::orchestrator::{ProgressEvent, TurnKind};

/// Build a progress callback that writes formatted output to stderr.
///
/// Progress goes to stderr so stdout stays clean for report text.
/// Returns a closure suitable for `ChatOrchestrator::with_progress()`.
pub fn terminal_progress() -> impl Fn(ProgressEvent) + Send + 'static {
    move |event| match event {
        ProgressEvent::ImageAttached { bytes, format } => {
            eprintln!("[upload] {} image accepted ({} bytes)", format, bytes);
        }
        ProgressEvent::TurnStart { kind } => match kind {
            TurnKind::Analyze => eprintln!("[analyze] AI is analyzing your image..."),
            TurnKind::Chat => eprintln!("[chat] AI is responding..."),
        },
        ProgressEvent::TurnComplete { kind, chars } => {
            eprintln!("[{}] done ({} chars)", kind, chars);
        }
        ProgressEvent::TurnFailed { kind, message } => {
            eprintln!("[{}] failed: {}", kind, message);
        }
    }
}
