// src/core/orchestrator.rs — Turn sequencing state machine

use std::sync::Arc;

use crate::core::intake::{ImageFormat, ImageHandle};
use crate::core::session::{Session, SessionStatus, Turn};
use crate::infra::config::Config;
use crate::infra::errors::HealthMateError;
use crate::provider::{
    ChatHandle, ContentPart, GenerationConfig, InferenceProvider, InferenceRequest,
};

/// Which kind of conversational round is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    Analyze,
    Chat,
}

impl std::fmt::Display for TurnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnKind::Analyze => write!(f, "analyze"),
            TurnKind::Chat => write!(f, "chat"),
        }
    }
}

/// Lifecycle events surfaced to the caller while a provider call is pending.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    ImageAttached { bytes: u64, format: ImageFormat },
    TurnStart { kind: TurnKind },
    TurnComplete { kind: TurnKind, chars: usize },
    TurnFailed { kind: TurnKind, message: String },
}

/// Drives the session state machine: decides whether a request is the initial
/// analysis or a follow-up, builds the content payload, invokes the provider,
/// and appends the user and assistant turns as one unit.
///
/// Owns the provider-side `ChatHandle`, so follow-up turns send text only and
/// rely on handle continuity for the image context.
pub struct ChatOrchestrator {
    provider: Arc<dyn InferenceProvider>,
    model: String,
    system: String,
    generation: GenerationConfig,
    analyze_instruction: String,
    handle: ChatHandle,
    on_progress: Option<Box<dyn Fn(ProgressEvent) + Send>>,
}

impl ChatOrchestrator {
    pub fn new(provider: Arc<dyn InferenceProvider>, config: &Config) -> Self {
        Self {
            provider,
            model: config.model.name.clone(),
            system: config.prompt.system.clone(),
            generation: GenerationConfig {
                temperature: Some(config.model.temperature),
                top_p: Some(config.model.top_p),
                top_k: Some(config.model.top_k),
                max_output_tokens: Some(config.model.max_output_tokens),
            },
            analyze_instruction: config.prompt.analyze_instruction.clone(),
            handle: ChatHandle::new(),
            on_progress: None,
        }
    }

    /// Override the model chosen by the config.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a callback for lifecycle events (progress display during the
    /// blocking provider wait).
    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    /// Install a validated upload. Works from any state and always starts a
    /// fresh diagnostic context: history and provider-side handle are reset.
    pub fn attach_image(&mut self, session: &mut Session, handle: ImageHandle) {
        self.emit(ProgressEvent::ImageAttached {
            bytes: handle.byte_size(),
            format: handle.format(),
        });
        session.attach_image(handle);
        self.handle = ChatHandle::new();
    }

    /// Run the initial analysis round: `[instruction, image]` goes to the
    /// provider once. Repeating the analysis on the same image is allowed and
    /// appends a fresh pair of turns each time.
    pub async fn analyze(&mut self, session: &mut Session) -> Result<String, HealthMateError> {
        let image = session
            .image()
            .cloned()
            .ok_or(HealthMateError::NoImageUploaded)?;

        let instruction = self.analyze_instruction.clone();
        let parts = vec![
            ContentPart::text(instruction.clone()),
            ContentPart::image(image),
        ];

        session.set_status(SessionStatus::Analyzing);
        self.round(
            session,
            TurnKind::Analyze,
            parts,
            Turn::user_with_image(instruction),
            SessionStatus::ReportReady,
        )
        .await
    }

    /// Run a follow-up round. The image is not re-sent; the chat handle
    /// preserves the provider-side context from the analysis turn.
    pub async fn ask(
        &mut self,
        session: &mut Session,
        message: &str,
    ) -> Result<String, HealthMateError> {
        if !session.has_image() {
            // Local precondition failure: no state change at all.
            return Err(HealthMateError::NoImageUploaded);
        }

        let parts = vec![ContentPart::text(message)];
        self.round(
            session,
            TurnKind::Chat,
            parts,
            Turn::user(message),
            SessionStatus::Chatting,
        )
        .await
    }

    /// One provider round. User and assistant turns land in the history
    /// together on success; on failure nothing is appended, the handle stays
    /// untouched, and the session is marked `Failed` until the next
    /// successful action.
    async fn round(
        &mut self,
        session: &mut Session,
        kind: TurnKind,
        parts: Vec<ContentPart>,
        user_turn: Turn,
        on_success: SessionStatus,
    ) -> Result<String, HealthMateError> {
        self.emit(ProgressEvent::TurnStart { kind });

        let mut attempt = self.handle.clone();
        attempt.push_user(parts);

        let request = InferenceRequest {
            model: self.model.clone(),
            system: Some(self.system.clone()),
            generation: self.generation.clone(),
            handle: attempt.clone(),
        };

        match self.provider.generate(request).await {
            Ok(reply) => {
                attempt.push_assistant(reply.text.clone());
                self.handle = attempt;

                session.append_turn(user_turn)?;
                session.append_turn(Turn::assistant(reply.text.clone()))?;
                session.set_status(on_success);

                self.emit(ProgressEvent::TurnComplete {
                    kind,
                    chars: reply.text.chars().count(),
                });
                tracing::debug!(session = %session.id, %kind, "turn complete");
                Ok(reply.text)
            }
            Err(e) => {
                session.set_status(SessionStatus::Failed);
                self.emit(ProgressEvent::TurnFailed {
                    kind,
                    message: e.to_string(),
                });
                tracing::warn!(session = %session.id, %kind, error = %e, "turn failed");
                Err(e)
            }
        }
    }

    /// Provider-side turn count, exposed for status display.
    pub fn handle_len(&self) -> usize {
        self.handle.len()
    }
}
