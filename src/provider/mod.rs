// src/provider/mod.rs — Inference and speech provider layer

pub mod google;
pub mod gtts;

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::intake::ImageHandle;
use crate::core::session::Role;
use crate::infra::errors::HealthMateError;

/// Core trait for multimodal inference providers.
///
/// A provider is stateless per call: conversational continuity lives in the
/// `ChatHandle` the caller passes in, so the image only travels on the turn
/// that introduced it.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;

    async fn generate(&self, request: InferenceRequest)
        -> Result<InferenceReply, HealthMateError>;
}

/// Text-to-speech provider. Invoked only on explicit user request; a failure
/// here never touches conversational state.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    fn id(&self) -> &str;

    /// Returns an mp3-compatible byte stream for the given text.
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, HealthMateError>;
}

/// One ordered piece of a request payload.
#[derive(Debug, Clone)]
pub enum ContentPart {
    Text(String),
    Image(Arc<ImageHandle>),
}

impl ContentPart {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    pub fn image(handle: Arc<ImageHandle>) -> Self {
        Self::Image(handle)
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }
}

/// One exchange inside a `ChatHandle`.
#[derive(Debug, Clone)]
pub struct HandleTurn {
    pub role: Role,
    pub parts: Vec<ContentPart>,
}

/// Provider-side conversation context, reused across turns within a session.
///
/// The orchestrator owns one handle per diagnostic context and extends a
/// clone of it for each attempt, so a failed call leaves the handle exactly
/// as it was.
#[derive(Debug, Clone, Default)]
pub struct ChatHandle {
    turns: Vec<HandleTurn>,
}

impl ChatHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, parts: Vec<ContentPart>) {
        self.turns.push(HandleTurn {
            role: Role::User,
            parts,
        });
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.turns.push(HandleTurn {
            role: Role::Assistant,
            parts: vec![ContentPart::Text(text.into())],
        });
    }

    pub fn turns(&self) -> &[HandleTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Everything a provider needs for one call.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub model: String,
    pub system: Option<String>,
    pub generation: GenerationConfig,
    /// Full conversation so far, ending with the pending user turn.
    pub handle: ChatHandle,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct InferenceReply {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_handle_starts_empty() {
        let h = ChatHandle::new();
        assert!(h.is_empty());
        assert_eq!(h.len(), 0);
    }

    #[test]
    fn test_chat_handle_push_order() {
        let mut h = ChatHandle::new();
        h.push_user(vec![ContentPart::text("analyze this")]);
        h.push_assistant("looks fine");
        h.push_user(vec![ContentPart::text("are you sure?")]);

        assert_eq!(h.len(), 3);
        assert_eq!(h.turns()[0].role, Role::User);
        assert_eq!(h.turns()[1].role, Role::Assistant);
        assert_eq!(h.turns()[2].role, Role::User);
    }

    #[test]
    fn test_content_part_is_image() {
        assert!(!ContentPart::text("hello").is_image());
    }

    #[test]
    fn test_failed_attempt_leaves_handle_unchanged() {
        let mut h = ChatHandle::new();
        h.push_user(vec![ContentPart::text("first")]);
        h.push_assistant("reply");

        // The orchestrator extends a clone per attempt; dropping the clone
        // on failure must leave the original intact.
        let mut attempt = h.clone();
        attempt.push_user(vec![ContentPart::text("second")]);
        drop(attempt);

        assert_eq!(h.len(), 2);
    }
}
