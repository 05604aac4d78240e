// src/core/session.rs — Per-user conversational and image state

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::intake::ImageHandle;
use crate::infra::errors::HealthMateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    ImageReady,
    Analyzing,
    ReportReady,
    Chatting,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation. Order in the history is the only index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    /// True when the uploaded image accompanied this turn's text.
    pub with_image: bool,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            with_image: false,
        }
    }

    pub fn user_with_image(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            with_image: true,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            with_image: false,
        }
    }
}

/// State container for one user context: current image, status, and the
/// append-only turn history. One session per logical user; sessions share
/// nothing with each other.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    status: SessionStatus,
    image: Option<Arc<ImageHandle>>,
    history: Vec<Turn>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            status: SessionStatus::Idle,
            image: None,
            history: Vec::new(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
    }

    pub fn image(&self) -> Option<&Arc<ImageHandle>> {
        self.image.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Install a new image, replacing any prior one. A new image starts a new
    /// diagnostic context: the history is cleared, whatever state the session
    /// was in.
    pub fn attach_image(&mut self, handle: ImageHandle) {
        self.image = Some(Arc::new(handle));
        self.history.clear();
        self.status = SessionStatus::ImageReady;
    }

    /// Append a turn to the history. Fails when no image has been attached;
    /// never reorders or deduplicates.
    pub fn append_turn(&mut self, turn: Turn) -> Result<(), HealthMateError> {
        if self.image.is_none() {
            return Err(HealthMateError::NoImageUploaded);
        }
        self.history.push(turn);
        Ok(())
    }

    /// The text of the most recent assistant turn, if any. This is the
    /// "report" that export and speech synthesis consume; it is derived from
    /// the history, never stored separately.
    pub fn latest_report(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|t| t.role == Role::Assistant)
            .map(|t| t.text.as_str())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::intake::ImageIntake;

    fn png_handle() -> ImageHandle {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        ImageIntake::default()
            .validate_and_decode(&buf, buf.len() as u64)
            .unwrap()
    }

    #[test]
    fn test_new_session_is_idle_and_empty() {
        let s = Session::new();
        assert_eq!(s.status(), SessionStatus::Idle);
        assert!(!s.has_image());
        assert!(s.history().is_empty());
        assert!(s.latest_report().is_none());
    }

    #[test]
    fn test_append_turn_requires_image() {
        let mut s = Session::new();
        let err = s.append_turn(Turn::user("hello")).unwrap_err();
        assert!(matches!(err, HealthMateError::NoImageUploaded));
        assert!(s.history().is_empty());
    }

    #[test]
    fn test_attach_image_transitions_to_image_ready() {
        let mut s = Session::new();
        s.attach_image(png_handle());
        assert_eq!(s.status(), SessionStatus::ImageReady);
        assert!(s.has_image());
    }

    #[test]
    fn test_attach_image_clears_history() {
        let mut s = Session::new();
        s.attach_image(png_handle());
        s.append_turn(Turn::user_with_image("analyze")).unwrap();
        s.append_turn(Turn::assistant("findings")).unwrap();
        assert_eq!(s.history().len(), 2);

        s.attach_image(png_handle());
        assert!(s.history().is_empty());
        assert_eq!(s.status(), SessionStatus::ImageReady);
    }

    #[test]
    fn test_history_is_order_preserving() {
        let mut s = Session::new();
        s.attach_image(png_handle());
        s.append_turn(Turn::user("a")).unwrap();
        s.append_turn(Turn::assistant("b")).unwrap();
        s.append_turn(Turn::user("c")).unwrap();

        let texts: Vec<&str> = s.history().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_latest_report_is_last_assistant_turn() {
        let mut s = Session::new();
        s.attach_image(png_handle());
        s.append_turn(Turn::user("analyze")).unwrap();
        s.append_turn(Turn::assistant("first report")).unwrap();
        s.append_turn(Turn::user("follow-up")).unwrap();
        s.append_turn(Turn::assistant("second report")).unwrap();
        s.append_turn(Turn::user("pending question")).unwrap();

        assert_eq!(s.latest_report(), Some("second report"));
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(Session::new().id, Session::new().id);
    }
}
