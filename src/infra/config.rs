// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub prompt: PromptConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub speech: SpeechConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gemini-2.0-flash".into(),
            temperature: 0.4,
            top_p: 0.95,
            top_k: 32,
            max_output_tokens: 4096,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// System instruction sent with every provider call.
    pub system: String,
    /// Instruction text for the initial analysis turn.
    pub analyze_instruction: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system: "You are a careful radiology assistant. Describe findings in \
                     uploaded X-ray images in plain language, note uncertainty, and \
                     always remind the user that this does not replace professional \
                     medical advice."
                .into(),
            analyze_instruction: "Analyze this image and describe possible medical conditions."
                .into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum accepted upload size in bytes.
    pub max_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// BCP-47ish language tag passed to the speech provider.
    pub language: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            language: "en".into(),
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.model.name, "gemini-2.0-flash");
        assert_eq!(c.upload.max_bytes, 5 * 1024 * 1024);
        assert_eq!(c.speech.language, "en");
        assert!(c.prompt.analyze_instruction.starts_with("Analyze this image"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let c: Config = toml::from_str(
            r#"
            [model]
            name = "gemini-2.5-flash"
            temperature = 0.2
            top_p = 0.9
            top_k = 16
            max_output_tokens = 2048

            [speech]
            language = "de"
            "#,
        )
        .unwrap();
        assert_eq!(c.model.name, "gemini-2.5-flash");
        assert_eq!(c.speech.language, "de");
        // Omitted sections fall back to defaults
        assert_eq!(c.upload.max_bytes, 5 * 1024 * 1024);
        assert!(!c.prompt.system.is_empty());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let c: Config = toml::from_str("").unwrap();
        assert_eq!(c.model.max_output_tokens, 4096);
    }
}
