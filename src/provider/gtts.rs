// src/provider/gtts.rs — Google Translate text-to-speech adapter

use async_trait::async_trait;

use super::SpeechProvider;
use crate::infra::errors::HealthMateError;

const TTS_URL: &str = "https://translate.google.com/translate_tts";

/// The endpoint rejects long inputs; chunks stay under this many characters
/// and split on whitespace.
const MAX_CHUNK_CHARS: usize = 200;

pub struct GttsSpeech {
    client: reqwest::Client,
}

impl GttsSpeech {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for GttsSpeech {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechProvider for GttsSpeech {
    fn id(&self) -> &str {
        "gtts"
    }

    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, HealthMateError> {
        if text.trim().is_empty() {
            return Err(HealthMateError::Synthesis("nothing to synthesize".into()));
        }

        let mut audio = Vec::new();

        // MP3 frame streams concatenate cleanly, so fetch chunk by chunk.
        for chunk in chunk_text(text, MAX_CHUNK_CHARS) {
            let response = self
                .client
                .get(TTS_URL)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", language),
                    ("q", chunk.as_str()),
                ])
                .send()
                .await
                .map_err(|e| HealthMateError::Synthesis(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(HealthMateError::Synthesis(format!(
                    "HTTP {} from speech endpoint",
                    status
                )));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| HealthMateError::Synthesis(e.to_string()))?;
            audio.extend_from_slice(&bytes);
        }

        Ok(audio)
    }
}

/// Split text into whitespace-aligned chunks of at most `max_chars`
/// characters. A single word longer than the limit is hard-split at char
/// boundaries.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();

        if word_chars > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            let cs: Vec<char> = word.chars().collect();
            for piece in cs.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() {
            word_chars
        } else {
            current_chars + 1 + word_chars
        };

        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
            current_chars = word_chars;
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_chars = needed;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
