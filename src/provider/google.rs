// src/provider/google.rs — Google Generative AI (Gemini) provider

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

use super::{ContentPart, InferenceProvider, InferenceReply, InferenceRequest};
use crate::core::session::Role;
use crate::infra::errors::HealthMateError;

pub struct GoogleProvider {
    api_key: String,
    client: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn base_url(&self) -> &str {
        "https://generativelanguage.googleapis.com/v1beta"
    }

    /// Build the Gemini request body from an InferenceRequest.
    fn build_request_body(&self, request: &InferenceRequest) -> serde_json::Value {
        let mut contents: Vec<serde_json::Value> = Vec::new();

        for turn in request.handle.turns() {
            let role = match turn.role {
                Role::User => "user",
                Role::Assistant => "model",
            };

            let parts: Vec<serde_json::Value> = turn
                .parts
                .iter()
                .map(|p| match p {
                    ContentPart::Text(text) => serde_json::json!({ "text": text }),
                    ContentPart::Image(handle) => serde_json::json!({
                        "inline_data": {
                            "mime_type": handle.format().mime_type(),
                            "data": BASE64_STANDARD.encode(handle.bytes()),
                        }
                    }),
                })
                .collect();

            contents.push(serde_json::json!({
                "role": role,
                "parts": parts,
            }));
        }

        let mut body = serde_json::json!({
            "contents": contents,
            "safetySettings": safety_settings(),
        });

        // System instruction
        if let Some(ref system) = request.system {
            body["system_instruction"] = serde_json::json!({
                "parts": [{ "text": system }],
            });
        }

        // Generation config
        let mut gen_config = serde_json::json!({});
        if let Some(max_tokens) = request.generation.max_output_tokens {
            gen_config["maxOutputTokens"] = serde_json::json!(max_tokens);
        }
        if let Some(temp) = request.generation.temperature {
            gen_config["temperature"] = serde_json::json!(temp);
        }
        if let Some(top_p) = request.generation.top_p {
            gen_config["topP"] = serde_json::json!(top_p);
        }
        if let Some(top_k) = request.generation.top_k {
            gen_config["topK"] = serde_json::json!(top_k);
        }
        if gen_config != serde_json::json!({}) {
            body["generationConfig"] = gen_config;
        }

        body
    }
}

/// Medical imagery trips the default blockers, so cap every category at
/// high-severity only.
fn safety_settings() -> serde_json::Value {
    serde_json::json!([
        { "category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_ONLY_HIGH" },
        { "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "BLOCK_ONLY_HIGH" },
        { "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": "BLOCK_ONLY_HIGH" },
        { "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_ONLY_HIGH" },
    ])
}

#[async_trait]
impl InferenceProvider for GoogleProvider {
    fn id(&self) -> &str {
        "google"
    }

    fn name(&self) -> &str {
        "Google"
    }

    async fn generate(
        &self,
        request: InferenceRequest,
    ) -> Result<InferenceReply, HealthMateError> {
        let body = self.build_request_body(&request);

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url(),
            request.model,
            self.api_key,
        );

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| HealthMateError::Provider {
                provider: "google".into(),
                message: e.to_string(),
                retriable: e.is_timeout() || e.is_connect(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(HealthMateError::RateLimited {
                provider: "google".into(),
                retry_after_ms: 5000,
            });
        }

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(HealthMateError::Provider {
                provider: "google".into(),
                message: format!("HTTP {}: {}", status, error_body),
                retriable: status.is_server_error(),
            });
        }

        let resp: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| HealthMateError::Provider {
                    provider: "google".into(),
                    message: format!("Failed to parse response: {}", e),
                    retriable: false,
                })?;

        // Extract text content from candidates[0].content.parts
        let parts = resp["candidates"][0]["content"]["parts"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        let mut text = String::new();
        for part in &parts {
            if let Some(t) = part["text"].as_str() {
                text.push_str(t);
            }
        }

        if text.is_empty() {
            // Blocked or empty candidates count as a rejected call.
            let reason = resp["promptFeedback"]["blockReason"]
                .as_str()
                .or_else(|| resp["candidates"][0]["finishReason"].as_str())
                .unwrap_or("empty response");
            return Err(HealthMateError::Provider {
                provider: "google".into(),
                message: format!("Content rejected: {}", reason),
                retriable: false,
            });
        }

        Ok(InferenceReply { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::intake::ImageIntake;
    use crate::provider::{ChatHandle, GenerationConfig};
    use std::sync::Arc;

    fn png_part() -> ContentPart {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        let handle = ImageIntake::default()
            .validate_and_decode(&buf, buf.len() as u64)
            .unwrap();
        ContentPart::image(Arc::new(handle))
    }

    fn request_with(handle: ChatHandle) -> InferenceRequest {
        InferenceRequest {
            model: "gemini-2.0-flash".into(),
            system: Some("You are a radiology assistant.".into()),
            generation: GenerationConfig {
                temperature: Some(0.4),
                top_p: Some(0.95),
                top_k: Some(32),
                max_output_tokens: Some(4096),
            },
            handle,
        }
    }

    #[test]
    fn test_body_maps_roles_and_parts() {
        let mut handle = ChatHandle::new();
        handle.push_user(vec![ContentPart::text("analyze"), png_part()]);
        handle.push_assistant("findings");
        handle.push_user(vec![ContentPart::text("is this normal?")]);

        let provider = GoogleProvider::new("test-key".into());
        let body = provider.build_request_body(&request_with(handle));

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["role"], "user");

        // First turn carries text + inline image data
        let first_parts = contents[0]["parts"].as_array().unwrap();
        assert_eq!(first_parts.len(), 2);
        assert_eq!(first_parts[0]["text"], "analyze");
        assert_eq!(first_parts[1]["inline_data"]["mime_type"], "image/png");
        assert!(first_parts[1]["inline_data"]["data"].as_str().is_some());

        // Follow-up turn is text only
        let last_parts = contents[2]["parts"].as_array().unwrap();
        assert_eq!(last_parts.len(), 1);
        assert_eq!(last_parts[0]["text"], "is this normal?");
    }

    #[test]
    fn test_body_carries_system_instruction_and_generation_config() {
        let mut handle = ChatHandle::new();
        handle.push_user(vec![ContentPart::text("hello")]);

        let provider = GoogleProvider::new("test-key".into());
        let body = provider.build_request_body(&request_with(handle));

        assert_eq!(
            body["system_instruction"]["parts"][0]["text"],
            "You are a radiology assistant."
        );
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 4096);
        assert_eq!(body["generationConfig"]["topK"], 32);
    }

    #[test]
    fn test_body_includes_safety_settings() {
        let mut handle = ChatHandle::new();
        handle.push_user(vec![ContentPart::text("hello")]);

        let provider = GoogleProvider::new("test-key".into());
        let body = provider.build_request_body(&request_with(handle));

        let settings = body["safetySettings"].as_array().unwrap();
        assert_eq!(settings.len(), 4);
        assert!(settings
            .iter()
            .all(|s| s["threshold"] == "BLOCK_ONLY_HIGH"));
    }
}
