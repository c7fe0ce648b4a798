use async_trait::async_trait;
use log::{debug, info};
use serde_json::{json, Value};

use crate::error::ServiceError;
use crate::service::SpeechService;

/// Model used for speech generation
pub const TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Model used for text rewriting
pub const REWRITE_MODEL: &str = "gemini-2.5-pro";

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Client for the Gemini generateContent REST API
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Result<Self, ServiceError> {
        Self::with_base_url(api_key, API_BASE.to_string())
    }

    /// Construct against an alternate endpoint, used by tests
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, ServiceError> {
        if api_key.trim().is_empty() {
            return Err(ServiceError::MissingApiKey);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        )
    }

    async fn generate(&self, model: &str, body: Value) -> Result<Value, ServiceError> {
        debug!("Requesting generateContent from {}", model);
        let response = self
            .client
            .post(self.endpoint(model))
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::BadStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ServiceError::RequestFailed(e.to_string()))
    }
}

/// Pull the first content part out of a generateContent response
fn first_part(response: &Value) -> Option<&Value> {
    response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)
}

fn truncate_body(body: &str) -> String {
    const LIMIT: usize = 500;
    if body.len() <= LIMIT {
        body.to_string()
    } else {
        let mut end = LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    }
}

#[async_trait]
impl SpeechService for GeminiClient {
    async fn generate_speech(&self, prompt: &str, voice_id: &str) -> Result<String, ServiceError> {
        if prompt.trim().is_empty() {
            return Err(ServiceError::EmptyInput {
                field: "Text".to_string(),
            });
        }
        if voice_id.trim().is_empty() {
            return Err(ServiceError::EmptyInput {
                field: "Voice".to_string(),
            });
        }

        let body = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": voice_id }
                    }
                }
            }
        });

        let response = self.generate(TTS_MODEL, body).await?;
        let data = first_part(&response)
            .and_then(|part| part.get("inlineData"))
            .and_then(|inline| inline.get("data"))
            .and_then(|d| d.as_str())
            .ok_or(ServiceError::MissingAudioData)?;

        info!("Received {} base64 chars of audio", data.len());
        Ok(data.to_string())
    }

    async fn rewrite_text(&self, text: &str, instruction: &str) -> Result<String, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::EmptyInput {
                field: "Text".to_string(),
            });
        }

        let prompt = format!(
            "{}\n\nRespond with the rewritten text only, no preamble or explanation.\n\nText:\n{}",
            instruction, text
        );
        let body = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        });

        let response = self.generate(REWRITE_MODEL, body).await?;
        let rewritten = first_part(&response)
            .and_then(|part| part.get("text"))
            .and_then(|t| t.as_str())
            .ok_or(ServiceError::MissingText)?;

        Ok(rewritten.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(matches!(
            GeminiClient::new(String::new()),
            Err(ServiceError::MissingApiKey)
        ));
        assert!(matches!(
            GeminiClient::new("   ".to_string()),
            Err(ServiceError::MissingApiKey)
        ));
        assert!(GeminiClient::new("key-123".to_string()).is_ok());
    }

    #[test]
    fn test_endpoint_includes_model_and_key() {
        let client = GeminiClient::new("key-123".to_string()).unwrap();
        let url = client.endpoint(TTS_MODEL);
        assert!(url.contains("gemini-2.5-flash-preview-tts:generateContent"));
        assert!(url.ends_with("key=key-123"));
    }

    #[tokio::test]
    async fn test_empty_inputs_rejected_before_any_request() {
        let client = GeminiClient::new("key-123".to_string()).unwrap();
        assert!(matches!(
            client.generate_speech("   ", "Kore").await,
            Err(ServiceError::EmptyInput { field }) if field == "Text"
        ));
        assert!(matches!(
            client.generate_speech("hello", "").await,
            Err(ServiceError::EmptyInput { field }) if field == "Voice"
        ));
        assert!(matches!(
            client.rewrite_text("", "shorten").await,
            Err(ServiceError::EmptyInput { field }) if field == "Text"
        ));
    }

    #[test]
    fn test_first_part_extraction() {
        let response = json!({
            "candidates": [{
                "content": {
                    "parts": [{ "inlineData": { "data": "QUJD" } }]
                }
            }]
        });
        let data = first_part(&response)
            .and_then(|p| p.get("inlineData"))
            .and_then(|i| i.get("data"))
            .and_then(|d| d.as_str());
        assert_eq!(data, Some("QUJD"));

        assert!(first_part(&json!({})).is_none());
        assert!(first_part(&json!({ "candidates": [] })).is_none());
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("short"), "short");
        let long = "x".repeat(600);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.len(), 503);
    }
}
