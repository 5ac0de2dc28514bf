//! Client for the vision model that reads scoreboard photos.
//!
//! The model is asked for JSON shaped as `{"pickers": [{name, hours, target}]}`.
//! Nothing here validates that shape; see `image_import` for normalization.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};
use thiserror::Error;

use crate::services::config_loader::VisionConfig;

const USER_AGENT: &str = concat!("arena-board/", env!("CARGO_PKG_VERSION"));

const EXTRACTION_PROMPT: &str = "Analyze this scoreboard/spreadsheet image. Extract the rows representing people/contestants.
Return a JSON object with a 'pickers' array.
Each item in the array must have:
- 'name' (string): The name of the person.
- 'hours' (array of numbers): The hourly values. Look for columns 1-10. Extract exactly 10 values if possible, or pad with 0 if fewer are found.
- 'target' (number): The individual target/KPI if a specific column exists, otherwise default to 500.

Ignore summary rows like \"Total\" or \"Average\".";

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("API key not set (expected in ${0})")]
    MissingApiKey(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No data returned from model")]
    EmptyResponse,
}

pub struct VisionClient {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl VisionClient {
    /// Reads the API key from the environment variable named in config.
    pub fn from_config(config: &VisionConfig) -> Result<Self, VisionError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| VisionError::MissingApiKey(config.api_key_env.clone()))?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()
            .map_err(|e| VisionError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Sends the image and returns the model's JSON answer, parsed but not
    /// interpreted.
    pub async fn extract_scoreboard(
        &self,
        image_bytes: &[u8],
        mime_type: &str,
    ) -> Result<Value, VisionError> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let body = build_request_body(&BASE64.encode(image_bytes), mime_type);

        tracing::debug!(
            model = %self.model,
            image_bytes = image_bytes.len(),
            "Requesting scoreboard extraction"
        );

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VisionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(VisionError::Api(status.as_u16(), error_text));
        }

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| VisionError::Parse(e.to_string()))?;

        let text = response_text(&envelope).ok_or(VisionError::EmptyResponse)?;
        serde_json::from_str(&text).map_err(|e| VisionError::Parse(e.to_string()))
    }
}

pub fn build_request_body(image_base64: &str, mime_type: &str) -> Value {
    json!({
        "contents": [{
            "parts": [
                { "inline_data": { "mime_type": mime_type, "data": image_base64 } },
                { "text": EXTRACTION_PROMPT }
            ]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "pickers": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "name": { "type": "STRING" },
                                "hours": { "type": "ARRAY", "items": { "type": "NUMBER" } },
                                "target": { "type": "NUMBER" }
                            },
                            "required": ["name", "hours"]
                        }
                    }
                }
            }
        }
    })
}

/// Concatenated text parts of the first candidate, if any.
pub fn response_text(envelope: &Value) -> Option<String> {
    let parts = envelope
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() { None } else { Some(text) }
}
