use crate::domain::model::GenerationRequest;
use crate::domain::ports::GenerativeModel;
use crate::utils::error::{EnrichError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Option<Duration>,
}

impl GeminiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout: None,
        }
    }
}

/// `GenerativeModel` over the Gemini `generateContent` REST call.
pub struct GeminiClient {
    client: Client,
    settings: GeminiSettings,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings) -> Self {
        Self::with_client(Client::new(), settings)
    }

    pub fn with_client(client: Client, settings: GeminiSettings) -> Self {
        Self { client, settings }
    }

    pub fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.model
        )
    }

    fn payload(request: &GenerationRequest) -> Value {
        let mut parts = vec![json!({ "text": request.prompt })];
        if let Some(image) = &request.image {
            parts.push(json!({
                "inline_data": {
                    "mime_type": image.mime_type,
                    "data": image.data,
                }
            }));
        }

        json!({
            "contents": [{
                "role": "user",
                "parts": parts,
            }]
        })
    }
}

/// Concatenated text of the first candidate, or `None` when the reply has no text part.
fn candidate_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let url = self.generate_url();
        tracing::debug!(
            "Calling {} (image: {})",
            self.settings.model,
            request.image.is_some()
        );

        let mut call = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.settings.api_key)
            .json(&Self::payload(&request));
        if let Some(timeout) = self.settings.timeout {
            call = call.timeout(timeout);
        }

        let response = call.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!("Generative model quota exceeded");
            return Err(EnrichError::QuotaExceeded { message });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EnrichError::ModelApi {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await?;
        candidate_text(&body).ok_or_else(|| EnrichError::ModelResponse {
            message: "reply contained no text candidate".to_string(),
        })
    }
}
