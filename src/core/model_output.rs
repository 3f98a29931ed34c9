use crate::utils::error::{EnrichError, Result};
use serde::de::DeserializeOwned;

/// Removes a surrounding Markdown code fence, with or without a `json` tag.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Decodes model output into `T`; any shape mismatch is an error, never a partial value.
pub fn decode_model_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let cleaned = strip_code_fence(raw);
    serde_json::from_str(cleaned).map_err(|e| {
        let preview: String = cleaned.chars().take(120).collect();
        EnrichError::ModelResponse {
            message: format!("{} (response started with: {:?})", e, preview),
        }
    })
}
