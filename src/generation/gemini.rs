use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use serde_json::{Value, json};

use super::{ImageGenerator, build_instruction};
use crate::config::AppConfig;
use crate::error::{GenerateError, SnapshotError};
use crate::snapshot::{PNG_MIME_TYPE, Snapshot};

/// Renders sketches with a Gemini image model over the `generateContent` API
pub struct GeminiGenerator {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGenerator")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiGenerator {
    pub fn new(config: &AppConfig, api_key: impl Into<String>) -> Result<Self, GenerateError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl ImageGenerator for GeminiGenerator {
    fn generate(&self, sketch: &Snapshot, prompt: &str) -> Result<Snapshot, GenerateError> {
        log::info!(
            "Requesting render from {} ({}x{} sketch)",
            self.model,
            sketch.width(),
            sketch.height()
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(sketch, prompt))
            .send()?;

        let status = response.status();
        let body = response.text()?;
        read_response(status, &body)
    }
}

/// Turn an HTTP status and body into the rendered image or an error
pub(crate) fn read_response(status: StatusCode, body: &str) -> Result<Snapshot, GenerateError> {
    if !status.is_success() {
        return Err(GenerateError::Api {
            status: status.as_u16(),
            body: body.to_owned(),
        });
    }

    let data: Value =
        serde_json::from_str(body).map_err(|e| GenerateError::MalformedResponse(e.to_string()))?;

    extract_image(&data)
}

/// Build the `generateContent` request for one sketch
pub(crate) fn request_body(sketch: &Snapshot, prompt: &str) -> Value {
    json!({
        "contents": [{
            "parts": [
                { "text": build_instruction(prompt) },
                {
                    "inline_data": {
                        "mime_type": PNG_MIME_TYPE,
                        "data": sketch.to_base64()
                    }
                }
            ]
        }],
        "generationConfig": {
            "responseModalities": ["TEXT", "IMAGE"]
        }
    })
}

/// Pull the first image part out of the first candidate
pub(crate) fn extract_image(response: &Value) -> Result<Snapshot, GenerateError> {
    let parts = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or(GenerateError::NoImage)?;

    for text in parts.iter().filter_map(|part| part.get("text").and_then(Value::as_str)) {
        log::debug!("Model commentary: {}", text);
    }

    let inline = parts
        .iter()
        .find_map(|part| part.get("inlineData").or_else(|| part.get("inline_data")))
        .ok_or(GenerateError::NoImage)?;

    let data = inline
        .get("data")
        .and_then(Value::as_str)
        .ok_or_else(|| GenerateError::MalformedResponse("image part has no data".to_owned()))?;

    let bytes = STANDARD.decode(data).map_err(SnapshotError::from)?;
    Ok(Snapshot::from_image_bytes(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sample() -> Snapshot {
        Snapshot::capture(&RgbaImage::from_pixel(3, 2, Rgba([9, 8, 7, 255]))).unwrap()
    }

    #[test]
    fn test_request_carries_prompt_and_sketch() {
        let sketch = sample();
        let body = request_body(&sketch, "  a red chair ");

        let text = body.pointer("/contents/0/parts/0/text").and_then(Value::as_str).unwrap();
        assert!(text.ends_with("a red chair"));

        let image = &body["contents"][0]["parts"][1]["inline_data"];
        assert_eq!(image["mime_type"], "image/png");
        assert_eq!(image["data"], sketch.to_base64());
    }

    #[test]
    fn test_extracts_first_image_part() {
        let image = sample();
        let response = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Here is your render" },
                        { "inlineData": { "mimeType": "image/png", "data": image.to_base64() } }
                    ]
                }
            }]
        });

        assert_eq!(extract_image(&response).unwrap(), image);
    }

    #[test]
    fn test_accepts_snake_case_parts() {
        let image = sample();
        let response = json!({
            "candidates": [{
                "content": { "parts": [{ "inline_data": { "data": image.to_base64() } }] }
            }]
        });

        assert_eq!(extract_image(&response).unwrap(), image);
    }

    #[test]
    fn test_text_only_response_has_no_image() {
        let response = json!({
            "candidates": [{ "content": { "parts": [{ "text": "I can't draw that" }] } }]
        });

        assert!(matches!(extract_image(&response), Err(GenerateError::NoImage)));
    }

    #[test]
    fn test_missing_candidates_has_no_image() {
        let response = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert!(matches!(extract_image(&response), Err(GenerateError::NoImage)));
    }

    #[test]
    fn test_garbage_payload_is_reported() {
        let response = json!({
            "candidates": [{ "content": { "parts": [{ "inlineData": { "data": "%%%" } }] } }]
        });

        assert!(matches!(
            extract_image(&response),
            Err(GenerateError::Snapshot(SnapshotError::Base64(_)))
        ));
    }

    #[test]
    fn test_error_status_keeps_body() {
        let result = read_response(StatusCode::FORBIDDEN, r#"{"error":"bad key"}"#);

        match result {
            Err(GenerateError::Api { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, r#"{"error":"bad key"}"#);
            }
            other => panic!("expected an API error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_json_body_is_malformed() {
        assert!(matches!(
            read_response(StatusCode::OK, "<html>gateway timeout</html>"),
            Err(GenerateError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_successful_response_yields_image() {
        let image = sample();
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "inlineData": { "data": image.to_base64() } }] }
            }]
        })
        .to_string();

        assert_eq!(read_response(StatusCode::OK, &body).unwrap(), image);
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = AppConfig {
            base_url: "http://localhost:8080/v1beta/".to_owned(),
            model: "test-model".to_owned(),
            ..Default::default()
        };
        let generator = GeminiGenerator::new(&config, "key").unwrap();

        assert_eq!(
            generator.endpoint(),
            "http://localhost:8080/v1beta/models/test-model:generateContent"
        );
    }
}
