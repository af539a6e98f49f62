//! Document-AI call: send one encoded image, get the annotation envelope back.
//!
//! This is the only stage that talks to the OCR service. It is a thin
//! request/response wrapper; reading records out of the response lives in
//! [`crate::pipeline::extract`] so the shape rules can be tested without a
//! network.
//!
//! ## No retries
//!
//! A failed call becomes an [`ImageError`] and the orchestrator moves on to
//! the next image. Pacing between calls is the only rate-limit protection.

use crate::error::ImageError;
use crate::pipeline::encode::EncodedImage;
use crate::schema::SCHEMA_NAME;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// A service that annotates an image against a JSON schema.
///
/// Implemented by [`MistralOcrClient`]; tests substitute a canned client.
#[async_trait]
pub trait DocumentAiClient: Send + Sync {
    /// Return the raw response envelope for one image.
    async fn annotate(&self, image: &EncodedImage, schema: &Value) -> Result<Value, ImageError>;
}

/// HTTP client for the Mistral document-AI OCR route.
pub struct MistralOcrClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    timeout_secs: u64,
}

impl MistralOcrClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            timeout_secs,
        })
    }

    fn transport_error(&self, file: &str, e: reqwest::Error) -> ImageError {
        if e.is_timeout() {
            ImageError::Timeout {
                file: file.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            ImageError::RequestFailed {
                file: file.to_string(),
                detail: e.to_string(),
            }
        }
    }
}

/// Request body for one image.
pub fn build_payload(model: &str, image: &EncodedImage, schema: &Value) -> Value {
    json!({
        "model": model,
        "document": {
            "type": "image_url",
            "image_url": image.to_data_url(),
        },
        "document_annotation_format": {
            "type": "json_schema",
            "json_schema": {
                "schema": schema,
                "name": SCHEMA_NAME,
            }
        }
    })
}

#[async_trait]
impl DocumentAiClient for MistralOcrClient {
    async fn annotate(&self, image: &EncodedImage, schema: &Value) -> Result<Value, ImageError> {
        let file = image.file_name.clone();
        let body = build_payload(&self.model, image, schema);

        debug!(
            model = %self.model,
            bytes = image.data.len(),
            "Sending {} to OCR service",
            file
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(&file, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageError::HttpStatus {
                file,
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ImageError::InvalidResponse {
                file,
                detail: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldMode;
    use crate::schema::annotation_schema;

    #[test]
    fn payload_shape() {
        let image = EncodedImage {
            file_name: "p1.jpg".into(),
            mime_type: "image/jpeg",
            data: "QUJD".into(),
        };
        let schema = annotation_schema(FieldMode::Numeric);
        let payload = build_payload("mistral-document-ai-2505", &image, &schema);

        assert_eq!(payload["model"], "mistral-document-ai-2505");
        assert_eq!(payload["document"]["type"], "image_url");
        assert_eq!(payload["document"]["image_url"], "data:image/jpeg;base64,QUJD");
        let format = &payload["document_annotation_format"];
        assert_eq!(format["type"], "json_schema");
        assert_eq!(format["json_schema"]["name"], "document_annotation");
        assert_eq!(format["json_schema"]["schema"], schema);
    }

    #[test]
    fn client_builds() {
        let client = MistralOcrClient::new("https://example.invalid/ocr", "m", "k", 5);
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_request_failure() {
        let client = MistralOcrClient::new("http://127.0.0.1:9/ocr", "m", "k", 5).unwrap();
        let image = EncodedImage {
            file_name: "p1.png".into(),
            mime_type: "image/png",
            data: "QUJD".into(),
        };
        let err = client
            .annotate(&image, &annotation_schema(FieldMode::Numeric))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageError::RequestFailed { .. }));
        assert_eq!(err.file(), "p1.png");
    }
}
