//! Imagen portrait client (predict REST API)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::infrastructure::ports::{ImageGenError, ImageGenPort, ImageRequest, ImageResult};
use crate::infrastructure::settings::EngineConfig;

/// Client for the Imagen `predict` endpoint.
#[derive(Clone)]
pub struct GeminiImageClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiImageClient {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300)) // 5 minute timeout for generation
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            &config.gemini_base_url,
            &config.gemini_api_key,
            &config.image_model,
        )
    }
}

#[async_trait]
impl ImageGenPort for GeminiImageClient {
    async fn generate(&self, request: ImageRequest) -> Result<ImageResult, ImageGenError> {
        let body = PredictRequest {
            instances: vec![PredictInstance {
                prompt: request.prompt,
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: request.aspect_ratio,
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:predict",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ImageGenError::Unavailable
                } else {
                    ImageGenError::GenerationFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ImageGenError::GenerationFailed(error_text));
        }

        let api_response: PredictResponse = response
            .json()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;

        first_image(api_response)
    }
}

fn first_image(response: PredictResponse) -> Result<ImageResult, ImageGenError> {
    response
        .predictions
        .into_iter()
        .find_map(|p| {
            p.bytes_base64_encoded.map(|data| ImageResult {
                data_base64: data,
                mime_type: p.mime_type.unwrap_or_else(|| "image/png".to_string()),
            })
        })
        .ok_or_else(|| ImageGenError::GenerationFailed("No image returned".to_string()))
}

// =============================================================================
// Imagen API types
// =============================================================================

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_prediction_with_bytes_wins() {
        let response: PredictResponse = serde_json::from_value(json!({
            "predictions": [
                { "raiMediaFilteredReason": "filtered" },
                { "bytesBase64Encoded": "AAAA", "mimeType": "image/jpeg" }
            ]
        }))
        .unwrap();

        let image = first_image(response).unwrap();
        assert_eq!(image.data_base64, "AAAA");
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[test]
    fn test_no_predictions_is_an_error() {
        let response: PredictResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            first_image(response),
            Err(ImageGenError::GenerationFailed(_))
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let body = PredictRequest {
            instances: vec![PredictInstance {
                prompt: "an elf".to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: "1:1".to_string(),
            },
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({
                "instances": [{ "prompt": "an elf" }],
                "parameters": { "sampleCount": 1, "aspectRatio": "1:1" }
            })
        );
    }
}
