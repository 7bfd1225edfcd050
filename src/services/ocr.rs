use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{ConfidenceScale, RawOcrOutput};
use crate::utils::to_data_url;

/// Image to text. Implementations report confidence on the 0..1 scale.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    async fn recognize(&self, image: &[u8], mime_hint: &str) -> AppResult<RawOcrOutput>;
    fn provider_id(&self) -> &'static str;
}

/// Mathpix when both credentials are set, otherwise [`UnconfiguredOcr`].
pub fn ocr_provider_from_config(config: &Config) -> AppResult<Arc<dyn OcrProvider>> {
    if config.mathpix_credentials().is_none() {
        log::warn!("⚠️ MATHPIX_APP_ID/MATHPIX_APP_KEY not set, OCR uploads will be rejected");
        return Ok(Arc::new(UnconfiguredOcr));
    }
    Ok(Arc::new(MathpixOcrProvider::from_config(config)?))
}

/// Placeholder provider: every call is a configuration error.
pub struct UnconfiguredOcr;

#[async_trait]
impl OcrProvider for UnconfiguredOcr {
    async fn recognize(&self, _image: &[u8], _mime_hint: &str) -> AppResult<RawOcrOutput> {
        Err(missing_credentials())
    }

    fn provider_id(&self) -> &'static str {
        "none"
    }
}

fn missing_credentials() -> AppError {
    AppError::Config("MATHPIX_APP_ID and MATHPIX_APP_KEY must be set for OCR".to_string())
}

/// Mathpix `v3/text`.
pub struct MathpixOcrProvider {
    app_id: String,
    app_key: String,
    client: reqwest::Client,
}

impl MathpixOcrProvider {
    pub fn new(app_id: String, app_key: String, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self {
            app_id,
            app_key,
            client,
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        let (app_id, app_key) = config.mathpix_credentials().ok_or_else(missing_credentials)?;
        Self::new(app_id.to_string(), app_key.to_string(), config.llm_timeout)
    }
}

#[async_trait]
impl OcrProvider for MathpixOcrProvider {
    async fn recognize(&self, image: &[u8], mime_hint: &str) -> AppResult<RawOcrOutput> {
        let request_body = serde_json::json!({
            "src": to_data_url(image, mime_hint),
            "formats": ["text"],
            "math_inline_delimiters": ["$", "$"],
            "rm_spaces": true
        });

        let response = self
            .client
            .post("https://api.mathpix.com/v3/text")
            .header("app_id", &self.app_id)
            .header("app_key", &self.app_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AppError::Transport(format!(
                "Mathpix OCR failed, status: {}, body: {}",
                status, text
            )));
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| AppError::Transport(format!("Failed to parse Mathpix response: {}", e)))?;
        Ok(mathpix_output(&body))
    }

    fn provider_id(&self) -> &'static str {
        "mathpix"
    }
}

/// Mathpix reports `confidence` in 0..1 and puts failures in `error`.
pub fn mathpix_output(body: &Value) -> RawOcrOutput {
    RawOcrOutput {
        text: body["text"].as_str().unwrap_or_default().trim().to_string(),
        confidence: body["confidence"]
            .as_f64()
            .and_then(|c| ConfidenceScale::Unit.normalize(c)),
        error_message: body["error"].as_str().map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_mathpix_fields() {
        let body = serde_json::json!({ "text": " 2x+3=7 \n", "confidence": 0.93 });
        let output = mathpix_output(&body);
        assert_eq!(output.text, "2x+3=7");
        assert_eq!(output.confidence, Some(0.93));
        assert_eq!(output.error_message, None);

        let failed = mathpix_output(&serde_json::json!({ "error": "Image too blurry" }));
        assert_eq!(failed.text, "");
        assert_eq!(failed.confidence, None);
        assert_eq!(failed.error_message.as_deref(), Some("Image too blurry"));
    }
}
