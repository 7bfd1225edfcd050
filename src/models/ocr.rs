use serde::{Deserialize, Serialize};

/// Scale an OCR engine reports its confidence in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceScale {
    /// 0.0 ..= 1.0
    Unit,
    /// 0 ..= 100
    Percent,
}

impl ConfidenceScale {
    /// Convert an engine value to the canonical 0..1 scale.
    pub fn normalize(self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        let unit = match self {
            ConfidenceScale::Unit => value,
            ConfidenceScale::Percent => value / 100.0,
        };
        Some(unit.clamp(0.0, 1.0))
    }
}

/// Raw output of the OCR collaborator. Confidence is always on the 0..1 scale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOcrOutput {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Cleaned OCR text plus its display form. Recomputed per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedExpression {
    pub cleaned_text: String,
    pub latex: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResponse {
    #[serde(flatten)]
    pub raw: RawOcrOutput,
    pub normalized: NormalizedExpression,
    pub note: String,
}
