//! Request and response shapes shared by the HTTP service and the CLI.

use serde::{Deserialize, Serialize};

/// Symptom check request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomRequest {
    pub symptoms: Vec<String>,
}

/// One ranked condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPrediction {
    /// Dense, 1-based.
    pub rank: u32,
    pub disease: String,
    /// Unrounded model probability in `[0, 1]`.
    pub confidence: f64,
    /// Two-decimal percentage string, e.g. `"73.42%"`.
    pub confidence_percent: String,
}

/// Coarse label for the top prediction's probability.
///
/// This is a presentation policy over fixed thresholds, not a statistical
/// guarantee about the model's calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Response for `POST /api/check-symptoms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomResponse {
    pub success: bool,
    #[serde(default)]
    pub predictions: Vec<RankedPrediction>,
    #[serde(default)]
    pub input_symptoms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_confidence: Option<ConfidenceBand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SymptomResponse {
    pub fn ok(
        predictions: Vec<RankedPrediction>,
        input_symptoms: Vec<String>,
        band: ConfidenceBand,
    ) -> Self {
        Self {
            success: true,
            predictions,
            input_symptoms,
            model_confidence: Some(band),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            predictions: Vec::new(),
            input_symptoms: Vec::new(),
            model_confidence: None,
            error: Some(error.into()),
        }
    }
}

/// Response for `GET /api/symptoms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomsListResponse {
    pub success: bool,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub total_symptoms: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SymptomsListResponse {
    pub fn ok(symptoms: Vec<String>) -> Self {
        Self {
            success: true,
            total_symptoms: symptoms.len(),
            symptoms,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            symptoms: Vec::new(),
            total_symptoms: 0,
            error: Some(error.into()),
        }
    }
}

/// Response for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"healthy"` or `"degraded"`.
    pub status: String,
    pub service: String,
    pub model_loaded: bool,
    pub features_count: usize,
    pub diseases_count: usize,
    /// RFC 3339 timestamp of the artifact load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Entry in the legacy `POST /predict` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyPrediction {
    pub disease: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyPredictResponse {
    pub predictions: Vec<LegacyPrediction>,
}

impl From<&SymptomResponse> for LegacyPredictResponse {
    fn from(resp: &SymptomResponse) -> Self {
        Self {
            predictions: resp
                .predictions
                .iter()
                .map(|p| LegacyPrediction {
                    disease: p.disease.clone(),
                    confidence: p.confidence,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacySymptomsResponse {
    pub symptoms: Vec<String>,
}

/// Error body of the legacy routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}
