pub mod contract;
pub mod normalize;

pub use contract::{
    ConfidenceBand, ErrorDetail, HealthResponse, LegacyPredictResponse, LegacyPrediction,
    LegacySymptomsResponse, RankedPrediction, SymptomRequest, SymptomResponse,
    SymptomsListResponse,
};
pub use normalize::{normalize_term, split_symptom_line};
