//! The prediction context: artifact, prebuilt encoder and default ranking.

use symcheck_core::SymptomResponse;
use tracing::error;

use crate::PredictError;
use crate::artifact::ModelArtifact;
use crate::encoder::FeatureEncoder;
use crate::inference::infer;
use crate::ranking::{Ranking, RankingPolicy, rank};
use crate::vocab::TermTable;

/// Everything a request needs, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Predictor {
    artifact: ModelArtifact,
    encoder: FeatureEncoder,
    policy: RankingPolicy,
}

impl Predictor {
    pub fn new(artifact: ModelArtifact, policy: RankingPolicy) -> Self {
        let encoder = FeatureEncoder::new(artifact.vocabulary());
        Self {
            artifact,
            encoder,
            policy,
        }
    }

    /// Encode, infer and rank under the default policy.
    pub fn predict<S: AsRef<str>>(&self, symptoms: &[S]) -> Result<Ranking, PredictError> {
        self.predict_with(symptoms, &self.policy)
    }

    /// Same as [`predict`](Self::predict) with an explicit policy.
    ///
    /// An empty query is rejected before the model runs. A query with no
    /// recognised terms is scored as the all-zero vector.
    pub fn predict_with<S: AsRef<str>>(
        &self,
        symptoms: &[S],
        policy: &RankingPolicy,
    ) -> Result<Ranking, PredictError> {
        if symptoms.is_empty() {
            return Err(PredictError::EmptyInput);
        }

        let vector = self.encoder.encode(symptoms);
        let distribution = infer(self.artifact.model(), &vector).inspect_err(|e| {
            error!(error = %e, "inference failed");
        })?;

        Ok(rank(&distribution, self.artifact.labels(), policy))
    }

    /// Predict under the default policy and fold the outcome into the
    /// response contract. Failures become `success: false` bodies.
    pub fn respond(&self, symptoms: Vec<String>) -> SymptomResponse {
        match self.predict(symptoms.as_slice()) {
            Ok(ranking) => SymptomResponse::ok(ranking.predictions, symptoms, ranking.band),
            Err(e @ PredictError::EmptyInput) => SymptomResponse::failure(e.to_string()),
            Err(PredictError::Inference(e)) => {
                SymptomResponse::failure(format!("Prediction error: {e}"))
            }
        }
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn policy(&self) -> &RankingPolicy {
        &self.policy
    }

    /// The recognised symptom vocabulary, in model order.
    pub fn symptoms(&self) -> &TermTable {
        self.artifact.vocabulary()
    }
}
