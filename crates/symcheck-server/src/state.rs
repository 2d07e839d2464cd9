//! Shared handler state and service configuration.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use symcheck_ai::{ModelArtifact, Predictor, RankingPolicy};
use symcheck_core::HealthResponse;
use tracing::{error, info};

pub const SERVICE_NAME: &str = "Symptom Checker API";

/// Listener address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8002,
        }
    }
}

/// Whether the artifact bundle loaded.
#[derive(Debug, Clone)]
pub enum ModelStatus {
    Ready(Arc<Predictor>),
    /// Load failed; the message is reported by `/health`.
    Degraded(String),
}

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub status: ModelStatus,
    pub service: String,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl AppState {
    pub fn ready(predictor: Predictor) -> Self {
        Self {
            status: ModelStatus::Ready(Arc::new(predictor)),
            service: SERVICE_NAME.to_string(),
            loaded_at: Some(Utc::now()),
        }
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            status: ModelStatus::Degraded(reason.into()),
            service: SERVICE_NAME.to_string(),
            loaded_at: None,
        }
    }

    /// Load the bundle at `prefix`. A failed load yields a degraded state
    /// instead of an error so the service can still report its health.
    pub fn load(prefix: &Path, policy: RankingPolicy) -> Self {
        match ModelArtifact::load(prefix) {
            Ok(artifact) => {
                info!(
                    prefix = %prefix.display(),
                    top_k = policy.top_k,
                    min_confidence = ?policy.min_confidence,
                    "model ready"
                );
                Self::ready(Predictor::new(artifact, policy))
            }
            Err(e) => {
                error!(prefix = %prefix.display(), error = %e, "artifact load failed, starting degraded");
                Self::degraded(e.to_string())
            }
        }
    }

    pub fn predictor(&self) -> Option<&Arc<Predictor>> {
        match &self.status {
            ModelStatus::Ready(p) => Some(p),
            ModelStatus::Degraded(_) => None,
        }
    }

    pub fn health(&self) -> HealthResponse {
        let loaded_at = self
            .loaded_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true));
        match &self.status {
            ModelStatus::Ready(p) => HealthResponse {
                status: "healthy".to_string(),
                service: self.service.clone(),
                model_loaded: true,
                features_count: p.artifact().vocabulary().len(),
                diseases_count: p.artifact().labels().len(),
                loaded_at,
                error: None,
            },
            ModelStatus::Degraded(reason) => HealthResponse {
                status: "degraded".to_string(),
                service: self.service.clone(),
                model_loaded: false,
                features_count: 0,
                diseases_count: 0,
                loaded_at,
                error: Some(reason.clone()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_bundle_starts_degraded() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::load(&dir.path().join("absent"), RankingPolicy::full());

        assert!(state.predictor().is_none());
        let health = state.health();
        assert_eq!(health.status, "degraded");
        assert!(!health.model_loaded);
        assert!(health.loaded_at.is_none());
        assert!(health.error.unwrap().contains("missing artifacts"));
    }

    #[test]
    fn default_listener() {
        let config = ServiceConfig::default();
        assert_eq!((config.host.as_str(), config.port), ("0.0.0.0", 8002));
    }
}
