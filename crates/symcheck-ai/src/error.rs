use std::path::PathBuf;

use thiserror::Error;

/// Failure to load or validate the three-file artifact bundle.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("missing artifacts: {}", display_paths(.0))]
    MissingArtifact(Vec<PathBuf>),

    #[error("corrupt artifact {}: {reason}", .path.display())]
    CorruptArtifact { path: PathBuf, reason: String },

    #[error("artifact mismatch: {0}")]
    ArtifactMismatch(String),
}

impl ArtifactError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptArtifact {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Model evaluation failed. Always a server-side fault.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("feature vector has {found} entries, model expects {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("model returned an invalid distribution: {0}")]
    InvalidOutput(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("No symptoms provided")]
    EmptyInput,

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
