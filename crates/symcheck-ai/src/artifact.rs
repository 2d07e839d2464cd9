//! The three-file artifact bundle: model, vocabulary and label table.
//!
//! All three files derive from one path prefix and are loaded together or not
//! at all. Once built, a [`ModelArtifact`] is immutable and shared behind `Arc`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::ArtifactError;
use crate::forest::Forest;
use crate::inference::ProbabilisticModel;
use crate::vocab::TermTable;

/// On-disk locations of one artifact bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub labels: PathBuf,
    pub features: PathBuf,
}

impl ArtifactPaths {
    /// `{prefix}.json`, `{prefix}.labels.txt`, `{prefix}.features.txt`.
    pub fn from_prefix(prefix: impl AsRef<Path>) -> Self {
        let prefix = prefix.as_ref().as_os_str();
        let with = |suffix: &str| {
            let mut p = prefix.to_os_string();
            p.push(suffix);
            PathBuf::from(p)
        };
        Self {
            model: with(".json"),
            labels: with(".labels.txt"),
            features: with(".features.txt"),
        }
    }

    /// Paths that do not exist, in model/labels/features order.
    pub fn missing(&self) -> Vec<PathBuf> {
        [&self.model, &self.labels, &self.features]
            .into_iter()
            .filter(|p| !p.is_file())
            .cloned()
            .collect()
    }
}

/// A loaded, validated model plus its vocabulary and label table.
#[derive(Clone)]
pub struct ModelArtifact {
    model: Arc<dyn ProbabilisticModel>,
    vocabulary: TermTable,
    labels: TermTable,
}

impl fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("features", &self.vocabulary.len())
            .field("classes", &self.labels.len())
            .finish_non_exhaustive()
    }
}

impl ModelArtifact {
    /// Load and cross-check the bundle at `prefix`.
    pub fn load(prefix: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let paths = ArtifactPaths::from_prefix(prefix);
        let missing = paths.missing();
        if !missing.is_empty() {
            return Err(ArtifactError::MissingArtifact(missing));
        }

        let vocabulary = TermTable::load(&paths.features)?;
        let labels = TermTable::load(&paths.labels)?;
        let forest = Forest::load(&paths.model)?;

        let artifact = Self::from_parts(Arc::new(forest), vocabulary, labels)?;
        info!(
            features = artifact.vocabulary.len(),
            diseases = artifact.labels.len(),
            model = %paths.model.display(),
            "artifact bundle loaded"
        );
        Ok(artifact)
    }

    /// Assemble a bundle from already-loaded parts, running the same
    /// dimensional checks as [`load`](Self::load).
    pub fn from_parts(
        model: Arc<dyn ProbabilisticModel>,
        vocabulary: TermTable,
        labels: TermTable,
    ) -> Result<Self, ArtifactError> {
        if labels.len() != model.num_classes() {
            return Err(ArtifactError::ArtifactMismatch(format!(
                "label table has {} entries, model has {} classes",
                labels.len(),
                model.num_classes()
            )));
        }
        if vocabulary.len() != model.num_features() {
            return Err(ArtifactError::ArtifactMismatch(format!(
                "vocabulary has {} entries, model expects {} features",
                vocabulary.len(),
                model.num_features()
            )));
        }
        if let Some(names) = model.feature_names()
            && names != vocabulary.as_slice()
        {
            let at = names
                .iter()
                .zip(vocabulary.iter())
                .position(|(a, b)| a != b)
                .unwrap_or(0);
            return Err(ArtifactError::ArtifactMismatch(format!(
                "model feature names differ from vocabulary at index {at}"
            )));
        }

        Ok(Self {
            model,
            vocabulary,
            labels,
        })
    }

    pub fn model(&self) -> &dyn ProbabilisticModel {
        self.model.as_ref()
    }

    pub fn vocabulary(&self) -> &TermTable {
        &self.vocabulary
    }

    pub fn labels(&self) -> &TermTable {
        &self.labels
    }
}
