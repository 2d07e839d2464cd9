//! Prediction pipeline: artifact bundle loading, symptom encoding, boosted-forest
//! inference, and ranked presentation.

mod error;
pub use error::{ArtifactError, InferenceError, PredictError};

pub mod artifact;
pub mod encoder;
pub mod eval;
pub mod forest;
pub mod inference;
pub mod predictor;
pub mod ranking;
pub mod vocab;

pub use artifact::{ArtifactPaths, ModelArtifact};
pub use encoder::{FeatureEncoder, FeatureVector};
pub use eval::{ClassTally, Evaluation, evaluate_csv};
pub use forest::Forest;
pub use inference::{ProbabilisticModel, infer};
pub use predictor::Predictor;
pub use ranking::{ConfidenceBands, Ranking, RankingPolicy, format_percent, rank};
pub use vocab::TermTable;
