//! Model seam and the checked inference entry point.

use crate::InferenceError;
use crate::encoder::FeatureVector;

/// Tolerance on the sum of a returned distribution.
const SUM_TOLERANCE: f64 = 1e-6;

/// A trained multi-class classifier producing a probability distribution.
///
/// Implementations must be pure: the same input always yields the same output.
pub trait ProbabilisticModel: Send + Sync {
    /// Length of the input vector the model was trained on.
    fn num_features(&self) -> usize;

    /// Length of the output distribution.
    fn num_classes(&self) -> usize;

    /// Feature names embedded in the model file, if any.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Score one input vector. Callers go through [`infer`], which checks
    /// dimensions on both sides.
    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>, InferenceError>;
}

/// Run `model` on `vector`, enforcing the dimensional contract.
///
/// Rejects a vector whose length differs from the model's declared feature
/// count rather than truncating or padding it, and rejects outputs that are
/// not a probability distribution over `num_classes()` entries.
pub fn infer(
    model: &dyn ProbabilisticModel,
    vector: &FeatureVector,
) -> Result<Vec<f64>, InferenceError> {
    if vector.len() != model.num_features() {
        return Err(InferenceError::DimensionMismatch {
            expected: model.num_features(),
            found: vector.len(),
        });
    }

    let proba = model.predict_proba(vector.as_slice())?;

    if proba.len() != model.num_classes() {
        return Err(InferenceError::InvalidOutput(format!(
            "{} probabilities for {} classes",
            proba.len(),
            model.num_classes()
        )));
    }
    if let Some((i, p)) = proba
        .iter()
        .enumerate()
        .find(|(_, p)| !p.is_finite() || **p < 0.0)
    {
        return Err(InferenceError::InvalidOutput(format!(
            "class {i} has probability {p}"
        )));
    }
    let sum: f64 = proba.iter().sum();
    if (sum - 1.0).abs() > SUM_TOLERANCE {
        return Err(InferenceError::InvalidOutput(format!(
            "probabilities sum to {sum}"
        )));
    }

    Ok(proba)
}


#[cfg(test)]
mod tests {
    use super::testing::FixedModel;
    use super::*;

    struct BrokenModel(Vec<f64>);

    impl ProbabilisticModel for BrokenModel {
        fn num_features(&self) -> usize {
            2
        }
        fn num_classes(&self) -> usize {
            2
        }
        fn predict_proba(&self, _features: &[f32]) -> Result<Vec<f64>, InferenceError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn passes_distribution_through() {
        let model = FixedModel::new(3, vec![0.8, 0.2]);
        let proba = infer(&model, &FeatureVector::from(vec![1.0, 0.0, 1.0])).unwrap();
        assert_eq!(proba, vec![0.8, 0.2]);
        assert_eq!(model.calls(), 1);
    }

    #[test]
    fn rejects_short_vector() {
        let model = FixedModel::new(3, vec![0.8, 0.2]);
        let err = infer(&model, &FeatureVector::from(vec![1.0, 0.0])).unwrap_err();
        assert_eq!(
            err,
            InferenceError::DimensionMismatch {
                expected: 3,
                found: 2
            }
        );
        assert_eq!(model.calls(), 0, "model must not run on a mismatched vector");
    }

    #[test]
    fn rejects_long_vector() {
        let model = FixedModel::new(3, vec![0.8, 0.2]);
        let err = infer(&model, &FeatureVector::from(vec![0.0; 4])).unwrap_err();
        assert!(matches!(err, InferenceError::DimensionMismatch { found: 4, .. }));
    }

    #[test]
    fn rejects_wrong_class_count() {
        struct Short;
        impl ProbabilisticModel for Short {
            fn num_features(&self) -> usize {
                1
            }
            fn num_classes(&self) -> usize {
                3
            }
            fn predict_proba(&self, _: &[f32]) -> Result<Vec<f64>, InferenceError> {
                Ok(vec![0.5, 0.5])
            }
        }
        let err = infer(&Short, &FeatureVector::from(vec![0.0])).unwrap_err();
        assert!(matches!(err, InferenceError::InvalidOutput(_)));
    }

    #[test]
    fn rejects_negative_and_nan() {
        let v = FeatureVector::from(vec![0.0, 0.0]);
        assert!(infer(&BrokenModel(vec![1.2, -0.2]), &v).is_err());
        assert!(infer(&BrokenModel(vec![f64::NAN, 1.0]), &v).is_err());
    }

    #[test]
    fn rejects_unnormalised_output() {
        let v = FeatureVector::from(vec![0.0, 0.0]);
        assert!(infer(&BrokenModel(vec![0.6, 0.6]), &v).is_err());
    }
}
