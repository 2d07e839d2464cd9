//! Turns a class distribution into the ranked, annotated prediction list.
//!
//! Classes are sorted by descending probability with ties kept in class-index
//! order, optionally filtered by a confidence floor, truncated to `top_k`, and
//! given dense 1-based ranks. The confidence band comes from the top
//! probability of the whole distribution, so it does not depend on the floor.

use symcheck_core::{ConfidenceBand, RankedPrediction};

use crate::vocab::TermTable;

/// Thresholds for the qualitative confidence band.
///
/// Presentation policy only: a `high` band says the top probability cleared a
/// fixed cut-off, nothing about how well calibrated the model is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceBands {
    /// Top probability strictly above this is `high`.
    pub high: f64,
    /// Top probability strictly above this (and not `high`) is `medium`.
    pub medium: f64,
}

impl Default for ConfidenceBands {
    fn default() -> Self {
        Self {
            high: 0.70,
            medium: 0.40,
        }
    }
}

impl ConfidenceBands {
    pub fn classify(&self, top: f64) -> ConfidenceBand {
        if top > self.high {
            ConfidenceBand::High
        } else if top > self.medium {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

/// How many entries to present, and which.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingPolicy {
    pub top_k: usize,
    /// Keep only classes with probability strictly above this.
    pub min_confidence: Option<f64>,
    pub bands: ConfidenceBands,
}

impl RankingPolicy {
    /// Up to five conditions, each above 1%.
    pub fn full() -> Self {
        Self {
            top_k: 5,
            min_confidence: Some(0.01),
            bands: ConfidenceBands::default(),
        }
    }

    /// Exactly the top three conditions, whatever their probability.
    pub fn lightweight() -> Self {
        Self {
            top_k: 3,
            min_confidence: None,
            bands: ConfidenceBands::default(),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: Option<f64>) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_bands(mut self, bands: ConfidenceBands) -> Self {
        self.bands = bands;
        self
    }
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self::full()
    }
}

/// Ranked predictions plus the band of the top class.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub predictions: Vec<RankedPrediction>,
    pub band: ConfidenceBand,
}

impl Ranking {
    pub fn primary(&self) -> Option<&RankedPrediction> {
        self.predictions.first()
    }
}

/// Rank `distribution` against `labels` under `policy`.
///
/// `distribution[i]` is the probability of `labels[i]`; entries past the end of
/// either slice are ignored.
pub fn rank(distribution: &[f64], labels: &TermTable, policy: &RankingPolicy) -> Ranking {
    let mut order: Vec<(usize, f64)> = distribution
        .iter()
        .copied()
        .enumerate()
        .take(labels.len())
        .collect();
    // `sort_by` is stable: equal probabilities keep class-index order.
    order.sort_by(|a, b| b.1.total_cmp(&a.1));

    let band = order
        .first()
        .map(|&(_, p)| policy.bands.classify(p))
        .unwrap_or(ConfidenceBand::Low);

    let predictions = order
        .into_iter()
        .filter(|&(_, p)| policy.min_confidence.is_none_or(|floor| p > floor))
        .take(policy.top_k)
        .zip(1u32..)
        .filter_map(|((i, p), rank)| {
            labels.get(i).map(|disease| RankedPrediction {
                rank,
                disease: disease.to_string(),
                confidence: p,
                confidence_percent: format_percent(p),
            })
        })
        .collect();

    Ranking { predictions, band }
}

/// `0.73421` → `"73.42%"`.
pub fn format_percent(confidence: f64) -> String {
    let pct = (confidence * 100.0 * 100.0).round() / 100.0;
    format!("{pct:.2}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> TermTable {
        TermTable::new(names.iter().copied()).unwrap()
    }

    fn diseases(r: &Ranking) -> Vec<&str> {
        r.predictions.iter().map(|p| p.disease.as_str()).collect()
    }

    #[test]
    fn scenario_flu_migraine() {
        let r = rank(&[0.8, 0.2], &labels(&["flu", "migraine"]), &RankingPolicy::full());
        assert_eq!(
            r.predictions,
            vec![
                RankedPrediction {
                    rank: 1,
                    disease: "flu".into(),
                    confidence: 0.8,
                    confidence_percent: "80.00%".into(),
                },
                RankedPrediction {
                    rank: 2,
                    disease: "migraine".into(),
                    confidence: 0.2,
                    confidence_percent: "20.00%".into(),
                },
            ]
        );
        assert_eq!(r.band, ConfidenceBand::High);
    }

    #[test]
    fn sorts_descending() {
        let r = rank(&[0.1, 0.6, 0.3], &labels(&["a", "b", "c"]), &RankingPolicy::lightweight());
        assert_eq!(diseases(&r), vec!["b", "c", "a"]);
        assert_eq!(r.predictions.iter().map(|p| p.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn ties_keep_class_index_order() {
        let r = rank(
            &[0.25, 0.25, 0.1, 0.25, 0.15],
            &labels(&["a", "b", "c", "d", "e"]),
            &RankingPolicy::full(),
        );
        assert_eq!(diseases(&r), vec!["a", "b", "d", "e", "c"]);
    }

    #[test]
    fn uniform_distribution_keeps_index_order() {
        let p = vec![0.125; 8];
        let names = ["h", "g", "f", "e", "d", "c", "b", "a"];
        let r = rank(&p, &labels(&names), &RankingPolicy::lightweight());
        assert_eq!(diseases(&r), vec!["h", "g", "f"]);
    }

    #[test]
    fn truncates_to_top_k() {
        let p = [0.05, 0.3, 0.2, 0.15, 0.1, 0.12, 0.08];
        let names = labels(&["a", "b", "c", "d", "e", "f", "g"]);
        assert_eq!(rank(&p, &names, &RankingPolicy::full()).predictions.len(), 5);
        assert_eq!(rank(&p, &names, &RankingPolicy::lightweight()).predictions.len(), 3);
        assert_eq!(
            rank(&p, &names, &RankingPolicy::lightweight().with_top_k(10)).predictions.len(),
            7
        );
    }

    #[test]
    fn floor_filters_before_truncation_and_ranks_stay_dense() {
        let p = [0.005, 0.9, 0.01, 0.085];
        let names = labels(&["a", "b", "c", "d"]);

        let full = rank(&p, &names, &RankingPolicy::full());
        // 0.01 is not strictly above the 1% floor.
        assert_eq!(diseases(&full), vec!["b", "d"]);
        assert_eq!(full.predictions.iter().map(|p| p.rank).collect::<Vec<_>>(), vec![1, 2]);

        let light = rank(&p, &names, &RankingPolicy::lightweight());
        assert_eq!(diseases(&light), vec!["b", "d", "c"]);
    }

    #[test]
    fn same_entry_point_covers_both_modes() {
        let p = [0.5, 0.495, 0.005];
        let names = labels(&["a", "b", "c"]);
        let policy = RankingPolicy::lightweight();
        assert_eq!(rank(&p, &names, &policy).predictions.len(), 3);
        assert_eq!(
            rank(&p, &names, &policy.with_min_confidence(Some(0.01))).predictions.len(),
            2
        );
    }

    #[test]
    fn band_thresholds() {
        let bands = ConfidenceBands::default();
        assert_eq!(bands.classify(0.71), ConfidenceBand::High);
        assert_eq!(bands.classify(0.70), ConfidenceBand::Medium);
        assert_eq!(bands.classify(0.41), ConfidenceBand::Medium);
        assert_eq!(bands.classify(0.40), ConfidenceBand::Low);
        assert_eq!(bands.classify(0.0), ConfidenceBand::Low);
    }

    #[test]
    fn band_uses_top_probability_even_when_filtered_out() {
        let policy = RankingPolicy::full().with_min_confidence(Some(0.6));
        let r = rank(&[0.55, 0.45], &labels(&["a", "b"]), &policy);
        assert!(r.predictions.is_empty());
        assert_eq!(r.band, ConfidenceBand::Medium);
        assert!(r.primary().is_none());
    }

    #[test]
    fn custom_bands() {
        let policy = RankingPolicy::full().with_bands(ConfidenceBands { high: 0.9, medium: 0.5 });
        let r = rank(&[0.8, 0.2], &labels(&["a", "b"]), &policy);
        assert_eq!(r.band, ConfidenceBand::Medium);
    }

    #[test]
    fn confidence_is_unrounded() {
        let r = rank(&[0.734219, 0.265781], &labels(&["a", "b"]), &RankingPolicy::full());
        assert_eq!(r.predictions[0].confidence, 0.734219);
        assert_eq!(r.predictions[0].confidence_percent, "73.42%");
    }

    #[test]
    fn percent_format() {
        assert_eq!(format_percent(0.8), "80.00%");
        assert_eq!(format_percent(0.7342), "73.42%");
        assert_eq!(format_percent(1.0), "100.00%");
        assert_eq!(format_percent(0.0), "0.00%");
        assert_eq!(format_percent(0.000049), "0.00%");
        assert_eq!(format_percent(0.12346), "12.35%");
    }

    #[test]
    fn percent_round_trips_within_half_a_basis_point() {
        for c in [0.0, 0.00123, 0.2, 0.333333, 0.5, 0.66666, 0.734219, 0.999949, 1.0] {
            let s = format_percent(c);
            let back: f64 = s.trim_end_matches('%').parse::<f64>().unwrap() / 100.0;
            assert!((back - c).abs() <= 0.005, "{c} → {s} → {back}");
        }
    }

    #[test]
    fn empty_distribution() {
        let r = rank(&[], &labels(&["a"]), &RankingPolicy::full());
        assert!(r.predictions.is_empty());
        assert_eq!(r.band, ConfidenceBand::Low);
    }
}
