//! Text renderings of predictions, vocabulary and evaluation reports.

use std::fmt::Write;

use symcheck_ai::{Evaluation, Ranking, TermTable};
use symcheck_core::SymptomResponse;

const RULE_WIDTH: usize = 60;

// ── predict --format ──

pub fn json(response: &SymptomResponse) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(response)?)
}

/// `rank,disease,confidence,confidence_percent`, one row per prediction.
pub fn csv(ranking: &Ranking) -> String {
    let mut out = String::from("rank,disease,confidence,confidence_percent");
    for p in &ranking.predictions {
        let _ = write!(
            out,
            "\n{},{},{:.4},{:.2}",
            p.rank,
            csv_field(&p.disease),
            p.confidence,
            p.confidence * 100.0
        );
    }
    out
}

/// One line naming the top prediction.
pub fn simple(ranking: &Ranking) -> String {
    match ranking.primary() {
        Some(p) => format!(
            "Diagnosis: {} (Confidence: {:.1}%)",
            p.disease,
            p.confidence * 100.0
        ),
        None => "Diagnosis: none above the confidence floor".to_string(),
    }
}

// ── interactive ──

/// Multi-line result card for the interactive loop.
pub fn card(ranking: &Ranking) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Prediction Results");
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    if let Some(top) = ranking.primary() {
        let _ = writeln!(out, "Primary Diagnosis: {}", top.disease);
        let _ = writeln!(
            out,
            "Confidence: {:.4} ({}, {})",
            top.confidence,
            top.confidence_percent,
            ranking.band.as_str()
        );
    } else {
        let _ = writeln!(out, "No condition above the confidence floor ({})", ranking.band.as_str());
    }
    if !ranking.predictions.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Top {} Possible Conditions:", ranking.predictions.len());
        for p in &ranking.predictions {
            let _ = writeln!(
                out,
                "  {}. {}: {:.4} ({})",
                p.rank, p.disease, p.confidence, p.confidence_percent
            );
        }
    }
    out
}

pub fn banner() -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!(
        "{rule}\nSymptom Checker\n{rule}\n\
         Enter symptoms separated by commas. Example: fever, cough, headache\n\
         Type 'list' to see all available symptoms, or 'quit' to exit.\n{rule}"
    )
}

// ── symptoms / eval ──

pub fn symptom_list(vocabulary: &TermTable) -> String {
    vocabulary.iter().collect::<Vec<_>>().join("\n")
}

/// Accuracy summary plus per-class recall for classes seen in the data.
pub fn evaluation(eval: &Evaluation, labels: &TermTable) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Evaluated {} rows ({} skipped with unknown labels)",
        eval.evaluated, eval.skipped_unknown_labels
    );
    let acc = eval.accuracy();
    let _ = writeln!(out, "Accuracy: {acc:.4} ({:.2}%)", acc * 100.0);

    let seen: Vec<_> = labels
        .iter()
        .zip(&eval.per_class)
        .filter(|(_, t)| t.support > 0)
        .collect();
    if seen.is_empty() {
        return out;
    }
    let width = seen.iter().map(|(name, _)| name.len()).max().unwrap_or(0).max(7);
    let _ = writeln!(out);
    let _ = writeln!(out, "  {:<width$}  {:>7}  {:>7}  {:>6}", "disease", "support", "correct", "recall");
    for (name, tally) in seen {
        let _ = writeln!(
            out,
            "  {:<width$}  {:>7}  {:>7}  {:>6.3}",
            name,
            tally.support,
            tally.correct,
            tally.recall()
        );
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use symcheck_ai::ClassTally;
    use symcheck_core::{ConfidenceBand, RankedPrediction};

    use super::*;

    fn prediction(rank: u32, disease: &str, confidence: f64) -> RankedPrediction {
        RankedPrediction {
            rank,
            disease: disease.into(),
            confidence,
            confidence_percent: symcheck_ai::format_percent(confidence),
        }
    }

    fn ranking() -> Ranking {
        Ranking {
            predictions: vec![prediction(1, "flu", 0.8), prediction(2, "Common, Cold", 0.15)],
            band: ConfidenceBand::High,
        }
    }

    #[test]
    fn csv_rows() {
        assert_eq!(
            csv(&ranking()),
            "rank,disease,confidence,confidence_percent\n\
             1,flu,0.8000,80.00\n\
             2,\"Common, Cold\",0.1500,15.00"
        );
    }

    #[test]
    fn simple_line() {
        assert_eq!(simple(&ranking()), "Diagnosis: flu (Confidence: 80.0%)");
        let empty = Ranking {
            predictions: vec![],
            band: ConfidenceBand::Low,
        };
        assert!(simple(&empty).contains("none"));
    }

    #[test]
    fn json_omits_error_on_success() {
        let r = ranking();
        let resp = SymptomResponse::ok(r.predictions, vec!["fever".into()], r.band);
        let text = json(&resp).unwrap();
        assert!(text.contains("\"model_confidence\": \"high\""));
        assert!(!text.contains("\"error\""));
    }

    #[test]
    fn card_lists_every_prediction() {
        let text = card(&ranking());
        assert!(text.contains("Primary Diagnosis: flu"));
        assert!(text.contains("Confidence: 0.8000 (80.00%, high)"));
        assert!(text.contains("Top 2 Possible Conditions:"));
        assert!(text.contains("  2. Common, Cold: 0.1500 (15.00%)"));
    }

    #[test]
    fn evaluation_report() {
        let labels = TermTable::new(["flu", "migraine", "gerd"]).unwrap();
        let eval = Evaluation {
            evaluated: 4,
            correct: 3,
            skipped_unknown_labels: 1,
            per_class: vec![
                ClassTally { support: 3, correct: 2 },
                ClassTally { support: 1, correct: 1 },
                ClassTally::default(),
            ],
        };
        let text = evaluation(&eval, &labels);
        assert!(text.contains("Evaluated 4 rows (1 skipped with unknown labels)"));
        assert!(text.contains("Accuracy: 0.7500 (75.00%)"));
        assert!(text.contains("migraine"));
        assert!(!text.contains("gerd"));
    }

    #[test]
    fn lists_symptoms_one_per_line() {
        let vocab = TermTable::new(["fever", "cough"]).unwrap();
        assert_eq!(symptom_list(&vocab), "fever\ncough");
    }
}
