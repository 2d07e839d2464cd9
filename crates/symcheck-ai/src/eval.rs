//! Offline accuracy evaluation against a labelled CSV.
//!
//! The CSV has a header row. Column 0 is the target disease; every vocabulary
//! feature must appear as a named column (extra columns are ignored). Empty
//! cells count as `0`. Rows whose target is not in the label table are
//! counted and skipped.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, bail, ensure};
use tracing::{debug, info};

use crate::artifact::ModelArtifact;
use crate::encoder::FeatureVector;
use crate::inference::infer;

const MAX_MISSING_REPORTED: usize = 10;

/// Per-class tally of rows and hits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassTally {
    pub support: usize,
    pub correct: usize,
}

impl ClassTally {
    pub fn recall(&self) -> f64 {
        if self.support == 0 {
            0.0
        } else {
            self.correct as f64 / self.support as f64
        }
    }
}

/// Result of scoring every row of an evaluation set.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Rows scored (known target label).
    pub evaluated: usize,
    pub correct: usize,
    pub skipped_unknown_labels: usize,
    /// Indexed like the label table.
    pub per_class: Vec<ClassTally>,
}

impl Evaluation {
    pub fn accuracy(&self) -> f64 {
        if self.evaluated == 0 {
            0.0
        } else {
            self.correct as f64 / self.evaluated as f64
        }
    }
}

/// Evaluate `artifact` against the CSV file at `path`.
pub fn evaluate_csv(artifact: &ModelArtifact, path: &Path) -> anyhow::Result<Evaluation> {
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let eval = evaluate_reader(artifact, std::io::BufReader::new(file))
        .with_context(|| format!("evaluating {}", path.display()))?;
    info!(
        evaluated = eval.evaluated,
        correct = eval.correct,
        skipped = eval.skipped_unknown_labels,
        accuracy = eval.accuracy(),
        "evaluation finished"
    );
    Ok(eval)
}

/// Evaluate `artifact` against CSV text from any buffered reader.
pub fn evaluate_reader(artifact: &ModelArtifact, reader: impl BufRead) -> anyhow::Result<Evaluation> {
    let mut lines = reader.lines().enumerate();

    let header = match lines.next() {
        Some((_, line)) => line.context("reading header")?,
        None => bail!("CSV is empty"),
    };
    let header = split_record(&header);
    ensure!(
        header.len() >= 2,
        "CSV must have at least 2 columns (target + features)"
    );

    let columns: HashMap<&str, usize> = header
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let vocabulary = artifact.vocabulary();
    let mut feature_columns = Vec::with_capacity(vocabulary.len());
    let mut missing = Vec::new();
    for term in vocabulary.iter() {
        match columns.get(term) {
            Some(&col) => feature_columns.push(col),
            None => missing.push(term),
        }
    }
    if !missing.is_empty() {
        let shown: Vec<_> = missing.iter().take(MAX_MISSING_REPORTED).copied().collect();
        bail!(
            "{} vocabulary features missing from CSV columns (first {}): {}",
            missing.len(),
            shown.len(),
            shown.join(", ")
        );
    }

    let labels = artifact.labels();
    let mut eval = Evaluation {
        evaluated: 0,
        correct: 0,
        skipped_unknown_labels: 0,
        per_class: vec![ClassTally::default(); labels.len()],
    };
    let mut rows = 0usize;

    for (n, line) in lines {
        let line = line.with_context(|| format!("reading line {}", n + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        rows += 1;
        let record = split_record(&line);
        ensure!(
            record.len() == header.len(),
            "line {}: {} fields, header has {}",
            n + 1,
            record.len(),
            header.len()
        );

        let Some(target) = labels.position(record[0].as_str()) else {
            debug!(line = n + 1, label = %record[0], "skipping row with unknown label");
            eval.skipped_unknown_labels += 1;
            continue;
        };

        let values = feature_columns
            .iter()
            .map(|&col| parse_cell(&record[col]).with_context(|| format!("line {}, column '{}'", n + 1, header[col])))
            .collect::<anyhow::Result<Vec<f32>>>()?;

        let proba = infer(artifact.model(), &FeatureVector::from(values))
            .with_context(|| format!("line {}", n + 1))?;
        let predicted = argmax(&proba);

        eval.evaluated += 1;
        eval.per_class[target].support += 1;
        if predicted == Some(target) {
            eval.correct += 1;
            eval.per_class[target].correct += 1;
        }
    }

    ensure!(rows > 0, "CSV has no data rows");
    Ok(eval)
}

/// Index of the first maximum.
fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if best.is_none_or(|(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

fn parse_cell(cell: &str) -> anyhow::Result<f32> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(0.0);
    }
    cell.parse::<f32>()
        .with_context(|| format!("'{cell}' is not a number"))
}

/// Split one CSV record. Handles double-quoted fields with `""` escapes;
/// unquoted fields are trimmed.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches(['\r', '\n']).chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.trim().is_empty() && !quoted => {
                field.clear();
                quoted = true;
                in_quotes = true;
            }
            ',' if !in_quotes => {
                fields.push(finish_field(&mut field, quoted));
                quoted = false;
            }
            _ => field.push(c),
        }
    }
    fields.push(finish_field(&mut field, quoted));
    fields
}

fn finish_field(field: &mut String, quoted: bool) -> String {
    let out = if quoted {
        field.clone()
    } else {
        field.trim().to_string()
    };
    field.clear();
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ProbabilisticModel;
    use crate::vocab::TermTable;

    /// Predicts class 0 when feature 0 is set, class 1 otherwise.
    struct FirstFeature;

    impl ProbabilisticModel for FirstFeature {
        fn num_features(&self) -> usize {
            2
        }
        fn num_classes(&self) -> usize {
            2
        }
        fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>, crate::InferenceError> {
            Ok(if features[0] > 0.5 { vec![0.9, 0.1] } else { vec![0.3, 0.7] })
        }
    }

    fn artifact() -> ModelArtifact {
        ModelArtifact::from_parts(
            Arc::new(FirstFeature),
            TermTable::new(["fever", "headache"]).unwrap(),
            TermTable::new(["flu", "migraine"]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn scores_rows_by_argmax() {
        let csv = "\
disease,headache,rash,fever
flu,0,0,1
migraine,1,0,0
flu,1,1,0
";
        let eval = evaluate_reader(&artifact(), csv.as_bytes()).unwrap();
        assert_eq!(eval.evaluated, 3);
        assert_eq!(eval.correct, 2);
        assert!((eval.accuracy() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(eval.per_class[0], ClassTally { support: 2, correct: 1 });
        assert_eq!(eval.per_class[1].recall(), 1.0);
    }

    #[test]
    fn empty_cells_are_zero() {
        let csv = "disease,fever,headache\nmigraine,,\n";
        let eval = evaluate_reader(&artifact(), csv.as_bytes()).unwrap();
        assert_eq!(eval.correct, 1);
    }

    #[test]
    fn unknown_labels_skipped() {
        let csv = "disease,fever,headache\nflu,1,0\nchickenpox,1,0\n";
        let eval = evaluate_reader(&artifact(), csv.as_bytes()).unwrap();
        assert_eq!(eval.evaluated, 1);
        assert_eq!(eval.skipped_unknown_labels, 1);
    }

    #[test]
    fn missing_feature_columns_listed() {
        let csv = "disease,rash\nflu,1\n";
        let err = evaluate_reader(&artifact(), csv.as_bytes()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("fever, headache"), "{msg}");
    }

    #[test]
    fn ragged_row_is_error() {
        let csv = "disease,fever,headache\nflu,1\n";
        assert!(evaluate_reader(&artifact(), csv.as_bytes()).is_err());
    }

    #[test]
    fn non_numeric_cell_is_error() {
        let csv = "disease,fever,headache\nflu,yes,0\n";
        let err = evaluate_reader(&artifact(), csv.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("'yes' is not a number"), "{err:#}");
    }

    #[test]
    fn header_only_is_error() {
        assert!(evaluate_reader(&artifact(), "disease,fever,headache\n".as_bytes()).is_err());
        assert!(evaluate_reader(&artifact(), "".as_bytes()).is_err());
    }

    #[test]
    fn argmax_takes_first_maximum() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), Some(0));
        assert_eq!(argmax(&[0.1, 0.2, 0.7]), Some(2));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn splits_quoted_fields() {
        assert_eq!(
            split_record(r#""Common Cold", 1 ,"a ""b"", c",,"#),
            vec!["Common Cold", "1", r#"a "b", c"#, "", ""]
        );
        assert_eq!(split_record("flu,0,1\r"), vec!["flu", "0", "1"]);
    }

    #[test]
    fn evaluates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.csv");
        std::fs::write(&path, "disease,fever,headache\nflu,1,0\n").unwrap();
        let eval = evaluate_csv(&artifact(), &path).unwrap();
        assert_eq!(eval.accuracy(), 1.0);
    }
}
