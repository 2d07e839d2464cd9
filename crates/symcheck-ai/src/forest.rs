//! Boosted-tree inference for XGBoost models saved in JSON format.
//!
//! Supports the `gbtree` and `dart` boosters with scalar leaves and numeric
//! splits, under the `multi:softprob`, `multi:softmax` and `binary:logistic`
//! objectives. Each tree adds its leaf value to the margin of the output group
//! named by `tree_info`; margins start at `base_score` and are turned into a
//! distribution by softmax (multi-class) or sigmoid (binary).
//!
//! Traversal follows XGBoost: go left when `value < split_condition`, and a
//! NaN input follows the node's `default_left` direction.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::inference::ProbabilisticModel;
use crate::{ArtifactError, InferenceError};

/// Output transform selected by the model's objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// `multi:softprob` / `multi:softmax`: one margin per class, softmax.
    Softmax { classes: usize },
    /// `binary:logistic`: one margin, sigmoid, exposed as `[1 - p, p]`.
    Logistic,
}

impl Objective {
    /// Number of margins the trees accumulate into.
    pub fn groups(&self) -> usize {
        match self {
            Self::Softmax { classes } => *classes,
            Self::Logistic => 1,
        }
    }

    /// Length of the probability distribution.
    pub fn classes(&self) -> usize {
        match self {
            Self::Softmax { classes } => *classes,
            Self::Logistic => 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
        default_left: bool,
    },
    Leaf(f32),
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Walk from the root to a leaf. Structure is validated at load, so
    /// every index is in range and the walk terminates.
    fn leaf_value(&self, features: &[f32]) -> f32 {
        let mut i = 0;
        loop {
            match self.nodes[i] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let x = features[feature];
                    i = if x.is_nan() {
                        if default_left { left } else { right }
                    } else if x < threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// A trained boosted-tree ensemble.
#[derive(Debug, Clone)]
pub struct Forest {
    trees: Vec<Tree>,
    /// Output group each tree contributes to.
    tree_group: Vec<usize>,
    /// Per-tree scale; `1.0` except for dart.
    tree_weight: Vec<f32>,
    /// Initial margin per output group.
    base_margin: Vec<f32>,
    num_features: usize,
    objective: Objective,
    feature_names: Option<Vec<String>>,
}

impl Forest {
    /// Load an XGBoost JSON model file.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ArtifactError::corrupt(path, e.to_string()))?;
        let forest = Self::from_json_str(&text).map_err(|reason| ArtifactError::corrupt(path, reason))?;
        info!(
            trees = forest.num_trees(),
            features = forest.num_features,
            classes = forest.objective.classes(),
            model = %path.display(),
            "loaded boosted forest"
        );
        Ok(forest)
    }

    /// Parse and validate a model from its JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, String> {
        let raw: RawModel = serde_json::from_str(text).map_err(|e| format!("invalid model JSON: {e}"))?;
        Self::from_raw(raw.learner)
    }

    fn from_raw(learner: RawLearner) -> Result<Self, String> {
        let params = &learner.learner_model_param;
        let num_features = parse_count("num_feature", &params.num_feature)?;
        let num_class = parse_count("num_class", &params.num_class)?;

        let objective = match learner.objective.name.as_str() {
            "multi:softprob" | "multi:softmax" => {
                if num_class < 2 {
                    return Err(format!("objective {} with num_class {num_class}", learner.objective.name));
                }
                Objective::Softmax { classes: num_class }
            }
            "binary:logistic" => Objective::Logistic,
            other => return Err(format!("unsupported objective '{other}'")),
        };
        let groups = objective.groups();

        let base_score = parse_base_score(&params.base_score)?;
        let base_margin = match (objective, base_score.as_slice()) {
            (Objective::Logistic, [p]) => vec![prob_to_margin(*p)?],
            (Objective::Softmax { .. }, [m]) => vec![*m; groups],
            (Objective::Softmax { .. }, ms) if ms.len() == groups => ms.to_vec(),
            (_, ms) => {
                return Err(format!(
                    "base_score has {} values for {groups} output groups",
                    ms.len()
                ));
            }
        };

        let (raw_trees, tree_weight) = match learner.gradient_booster {
            RawBooster::Gbtree { model } => {
                let n = model.trees.len();
                (model, vec![1.0; n])
            }
            RawBooster::Dart {
                gbtree,
                weight_drop,
            } => {
                if weight_drop.len() != gbtree.model.trees.len() {
                    return Err(format!(
                        "dart weight_drop has {} entries for {} trees",
                        weight_drop.len(),
                        gbtree.model.trees.len()
                    ));
                }
                (gbtree.model, weight_drop)
            }
        };

        if raw_trees.tree_info.len() != raw_trees.trees.len() {
            return Err(format!(
                "tree_info has {} entries for {} trees",
                raw_trees.tree_info.len(),
                raw_trees.trees.len()
            ));
        }
        let tree_group = raw_trees
            .tree_info
            .iter()
            .enumerate()
            .map(|(t, &g)| match usize::try_from(g) {
                Ok(g) if g < groups => Ok(g),
                _ => Err(format!("tree {t} targets group {g}, model has {groups}")),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let trees = raw_trees
            .trees
            .into_iter()
            .enumerate()
            .map(|(t, raw)| build_tree(raw, num_features).map_err(|e| format!("tree {t}: {e}")))
            .collect::<Result<Vec<_>, _>>()?;

        let feature_names = if learner.feature_names.is_empty() {
            None
        } else if learner.feature_names.len() != num_features {
            return Err(format!(
                "model lists {} feature names but num_feature is {num_features}",
                learner.feature_names.len()
            ));
        } else {
            Some(learner.feature_names)
        };

        Ok(Self {
            trees,
            tree_group,
            tree_weight,
            base_margin,
            num_features,
            objective,
            feature_names,
        })
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Raw per-group margins before the output transform.
    pub fn margins(&self, features: &[f32]) -> Vec<f32> {
        let mut margins = self.base_margin.clone();
        for ((tree, &group), &weight) in self.trees.iter().zip(&self.tree_group).zip(&self.tree_weight) {
            margins[group] += weight * tree.leaf_value(features);
        }
        margins
    }
}

impl ProbabilisticModel for Forest {
    fn num_features(&self) -> usize {
        self.num_features
    }

    fn num_classes(&self) -> usize {
        self.objective.classes()
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>, InferenceError> {
        if features.len() != self.num_features {
            return Err(InferenceError::DimensionMismatch {
                expected: self.num_features,
                found: features.len(),
            });
        }
        let margins = self.margins(features);
        Ok(match self.objective {
            Objective::Softmax { .. } => softmax(&margins),
            Objective::Logistic => {
                let p = sigmoid(f64::from(margins[0]));
                vec![1.0 - p, p]
            }
        })
    }
}

fn softmax(margins: &[f32]) -> Vec<f64> {
    let max = margins.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f64> = margins.iter().map(|&m| f64::from(m - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn prob_to_margin(p: f32) -> Result<f32, String> {
    if !(p > 0.0 && p < 1.0) {
        return Err(format!("base_score {p} is not a probability for binary:logistic"));
    }
    Ok((p / (1.0 - p)).ln())
}

fn parse_count(name: &str, value: &str) -> Result<usize, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("{name} '{value}' is not a count"))
}

/// `"5E-1"`, `"[5E-1]"` and `"[1E0,2E0]"` are all accepted.
fn parse_base_score(value: &str) -> Result<Vec<f32>, String> {
    let inner = value.trim().trim_start_matches('[').trim_end_matches(']');
    let scores = inner
        .split(',')
        .map(|s| {
            s.trim()
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("base_score '{value}' is not numeric"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(scores)
}

fn build_tree(raw: RawTree, num_features: usize) -> Result<Tree, String> {
    let n = raw.left_children.len();
    if n == 0 {
        return Err("no nodes".into());
    }
    for (name, len) in [
        ("right_children", raw.right_children.len()),
        ("split_indices", raw.split_indices.len()),
        ("split_conditions", raw.split_conditions.len()),
        ("default_left", raw.default_left.len()),
    ] {
        if len != n {
            return Err(format!("{name} has {len} entries, left_children has {n}"));
        }
    }
    if raw.split_type.iter().any(|&t| t != 0) {
        return Err("categorical splits are not supported".into());
    }
    if let Some(size) = raw.tree_param.as_ref().and_then(|p| p.size_leaf_vector.as_deref())
        && parse_count("size_leaf_vector", size)? > 1
    {
        return Err("vector leaves are not supported".into());
    }

    let child = |i: usize, v: i64| -> Result<usize, String> {
        match usize::try_from(v) {
            Ok(c) if c < n && c != i => Ok(c),
            _ => Err(format!("node {i} has invalid child {v}")),
        }
    };

    let mut nodes = Vec::with_capacity(n);
    for i in 0..n {
        let (left, right) = (raw.left_children[i], raw.right_children[i]);
        if left == -1 {
            if right != -1 {
                return Err(format!("node {i} has a right child but no left child"));
            }
            nodes.push(Node::Leaf(raw.split_conditions[i]));
            continue;
        }
        let feature = match usize::try_from(raw.split_indices[i]) {
            Ok(f) if f < num_features => f,
            _ => {
                return Err(format!(
                    "node {i} splits on feature {}, model has {num_features}",
                    raw.split_indices[i]
                ));
            }
        };
        nodes.push(Node::Split {
            feature,
            threshold: raw.split_conditions[i],
            left: child(i, left)?,
            right: child(i, right)?,
            default_left: raw.default_left[i].is_set(),
        });
    }

    check_is_tree(&nodes)?;
    Ok(Tree { nodes })
}

/// Every node must be reached at most once from the root.
fn check_is_tree(nodes: &[Node]) -> Result<(), String> {
    let mut seen = vec![false; nodes.len()];
    let mut stack = vec![0usize];
    while let Some(i) = stack.pop() {
        if std::mem::replace(&mut seen[i], true) {
            return Err(format!("node {i} is reachable by more than one path"));
        }
        if let Node::Split { left, right, .. } = nodes[i] {
            stack.push(left);
            stack.push(right);
        }
    }
    Ok(())
}

// ── Serialized layout ──

#[derive(Deserialize)]
struct RawModel {
    learner: RawLearner,
}

#[derive(Deserialize)]
struct RawLearner {
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: RawBooster,
    learner_model_param: RawModelParam,
    objective: RawObjective,
}

#[derive(Deserialize)]
struct RawModelParam {
    base_score: String,
    num_class: String,
    num_feature: String,
}

#[derive(Deserialize)]
struct RawObjective {
    name: String,
}

#[derive(Deserialize)]
#[serde(tag = "name")]
enum RawBooster {
    #[serde(rename = "gbtree")]
    Gbtree { model: RawTrees },
    #[serde(rename = "dart")]
    Dart {
        gbtree: RawDartTrees,
        weight_drop: Vec<f32>,
    },
}

#[derive(Deserialize)]
struct RawDartTrees {
    model: RawTrees,
}

#[derive(Deserialize)]
struct RawTrees {
    trees: Vec<RawTree>,
    tree_info: Vec<i64>,
}

#[derive(Deserialize)]
struct RawTree {
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
    #[serde(default)]
    split_type: Vec<u8>,
    #[serde(default)]
    tree_param: Option<RawTreeParam>,
}

#[derive(Deserialize)]
struct RawTreeParam {
    #[serde(default)]
    size_leaf_vector: Option<String>,
}

/// Older writers emit booleans, newer ones emit 0/1.
#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    fn is_set(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
        }
    }
}
