//! Gradient-boosted tree ensembles
//!
//! Reads the text model format written by LightGBM's `save_model` and scores
//! rows against it. Only what a regression booster needs is supported:
//! numerical splits (with default-left and missing-value handling), single
//! output, and the identity / exp / squared output transforms.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use super::{ModelError, ModelSummary, Regressor};

const CATEGORICAL_MASK: u8 = 1;
const DEFAULT_LEFT_MASK: u8 = 2;
const MISSING_ZERO: u8 = 1;
const MISSING_NAN: u8 = 2;
const ZERO_THRESHOLD: f64 = 1e-35;

const END_OF_TREES: &str = "end of trees";

type Fields<'a> = HashMap<&'a str, (usize, &'a str)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputTransform {
    Identity,
    Exp,
    /// `regression` trained with `reg_sqrt`
    SignedSquare,
}

impl OutputTransform {
    fn for_objective(objective: &str) -> Result<Self, ModelError> {
        let mut parts = objective.split_whitespace();
        let name = parts.next().unwrap_or("regression");
        match name {
            "regression" | "regression_l2" | "l2" | "mean_squared_error" | "mse" | "regression_l1"
            | "l1" | "mean_absolute_error" | "mae" | "huber" | "fair" | "quantile" | "mape" => {
                if parts.any(|p| p == "sqrt") {
                    Ok(Self::SignedSquare)
                } else {
                    Ok(Self::Identity)
                }
            }
            "poisson" | "gamma" | "tweedie" => Ok(Self::Exp),
            other => Err(ModelError::Unsupported(format!("objective {other:?}"))),
        }
    }

    fn apply(self, raw: f64) -> f64 {
        match self {
            Self::Identity => raw,
            Self::Exp => raw.exp(),
            Self::SignedSquare => raw.signum() * raw * raw,
        }
    }
}

#[derive(Debug, Clone)]
struct Tree {
    split_feature: Vec<usize>,
    threshold: Vec<f64>,
    decision_type: Vec<u8>,
    left_child: Vec<i32>,
    right_child: Vec<i32>,
    leaf_value: Vec<f64>,
}

impl Tree {
    fn leaf_for(&self, row: &[f64]) -> f64 {
        if self.left_child.is_empty() {
            return self.leaf_value[0];
        }
        let mut node: i32 = 0;
        while node >= 0 {
            let n = node as usize;
            let fval = row.get(self.split_feature[n]).copied().unwrap_or(f64::NAN);
            node = if self.goes_left(n, fval) {
                self.left_child[n]
            } else {
                self.right_child[n]
            };
        }
        self.leaf_value[!node as usize]
    }

    fn goes_left(&self, node: usize, mut fval: f64) -> bool {
        let decision = self.decision_type[node];
        let missing = (decision >> 2) & 3;
        if fval.is_nan() && missing != MISSING_NAN {
            fval = 0.0;
        }
        if (missing == MISSING_ZERO && (-ZERO_THRESHOLD..=ZERO_THRESHOLD).contains(&fval))
            || (missing == MISSING_NAN && fval.is_nan())
        {
            return decision & DEFAULT_LEFT_MASK != 0;
        }
        fval <= self.threshold[node]
    }

    fn parse(block_line: usize, fields: &Fields<'_>, num_features: usize) -> Result<Self, ModelError> {
        let num_leaves: usize = scalar(fields, "num_leaves", block_line)?;
        if num_leaves == 0 {
            return Err(ModelError::parse(block_line, "tree has no leaves"));
        }
        if let Some((_, v)) = fields.get("is_linear") {
            if *v != "0" {
                return Err(ModelError::Unsupported("linear trees".to_string()));
            }
        }
        if let Some((line, v)) = fields.get("num_cat") {
            let num_cat: usize = v
                .parse()
                .map_err(|_| ModelError::parse(*line, format!("invalid num_cat: {v:?}")))?;
            if num_cat != 0 {
                return Err(ModelError::Unsupported("categorical splits".to_string()));
            }
        }

        let leaf_value: Vec<f64> = list(fields, "leaf_value", block_line, num_leaves)?;
        if num_leaves == 1 {
            return Ok(Self {
                split_feature: Vec::new(),
                threshold: Vec::new(),
                decision_type: Vec::new(),
                left_child: Vec::new(),
                right_child: Vec::new(),
                leaf_value,
            });
        }

        let internal = num_leaves - 1;
        let tree = Self {
            split_feature: list(fields, "split_feature", block_line, internal)?,
            threshold: list(fields, "threshold", block_line, internal)?,
            decision_type: list(fields, "decision_type", block_line, internal)?,
            left_child: list(fields, "left_child", block_line, internal)?,
            right_child: list(fields, "right_child", block_line, internal)?,
            leaf_value,
        };

        for node in 0..internal {
            if tree.split_feature[node] >= num_features {
                return Err(ModelError::parse(
                    block_line,
                    format!("node {node} splits on feature {} of {num_features}", tree.split_feature[node]),
                ));
            }
            if tree.decision_type[node] & CATEGORICAL_MASK != 0 {
                return Err(ModelError::Unsupported("categorical splits".to_string()));
            }
            for child in [tree.left_child[node], tree.right_child[node]] {
                // Children always carry a higher index than their parent, which
                // also rules out cycles.
                let valid = if child >= 0 {
                    (child as usize) > node && (child as usize) < internal
                } else {
                    (!child as usize) < num_leaves
                };
                if !valid {
                    return Err(ModelError::parse(
                        block_line,
                        format!("node {node} has invalid child {child}"),
                    ));
                }
            }
        }
        Ok(tree)
    }
}

fn required<'a>(fields: &Fields<'a>, key: &str, block_line: usize) -> Result<(usize, &'a str), ModelError> {
    fields
        .get(key)
        .copied()
        .ok_or_else(|| ModelError::parse(block_line, format!("missing field {key:?}")))
}

fn scalar<T: FromStr>(fields: &Fields<'_>, key: &str, block_line: usize) -> Result<T, ModelError> {
    let (line, value) = required(fields, key, block_line)?;
    value
        .parse()
        .map_err(|_| ModelError::parse(line, format!("invalid {key}: {value:?}")))
}

fn list<T: FromStr>(
    fields: &Fields<'_>,
    key: &str,
    block_line: usize,
    expected_len: usize,
) -> Result<Vec<T>, ModelError> {
    let (line, value) = required(fields, key, block_line)?;
    let items = value
        .split_whitespace()
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| ModelError::parse(line, format!("invalid {key} entry {v:?}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if items.len() != expected_len {
        return Err(ModelError::parse(
            line,
            format!("{key} has {} entries, expected {expected_len}", items.len()),
        ));
    }
    Ok(items)
}

/// A boosted regression tree ensemble
#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    trees: Vec<Tree>,
    feature_names: Vec<String>,
    num_features: usize,
    objective: String,
    output: OutputTransform,
    average_output: bool,
}

impl TreeEnsemble {
    /// Load a model saved with LightGBM's `save_model`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path)?;
        text.parse()
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn objective(&self) -> &str {
        &self.objective
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            num_trees: self.trees.len(),
            num_features: self.num_features,
            objective: self.objective.clone(),
            feature_names: self.feature_names.clone(),
        }
    }
}

impl FromStr for TreeEnsemble {
    type Err = ModelError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut header: Fields<'_> = HashMap::new();
        let mut blocks: Vec<(usize, Fields<'_>)> = Vec::new();
        let mut current: Option<(usize, Fields<'_>)> = None;
        let mut average_output = false;
        let mut seen_magic = false;
        let mut seen_end = false;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if !seen_magic {
                if line != "tree" {
                    return Err(ModelError::parse(line_no, "not a LightGBM text model"));
                }
                seen_magic = true;
                continue;
            }
            if line == END_OF_TREES {
                seen_end = true;
                break;
            }
            if line.starts_with("Tree=") {
                blocks.extend(current.take());
                current = Some((line_no, HashMap::new()));
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => {
                    let target = match current.as_mut() {
                        Some((_, fields)) => fields,
                        None => &mut header,
                    };
                    target.insert(key.trim(), (line_no, value.trim()));
                }
                None if current.is_none() && line == "average_output" => average_output = true,
                None => {}
            }
        }
        blocks.extend(current.take());

        if !seen_end {
            return Err(ModelError::parse(
                text.lines().count(),
                format!("missing {END_OF_TREES:?} marker"),
            ));
        }

        for key in ["num_class", "num_tree_per_iteration"] {
            if let Some((line, value)) = header.get(key) {
                if *value != "1" {
                    return Err(ModelError::Unsupported(format!("{key}={value} (line {line})")));
                }
            }
        }

        let max_feature_idx: usize = scalar(&header, "max_feature_idx", 1)?;
        let num_features = max_feature_idx + 1;

        let feature_names = match header.get("feature_names") {
            Some(_) => list::<String>(&header, "feature_names", 1, num_features)?,
            None => (0..num_features).map(|i| format!("Column_{i}")).collect(),
        };

        let objective = header
            .get("objective")
            .map(|(_, v)| v.to_string())
            .unwrap_or_else(|| "regression".to_string());
        let output = OutputTransform::for_objective(&objective)?;

        if blocks.is_empty() {
            return Err(ModelError::parse(1, "model contains no trees"));
        }
        let trees = blocks
            .iter()
            .map(|(line, fields)| Tree::parse(*line, fields, num_features))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            trees,
            feature_names,
            num_features,
            objective,
            output,
            average_output,
        })
    }
}

impl Regressor for TreeEnsemble {
    fn predict_row(&self, features: &[f64]) -> f64 {
        let mut sum: f64 = self.trees.iter().map(|t| t.leaf_for(features)).sum();
        if self.average_output {
            sum /= self.trees.len() as f64;
        }
        self.output.apply(sum)
    }

    fn num_features(&self) -> usize {
        self.num_features
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}
