//! Pre-fitted model artifacts: feature scaler, regressor and line encoder.
//!
//! Artifacts are JSON documents tagged by `kind`. Every loader validates the
//! feature count against [`FEATURE_COUNT`] so a mismatched artifact fails at
//! load time instead of scoring garbage.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{DashboardError, Result};
use crate::features::{FeatureVector, FEATURE_COUNT};

pub trait FeatureScaler {
    fn transform(&self, features: &FeatureVector) -> FeatureVector;
}

pub trait Regressor {
    fn predict(&self, features: &FeatureVector) -> f64;
}

pub trait LineEncoder {
    fn encode(&self, label: &str) -> Result<i64>;
}

fn read_json<T>(path: &Path) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let raw = fs::read_to_string(path).map_err(|err| DashboardError::io(path, err))?;
    serde_json::from_str(&raw).map_err(|err| DashboardError::artifact(path, err))
}

fn fixed_width(artifact: &str, values: &[f64]) -> Result<[f64; FEATURE_COUNT]> {
    <[f64; FEATURE_COUNT]>::try_from(values).map_err(|_| DashboardError::FeatureCount {
        artifact: artifact.to_string(),
        expected: FEATURE_COUNT,
        found: values.len(),
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ScalerDocument {
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scaler {
    /// `(x - mean) / scale`
    Standard {
        mean: [f64; FEATURE_COUNT],
        scale: [f64; FEATURE_COUNT],
    },
    /// `x * scale + min`
    MinMax {
        min: [f64; FEATURE_COUNT],
        scale: [f64; FEATURE_COUNT],
    },
}

impl Scaler {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let scaler = match read_json::<ScalerDocument>(path)? {
            ScalerDocument::Standard { mean, scale } => {
                let scale = fixed_width("scaler.scale", &scale)?;
                if scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                    return Err(DashboardError::artifact(path, "scale must be finite and non-zero"));
                }
                Scaler::Standard {
                    mean: fixed_width("scaler.mean", &mean)?,
                    scale,
                }
            }
            ScalerDocument::MinMax { min, scale } => Scaler::MinMax {
                min: fixed_width("scaler.min", &min)?,
                scale: fixed_width("scaler.scale", &scale)?,
            },
        };
        info!(path = %path.display(), "loaded feature scaler");
        Ok(scaler)
    }
}

impl FeatureScaler for Scaler {
    fn transform(&self, features: &FeatureVector) -> FeatureVector {
        let x = features.values();
        let mut out = [0.0; FEATURE_COUNT];
        for (i, value) in out.iter_mut().enumerate() {
            *value = match self {
                Scaler::Standard { mean, scale } => (x[i] - mean[i]) / scale[i],
                Scaler::MinMax { min, scale } => x[i] * scale[i] + min[i],
            };
        }
        FeatureVector(out)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinearRegressor {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(f64),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    /// Children always sit after their parent, so the walk terminates.
    fn validate(&self) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= FEATURE_COUNT {
                    return Err(format!("node {} splits on feature {}", idx, feature));
                }
                for child in [left, right] {
                    if *child <= idx || *child >= self.nodes.len() {
                        return Err(format!("node {} points at invalid child {}", idx, child));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf_value(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf(value) => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => idx = if x[*feature] < *threshold { *left } else { *right },
            }
        }
    }
}

/// Gradient-boosted regression trees: `base_score + sum(leaf)`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Model {
    Linear(LinearRegressor),
    TreeEnsemble(TreeEnsemble),
}

impl Model {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let model: Model = read_json(path)?;
        match &model {
            Model::Linear(linear) => {
                fixed_width("model.coefficients", &linear.coefficients)?;
            }
            Model::TreeEnsemble(ensemble) => {
                for (i, tree) in ensemble.trees.iter().enumerate() {
                    tree.validate()
                        .map_err(|reason| DashboardError::artifact(path, format!("tree {}: {}", i, reason)))?;
                }
            }
        }
        info!(path = %path.display(), kind = model.kind(), "loaded regressor");
        Ok(model)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Model::Linear(_) => "linear",
            Model::TreeEnsemble(_) => "tree_ensemble",
        }
    }
}

impl Regressor for Model {
    fn predict(&self, features: &FeatureVector) -> f64 {
        let x = features.values();
        match self {
            Model::Linear(linear) => {
                linear.intercept
                    + linear
                        .coefficients
                        .iter()
                        .zip(x.iter())
                        .map(|(c, v)| c * v)
                        .sum::<f64>()
            }
            Model::TreeEnsemble(ensemble) => {
                ensemble.base_score + ensemble.trees.iter().map(|t| t.leaf_value(x)).sum::<f64>()
            }
        }
    }
}

/// Label-to-index encoder; the code of a label is its position in `classes`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let encoder: LabelEncoder = read_json(path)?;
        if encoder.classes.is_empty() {
            return Err(DashboardError::artifact(path, "encoder has no classes"));
        }
        info!(path = %path.display(), classes = encoder.classes.len(), "loaded line encoder");
        Ok(encoder)
    }
}

impl LineEncoder for LabelEncoder {
    fn encode(&self, label: &str) -> Result<i64> {
        self.classes
            .iter()
            .position(|class| class == label)
            .map(|idx| idx as i64)
            .ok_or_else(|| DashboardError::UnknownLineLabel(label.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_json(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn sample() -> FeatureVector {
        FeatureVector::build(10, 2, 5.0, 28.6139, 77.209, 2, 1)
    }

    #[test]
    fn standard_scaler_centres_and_scales() {
        let file = write_json(
            r#"{"kind":"standard","mean":[10,2,5,28,77,2,1],"scale":[2,1,1,1,1,1,1]}"#,
        );
        let scaler = Scaler::load(file.path()).unwrap();
        let scaled = scaler.transform(&FeatureVector::build(14, 2, 5.0, 28.0, 77.0, 2, 1));
        assert_eq!(scaled.values(), &[2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn scaler_with_wrong_width_fails_fast() {
        let file = write_json(r#"{"kind":"standard","mean":[0,0,0],"scale":[1,1,1]}"#);
        match Scaler::load(file.path()) {
            Err(DashboardError::FeatureCount { expected, found, .. }) => {
                assert_eq!(expected, 7);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_scaler_is_an_io_error() {
        assert!(matches!(
            Scaler::load("/no/such/scaler.json"),
            Err(DashboardError::Io { .. })
        ));
    }

    #[test]
    fn min_max_scaler() {
        let file = write_json(
            r#"{"kind":"min_max","min":[1,0,0,0,0,0,0],"scale":[0.5,1,1,1,1,1,1]}"#,
        );
        let scaler = Scaler::load(file.path()).unwrap();
        assert_eq!(scaler.transform(&sample()).values()[0], 6.0);
    }

    #[test]
    fn linear_model_predicts_dot_product() {
        let file = write_json(
            r#"{"kind":"linear","coefficients":[100,0,0,0,0,1000,0],"intercept":-50}"#,
        );
        let model = Model::load(file.path()).unwrap();
        assert_eq!(model.kind(), "linear");
        assert_eq!(model.predict(&sample()), 1000.0 + 2000.0 - 50.0);
    }

    #[test]
    fn tree_ensemble_sums_leaves() {
        let file = write_json(
            r#"{
                "kind": "tree_ensemble",
                "base_score": 500,
                "trees": [
                    {"nodes": [
                        {"split": {"feature": 0, "threshold": 20, "left": 1, "right": 2}},
                        {"leaf": 1000},
                        {"leaf": 3000}
                    ]},
                    {"nodes": [{"leaf": -200}]}
                ]
            }"#,
        );
        let model = Model::load(file.path()).unwrap();
        assert_eq!(model.predict(&sample()), 500.0 + 1000.0 - 200.0);
        let older = FeatureVector::build(20, 2, 5.0, 28.6, 77.2, 2, 1);
        assert_eq!(model.predict(&older), 500.0 + 3000.0 - 200.0);
    }

    #[test]
    fn tree_with_backward_edge_is_rejected() {
        let file = write_json(
            r#"{"kind":"tree_ensemble","trees":[{"nodes":[
                {"split":{"feature":0,"threshold":1,"left":0,"right":1}},
                {"leaf":1}
            ]}]}"#,
        );
        assert!(matches!(
            Model::load(file.path()),
            Err(DashboardError::Artifact { .. })
        ));
    }

    #[test]
    fn encoder_maps_label_to_position() {
        let encoder = LabelEncoder {
            classes: vec!["Blue Line".into(), "Red Line".into()],
        };
        assert_eq!(encoder.encode("Red Line").unwrap(), 1);
        assert!(matches!(
            encoder.encode("Silver Line"),
            Err(DashboardError::UnknownLineLabel(_))
        ));
    }
}
