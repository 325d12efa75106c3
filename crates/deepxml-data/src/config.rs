// Dataset configuration

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use deepxml_core::{Error, Result};

use crate::features::FeatureType;
use crate::labels::LabelType;

/// Whether a dataset feeds training or inference.
///
/// Decides how non-binary labels are treated and whether label metadata is
/// written or read by `process_labels`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Train,
    Predict,
}

impl Mode {
    pub fn is_train(self) -> bool {
        self == Mode::Train
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "train" => Ok(Mode::Train),
            "predict" | "test" | "val" => Ok(Mode::Predict),
            other => Err(Error::InvalidConfig(format!("unknown mode {other:?}"))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Train => "train",
            Mode::Predict => "predict",
        })
    }
}

/// Where an [`XmlDataset`](crate::XmlDataset) loads from and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub data_dir: PathBuf,
    /// Feature file name relative to `data_dir`.
    pub feature_file: Option<String>,
    /// Label file name relative to `data_dir`.
    pub label_file: Option<String>,
    pub mode: Mode,
    /// Split file restricting the feature columns.
    pub feature_indices: Option<PathBuf>,
    /// Split file restricting the label columns.
    pub label_indices: Option<PathBuf>,
    /// L2-normalize every feature row.
    pub normalize_features: bool,
    /// Max-normalize (train) or binarize (predict) label rows.
    pub normalize_labels: bool,
    pub feature_type: FeatureType,
    pub label_type: LabelType,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::new(),
            feature_file: None,
            label_file: None,
            mode: Mode::Train,
            feature_indices: None,
            label_indices: None,
            normalize_features: true,
            normalize_labels: false,
            feature_type: FeatureType::Sparse,
            label_type: LabelType::Dense,
        }
    }
}

impl DatasetConfig {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn feature_file(mut self, f: impl Into<String>) -> Self {
        self.feature_file = Some(f.into());
        self
    }

    pub fn label_file(mut self, f: impl Into<String>) -> Self {
        self.label_file = Some(f.into());
        self
    }

    pub fn mode(mut self, m: Mode) -> Self {
        self.mode = m;
        self
    }

    pub fn feature_indices(mut self, p: impl AsRef<Path>) -> Self {
        self.feature_indices = Some(p.as_ref().to_path_buf());
        self
    }

    pub fn label_indices(mut self, p: impl AsRef<Path>) -> Self {
        self.label_indices = Some(p.as_ref().to_path_buf());
        self
    }

    pub fn normalize_features(mut self, n: bool) -> Self {
        self.normalize_features = n;
        self
    }

    pub fn normalize_labels(mut self, n: bool) -> Self {
        self.normalize_labels = n;
        self
    }

    pub fn feature_type(mut self, t: FeatureType) -> Self {
        self.feature_type = t;
        self
    }

    pub fn label_type(mut self, t: LabelType) -> Self {
        self.label_type = t;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_partial_json() {
        let config: DatasetConfig =
            serde_json::from_str(r#"{"data_dir": "/d", "mode": "predict", "label_type": "sparse"}"#)
                .unwrap();
        assert_eq!(config.mode, Mode::Predict);
        assert_eq!(config.label_type, LabelType::Sparse);
        assert!(config.normalize_features);
        assert!(!config.normalize_labels);
        assert_eq!(config.feature_type, FeatureType::Sparse);
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("train".parse::<Mode>().unwrap(), Mode::Train);
        assert_eq!("predict".parse::<Mode>().unwrap(), Mode::Predict);
        assert!("infer".parse::<Mode>().is_err());
    }
}
