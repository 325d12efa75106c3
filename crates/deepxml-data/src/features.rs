// Feature container - the document side of an XmlDataset

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use deepxml_core::{Error, Matrix, Norm, Result, Row};

use crate::source::{read_matrix, Part};

/// In-memory representation of the feature matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    #[default]
    Sparse,
    Dense,
}

impl FromStr for FeatureType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sparse" => Ok(FeatureType::Sparse),
            "dense" => Ok(FeatureType::Dense),
            other => Err(Error::InvalidConfig(format!("unknown feature type {other:?}"))),
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FeatureType::Sparse => "sparse",
            FeatureType::Dense => "dense",
        })
    }
}

/// Row-per-instance feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Features {
    matrix: Matrix,
}

impl Features {
    /// Build from in-memory data when given, otherwise from
    /// `data_dir/fname`. Rows are L2-normalized when `normalize` is set.
    pub fn construct(
        data_dir: &Path,
        fname: Option<&str>,
        raw: Option<Matrix>,
        normalize: bool,
        feature_type: FeatureType,
    ) -> Result<Self> {
        let matrix = match (raw, fname) {
            (Some(m), _) => m,
            (None, Some(f)) => read_matrix(&data_dir.join(f), Part::Features)?,
            (None, None) => {
                return Err(Error::InvalidConfig(
                    "features need either a file name or in-memory data".into(),
                ))
            }
        };
        Ok(Self::from_matrix(matrix, normalize, feature_type))
    }

    pub fn from_matrix(matrix: Matrix, normalize: bool, feature_type: FeatureType) -> Self {
        let mut matrix = match feature_type {
            FeatureType::Sparse => matrix.into_sparse(),
            FeatureType::Dense => matrix.into_dense(),
        };
        if normalize {
            matrix.normalize_rows(Norm::L2);
        }
        Features { matrix }
    }

    pub fn num_instances(&self) -> usize {
        self.matrix.rows()
    }

    pub fn num_features(&self) -> usize {
        self.matrix.cols()
    }

    pub fn is_sparse(&self) -> bool {
        self.matrix.is_sparse()
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn get(&self, index: usize) -> Result<Row> {
        self.matrix.row(index)
    }

    pub fn select_rows(&mut self, indices: &[usize]) -> Result<()> {
        self.matrix.select_rows(indices)
    }

    pub fn select_cols(&mut self, indices: &[usize]) -> Result<()> {
        self.matrix.select_cols(indices)
    }

    /// Instances with at least one nonzero feature.
    pub fn valid_rows(&self) -> Vec<usize> {
        self.matrix.nonempty_rows()
    }
}
