// Label container - the target side of an XmlDataset

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use deepxml_core::{Error, Matrix, Norm, Result, Row};

use crate::source::{read_matrix, Part};

/// In-memory representation of the label matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelType {
    #[default]
    Dense,
    Sparse,
}

impl FromStr for LabelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dense" => Ok(LabelType::Dense),
            "sparse" => Ok(LabelType::Sparse),
            other => Err(Error::InvalidConfig(format!("unknown label type {other:?}"))),
        }
    }
}

impl fmt::Display for LabelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LabelType::Dense => "dense",
            LabelType::Sparse => "sparse",
        })
    }
}

/// Row-per-instance label matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Labels {
    matrix: Matrix,
}

impl Labels {
    /// Build from in-memory data when given, otherwise from `data_dir/fname`.
    pub fn construct(
        data_dir: &Path,
        fname: Option<&str>,
        raw: Option<Matrix>,
        label_type: LabelType,
    ) -> Result<Self> {
        let matrix = match (raw, fname) {
            (Some(m), _) => m,
            (None, Some(f)) => read_matrix(&data_dir.join(f), Part::Labels)?,
            (None, None) => {
                return Err(Error::InvalidConfig(
                    "labels need either a file name or in-memory data".into(),
                ))
            }
        };
        Ok(Self::from_matrix(matrix, label_type))
    }

    pub fn from_matrix(matrix: Matrix, label_type: LabelType) -> Self {
        let matrix = match label_type {
            LabelType::Dense => matrix.into_dense(),
            LabelType::Sparse => matrix.into_sparse(),
        };
        Labels { matrix }
    }

    pub fn num_instances(&self) -> usize {
        self.matrix.rows()
    }

    pub fn num_labels(&self) -> usize {
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

    /// Instances with at least one positive label.
    pub fn valid_rows(&self) -> Vec<usize> {
        self.matrix.nonempty_rows()
    }

    /// Drop labels without any positive instance; returns the kept columns.
    pub fn remove_invalid(&mut self) -> Result<Vec<usize>> {
        let valid = self.matrix.nonempty_cols();
        self.matrix.select_cols(&valid)?;
        Ok(valid)
    }

    /// Scale each row so its largest value is 1.
    pub fn normalize_max(&mut self) {
        self.matrix.normalize_rows(Norm::Max);
    }

    pub fn binarize(&mut self) {
        self.matrix.binarize();
    }
}
