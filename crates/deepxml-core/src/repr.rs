// Repr - the value a transform stage consumes and produces
//
// Document encoders see three kinds of input:
//
//   Dense   [batch, dim] tensor (precomputed or already-embedded documents)
//   Sparse  padded token ids + weights per document, fed to an embedding bag
//   Pair    a representation plus an auxiliary half (e.g. the raw sparse
//           input kept alongside an embedding), stripped by `_identity`

use ndarray::Array2;

use crate::error::{Error, Result};
use crate::tensor::Tensor;

/// A padded batch of sparse documents.
///
/// `indices[[b, j]]` is the j-th token of document b and `weights[[b, j]]`
/// its value. Short documents are padded with `(padding_idx, 0.0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseBatch {
    pub indices: Array2<usize>,
    pub weights: Array2<f32>,
}

impl SparseBatch {
    /// Pad ragged `(index, weight)` rows into a rectangle.
    pub fn from_rows(rows: &[Vec<(usize, f32)>], padding_idx: usize) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut indices = Array2::from_elem((rows.len(), width), padding_idx);
        let mut weights = Array2::zeros((rows.len(), width));
        for (b, row) in rows.iter().enumerate() {
            for (j, &(idx, w)) in row.iter().enumerate() {
                indices[[b, j]] = idx;
                weights[[b, j]] = w;
            }
        }
        SparseBatch { indices, weights }
    }

    pub fn batch_size(&self) -> usize {
        self.indices.nrows()
    }

    /// Padded row length.
    pub fn width(&self) -> usize {
        self.indices.ncols()
    }
}

/// Input/output of a transform stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Repr {
    Dense(Tensor),
    Sparse(SparseBatch),
    Pair(Box<Repr>, Box<Repr>),
}

impl Repr {
    pub fn pair(first: Repr, second: Repr) -> Self {
        Repr::Pair(Box::new(first), Box::new(second))
    }

    /// Unwrap a dense tensor, naming `consumer` in the error otherwise.
    pub fn into_dense(self, consumer: &str) -> Result<Tensor> {
        match self {
            Repr::Dense(t) => Ok(t),
            other => Err(Error::msg(format!(
                "{consumer} expects a dense input, got {}",
                other.kind()
            ))),
        }
    }

    pub fn as_dense(&self) -> Option<&Tensor> {
        match self {
            Repr::Dense(t) => Some(t),
            _ => None,
        }
    }

    /// Number of documents in the batch.
    pub fn batch_size(&self) -> usize {
        match self {
            Repr::Dense(t) => t.rows(),
            Repr::Sparse(s) => s.batch_size(),
            Repr::Pair(first, _) => first.batch_size(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Repr::Dense(_) => "dense",
            Repr::Sparse(_) => "sparse",
            Repr::Pair(..) => "pair",
        }
    }
}

impl From<Tensor> for Repr {
    fn from(t: Tensor) -> Self {
        Repr::Dense(t)
    }
}

impl From<SparseBatch> for Repr {
    fn from(s: SparseBatch) -> Self {
        Repr::Sparse(s)
    }
}
