// EmbeddingBag - weighted bag-of-tokens embedding
//
// Maps each sparse document (token ids + weights) to one dense vector:
//
//   sum:  e(d) = sum_j w_j * E[t_j]
//   mean: e(d) = sum_j w_j * E[t_j] / |{j : t_j != padding_idx}|
//
// The table is [num_embeddings, embedding_dim]. Tokens equal to
// `padding_idx` contribute nothing, and that row of the table is zero at
// construction.

use deepxml_core::{Error, Result, SparseBatch, Tensor};
use ndarray::Array2;
use serde::Deserialize;

use crate::init;

/// How the token vectors of one document are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    #[default]
    Sum,
    Mean,
}

#[derive(Debug, Clone)]
pub struct EmbeddingBag {
    weight: Tensor,
    padding_idx: Option<usize>,
    reduction: Reduction,
    sparse: bool,
}

impl EmbeddingBag {
    /// A table drawn from N(0, 1), with the padding row zeroed.
    pub fn new(
        num_embeddings: usize,
        embedding_dim: usize,
        padding_idx: Option<usize>,
        reduction: Reduction,
        sparse: bool,
    ) -> Result<Self> {
        if let Some(p) = padding_idx {
            if p >= num_embeddings {
                return Err(Error::InvalidConfig(format!(
                    "padding_idx {p} out of range for {num_embeddings} embeddings"
                )));
            }
        }
        let mut weight = init::normal((num_embeddings, embedding_dim), 0.0, 1.0);
        if let Some(p) = padding_idx {
            weight.as_array_mut().row_mut(p).fill(0.0);
        }
        Ok(EmbeddingBag {
            weight,
            padding_idx,
            reduction,
            sparse,
        })
    }

    pub fn num_embeddings(&self) -> usize {
        self.weight.rows()
    }

    pub fn embedding_dim(&self) -> usize {
        self.weight.cols()
    }

    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    pub fn weight_mut(&mut self) -> &mut Tensor {
        &mut self.weight
    }

    pub fn is_sparse(&self) -> bool {
        self.sparse
    }

    /// Overwrite the table with pretrained vectors of the same shape.
    pub fn load_pretrained(&mut self, table: &Tensor) -> Result<()> {
        if table.dims() != self.weight.dims() {
            return Err(Error::ShapeMismatch {
                expected: self.weight.dims(),
                got: table.dims(),
            });
        }
        self.weight = table.to_device(self.weight.device());
        Ok(())
    }

    /// `[batch, width]` tokens to `[batch, embedding_dim]` vectors.
    pub fn forward(&self, batch: &SparseBatch) -> Result<Tensor> {
        let table = self.weight.as_array();
        let vocab = table.nrows();
        let mut out = Array2::<f32>::zeros((batch.batch_size(), table.ncols()));
        for (b, (tokens, weights)) in batch
            .indices
            .rows()
            .into_iter()
            .zip(batch.weights.rows())
            .enumerate()
        {
            let mut acc = out.row_mut(b);
            let mut count = 0usize;
            for (&t, &w) in tokens.iter().zip(weights.iter()) {
                if Some(t) == self.padding_idx {
                    continue;
                }
                if t >= vocab {
                    return Err(Error::IndexOutOfRange {
                        index: t,
                        size: vocab,
                    });
                }
                acc.scaled_add(w, &table.row(t));
                count += 1;
            }
            if self.reduction == Reduction::Mean && count > 0 {
                acc /= count as f32;
            }
        }
        Ok(self.weight.with_data(out))
    }
}
