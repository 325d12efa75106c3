// Astec - sparse bag-of-words document encoder
//
// The composite stage of the transform stack:
//
//   Sparse tokens --EmbeddingBag--> [batch, embedding_dims] --ReLU--> --Dropout-->
//
// A dense input is taken to be already embedded and skips the bag. Astec is
// the only stage with warm-startable state: `initialize` loads pretrained
// token embeddings, `token_embeddings` exposes the table, and `is_sparse`
// reports whether the table is meant for sparse gradient updates.

use deepxml_core::{Device, Repr, Result, Tensor};

use crate::activation::ReLU;
use crate::dropout::Dropout;
use crate::embedding::{EmbeddingBag, Reduction};
use crate::module::Module;

pub struct Astec {
    embeddings: EmbeddingBag,
    relu: ReLU,
    dropout: Dropout,
}

impl Astec {
    pub fn new(
        vocabulary_dims: usize,
        embedding_dims: usize,
        dropout: f64,
        reduction: Reduction,
        sparse: bool,
        padding_idx: Option<usize>,
    ) -> Result<Self> {
        Ok(Astec {
            embeddings: EmbeddingBag::new(
                vocabulary_dims,
                embedding_dims,
                padding_idx,
                reduction,
                sparse,
            )?,
            relu: ReLU,
            dropout: Dropout::new(dropout)?,
        })
    }

    pub fn embeddings(&self) -> &EmbeddingBag {
        &self.embeddings
    }

    pub fn embedding_dims(&self) -> usize {
        self.embeddings.embedding_dim()
    }

    /// Encode a sparse batch, or pass an already-embedded dense batch
    /// through the activation and dropout.
    pub fn forward_repr(&self, x: Repr) -> Result<Tensor> {
        match x {
            Repr::Sparse(batch) => {
                let embs = self.embeddings.forward(&batch)?;
                self.forward(&embs)
            }
            other => {
                let embs = other.into_dense("astec")?;
                self.forward(&embs)
            }
        }
    }
}

impl Module for Astec {
    /// Dense path: `x` is a batch of document embeddings.
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let x = self.relu.forward(x)?;
        self.dropout.forward(&x)
    }

    fn parameters(&self) -> Vec<&Tensor> {
        vec![self.embeddings.weight()]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        vec![self.embeddings.weight_mut()]
    }

    fn named_parameters(&self) -> Vec<(String, &Tensor)> {
        vec![("embeddings.weight".to_string(), self.embeddings.weight())]
    }

    fn set_training(&self, training: bool) {
        self.dropout.set_training(training);
    }

    fn is_training(&self) -> bool {
        self.dropout.is_training()
    }

    fn to_device(&mut self, device: Device) {
        self.embeddings.weight_mut().set_device(device);
    }

    fn initialize(&mut self, init: &Tensor) -> Result<()> {
        self.embeddings.load_pretrained(init)
    }

    fn is_sparse(&self) -> bool {
        self.embeddings.is_sparse()
    }

    fn token_embeddings(&self) -> Option<&Tensor> {
        Some(self.embeddings.weight())
    }
}
