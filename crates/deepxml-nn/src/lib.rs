//! # deepxml-nn
//!
//! Transform layers and the configurable document-encoder stack.
//!
//! 1. **Module trait**: every layer implements `forward()` plus optional
//!    capability hooks (`initialize`, `is_sparse`, `token_embeddings`)
//! 2. **Layers**: Linear, BatchNorm1d, Dropout, ReLU, Residual, Identity,
//!    StripIdentity, and the Astec sparse document encoder
//! 3. **Layer**: closed dispatch over those stages, keyed by config token
//! 4. **Transform**: an ordered stack built from a [`TransformConfig`]

pub mod activation;
pub mod astec;
pub mod batchnorm;
pub mod config;
pub mod dropout;
pub mod embedding;
pub mod identity;
pub mod init;
pub mod layer;
pub mod linear;
pub mod module;
pub mod residual;
pub mod sequential;
pub mod transform;

pub use activation::ReLU;
pub use astec::Astec;
pub use batchnorm::BatchNorm1d;
pub use config::{build_layers, TransformConfig};
pub use dropout::Dropout;
pub use embedding::{EmbeddingBag, Reduction};
pub use identity::{Identity, StripIdentity};
pub use layer::Layer;
pub use linear::Linear;
pub use module::Module;
pub use residual::{Residual, ResidualInit};
pub use sequential::Sequential;
pub use transform::Transform;
