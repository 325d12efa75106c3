//! # deepxml
//!
//! Dataset plumbing, document encoders and evaluation for extreme
//! multi-label classification.
//!
//! This is the top-level facade crate that re-exports everything you need.
//!
//! ## Usage
//!
//! ```rust
//! use deepxml::prelude::*;
//! ```
//!
//! ## Architecture
//!
//! | Crate | Purpose |
//! |-------|---------|
//! | `deepxml-core` | Error, Device, Tensor, CSR/dense matrices, XC text and `.npz` files |
//! | `deepxml-nn` | Transform layers, `Layer` dispatch, the configurable `Transform` stack |
//! | `deepxml-data` | `XmlDataset`, split files, label metadata, `DataLoader` |
//! | `deepxml-metrics` | Inverse propensity, P@k, nDCG@k, PSP@k, PSnDCG@k |
//!
//! The [`evaluate`] module backs the `xc-evaluate` binary.

pub use deepxml_core::{
    bail, CsrMatrix, Device, Error, Matrix, Norm, Repr, Result, Row, SparseBatch, Tensor,
};

/// File formats: XC text, `.npz`, `.npy`.
pub mod io {
    pub use deepxml_core::io::*;
    pub use deepxml_core::npz::*;
}

/// Re-export transform layers.
pub mod nn {
    pub use deepxml_nn::*;
}

/// Re-export datasets and loaders.
pub mod data {
    pub use deepxml_data::*;
}

/// Re-export ranking metrics.
pub mod metrics {
    pub use deepxml_metrics::*;
}

/// Blend and score k-NN / classifier predictions.
pub mod evaluate;

/// Prelude: import this for the most common types.
pub mod prelude {
    pub use crate::data::{
        DataLoader, DataLoaderConfig, Dataset, DatasetConfig, FeatureType, LabelBatch,
        LabelParams, LabelType, Mode, RawData, XmlDataset,
    };
    pub use crate::evaluate::{EvaluateArgs, ScoreTransform};
    pub use crate::metrics::Metrics;
    pub use crate::nn::{Layer, Module, Transform, TransformConfig};
    pub use crate::{CsrMatrix, Device, Error, Matrix, Repr, Result, SparseBatch, Tensor};
}
