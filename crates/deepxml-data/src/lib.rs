//! # deepxml-data
//!
//! Extreme multi-label datasets and batching.
//!
//! This crate provides:
//! - [`Dataset`] trait: indexed access to `(features, labels)` samples
//! - [`Features`] / [`Labels`]: sparse or dense containers loaded from XC
//!   text, `.npz` or `.npy` files
//! - [`XmlDataset`]: split selection, invalid-row removal and the
//!   train/predict label-space lifecycle ([`LabelParams`])
//! - [`DataLoader`]: shuffled batches collated into a [`Repr`](deepxml_core::Repr)
//!   and a [`LabelBatch`]

pub mod config;
pub mod dataset;
pub mod features;
pub mod label_params;
pub mod labels;
pub mod loader;
mod source;
pub mod split;
pub mod xml_dataset;

pub use config::{DatasetConfig, Mode};
pub use dataset::{Dataset, Sample};
pub use features::{FeatureType, Features};
pub use label_params::LabelParams;
pub use labels::{LabelType, Labels};
pub use loader::{Batch, BatchIterator, DataLoader, DataLoaderConfig, LabelBatch};
pub use split::{load_index_file, split_id};
pub use xml_dataset::{RawData, XmlDataset};
