// DataLoader - batching, shuffling, collation into model inputs

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use deepxml_core::{Device, Repr, Result, Row, SparseBatch, Tensor};

use crate::dataset::{Dataset, Sample};

/// Configuration for the DataLoader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataLoaderConfig {
    /// Number of samples per batch.
    pub batch_size: usize,
    /// Whether to shuffle indices each epoch.
    pub shuffle: bool,
    /// Whether to drop the last incomplete batch.
    pub drop_last: bool,
    /// Number of parallel workers for sample fetching (0 = sequential).
    pub num_workers: usize,
    /// Optional random seed for reproducible shuffling.
    pub seed: Option<u64>,
}

impl Default for DataLoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            shuffle: true,
            drop_last: false,
            num_workers: 0,
            seed: None,
        }
    }
}

impl DataLoaderConfig {
    pub fn batch_size(mut self, bs: usize) -> Self {
        self.batch_size = bs;
        self
    }

    pub fn shuffle(mut self, s: bool) -> Self {
        self.shuffle = s;
        self
    }

    pub fn drop_last(mut self, d: bool) -> Self {
        self.drop_last = d;
        self
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = Some(s);
        self
    }
}

/// Collated labels of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelBatch {
    /// `[batch, num_labels]` label values.
    Dense(Tensor),
    /// Positive label ids padded with the dataset's label padding index.
    Sparse(SparseBatch),
}

/// One collated batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Dataset positions of the rows, in batch order.
    pub indices: Vec<usize>,
    /// Sparse rows become a [`SparseBatch`] with token ids shifted by one
    /// (0 is padding), dense rows a `[batch, num_features]` tensor.
    pub features: Repr,
    pub labels: LabelBatch,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Wraps a Dataset and produces collated batches.
pub struct DataLoader<'a> {
    dataset: &'a dyn Dataset,
    config: DataLoaderConfig,
    device: Device,
    indices: Vec<usize>,
}

impl<'a> DataLoader<'a> {
    pub fn new(dataset: &'a dyn Dataset, config: DataLoaderConfig) -> Self {
        let indices: Vec<usize> = (0..dataset.len()).collect();
        Self {
            dataset,
            config,
            device: Device::Cpu,
            indices,
        }
    }

    /// Tag collated tensors with `device`.
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    pub fn config(&self) -> &DataLoaderConfig {
        &self.config
    }

    /// The number of batches per epoch.
    pub fn num_batches(&self) -> usize {
        let bs = self.config.batch_size.max(1);
        if self.config.drop_last {
            self.dataset.len() / bs
        } else {
            self.dataset.len().div_ceil(bs)
        }
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Reshuffle indices (call at the start of each epoch).
    pub fn reshuffle(&mut self) {
        if self.config.shuffle {
            match self.config.seed {
                Some(seed) => {
                    let mut rng = StdRng::seed_from_u64(seed);
                    self.indices.shuffle(&mut rng);
                }
                None => {
                    let mut rng = thread_rng();
                    self.indices.shuffle(&mut rng);
                }
            }
        }
    }

    /// Fetch a slice of samples, optionally in parallel via rayon.
    fn fetch_samples(&self, indices: &[usize]) -> Result<Vec<Sample>> {
        if self.config.num_workers > 0 && indices.len() > 1 {
            indices.par_iter().map(|&i| self.dataset.get(i)).collect()
        } else {
            indices.iter().map(|&i| self.dataset.get(i)).collect()
        }
    }

    fn batch(&self, batch_idx: usize) -> Result<Batch> {
        let bs = self.config.batch_size.max(1);
        let start = batch_idx * bs;
        let end = (start + bs).min(self.indices.len());
        let indices = self.indices[start..end].to_vec();
        let samples = self.fetch_samples(&indices)?;
        Ok(Batch {
            features: collate_features(&samples, self.device)?,
            labels: collate_labels(
                &samples,
                self.dataset.num_labels(),
                self.dataset.label_padding_index(),
                self.device,
            )?,
            indices,
        })
    }

    /// Produce all batches for one epoch.
    pub fn epoch_batches(&mut self) -> Result<Vec<Batch>> {
        self.reshuffle();
        (0..self.num_batches()).map(|b| self.batch(b)).collect()
    }

    /// Iterate over batches one at a time (lower memory than `epoch_batches`).
    pub fn iter_batches(&mut self) -> BatchIterator<'_, 'a> {
        self.reshuffle();
        BatchIterator {
            loader: self,
            batch_idx: 0,
        }
    }
}

/// Iterator that yields one batch at a time.
pub struct BatchIterator<'l, 'a> {
    loader: &'l DataLoader<'a>,
    batch_idx: usize,
}

impl Iterator for BatchIterator<'_, '_> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.batch_idx >= self.loader.num_batches() {
            return None;
        }
        let batch = self.loader.batch(self.batch_idx);
        self.batch_idx += 1;
        Some(batch)
    }
}

/// Features of `samples` as one model input.
pub fn collate_features(samples: &[Sample], device: Device) -> Result<Repr> {
    if samples
        .first()
        .is_some_and(|s| matches!(s.features, Row::Dense(_)))
    {
        let rows: Vec<Vec<f32>> = samples.iter().map(|s| dense_values(&s.features)).collect();
        return Ok(Repr::Dense(Tensor::from_rows(&rows)?.to_device(device)));
    }
    let rows: Vec<Vec<(usize, f32)>> = samples
        .iter()
        .map(|s| {
            s.features
                .nonzero()
                .into_iter()
                .map(|(idx, v)| (idx + 1, v))
                .collect()
        })
        .collect();
    Ok(Repr::Sparse(SparseBatch::from_rows(&rows, 0)))
}

/// Labels of `samples` as a dense matrix or padded id lists.
pub fn collate_labels(
    samples: &[Sample],
    num_labels: usize,
    padding_index: usize,
    device: Device,
) -> Result<LabelBatch> {
    if samples
        .first()
        .is_some_and(|s| matches!(s.labels, Row::Dense(_)))
    {
        let rows: Vec<Vec<f32>> = samples.iter().map(|s| dense_values(&s.labels)).collect();
        let tensor = if rows.is_empty() {
            Tensor::zeros((0, num_labels))
        } else {
            Tensor::from_rows(&rows)?
        };
        return Ok(LabelBatch::Dense(tensor.to_device(device)));
    }
    let rows: Vec<Vec<(usize, f32)>> = samples.iter().map(|s| s.labels.nonzero()).collect();
    Ok(LabelBatch::Sparse(SparseBatch::from_rows(&rows, padding_index)))
}

fn dense_values(row: &Row) -> Vec<f32> {
    match row {
        Row::Dense(values) => values.clone(),
        Row::Sparse { .. } => Vec::new(),
    }
}
