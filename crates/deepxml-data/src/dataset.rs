// Dataset trait - indexed access to (features, labels) pairs

use deepxml_core::{Result, Row};

/// One instance: its feature row and its label row.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub features: Row,
    pub labels: Row,
}

/// An indexed collection of samples.
///
/// Implementations must be `Send + Sync` so the DataLoader can fetch samples
/// from several threads.
pub trait Dataset: Send + Sync {
    /// Total number of samples in the dataset.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve the sample at position `index`.
    ///
    /// Out-of-range indices are reported by the underlying container.
    fn get(&self, index: usize) -> Result<Sample>;

    /// Width of a feature row.
    fn num_features(&self) -> usize;

    /// Width of a label row.
    fn num_labels(&self) -> usize;

    /// Index used to pad sparse label rows into a rectangle.
    fn label_padding_index(&self) -> usize {
        self.num_labels()
    }

    /// Optional human-readable name.
    fn name(&self) -> &str {
        "dataset"
    }
}
