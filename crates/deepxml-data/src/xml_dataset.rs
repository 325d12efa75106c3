// XmlDataset - features + labels with the label-space lifecycle
//
// Construction loads both containers and applies any split files. After
// that the caller decides when to repair rows (`remove_invalid_rows`) and
// when to fix the label space (`process_labels`). Every structural change
// keeps features and labels row-aligned and refreshes the cached stats.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use deepxml_core::{Error, Matrix, Result};

use crate::config::{DatasetConfig, Mode};
use crate::dataset::{Dataset, Sample};
use crate::features::Features;
use crate::label_params::LabelParams;
use crate::labels::Labels;
use crate::split::{load_index_file, split_id};

/// Already-parsed matrices that take the place of the configured files.
#[derive(Debug, Clone, Default)]
pub struct RawData {
    pub features: Option<Matrix>,
    pub labels: Option<Matrix>,
}

impl RawData {
    pub fn new(features: Matrix, labels: Matrix) -> Self {
        RawData {
            features: Some(features),
            labels: Some(labels),
        }
    }
}

#[derive(Debug, Clone)]
pub struct XmlDataset {
    data_dir: PathBuf,
    mode: Mode,
    features: Features,
    labels: Labels,
    split: Option<String>,
    num_samples: usize,
    num_features: usize,
    num_labels: usize,
    label_padding_index: usize,
}

impl XmlDataset {
    /// Load features and labels, then apply the configured split files.
    pub fn new(config: &DatasetConfig, raw: RawData) -> Result<Self> {
        let (features, labels) = Self::load(config, raw)?;
        let mut dataset = XmlDataset {
            data_dir: config.data_dir.clone(),
            mode: config.mode,
            num_samples: 0,
            num_features: 0,
            num_labels: 0,
            features,
            labels,
            split: None,
            label_padding_index: 0,
        };
        dataset.update_data_stats();
        dataset.select_indices(
            config.feature_indices.as_deref(),
            config.label_indices.as_deref(),
        )?;
        dataset.label_padding_index = dataset.num_labels;
        Ok(dataset)
    }

    /// Build both containers and check they describe the same instances.
    pub fn load(config: &DatasetConfig, raw: RawData) -> Result<(Features, Labels)> {
        let features = Features::construct(
            &config.data_dir,
            config.feature_file.as_deref(),
            raw.features,
            config.normalize_features,
            config.feature_type,
        )?;
        let mut labels = Labels::construct(
            &config.data_dir,
            config.label_file.as_deref(),
            raw.labels,
            config.label_type,
        )?;
        if config.normalize_labels {
            match config.mode {
                Mode::Train => {
                    info!("non-binary labels encountered in train; normalizing");
                    labels.normalize_max();
                }
                Mode::Predict => {
                    info!("non-binary labels encountered in test/val; binarizing");
                    labels.binarize();
                }
            }
        }
        if features.num_instances() != labels.num_instances() {
            return Err(Error::InstanceCountMismatch {
                features: features.num_instances(),
                labels: labels.num_instances(),
            });
        }
        Ok((features, labels))
    }

    /// Restrict feature and/or label columns to a saved split.
    ///
    /// The label file is applied first; when both are given the split id
    /// comes from the feature file.
    pub fn select_indices(
        &mut self,
        feature_indices: Option<&Path>,
        label_indices: Option<&Path>,
    ) -> Result<()> {
        if let Some(path) = label_indices {
            let id = split_id(path);
            let indices = load_index_file(path)?;
            self.labels.select_cols(&indices)?;
            info!(split = %id, labels = indices.len(), "selected label split");
            self.split = Some(id);
        }
        if let Some(path) = feature_indices {
            let id = split_id(path);
            let indices = load_index_file(path)?;
            self.features.select_cols(&indices)?;
            info!(split = %id, features = indices.len(), "selected feature split");
            self.split = Some(id);
        }
        self.update_data_stats();
        Ok(())
    }

    /// Keep only instances with at least one feature and one label.
    pub fn remove_invalid_rows(&mut self) -> Result<()> {
        let with_labels = self.labels.valid_rows();
        // both lists are ascending
        let mut keep = Vec::new();
        let mut j = 0;
        for i in self.features.valid_rows() {
            while j < with_labels.len() && with_labels[j] < i {
                j += 1;
            }
            if with_labels.get(j) == Some(&i) {
                keep.push(i);
            }
        }
        let dropped = self.num_samples - keep.len();
        self.features.select_rows(&keep)?;
        self.labels.select_rows(&keep)?;
        self.update_data_stats();
        debug!(kept = keep.len(), dropped, "removed instances without features or labels");
        Ok(())
    }

    /// Fix the label space for `model_dir`.
    ///
    /// Train mode drops labels without a positive instance and saves the
    /// kept set. Predict mode loads that set and restricts labels to it.
    pub fn process_labels(&mut self, model_dir: impl AsRef<Path>) -> Result<()> {
        let path = LabelParams::path(model_dir, self.split.as_deref());
        match self.mode {
            Mode::Train => {
                let num_labels = self.num_labels;
                let valid_labels = self.labels.remove_invalid()?;
                info!(
                    valid = valid_labels.len(),
                    total = num_labels,
                    path = %path.display(),
                    "saving valid labels"
                );
                LabelParams {
                    valid_labels,
                    num_labels,
                }
                .save(&path)?;
            }
            Mode::Predict => {
                let params = LabelParams::load(&path)?;
                info!(
                    valid = params.valid_labels.len(),
                    path = %path.display(),
                    "restricting labels to saved valid set"
                );
                self.labels.select_cols(&params.valid_labels)?;
            }
        }
        self.update_data_stats();
        Ok(())
    }

    pub fn update_data_stats(&mut self) {
        self.num_samples = self.features.num_instances();
        self.num_features = self.features.num_features();
        self.num_labels = self.labels.num_labels();
        debug!(
            samples = self.num_samples,
            features = self.num_features,
            labels = self.num_labels,
            "dataset stats"
        );
    }

    /// `(num_samples, num_features, num_labels)`.
    pub fn get_stats(&self) -> (usize, usize, usize) {
        (self.num_samples, self.num_features, self.num_labels)
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    /// Label count at construction, used to pad sparse label batches.
    pub fn label_padding_index(&self) -> usize {
        self.label_padding_index
    }

    pub fn split(&self) -> Option<&str> {
        self.split.as_deref()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }
}

impl Dataset for XmlDataset {
    fn len(&self) -> usize {
        self.num_samples
    }

    fn get(&self, index: usize) -> Result<Sample> {
        Ok(Sample {
            features: self.features.get(index)?,
            labels: self.labels.get(index)?,
        })
    }

    fn num_features(&self) -> usize {
        self.num_features
    }

    fn num_labels(&self) -> usize {
        self.num_labels
    }

    fn label_padding_index(&self) -> usize {
        self.label_padding_index
    }

    fn name(&self) -> &str {
        "xml"
    }
}
