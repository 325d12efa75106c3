//! # deepxml-metrics
//!
//! Evaluation metrics for extreme multi-label classification.
//!
//! - [`inv_propensity`]: label weights from training-label frequencies
//! - [`Metrics`]: P@k, nDCG@k and, with propensities, PSP@k and PSnDCG@k of
//!   a score matrix against ground truth
//! - [`format`]: the comma-separated percentage report

pub mod propensity;
pub mod ranking;

use tracing::debug;

use deepxml_core::{CsrMatrix, Error, Result};

pub use propensity::inv_propensity;
pub use ranking::{ndcg, precision, psndcg, psprecision, top_k};

/// Ground truth plus optional propensity weights, evaluated against any
/// number of score matrices.
#[derive(Debug, Clone)]
pub struct Metrics {
    true_labels: CsrMatrix,
    inv_psp: Option<Vec<f64>>,
}

impl Metrics {
    pub fn new(true_labels: CsrMatrix, inv_psp: Option<Vec<f64>>) -> Result<Self> {
        if let Some(w) = &inv_psp {
            if w.len() != true_labels.cols() {
                return Err(Error::ShapeMismatch {
                    expected: (1, true_labels.cols()),
                    got: (1, w.len()),
                });
            }
        }
        Ok(Metrics {
            true_labels,
            inv_psp,
        })
    }

    pub fn true_labels(&self) -> &CsrMatrix {
        &self.true_labels
    }

    pub fn has_propensity(&self) -> bool {
        self.inv_psp.is_some()
    }

    /// `[P, nDCG]` or `[P, nDCG, PSP, PSnDCG]`, each for k = 1..=`k`.
    pub fn eval(&self, pred: &CsrMatrix, k: usize) -> Result<Vec<Vec<f64>>> {
        debug!(rows = pred.rows(), nnz = pred.nnz(), k, "evaluating predictions");
        ranking::evaluate(pred, &self.true_labels, self.inv_psp.as_deref(), k)
    }
}

/// One line per metric, each value as a percentage with two decimals.
pub fn format(metrics: &[Vec<f64>]) -> String {
    metrics
        .iter()
        .map(|values| {
            values
                .iter()
                .map(|v| format!("{:.2}", v * 100.0))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
