// Evaluation of classifier and k-NN score matrices
//
// With betas, the two score files `<prefix>_clf.npz` and `<prefix>_knn.npz`
// are reported on their own, rescaled, then blended as
// `beta * clf + (1 - beta) * knn` once per beta. A leading beta of -1
// evaluates the single file `<prefix>.npz` instead.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::info;

use deepxml_core::{io, npz, CsrMatrix, Error, Result};
use deepxml_metrics::{format, inv_propensity, Metrics};

/// Ranks scored in every report.
pub const TOP_K: usize = 5;

/// Rescaling applied to the stored scores before blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreTransform {
    /// type 0
    #[default]
    None,
    /// type 1: `1 / (1 + e^-x)`
    Sigmoid,
    /// type 2: `e^x`, then each row divided by its maximum
    Normalize,
}

impl ScoreTransform {
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(ScoreTransform::None),
            1 => Ok(ScoreTransform::Sigmoid),
            2 => Ok(ScoreTransform::Normalize),
            other => Err(Error::InvalidConfig(format!(
                "score transform type must be 0, 1 or 2, got {other}"
            ))),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            ScoreTransform::None => 0,
            ScoreTransform::Sigmoid => 1,
            ScoreTransform::Normalize => 2,
        }
    }

    pub fn apply(self, scores: &mut CsrMatrix) -> Result<()> {
        match self {
            ScoreTransform::None => Ok(()),
            ScoreTransform::Sigmoid => {
                sigmoid(scores);
                Ok(())
            }
            ScoreTransform::Normalize => normalize(scores),
        }
    }
}

impl FromStr for ScoreTransform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let code = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidConfig(format!("score transform type {s:?} is not an integer")))?;
        Self::from_code(code)
    }
}

impl fmt::Display for ScoreTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

pub fn sigmoid(scores: &mut CsrMatrix) {
    scores.map_values_in_place(|v| 1.0 / ((-v).exp() + 1.0));
}

/// Exponentiate stored scores, then scale each row so its maximum is 1.
/// Rows without entries are left alone. This is not a softmax.
pub fn normalize(scores: &mut CsrMatrix) -> Result<()> {
    scores.map_values_in_place(f32::exp);
    let factors: Vec<f32> = scores
        .row_max()
        .into_iter()
        .map(|m| if m == 0.0 { 1.0 } else { 1.0 / m })
        .collect();
    scores.scale_rows(&factors)
}

/// `beta * clf + (1 - beta) * knn`.
pub fn blend(clf: &CsrMatrix, knn: &CsrMatrix, beta: f64) -> Result<CsrMatrix> {
    clf.lin_comb(beta as f32, knn, (1.0 - beta) as f32)
}

/// Inputs of one evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluateArgs {
    /// Training labels, used for propensity weights.
    pub train_file: PathBuf,
    /// Ground-truth labels of the evaluated instances.
    pub targets_file: PathBuf,
    /// Prediction path prefix, without `_clf.npz`/`_knn.npz`/`.npz`.
    pub predictions: PathBuf,
    pub a: f64,
    pub b: f64,
    pub transform: ScoreTransform,
    pub betas: Vec<f64>,
}

impl EvaluateArgs {
    /// Whether to evaluate a single score file rather than a blend.
    pub fn single_file(&self) -> bool {
        self.betas.first().map_or(true, |&b| b == -1.0)
    }
}

/// `prefix` with `suffix` appended to its final component.
pub fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut s = OsString::from(prefix.as_os_str());
    s.push(suffix);
    PathBuf::from(s)
}

fn report(metrics: &Metrics, scores: &CsrMatrix) -> Result<String> {
    Ok(format(&metrics.eval(scores, TOP_K)?))
}

/// Run the evaluation and return the full report.
pub fn run(args: &EvaluateArgs) -> Result<String> {
    let true_labels = io::read_labels(&args.targets_file)?;
    let train_labels = io::read_labels(&args.train_file)?;
    info!(
        instances = true_labels.rows(),
        labels = true_labels.cols(),
        "loaded ground truth"
    );
    let inv_psp = inv_propensity(&train_labels, args.a, args.b);
    let metrics = Metrics::new(true_labels, Some(inv_psp))?;

    let mut out = Vec::new();
    if args.single_file() {
        let scores = npz::load_npz(with_suffix(&args.predictions, ".npz"))?;
        out.push(report(&metrics, &scores)?);
        return Ok(out.join("\n"));
    }

    let mut knn = npz::load_npz(with_suffix(&args.predictions, "_knn.npz"))?;
    let mut clf = npz::load_npz(with_suffix(&args.predictions, "_clf.npz"))?;
    out.push("clf".to_string());
    out.push(report(&metrics, &clf)?);
    out.push("knn".to_string());
    out.push(report(&metrics, &knn)?);

    args.transform.apply(&mut clf)?;
    args.transform.apply(&mut knn)?;
    for &beta in &args.betas {
        let blended = blend(&clf, &knn, beta)?;
        out.push(format!("beta {beta:.6}, Method {}", args.transform));
        out.push(report(&metrics, &blended)?);
    }
    Ok(out.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_codes() {
        assert_eq!("2".parse::<ScoreTransform>().unwrap(), ScoreTransform::Normalize);
        assert_eq!(ScoreTransform::from_code(0).unwrap(), ScoreTransform::None);
        assert!(ScoreTransform::from_code(3).is_err());
        assert!("x".parse::<ScoreTransform>().is_err());
    }

    #[test]
    fn suffix_appends_to_file_name() {
        assert_eq!(
            with_suffix(Path::new("/out/score"), "_knn.npz"),
            PathBuf::from("/out/score_knn.npz")
        );
    }

    #[test]
    fn single_file_when_first_beta_is_minus_one() {
        let mut args = EvaluateArgs {
            train_file: PathBuf::new(),
            targets_file: PathBuf::new(),
            predictions: PathBuf::new(),
            a: 0.55,
            b: 1.5,
            transform: ScoreTransform::None,
            betas: vec![-1.0],
        };
        assert!(args.single_file());
        args.betas = vec![0.5, -1.0];
        assert!(!args.single_file());
    }
}
