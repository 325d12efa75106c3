use std::path::PathBuf;

/// All errors that can occur within deepxml.
///
/// A single error type is shared by every library crate in the workspace:
/// load-time configuration problems, malformed files, shape mismatches and
/// transform construction failures all surface through it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying I/O failure, annotated with the path being accessed.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A text file could not be parsed.
    #[error("parse error in {path} line {line}: {msg}")]
    Parse {
        path: PathBuf,
        line: usize,
        msg: String,
    },

    /// Two operands disagree on their dimensions.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    /// Feature and label containers were built with different row counts.
    #[error("feature/label instance count mismatch: {features} features rows vs {labels} label rows")]
    InstanceCountMismatch { features: usize, labels: usize },

    /// Row or column index outside of a container.
    #[error("index {index} out of range for axis of size {size}")]
    IndexOutOfRange { index: usize, size: usize },

    /// Transform config names a layer type that is not registered.
    #[error("unknown transform layer: {0:?}")]
    UnknownLayer(String),

    /// Configuration is structurally invalid.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Predict-mode dataset could not find the label metadata written at train time.
    #[error("label metadata not found at {0}; run in train mode against this model directory first")]
    MissingLabelParams(PathBuf),

    /// Failure reading or writing a `.npy`/`.npz` archive.
    #[error("npz error on {path}: {msg}")]
    Npz { path: PathBuf, msg: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Pickle(#[from] serde_pickle::Error),

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }

    /// Wrap an I/O error with the path that produced it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a [`Error::Parse`] for `path` at 1-based `line`.
    pub fn parse(path: impl Into<PathBuf>, line: usize, msg: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            line,
            msg: msg.into(),
        }
    }
}

/// Convenience Result type used throughout deepxml.
pub type Result<T> = std::result::Result<T, Error>;

/// Macro for early return with a formatted error message.
/// Usage: `bail!("something went wrong: {}", detail)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}
