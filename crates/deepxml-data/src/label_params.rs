// Label metadata shared between a train run and later predict runs
//
// Train mode writes the valid-label set, predict mode reads it back so the
// label space lines up with the trained model:
//
//   <model_dir>/labels_params.pkl            (no split)
//   <model_dir>/labels_params_split_<id>.pkl
//
// The file is a pickled dict `{"valid_labels": [...], "num_labels": n}`.
// `valid_labels` is written as a plain list of ints; pickled numpy arrays
// are not understood on read.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_pickle::{DeOptions, SerOptions};

use deepxml_core::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelParams {
    /// Label columns kept for training, in ascending order.
    pub valid_labels: Vec<usize>,
    /// Number of labels before filtering.
    pub num_labels: usize,
}

impl LabelParams {
    pub fn path(model_dir: impl AsRef<Path>, split: Option<&str>) -> PathBuf {
        let name = match split {
            None => "labels_params.pkl".to_string(),
            Some(id) => format!("labels_params_split_{id}.pkl"),
        };
        model_dir.as_ref().join(name)
    }

    /// Pickle to `path`, creating the parent directory if needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let bytes = serde_pickle::to_vec(self, SerOptions::new())?;
        fs::write(path, bytes).map_err(|e| Error::io(path, e))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::MissingLabelParams(path.to_path_buf()))
            }
            Err(e) => return Err(Error::io(path, e)),
        };
        Ok(serde_pickle::from_slice(&bytes, DeOptions::new())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_pickle::{HashableValue, Value};

    #[test]
    fn file_names() {
        assert_eq!(
            LabelParams::path("/m", None),
            PathBuf::from("/m/labels_params.pkl")
        );
        assert_eq!(
            LabelParams::path("/m", Some("3")),
            PathBuf::from("/m/labels_params_split_3.pkl")
        );
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = LabelParams::path(dir.path().join("model"), Some("1"));
        let params = LabelParams {
            valid_labels: vec![0, 2, 5],
            num_labels: 7,
        };
        params.save(&path).unwrap();
        assert_eq!(LabelParams::load(&path).unwrap(), params);
    }

    #[test]
    fn written_as_pickled_dict() {
        let dir = tempfile::tempdir().unwrap();
        let path = LabelParams::path(dir.path(), None);
        LabelParams {
            valid_labels: vec![1, 4],
            num_labels: 6,
        }
        .save(&path)
        .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // protocol marker
        assert_eq!(bytes[0], 0x80);
        let value: Value = serde_pickle::value_from_slice(&bytes, DeOptions::new()).unwrap();
        let Value::Dict(dict) = value else {
            panic!("expected a dict, got {value:?}");
        };
        let key = |k: &str| HashableValue::String(k.to_string());
        assert_eq!(dict.get(&key("num_labels")), Some(&Value::I64(6)));
        assert_eq!(
            dict.get(&key("valid_labels")),
            Some(&Value::List(vec![Value::I64(1), Value::I64(4)]))
        );
    }

    #[test]
    fn reads_dict_written_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels_params.pkl");
        let mut dict = std::collections::BTreeMap::new();
        dict.insert(
            HashableValue::String("valid_labels".into()),
            Value::List(vec![Value::I64(0), Value::I64(2)]),
        );
        dict.insert(HashableValue::String("num_labels".into()), Value::I64(3));
        let bytes = serde_pickle::value_to_vec(&Value::Dict(dict), SerOptions::new()).unwrap();
        std::fs::write(&path, bytes).unwrap();

        assert_eq!(
            LabelParams::load(&path).unwrap(),
            LabelParams {
                valid_labels: vec![0, 2],
                num_labels: 3,
            }
        );
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = LabelParams::path(dir.path(), None);
        assert!(matches!(
            LabelParams::load(&path),
            Err(Error::MissingLabelParams(p)) if p == path
        ));
    }
}
