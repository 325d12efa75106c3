// Split index files
//
// A split restricts a dataset to a subset of feature or label columns. The
// index file lists the kept columns, one integer per line, and its name
// carries the split id: `trn_X_Xf_2.txt` belongs to split "2".

use std::fs;
use std::path::Path;

use deepxml_core::{Error, Result};

/// Split id of `path`: the file name's token after its last `_`, cut at
/// the first `.`.
pub fn split_id(path: impl AsRef<Path>) -> String {
    let name = path
        .as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tail = name.rsplit('_').next().unwrap_or_default();
    tail.split('.').next().unwrap_or_default().to_string()
}

/// Read the column indices of a split file. Blank lines are skipped.
pub fn load_index_file(path: impl AsRef<Path>) -> Result<Vec<usize>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let mut indices = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let token = line.trim();
        if token.is_empty() {
            continue;
        }
        let index: i64 = token
            .parse()
            .map_err(|e| Error::parse(path, i + 1, format!("bad index {token:?}: {e}")))?;
        let index = usize::try_from(index)
            .map_err(|_| Error::parse(path, i + 1, format!("negative index {index}")))?;
        indices.push(index);
    }
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_id_from_file_name() {
        assert_eq!(split_id("train_labels_3.txt"), "3");
        assert_eq!(split_id("/data/my_set/lbl_idx_12.tar.gz"), "12");
        assert_eq!(split_id("indices.txt"), "indices");
    }

    #[test]
    fn index_file_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idx_0.txt");
        fs::write(&path, "4\n0\n\n2\n").unwrap();
        assert_eq!(load_index_file(&path).unwrap(), vec![4, 0, 2]);

        fs::write(&path, "1\nx\n").unwrap();
        assert!(matches!(load_index_file(&path), Err(Error::Parse { line: 2, .. })));

        fs::write(&path, "-1\n").unwrap();
        assert!(matches!(load_index_file(&path), Err(Error::Parse { line: 1, .. })));
    }
}
