// XC text formats
//
// Sparse matrix file:
//
//   <rows> <cols>
//   <col>:<value> <col>:<value> ...        one line per row, may be empty
//
// Combined data file (features and labels of one split):
//
//   <rows> <num_features> <num_labels>
//   <l1>,<l2>,... <f>:<v> <f>:<v> ...      labels first, then features
//
// A row with no labels starts directly with its `f:v` pairs. Rows missing at
// the end of a file are treated as empty.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::npz;
use crate::sparse::CsrMatrix;

/// Features and labels read from a combined data file.
#[derive(Debug, Clone)]
pub struct XcData {
    pub features: CsrMatrix,
    pub labels: CsrMatrix,
}

impl XcData {
    pub fn num_samples(&self) -> usize {
        self.features.rows()
    }

    pub fn num_features(&self) -> usize {
        self.features.cols()
    }

    pub fn num_labels(&self) -> usize {
        self.labels.cols()
    }
}

fn open_lines(path: &Path) -> Result<std::io::Lines<BufReader<File>>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    Ok(BufReader::new(file).lines())
}

fn read_header(
    path: &Path,
    lines: &mut std::io::Lines<BufReader<File>>,
    expected: usize,
) -> Result<Vec<usize>> {
    let header = lines
        .next()
        .ok_or_else(|| Error::parse(path, 1, "missing header"))?
        .map_err(|e| Error::io(path, e))?;
    let dims = header
        .split_whitespace()
        .map(|t| t.parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::parse(path, 1, format!("bad header {header:?}: {e}")))?;
    if dims.len() != expected {
        return Err(Error::parse(
            path,
            1,
            format!("header has {} fields, expected {expected}", dims.len()),
        ));
    }
    Ok(dims)
}

fn parse_pair(path: &Path, line: usize, token: &str, cols: usize) -> Result<(usize, f32)> {
    let (idx, val) = token
        .split_once(':')
        .ok_or_else(|| Error::parse(path, line, format!("expected index:value, got {token:?}")))?;
    let idx: usize = idx
        .parse()
        .map_err(|e| Error::parse(path, line, format!("bad index {idx:?}: {e}")))?;
    let val: f32 = val
        .parse()
        .map_err(|e| Error::parse(path, line, format!("bad value {val:?}: {e}")))?;
    if idx >= cols {
        return Err(Error::parse(
            path,
            line,
            format!("index {idx} out of range for {cols} columns"),
        ));
    }
    Ok((idx, val))
}

/// Lines past the declared row count are only allowed when blank.
fn past_declared_rows(path: &Path, rows: usize, seen: usize, line: &str) -> Result<bool> {
    if seen <= rows {
        return Ok(false);
    }
    if !line.trim().is_empty() {
        return Err(Error::parse(
            path,
            seen + 1,
            format!("file has more than the {rows} rows declared in its header"),
        ));
    }
    Ok(true)
}

/// Read a sparse matrix file.
pub fn read_sparse_file(path: impl AsRef<Path>) -> Result<CsrMatrix> {
    let path = path.as_ref();
    let mut lines = open_lines(path)?;
    let dims = read_header(path, &mut lines, 2)?;
    let (rows, cols) = (dims[0], dims[1]);

    let mut entries = Vec::with_capacity(rows);
    for (i, line) in lines.enumerate() {
        let line = line.map_err(|e| Error::io(path, e))?;
        let line_no = i + 2;
        if past_declared_rows(path, rows, i + 1, &line)? {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|t| parse_pair(path, line_no, t, cols))
            .collect::<Result<Vec<_>>>()?;
        entries.push(row);
    }
    entries.resize_with(rows, Vec::new);
    CsrMatrix::from_rows(cols, entries)
}

/// Write a sparse matrix file readable by [`read_sparse_file`].
pub fn write_sparse_file(matrix: &CsrMatrix, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut out = BufWriter::new(file);
    let write = |out: &mut BufWriter<File>| -> std::io::Result<()> {
        writeln!(out, "{} {}", matrix.rows(), matrix.cols())?;
        for r in 0..matrix.rows() {
            let start = matrix.indptr()[r];
            let end = matrix.indptr()[r + 1];
            let row: Vec<String> = (start..end)
                .map(|k| format!("{}:{}", matrix.indices()[k], matrix.data()[k]))
                .collect();
            writeln!(out, "{}", row.join(" "))?;
        }
        out.flush()
    };
    write(&mut out).map_err(|e| Error::io(path, e))
}

/// Read a combined features + labels data file.
pub fn read_data(path: impl AsRef<Path>) -> Result<XcData> {
    let path = path.as_ref();
    let mut lines = open_lines(path)?;
    let dims = read_header(path, &mut lines, 3)?;
    let (rows, num_features, num_labels) = (dims[0], dims[1], dims[2]);

    let mut features = Vec::with_capacity(rows);
    let mut labels = Vec::with_capacity(rows);
    for (i, line) in lines.enumerate() {
        let line = line.map_err(|e| Error::io(path, e))?;
        let line_no = i + 2;
        if past_declared_rows(path, rows, i + 1, &line)? {
            continue;
        }
        let mut tokens = line.split_whitespace().peekable();

        let mut label_row = Vec::new();
        if let Some(first) = tokens.peek() {
            if !first.contains(':') {
                for l in first.split(',').filter(|l| !l.is_empty()) {
                    let l: usize = l
                        .parse()
                        .map_err(|e| Error::parse(path, line_no, format!("bad label {l:?}: {e}")))?;
                    if l >= num_labels {
                        return Err(Error::parse(
                            path,
                            line_no,
                            format!("label {l} out of range for {num_labels} labels"),
                        ));
                    }
                    label_row.push((l, 1.0));
                }
                tokens.next();
            }
        }
        let feature_row = tokens
            .map(|t| parse_pair(path, line_no, t, num_features))
            .collect::<Result<Vec<_>>>()?;
        features.push(feature_row);
        labels.push(label_row);
    }
    features.resize_with(rows, Vec::new);
    labels.resize_with(rows, Vec::new);

    Ok(XcData {
        features: CsrMatrix::from_rows(num_features, features)?,
        labels: CsrMatrix::from_rows(num_labels, labels)?,
    })
}

/// Read a label matrix from any supported source.
///
/// `.npz` files are loaded as CSR archives. Text files are sniffed by their
/// header: three fields mean a combined data file (its labels are returned),
/// two fields a plain sparse matrix file.
pub fn read_labels(path: impl AsRef<Path>) -> Result<CsrMatrix> {
    let path = path.as_ref();
    if npz::is_npz(path) {
        return npz::load_npz(path);
    }
    let mut lines = open_lines(path)?;
    let header = lines
        .next()
        .ok_or_else(|| Error::parse(path, 1, "missing header"))?
        .map_err(|e| Error::io(path, e))?;
    match header.split_whitespace().count() {
        3 => Ok(read_data(path)?.labels),
        2 => read_sparse_file(path),
        n => Err(Error::parse(
            path,
            1,
            format!("header has {n} fields, expected 2 or 3"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn sparse_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.txt");
        let m = CsrMatrix::from_rows(4, vec![vec![(1, 0.5), (3, 2.0)], vec![], vec![(0, 1.0)]])
            .unwrap();
        write_sparse_file(&m, &path).unwrap();
        assert_eq!(read_sparse_file(&path).unwrap(), m);
    }

    #[test]
    fn sparse_file_pads_missing_trailing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.txt");
        fs::write(&path, "3 2\n0:1\n").unwrap();
        let m = read_sparse_file(&path).unwrap();
        assert_eq!(m.rows(), 3);
        assert_eq!(m.nonempty_rows(), vec![0]);
    }

    #[test]
    fn sparse_file_rejects_bad_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.txt");
        fs::write(&path, "1 2\n0:1 5:1\n").unwrap();
        assert!(matches!(read_sparse_file(&path), Err(Error::Parse { line: 2, .. })));
        fs::write(&path, "1 2\nfoo\n").unwrap();
        assert!(read_sparse_file(&path).is_err());
        fs::write(&path, "1 2\n0:1\n1:1\n").unwrap();
        assert!(read_sparse_file(&path).is_err());
    }

    #[test]
    fn combined_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.txt");
        fs::write(&path, "3 4 3\n0,2 1:0.5 3:1\n 0:2\n1\n").unwrap();
        let data = read_data(&path).unwrap();
        assert_eq!(data.num_samples(), 3);
        assert_eq!(data.num_features(), 4);
        assert_eq!(data.num_labels(), 3);
        assert_eq!(data.labels.row(0).unwrap().0, &[0, 2]);
        assert_eq!(data.labels.row(1).unwrap().0.len(), 0);
        assert_eq!(data.features.row(1).unwrap(), (&[0usize][..], &[2.0f32][..]));
        assert_eq!(data.labels.row(2).unwrap().0, &[1]);
        assert_eq!(read_labels(&path).unwrap(), data.labels);
    }
}
