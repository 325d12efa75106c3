// Reading feature and label matrices from disk
//
//   *.npz   scipy CSR archive
//   *.npy   dense 2-D array
//   other   XC text, either a plain sparse file ("rows cols" header) or a
//           combined data file ("rows features labels" header)

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use deepxml_core::{io, npz, Error, Matrix, Result};

/// Which half of a combined data file to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Part {
    Features,
    Labels,
}

pub(crate) fn read_matrix(path: &Path, part: Part) -> Result<Matrix> {
    if npz::is_npz(path) {
        return Ok(Matrix::Sparse(npz::load_npz(path)?));
    }
    if npz::is_npy(path) {
        return Ok(Matrix::Dense(npz::read_npy_dense(path)?));
    }
    let matrix = match (header_fields(path)?, part) {
        (3, Part::Features) => io::read_data(path)?.features,
        (3, Part::Labels) => io::read_data(path)?.labels,
        (2, _) => io::read_sparse_file(path)?,
        (n, _) => {
            return Err(Error::parse(
                path,
                1,
                format!("header has {n} fields, expected 2 or 3"),
            ))
        }
    };
    Ok(Matrix::Sparse(matrix))
}

fn header_fields(path: &Path) -> Result<usize> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut header = String::new();
    BufReader::new(file)
        .read_line(&mut header)
        .map_err(|e| Error::io(path, e))?;
    Ok(header.split_whitespace().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepxml_core::CsrMatrix;
    use ndarray::array;
    use std::fs;

    #[test]
    fn combined_file_halves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.txt");
        fs::write(&path, "2 3 4\n0,2 1:0.5\n3 0:1.0 2:2.0\n").unwrap();

        let x = read_matrix(&path, Part::Features).unwrap();
        assert_eq!((x.rows(), x.cols()), (2, 3));
        let y = read_matrix(&path, Part::Labels).unwrap();
        assert_eq!((y.rows(), y.cols()), (2, 4));
        assert_eq!(y.to_csr().get(0, 2), Some(1.0));
    }

    #[test]
    fn extension_selects_reader() {
        let dir = tempfile::tempdir().unwrap();
        let npz_path = dir.path().join("y.npz");
        let m = CsrMatrix::from_rows(3, vec![vec![(1, 1.0)], vec![]]).unwrap();
        npz::save_npz(&m, &npz_path).unwrap();
        assert_eq!(read_matrix(&npz_path, Part::Labels).unwrap(), Matrix::Sparse(m));

        let npy_path = dir.path().join("x.npy");
        let dense = array![[1.0f32, 2.0], [3.0, 4.0]];
        npz::write_npy_dense(&dense, &npy_path).unwrap();
        assert_eq!(
            read_matrix(&npy_path, Part::Features).unwrap(),
            Matrix::Dense(dense)
        );
    }

    #[test]
    fn bad_header_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.txt");
        fs::write(&path, "5\n").unwrap();
        assert!(matches!(
            read_matrix(&path, Part::Features),
            Err(Error::Parse { line: 1, .. })
        ));
    }
}
