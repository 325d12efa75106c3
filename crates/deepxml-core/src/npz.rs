// NumPy archives
//
// `.npz` holds a scipy CSR matrix the way `scipy.sparse.save_npz` writes it:
// `data.npy`, `indices.npy`, `indptr.npy` and `shape.npy`. Value arrays may be
// float32 or float64 and index arrays int32 or int64; both are accepted on
// read. The `format.npy` entry is a unicode scalar and is neither read nor
// written, so only CSR archives are supported.
//
// `.npy` holds a single dense 2-D array.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use ndarray::{Array1, Array2};
use ndarray_npy::{NpzReader, NpzWriter, ReadNpyExt, WriteNpyExt};

use crate::error::{Error, Result};
use crate::sparse::CsrMatrix;

fn npz_err(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::Npz {
        path: path.to_path_buf(),
        msg: e.to_string(),
    }
}

pub fn is_npz(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("npz"))
}

pub fn is_npy(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("npy"))
}

fn to_usize(path: &Path, name: &str, values: impl Iterator<Item = i64>) -> Result<Vec<usize>> {
    values
        .map(|v| usize::try_from(v).map_err(|_| npz_err(path, format!("negative entry {v} in {name}"))))
        .collect()
}

// Entries may be stored with or without the `.npy` suffix.
fn by_name<R, T>(npz: &mut NpzReader<R>, name: &str) -> std::result::Result<Array1<T>, ndarray_npy::ReadNpzError>
where
    R: Read + Seek,
    T: ndarray_npy::ReadableElement,
{
    npz.by_name(&format!("{name}.npy")).or_else(|_| npz.by_name(name))
}

fn read_index<R: Read + Seek>(npz: &mut NpzReader<R>, path: &Path, name: &str) -> Result<Vec<usize>> {
    if let Ok(a) = by_name::<_, i32>(npz, name) {
        return to_usize(path, name, a.iter().map(|&v| v as i64));
    }
    let wide = by_name::<_, i64>(npz, name).map_err(|e| npz_err(path, format!("{name}: {e}")))?;
    to_usize(path, name, wide.iter().copied())
}

fn read_values<R: Read + Seek>(npz: &mut NpzReader<R>, path: &Path, name: &str) -> Result<Vec<f32>> {
    if let Ok(a) = by_name::<_, f32>(npz, name) {
        return Ok(a.to_vec());
    }
    let double = by_name::<_, f64>(npz, name).map_err(|e| npz_err(path, format!("{name}: {e}")))?;
    Ok(double.iter().map(|&v| v as f32).collect())
}

/// Load a CSR matrix from a scipy `.npz` archive.
pub fn load_npz(path: impl AsRef<Path>) -> Result<CsrMatrix> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut npz = NpzReader::new(file).map_err(|e| npz_err(path, e))?;

    let shape = read_index(&mut npz, path, "shape")?;
    if shape.len() != 2 {
        return Err(npz_err(path, format!("shape has {} entries, expected 2", shape.len())));
    }
    let indptr = read_index(&mut npz, path, "indptr")?;
    let indices = read_index(&mut npz, path, "indices")?;
    let data = read_values(&mut npz, path, "data")?;
    CsrMatrix::new((shape[0], shape[1]), indptr, indices, data)
}

/// Save a CSR matrix as a `.npz` archive (float32 values, int32 or int64 indices).
pub fn save_npz(matrix: &CsrMatrix, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut npz = NpzWriter::new(file);

    let data = Array1::from(matrix.data().to_vec());
    npz.add_array("data", &data).map_err(|e| npz_err(path, e))?;

    let fits_i32 = matrix.nnz() <= i32::MAX as usize && matrix.cols() <= i32::MAX as usize;
    if fits_i32 {
        let indices: Array1<i32> = matrix.indices().iter().map(|&v| v as i32).collect();
        let indptr: Array1<i32> = matrix.indptr().iter().map(|&v| v as i32).collect();
        npz.add_array("indices", &indices).map_err(|e| npz_err(path, e))?;
        npz.add_array("indptr", &indptr).map_err(|e| npz_err(path, e))?;
    } else {
        let indices: Array1<i64> = matrix.indices().iter().map(|&v| v as i64).collect();
        let indptr: Array1<i64> = matrix.indptr().iter().map(|&v| v as i64).collect();
        npz.add_array("indices", &indices).map_err(|e| npz_err(path, e))?;
        npz.add_array("indptr", &indptr).map_err(|e| npz_err(path, e))?;
    }
    let shape = Array1::from(vec![matrix.rows() as i64, matrix.cols() as i64]);
    npz.add_array("shape", &shape).map_err(|e| npz_err(path, e))?;
    npz.finish().map_err(|e| npz_err(path, e))?;
    Ok(())
}

/// Load a dense 2-D array (float32 or float64) from a `.npy` file.
pub fn read_npy_dense(path: impl AsRef<Path>) -> Result<Array2<f32>> {
    let path = path.as_ref();
    let open = || File::open(path).map_err(|e| Error::io(path, e));
    if let Ok(a) = Array2::<f32>::read_npy(open()?) {
        return Ok(a);
    }
    let a = Array2::<f64>::read_npy(open()?).map_err(|e| npz_err(path, e))?;
    Ok(a.mapv(|v| v as f32))
}

/// Write a dense float32 array to a `.npy` file.
pub fn write_npy_dense(array: &Array2<f32>, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    array.write_npy(file).map_err(|e| npz_err(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn npz_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.npz");
        let m = CsrMatrix::from_rows(5, vec![vec![(4, 0.25), (1, 3.0)], vec![], vec![(0, -1.0)]])
            .unwrap();
        save_npz(&m, &path).unwrap();
        assert_eq!(load_npz(&path).unwrap(), m);
    }

    #[test]
    fn npy_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.npy");
        let a = array![[1.0f32, 2.0], [3.0, 4.0]];
        write_npy_dense(&a, &path).unwrap();
        assert_eq!(read_npy_dense(&path).unwrap(), a);
    }

    #[test]
    fn missing_archive_is_io_error() {
        assert!(matches!(load_npz("/nonexistent/x.npz"), Err(Error::Io { .. })));
    }
}
