// Matrix - a feature or label matrix held either sparse or dense
//
// Feature and label containers in deepxml-data are thin wrappers around this
// enum. Every structural operation (row/column selection, validity scans,
// normalization) is defined for both representations so the containers never
// need to care which one they hold.

use ndarray::{Array2, Axis};

use crate::error::{Error, Result};
use crate::sparse::{normalize_slice, CsrMatrix, Norm};

/// One row of a [`Matrix`].
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// Stored columns (ascending) and their values.
    Sparse { indices: Vec<usize>, values: Vec<f32> },
    /// Every column's value.
    Dense(Vec<f32>),
}

impl Row {
    /// Number of nonzero values in the row.
    pub fn nnz(&self) -> usize {
        match self {
            Row::Sparse { values, .. } => values.iter().filter(|&&v| v != 0.0).count(),
            Row::Dense(values) => values.iter().filter(|&&v| v != 0.0).count(),
        }
    }

    /// `(column, value)` pairs of the nonzero entries.
    pub fn nonzero(&self) -> Vec<(usize, f32)> {
        match self {
            Row::Sparse { indices, values } => indices
                .iter()
                .copied()
                .zip(values.iter().copied())
                .filter(|&(_, v)| v != 0.0)
                .collect(),
            Row::Dense(values) => values
                .iter()
                .copied()
                .enumerate()
                .filter(|&(_, v)| v != 0.0)
                .collect(),
        }
    }
}

/// A 2-D matrix in sparse (CSR) or dense form.
#[derive(Debug, Clone, PartialEq)]
pub enum Matrix {
    Sparse(CsrMatrix),
    Dense(Array2<f32>),
}

impl Matrix {
    pub fn rows(&self) -> usize {
        match self {
            Matrix::Sparse(m) => m.rows(),
            Matrix::Dense(m) => m.nrows(),
        }
    }

    pub fn cols(&self) -> usize {
        match self {
            Matrix::Sparse(m) => m.cols(),
            Matrix::Dense(m) => m.ncols(),
        }
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, Matrix::Sparse(_))
    }

    pub fn row(&self, index: usize) -> Result<Row> {
        match self {
            Matrix::Sparse(m) => {
                let (indices, values) = m.row(index)?;
                Ok(Row::Sparse {
                    indices: indices.to_vec(),
                    values: values.to_vec(),
                })
            }
            Matrix::Dense(m) => {
                if index >= m.nrows() {
                    return Err(Error::IndexOutOfRange {
                        index,
                        size: m.nrows(),
                    });
                }
                Ok(Row::Dense(m.row(index).to_vec()))
            }
        }
    }

    /// Restrict to rows `indices` (in that order).
    pub fn select_rows(&mut self, indices: &[usize]) -> Result<()> {
        check_indices(indices, self.rows())?;
        *self = match self {
            Matrix::Sparse(m) => Matrix::Sparse(m.select_rows(indices)?),
            Matrix::Dense(m) => Matrix::Dense(m.select(Axis(0), indices)),
        };
        Ok(())
    }

    /// Restrict to columns `indices` (in that order).
    pub fn select_cols(&mut self, indices: &[usize]) -> Result<()> {
        check_indices(indices, self.cols())?;
        *self = match self {
            Matrix::Sparse(m) => Matrix::Sparse(m.select_cols(indices)?),
            Matrix::Dense(m) => Matrix::Dense(m.select(Axis(1), indices)),
        };
        Ok(())
    }

    /// Rows with at least one nonzero value, ascending.
    pub fn nonempty_rows(&self) -> Vec<usize> {
        match self {
            Matrix::Sparse(m) => m.nonempty_rows(),
            Matrix::Dense(m) => m
                .rows()
                .into_iter()
                .enumerate()
                .filter_map(|(r, row)| row.iter().any(|&v| v != 0.0).then_some(r))
                .collect(),
        }
    }

    /// Columns with at least one nonzero value, ascending.
    pub fn nonempty_cols(&self) -> Vec<usize> {
        match self {
            Matrix::Sparse(m) => m.nonempty_cols(),
            Matrix::Dense(m) => m
                .columns()
                .into_iter()
                .enumerate()
                .filter_map(|(c, col)| col.iter().any(|&v| v != 0.0).then_some(c))
                .collect(),
        }
    }

    pub fn normalize_rows(&mut self, norm: Norm) {
        match self {
            Matrix::Sparse(m) => m.normalize_rows(norm),
            Matrix::Dense(m) => {
                for mut row in m.rows_mut() {
                    if let Some(values) = row.as_slice_mut() {
                        normalize_slice(values, norm);
                    } else {
                        let mut values = row.to_vec();
                        normalize_slice(&mut values, norm);
                        row.iter_mut().zip(values).for_each(|(dst, v)| *dst = v);
                    }
                }
            }
        }
    }

    /// Nonzero values become 1.
    pub fn binarize(&mut self) {
        match self {
            Matrix::Sparse(m) => m.binarize(),
            Matrix::Dense(m) => m.mapv_inplace(|v| if v != 0.0 { 1.0 } else { 0.0 }),
        }
    }

    pub fn into_sparse(self) -> Matrix {
        match self {
            Matrix::Dense(m) => Matrix::Sparse(CsrMatrix::from_dense(&m)),
            sparse => sparse,
        }
    }

    pub fn into_dense(self) -> Matrix {
        match self {
            Matrix::Sparse(m) => Matrix::Dense(m.to_dense()),
            dense => dense,
        }
    }

    /// Borrow as CSR, converting a dense matrix on the fly.
    pub fn to_csr(&self) -> CsrMatrix {
        match self {
            Matrix::Sparse(m) => m.clone(),
            Matrix::Dense(m) => CsrMatrix::from_dense(m),
        }
    }
}

fn check_indices(indices: &[usize], size: usize) -> Result<()> {
    match indices.iter().find(|&&i| i >= size) {
        Some(&index) => Err(Error::IndexOutOfRange { index, size }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn dense_and_sparse_agree_on_selection() {
        let dense = array![[1.0f32, 0.0, 2.0], [0.0, 0.0, 0.0], [0.0, 3.0, 0.0]];
        let mut a = Matrix::Dense(dense.clone());
        let mut b = Matrix::Sparse(CsrMatrix::from_dense(&dense));
        for m in [&mut a, &mut b] {
            m.select_rows(&[2, 0]).unwrap();
            m.select_cols(&[1, 2]).unwrap();
        }
        assert_eq!(a.clone().into_sparse(), b);
        assert_eq!(a.nonempty_rows(), vec![0, 1]);
        assert_eq!(b.nonempty_cols(), vec![0, 1]);
    }

    #[test]
    fn row_out_of_range_is_an_error() {
        let m = Matrix::Dense(Array2::zeros((2, 2)));
        assert!(matches!(m.row(2), Err(Error::IndexOutOfRange { index: 2, size: 2 })));
    }

    #[test]
    fn max_normalize_dense_rows() {
        let mut m = Matrix::Dense(array![[2.0f32, 4.0], [0.0, 0.0]]);
        m.normalize_rows(Norm::Max);
        assert_eq!(m, Matrix::Dense(array![[0.5f32, 1.0], [0.0, 0.0]]));
    }
}
