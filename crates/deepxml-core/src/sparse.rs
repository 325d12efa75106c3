// CsrMatrix - compressed sparse row matrix
//
// XML feature and label matrices are very wide (10^5..10^7 columns) and very
// sparse. Storage is a `sprs::CsMat<f32>` in CSR order:
//
//   indptr:  [rows + 1]  row i occupies indices[indptr[i]..indptr[i + 1]]
//   indices: [nnz]       column of each stored value, strictly ascending within a row
//   data:    [nnz]       the stored values
//
// Every constructor canonicalizes: rows are sorted and duplicate columns
// are summed into one entry, the way scipy's `sum_duplicates` does.
//
// Row and column selection follow numpy fancy-indexing rules: the result's
// row/column j is the source's row/column `indices[j]`, and an index may
// appear more than once.

use std::borrow::Cow;

use ndarray::Array2;
use sprs::{CompressedStorage, CsMat, TriMat};

use crate::error::{Error, Result};

/// Row normalization scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Norm {
    /// Divide by the sum of absolute values.
    L1,
    /// Divide by the Euclidean norm.
    L2,
    /// Divide by the largest absolute value.
    Max,
}

impl Norm {
    fn of(self, values: impl Iterator<Item = f32>) -> f32 {
        match self {
            Norm::L1 => values.map(f32::abs).sum(),
            Norm::L2 => values.map(|v| v * v).sum::<f32>().sqrt(),
            Norm::Max => values.map(f32::abs).fold(0.0, f32::max),
        }
    }
}

/// Divide `values` in place by their `norm`; all-zero slices are left as is.
pub(crate) fn normalize_slice(values: &mut [f32], norm: Norm) {
    let n = norm.of(values.iter().copied());
    if n > 0.0 {
        values.iter_mut().for_each(|v| *v /= n);
    }
}

/// A sparse matrix in compressed sparse row format.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    inner: CsMat<f32>,
}

impl PartialEq for CsrMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape()
            && self.indptr() == other.indptr()
            && self.indices() == other.indices()
            && self.data() == other.data()
    }
}

fn structure_err(e: impl std::fmt::Display) -> Error {
    Error::msg(format!("invalid csr structure: {e}"))
}

impl CsrMatrix {
    /// Build from raw CSR arrays, validating their structure. Unsorted rows
    /// are sorted and repeated columns within a row are summed.
    pub fn new(
        (rows, cols): (usize, usize),
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<f32>,
    ) -> Result<Self> {
        if indptr.len() != rows + 1 {
            return Err(Error::msg(format!(
                "csr indptr has {} entries, expected {}",
                indptr.len(),
                rows + 1
            )));
        }
        if indices.len() != data.len() || indptr[rows] != data.len() || indptr[0] != 0 {
            return Err(Error::msg(format!(
                "csr arrays disagree: indptr ends at {}, {} indices, {} values",
                indptr[rows],
                indices.len(),
                data.len()
            )));
        }
        if indptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::msg("csr indptr is not monotonic"));
        }
        if let Some(&bad) = indices.iter().find(|&&c| c >= cols) {
            return Err(Error::IndexOutOfRange {
                index: bad,
                size: cols,
            });
        }

        let canonical = indptr
            .windows(2)
            .all(|w| indices[w[0]..w[1]].windows(2).all(|p| p[0] < p[1]));
        if canonical {
            let inner = CsMat::try_new((rows, cols), indptr, indices, data)
                .map_err(|(_, _, _, e)| structure_err(e))?;
            return Ok(CsrMatrix { inner });
        }

        let mut row_inds = Vec::with_capacity(indices.len());
        for (r, w) in indptr.windows(2).enumerate() {
            row_inds.extend(std::iter::repeat(r).take(w[1] - w[0]));
        }
        let triplets = TriMat::from_triplets((rows, cols), row_inds, indices, data);
        Ok(CsrMatrix {
            inner: triplets.to_csr(),
        })
    }

    /// Build from per-row `(column, value)` entries.
    pub fn from_rows(cols: usize, rows: Vec<Vec<(usize, f32)>>) -> Result<Self> {
        let nnz = rows.iter().map(Vec::len).sum();
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::with_capacity(nnz);
        let mut data = Vec::with_capacity(nnz);
        indptr.push(0);
        let n_rows = rows.len();
        for row in rows {
            for (c, v) in row {
                indices.push(c);
                data.push(v);
            }
            indptr.push(indices.len());
        }
        Self::new((n_rows, cols), indptr, indices, data)
    }

    /// An all-zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        CsrMatrix {
            inner: CsMat::zero((rows, cols)),
        }
    }

    /// Keep the nonzero entries of a dense array.
    pub fn from_dense(dense: &Array2<f32>) -> Self {
        CsrMatrix {
            inner: CsMat::csr_from_dense(dense.view(), 0.0),
        }
    }

    pub fn to_dense(&self) -> Array2<f32> {
        self.inner.to_dense()
    }

    pub fn rows(&self) -> usize {
        self.inner.rows()
    }

    pub fn cols(&self) -> usize {
        self.inner.cols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.inner.shape()
    }

    pub fn nnz(&self) -> usize {
        self.inner.nnz()
    }

    pub fn indptr(&self) -> Cow<'_, [usize]> {
        self.inner.proper_indptr()
    }

    pub fn indices(&self) -> &[usize] {
        self.inner.indices()
    }

    pub fn data(&self) -> &[f32] {
        self.inner.data()
    }

    /// The stored columns and values of row `index`.
    pub fn row(&self, index: usize) -> Result<(&[usize], &[f32])> {
        if index >= self.rows() {
            return Err(Error::IndexOutOfRange {
                index,
                size: self.rows(),
            });
        }
        let indptr = self.indptr();
        let span = indptr[index]..indptr[index + 1];
        Ok((&self.indices()[span.clone()], &self.data()[span]))
    }

    /// Value at (row, col), zero when not stored.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.rows() || col >= self.cols() {
            return None;
        }
        Some(self.inner.get(row, col).copied().unwrap_or(0.0))
    }

    /// Keep rows `indices`, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Self> {
        let mut inner = CsMat::empty(CompressedStorage::CSR, self.cols());
        for &r in indices {
            let row = self.inner.outer_view(r).ok_or(Error::IndexOutOfRange {
                index: r,
                size: self.rows(),
            })?;
            inner = inner.append_outer_csvec(row);
        }
        Ok(CsrMatrix { inner })
    }

    /// Keep columns `indices`; new column j is old column `indices[j]`.
    pub fn select_cols(&self, indices: &[usize]) -> Result<Self> {
        let mut positions: Vec<Vec<usize>> = vec![Vec::new(); self.cols()];
        for (new, &old) in indices.iter().enumerate() {
            if old >= self.cols() {
                return Err(Error::IndexOutOfRange {
                    index: old,
                    size: self.cols(),
                });
            }
            positions[old].push(new);
        }
        let mut triplets = TriMat::new((self.rows(), indices.len()));
        for (r, row) in self.inner.outer_iterator().enumerate() {
            for (c, &v) in row.iter() {
                for &new in &positions[c] {
                    triplets.add_triplet(r, new, v);
                }
            }
        }
        Ok(CsrMatrix {
            inner: triplets.to_csr(),
        })
    }

    /// Rows holding at least one nonzero value, ascending.
    pub fn nonempty_rows(&self) -> Vec<usize> {
        self.inner
            .outer_iterator()
            .enumerate()
            .filter_map(|(r, row)| row.data().iter().any(|&v| v != 0.0).then_some(r))
            .collect()
    }

    /// Columns holding at least one nonzero value, ascending.
    pub fn nonempty_cols(&self) -> Vec<usize> {
        self.column_counts()
            .into_iter()
            .enumerate()
            .filter_map(|(c, n)| (n > 0).then_some(c))
            .collect()
    }

    /// Number of nonzero values in each column.
    pub fn column_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.cols()];
        for (&v, (_, c)) in self.inner.iter() {
            if v != 0.0 {
                counts[c] += 1;
            }
        }
        counts
    }

    /// Normalize every row in place.
    pub fn normalize_rows(&mut self, norm: Norm) {
        self.for_each_row_mut(|_, values| normalize_slice(values, norm));
    }

    /// Replace every nonzero stored value with 1.
    pub fn binarize(&mut self) {
        self.map_values_in_place(|v| if v != 0.0 { 1.0 } else { 0.0 });
    }

    /// Apply `f` to every stored value. Implicit zeros are untouched.
    pub fn map_values_in_place(&mut self, f: impl Fn(f32) -> f32) {
        self.inner.map_inplace(|&v| f(v));
    }

    /// Largest stored value of each row, 0 for rows without entries.
    pub fn row_max(&self) -> Vec<f32> {
        self.inner
            .outer_iterator()
            .map(|row| row.data().iter().copied().reduce(f32::max).unwrap_or(0.0))
            .collect()
    }

    /// Multiply row i by `factors[i]`.
    pub fn scale_rows(&mut self, factors: &[f32]) -> Result<()> {
        if factors.len() != self.rows() {
            return Err(Error::ShapeMismatch {
                expected: (self.rows(), 1),
                got: (factors.len(), 1),
            });
        }
        self.for_each_row_mut(|r, values| values.iter_mut().for_each(|v| *v *= factors[r]));
        Ok(())
    }

    /// `alpha * self + beta * other`, merging the two sparsity patterns.
    /// Entries that cancel to exactly zero are not stored.
    pub fn lin_comb(&self, alpha: f32, other: &CsrMatrix, beta: f32) -> Result<Self> {
        if self.shape() != other.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.shape(),
                got: other.shape(),
            });
        }
        let a = self.inner.map(|&v| alpha * v);
        let b = other.inner.map(|&v| beta * v);
        let sum: CsMat<f32> = &a + &b;
        CsrMatrix { inner: sum }.without_zeros()
    }

    /// Drop explicitly stored zeros.
    fn without_zeros(self) -> Result<Self> {
        if self.data().iter().all(|&v| v != 0.0) {
            return Ok(self);
        }
        let mut indptr = Vec::with_capacity(self.rows() + 1);
        let mut indices = Vec::with_capacity(self.nnz());
        let mut data = Vec::with_capacity(self.nnz());
        indptr.push(0);
        for row in self.inner.outer_iterator() {
            for (c, &v) in row.iter().filter(|&(_, &v)| v != 0.0) {
                indices.push(c);
                data.push(v);
            }
            indptr.push(indices.len());
        }
        let inner = CsMat::try_new(self.shape(), indptr, indices, data)
            .map_err(|(_, _, _, e)| structure_err(e))?;
        Ok(CsrMatrix { inner })
    }

    fn for_each_row_mut(&mut self, mut f: impl FnMut(usize, &mut [f32])) {
        let indptr = self.indptr().to_vec();
        let data = self.inner.data_mut();
        for (r, w) in indptr.windows(2).enumerate() {
            f(r, &mut data[w[0]..w[1]]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CsrMatrix {
        // [[1, 0, 2],
        //  [0, 0, 0],
        //  [0, 3, 0]]
        CsrMatrix::from_rows(3, vec![vec![(2, 2.0), (0, 1.0)], vec![], vec![(1, 3.0)]]).unwrap()
    }

    #[test]
    fn rows_are_sorted_on_construction() {
        let m = sample();
        assert_eq!(m.row(0).unwrap(), (&[0usize, 2][..], &[1.0f32, 2.0][..]));
        assert_eq!(m.nnz(), 3);
    }

    #[test]
    fn repeated_columns_are_summed() {
        let m = CsrMatrix::new((2, 3), vec![0, 3, 4], vec![2, 1, 2, 0], vec![1.0, 0.5, 0.25, 4.0])
            .unwrap();
        assert_eq!(m.indptr().to_vec(), vec![0, 2, 3]);
        assert_eq!(m.row(0).unwrap(), (&[1usize, 2][..], &[0.5f32, 1.25][..]));
        assert_eq!(m.get(1, 0), Some(4.0));
    }

    #[test]
    fn rejects_out_of_range_columns() {
        assert!(CsrMatrix::from_rows(2, vec![vec![(2, 1.0)]]).is_err());
        assert!(CsrMatrix::new((1, 2), vec![0, 2], vec![0], vec![1.0]).is_err());
    }

    #[test]
    fn select_cols_reorders_and_duplicates() {
        let m = sample().select_cols(&[2, 0, 2]).unwrap();
        assert_eq!(m.cols(), 3);
        assert_eq!(m.row(0).unwrap(), (&[0usize, 1, 2][..], &[2.0f32, 1.0, 2.0][..]));
        assert_eq!(m.row(2).unwrap().0.len(), 0);
    }

    #[test]
    fn select_rows_keeps_order() {
        let m = sample().select_rows(&[2, 0]).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.get(0, 1), Some(3.0));
        assert_eq!(m.get(1, 2), Some(2.0));
        assert_eq!(m.get(1, 1), Some(0.0));
        assert!(sample().select_rows(&[3]).is_err());
    }

    #[test]
    fn nonempty_rows_and_cols() {
        let m = sample();
        assert_eq!(m.nonempty_rows(), vec![0, 2]);
        assert_eq!(m.nonempty_cols(), vec![0, 1, 2]);
        assert_eq!(m.column_counts(), vec![1, 1, 1]);
    }

    #[test]
    fn normalize_rows_l2() {
        let mut m = CsrMatrix::from_rows(2, vec![vec![(0, 3.0), (1, 4.0)]]).unwrap();
        m.normalize_rows(Norm::L2);
        assert_eq!(m.data(), &[0.6, 0.8]);
    }

    #[test]
    fn scale_rows_and_row_max() {
        let mut m = sample();
        assert_eq!(m.row_max(), vec![2.0, 0.0, 3.0]);
        m.scale_rows(&[0.5, 1.0, 2.0]).unwrap();
        assert_eq!(m.data(), &[0.5, 1.0, 6.0]);
        assert!(m.scale_rows(&[1.0]).is_err());
    }

    #[test]
    fn lin_comb_merges_patterns() {
        let a = CsrMatrix::from_rows(3, vec![vec![(0, 1.0), (2, 1.0)]]).unwrap();
        let b = CsrMatrix::from_rows(3, vec![vec![(1, 2.0), (2, 2.0)]]).unwrap();
        let c = a.lin_comb(0.5, &b, 0.5).unwrap();
        assert_eq!(c.indices(), &[0, 1, 2]);
        assert_eq!(c.data(), &[0.5, 1.0, 1.5]);
    }

    #[test]
    fn lin_comb_drops_cancelled_entries() {
        let a = CsrMatrix::from_rows(3, vec![vec![(0, 1.0), (1, 2.0)], vec![(2, 4.0)]]).unwrap();
        let b = CsrMatrix::from_rows(3, vec![vec![(1, -2.0), (2, 1.0)], vec![(2, -4.0)]]).unwrap();
        let c = a.lin_comb(0.5, &b, 0.5).unwrap();
        assert_eq!(c.nnz(), 2);
        assert_eq!(c.row(0).unwrap(), (&[0usize, 2][..], &[0.5f32, 0.5][..]));
        assert_eq!(c.row(1).unwrap().0.len(), 0);
        assert!(a.lin_comb(1.0, &CsrMatrix::zeros(2, 4), 1.0).is_err());
    }

    #[test]
    fn dense_round_trip() {
        let m = sample();
        assert_eq!(CsrMatrix::from_dense(&m.to_dense()), m);
    }
}
