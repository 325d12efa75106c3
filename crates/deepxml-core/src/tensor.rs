// Tensor - dense 2-D batch of f32 values
//
// Every dense value that flows through the transform stack is a
// `[batch, dim]` matrix: document representations, layer weights, label
// multi-hot targets. The storage is an `ndarray::Array2<f32>` in row-major
// order, tagged with the `Device` the owning module is bound to.
//
// SHAPES:
//
//   dims() returns (rows, cols). Binary ops accept either identical shapes
//   or a `[1, cols]` right-hand side that broadcasts over rows (bias vectors).

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::Rng;

use crate::bail;
use crate::device::Device;
use crate::error::{Error, Result};

/// A dense row-major `[rows, cols]` tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Array2<f32>,
    device: Device,
}

impl Tensor {
    /// Wrap an existing array. The tensor starts out on the CPU.
    pub fn from_array(data: Array2<f32>) -> Self {
        Tensor {
            data,
            device: Device::Cpu,
        }
    }

    /// Build a tensor from row-major values.
    pub fn from_vec(data: Vec<f32>, (rows, cols): (usize, usize)) -> Result<Self> {
        if data.len() != rows * cols {
            bail!(
                "tensor of shape [{rows}, {cols}] requires {} elements, got {}",
                rows * cols,
                data.len()
            );
        }
        let data = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::msg(format!("invalid tensor shape: {e}")))?;
        Ok(Self::from_array(data))
    }

    /// Build a tensor from equally sized rows.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != cols) {
            return Err(Error::ShapeMismatch {
                expected: (1, cols),
                got: (1, bad.len()),
            });
        }
        Self::from_vec(rows.concat(), (rows.len(), cols))
    }

    pub fn zeros(shape: (usize, usize)) -> Self {
        Self::from_array(Array2::zeros(shape))
    }

    pub fn ones(shape: (usize, usize)) -> Self {
        Self::from_array(Array2::ones(shape))
    }

    pub fn full(shape: (usize, usize), value: f32) -> Self {
        Self::from_array(Array2::from_elem(shape, value))
    }

    /// Ones on the main diagonal, zeros elsewhere. Works for non-square shapes.
    pub fn eye(rows: usize, cols: usize) -> Self {
        let mut data = Array2::zeros((rows, cols));
        for i in 0..rows.min(cols) {
            data[[i, i]] = 1.0;
        }
        Self::from_array(data)
    }

    /// Samples drawn from U(low, high).
    pub fn rand_uniform(shape: (usize, usize), low: f32, high: f32) -> Self {
        let mut rng = rand::thread_rng();
        let data = Array2::from_shape_simple_fn(shape, || rng.gen_range(low..=high));
        Self::from_array(data)
    }

    /// (rows, cols)
    pub fn dims(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn elem_count(&self) -> usize {
        self.data.len()
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Rebind this tensor to `device` in place.
    pub fn set_device(&mut self, device: Device) {
        self.device = device;
    }

    /// A copy of this tensor bound to `device`.
    pub fn to_device(&self, device: Device) -> Tensor {
        Tensor {
            data: self.data.clone(),
            device,
        }
    }

    pub fn as_array(&self) -> &Array2<f32> {
        &self.data
    }

    pub fn as_array_mut(&mut self) -> &mut Array2<f32> {
        &mut self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        self.data.get([row, col]).copied()
    }

    pub fn row(&self, index: usize) -> Result<ArrayView1<'_, f32>> {
        if index >= self.rows() {
            return Err(Error::IndexOutOfRange {
                index,
                size: self.rows(),
            });
        }
        Ok(self.data.row(index))
    }

    /// All values in row-major order.
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    /// `self @ rhs^T`: `[n, k] x [m, k] -> [n, m]`.
    pub fn matmul_t(&self, rhs: &Tensor) -> Result<Tensor> {
        if self.cols() != rhs.cols() {
            return Err(Error::ShapeMismatch {
                expected: (rhs.rows(), self.cols()),
                got: rhs.dims(),
            });
        }
        Ok(self.with_data(self.data.dot(&rhs.data.t())))
    }

    /// Element-wise sum; `rhs` may be `[1, cols]` to broadcast over rows.
    pub fn add(&self, rhs: &Tensor) -> Result<Tensor> {
        self.check_broadcast(rhs)?;
        Ok(self.with_data(&self.data + &rhs.data))
    }

    pub fn relu(&self) -> Tensor {
        self.map(|v| v.max(0.0))
    }

    pub fn map(&self, f: impl Fn(f32) -> f32) -> Tensor {
        self.with_data(self.data.mapv(f))
    }

    /// Append `extra` zero columns on the right.
    pub fn pad_cols(&self, extra: usize) -> Tensor {
        if extra == 0 {
            return self.clone();
        }
        let (rows, cols) = self.dims();
        let mut data = Array2::zeros((rows, cols + extra));
        data.slice_mut(ndarray::s![.., ..cols]).assign(&self.data);
        self.with_data(data)
    }

    /// Per-column mean over all rows: `[cols]`.
    pub fn column_mean(&self) -> Array1<f32> {
        self.data
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(self.cols()))
    }

    /// Per-column biased variance over all rows: `[cols]`.
    pub fn column_var(&self) -> Array1<f32> {
        if self.rows() == 0 {
            return Array1::zeros(self.cols());
        }
        self.data.var_axis(Axis(0), 0.0)
    }

    /// A new tensor holding `data`, bound to the same device as `self`.
    pub fn with_data(&self, data: Array2<f32>) -> Tensor {
        Tensor {
            data,
            device: self.device,
        }
    }

    fn check_broadcast(&self, rhs: &Tensor) -> Result<()> {
        let same = rhs.dims() == self.dims();
        let row_vector = rhs.rows() == 1 && rhs.cols() == self.cols();
        if same || row_vector {
            Ok(())
        } else {
            Err(Error::ShapeMismatch {
                expected: self.dims(),
                got: rhs.dims(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matmul_t_multiplies_by_transpose() {
        let x = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], (2, 2)).unwrap();
        let w = Tensor::from_vec(vec![1.0, 0.0, 1.0, 1.0, 0.0, 2.0], (3, 2)).unwrap();
        let y = x.matmul_t(&w).unwrap();
        assert_eq!(y.dims(), (2, 3));
        assert_eq!(y.to_vec(), vec![1.0, 3.0, 4.0, 3.0, 7.0, 8.0]);
    }

    #[test]
    fn add_broadcasts_row_vector() {
        let x = Tensor::zeros((3, 2));
        let b = Tensor::from_vec(vec![1.0, -1.0], (1, 2)).unwrap();
        assert_eq!(x.add(&b).unwrap().to_vec(), vec![1.0, -1.0, 1.0, -1.0, 1.0, -1.0]);
        assert!(x.add(&Tensor::zeros((2, 2))).is_err());
    }

    #[test]
    fn from_vec_checks_element_count() {
        let err = Tensor::from_vec(vec![1.0; 5], (2, 3)).unwrap_err();
        assert!(matches!(err, Error::Msg(ref m) if m.contains("requires 6 elements, got 5")));
    }

    #[test]
    fn pad_and_eye() {
        let x = Tensor::ones((2, 1)).pad_cols(2);
        assert_eq!(x.to_vec(), vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(Tensor::eye(2, 3).to_vec(), vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn column_statistics() {
        let x = Tensor::from_vec(vec![1.0, 2.0, 3.0, 6.0], (2, 2)).unwrap();
        assert_eq!(x.column_mean().to_vec(), vec![2.0, 4.0]);
        assert_eq!(x.column_var().to_vec(), vec![1.0, 4.0]);
    }
}
