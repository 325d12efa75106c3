// BatchNorm1d - batch normalization over the feature axis of [N, C] input
//
// FORMULA (training mode):
//   x_hat = (x - mean_batch) / sqrt(var_batch + eps)
//   y = gamma * x_hat + beta
//
// mean_batch and var_batch are per-column statistics over the N rows.
//
// RUNNING STATISTICS:
//   running_mean = (1 - momentum) * running_mean + momentum * mean_batch
//   running_var  = (1 - momentum) * running_var  + momentum * var_batch
//
// Eval mode normalizes with the running statistics instead.

use std::cell::{Cell, RefCell};

use deepxml_core::{Error, Result, Tensor};
use ndarray::Array1;

use crate::module::Module;

/// Batch normalization for `[N, C]` inputs.
#[derive(Debug, Clone)]
pub struct BatchNorm1d {
    /// Learnable scale (gamma): [1, C]
    weight: Tensor,
    /// Learnable shift (beta): [1, C]
    bias: Tensor,
    running_mean: RefCell<Array1<f32>>,
    running_var: RefCell<Array1<f32>>,
    num_features: usize,
    eps: f32,
    momentum: f32,
    training: Cell<bool>,
}

impl BatchNorm1d {
    pub fn new(num_features: usize, eps: f32, momentum: f32) -> Self {
        BatchNorm1d {
            weight: Tensor::ones((1, num_features)),
            bias: Tensor::zeros((1, num_features)),
            running_mean: RefCell::new(Array1::zeros(num_features)),
            running_var: RefCell::new(Array1::ones(num_features)),
            num_features,
            eps,
            momentum,
            training: Cell::new(true),
        }
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn eps(&self) -> f32 {
        self.eps
    }

    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    pub fn bias(&self) -> &Tensor {
        &self.bias
    }

    pub fn running_mean(&self) -> Array1<f32> {
        self.running_mean.borrow().clone()
    }

    pub fn running_var(&self) -> Array1<f32> {
        self.running_var.borrow().clone()
    }

    fn apply_norm(&self, x: &Tensor, mean: &Array1<f32>, var: &Array1<f32>) -> Tensor {
        let invstd = var.mapv(|v| 1.0 / (v + self.eps).sqrt());
        let x_hat = (x.as_array() - mean) * &invstd;
        let y = x_hat * self.weight.as_array() + self.bias.as_array();
        x.with_data(y)
    }
}

impl Module for BatchNorm1d {
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let (n, c) = x.dims();
        if c != self.num_features {
            return Err(Error::ShapeMismatch {
                expected: (n, self.num_features),
                got: (n, c),
            });
        }

        if !self.training.get() {
            let rm = self.running_mean.borrow();
            let rv = self.running_var.borrow();
            return Ok(self.apply_norm(x, &rm, &rv));
        }

        if n < 2 {
            return Err(Error::msg(format!(
                "BatchNorm1d: expected more than 1 value per channel when training, got input of shape [{n}, {c}]"
            )));
        }
        let mean = x.column_mean();
        let var = x.column_var();
        {
            let mut rm = self.running_mean.borrow_mut();
            let mut rv = self.running_var.borrow_mut();
            let m = self.momentum;
            rm.zip_mut_with(&mean, |r, &b| *r = (1.0 - m) * *r + m * b);
            rv.zip_mut_with(&var, |r, &b| *r = (1.0 - m) * *r + m * b);
        }
        Ok(self.apply_norm(x, &mean, &var))
    }

    fn parameters(&self) -> Vec<&Tensor> {
        vec![&self.weight, &self.bias]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        vec![&mut self.weight, &mut self.bias]
    }

    fn named_parameters(&self) -> Vec<(String, &Tensor)> {
        vec![
            ("weight".to_string(), &self.weight),
            ("bias".to_string(), &self.bias),
        ]
    }

    fn set_training(&self, training: bool) {
        self.training.set(training);
    }

    fn is_training(&self) -> bool {
        self.training.get()
    }
}
