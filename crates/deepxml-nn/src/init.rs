// init - parameter initialization
//
//   uniform(shape, low, high)       U(low, high)
//   normal(shape, mean, std)        N(mean, std)
//   xavier_uniform(shape, gain)     Glorot uniform
//   kaiming_uniform(shape)          U(-k, k), k = sqrt(1 / fan_in)
//   eye(shape)                      identity (non-square allowed)
//
// Shapes are `(fan_out, fan_in)`, the layout Linear stores its weight in.

use deepxml_core::Tensor;
use ndarray::Array2;
use rand_distr::{Distribution, Normal};

pub fn uniform(shape: (usize, usize), low: f32, high: f32) -> Tensor {
    Tensor::rand_uniform(shape, low, high)
}

/// Samples from N(mean, std). A non-finite or negative `std` yields `mean`.
pub fn normal(shape: (usize, usize), mean: f32, std: f32) -> Tensor {
    match Normal::new(mean, std) {
        Ok(dist) => {
            let mut rng = rand::thread_rng();
            Tensor::from_array(Array2::from_shape_simple_fn(shape, || dist.sample(&mut rng)))
        }
        Err(_) => Tensor::full(shape, mean),
    }
}

/// Glorot uniform: U(-a, a), a = gain * sqrt(6 / (fan_in + fan_out)).
pub fn xavier_uniform(shape: (usize, usize), gain: f32) -> Tensor {
    let (fan_out, fan_in) = shape;
    let a = gain * (6.0 / (fan_in + fan_out).max(1) as f32).sqrt();
    uniform(shape, -a, a)
}

/// He uniform for ReLU networks: U(-k, k), k = sqrt(1 / fan_in).
pub fn kaiming_uniform(shape: (usize, usize)) -> Tensor {
    let k = (1.0 / shape.1.max(1) as f32).sqrt();
    uniform(shape, -k, k)
}

pub fn eye(shape: (usize, usize)) -> Tensor {
    Tensor::eye(shape.0, shape.1)
}
